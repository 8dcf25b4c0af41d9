//! Very small geometry primitives for placing elements on the board.
//!
//! A fetched document has no renderer, so bounding boxes come from the
//! inline styling board widgets ship with their markup: `left`/`top`/
//! `width`/`height` in pixels or percentages, and `transform:
//! translate(..)` offsets measured in multiples of the element's own
//! size (the convention grid widgets use to move a cell-sized sprite
//! N cells over). Elements with no positional styling have no box.

use scraper::ElementRef;

/// An axis-aligned box in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// A CSS length that is either absolute pixels or a percentage of
/// some basis supplied at resolution time.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Length {
    Px(f64),
    Percent(f64),
}

impl Length {
    fn resolve(&self, basis: f64) -> f64 {
        match self {
            Length::Px(v) => *v,
            Length::Percent(v) => v / 100.0 * basis,
        }
    }
}

fn parse_length(v: &str) -> Option<Length> {
    let v = v.trim();
    if let Some(stripped) = v.strip_suffix('%') {
        return stripped.trim().parse().ok().map(Length::Percent);
    }
    if let Some(stripped) = v.strip_suffix("px") {
        return stripped.trim().parse().ok().map(Length::Px);
    }
    // Bare numbers are treated as pixels, as attribute dimensions are.
    v.parse().ok().map(Length::Px)
}

/// Split an inline `style` attribute into (property, value) pairs.
fn style_props(style: &str) -> impl Iterator<Item = (&str, &str)> {
    style
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .map(|(name, value)| (name.trim(), value.trim()))
}

/// Parse `translate(X, Y)` out of a `transform` value. A missing Y
/// component means no vertical offset.
fn parse_translate(value: &str) -> Option<(Length, Length)> {
    let start = value.find("translate(")?;
    let rest = &value[start + "translate(".len()..];
    let end = rest.find(')')?;
    let mut parts = rest[..end].split(',');
    let x = parse_length(parts.next()?)?;
    let y = parts.next().map_or(Some(Length::Px(0.0)), parse_length)?;
    Some((x, y))
}

/// Extract an element's bounding box from its inline styles, in the
/// coordinate space of `container`. Percentage lengths resolve
/// against the container box; translate percentages resolve against
/// the element's own size. Returns `None` when the element carries no
/// positional styling at all.
pub fn element_rect(el: &ElementRef, container: &Rect) -> Option<Rect> {
    let style = el.value().attr("style")?;

    let mut left = None;
    let mut top = None;
    let mut width = None;
    let mut height = None;
    let mut translate = None;

    for (name, value) in style_props(style) {
        match name {
            "left" => left = parse_length(value),
            "top" => top = parse_length(value),
            "width" => width = parse_length(value),
            "height" => height = parse_length(value),
            "transform" => translate = parse_translate(value),
            _ => {}
        }
    }

    if left.is_none() && top.is_none() && translate.is_none() {
        return None;
    }

    // Unsized elements default to one grid cell.
    let w = width.map_or(container.width / 8.0, |l| l.resolve(container.width));
    let h = height.map_or(container.height / 8.0, |l| l.resolve(container.height));

    let mut x = left.map_or(0.0, |l| l.resolve(container.width));
    let mut y = top.map_or(0.0, |l| l.resolve(container.height));
    if let Some((tx, ty)) = translate {
        x += tx.resolve(w);
        y += ty.resolve(h);
    }

    Some(Rect {
        x: container.x + x,
        y: container.y + y,
        width: w,
        height: h,
    })
}

/// Extract the board container's own box from its inline styles or
/// width/height attributes. Containers with no stated size, or a
/// zero-area one, have no usable box.
pub fn container_rect(el: &ElementRef) -> Option<Rect> {
    let mut width = None;
    let mut height = None;

    if let Some(style) = el.value().attr("style") {
        for (name, value) in style_props(style) {
            match name {
                "width" => width = parse_length(value),
                "height" => height = parse_length(value),
                _ => {}
            }
        }
    }
    if width.is_none() {
        width = el.value().attr("width").and_then(parse_length);
    }
    if height.is_none() {
        height = el.value().attr("height").and_then(parse_length);
    }

    // Percentages on the container itself have no basis to resolve
    // against here.
    let w = match width? {
        Length::Px(v) => v,
        Length::Percent(_) => return None,
    };
    let h = match height? {
        Length::Px(v) => v,
        Length::Percent(_) => return None,
    };

    let rect = Rect { x: 0.0, y: 0.0, width: w, height: h };
    if rect.area() <= 0.0 {
        return None;
    }
    Some(rect)
}

//! Ordered fallback chains for piece identity and square placement.
//!
//! Each chain is an explicit list of resolver functions tried in
//! sequence; the first success wins. Keeping the tiers as plain
//! functions lets each one be exercised on its own, without a full
//! document scan.

use scraper::ElementRef;

use crate::layout::{self, Rect};
use crate::piece::Piece;
use crate::square::Square;

/// Context the square tiers may consult: the board container's box,
/// when one was discovered and carries a usable size.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoardContext {
    pub container: Option<Rect>,
}

pub type PieceResolver = fn(&ElementRef) -> Option<Piece>;
pub type SquareResolver = fn(&ElementRef, &BoardContext) -> Option<Square>;

/// Piece-identity tiers, most structured first.
pub fn piece_resolvers() -> &'static [PieceResolver] {
    &[piece_from_attribute, piece_from_class]
}

/// Square tiers: own attribute, own class, parent attribute, then
/// geometric inference.
pub fn square_resolvers() -> &'static [SquareResolver] {
    &[
        square_from_attribute,
        square_from_class,
        square_from_parent,
        square_from_geometry,
    ]
}

pub fn resolve_piece(el: &ElementRef) -> Option<Piece> {
    piece_resolvers().iter().find_map(|resolver| resolver(el))
}

pub fn resolve_square(el: &ElementRef, ctx: &BoardContext) -> Option<Square> {
    square_resolvers().iter().find_map(|resolver| resolver(el, ctx))
}

/// Tier 1: a `data-piece` attribute naming color and kind.
fn piece_from_attribute(el: &ElementRef) -> Option<Piece> {
    el.value().attr("data-piece").and_then(Piece::parse)
}

/// Tier 2: class tokens — either the compact two-character code or
/// the `piece-<color>-<kind>` prefixed spelling.
fn piece_from_class(el: &ElementRef) -> Option<Piece> {
    el.value().classes().find_map(|class| {
        Piece::from_code(class)
            .or_else(|| class.strip_prefix("piece-").and_then(Piece::from_name_pair))
    })
}

/// Tier 1: a `data-square` attribute with the algebraic name.
fn square_from_attribute(el: &ElementRef, _ctx: &BoardContext) -> Option<Square> {
    el.value().attr("data-square").and_then(Square::from_algebraic)
}

/// Tier 2: a `square-<ff><rr>` class token.
fn square_from_class(el: &ElementRef, _ctx: &BoardContext) -> Option<Square> {
    el.value().classes().find_map(|class| {
        class
            .strip_prefix("square-")
            .and_then(|digits| digits.parse::<u32>().ok())
            .and_then(Square::from_numeric_class)
    })
}

/// Tier 3: the immediate parent's `data-square` attribute, for
/// widgets that wrap each piece in a square element.
fn square_from_parent(el: &ElementRef, _ctx: &BoardContext) -> Option<Square> {
    let parent = el.parent().and_then(ElementRef::wrap)?;
    parent.value().attr("data-square").and_then(Square::from_algebraic)
}

/// Tier 4: geometric inference from the element's box relative to
/// the container's. Skips silently when either box is unavailable.
fn square_from_geometry(el: &ElementRef, ctx: &BoardContext) -> Option<Square> {
    let container = ctx.container?;
    if container.area() <= 0.0 {
        return None;
    }
    let rect = layout::element_rect(el, &container)?;
    let (cx, cy) = rect.center();
    Square::from_point(
        (cx - container.x) / container.width,
        (cy - container.y) / container.height,
    )
}

//! Piece identity: colors, kinds, and the encodings board widgets use
//! for them.
//!
//! Widgets name pieces in two ways: a compact two-character code
//! (`wp`, `bq`) used in class lists, and a verbose `<color>-<kind>`
//! pair (`white-pawn`) used in data attributes. Both parse into the
//! same [`Piece`] so manifest entries and detected elements compare
//! regardless of spelling.

use std::fmt;

/// Piece color
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn letter(&self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
        }
    }

    fn from_letter(c: char) -> Option<Self> {
        match c {
            'w' => Some(Color::White),
            'b' => Some(Color::Black),
            _ => None,
        }
    }

    fn from_name(s: &str) -> Option<Self> {
        match s {
            "white" => Some(Color::White),
            "black" => Some(Color::Black),
            _ => None,
        }
    }
}

/// Piece kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub fn letter(&self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PieceKind::Pawn => "pawn",
            PieceKind::Knight => "knight",
            PieceKind::Bishop => "bishop",
            PieceKind::Rook => "rook",
            PieceKind::Queen => "queen",
            PieceKind::King => "king",
        }
    }

    fn from_letter(c: char) -> Option<Self> {
        match c {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }

    fn from_name(s: &str) -> Option<Self> {
        match s {
            "pawn" => Some(PieceKind::Pawn),
            "knight" => Some(PieceKind::Knight),
            "bishop" => Some(PieceKind::Bishop),
            "rook" => Some(PieceKind::Rook),
            "queen" => Some(PieceKind::Queen),
            "king" => Some(PieceKind::King),
            _ => None,
        }
    }
}

/// A piece identity: color plus kind.
///
/// Ordered so collections keyed by `Piece` iterate deterministically
/// (white before black, pawn before knight and so on).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    pub fn new(color: Color, kind: PieceKind) -> Self {
        Piece { color, kind }
    }

    /// Parse the compact two-character code, e.g. `wp` or `bq`.
    pub fn from_code(code: &str) -> Option<Self> {
        let mut chars = code.chars();
        let color = Color::from_letter(chars.next()?)?;
        let kind = PieceKind::from_letter(chars.next()?)?;
        if chars.next().is_some() {
            return None;
        }
        Some(Piece { color, kind })
    }

    /// Parse a verbose `<color>-<kind>` pair, e.g. `white-pawn`.
    pub fn from_name_pair(s: &str) -> Option<Self> {
        let (color, kind) = s.split_once('-')?;
        Some(Piece {
            color: Color::from_name(color)?,
            kind: PieceKind::from_name(kind)?,
        })
    }

    /// Parse either spelling. Compact codes are tried first.
    pub fn parse(s: &str) -> Option<Self> {
        Piece::from_code(s).or_else(|| Piece::from_name_pair(s))
    }

    /// The compact code for this piece, e.g. `wp`.
    pub fn code(&self) -> String {
        format!("{}{}", self.color.letter(), self.kind.letter())
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.color.letter(), self.kind.letter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compact_codes() {
        let p = Piece::from_code("wp").unwrap();
        assert_eq!(p.color, Color::White);
        assert_eq!(p.kind, PieceKind::Pawn);
        assert_eq!(p.code(), "wp");

        let q = Piece::from_code("bq").unwrap();
        assert_eq!(q.color, Color::Black);
        assert_eq!(q.kind, PieceKind::Queen);
    }

    #[test]
    fn parses_name_pairs() {
        let p = Piece::from_name_pair("white-pawn").unwrap();
        assert_eq!(p, Piece::new(Color::White, PieceKind::Pawn));
        let n = Piece::from_name_pair("black-knight").unwrap();
        assert_eq!(n.code(), "bn");
    }

    #[test]
    fn both_spellings_compare_equal() {
        assert_eq!(Piece::parse("wr"), Piece::parse("white-rook"));
    }

    #[test]
    fn rejects_unknown_encodings() {
        assert!(Piece::from_code("xp").is_none());
        assert!(Piece::from_code("wz").is_none());
        assert!(Piece::from_code("wpp").is_none());
        assert!(Piece::from_name_pair("white-dragon").is_none());
        assert!(Piece::from_name_pair("pawn").is_none());
        assert!(Piece::parse("").is_none());
    }
}

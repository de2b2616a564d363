// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Marker colors, shape kinds and the marker-type taxonomy.
//!
//! A [`MarkerType`] is the pair of a [`MarkerColor`] and a [`ShapeKind`]. It is
//! written on the wire as `"<color>_<suffix>"` (for example `blue_dot`,
//! `violet_line` or `green_exc`) and is the bucket the cost calculation counts
//! markers in. Not every color supports every shape; see
//! [`MarkerColor::supports`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const ALL_SHAPES: &[ShapeKind] = &ShapeKind::ALL;
const GREEN_SHAPES: &[ShapeKind] = &[
    ShapeKind::Point,
    ShapeKind::Cross,
    ShapeKind::Line,
    ShapeKind::Oval,
    ShapeKind::Exclamation,
    ShapeKind::Freehand,
];
const VIOLET_SHAPES: &[ShapeKind] = &[
    ShapeKind::Point,
    ShapeKind::Cross,
    ShapeKind::Line,
    ShapeKind::Exclamation,
    ShapeKind::Freehand,
];
const YELLOW_SHAPES: &[ShapeKind] = &[
    ShapeKind::Point,
    ShapeKind::Line,
    ShapeKind::Oval,
    ShapeKind::Freehand,
];
const ORANGE_SHAPES: &[ShapeKind] = &[
    ShapeKind::Point,
    ShapeKind::Cross,
    ShapeKind::Oval,
    ShapeKind::Freehand,
];
const WHITE_SHAPES: &[ShapeKind] = &[ShapeKind::Point, ShapeKind::Line];

/// Marker palette colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerColor {
    Blue,
    Violet,
    Green,
    Yellow,
    Red,
    Orange,
    White,
}

impl MarkerColor {
    pub const ALL: [MarkerColor; 7] = [
        MarkerColor::Blue,
        MarkerColor::Violet,
        MarkerColor::Green,
        MarkerColor::Yellow,
        MarkerColor::Red,
        MarkerColor::Orange,
        MarkerColor::White,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MarkerColor::Blue => "blue",
            MarkerColor::Violet => "violet",
            MarkerColor::Green => "green",
            MarkerColor::Yellow => "yellow",
            MarkerColor::Red => "red",
            MarkerColor::Orange => "orange",
            MarkerColor::White => "white",
        }
    }

    /// Render color as `#rrggbb`.
    pub fn hex(self) -> &'static str {
        match self {
            MarkerColor::Blue => "#1e88e5",
            MarkerColor::Violet => "#8e24aa",
            MarkerColor::Green => "#43a047",
            MarkerColor::Yellow => "#fdd835",
            MarkerColor::Red => "#e53935",
            MarkerColor::Orange => "#fb8c00",
            MarkerColor::White => "#ffffff",
        }
    }

    /// Shapes this color can be placed as.
    pub fn allowed_shapes(self) -> &'static [ShapeKind] {
        match self {
            MarkerColor::Blue | MarkerColor::Red => ALL_SHAPES,
            MarkerColor::Green => GREEN_SHAPES,
            MarkerColor::Violet => VIOLET_SHAPES,
            MarkerColor::Yellow => YELLOW_SHAPES,
            MarkerColor::Orange => ORANGE_SHAPES,
            MarkerColor::White => WHITE_SHAPES,
        }
    }

    pub fn supports(self, shape: ShapeKind) -> bool {
        self.allowed_shapes().contains(&shape)
    }
}

impl FromStr for MarkerColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MarkerColor::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| format!("unknown marker color '{}'", s))
    }
}

/// Geometric family of a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Point,
    Cross,
    Line,
    Oval,
    Question,
    Exclamation,
    Freehand,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 7] = [
        ShapeKind::Point,
        ShapeKind::Cross,
        ShapeKind::Line,
        ShapeKind::Oval,
        ShapeKind::Question,
        ShapeKind::Exclamation,
        ShapeKind::Freehand,
    ];

    /// Suffix used in the marker-type string (`blue_dot`).
    pub fn suffix(self) -> &'static str {
        match self {
            ShapeKind::Point => "dot",
            ShapeKind::Cross => "cross",
            ShapeKind::Line => "line",
            ShapeKind::Oval => "oval",
            ShapeKind::Question => "q",
            ShapeKind::Exclamation => "exc",
            ShapeKind::Freehand => "free",
        }
    }

    fn from_suffix(s: &str) -> Option<Self> {
        ShapeKind::ALL.into_iter().find(|k| k.suffix() == s)
    }

    pub fn is_glyph(self) -> bool {
        matches!(self, ShapeKind::Question | ShapeKind::Exclamation)
    }
}

/// Color plus shape; the unit markers are counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MarkerType {
    pub color: MarkerColor,
    pub shape: ShapeKind,
}

impl MarkerType {
    /// Build a marker type, refusing pairs outside the capability table.
    pub fn new(color: MarkerColor, shape: ShapeKind) -> Option<Self> {
        color.supports(shape).then_some(Self { color, shape })
    }

    /// Every valid marker type, in palette order.
    pub fn all() -> impl Iterator<Item = MarkerType> {
        MarkerColor::ALL.into_iter().flat_map(|color| {
            color
                .allowed_shapes()
                .iter()
                .map(move |&shape| MarkerType { color, shape })
        })
    }
}

impl fmt::Display for MarkerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.color.name(), self.shape.suffix())
    }
}

impl FromStr for MarkerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (color, suffix) = s
            .split_once('_')
            .ok_or_else(|| format!("malformed marker type '{}'", s))?;
        let color: MarkerColor = color.parse()?;
        let shape = ShapeKind::from_suffix(suffix)
            .ok_or_else(|| format!("unknown shape suffix in '{}'", s))?;
        MarkerType::new(color, shape)
            .ok_or_else(|| format!("{} markers cannot be drawn as {:?}", color.name(), shape))
    }
}

impl TryFrom<String> for MarkerType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MarkerType> for String {
    fn from(value: MarkerType) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_type_string_roundtrip() {
        for t in MarkerType::all() {
            let s = t.to_string();
            assert_eq!(s.parse::<MarkerType>().unwrap(), t);
        }
        assert_eq!(
            "violet_line".parse::<MarkerType>().unwrap(),
            MarkerType::new(MarkerColor::Violet, ShapeKind::Line).unwrap()
        );
    }

    #[test]
    fn test_white_supports_only_point_and_line() {
        assert!(MarkerColor::White.supports(ShapeKind::Point));
        assert!(MarkerColor::White.supports(ShapeKind::Line));
        for shape in [
            ShapeKind::Cross,
            ShapeKind::Oval,
            ShapeKind::Question,
            ShapeKind::Exclamation,
            ShapeKind::Freehand,
        ] {
            assert!(MarkerType::new(MarkerColor::White, shape).is_none());
        }
    }

    #[test]
    fn test_parse_rejects_unsupported_pairs() {
        assert!("white_cross".parse::<MarkerType>().is_err());
        assert!("pink_dot".parse::<MarkerType>().is_err());
        assert!("blue".parse::<MarkerType>().is_err());
        assert!("blue_star".parse::<MarkerType>().is_err());
    }

    #[test]
    fn test_marker_type_serde_as_string() {
        let t = MarkerType::new(MarkerColor::Green, ShapeKind::Exclamation).unwrap();
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"green_exc\"");
        let back: MarkerType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
        assert!(serde_json::from_str::<MarkerType>("\"white_q\"").is_err());
    }
}

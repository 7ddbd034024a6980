//! # Reinforcement Locations
//!
//! Addon bars are keyed by a [`LocationKey`]: the span, the face they
//! reinforce, and the section of the span they occupy. On the wire a key is a
//! compact string such as `"Span2_Top_Left"` (span numbers are 1-based in the
//! string form, 0-based in the struct).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::RebarError;

/// Beam face a bar reinforces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Face {
    Top,
    Bottom,
}

impl Face {
    pub const ALL: [Face; 2] = [Face::Top, Face::Bottom];

    /// Short code used in location strings
    pub fn code(&self) -> &'static str {
        match self {
            Face::Top => "Top",
            Face::Bottom => "Bot",
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Face::Top => write!(f, "Top"),
            Face::Bottom => write!(f, "Bottom"),
        }
    }
}

/// Design check point along a span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpanPoint {
    Start,
    Mid,
    End,
}

impl SpanPoint {
    pub const ALL: [SpanPoint; 3] = [SpanPoint::Start, SpanPoint::Mid, SpanPoint::End];
}

impl fmt::Display for SpanPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpanPoint::Start => write!(f, "Start"),
            SpanPoint::Mid => write!(f, "Mid"),
            SpanPoint::End => write!(f, "End"),
        }
    }
}

/// Portion of a span an addon occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Section {
    /// Near the left support
    Left,
    /// Around mid-span
    Mid,
    /// Near the right support
    Right,
    /// Running through the whole span
    Full,
}

impl Section {
    /// Whether an addon placed here provides steel at a check point
    pub fn covers(&self, point: SpanPoint) -> bool {
        match (self, point) {
            (Section::Full, _) => true,
            (Section::Left, SpanPoint::Start) => true,
            (Section::Mid, SpanPoint::Mid) => true,
            (Section::Right, SpanPoint::End) => true,
            (Section::Left, _) | (Section::Mid, _) | (Section::Right, _) => false,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Section::Left => "Left",
            Section::Mid => "Mid",
            Section::Right => "Right",
            Section::Full => "Full",
        }
    }
}

/// Key of one addon placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationKey {
    /// Span index (0-based)
    pub span: usize,
    pub face: Face,
    pub section: Section,
}

impl LocationKey {
    pub fn new(span: usize, face: Face, section: Section) -> Self {
        Self { span, face, section }
    }

    /// Whether this key provides steel at a span/face/point
    pub fn covers(&self, span: usize, face: Face, point: SpanPoint) -> bool {
        self.span == span && self.face == face && self.section.covers(point)
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span{}_{}_{}", self.span + 1, self.face.code(), self.section.code())
    }
}

impl FromStr for LocationKey {
    type Err = RebarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = |reason: &str| RebarError::invalid_input("location_key", s, reason);

        let mut parts = s.split('_');
        let (span_part, face_part, section_part) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(a), Some(b), Some(c), None) => (a, b, c),
            _ => return Err(bad("expected Span<n>_<Top|Bot>_<Left|Mid|Right|Full>")),
        };

        let span_number: usize = span_part
            .strip_prefix("Span")
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| bad("span number missing"))?;
        if span_number == 0 {
            return Err(bad("span numbers start at 1"));
        }

        let face = match face_part {
            "Top" => Face::Top,
            "Bot" | "Bottom" => Face::Bottom,
            _ => return Err(bad("unknown face")),
        };

        let section = match section_part {
            "Left" => Section::Left,
            "Mid" => Section::Mid,
            "Right" => Section::Right,
            "Full" => Section::Full,
            _ => return Err(bad("unknown section")),
        };

        Ok(LocationKey::new(span_number - 1, face, section))
    }
}

impl Serialize for LocationKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LocationKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_display_uses_one_based_span() {
        let key = LocationKey::new(1, Face::Top, Section::Left);
        assert_eq!(key.to_string(), "Span2_Top_Left");
        let key = LocationKey::new(0, Face::Bottom, Section::Mid);
        assert_eq!(key.to_string(), "Span1_Bot_Mid");
    }

    #[test]
    fn test_parse() {
        let key: LocationKey = "Span3_Bot_Full".parse().unwrap();
        assert_eq!(key, LocationKey::new(2, Face::Bottom, Section::Full));
        assert!("Span0_Top_Left".parse::<LocationKey>().is_err());
        assert!("Span1_Side_Left".parse::<LocationKey>().is_err());
        assert!("Span1_Top".parse::<LocationKey>().is_err());
        assert!("Span1_Top_Left_Extra".parse::<LocationKey>().is_err());
    }

    #[test]
    fn test_section_coverage() {
        assert!(Section::Left.covers(SpanPoint::Start));
        assert!(!Section::Left.covers(SpanPoint::Mid));
        assert!(!Section::Left.covers(SpanPoint::End));
        assert!(Section::Right.covers(SpanPoint::End));
        assert!(Section::Mid.covers(SpanPoint::Mid));
        for point in SpanPoint::ALL {
            assert!(Section::Full.covers(point));
        }
    }

    #[test]
    fn test_key_covers_only_its_own_span_and_face() {
        let key = LocationKey::new(1, Face::Top, Section::Full);
        assert!(key.covers(1, Face::Top, SpanPoint::Mid));
        assert!(!key.covers(0, Face::Top, SpanPoint::Mid));
        assert!(!key.covers(1, Face::Bottom, SpanPoint::Mid));
    }

    #[test]
    fn test_map_keys_serialize_as_strings() {
        let mut map = BTreeMap::new();
        map.insert(LocationKey::new(0, Face::Top, Section::Right), 3usize);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"Span1_Top_Right":3}"#);
        let back: BTreeMap<LocationKey, usize> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}

//! # Beam Geometry and Analysis Input
//!
//! A [`BeamGroup`] is one continuous beam line across several column
//! supports. Geometry is immutable once loaded; the only mutable part is the
//! optional user-locked design.
//!
//! ## Notation
//!
//! - N spans create N+1 supports
//! - Supports are numbered 0 to N (left to right)
//! - Spans are numbered 0 to N-1 (left to right)
//!
//! ```text
//! Sup 0     Sup 1     Sup 2     Sup 3
//!   |--------|---------|---------|
//!    Span 0    Span 1    Span 2
//! ```
//!
//! ## Example
//!
//! ```rust
//! use rebar_core::design::{BeamGroup, Span, SpanResultData};
//!
//! let group = BeamGroup::new(
//!     "B1",
//!     vec![Span::new(6000.0, 300.0, 500.0), Span::new(5000.0, 300.0, 500.0)],
//! );
//! assert_eq!(group.support_count(), 3);
//! assert_eq!(group.total_length_mm(), 11000.0);
//!
//! let results = vec![
//!     SpanResultData::new([4.0, 2.0, 9.0], [3.0, 7.5, 3.0]),
//!     SpanResultData::new([9.0, 2.0, 4.0], [3.0, 6.0, 3.0]),
//! ];
//! assert_eq!(results.len(), group.span_count());
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::location::{Face, SpanPoint};
use crate::errors::{RebarError, RebarResult};

// =============================================================================
// MEMBER TYPE
// =============================================================================

/// Member classification; drives cut-off, splice and weight ratios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MemberType {
    /// Secondary beam framing into girders
    #[default]
    Beam,
    /// Primary member framing into columns
    Girder,
}

impl MemberType {
    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            MemberType::Beam => "Beam",
            MemberType::Girder => "Girder",
        }
    }
}

impl std::fmt::Display for MemberType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// =============================================================================
// SPAN
// =============================================================================

/// One span between two supports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Stable identifier
    pub id: Uuid,

    /// Span length, support centre to support centre (mm)
    pub length_mm: f64,

    /// Web width (mm)
    pub width_mm: f64,

    /// Overall depth (mm)
    pub depth_mm: f64,

    /// Optional user label (e.g., "Grid A-B")
    #[serde(default)]
    pub label: String,
}

impl Span {
    /// Create a new span
    pub fn new(length_mm: f64, width_mm: f64, depth_mm: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            length_mm,
            width_mm,
            depth_mm,
            label: String::new(),
        }
    }

    /// Create with a label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Create with a specific UUID
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Validate span geometry
    pub fn validate(&self) -> RebarResult<()> {
        if !(self.length_mm > 0.0) {
            return Err(RebarError::invalid_input(
                "length_mm",
                self.length_mm.to_string(),
                "Span length must be positive",
            ));
        }
        if !(self.width_mm > 0.0) {
            return Err(RebarError::invalid_input(
                "width_mm",
                self.width_mm.to_string(),
                "Width must be positive",
            ));
        }
        if !(self.depth_mm > 0.0) {
            return Err(RebarError::invalid_input(
                "depth_mm",
                self.depth_mm.to_string(),
                "Depth must be positive",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// LOCKED DESIGN
// =============================================================================

/// Backbone chosen and locked by a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedDesign {
    pub top_diameter_mm: u32,
    pub top_count: usize,
    pub bot_diameter_mm: u32,
    pub bot_count: usize,
}

// =============================================================================
// BEAM GROUP
// =============================================================================

/// A continuous beam line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamGroup {
    /// Group name (unique within a floor)
    pub name: String,

    /// Spans, left to right
    pub spans: Vec<Span>,

    /// Member classification
    #[serde(default)]
    pub member_type: MemberType,

    /// Solve order within a floor (lower first)
    #[serde(default)]
    pub priority: u32,

    /// Groups sharing a support or intersection with this one
    #[serde(default)]
    pub connected_groups: Vec<String>,

    /// User-locked backbone, if any
    #[serde(default)]
    pub locked_design: Option<LockedDesign>,
}

impl BeamGroup {
    /// Create an unlocked beam group
    pub fn new(name: impl Into<String>, spans: Vec<Span>) -> Self {
        Self {
            name: name.into(),
            spans,
            member_type: MemberType::Beam,
            priority: 0,
            connected_groups: Vec::new(),
            locked_design: None,
        }
    }

    /// Builder: set member type
    pub fn with_member_type(mut self, member_type: MemberType) -> Self {
        self.member_type = member_type;
        self
    }

    /// Builder: set solve priority
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Builder: record a connected group
    pub fn connected_to(mut self, group: impl Into<String>) -> Self {
        self.connected_groups.push(group.into());
        self
    }

    /// Lock a backbone design
    pub fn lock_design(&mut self, design: LockedDesign) {
        self.locked_design = Some(design);
    }

    /// Number of spans
    pub fn span_count(&self) -> usize {
        self.spans.len()
    }

    /// Number of supports (always span_count + 1)
    pub fn support_count(&self) -> usize {
        self.spans.len() + 1
    }

    /// Total length of all spans (mm)
    pub fn total_length_mm(&self) -> f64 {
        self.spans.iter().map(|s| s.length_mm).sum()
    }

    /// Width used for bar capacity checks: the narrowest span
    pub fn capacity_width_mm(&self) -> f64 {
        self.spans
            .iter()
            .map(|s| s.width_mm)
            .fold(f64::INFINITY, f64::min)
    }

    /// Cumulative support positions from the left end (mm)
    pub fn support_positions_mm(&self) -> Vec<f64> {
        let mut positions = Vec::with_capacity(self.support_count());
        let mut cumulative = 0.0;
        positions.push(cumulative);
        for span in &self.spans {
            cumulative += span.length_mm;
            positions.push(cumulative);
        }
        positions
    }

    /// Validate group geometry
    pub fn validate(&self) -> RebarResult<()> {
        if self.spans.is_empty() {
            return Err(RebarError::invalid_input(
                "spans",
                "empty",
                format!("Beam group '{}' has no spans", self.name),
            ));
        }
        for (i, span) in self.spans.iter().enumerate() {
            span.validate().map_err(|e| {
                RebarError::invalid_input(format!("{}.spans[{}]", self.name, i), "invalid", e.to_string())
            })?;
        }
        Ok(())
    }
}

// =============================================================================
// SPAN RESULT DATA
// =============================================================================

/// Required steel per span, produced by the external analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SpanResultData {
    /// Top face, [start, mid, end] (cm²)
    pub top_cm2: [f64; 3],

    /// Bottom face, [start, mid, end] (cm²)
    pub bot_cm2: [f64; 3],

    /// Support tag at the span start (e.g. "COL-C3", "WALL", "BEAM-B2")
    #[serde(default)]
    pub start_support: Option<String>,

    /// Support tag at the span end
    #[serde(default)]
    pub end_support: Option<String>,
}

impl SpanResultData {
    /// Create from top and bottom [start, mid, end] areas
    pub fn new(top_cm2: [f64; 3], bot_cm2: [f64; 3]) -> Self {
        Self {
            top_cm2,
            bot_cm2,
            start_support: None,
            end_support: None,
        }
    }

    /// Builder: set support tags
    pub fn with_supports(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_support = Some(start.into());
        self.end_support = Some(end.into());
        self
    }

    /// Required area at a face/section (cm²)
    pub fn required(&self, face: Face, point: SpanPoint) -> f64 {
        let values = match face {
            Face::Top => &self.top_cm2,
            Face::Bottom => &self.bot_cm2,
        };
        match point {
            SpanPoint::Start => values[0],
            SpanPoint::Mid => values[1],
            SpanPoint::End => values[2],
        }
    }

    /// Largest requirement anywhere on a face (cm²)
    pub fn max_required(&self, face: Face) -> f64 {
        SpanPoint::ALL
            .iter()
            .map(|p| self.required(face, *p))
            .fold(0.0, f64::max)
    }

    /// Smallest requirement anywhere on a face (cm²)
    pub fn min_required(&self, face: Face) -> f64 {
        SpanPoint::ALL
            .iter()
            .map(|p| self.required(face, *p))
            .fold(f64::INFINITY, f64::min)
    }

    /// True when every value is finite and non-negative
    pub fn is_well_formed(&self) -> bool {
        self.top_cm2
            .iter()
            .chain(self.bot_cm2.iter())
            .all(|v| v.is_finite() && *v >= 0.0)
    }
}

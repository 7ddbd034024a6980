//! # Cross-Beam Constraints
//!
//! [`ProjectConstraints`] carries designs already chosen for other beams on
//! the floor. It is owned by the orchestrator: each beam solve reads an
//! immutable snapshot and hands back a [`ConstraintUpdate`], which the
//! orchestrator applies before the next beam runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::beam::{BeamGroup, LockedDesign};
use super::location::Face;
use super::solution::{Backbone, ContinuousBeamSolution};

/// Backbone already chosen for an adjacent beam
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborDesign {
    pub diameter_mm: u32,
    pub count: usize,
    pub stirrup_diameter_mm: u32,
}

/// Floor-wide state accumulated during a solve
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectConstraints {
    /// Group name → design chosen for it
    #[serde(default)]
    pub neighbor_designs: BTreeMap<String, NeighborDesign>,

    /// Main bar diameter the floor converges on
    #[serde(default)]
    pub preferred_main_diameter_mm: Option<u32>,
}

impl ProjectConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Neighbor designs of the groups connected to `group`, in connection order
    pub fn neighbors_of<'a>(&'a self, group: &'a BeamGroup) -> impl Iterator<Item = (&'a str, &'a NeighborDesign)> + 'a {
        group
            .connected_groups
            .iter()
            .filter_map(move |name| self.neighbor_designs.get(name).map(|d| (name.as_str(), d)))
    }

    /// Apply an update produced by a beam solve
    pub fn apply(&mut self, update: ConstraintUpdate) {
        self.neighbor_designs.insert(update.group_name, update.design);
        if self.preferred_main_diameter_mm.is_none() {
            self.preferred_main_diameter_mm = Some(update.design.diameter_mm);
        }
    }
}

/// Change to [`ProjectConstraints`] produced by one successful beam solve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintUpdate {
    pub group_name: String,
    pub design: NeighborDesign,
}

impl ConstraintUpdate {
    /// Update describing a beam's winning solution (its top backbone)
    pub fn from_solution(group_name: impl Into<String>, solution: &ContinuousBeamSolution) -> Self {
        Self {
            group_name: group_name.into(),
            design: NeighborDesign {
                diameter_mm: solution.top.diameter_mm,
                count: solution.top.count,
                stirrup_diameter_mm: solution.stirrup_diameter_mm,
            },
        }
    }
}

/// Forced backbone for one beam solve (from a user lock)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalConstraints {
    pub top: Backbone,
    pub bottom: Backbone,
}

impl ExternalConstraints {
    /// Backbone forced on a face
    pub fn forced(&self, face: Face) -> Backbone {
        match face {
            Face::Top => self.top,
            Face::Bottom => self.bottom,
        }
    }
}

impl From<LockedDesign> for ExternalConstraints {
    fn from(lock: LockedDesign) -> Self {
        Self {
            top: Backbone::new(lock.top_diameter_mm, lock.top_count),
            bottom: Backbone::new(lock.bot_diameter_mm, lock.bot_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::beam::Span;

    #[test]
    fn test_apply_seeds_preferred_diameter_once() {
        let mut constraints = ProjectConstraints::new();
        let design = NeighborDesign { diameter_mm: 20, count: 3, stirrup_diameter_mm: 8 };
        constraints.apply(ConstraintUpdate { group_name: "B1".into(), design });
        assert_eq!(constraints.preferred_main_diameter_mm, Some(20));

        let other = NeighborDesign { diameter_mm: 18, count: 2, stirrup_diameter_mm: 8 };
        constraints.apply(ConstraintUpdate { group_name: "B2".into(), design: other });
        assert_eq!(constraints.preferred_main_diameter_mm, Some(20));
        assert_eq!(constraints.neighbor_designs.len(), 2);
    }

    #[test]
    fn test_neighbors_of_follows_connections() {
        let mut constraints = ProjectConstraints::new();
        let design = NeighborDesign { diameter_mm: 22, count: 2, stirrup_diameter_mm: 10 };
        constraints.neighbor_designs.insert("G1".into(), design);
        constraints.neighbor_designs.insert("G9".into(), design);

        let group = BeamGroup::new("B1", vec![Span::new(5000.0, 250.0, 400.0)])
            .connected_to("G1")
            .connected_to("G2");
        let found: Vec<_> = constraints.neighbors_of(&group).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "G1");
    }

    #[test]
    fn test_external_from_lock() {
        let lock = LockedDesign { top_diameter_mm: 20, top_count: 3, bot_diameter_mm: 18, bot_count: 2 };
        let external = ExternalConstraints::from(lock);
        assert_eq!(external.forced(Face::Top), Backbone::new(20, 3));
        assert_eq!(external.forced(Face::Bottom), Backbone::new(18, 2));
    }
}

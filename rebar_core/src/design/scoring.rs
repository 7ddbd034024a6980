//! # Scoring and Ranking
//!
//! Final stage of a beam solve:
//!
//! 1. Admissibility: provided area at every face and check point must reach
//!    98 % of the analysis requirement, counting only addons whose location
//!    covers that point. Failing candidates are dropped before scoring.
//! 2. Weight score: linear over the surviving candidates, lightest = 100,
//!    heaviest = 0 (all 100 when equal).
//! 3. Total: `0.6·weight + 0.4·constructability − rule penalty + preference bonus`.
//! 4. Ranking: one entry per option name, score descending, weight ascending.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::beam::SpanResultData;
use super::location::{Face, SpanPoint};
use super::solution::ContinuousBeamSolution;

/// Fraction of the requirement that must be provided
pub const ADMISSIBILITY_TOLERANCE: f64 = 0.98;

pub const WEIGHT_SHARE: f64 = 0.6;
pub const CONSTRUCTABILITY_SHARE: f64 = 0.4;

/// Bonus for matching the floor's preferred or a neighbor's diameter
pub const PREFERRED_DIAMETER_BONUS: f64 = 5.0;

/// Rates how easy a layout is to build (0-100)
pub trait ConstructabilityScorer {
    fn score(&self, solution: &ContinuousBeamSolution) -> f64;
}

/// Penalises diameter variety, second layers, odd counts and addon volume
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConstructabilityScorer;

impl ConstructabilityScorer for DefaultConstructabilityScorer {
    fn score(&self, solution: &ContinuousBeamSolution) -> f64 {
        let mut score = 100.0;
        let diameters = solution.distinct_diameters().len();
        score -= 8.0 * diameters.saturating_sub(1) as f64;
        if solution.uses_second_layer() {
            score -= 10.0;
        }
        for backbone in [solution.top, solution.bottom] {
            if backbone.count % 2 == 1 {
                score -= 3.0;
            }
        }
        score -= 0.5 * solution.addon_bar_count() as f64;
        score.clamp(0.0, 100.0)
    }
}

/// Check provided against required area at every face and check point.
///
/// Returns every under-provisioned section in the error message.
pub fn check_admissibility(solution: &ContinuousBeamSolution, span_results: &[SpanResultData]) -> Result<(), String> {
    let mut deficits = Vec::new();
    for (s, data) in span_results.iter().enumerate() {
        for face in Face::ALL {
            for point in SpanPoint::ALL {
                let required = data.required(face, point);
                let provided = solution.provided_area_cm2(s, face, point);
                if provided < required * ADMISSIBILITY_TOLERANCE {
                    deficits.push(format!(
                        "Span{} {} {}: provided {:.2} < required {:.2} cm² (deficit {:.2})",
                        s + 1,
                        face,
                        point,
                        provided,
                        required,
                        required - provided
                    ));
                }
            }
        }
    }
    if deficits.is_empty() {
        Ok(())
    } else {
        Err(format!("Under-reinforced: {}", deficits.join("; ")))
    }
}

/// Weight scores normalised over a candidate set: lightest 100, heaviest 0
pub fn weight_scores(weights: &[f64]) -> Vec<f64> {
    let min = weights.iter().copied().fold(f64::INFINITY, f64::min);
    let max = weights.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    weights
        .iter()
        .map(|w| if range <= 1e-9 { 100.0 } else { 100.0 * (max - w) / range })
        .collect()
}

/// Combine the parts of the final score
pub fn total_score(weight_score: f64, constructability: f64, penalty: f64, bonus: f64) -> f64 {
    WEIGHT_SHARE * weight_score + CONSTRUCTABILITY_SHARE * constructability - penalty + bonus
}

fn rank_order(a: &ContinuousBeamSolution, b: &ContinuousBeamSolution) -> Ordering {
    b.total_score
        .total_cmp(&a.total_score)
        .then_with(|| a.total_steel_weight_kg.total_cmp(&b.total_steel_weight_kg))
        .then_with(|| a.option_name.cmp(&b.option_name))
}

/// Deduplicate by option name (best kept), sort, keep `limit`
pub fn rank_solutions(solutions: Vec<ContinuousBeamSolution>, limit: usize) -> Vec<ContinuousBeamSolution> {
    let mut best: BTreeMap<String, ContinuousBeamSolution> = BTreeMap::new();
    for solution in solutions {
        let replace = best
            .get(&solution.option_name)
            .map_or(true, |existing| rank_order(existing, &solution) == Ordering::Greater);
        if replace {
            best.insert(solution.option_name.clone(), solution);
        }
    }
    let mut ranked: Vec<_> = best.into_values().collect();
    ranked.sort_by(rank_order);
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::design::location::{LocationKey, Section};
    use crate::design::solution::{Backbone, RebarSpec};

    fn solution(name_d: u32, score: f64, weight: f64) -> ContinuousBeamSolution {
        let mut s = ContinuousBeamSolution::new(Backbone::new(name_d, 2), Backbone::new(16, 2), 8);
        s.total_score = score;
        s.total_steel_weight_kg = weight;
        s
    }

    #[test]
    fn test_weight_normalisation() {
        assert_eq!(weight_scores(&[100.0, 150.0, 200.0]), vec![100.0, 50.0, 0.0]);
        assert_eq!(weight_scores(&[120.0, 120.0]), vec![100.0, 100.0]);
        assert_eq!(weight_scores(&[80.0]), vec![100.0]);
    }

    #[test]
    fn test_total_score() {
        assert!((total_score(100.0, 50.0, 2.0, 5.0) - 83.0).abs() < 1e-9);
    }

    #[test]
    fn test_ranking_sorted_and_deduplicated() {
        let ranked = rank_solutions(
            vec![
                solution(16, 70.0, 300.0),
                solution(20, 80.0, 350.0),
                solution(18, 80.0, 320.0),
                solution(16, 75.0, 310.0),
                solution(22, 10.0, 400.0),
                solution(25, 5.0, 420.0),
                solution(14, 1.0, 500.0),
            ],
            5,
        );
        let names: Vec<&str> = ranked.iter().map(|s| s.option_name.as_str()).collect();
        assert_eq!(names, vec!["T2D18-B2D16", "T2D20-B2D16", "T2D16-B2D16", "T2D22-B2D16", "T2D25-B2D16"]);
        assert_eq!(ranked[2].total_score, 75.0);
        for pair in ranked.windows(2) {
            assert!(pair[0].total_score >= pair[1].total_score);
        }
    }

    #[test]
    fn test_admissibility_counts_only_covering_addons() {
        let mut sol = ContinuousBeamSolution::new(Backbone::new(16, 2), Backbone::new(16, 2), 8);
        // 2D16 + 2D16 at the left end only
        sol.reinforcements.insert(
            LocationKey::new(0, Face::Top, Section::Left),
            Arc::new(RebarSpec::single_layer(Face::Top, 16, 2)),
        );
        let ok = vec![SpanResultData::new([8.0, 4.0, 4.0], [3.0, 3.0, 3.0])];
        assert!(check_admissibility(&sol, &ok).is_ok());

        // Same demand at the right end is not covered by the left addon
        let bad = vec![SpanResultData::new([8.0, 4.0, 8.0], [3.0, 3.0, 3.0])];
        let err = check_admissibility(&sol, &bad).unwrap_err();
        assert!(err.contains("Span1 Top End"), "{}", err);
        assert!(!err.contains("Top Start"));
    }

    #[test]
    fn test_admissibility_tolerance() {
        let sol = ContinuousBeamSolution::new(Backbone::new(16, 2), Backbone::new(16, 2), 8);
        let area = sol.top.area_cm2();
        let within = vec![SpanResultData::new([area / 0.985; 3], [0.0; 3])];
        assert!(check_admissibility(&sol, &within).is_ok());
        let beyond = vec![SpanResultData::new([area / 0.97; 3], [0.0; 3])];
        assert!(check_admissibility(&sol, &beyond).is_err());
    }

    #[test]
    fn test_constructability_prefers_simple_layouts() {
        let scorer = DefaultConstructabilityScorer;
        let simple = ContinuousBeamSolution::new(Backbone::new(16, 2), Backbone::new(16, 2), 8);
        let mut busy = ContinuousBeamSolution::new(Backbone::new(20, 3), Backbone::new(16, 2), 8);
        busy.reinforcements.insert(
            LocationKey::new(0, Face::Bottom, Section::Mid),
            Arc::new(RebarSpec::layered(Face::Bottom, 12, vec![2, 2])),
        );
        assert_eq!(scorer.score(&simple), 100.0);
        assert!(scorer.score(&busy) < scorer.score(&simple));
    }
}

//! # Filling Strategies
//!
//! Given a required area and the backbone already in place, a strategy
//! proposes how many bars go in each layer. Layer counts are totals: layer 1
//! includes the backbone bars.
//!
//! Both strategies share one fix-up pass after their initial split:
//!
//! 1. Pyramid rule: layer 2 never exceeds layer 1 (reject)
//! 2. Layer limit: a second layer needs `max_layers ≥ 2` (reject)
//! 3. Stirrup snap: layer 2 one short of the leg count is bumped onto the legs
//! 4. Symmetry: odd counts round up to even when space allows
//! 5. Alignment: even layer 1 over odd layer 2 bumps layer 2
//! 6. No lone bars: a non-empty layer holds at least two (bump or reject)
//!
//! Results from different strategies are compared with [`score_filling`].

use serde::{Deserialize, Serialize};

use crate::materials::bar_area_cm2;

/// Strategy input
#[derive(Debug, Clone, PartialEq)]
pub struct FillingContext {
    /// Area the location must provide, backbone included (cm²)
    pub required_area_cm2: f64,
    /// Backbone area already present (cm²)
    pub backbone_area_cm2: f64,
    pub backbone_count: usize,
    pub backbone_diameter_mm: u32,
    /// Diameter of the addon bars being placed
    pub addon_diameter_mm: u32,
    /// Total bars that fit in layer 1 alongside the backbone
    pub layer1_capacity: usize,
    /// Bars that fit in layer 2
    pub layer2_capacity: usize,
    pub max_layers: usize,
    pub stirrup_legs: usize,
    pub prefer_symmetric: bool,
}

impl FillingContext {
    /// Addon bars needed to cover the deficit (0 when the backbone suffices)
    pub fn addon_bars_needed(&self) -> usize {
        let deficit = self.required_area_cm2 - self.backbone_area_cm2;
        if deficit <= 1e-9 {
            return 0;
        }
        let bar = bar_area_cm2(self.addon_diameter_mm);
        if bar <= 0.0 {
            return usize::MAX;
        }
        ((deficit / bar - 1e-9).ceil() as usize).max(1)
    }

    /// Total bars at the location: backbone plus addons
    pub fn total_bars_needed(&self) -> usize {
        self.backbone_count.saturating_add(self.addon_bars_needed())
    }
}

/// Which strategy produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyKind {
    Greedy,
    Balanced,
}

/// Strategy output
#[derive(Debug, Clone, PartialEq)]
pub struct FillingResult {
    pub strategy: StrategyKind,
    /// Total bars per layer, layer 1 first
    pub layer_counts: [usize; 2],
    /// Bars added beyond the area requirement by the fix-ups
    pub waste_count: usize,
    pub is_valid: bool,
    pub failing_reason: Option<String>,
}

impl FillingResult {
    fn rejected(strategy: StrategyKind, layer_counts: [usize; 2], reason: impl Into<String>) -> Self {
        Self {
            strategy,
            layer_counts,
            waste_count: 0,
            is_valid: false,
            failing_reason: Some(reason.into()),
        }
    }

    /// Number of non-empty layers
    pub fn layer_count(&self) -> usize {
        self.layer_counts.iter().filter(|n| **n > 0).count()
    }

    pub fn total_bars(&self) -> usize {
        self.layer_counts.iter().sum()
    }

    /// Addon bars per layer, given the backbone sits in layer 1
    pub fn addon_breakdown(&self, backbone_count: usize) -> Vec<usize> {
        vec![self.layer_counts[0].saturating_sub(backbone_count), self.layer_counts[1]]
    }
}

/// Proposes a per-layer bar count
pub trait FillingStrategy {
    fn kind(&self) -> StrategyKind;

    /// Initial (layer 1, layer 2) split of the total bar count
    fn split(&self, total: usize, ctx: &FillingContext) -> (usize, usize);

    fn compute(&self, ctx: &FillingContext) -> FillingResult {
        let total = ctx.total_bars_needed();
        let (l1, l2) = self.split(total, ctx);
        apply_fixups(self.kind(), l1, l2, ctx)
    }
}

/// Fill layer 1 to capacity, then spill
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyStrategy;

impl FillingStrategy for GreedyStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Greedy
    }

    fn split(&self, total: usize, ctx: &FillingContext) -> (usize, usize) {
        let l1 = total.min(ctx.layer1_capacity);
        (l1, total - l1)
    }
}

/// Split the total evenly, layer 1 keeping at least the backbone
#[derive(Debug, Clone, Copy, Default)]
pub struct BalancedStrategy;

impl FillingStrategy for BalancedStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Balanced
    }

    fn split(&self, total: usize, ctx: &FillingContext) -> (usize, usize) {
        let half = total.div_ceil(2);
        let l1 = half.max(ctx.backbone_count).min(ctx.layer1_capacity).min(total);
        (l1, total - l1)
    }
}

fn apply_fixups(kind: StrategyKind, mut l1: usize, mut l2: usize, ctx: &FillingContext) -> FillingResult {
    if l1 < ctx.backbone_count {
        return FillingResult::rejected(
            kind,
            [l1, l2],
            format!(
                "layer 1 holds {} bars but the backbone alone needs {}",
                ctx.layer1_capacity, ctx.backbone_count
            ),
        );
    }
    if l2 > ctx.layer2_capacity {
        return FillingResult::rejected(
            kind,
            [l1, l2],
            format!("layer 2 needs {} bars, capacity {}", l2, ctx.layer2_capacity),
        );
    }

    // 1. pyramid
    if l2 > l1 {
        return FillingResult::rejected(kind, [l1, l2], format!("pyramid rule: layer 2 ({}) > layer 1 ({})", l2, l1));
    }

    // 2. layer limit
    if l2 > 0 && ctx.max_layers < 2 {
        return FillingResult::rejected(kind, [l1, l2], format!("{} bars need a second layer, max layers is 1", l2));
    }

    let mut waste = 0;
    let fits_layer2 = |n: usize, l1: usize| n <= ctx.layer2_capacity && n <= l1;

    // 3. stirrup snap
    if l2 > 0 && l2 + 1 == ctx.stirrup_legs && fits_layer2(ctx.stirrup_legs, l1) {
        l2 += 1;
        waste += 1;
    }

    // 4. symmetry
    if ctx.prefer_symmetric {
        if l1 % 2 == 1 && l1 < ctx.layer1_capacity {
            l1 += 1;
            waste += 1;
        }
        if l2 % 2 == 1 && fits_layer2(l2 + 1, l1) {
            l2 += 1;
            waste += 1;
        }
    }

    // 5. alignment
    if l2 > 0 && l1 % 2 == 0 && l2 % 2 == 1 && fits_layer2(l2 + 1, l1) {
        l2 += 1;
        waste += 1;
    }

    // 6. no lone bars
    if l1 == 1 {
        if ctx.layer1_capacity < 2 {
            return FillingResult::rejected(kind, [l1, l2], "lone bar in layer 1 and no room for a second");
        }
        l1 = 2;
        waste += 1;
    }
    if l2 == 1 {
        if !fits_layer2(2, l1) {
            return FillingResult::rejected(kind, [l1, l2], "lone bar in layer 2 and no room for a second");
        }
        l2 = 2;
        waste += 1;
    }

    if l1 > ctx.layer1_capacity || l2 > ctx.layer2_capacity || l2 > l1 {
        return FillingResult::rejected(kind, [l1, l2], "fix-ups exceeded layer capacity");
    }

    FillingResult {
        strategy: kind,
        layer_counts: [l1, l2],
        waste_count: waste,
        is_valid: true,
        failing_reason: None,
    }
}

/// Score shared by every strategy; higher is better, invalid is `-inf`
pub fn score_filling(result: &FillingResult) -> f64 {
    if !result.is_valid {
        return f64::NEG_INFINITY;
    }
    let extra_layers = result.layer_count().saturating_sub(1) as f64;
    100.0 - 15.0 * extra_layers - 3.0 * result.waste_count as f64 - result.total_bars() as f64
}

/// Run every strategy and keep the best valid result.
///
/// Ties keep the earlier strategy. Returns the last rejection when none is
/// valid.
pub fn best_filling(strategies: &[&dyn FillingStrategy], ctx: &FillingContext) -> Option<FillingResult> {
    let mut best: Option<FillingResult> = None;
    for strategy in strategies {
        let result = strategy.compute(ctx);
        best = match best {
            None => Some(result),
            Some(current) if score_filling(&result) > score_filling(&current) => Some(result),
            Some(current) if !current.is_valid && !result.is_valid => Some(result),
            keep => keep,
        };
    }
    best
}

/// Greedy then Balanced
pub fn default_strategies() -> [&'static dyn FillingStrategy; 2] {
    [&GreedyStrategy, &BalancedStrategy]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::bars_area_cm2;

    fn ctx(required: f64, cap1: usize, cap2: usize) -> FillingContext {
        FillingContext {
            required_area_cm2: required,
            backbone_area_cm2: bars_area_cm2(20, 2),
            backbone_count: 2,
            backbone_diameter_mm: 20,
            addon_diameter_mm: 20,
            layer1_capacity: cap1,
            layer2_capacity: cap2,
            max_layers: 2,
            stirrup_legs: 2,
            prefer_symmetric: false,
        }
    }

    fn assert_pyramid(result: &FillingResult) {
        if result.is_valid {
            let [l1, l2] = result.layer_counts;
            assert!(l2 <= l1, "{:?}", result);
            assert!(l2 == 0 || l2 >= 2, "{:?}", result);
            assert!(l1 >= 2, "{:?}", result);
        }
    }

    #[test]
    fn test_addon_count() {
        // 3.14 cm² per D20: 12 − 6.28 = 5.72 → 2 bars
        assert_eq!(ctx(12.0, 5, 5).addon_bars_needed(), 2);
        assert_eq!(ctx(5.0, 5, 5).addon_bars_needed(), 0);
    }

    #[test]
    fn test_greedy_fills_layer_one_first() {
        // need 7 bars, 5 fit in layer 1
        let result = GreedyStrategy.compute(&ctx(bars_area_cm2(20, 7), 5, 5));
        assert!(result.is_valid);
        assert_eq!(result.layer_counts, [5, 2]);
        assert_eq!(result.waste_count, 0);
    }

    #[test]
    fn test_balanced_splits_evenly() {
        // [4, 3] then the alignment nudge puts 4 over 4
        let result = BalancedStrategy.compute(&ctx(bars_area_cm2(20, 7), 5, 5));
        assert!(result.is_valid);
        assert_eq!(result.layer_counts, [4, 4]);
        assert_eq!(result.waste_count, 1);
    }

    #[test]
    fn test_balanced_keeps_backbone_in_layer_one() {
        let mut c = ctx(bars_area_cm2(20, 6), 5, 5);
        c.backbone_count = 4;
        c.backbone_area_cm2 = bars_area_cm2(20, 4);
        let result = BalancedStrategy.compute(&c);
        assert!(result.is_valid);
        assert_eq!(result.layer_counts, [4, 2]);
        assert_eq!(result.addon_breakdown(4), vec![0, 2]);
    }

    #[test]
    fn test_second_layer_rejected_when_single_layer_only() {
        let mut c = ctx(bars_area_cm2(20, 7), 5, 5);
        c.max_layers = 1;
        let result = GreedyStrategy.compute(&c);
        assert!(!result.is_valid);
        assert!(result.failing_reason.unwrap().contains("second layer"));
    }

    #[test]
    fn test_lone_second_layer_bar_is_bumped_with_waste() {
        // need 6, 5 fit: layer 2 gets 1 → bumped to 2
        let result = GreedyStrategy.compute(&ctx(bars_area_cm2(20, 6), 5, 5));
        assert!(result.is_valid);
        assert_eq!(result.layer_counts, [5, 2]);
        assert_eq!(result.waste_count, 1);
    }

    #[test]
    fn test_lone_bar_rejected_without_room() {
        let result = GreedyStrategy.compute(&ctx(bars_area_cm2(20, 6), 5, 1));
        assert!(!result.is_valid);
        assert!(result.failing_reason.is_some());
    }

    #[test]
    fn test_stirrup_snap() {
        // need 8 → greedy [5, 3], snapped onto 4 legs
        let mut c = ctx(bars_area_cm2(20, 8), 5, 5);
        c.stirrup_legs = 4;
        let result = GreedyStrategy.compute(&c);
        assert!(result.is_valid);
        assert_eq!(result.layer_counts, [5, 4]);
        assert_eq!(result.waste_count, 1);
    }

    #[test]
    fn test_symmetry_rounds_up() {
        let mut c = ctx(0.0, 6, 6);
        c.prefer_symmetric = true;
        c.required_area_cm2 = bars_area_cm2(20, 3);
        let result = GreedyStrategy.compute(&c);
        assert!(result.is_valid);
        assert_eq!(result.layer_counts, [4, 0]);
        assert_eq!(result.waste_count, 1);
    }

    #[test]
    fn test_alignment_nudge() {
        // need 7 with cap1 4: greedy [4, 3] → layer 2 nudged to 4
        let result = GreedyStrategy.compute(&ctx(bars_area_cm2(20, 7), 4, 4));
        assert!(result.is_valid);
        assert_eq!(result.layer_counts, [4, 4]);
    }

    #[test]
    fn test_pyramid_violation_rejected() {
        // need 10 with cap1 3: greedy [3, 7] fails capacity or pyramid
        let result = GreedyStrategy.compute(&ctx(bars_area_cm2(20, 10), 3, 8));
        assert!(!result.is_valid);
        assert!(result.failing_reason.unwrap().contains("pyramid"));
    }

    #[test]
    fn test_pyramid_invariant_across_inputs() {
        for need in 2..14 {
            for cap1 in 2..7 {
                for cap2 in 0..7 {
                    for symmetric in [false, true] {
                        let mut c = ctx(bars_area_cm2(20, need), cap1, cap2);
                        c.prefer_symmetric = symmetric;
                        c.stirrup_legs = 4;
                        assert_pyramid(&GreedyStrategy.compute(&c));
                        assert_pyramid(&BalancedStrategy.compute(&c));
                    }
                }
            }
        }
    }

    #[test]
    fn test_score_prefers_single_layer_and_ties_to_greedy() {
        // need 4 with 2 per layer: both give [2, 2]
        let c = ctx(bars_area_cm2(20, 4), 2, 2);
        let greedy = GreedyStrategy.compute(&c);
        let balanced = BalancedStrategy.compute(&c);
        assert_eq!(score_filling(&greedy), score_filling(&balanced));
        let best = best_filling(&default_strategies(), &c).unwrap();
        assert_eq!(best.strategy, StrategyKind::Greedy);

        let single = FillingResult {
            strategy: StrategyKind::Balanced,
            layer_counts: [4, 0],
            waste_count: 0,
            is_valid: true,
            failing_reason: None,
        };
        assert!(score_filling(&single) > score_filling(&greedy));
    }

    #[test]
    fn test_invalid_scores_negative_infinity() {
        let result = FillingResult::rejected(StrategyKind::Greedy, [1, 0], "x");
        assert_eq!(score_filling(&result), f64::NEG_INFINITY);
    }
}

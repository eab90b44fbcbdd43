use std::cmp::Ordering;

use rayon::prelude::*;

use crate::cancel::CancelFlag;
use crate::candidates::{CandidateGenerator, CandidateGrid};
use crate::config::GreedyCriterion;
use crate::error::Result;
use crate::universe::{CoverageBitset, CoverageUniverse};

/// État du glouton : sous-ensembles restants et grilles retenues.
#[derive(Debug, Clone)]
pub struct GreedyState {
    remaining: CoverageBitset,
    selected: Vec<CandidateGrid>,
    total_cost: f64,
}

impl GreedyState {
    pub fn new(universe: &CoverageUniverse) -> Self {
        Self {
            remaining: universe.new_bitset(),
            selected: Vec::new(),
            total_cost: 0.0,
        }
    }

    pub fn remaining(&self) -> &CoverageBitset {
        &self.remaining
    }

    pub fn selected(&self) -> &[CandidateGrid] {
        &self.selected
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn is_complete(&self) -> bool {
        self.remaining.is_complete()
    }

    pub fn into_selected(self) -> Vec<CandidateGrid> {
        self.selected
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Selected { newly_covered: usize },
    /// Aucune candidate ne couvre de sous-ensemble restant.
    Stalled,
}

struct Scored {
    fresh: usize,
    candidate: CandidateGrid,
}

/// Ordre total : `Less` signifie que `a` est meilleure que `b`.
fn compare(a: &Scored, b: &Scored, criterion: GreedyCriterion) -> Ordering {
    let ratio = |s: &Scored| s.candidate.cost / s.fresh as f64;
    let by_fresh = b.fresh.cmp(&a.fresh);
    let by_ratio = ratio(a).total_cmp(&ratio(b));
    let by_index = a.candidate.index.cmp(&b.candidate.index);
    match criterion {
        GreedyCriterion::MaxCoverage => by_fresh.then(by_ratio).then(by_index),
        GreedyCriterion::CostEfficiency => by_ratio.then(by_fresh).then(by_index),
    }
}

fn prefer(a: Scored, b: Scored, criterion: GreedyCriterion) -> Scored {
    if compare(&a, &b, criterion) == Ordering::Greater {
        b
    } else {
        a
    }
}

/// Une itération : parcourt toutes les candidates par lots parallèles et retient la meilleure.
pub fn greedy_step(
    state: &mut GreedyState,
    generator: &CandidateGenerator,
    criterion: GreedyCriterion,
    batch_size: usize,
    cancel: &CancelFlag,
) -> Result<StepOutcome> {
    let mut best: Option<Scored> = None;

    for batch in generator.batches(batch_size) {
        cancel.check()?;
        let remaining = &state.remaining;
        let batch_best = batch
            .par_iter()
            .filter_map(|seed| {
                let candidate = generator.materialize(seed);
                let fresh = remaining.count_new(&candidate.covered);
                (fresh > 0).then_some(Scored { fresh, candidate })
            })
            .reduce_with(|a, b| prefer(a, b, criterion));

        best = match (best, batch_best) {
            (Some(a), Some(b)) => Some(prefer(a, b, criterion)),
            (a, b) => a.or(b),
        };
    }

    let Some(best) = best else {
        return Ok(StepOutcome::Stalled);
    };

    for &key in &best.candidate.covered {
        state.remaining.mark(key);
    }
    state.total_cost += best.candidate.cost;
    state.selected.push(best.candidate);

    Ok(StepOutcome::Selected {
        newly_covered: best.fresh,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Limits, PriceTable};
    use crate::models::{GuaranteeTarget, NumberPool};

    fn setup(sizes: &[usize]) -> (CoverageUniverse, CandidateGenerator) {
        let pool = NumberPool::new(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]).unwrap();
        let target = GuaranteeTarget::new(3);
        let prices = PriceTable::default().restricted_to(sizes);
        let universe = CoverageUniverse::build(&pool, &target, &Limits::default()).unwrap();
        let generator = CandidateGenerator::new(&pool, &target, &prices, &Limits::default()).unwrap();
        (universe, generator)
    }

    #[test]
    fn test_first_step_takes_first_simple_grid() {
        let (universe, generator) = setup(&[5]);
        let mut state = GreedyState::new(&universe);
        let outcome =
            greedy_step(&mut state, &generator, GreedyCriterion::MaxCoverage, 64, &CancelFlag::new()).unwrap();
        assert_eq!(outcome, StepOutcome::Selected { newly_covered: 10 });
        assert_eq!(state.selected()[0].grid.numbers(), &[1, 2, 3, 4, 5]);
        assert_eq!(state.remaining().uncovered_count(), 110);
        assert!((state.total_cost() - 2.20).abs() < 1e-9);
    }

    #[test]
    fn test_max_coverage_prefers_large_grid() {
        let (universe, generator) = setup(&[5, 7, 8, 9, 10]);
        let mut state = GreedyState::new(&universe);
        greedy_step(&mut state, &generator, GreedyCriterion::MaxCoverage, 64, &CancelFlag::new()).unwrap();
        assert_eq!(state.selected()[0].size(), 10);
        assert!(state.is_complete());
    }

    #[test]
    fn test_cost_efficiency_prefers_simple_grid() {
        let (universe, generator) = setup(&[5, 7, 8, 9, 10]);
        let mut state = GreedyState::new(&universe);
        greedy_step(&mut state, &generator, GreedyCriterion::CostEfficiency, 64, &CancelFlag::new()).unwrap();
        assert_eq!(state.selected()[0].size(), 5);
    }

    #[test]
    fn test_batch_size_does_not_change_choice() {
        let (universe, generator) = setup(&[5, 7]);
        let mut a = GreedyState::new(&universe);
        let mut b = GreedyState::new(&universe);
        for _ in 0..4 {
            greedy_step(&mut a, &generator, GreedyCriterion::CostEfficiency, 1, &CancelFlag::new()).unwrap();
            greedy_step(&mut b, &generator, GreedyCriterion::CostEfficiency, 1000, &CancelFlag::new()).unwrap();
        }
        let ga: Vec<_> = a.selected().iter().map(|c| c.grid.clone()).collect();
        let gb: Vec<_> = b.selected().iter().map(|c| c.grid.clone()).collect();
        assert_eq!(ga, gb);
    }

    #[test]
    fn test_stalled_when_complete() {
        let (universe, generator) = setup(&[10]);
        let mut state = GreedyState::new(&universe);
        greedy_step(&mut state, &generator, GreedyCriterion::MaxCoverage, 64, &CancelFlag::new()).unwrap();
        let outcome =
            greedy_step(&mut state, &generator, GreedyCriterion::MaxCoverage, 64, &CancelFlag::new()).unwrap();
        assert_eq!(outcome, StepOutcome::Stalled);
    }

    #[test]
    fn test_cancelled_step() {
        let (universe, generator) = setup(&[5]);
        let mut state = GreedyState::new(&universe);
        let cancel = CancelFlag::new();
        cancel.cancel();
        let err = greedy_step(&mut state, &generator, GreedyCriterion::MaxCoverage, 64, &cancel).unwrap_err();
        assert_eq!(err, crate::error::CoverError::Cancelled);
        assert!(state.selected().is_empty());
    }
}

pub mod baseline;
pub mod greedy;

use serde::Serialize;

use crate::bounds::equivalent_simple_grids;
use crate::cancel::CancelFlag;
use crate::candidates::CandidateGenerator;
use crate::config::CoverConfig;
use crate::error::{CoverError, Result};
use crate::models::Grid;
use crate::progress::progress_bar;
use crate::universe::CoverageUniverse;

use self::baseline::BaselineSummary;
use self::greedy::{greedy_step, GreedyState, StepOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    GreedyMixed,
    PureSmall,
    PureLarge,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::GreedyMixed => write!(f, "glouton mixte"),
            Strategy::PureSmall => write!(f, "grilles simples"),
            Strategy::PureLarge => write!(f, "grille multiple unique"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AbortReason {
    GridCap,
    Stalled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum SolverStatus {
    Covered,
    Aborted { uncovered: u64, reason: AbortReason },
}

#[derive(Debug, Clone, Serialize)]
pub struct Solution {
    pub strategy: Strategy,
    pub grids: Vec<Grid>,
    pub total_cost: f64,
    pub status: SolverStatus,
}

impl Solution {
    pub fn grid_count(&self) -> usize {
        self.grids.len()
    }

    pub fn is_complete(&self) -> bool {
        self.status == SolverStatus::Covered
    }

    pub fn equivalent_simple_grids(&self, draw_size: usize) -> u64 {
        equivalent_simple_grids(&self.grids, draw_size)
    }

    /// Refuse une solution partielle : elle ne garantit rien.
    pub fn require_guarantee(self) -> Result<Self> {
        match self.status {
            SolverStatus::Covered => Ok(self),
            SolverStatus::Aborted { uncovered, .. } => Err(CoverError::SolverAborted {
                selected: self.grids.len(),
                uncovered,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SolverOutcome {
    pub greedy: Solution,
    pub pure_small: Option<BaselineSummary>,
    pub pure_large: Option<BaselineSummary>,
    pub recommendation: Solution,
}

/// Boucle gloutonne jusqu'à couverture complète ou plafond de grilles.
pub fn run_greedy(
    universe: &CoverageUniverse,
    generator: &CandidateGenerator,
    config: &CoverConfig,
    cancel: &CancelFlag,
) -> Result<Solution> {
    let mut state = GreedyState::new(universe);
    let pb = progress_bar(universe.len() as u64, config.show_progress);
    pb.set_message("couverture gloutonne");

    let status = loop {
        if state.is_complete() {
            break SolverStatus::Covered;
        }
        if state.selected().len() >= config.solver.max_grids {
            break SolverStatus::Aborted {
                uncovered: state.remaining().uncovered_count(),
                reason: AbortReason::GridCap,
            };
        }
        match greedy_step(
            &mut state,
            generator,
            config.solver.criterion,
            config.limits.batch_size,
            cancel,
        )? {
            StepOutcome::Selected { newly_covered } => {
                log::debug!(
                    "Grille {} retenue : +{} sous-ensembles, {} restants",
                    state.selected().len(),
                    newly_covered,
                    state.remaining().uncovered_count()
                );
                pb.inc(newly_covered as u64);
            }
            StepOutcome::Stalled => {
                break SolverStatus::Aborted {
                    uncovered: state.remaining().uncovered_count(),
                    reason: AbortReason::Stalled,
                };
            }
        }
    };
    pb.finish_and_clear();

    if let SolverStatus::Aborted { uncovered, reason } = status {
        log::warn!(
            "Glouton interrompu ({:?}) après {} grilles : {} sous-ensembles non couverts",
            reason,
            state.selected().len(),
            uncovered
        );
        if let Some(key) = state.remaining().uncovered_keys().next() {
            if let Some(subset) = universe.subsets().iter().find(|s| s.key == key) {
                log::debug!("Premier sous-ensemble non couvert : {:?}", subset.numbers);
            }
        }
    }

    let total_cost = state.total_cost();
    Ok(Solution {
        strategy: Strategy::GreedyMixed,
        grids: state.into_selected().into_iter().map(|c| c.grid).collect(),
        total_cost,
        status,
    })
}

fn cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Glouton, références pures, puis la moins chère des options complètes.
pub fn solve(
    universe: &CoverageUniverse,
    generator: &CandidateGenerator,
    config: &CoverConfig,
    cancel: &CancelFlag,
) -> Result<SolverOutcome> {
    let pool = universe.pool();
    let greedy = run_greedy(universe, generator, config, cancel)?;
    let pure_small = baseline::pure_small(pool, &config.target, &config.prices);
    let pure_large = baseline::pure_large(pool, &config.prices);

    // Ordre de préférence à coût égal : glouton, grille multiple, grilles simples.
    let mut options: Vec<(Strategy, i64)> = Vec::new();
    if greedy.is_complete() {
        options.push((Strategy::GreedyMixed, cents(greedy.total_cost)));
    }
    for summary in pure_large.iter().chain(pure_small.iter()) {
        options.push((summary.strategy, cents(summary.total_cost)));
    }
    let chosen = options.iter().min_by_key(|(_, cost)| *cost).map(|(s, _)| *s);

    let recommendation = match chosen {
        Some(Strategy::PureLarge) => pure_large
            .as_ref()
            .map(|s| baseline::materialize(s, pool, &config.target))
            .unwrap_or_else(|| greedy.clone()),
        Some(Strategy::PureSmall) => pure_small
            .as_ref()
            .map(|s| baseline::materialize(s, pool, &config.target))
            .unwrap_or_else(|| greedy.clone()),
        _ => greedy.clone(),
    };

    log::info!(
        "Recommandation : {} ({} grilles, {:.2} €)",
        recommendation.strategy,
        recommendation.grid_count(),
        recommendation.total_cost
    );

    Ok(SolverOutcome {
        greedy,
        pure_small,
        pure_large,
        recommendation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::BoundRecord;
    use crate::combinatorics::k_combinations;
    use crate::config::{GreedyCriterion, PriceTable};
    use crate::models::NumberPool;

    fn config(sizes: &[usize]) -> CoverConfig {
        CoverConfig {
            prices: PriceTable::default().restricted_to(sizes),
            ..CoverConfig::default()
        }
    }

    fn build(numbers: &[u8], config: &CoverConfig) -> (CoverageUniverse, CandidateGenerator) {
        let pool = NumberPool::new(numbers).unwrap();
        let universe = CoverageUniverse::build(&pool, &config.target, &config.limits).unwrap();
        let generator = CandidateGenerator::new(&pool, &config.target, &config.prices, &config.limits).unwrap();
        (universe, generator)
    }

    fn covers_universe(universe: &CoverageUniverse, grids: &[Grid]) -> bool {
        let mut bits = universe.new_bitset();
        for grid in grids {
            for subset in k_combinations(grid.numbers(), universe.threshold()) {
                if let Some(key) = universe.key_of(&subset) {
                    bits.mark(key);
                }
            }
        }
        bits.is_complete()
    }

    #[test]
    fn test_ten_numbers_simple_grids() {
        let cfg = config(&[5]);
        let (universe, generator) = build(&(1..=10).collect::<Vec<u8>>(), &cfg);
        let solution = run_greedy(&universe, &generator, &cfg, &CancelFlag::new()).unwrap();
        assert!(solution.is_complete());
        assert!(solution.grid_count() >= 12, "{} grilles < borne 12", solution.grid_count());
        assert!(solution.grid_count() as u64 >= BoundRecord::compute(10, 3, 5).floor);
        assert!(covers_universe(&universe, &solution.grids));
        assert!((solution.total_cost - solution.grid_count() as f64 * 2.20).abs() < 1e-6);
    }

    #[test]
    fn test_greedy_deterministic() {
        let cfg = config(&[5, 7]);
        let numbers = [3, 8, 15, 16, 22, 29, 31, 37, 40, 44, 47];
        let (u1, g1) = build(&numbers, &cfg);
        let (u2, g2) = build(&numbers, &cfg);
        let a = run_greedy(&u1, &g1, &cfg, &CancelFlag::new()).unwrap();
        let b = run_greedy(&u2, &g2, &cfg, &CancelFlag::new()).unwrap();
        assert_eq!(a.grids, b.grids);
        assert_eq!(a.total_cost, b.total_cost);
    }

    #[test]
    fn test_grid_cap_aborts() {
        let mut cfg = config(&[5]);
        cfg.solver.max_grids = 3;
        let (universe, generator) = build(&(1..=10).collect::<Vec<u8>>(), &cfg);
        let solution = run_greedy(&universe, &generator, &cfg, &CancelFlag::new()).unwrap();
        assert_eq!(solution.grid_count(), 3);
        assert!(!solution.is_complete());
        assert!(matches!(
            solution.status,
            SolverStatus::Aborted { reason: AbortReason::GridCap, .. }
        ));
        let err = solution.require_guarantee().unwrap_err();
        assert!(matches!(err, CoverError::SolverAborted { selected: 3, .. }));
    }

    #[test]
    fn test_stalled_when_candidates_capped() {
        let mut cfg = config(&[5]);
        cfg.limits.max_small_candidates = Some(1);
        let (universe, generator) = build(&(1..=10).collect::<Vec<u8>>(), &cfg);
        let solution = run_greedy(&universe, &generator, &cfg, &CancelFlag::new()).unwrap();
        assert_eq!(solution.grid_count(), 1);
        assert_eq!(
            solution.status,
            SolverStatus::Aborted { uncovered: 110, reason: AbortReason::Stalled }
        );
    }

    #[test]
    fn test_solve_recommends_cheapest() {
        let cfg = config(&[5, 7, 8, 9, 10]);
        let (universe, generator) = build(&(1..=10).collect::<Vec<u8>>(), &cfg);
        let outcome = solve(&universe, &generator, &cfg, &CancelFlag::new()).unwrap();
        assert_eq!(outcome.greedy.grid_count(), 1);
        assert_eq!(outcome.pure_small.as_ref().unwrap().grid_count, 252);
        assert!(outcome.pure_large.is_some());
        // Les trois options coûtent 554,40 € : le glouton l'emporte à égalité.
        assert_eq!(outcome.recommendation.strategy, Strategy::GreedyMixed);
    }

    #[test]
    fn test_solve_cost_efficiency_beats_large_grid() {
        let mut cfg = config(&[5, 7, 8, 9, 10]);
        cfg.solver.criterion = GreedyCriterion::CostEfficiency;
        let (universe, generator) = build(&(1..=10).collect::<Vec<u8>>(), &cfg);
        let outcome = solve(&universe, &generator, &cfg, &CancelFlag::new()).unwrap();
        assert!(outcome.greedy.grids.iter().all(|g| g.size() == 5));
        assert_eq!(outcome.recommendation.strategy, Strategy::GreedyMixed);
        assert!(outcome.recommendation.total_cost < 554.40);
    }

    #[test]
    fn test_solve_falls_back_to_baseline() {
        let mut cfg = config(&[5, 7]);
        cfg.solver.criterion = GreedyCriterion::CostEfficiency;
        cfg.solver.max_grids = 2;
        let (universe, generator) = build(&[1, 2, 3, 4, 5, 6, 7], &cfg);
        let outcome = solve(&universe, &generator, &cfg, &CancelFlag::new()).unwrap();
        assert!(!outcome.greedy.is_complete());
        assert!(outcome.recommendation.is_complete());
        assert_eq!(outcome.recommendation.strategy, Strategy::PureLarge);
        assert!((outcome.recommendation.total_cost - 46.20).abs() < 1e-9);
    }

    #[test]
    fn test_solution_serializes_strategy_label() {
        let solution = Solution {
            strategy: Strategy::PureSmall,
            grids: vec![Grid::new(&[1, 2, 3, 4, 5]).unwrap()],
            total_cost: 2.20,
            status: SolverStatus::Covered,
        };
        let json = serde_json::to_string(&solution).unwrap();
        assert!(json.contains("\"pure-small\""), "{json}");
        assert!(json.contains("\"covered\""), "{json}");
    }
}

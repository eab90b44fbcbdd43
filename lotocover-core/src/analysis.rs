use serde::Serialize;

use crate::bounds::{BoundRecord, SolutionClass};
use crate::cancel::CancelFlag;
use crate::candidates::CandidateGenerator;
use crate::config::CoverConfig;
use crate::error::Result;
use crate::models::{GuaranteeTarget, NumberPool};
use crate::scenario::{analyze_scenarios, ScenarioAnalysis};
use crate::solver::{solve, SolverOutcome};
use crate::universe::CoverageUniverse;
use crate::validator::{validate, ValidationReport};

#[derive(Debug, Clone, Serialize)]
pub struct CoverageAnalysis {
    pub pool: NumberPool,
    pub target: GuaranteeTarget,
    pub universe_size: usize,
    pub candidate_count: u64,
    pub bounds: BoundRecord,
    pub solver: SolverOutcome,
    /// Grilles simples équivalentes de la recommandation.
    pub equivalent_simple_grids: u64,
    pub classification: SolutionClass,
    pub validation: ValidationReport,
    pub scenarios: ScenarioAnalysis,
}

impl CoverageAnalysis {
    /// Garantie prouvée par la validation exhaustive, jamais déduite du solveur seul.
    pub fn is_guaranteed(&self) -> bool {
        self.solver.recommendation.is_complete() && self.validation.is_guaranteed()
    }
}

/// Bornes, solveur, classification, validation et scénarios, dans cet ordre.
pub fn analyze(pool: &NumberPool, config: &CoverConfig, cancel: &CancelFlag) -> Result<CoverageAnalysis> {
    config.validate()?;
    config.limits.check_pool(pool)?;
    config.target.check_pool(pool)?;

    let universe = CoverageUniverse::build(pool, &config.target, &config.limits)?;
    let generator = CandidateGenerator::new(pool, &config.target, &config.prices, &config.limits)?;
    log::info!(
        "Sélection de {} numéros, garantie {} : {} sous-ensembles, {} grilles candidates",
        pool.len(),
        config.target,
        universe.len(),
        generator.total()
    );

    let bounds = BoundRecord::compute(pool.len(), config.target.threshold, config.target.draw_size);
    let solver = solve(&universe, &generator, config, cancel)?;

    let recommendation = &solver.recommendation;
    let equivalent_simple_grids = recommendation.equivalent_simple_grids(config.target.draw_size);
    let classification = bounds.classify(equivalent_simple_grids);
    log::info!(
        "Plancher {} grilles simples, solution équivalente à {} : {}",
        bounds.floor,
        equivalent_simple_grids,
        classification
    );

    let validation = validate(pool, &recommendation.grids, config, cancel)?;
    let scenarios = analyze_scenarios(pool, recommendation, config)?;

    Ok(CoverageAnalysis {
        pool: pool.clone(),
        target: config.target,
        universe_size: universe.len(),
        candidate_count: generator.total(),
        bounds,
        solver,
        equivalent_simple_grids,
        classification,
        validation,
        scenarios,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PriceTable, ValidationMode};
    use crate::error::CoverError;
    use crate::solver::Strategy;
    use crate::validator::GuaranteeVerdict;

    fn pool(numbers: &[u8]) -> NumberPool {
        NumberPool::new(numbers).unwrap()
    }

    fn test_config(sizes: &[usize]) -> CoverConfig {
        CoverConfig {
            prices: PriceTable::default().restricted_to(sizes),
            ..CoverConfig::default()
        }
    }

    #[test]
    fn test_analyze_ten_numbers() {
        let analysis = analyze(&pool(&[3, 7, 11, 19, 23, 28, 31, 36, 42, 45]), &test_config(&[5]), &CancelFlag::new())
            .unwrap();
        assert_eq!(analysis.universe_size, 120);
        assert_eq!(analysis.candidate_count, 252);
        assert_eq!(analysis.bounds.floor, 14);
        assert_eq!(analysis.solver.recommendation.strategy, Strategy::GreedyMixed);
        assert!(analysis.equivalent_simple_grids >= analysis.bounds.floor);
        assert_ne!(analysis.classification, SolutionClass::Impossible);
        assert_eq!(analysis.validation.verdict, GuaranteeVerdict::Proven);
        assert!(analysis.is_guaranteed());
        assert_eq!(analysis.scenarios.levels.len(), 5);
    }

    #[test]
    fn test_analyze_mixed_menu() {
        let numbers: Vec<u8> = (1..=12).collect();
        let analysis = analyze(&pool(&numbers), &test_config(&[5, 7, 8]), &CancelFlag::new()).unwrap();
        assert!(analysis.solver.recommendation.is_complete());
        assert!(analysis.is_guaranteed());
        assert!(analysis.equivalent_simple_grids >= analysis.bounds.floor);
    }

    #[test]
    fn test_analyze_rejects_small_pool() {
        let err = analyze(&pool(&[1, 2, 3, 4]), &CoverConfig::default(), &CancelFlag::new()).unwrap_err();
        assert!(matches!(err, CoverError::InvalidInput(_)));
    }

    #[test]
    fn test_analyze_rejects_large_pool() {
        let mut config = CoverConfig::default();
        config.limits.max_pool_size = 8;
        let numbers: Vec<u8> = (1..=9).collect();
        let err = analyze(&pool(&numbers), &config, &CancelFlag::new()).unwrap_err();
        assert!(matches!(err, CoverError::InvalidInput(_)));
    }

    #[test]
    fn test_analyze_sampled_not_guaranteed() {
        let mut config = test_config(&[5]);
        config.validation.mode = ValidationMode::Sampled;
        config.validation.sample_count = 500;
        config.validation.seed = Some(1);
        let numbers: Vec<u8> = (1..=8).collect();
        let analysis = analyze(&pool(&numbers), &config, &CancelFlag::new()).unwrap();
        assert!(analysis.solver.recommendation.is_complete());
        assert_eq!(analysis.validation.verdict, GuaranteeVerdict::NotApplicable);
        assert!(!analysis.is_guaranteed());
    }

    #[test]
    fn test_analysis_serializes() {
        let numbers: Vec<u8> = (1..=7).collect();
        let analysis = analyze(&pool(&numbers), &test_config(&[5, 7]), &CancelFlag::new()).unwrap();
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["pool"], serde_json::json!([1, 2, 3, 4, 5, 6, 7]));
        assert!(json["validation"]["verdict"].is_object());
        assert!(json["scenarios"]["levels"].is_array());
    }

    #[test]
    fn test_cancelled_analysis() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let numbers: Vec<u8> = (1..=10).collect();
        let err = analyze(&pool(&numbers), &test_config(&[5]), &cancel).unwrap_err();
        assert_eq!(err, CoverError::Cancelled);
    }
}

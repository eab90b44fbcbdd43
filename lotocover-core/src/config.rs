use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{invalid, CoverError, Result};
use crate::models::{GuaranteeTarget, NumberPool, DRAW_SIZE, MAX_GRID_SIZE};

/// Prix d'une grille selon son nombre de numéros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceTable(BTreeMap<usize, f64>);

impl Default for PriceTable {
    fn default() -> Self {
        Self::from_pairs(&[(5, 2.20), (7, 46.20), (8, 123.20), (9, 277.20), (10, 554.40)])
    }
}

impl PriceTable {
    pub fn from_pairs(pairs: &[(usize, f64)]) -> Self {
        Self(pairs.iter().copied().collect())
    }

    pub fn price(&self, size: usize) -> Option<f64> {
        self.0.get(&size).copied()
    }

    /// Tailles tarifées, par ordre croissant.
    pub fn sizes(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.keys().copied()
    }

    /// Ne garde que les tailles listées (menu réduit).
    pub fn restricted_to(&self, sizes: &[usize]) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(k, _)| sizes.contains(k))
                .map(|(&k, &v)| (k, v))
                .collect(),
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(invalid("grille tarifaire vide"));
        }
        for (&size, &price) in &self.0 {
            if !(DRAW_SIZE..=MAX_GRID_SIZE).contains(&size) {
                return Err(invalid(format!(
                    "taille de grille {size} non jouable ({DRAW_SIZE}-{MAX_GRID_SIZE})"
                )));
            }
            if !price.is_finite() || price <= 0.0 {
                return Err(invalid(format!("prix invalide {price} pour la taille {size}")));
            }
        }
        Ok(())
    }
}

/// Gain indicatif d'une grille simple selon son nombre de bons numéros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayoutTable(BTreeMap<usize, f64>);

impl Default for PayoutTable {
    fn default() -> Self {
        Self([(5, 100_000.0), (4, 500.0), (3, 20.0), (2, 5.0), (1, 0.0)].into_iter().collect())
    }
}

impl PayoutTable {
    pub fn from_pairs(pairs: &[(usize, f64)]) -> Self {
        Self(pairs.iter().copied().collect())
    }

    pub fn payout(&self, matches: usize) -> f64 {
        self.0.get(&matches).copied().unwrap_or(0.0)
    }
}

/// Plafonds de sécurité contre l'explosion combinatoire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_pool_size: usize,
    pub max_universe_size: u64,
    pub max_candidates: u64,
    /// Plafond de grilles simples examinées ; `None` = toutes.
    pub max_small_candidates: Option<u64>,
    pub max_exhaustive_draws: u64,
    pub batch_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_pool_size: 20,
            max_universe_size: 200_000,
            max_candidates: 2_000_000,
            max_small_candidates: Some(50_000),
            max_exhaustive_draws: 2_000_000,
            batch_size: 4096,
        }
    }
}

impl Limits {
    pub fn check_pool(&self, pool: &NumberPool) -> Result<()> {
        if pool.len() > self.max_pool_size {
            return Err(invalid(format!(
                "sélection de {} numéros au-delà du plafond ({})",
                pool.len(),
                self.max_pool_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GreedyCriterion {
    /// Maximise les sous-ensembles nouvellement couverts, puis le coût unitaire.
    #[default]
    MaxCoverage,
    /// Minimise le coût par sous-ensemble nouvellement couvert.
    CostEfficiency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub criterion: GreedyCriterion,
    pub max_grids: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            criterion: GreedyCriterion::MaxCoverage,
            max_grids: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    #[default]
    Exhaustive,
    Sampled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub mode: ValidationMode,
    pub sample_count: u64,
    pub seed: Option<u64>,
    pub max_counterexamples: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            mode: ValidationMode::Exhaustive,
            sample_count: 100_000,
            seed: None,
            max_counterexamples: 100,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverConfig {
    pub target: GuaranteeTarget,
    pub prices: PriceTable,
    pub payouts: PayoutTable,
    pub limits: Limits,
    pub solver: SolverConfig,
    pub validation: ValidationConfig,
    pub show_progress: bool,
}

impl CoverConfig {
    pub fn validate(&self) -> Result<()> {
        self.target.validate()?;
        self.prices.validate()?;
        if self.limits.batch_size == 0 {
            return Err(invalid("taille de lot nulle"));
        }
        if self.solver.max_grids == 0 {
            return Err(invalid("plafond de grilles nul"));
        }
        Ok(())
    }
}

pub fn save_config(config: &CoverConfig, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(config).map_err(|e| CoverError::Config(e.to_string()))?;
    std::fs::write(path, json).map_err(|e| CoverError::Config(format!("{}: {e}", path.display())))?;
    Ok(())
}

pub fn load_config(path: &Path) -> Result<CoverConfig> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| CoverError::Config(format!("{}: {e}", path.display())))?;
    let config: CoverConfig =
        serde_json::from_str(&json).map_err(|e| CoverError::Config(format!("{}: {e}", path.display())))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prices() {
        let prices = PriceTable::default();
        assert_eq!(prices.price(5), Some(2.20));
        assert_eq!(prices.price(6), None);
        assert_eq!(prices.price(10), Some(554.40));
        assert_eq!(prices.sizes().collect::<Vec<_>>(), vec![5, 7, 8, 9, 10]);
    }

    #[test]
    fn test_restricted_prices() {
        let prices = PriceTable::default().restricted_to(&[5, 8]);
        assert_eq!(prices.sizes().collect::<Vec<_>>(), vec![5, 8]);
    }

    #[test]
    fn test_invalid_prices() {
        assert!(PriceTable::from_pairs(&[]).validate().is_err());
        assert!(PriceTable::from_pairs(&[(4, 1.0)]).validate().is_err());
        assert!(PriceTable::from_pairs(&[(5, -1.0)]).validate().is_err());
        assert!(PriceTable::from_pairs(&[(5, 1.0)]).validate().is_ok());
    }

    #[test]
    fn test_default_config_valid() {
        let config = CoverConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.target.threshold, 3);
        assert_eq!(config.solver.criterion, GreedyCriterion::MaxCoverage);
        assert_eq!(config.validation.max_counterexamples, 100);
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = CoverConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let restored: CoverConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.target, config.target);
        assert_eq!(restored.limits, config.limits);
        assert_eq!(restored.solver, config.solver);
        assert_eq!(restored.prices.sizes().collect::<Vec<_>>(), vec![5, 7, 8, 9, 10]);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{ "solver": { "max_grids": 12 }, "prices": { "5": 2.5 } }"#;
        let config: CoverConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.solver.max_grids, 12);
        assert_eq!(config.solver.criterion, GreedyCriterion::MaxCoverage);
        assert_eq!(config.prices.price(5), Some(2.5));
        assert_eq!(config.prices.price(7), None);
        assert_eq!(config.limits, Limits::default());
    }

    #[test]
    fn test_save_and_load() {
        let mut config = CoverConfig::default();
        config.solver.max_grids = 42;
        let tmp = std::env::temp_dir().join("lotocover_test_config.json");
        save_config(&config, &tmp).unwrap();
        let loaded = load_config(&tmp).unwrap();
        assert_eq!(loaded.solver.max_grids, 42);
        let _ = std::fs::remove_file(&tmp);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("/nonexistent/lotocover.json")).unwrap_err();
        assert!(matches!(err, CoverError::Config(_)));
    }
}

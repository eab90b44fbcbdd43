use serde::Serialize;

use crate::combinatorics::{binomial, colex_rank, k_index_combinations};
use crate::config::Limits;
use crate::error::{CoverError, Result};
use crate::models::{GuaranteeTarget, NumberPool};

/// Clé canonique d'un sous-ensemble : rang colex de ses positions dans la sélection,
/// dense dans [0, C(N, m)).
pub type SubsetKey = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageSubset {
    pub numbers: Vec<u8>,
    pub key: SubsetKey,
}

/// Ensemble des m-sous-ensembles de la sélection qu'une grille doit contenir.
#[derive(Debug, Clone)]
pub struct CoverageUniverse {
    pool: NumberPool,
    threshold: usize,
    subsets: Vec<CoverageSubset>,
}

impl CoverageUniverse {
    /// Refuse avant toute énumération si C(N, m) dépasse le plafond.
    pub fn build(pool: &NumberPool, target: &GuaranteeTarget, limits: &Limits) -> Result<Self> {
        target.check_pool(pool)?;
        let size = binomial(pool.len(), target.threshold);
        if size > limits.max_universe_size {
            return Err(CoverError::UniverseTooLarge {
                size,
                ceiling: limits.max_universe_size,
            });
        }

        let numbers = pool.numbers();
        let mut subsets = Vec::with_capacity(size as usize);
        let mut iter = k_index_combinations(pool.len(), target.threshold);
        while let Some(positions) = iter.advance() {
            subsets.push(CoverageSubset {
                numbers: positions.iter().map(|&p| numbers[p]).collect(),
                key: colex_rank(positions),
            });
        }

        log::debug!(
            "Univers construit : C({}, {}) = {} sous-ensembles",
            pool.len(),
            target.threshold,
            subsets.len()
        );

        Ok(Self {
            pool: pool.clone(),
            threshold: target.threshold,
            subsets,
        })
    }

    pub fn len(&self) -> usize {
        self.subsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subsets.is_empty()
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn pool(&self) -> &NumberPool {
        &self.pool
    }

    pub fn subsets(&self) -> &[CoverageSubset] {
        &self.subsets
    }

    /// Clé d'un ensemble de numéros, `None` s'il n'appartient pas à l'univers.
    pub fn key_of(&self, numbers: &[u8]) -> Option<SubsetKey> {
        if numbers.len() != self.threshold {
            return None;
        }
        let mut positions = numbers
            .iter()
            .map(|&n| self.pool.position_of(n))
            .collect::<Option<Vec<usize>>>()?;
        positions.sort_unstable();
        if positions.windows(2).any(|w| w[0] == w[1]) {
            return None;
        }
        Some(colex_rank(&positions))
    }

    pub fn contains(&self, numbers: &[u8]) -> bool {
        self.key_of(numbers).is_some()
    }

    pub fn new_bitset(&self) -> CoverageBitset {
        CoverageBitset::new(self.subsets.len())
    }
}

/// Suivi de couverture indexé par `SubsetKey`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageBitset {
    covered: Vec<bool>,
    covered_count: u64,
}

impl CoverageBitset {
    pub fn new(size: usize) -> Self {
        Self {
            covered: vec![false; size],
            covered_count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.covered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.covered.is_empty()
    }

    pub fn is_covered(&self, key: SubsetKey) -> bool {
        self.covered.get(key as usize).copied().unwrap_or(false)
    }

    /// Marque une clé ; renvoie vrai si elle n'était pas encore couverte.
    pub fn mark(&mut self, key: SubsetKey) -> bool {
        match self.covered.get_mut(key as usize) {
            Some(slot) if !*slot => {
                *slot = true;
                self.covered_count += 1;
                true
            }
            _ => false,
        }
    }

    pub fn count_new(&self, keys: &[SubsetKey]) -> usize {
        keys.iter().filter(|&&k| !self.is_covered(k)).count()
    }

    pub fn covered_count(&self) -> u64 {
        self.covered_count
    }

    pub fn uncovered_count(&self) -> u64 {
        self.covered.len() as u64 - self.covered_count
    }

    pub fn is_complete(&self) -> bool {
        self.uncovered_count() == 0
    }

    pub fn uncovered_keys(&self) -> impl Iterator<Item = SubsetKey> + '_ {
        self.covered
            .iter()
            .enumerate()
            .filter(|(_, &c)| !c)
            .map(|(i, _)| i as SubsetKey)
    }
}

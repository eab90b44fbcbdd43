use serde::Serialize;

use crate::combinatorics::{binomial, colex_rank, k_index_combinations, IndexCombinations};
use crate::config::{Limits, PriceTable};
use crate::error::{invalid, CoverError, Result};
use crate::models::{Grid, GuaranteeTarget, NumberPool, MAX_GRID_SIZE};
use crate::universe::SubsetKey;

/// Grille candidate : ses numéros, son prix et les sous-ensembles qu'elle couvre.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateGrid {
    pub grid: Grid,
    pub cost: f64,
    pub covered: Vec<SubsetKey>,
    /// Rang dans l'ordre d'énumération, sert à départager les ex-aequo.
    pub index: u64,
}

impl CandidateGrid {
    pub fn size(&self) -> usize {
        self.grid.size()
    }

    /// Coût par sous-ensemble couvert.
    pub fn efficiency(&self) -> f64 {
        self.cost / self.covered.len() as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizePlan {
    pub size: usize,
    pub price: f64,
    /// C(N, k) grilles possibles.
    pub available: u64,
    /// Grilles réellement parcourues après plafonnement.
    pub scanned: u64,
}

/// Générateur paresseux de grilles candidates, tailles croissantes puis ordre lexicographique.
#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    pool: NumberPool,
    plans: Vec<SizePlan>,
    /// Par taille : motifs d'indices des m-sous-ensembles d'une grille.
    patterns: Vec<Vec<Vec<usize>>>,
}

impl CandidateGenerator {
    pub fn new(
        pool: &NumberPool,
        target: &GuaranteeTarget,
        prices: &PriceTable,
        limits: &Limits,
    ) -> Result<Self> {
        target.check_pool(pool)?;
        let max_size = pool.len().min(MAX_GRID_SIZE);

        let mut plans = Vec::new();
        for size in prices.sizes() {
            if size < target.threshold || size > max_size {
                continue;
            }
            let Some(price) = prices.price(size) else { continue };
            let available = binomial(pool.len(), size);
            let scanned = match limits.max_small_candidates {
                Some(cap) if size == target.draw_size => available.min(cap),
                _ => available,
            };
            plans.push(SizePlan { size, price, available, scanned });
        }

        if plans.is_empty() {
            return Err(invalid(format!(
                "aucune taille de grille tarifée jouable avec {} numéros",
                pool.len()
            )));
        }

        let total: u64 = plans.iter().map(|p| p.scanned).fold(0u64, u64::saturating_add);
        if total > limits.max_candidates {
            return Err(CoverError::CandidateSpaceTooLarge {
                size: total,
                ceiling: limits.max_candidates,
            });
        }

        let patterns = plans
            .iter()
            .map(|p| k_index_combinations(p.size, target.threshold).collect())
            .collect();

        log::info!(
            "{} grilles candidates ({})",
            total,
            plans
                .iter()
                .map(|p| format!("{}n:{}", p.size, p.scanned))
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self {
            pool: pool.clone(),
            plans,
            patterns,
        })
    }

    pub fn plans(&self) -> &[SizePlan] {
        &self.plans
    }

    pub fn total(&self) -> u64 {
        self.plans.iter().map(|p| p.scanned).sum()
    }

    pub fn iter(&self) -> CandidateIter<'_> {
        CandidateIter { seeds: self.seeds() }
    }

    /// Positions des grilles seules, sans calcul des clés couvertes.
    pub fn seeds(&self) -> SeedIter<'_> {
        SeedIter {
            generator: self,
            plan: 0,
            combos: self.plans.first().map(|p| k_index_combinations(self.pool.len(), p.size)),
            emitted_in_plan: 0,
            next_index: 0,
        }
    }

    /// Lots de graines, à matérialiser en parallèle par l'appelant.
    pub fn batches(&self, batch_size: usize) -> SeedBatches<'_> {
        SeedBatches {
            inner: self.seeds(),
            batch_size: batch_size.max(1),
        }
    }

    pub fn materialize(&self, seed: &CandidateSeed) -> CandidateGrid {
        let numbers: Vec<u8> = seed.positions.iter().map(|&p| self.pool.numbers()[p]).collect();
        let mut scratch = Vec::with_capacity(seed.positions.len());
        let covered = self.patterns[seed.plan]
            .iter()
            .map(|pattern| {
                scratch.clear();
                scratch.extend(pattern.iter().map(|&i| seed.positions[i]));
                colex_rank(&scratch)
            })
            .collect();
        CandidateGrid {
            grid: Grid::from_sorted_unchecked(&numbers),
            cost: self.plans[seed.plan].price,
            covered,
            index: seed.index,
        }
    }
}

/// Grille candidate non matérialisée : taille, positions dans la sélection, rang.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSeed {
    plan: usize,
    positions: Vec<usize>,
    index: u64,
}

impl CandidateSeed {
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn size(&self) -> usize {
        self.positions.len()
    }
}

pub struct SeedIter<'a> {
    generator: &'a CandidateGenerator,
    plan: usize,
    combos: Option<IndexCombinations>,
    emitted_in_plan: u64,
    next_index: u64,
}

impl Iterator for SeedIter<'_> {
    type Item = CandidateSeed;

    fn next(&mut self) -> Option<CandidateSeed> {
        let generator = self.generator;
        loop {
            let plan = generator.plans.get(self.plan)?;
            if self.emitted_in_plan < plan.scanned {
                if let Some(positions) = self.combos.as_mut().and_then(|c| c.advance()) {
                    let seed = CandidateSeed {
                        plan: self.plan,
                        positions: positions.to_vec(),
                        index: self.next_index,
                    };
                    self.emitted_in_plan += 1;
                    self.next_index += 1;
                    return Some(seed);
                }
            }
            self.plan += 1;
            self.emitted_in_plan = 0;
            self.combos = generator
                .plans
                .get(self.plan)
                .map(|p| k_index_combinations(generator.pool.len(), p.size));
        }
    }
}

pub struct CandidateIter<'a> {
    seeds: SeedIter<'a>,
}

impl Iterator for CandidateIter<'_> {
    type Item = CandidateGrid;

    fn next(&mut self) -> Option<CandidateGrid> {
        let seed = self.seeds.next()?;
        Some(self.seeds.generator.materialize(&seed))
    }
}

pub struct SeedBatches<'a> {
    inner: SeedIter<'a>,
    batch_size: usize,
}

impl Iterator for SeedBatches<'_> {
    type Item = Vec<CandidateSeed>;

    fn next(&mut self) -> Option<Vec<CandidateSeed>> {
        let batch: Vec<CandidateSeed> = self.inner.by_ref().take(self.batch_size).collect();
        if batch.is_empty() {
            None
        } else {
            Some(batch)
        }
    }
}

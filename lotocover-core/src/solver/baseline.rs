use serde::Serialize;

use crate::combinatorics::{binomial, k_combinations};
use crate::config::PriceTable;
use crate::models::{Grid, GuaranteeTarget, NumberPool, BALL_MAX, MAX_GRID_SIZE};

use super::{Solution, SolverStatus, Strategy};

/// Coût d'une stratégie de référence, sans matérialiser ses grilles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineSummary {
    pub strategy: Strategy,
    pub grid_count: u64,
    /// Nombre de numéros par grille.
    pub grid_size: usize,
    pub total_cost: f64,
}

/// Toutes les grilles simples de la sélection : C(N, D) × prix(D).
pub fn pure_small(pool: &NumberPool, target: &GuaranteeTarget, prices: &PriceTable) -> Option<BaselineSummary> {
    let price = prices.price(target.draw_size)?;
    let grid_count = binomial(pool.len(), target.draw_size);
    Some(BaselineSummary {
        strategy: Strategy::PureSmall,
        grid_count,
        grid_size: target.draw_size,
        total_cost: grid_count as f64 * price,
    })
}

/// Une seule grille multiple contenant toute la sélection : la plus petite taille
/// tarifée d'au moins N numéros, complétée hors sélection si besoin.
pub fn pure_large(pool: &NumberPool, prices: &PriceTable) -> Option<BaselineSummary> {
    let grid_size = prices
        .sizes()
        .find(|&size| size >= pool.len() && size <= MAX_GRID_SIZE)?;
    let price = prices.price(grid_size)?;
    Some(BaselineSummary {
        strategy: Strategy::PureLarge,
        grid_count: 1,
        grid_size,
        total_cost: price,
    })
}

/// Sélection complétée par les plus petits numéros qui n'en font pas partie.
fn padded_pool(pool: &NumberPool, size: usize) -> Vec<u8> {
    let mask = pool.mask();
    let mut numbers = pool.numbers().to_vec();
    let missing = size.saturating_sub(numbers.len());
    numbers.extend((1..=BALL_MAX).filter(|&n| !mask.contains(n)).take(missing));
    numbers
}

pub fn materialize(summary: &BaselineSummary, pool: &NumberPool, target: &GuaranteeTarget) -> Solution {
    let grids: Vec<Grid> = match summary.strategy {
        Strategy::PureLarge => vec![Grid::from_sorted_unchecked(&padded_pool(pool, summary.grid_size))],
        _ => k_combinations(pool.numbers(), target.draw_size)
            .map(|numbers| Grid::from_sorted_unchecked(&numbers))
            .collect(),
    };
    Solution {
        strategy: summary.strategy,
        grids,
        total_cost: summary.total_cost,
        status: SolverStatus::Covered,
    }
}

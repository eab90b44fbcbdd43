use serde::Serialize;

use crate::combinatorics::{binomial, k_combinations};
use crate::config::{CoverConfig, PayoutTable};
use crate::error::{invalid, Result};
use crate::models::{NumberPool, NumberSet, DRAW_SIZE, MAX_GRID_SIZE};
use crate::solver::Solution;

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioLevel {
    /// Nombre de boules tirées appartenant à la sélection.
    pub in_pool: usize,
    /// Grilles simples du système complet C(N, 5) ayant j bons numéros (index j).
    pub full_wheel_matches: Vec<u64>,
    pub full_wheel_payout: f64,
    /// Minimum sur tous les tirages du scénario ; `None` si non énuméré.
    pub guaranteed_payout: Option<f64>,
    pub best_payout: Option<f64>,
    pub average_payout: f64,
    pub guaranteed_net: Option<f64>,
    pub average_net: f64,
    /// Le seuil de garantie est atteint dans ce scénario.
    pub within_guarantee: bool,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioAnalysis {
    pub pool_size: usize,
    pub threshold: usize,
    pub total_cost: f64,
    pub full_wheel_cost: Option<f64>,
    pub levels: Vec<ScenarioLevel>,
    pub recommendation: String,
}

/// Gain d'une grille de k numéros dont t sont tirés :
/// Σ_j C(t, j) · C(k − t, 5 − j) · gain(j).
pub fn grid_payout(size: usize, matches: usize, payouts: &PayoutTable) -> f64 {
    (0..=DRAW_SIZE)
        .map(|j| {
            let combos = binomial(matches, j) * binomial(size.saturating_sub(matches), DRAW_SIZE - j);
            combos as f64 * payouts.payout(j)
        })
        .sum()
}

/// Table pay[k][t] pour k ≤ MAX_GRID_SIZE.
fn payout_table(payouts: &PayoutTable) -> Vec<Vec<f64>> {
    (0..=MAX_GRID_SIZE)
        .map(|k| (0..=k).map(|t| grid_payout(k, t, payouts)).collect())
        .collect()
}

fn full_wheel_matches(pool_size: usize, in_pool: usize) -> Vec<u64> {
    (0..=DRAW_SIZE)
        .map(|j| binomial(in_pool, j).saturating_mul(binomial(pool_size - in_pool, DRAW_SIZE - j)))
        .collect()
}

fn level_recommendation(
    in_pool: usize,
    guaranteed: Option<f64>,
    average: f64,
    best: Option<f64>,
    cost: f64,
) -> String {
    match guaranteed {
        Some(g) if g >= cost => format!("{in_pool}/5 : rentable dans tous les cas (+{:.2} € minimum)", g - cost),
        Some(_) if best.is_some_and(|b| b >= cost) => {
            format!("{in_pool}/5 : rentable selon les numéros tirés, pas garanti")
        }
        None if average >= cost => format!("{in_pool}/5 : rentable en moyenne (non énuméré)"),
        _ => format!("{in_pool}/5 : perte certaine, gain moyen {average:.2} € pour {cost:.2} € misés"),
    }
}

/// Pour r = 1..5 boules tirées dans la sélection, gains du système complet et de la solution.
pub fn analyze_scenarios(pool: &NumberPool, solution: &Solution, config: &CoverConfig) -> Result<ScenarioAnalysis> {
    if solution.grids.is_empty() {
        return Err(invalid("solution vide : aucun scénario à analyser"));
    }
    let n = pool.len();
    let payouts = &config.payouts;
    let pay = payout_table(payouts);
    let cost = solution.total_cost;

    // Grilles réduites à leur masque et à leur part dans la sélection.
    let grids: Vec<(usize, NumberSet, usize)> = solution
        .grids
        .iter()
        .map(|g| {
            let inside = g.numbers().iter().filter(|&&x| pool.position_of(x).is_some()).count();
            (g.size(), g.mask(), inside)
        })
        .collect();

    let mut levels = Vec::with_capacity(DRAW_SIZE);
    for r in 1..=DRAW_SIZE.min(n) {
        let wheel = full_wheel_matches(n, r);
        let full_wheel_payout = wheel.iter().enumerate().map(|(j, &c)| c as f64 * payouts.payout(j)).sum();

        let draws = binomial(n, r);
        let average_payout: f64 = grids
            .iter()
            .map(|&(k, _, inside)| {
                (0..=inside.min(r))
                    .map(|t| {
                        let p = binomial(inside, t) as f64 * binomial(n - inside, r - t) as f64 / draws as f64;
                        p * pay[k][t]
                    })
                    .sum::<f64>()
            })
            .sum();

        let (guaranteed_payout, best_payout) = if draws <= config.limits.max_exhaustive_draws {
            let mut min = f64::INFINITY;
            let mut max = 0.0_f64;
            for drawn in k_combinations(pool.numbers(), r) {
                let mask = NumberSet::from_numbers(&drawn);
                let total: f64 = grids
                    .iter()
                    .map(|(k, g, _)| pay[*k][g.intersection_count(&mask) as usize])
                    .sum();
                min = min.min(total);
                max = max.max(total);
            }
            (Some(min), Some(max))
        } else {
            log::warn!("Scénario {r}/5 : {draws} tirages, au-delà du plafond, gain garanti non calculé");
            (None, None)
        };

        let recommendation = level_recommendation(r, guaranteed_payout, average_payout, best_payout, cost);
        levels.push(ScenarioLevel {
            in_pool: r,
            full_wheel_matches: wheel,
            full_wheel_payout,
            guaranteed_payout,
            best_payout,
            average_payout,
            guaranteed_net: guaranteed_payout.map(|g| g - cost),
            average_net: average_payout - cost,
            within_guarantee: solution.is_complete() && r >= config.target.threshold,
            recommendation,
        });
    }

    let recommendation = match levels.iter().find(|l| l.guaranteed_net.is_some_and(|net| net >= 0.0)) {
        Some(level) => format!(
            "Rentabilité garantie dès {} numéros tirés dans la sélection",
            level.in_pool
        ),
        None => {
            let best_guaranteed = levels.iter().filter_map(|l| l.guaranteed_payout).fold(0.0, f64::max);
            format!(
                "Aucun scénario ne garantit la rentabilité : gain garanti maximal {:.2} € pour {:.2} € misés",
                best_guaranteed, cost
            )
        }
    };

    Ok(ScenarioAnalysis {
        pool_size: n,
        threshold: config.target.threshold,
        total_cost: cost,
        full_wheel_cost: config.prices.price(DRAW_SIZE).map(|p| binomial(n, DRAW_SIZE) as f64 * p),
        levels,
        recommendation,
    })
}

use serde::Serialize;

use crate::combinatorics::binomial;
use crate::models::Grid;

/// Bornes sur le nombre minimal de grilles simples d'un système couvrant C(N, D, m).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundRecord {
    pub pool_size: usize,
    pub threshold: usize,
    pub grid_size: usize,
    pub divisibility: u64,
    pub schonheim: u64,
    pub upper: u64,
    /// Plancher certifié : max des deux bornes inférieures.
    pub floor: u64,
}

impl BoundRecord {
    pub fn compute(pool_size: usize, threshold: usize, grid_size: usize) -> Self {
        let divisibility = divisibility_bound(pool_size, threshold, grid_size);
        let schonheim = schonheim_bound(pool_size, threshold, grid_size);
        Self {
            pool_size,
            threshold,
            grid_size,
            divisibility,
            schonheim,
            upper: upper_bound(pool_size, threshold, grid_size),
            floor: divisibility.max(schonheim),
        }
    }

    pub fn classify(&self, grid_count: u64) -> SolutionClass {
        classify_against_floor(self.floor, grid_count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SolutionClass {
    /// Moins de grilles que le plancher : la solution est forcément fausse.
    Impossible,
    Optimal,
    /// Au plus le double du plancher.
    Plausible,
    /// Valide mais probablement loin de l'optimum.
    Suspect,
}

impl std::fmt::Display for SolutionClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolutionClass::Impossible => write!(f, "IMPOSSIBLE"),
            SolutionClass::Optimal => write!(f, "OPTIMAL"),
            SolutionClass::Plausible => write!(f, "PLAUSIBLE"),
            SolutionClass::Suspect => write!(f, "SUSPECT"),
        }
    }
}

fn ceil_div(a: u128, b: u128) -> u128 {
    a.div_ceil(b)
}

/// ceil(C(N, m) / C(D, m)) : une grille de D numéros couvre au plus C(D, m) sous-ensembles.
pub fn divisibility_bound(pool_size: usize, threshold: usize, grid_size: usize) -> u64 {
    let per_grid = binomial(grid_size, threshold);
    if per_grid == 0 {
        return u64::MAX;
    }
    binomial(pool_size, threshold).div_ceil(per_grid)
}

/// Borne de Schönheim, plafonds imbriqués évalués de l'intérieur :
/// L = ceil(N/D · ceil((N-1)/(D-1) · … ceil((N-m+1)/(D-m+1)))).
pub fn schonheim_bound(pool_size: usize, threshold: usize, grid_size: usize) -> u64 {
    if threshold > grid_size || threshold > pool_size {
        return u64::MAX;
    }
    let mut acc: u128 = 1;
    for i in (0..threshold).rev() {
        let num = (pool_size - i) as u128;
        let den = (grid_size - i) as u128;
        acc = ceil_div(num * acc, den);
        if acc > u64::MAX as u128 {
            return u64::MAX;
        }
    }
    acc as u64
}

/// Estimation probabiliste lâche, jamais une preuve de faisabilité.
pub fn upper_bound(pool_size: usize, threshold: usize, grid_size: usize) -> u64 {
    let universe = binomial(pool_size, threshold) as f64;
    let per_grid = binomial(grid_size, threshold) as f64;
    if per_grid == 0.0 || universe == 0.0 {
        return 0;
    }
    ((universe / per_grid) * (universe.ln() + 1.0)).ceil() as u64
}

fn classify_against_floor(floor: u64, grid_count: u64) -> SolutionClass {
    if grid_count < floor {
        SolutionClass::Impossible
    } else if grid_count == floor {
        SolutionClass::Optimal
    } else if grid_count <= floor.saturating_mul(2) {
        SolutionClass::Plausible
    } else {
        SolutionClass::Suspect
    }
}

pub fn classify_solution(
    pool_size: usize,
    threshold: usize,
    grid_size: usize,
    grid_count: u64,
) -> SolutionClass {
    BoundRecord::compute(pool_size, threshold, grid_size).classify(grid_count)
}

/// Une grille de k numéros équivaut aux C(k, D) grilles simples qu'elle contient.
pub fn equivalent_simple_grids(grids: &[Grid], grid_size: usize) -> u64 {
    grids.iter().map(|g| binomial(g.size(), grid_size)).sum()
}

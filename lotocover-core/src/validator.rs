use chrono::Datelike;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;

use crate::cancel::CancelFlag;
use crate::combinatorics::{binomial, colex_rank, k_combinations, k_index_combinations};
use crate::config::{CoverConfig, ValidationMode};
use crate::error::{invalid, CoverError, Result};
use crate::models::{Draw, Grid, GuaranteeTarget, NumberPool, NumberSet, BALL_MAX, CHANCE_MAX, DRAW_SIZE};
use crate::progress::progress_bar;

/// Nombre de numéros communs entre une grille et un tirage.
pub fn match_count(grid: &Grid, draw: &NumberSet) -> u32 {
    grid.mask().intersection_count(draw)
}

/// Seed déterministe basé sur la date du jour (YYYYMMDD).
pub fn date_seed() -> u64 {
    let today = chrono::Local::now().date_naive();
    let y = today.year() as u64;
    let m = today.month() as u64;
    let d = today.day() as u64;
    y * 10_000 + m * 100 + d
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Counterexample {
    pub draw: Vec<u8>,
    pub chance: Option<u8>,
    pub best_match: u32,
    /// Bons numéros de chaque grille, dans l'ordre de la solution.
    pub grid_matches: Vec<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GridStats {
    pub grid: Grid,
    pub wins: u64,
    pub win_rate: f64,
    /// Index = nombre de bons numéros.
    pub match_histogram: Vec<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "kebab-case")]
pub enum GuaranteeVerdict {
    /// Chaque m-sous-ensemble de la sélection est dans une grille et aucun tirage n'échoue.
    Proven,
    /// `failures` tirages sous le seuil, `uncovered` m-sous-ensembles hors de toute grille.
    Invalidated { failures: u64, uncovered: u64 },
    /// Mode échantillonné : estimation, pas de preuve.
    NotApplicable,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub mode: ValidationMode,
    pub threshold: usize,
    pub tested: u64,
    /// C(N, D) en mode exhaustif.
    pub universe_size: Option<u64>,
    pub successes: u64,
    pub failures: u64,
    pub success_rate: f64,
    pub counterexamples: Vec<Counterexample>,
    pub counterexamples_truncated: bool,
    pub grid_stats: Vec<GridStats>,
    /// Index = meilleur nombre de bons numéros sur l'ensemble des grilles.
    pub best_match_distribution: Vec<u64>,
    /// m-sous-ensembles de la sélection contenus dans aucune grille (mode exhaustif).
    pub uncovered_subsets: Option<u64>,
    /// Premiers m-sous-ensembles non couverts, ordre lexicographique, plafonnés
    /// comme les contre-exemples.
    pub uncovered_examples: Vec<Vec<u8>>,
    pub seed: Option<u64>,
    pub verdict: GuaranteeVerdict,
}

impl ValidationReport {
    pub fn is_guaranteed(&self) -> bool {
        self.verdict == GuaranteeVerdict::Proven
    }

    /// Taux de réussite sur l'univers complet des tirages de la sélection.
    pub fn universe_coverage(&self) -> Option<f64> {
        match self.mode {
            ValidationMode::Exhaustive => Some(self.success_rate),
            ValidationMode::Sampled => None,
        }
    }

    /// Taux de réussite sur l'échantillon de tirages aléatoires.
    pub fn sample_success_rate(&self) -> Option<f64> {
        match self.mode {
            ValidationMode::Sampled => Some(self.success_rate),
            ValidationMode::Exhaustive => None,
        }
    }

    pub fn covers_every_subset(&self) -> Option<bool> {
        self.uncovered_subsets.map(|n| n == 0)
    }
}

struct Tally {
    threshold: u32,
    max_counterexamples: usize,
    tested: u64,
    successes: u64,
    failures: u64,
    counterexamples: Vec<Counterexample>,
    truncated: bool,
    wins: Vec<u64>,
    histograms: Vec<Vec<u64>>,
    best_distribution: Vec<u64>,
}

impl Tally {
    fn new(grids: &[Grid], target: &GuaranteeTarget, max_counterexamples: usize) -> Self {
        let levels = target.draw_size + 1;
        Self {
            threshold: target.threshold as u32,
            max_counterexamples,
            tested: 0,
            successes: 0,
            failures: 0,
            counterexamples: Vec::new(),
            truncated: false,
            wins: vec![0; grids.len()],
            histograms: vec![vec![0; levels]; grids.len()],
            best_distribution: vec![0; levels],
        }
    }

    fn record(&mut self, draw: &[u8], chance: Option<u8>, matches: Vec<u32>) {
        self.tested += 1;
        let best = matches.iter().copied().max().unwrap_or(0);
        for (i, &m) in matches.iter().enumerate() {
            if let Some(slot) = self.histograms[i].get_mut(m as usize) {
                *slot += 1;
            }
            if m >= self.threshold {
                self.wins[i] += 1;
            }
        }
        if let Some(slot) = self.best_distribution.get_mut(best as usize) {
            *slot += 1;
        }

        if best >= self.threshold {
            self.successes += 1;
            return;
        }
        self.failures += 1;
        if self.counterexamples.len() < self.max_counterexamples {
            let mut sorted = draw.to_vec();
            sorted.sort_unstable();
            self.counterexamples.push(Counterexample {
                draw: sorted,
                chance,
                best_match: best,
                grid_matches: matches,
            });
        } else {
            self.truncated = true;
        }
    }

    fn into_report(
        self,
        grids: &[Grid],
        mode: ValidationMode,
        universe_size: Option<u64>,
        uncovered: Option<(u64, Vec<Vec<u8>>)>,
        seed: Option<u64>,
    ) -> ValidationReport {
        let tested = self.tested;
        let rate = |n: u64| if tested > 0 { n as f64 / tested as f64 } else { 0.0 };
        let (uncovered_subsets, uncovered_examples) = match uncovered {
            Some((count, examples)) => (Some(count), examples),
            None => (None, Vec::new()),
        };

        let verdict = match (mode, uncovered_subsets) {
            (ValidationMode::Exhaustive, Some(0)) if self.failures == 0 && Some(tested) == universe_size => {
                GuaranteeVerdict::Proven
            }
            (ValidationMode::Exhaustive, Some(uncovered)) => GuaranteeVerdict::Invalidated {
                failures: self.failures,
                uncovered,
            },
            _ => GuaranteeVerdict::NotApplicable,
        };

        let grid_stats = grids
            .iter()
            .zip(self.wins.iter().zip(self.histograms))
            .map(|(grid, (&wins, match_histogram))| GridStats {
                grid: grid.clone(),
                wins,
                win_rate: rate(wins),
                match_histogram,
            })
            .collect();

        ValidationReport {
            mode,
            threshold: self.threshold as usize,
            tested,
            universe_size,
            successes: self.successes,
            failures: self.failures,
            success_rate: rate(self.successes),
            counterexamples: self.counterexamples,
            counterexamples_truncated: self.truncated,
            grid_stats,
            best_match_distribution: self.best_distribution,
            uncovered_subsets,
            uncovered_examples,
            seed,
            verdict,
        }
    }
}

fn score_batch<T: AsRef<[u8]> + Sync>(grids: &[Grid], draws: &[T]) -> Vec<Vec<u32>> {
    draws
        .par_iter()
        .map(|draw| {
            let mask = NumberSet::from_numbers(draw.as_ref());
            grids.iter().map(|g| match_count(g, &mask)).collect()
        })
        .collect()
}

/// Couverture recalculée sans passer par le solveur, indexée par rang colex.
fn coverage_flags(pool: &NumberPool, grids: &[Grid], threshold: usize) -> Vec<bool> {
    let size = binomial(pool.len(), threshold) as usize;
    let mut covered = vec![false; size];
    for grid in grids {
        let positions: Vec<usize> = grid.numbers().iter().filter_map(|&n| pool.position_of(n)).collect();
        let mut sub = k_index_combinations(positions.len(), threshold);
        let mut scratch = Vec::with_capacity(threshold);
        while let Some(idx) = sub.advance() {
            scratch.clear();
            scratch.extend(idx.iter().map(|&i| positions[i]));
            if let Some(slot) = covered.get_mut(colex_rank(&scratch) as usize) {
                *slot = true;
            }
        }
    }
    covered
}

fn uncovered_examples(pool: &NumberPool, covered: &[bool], threshold: usize, limit: usize) -> Vec<Vec<u8>> {
    k_index_combinations(pool.len(), threshold)
        .filter(|positions| covered.get(colex_rank(positions) as usize) == Some(&false))
        .take(limit)
        .map(|positions| positions.iter().map(|&i| pool.numbers()[i]).collect())
        .collect()
}

/// m-sous-ensembles de la sélection qu'aucune grille ne contient.
pub fn count_uncovered_subsets(pool: &NumberPool, grids: &[Grid], threshold: usize) -> u64 {
    coverage_flags(pool, grids, threshold).iter().filter(|&&c| !c).count() as u64
}

fn check_grids(grids: &[Grid]) -> Result<()> {
    if grids.is_empty() {
        return Err(invalid("aucune grille à valider"));
    }
    Ok(())
}

/// Teste tous les C(N, D) tirages de la sélection et recompte les m-sous-ensembles
/// non couverts ; seul mode capable de prouver la garantie. Refuse au-delà du plafond.
pub fn validate_exhaustive(
    pool: &NumberPool,
    grids: &[Grid],
    config: &CoverConfig,
    cancel: &CancelFlag,
) -> Result<ValidationReport> {
    let target = &config.target;
    target.check_pool(pool)?;
    check_grids(grids)?;

    let required = binomial(pool.len(), target.draw_size);
    if required > config.limits.max_exhaustive_draws {
        return Err(CoverError::ValidationExceededBudget {
            required,
            cap: config.limits.max_exhaustive_draws,
        });
    }

    let mut tally = Tally::new(grids, target, config.validation.max_counterexamples);
    let pb = progress_bar(required, config.show_progress);
    pb.set_message("validation exhaustive");

    let mut draws = k_combinations(pool.numbers(), target.draw_size);
    loop {
        let batch: Vec<Vec<u8>> = draws.by_ref().take(config.limits.batch_size.max(1)).collect();
        if batch.is_empty() {
            break;
        }
        cancel.check()?;
        let scores = score_batch(grids, &batch);
        for (draw, matches) in batch.iter().zip(scores) {
            tally.record(draw, None, matches);
        }
        pb.inc(batch.len() as u64);
    }
    pb.finish_and_clear();

    let covered = coverage_flags(pool, grids, target.threshold);
    let uncovered = covered.iter().filter(|&&c| !c).count() as u64;
    let examples = uncovered_examples(pool, &covered, target.threshold, config.validation.max_counterexamples);
    let report = tally.into_report(
        grids,
        ValidationMode::Exhaustive,
        Some(required),
        Some((uncovered, examples)),
        None,
    );

    match report.verdict {
        GuaranteeVerdict::Proven => log::info!(
            "Garantie {} prouvée sur {} tirages",
            target,
            report.tested
        ),
        GuaranteeVerdict::Invalidated { failures, uncovered } => log::warn!(
            "Garantie {} invalidée : {} échecs sur {} tirages, {} sous-ensembles non couverts{}",
            target,
            failures,
            report.tested,
            uncovered,
            report
                .uncovered_examples
                .first()
                .map(|s| format!(" (ex. {:?})", s))
                .unwrap_or_default()
        ),
        GuaranteeVerdict::NotApplicable => {}
    }
    Ok(report)
}

fn random_draw(rng: &mut StdRng) -> Draw {
    let mut balls = [0u8; DRAW_SIZE];
    for (slot, i) in balls
        .iter_mut()
        .zip(rand::seq::index::sample(rng, BALL_MAX as usize, DRAW_SIZE).iter())
    {
        *slot = i as u8 + 1;
    }
    Draw {
        balls,
        chance: rng.random_range(1..=CHANCE_MAX),
    }
}

/// Tire `sample_count` tirages uniformes 5/49 (+ numéro chance) : estimation de la
/// robustesse hors sélection, jamais une preuve.
pub fn validate_sampled(grids: &[Grid], config: &CoverConfig, cancel: &CancelFlag) -> Result<ValidationReport> {
    let target = &config.target;
    target.validate()?;
    check_grids(grids)?;
    let sample_count = config.validation.sample_count;
    if sample_count == 0 {
        return Err(invalid("nombre de tirages échantillonnés nul"));
    }

    let seed = config.validation.seed.unwrap_or_else(date_seed);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut tally = Tally::new(grids, target, config.validation.max_counterexamples);
    let pb = progress_bar(sample_count, config.show_progress);
    pb.set_message("validation échantillonnée");

    let batch_size = config.limits.batch_size.max(1) as u64;
    let mut remaining = sample_count;
    while remaining > 0 {
        cancel.check()?;
        let n = remaining.min(batch_size);
        let batch: Vec<Draw> = (0..n).map(|_| random_draw(&mut rng)).collect();
        let balls: Vec<&[u8]> = batch.iter().map(|d| &d.balls[..]).collect();
        let scores = score_batch(grids, &balls);
        for (draw, matches) in batch.iter().zip(scores) {
            tally.record(&draw.balls, Some(draw.chance), matches);
        }
        pb.inc(n);
        remaining -= n;
    }
    pb.finish_and_clear();

    let report = tally.into_report(grids, ValidationMode::Sampled, None, None, Some(seed));
    log::info!(
        "Estimation sur {} tirages aléatoires (seed {}) : {:.2}% de réussite",
        report.tested,
        seed,
        report.success_rate * 100.0
    );
    Ok(report)
}

/// Aiguillage selon `config.validation.mode` ; jamais de repli silencieux d'un mode à l'autre.
pub fn validate(
    pool: &NumberPool,
    grids: &[Grid],
    config: &CoverConfig,
    cancel: &CancelFlag,
) -> Result<ValidationReport> {
    match config.validation.mode {
        ValidationMode::Exhaustive => validate_exhaustive(pool, grids, config, cancel),
        ValidationMode::Sampled => validate_sampled(grids, config, cancel),
    }
}

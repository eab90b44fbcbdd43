mod display;
mod input;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use lotocover_core::analysis::analyze;
use lotocover_core::bounds::BoundRecord;
use lotocover_core::cancel::CancelFlag;
use lotocover_core::candidates::CandidateGenerator;
use lotocover_core::config::{load_config, save_config, CoverConfig, GreedyCriterion, ValidationMode};
use lotocover_core::models::{validate_draw, Draw, GuaranteeTarget, DRAW_SIZE};
use lotocover_core::scenario::{analyze_scenarios, grid_payout};
use lotocover_core::solver::solve;
use lotocover_core::universe::CoverageUniverse;
use lotocover_core::validator::{match_count, validate};

use crate::display::{
    display_analysis, display_bounds, display_check, display_grids, display_scenarios,
    display_validation,
};
use crate::input::{parse_grids, parse_numbers, parse_pool};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CriterionArg {
    MaxCoverage,
    CostEfficiency,
}

impl From<CriterionArg> for GreedyCriterion {
    fn from(arg: CriterionArg) -> Self {
        match arg {
            CriterionArg::MaxCoverage => GreedyCriterion::MaxCoverage,
            CriterionArg::CostEfficiency => GreedyCriterion::CostEfficiency,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Exhaustive,
    Sampled,
}

#[derive(Parser)]
#[command(name = "lotocover", about = "Couverture de grilles Loto à gain garanti")]
struct Cli {
    /// Fichier de configuration JSON (les options de la ligne de commande priment)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Afficher les barres de progression
    #[arg(long, global = true)]
    progress: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ValidationArgs {
    /// Mode de validation
    #[arg(long)]
    mode: Option<ModeArg>,

    /// Nombre de tirages aléatoires en mode échantillonné
    #[arg(long)]
    samples: Option<u64>,

    /// Seed pour la reproductibilité (défaut : date du jour)
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Calculer un jeu de grilles garantissant m bons numéros sur 5
    Solve {
        /// Numéros de la sélection (ex: 1,7,12,...)
        #[arg(short, long, value_delimiter = ',', required = true)]
        pool: Vec<u8>,

        /// Nombre de bons numéros garantis
        #[arg(short, long)]
        threshold: Option<usize>,

        /// Tailles de grilles autorisées (ex: 5,7)
        #[arg(long, value_delimiter = ',')]
        sizes: Vec<usize>,

        /// Nombre maximal de grilles
        #[arg(long)]
        max_grids: Option<usize>,

        /// Critère de choix du glouton
        #[arg(long)]
        criterion: Option<CriterionArg>,

        #[command(flatten)]
        validation: ValidationArgs,

        /// Exporter l'analyse complète en JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Afficher les bornes théoriques du nombre de grilles simples
    Bounds {
        /// Taille de la sélection
        #[arg(short, long)]
        n: usize,

        /// Nombre de bons numéros garantis
        #[arg(short, long, default_value = "3")]
        threshold: usize,

        /// Classer une solution de ce nombre de grilles simples
        #[arg(short, long)]
        grids: Option<u64>,
    },

    /// Vérifier la garantie d'un jeu de grilles
    Validate {
        /// Numéros de la sélection
        #[arg(short, long, value_delimiter = ',', required = true)]
        pool: Vec<u8>,

        /// Grilles séparées par ';' (ex: "1 2 3 4 5; 6 7 8 9 10")
        #[arg(short, long)]
        grids: String,

        /// Nombre de bons numéros garantis
        #[arg(short, long)]
        threshold: Option<usize>,

        #[command(flatten)]
        validation: ValidationArgs,

        /// Exporter le rapport en JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Gains par scénario pour la solution recommandée
    Scenario {
        /// Numéros de la sélection
        #[arg(short, long, value_delimiter = ',', required = true)]
        pool: Vec<u8>,

        /// Nombre de bons numéros garantis
        #[arg(short, long)]
        threshold: Option<usize>,

        /// Tailles de grilles autorisées
        #[arg(long, value_delimiter = ',')]
        sizes: Vec<usize>,
    },

    /// Comparer des grilles à un tirage
    Check {
        /// Grilles séparées par ';'
        #[arg(short, long)]
        grids: String,

        /// Les 5 boules du tirage
        #[arg(short, long)]
        draw: String,

        /// Numéro chance (1-10)
        #[arg(short, long)]
        chance: u8,
    },

    /// Afficher ou écrire la configuration par défaut
    Config {
        /// Fichier de sortie
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            let config = load_config(path)
                .with_context(|| format!("Impossible de charger la configuration {}", path.display()))?;
            log::info!("Configuration chargée depuis {}", path.display());
            config
        }
        None => CoverConfig::default(),
    };
    config.show_progress |= cli.progress;

    match cli.command {
        Command::Solve {
            pool,
            threshold,
            sizes,
            max_grids,
            criterion,
            validation,
            json,
        } => {
            apply_target(&mut config, threshold);
            apply_sizes(&mut config, &sizes)?;
            if let Some(max) = max_grids {
                config.solver.max_grids = max;
            }
            if let Some(c) = criterion {
                config.solver.criterion = c.into();
            }
            apply_validation(&mut config, &validation);
            cmd_solve(&config, &pool, json.as_deref())
        }
        Command::Bounds { n, threshold, grids } => cmd_bounds(n, threshold, grids),
        Command::Validate {
            pool,
            grids,
            threshold,
            validation,
            json,
        } => {
            apply_target(&mut config, threshold);
            apply_validation(&mut config, &validation);
            cmd_validate(&config, &pool, &grids, json.as_deref())
        }
        Command::Scenario { pool, threshold, sizes } => {
            apply_target(&mut config, threshold);
            apply_sizes(&mut config, &sizes)?;
            cmd_scenario(&config, &pool)
        }
        Command::Check { grids, draw, chance } => cmd_check(&config, &grids, &draw, chance),
        Command::Config { output } => cmd_config(&config, output.as_deref()),
    }
}

fn apply_target(config: &mut CoverConfig, threshold: Option<usize>) {
    if let Some(m) = threshold {
        config.target = GuaranteeTarget::new(m);
    }
}

fn apply_sizes(config: &mut CoverConfig, sizes: &[usize]) -> Result<()> {
    if sizes.is_empty() {
        return Ok(());
    }
    let restricted = config.prices.restricted_to(sizes);
    if restricted.sizes().next().is_none() {
        bail!("Aucune des tailles {:?} n'est tarifée", sizes);
    }
    config.prices = restricted;
    Ok(())
}

fn apply_validation(config: &mut CoverConfig, args: &ValidationArgs) {
    if let Some(mode) = args.mode {
        config.validation.mode = match mode {
            ModeArg::Exhaustive => ValidationMode::Exhaustive,
            ModeArg::Sampled => ValidationMode::Sampled,
        };
    }
    if let Some(samples) = args.samples {
        config.validation.sample_count = samples;
    }
    if args.seed.is_some() {
        config.validation.seed = args.seed;
    }
}

fn export_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Sérialisation JSON impossible")?;
    std::fs::write(path, json).with_context(|| format!("Écriture impossible : {}", path.display()))?;
    log::debug!("Export JSON écrit : {}", path.display());
    println!("\nExport JSON : {}", path.display());
    Ok(())
}

fn cmd_solve(config: &CoverConfig, pool: &[u8], json: Option<&Path>) -> Result<()> {
    let pool = parse_pool(pool)?;
    let analysis = analyze(&pool, config, &CancelFlag::new()).context("Analyse impossible")?;

    display_analysis(&analysis, &config.prices);
    if !analysis.is_guaranteed() {
        println!("\n⚠️  La garantie {} n'est pas prouvée pour cette solution.", analysis.target);
    }

    if let Some(path) = json {
        export_json(&analysis, path)?;
    }
    Ok(())
}

fn cmd_bounds(n: usize, threshold: usize, grids: Option<u64>) -> Result<()> {
    if n < DRAW_SIZE || n > 49 {
        bail!("Taille de sélection {} invalide ({}-49)", n, DRAW_SIZE);
    }
    if threshold == 0 || threshold >= DRAW_SIZE {
        bail!("Garantie {} invalide (1-{})", threshold, DRAW_SIZE - 1);
    }
    let record = BoundRecord::compute(n, threshold, DRAW_SIZE);
    display_bounds(&record, grids.map(|g| (g, record.classify(g))));
    Ok(())
}

fn cmd_validate(config: &CoverConfig, pool: &[u8], grids: &str, json: Option<&Path>) -> Result<()> {
    let pool = parse_pool(pool)?;
    let grids = parse_grids(grids)?;
    let report = validate(&pool, &grids, config, &CancelFlag::new()).context("Validation impossible")?;

    display_grids(&grids, &config.prices);
    display_validation(&report);

    if let Some(path) = json {
        export_json(&report, path)?;
    }
    Ok(())
}

fn cmd_scenario(config: &CoverConfig, pool: &[u8]) -> Result<()> {
    config.validate().context("Configuration invalide")?;
    let pool = parse_pool(pool)?;
    config.limits.check_pool(&pool)?;

    let universe = CoverageUniverse::build(&pool, &config.target, &config.limits)?;
    let generator = CandidateGenerator::new(&pool, &config.target, &config.prices, &config.limits)?;
    let outcome = solve(&universe, &generator, config, &CancelFlag::new()).context("Résolution impossible")?;
    let solution = &outcome.recommendation;

    println!(
        "\nSolution recommandée : {} ({} grilles)",
        solution.strategy,
        solution.grid_count()
    );
    display_grids(&solution.grids, &config.prices);

    let scenarios = analyze_scenarios(&pool, solution, config)?;
    display_scenarios(&scenarios);
    Ok(())
}

fn cmd_check(config: &CoverConfig, grids: &str, draw: &str, chance: u8) -> Result<()> {
    let grids = parse_grids(grids)?;
    let numbers = parse_numbers(draw)?;
    let balls: [u8; DRAW_SIZE] = numbers
        .as_slice()
        .try_into()
        .with_context(|| format!("Un tirage compte exactement {} boules", DRAW_SIZE))?;
    validate_draw(&balls, chance).context("Tirage invalide")?;

    let draw = Draw { balls, chance };
    let mask = draw.mask();
    let matches: Vec<u32> = grids.iter().map(|g| match_count(g, &mask)).collect();
    let payouts: Vec<f64> = grids
        .iter()
        .zip(&matches)
        .map(|(g, &m)| grid_payout(g.size(), m as usize, &config.payouts))
        .collect();

    display_check(&draw, &grids, &matches, &payouts);
    Ok(())
}

fn cmd_config(config: &CoverConfig, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            save_config(config, path)
                .with_context(|| format!("Écriture impossible : {}", path.display()))?;
            println!("Configuration écrite dans {}", path.display());
        }
        None => {
            let json = serde_json::to_string_pretty(config).context("Sérialisation JSON impossible")?;
            println!("{json}");
        }
    }
    Ok(())
}

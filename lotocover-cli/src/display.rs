use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use lotocover_core::analysis::CoverageAnalysis;
use lotocover_core::bounds::{BoundRecord, SolutionClass};
use lotocover_core::config::{PriceTable, ValidationMode};
use lotocover_core::models::{Draw, Grid};
use lotocover_core::scenario::ScenarioAnalysis;
use lotocover_core::solver::{Solution, SolverOutcome, SolverStatus};
use lotocover_core::validator::{GuaranteeVerdict, ValidationReport};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn euros(amount: f64) -> String {
    format!("{:.2} €", amount)
}

fn class_color(class: SolutionClass) -> Color {
    match class {
        SolutionClass::Optimal => Color::Green,
        SolutionClass::Plausible => Color::White,
        SolutionClass::Suspect => Color::Yellow,
        SolutionClass::Impossible => Color::Red,
    }
}

pub fn display_bounds(record: &BoundRecord, classified: Option<(u64, SolutionClass)>) {
    println!(
        "\n📐 Bornes pour {} numéros, garantie {} sur {} (grilles simples)\n",
        record.pool_size, record.threshold, record.grid_size
    );

    let mut table = new_table(vec!["Borne", "Grilles"]);
    table.add_row(vec![Cell::new("Divisibilité"), Cell::new(record.divisibility)]);
    table.add_row(vec![Cell::new("Schönheim"), Cell::new(record.schonheim)]);
    table.add_row(vec![
        Cell::new("Plancher certifié"),
        Cell::new(record.floor.to_string()).fg(Color::Cyan),
    ]);
    table.add_row(vec![Cell::new("Estimation haute"), Cell::new(record.upper)]);
    println!("{table}");

    if let Some((count, class)) = classified {
        let mut table = new_table(vec!["Grilles simples équivalentes", "Classement"]);
        table.add_row(vec![
            Cell::new(count.to_string()),
            Cell::new(class.to_string()).fg(class_color(class)),
        ]);
        println!("{table}");
    }
}

pub fn display_grids(grids: &[Grid], prices: &PriceTable) {
    let mut table = new_table(vec!["#", "Taille", "Numéros", "Prix"]);
    for (i, grid) in grids.iter().enumerate() {
        let price = prices.price(grid.size()).map(euros).unwrap_or_else(|| "—".to_string());
        table.add_row(vec![
            &format!("{}", i + 1),
            &grid.size().to_string(),
            &grid.to_string(),
            &price,
        ]);
    }
    println!("{table}");
}

fn status_cell(solution: &Solution) -> Cell {
    match solution.status {
        SolverStatus::Covered => Cell::new("complète").fg(Color::Green),
        SolverStatus::Aborted { uncovered, reason } => {
            Cell::new(format!("partielle ({uncovered} non couverts, {reason:?})")).fg(Color::Red)
        }
    }
}

pub fn display_solver(outcome: &SolverOutcome) {
    println!("\n🧮 Comparaison des stratégies\n");

    let mut table = new_table(vec!["Stratégie", "Grilles", "Coût", "État"]);
    table.add_row(vec![
        Cell::new(outcome.greedy.strategy.to_string()),
        Cell::new(outcome.greedy.grid_count().to_string()),
        Cell::new(euros(outcome.greedy.total_cost)),
        status_cell(&outcome.greedy),
    ]);
    for summary in outcome.pure_large.iter().chain(outcome.pure_small.iter()) {
        table.add_row(vec![
            Cell::new(summary.strategy.to_string()),
            Cell::new(summary.grid_count.to_string()),
            Cell::new(euros(summary.total_cost)),
            Cell::new("complète").fg(Color::Green),
        ]);
    }
    println!("{table}");

    let rec = &outcome.recommendation;
    println!(
        "\n✅ Recommandation : {}, {} grilles pour {}",
        rec.strategy,
        rec.grid_count(),
        euros(rec.total_cost)
    );
}

fn verdict_cell(verdict: GuaranteeVerdict) -> Cell {
    match verdict {
        GuaranteeVerdict::Proven => Cell::new("GARANTIE PROUVÉE").fg(Color::Green),
        GuaranteeVerdict::Invalidated { failures, uncovered } => Cell::new(format!(
            "GARANTIE INVALIDÉE ({failures} échecs, {uncovered} sous-ensembles non couverts)"
        ))
        .fg(Color::Red),
        GuaranteeVerdict::NotApplicable => Cell::new("estimation (non probante)").fg(Color::Yellow),
    }
}

pub fn display_validation(report: &ValidationReport) {
    println!("\n🔍 Validation de la garantie {} sur 5\n", report.threshold);

    let mut table = new_table(vec!["Mesure", "Valeur"]);
    let mode = match report.mode {
        ValidationMode::Exhaustive => "exhaustif",
        ValidationMode::Sampled => "échantillonné",
    };
    table.add_row(vec![Cell::new("Mode"), Cell::new(mode)]);
    let tested = match report.universe_size {
        Some(size) => format!("{} / {}", report.tested, size),
        None => report.tested.to_string(),
    };
    table.add_row(vec![Cell::new("Tirages testés"), Cell::new(tested)]);
    table.add_row(vec![Cell::new("Succès"), Cell::new(report.successes.to_string())]);
    table.add_row(vec![Cell::new("Échecs"), Cell::new(report.failures.to_string())]);
    if let Some(rate) = report.universe_coverage() {
        table.add_row(vec![Cell::new("Couverture de l'univers"), Cell::new(format!("{:.2}%", rate * 100.0))]);
    }
    if let Some(rate) = report.sample_success_rate() {
        table.add_row(vec![Cell::new("Réussite sur échantillon"), Cell::new(format!("{:.2}%", rate * 100.0))]);
    }
    if let Some(uncovered) = report.uncovered_subsets {
        table.add_row(vec![Cell::new("Sous-ensembles non couverts"), Cell::new(uncovered.to_string())]);
    }
    if let Some(seed) = report.seed {
        table.add_row(vec![Cell::new("Seed"), Cell::new(seed.to_string())]);
    }
    table.add_row(vec![Cell::new("Verdict"), verdict_cell(report.verdict)]);
    println!("{table}");

    println!("\n── Par grille ──");
    let mut table = new_table(vec!["#", "Numéros", "Gagnantes", "Taux", "Bons numéros 0..5"]);
    for (i, stats) in report.grid_stats.iter().enumerate() {
        let histogram = stats
            .match_histogram
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" / ");
        table.add_row(vec![
            &format!("{}", i + 1),
            &stats.grid.to_string(),
            &stats.wins.to_string(),
            &format!("{:.2}%", stats.win_rate * 100.0),
            &histogram,
        ]);
    }
    println!("{table}");

    if !report.counterexamples.is_empty() {
        display_counterexamples(report);
    }
    if !report.uncovered_examples.is_empty() {
        display_uncovered(report);
    }
}

fn display_uncovered(report: &ValidationReport) {
    let shown = report.uncovered_examples.len() as u64;
    let total = report.uncovered_subsets.unwrap_or(shown);
    println!("\n❌ Sous-ensembles de {} numéros dans aucune grille ({shown} sur {total})", report.threshold);
    for subset in &report.uncovered_examples {
        let numbers = subset.iter().map(|n| format!("{:2}", n)).collect::<Vec<_>>().join(" - ");
        println!("  {numbers}");
    }
}

fn display_counterexamples(report: &ValidationReport) {
    let suffix = if report.counterexamples_truncated { " (liste tronquée)" } else { "" };
    println!("\n❌ Contre-exemples{suffix}");

    let mut table = new_table(vec!["Tirage", "Chance", "Meilleur", "Par grille"]);
    for cx in &report.counterexamples {
        let draw = cx.draw.iter().map(|n| format!("{:2}", n)).collect::<Vec<_>>().join(" - ");
        let per_grid = cx.grid_matches.iter().map(|m| m.to_string()).collect::<Vec<_>>().join(" ");
        table.add_row(vec![
            Cell::new(draw),
            Cell::new(cx.chance.map(|c| c.to_string()).unwrap_or_else(|| "—".to_string())),
            Cell::new(cx.best_match.to_string()).fg(Color::Red),
            Cell::new(per_grid),
        ]);
    }
    println!("{table}");
}

pub fn display_scenarios(analysis: &ScenarioAnalysis) {
    println!(
        "\n💶 Scénarios de gains ({} numéros, mise {})\n",
        analysis.pool_size,
        euros(analysis.total_cost)
    );

    let mut table = new_table(vec![
        "Boules dans la sélection",
        "Système complet",
        "Gain garanti",
        "Gain moyen",
        "Meilleur gain",
        "Net garanti",
    ]);
    let opt = |v: Option<f64>| v.map(euros).unwrap_or_else(|| "—".to_string());
    for level in &analysis.levels {
        let net = match level.guaranteed_net {
            Some(net) if net >= 0.0 => Cell::new(euros(net)).fg(Color::Green),
            Some(net) => Cell::new(euros(net)).fg(Color::Red),
            None => Cell::new("—"),
        };
        let in_pool = if level.within_guarantee {
            format!("{}/5 ★", level.in_pool)
        } else {
            format!("{}/5", level.in_pool)
        };
        table.add_row(vec![
            Cell::new(in_pool),
            Cell::new(euros(level.full_wheel_payout)),
            Cell::new(opt(level.guaranteed_payout)),
            Cell::new(euros(level.average_payout)),
            Cell::new(opt(level.best_payout)),
            net,
        ]);
    }
    println!("{table}");

    if let Some(cost) = analysis.full_wheel_cost {
        println!("Système complet en grilles simples : {}", euros(cost));
    }
    for level in &analysis.levels {
        println!("  {}", level.recommendation);
    }
    println!("\n➡️  {}", analysis.recommendation);
}

pub fn display_analysis(analysis: &CoverageAnalysis, prices: &PriceTable) {
    println!(
        "\n🎯 Sélection : {} ({} numéros), garantie {}",
        analysis.pool.numbers().iter().map(|n| n.to_string()).collect::<Vec<_>>().join(", "),
        analysis.pool.len(),
        analysis.target
    );
    println!(
        "   {} sous-ensembles à couvrir, {} grilles candidates",
        analysis.universe_size, analysis.candidate_count
    );

    display_solver(&analysis.solver);
    println!();
    display_grids(&analysis.solver.recommendation.grids, prices);
    display_bounds(
        &analysis.bounds,
        Some((analysis.equivalent_simple_grids, analysis.classification)),
    );
    display_validation(&analysis.validation);
    display_scenarios(&analysis.scenarios);
}

pub fn display_check(draw: &Draw, grids: &[Grid], matches: &[u32], payouts: &[f64]) {
    let balls = draw.balls.iter().map(|n| format!("{:2}", n)).collect::<Vec<_>>().join(" - ");
    println!("\n🎱 Tirage : {} | chance {}\n", balls, draw.chance);

    let mut table = new_table(vec!["#", "Numéros", "Bons numéros", "Gain indicatif"]);
    for (i, ((grid, &m), &gain)) in grids.iter().zip(matches).zip(payouts).enumerate() {
        let gain_cell = if gain > 0.0 {
            Cell::new(euros(gain)).fg(Color::Green)
        } else {
            Cell::new(euros(gain))
        };
        table.add_row(vec![
            Cell::new(format!("{}", i + 1)),
            Cell::new(grid.to_string()),
            Cell::new(m.to_string()),
            gain_cell,
        ]);
    }
    println!("{table}");
    println!("Total indicatif : {}", euros(payouts.iter().sum()));
}

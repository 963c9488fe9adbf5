mod scenario;

use std::path::{Path, PathBuf};

use anyhow::bail;
use clap::{Parser, Subcommand, ValueEnum};
use rawmix_core::{
    BlendError, BlendReport, Moduli, ObjectiveMode, Oxide, Recomputation, SolveStatus, SolvedBlend, Stage,
};
use rawmix_solver::{Analysis, ConstraintViolation, Solver};
use scenario::Scenario;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

/// Largest tolerated gap between the solver's values and the replayed pipeline
const CONSISTENCY_TOLERANCE: f64 = 1e-6;

#[derive(Parser)]
#[command(name = "rawmix")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Cement raw-mix blend optimizer", long_about = None)]
struct Cli {
    #[arg(short, long, value_enum, default_value_t = LogLevel::Warn, global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find a blend that meets the clinker quality targets
    Solve {
        /// Scenario file (JSON)
        file: PathBuf,
        /// Objective, overriding the scenario's
        #[arg(short, long, value_enum)]
        mode: Option<Mode>,
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
        /// Show shadow prices and reduced costs
        #[arg(short, long)]
        analysis: bool,
    },
    /// Evaluate a given blend through every stage of the kiln line
    Recompute {
        /// Scenario file (JSON)
        file: PathBuf,
        /// Shares as ID=percent, comma separated
        #[arg(short, long)]
        proportions: String,
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },
    /// Validate a scenario without solving it
    Check {
        /// Scenario file (JSON)
        file: PathBuf,
    },
    /// Print the reference scenario as a starting point
    Template,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Feasibility,
    Cost,
}

impl From<Mode> for ObjectiveMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Feasibility => ObjectiveMode::Feasibility,
            Mode::Cost => ObjectiveMode::CostMinimization,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::from(cli.log_level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Solve {
            file,
            mode,
            format,
            analysis,
        } => solve(&file, mode, format, analysis),
        Commands::Recompute {
            file,
            proportions,
            format,
        } => recompute(&file, &proportions, format),
        Commands::Check { file } => check(&file),
        Commands::Template => {
            println!("{}", serde_json::to_string_pretty(&Scenario::reference())?);
            Ok(())
        }
    }
}

fn infeasible_json(violations: &[ConstraintViolation]) -> serde_json::Value {
    serde_json::json!({
        "status": SolveStatus::Infeasible,
        "violations": violations,
    })
}

fn solve(file: &Path, mode: Option<Mode>, format: Format, analysis: bool) -> anyhow::Result<()> {
    let scenario = Scenario::load(file)?;
    let mode = mode.map(ObjectiveMode::from).unwrap_or(scenario.objective);
    let fuel = scenario.fuel_summary()?;
    let model = scenario.optimizer(&fuel, mode).build()?;

    let result = model.solve(&Solver::new());
    let status = SolveStatus::of(&result);
    let blend = match result {
        Ok(blend) => blend,
        Err(BlendError::Infeasible { violations }) => {
            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&infeasible_json(&violations))?),
                Format::Pretty => {
                    println!("Status: INFEASIBLE");
                    println!("No blend satisfies every constraint.");
                    if !violations.is_empty() {
                        println!();
                        println!("Constraints broken by the closest blend:");
                        for v in &violations {
                            println!("  - {}", v.description);
                        }
                    }
                }
            }
            bail!("solve finished with status {}", SolveStatus::Infeasible);
        }
        Err(e) => {
            let status = status.map_or_else(|| "error".to_string(), |s| s.to_string());
            return Err(anyhow::Error::new(e).context(format!("solve finished with status {status}")));
        }
    };

    let recomputation =
        Recomputation::from_balance(model.balance(), &blend.values(), scenario.operation.free_lime)?;
    recomputation.is_consistent_with(&blend.derived, CONSISTENCY_TOLERANCE);
    let report = BlendReport::new(&scenario.materials, &recomputation, &scenario.operation, fuel)
        .with_solution(&blend);

    match format {
        Format::Json => {
            let output = serde_json::json!({
                "status": SolveStatus::Optimal,
                "blend": blend,
                "report": report,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Format::Pretty => {
            println!("Status: OPTIMAL");
            print_report(&report);
            print_derived(&blend);
            if analysis {
                print_analysis(&blend.analysis);
            }
        }
    }
    info!(file = %file.display(), "solve complete");
    Ok(())
}

fn recompute(file: &Path, proportions: &str, format: Format) -> anyhow::Result<()> {
    let scenario = Scenario::load(file)?;
    let proportions = scenario.proportions(proportions)?;
    let fuel = scenario.fuel_summary()?;
    let recomputation = rawmix_core::recompute(
        &scenario.materials,
        &proportions,
        &scenario.dust,
        &fuel.ash_load(),
        &scenario.operation,
    )?;
    let report = BlendReport::new(&scenario.materials, &recomputation, &scenario.operation, fuel);

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        Format::Pretty => print_report(&report),
    }
    Ok(())
}

fn check(file: &Path) -> anyhow::Result<()> {
    let scenario = Scenario::load(file)?;
    let checked = scenario
        .fuel_summary()
        .and_then(|fuel| scenario.optimizer(&fuel, scenario.objective).build());

    match checked {
        Ok(model) => {
            println!("✓ {} is valid", file.display());
            println!("  {} materials", model.materials().len());
            println!("  {} fuels", scenario.fuels.len());
            println!("  {} quality constraints", model.quality_constraints().len());
            println!("  {} LP rows", model.problem().num_constraints());
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ {} has errors:", file.display());
            eprintln!("  {e}");
            bail!("invalid scenario");
        }
    }
}

fn print_report(report: &BlendReport) {
    println!();
    println!("Blend:");
    println!(
        "  {:12} {:>8} {:>8} {:>10} {:>14}",
        "Material", "% Dry", "% Wet", "TPH", "Cost/h"
    );
    for row in &report.materials {
        println!(
            "  {:12} {:8.2} {:8.2} {:10.1} {:14.0}",
            row.id, row.dry, row.wet, row.feed_tph, row.cost_per_hour
        );
    }
    println!(
        "  {:12} {:>8} {:>8} {:10.1} {:14.0}",
        "Total", "", "", report.total_feed_tph, report.cost_per_hour
    );
    if let Some(objective) = report.objective_value {
        println!("  Objective value: {objective:.4}");
    }

    println!();
    print!("  {:10}", "Stage");
    for oxide in Oxide::ALL {
        print!(" {:>7}", oxide.symbol());
    }
    println!();
    for stage in Stage::ALL {
        let Some(row) = report.stage(stage) else { continue };
        print!("  {:10}", stage.label());
        for (_, value) in row.oxides.iter() {
            print!(" {value:7.2}");
        }
        println!();
    }

    println!();
    println!("  {:10} {:>7} {:>7} {:>7} {:>7}", "Moduli", "LSF", "SM", "AM", "NaEq");
    for stage in Stage::ALL {
        if let Some(Moduli { lsf, sm, am, na_eq }) = report.stage(stage).and_then(|row| row.moduli) {
            println!("  {:10} {lsf:7.2} {sm:7.3} {am:7.3} {na_eq:7.3}", stage.label());
        }
    }

    let bogue = report.bogue_display;
    println!();
    println!("Bogue (clinker):");
    println!(
        "  C3S {:.2}  C2S {:.2}  C3A {:.2}  C4AF {:.2}",
        bogue.c3s, bogue.c2s, bogue.c3a, bogue.c4af
    );

    let fuel = &report.fuel;
    println!();
    println!("Process:");
    println!("  CV total           {:10.1} kcal/kg", fuel.cv_total);
    println!("  Fuel               {:10.2} t/h", fuel.total_fuel_tph);
    println!("  Ash                {:10.2} t/h", fuel.total_ash_tph);
    println!("  Alternative heat   {:10.1} %", fuel.alternative_heat_share);
    println!("  Dust loss          {:10.2} t/h", report.dust.loss_tph);
    println!("  Dust to silo       {:10.2} t/h", report.dust.to_silo_tph);
    println!("  Dust to kiln       {:10.2} t/h", report.dust.to_kiln_tph);
    println!("  Raw meal H2O       {:10.2} %", report.raw_meal_moisture);
}

fn print_derived(blend: &SolvedBlend) {
    let derived = &blend.derived;
    println!();
    println!("Solver values:");
    println!("  Z       {:10.4}", derived.z);
    println!("  LOI_u   {:10.4}", derived.loi_unignited);
    println!("  C3S_lin {:10.4}", derived.c3s_lin);
}

fn print_analysis(analysis: &Analysis) {
    println!();
    println!("Analysis:");
    if !analysis.binding_constraints.is_empty() {
        println!("Binding constraints:");
        for name in &analysis.binding_constraints {
            println!("  - {name}");
        }
        println!();
    }

    println!("Shadow prices:");
    for sp in &analysis.shadow_prices {
        if sp.value.abs() > 0.001 {
            println!("  {:20} {:12.4}", sp.constraint, sp.value);
        }
    }
    println!();

    println!("Reduced costs (materials at a bound):");
    for rc in &analysis.reduced_costs {
        if !rc.is_basic && rc.reduced_cost.abs() > 0.001 {
            println!("  {:20} {:12.4}", rc.variable, rc.reduced_cost);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_is_parsed() {
        let cli = Cli::try_parse_from(["rawmix", "--log-level", "debug", "template"]).unwrap();
        assert_eq!(cli.log_level, LogLevel::Debug);

        let cli = Cli::try_parse_from(["rawmix", "template"]).unwrap();
        assert_eq!(cli.log_level, LogLevel::Warn);
    }

    #[test]
    fn test_unknown_log_level_is_rejected() {
        assert!(Cli::try_parse_from(["rawmix", "--log-level", "verbose", "template"]).is_err());
    }

    #[test]
    fn test_infeasible_json_output() {
        let mut scenario = Scenario::reference();
        scenario.targets.lsf = rawmix_core::Limits::between(99.0, 100.0);
        let path = std::env::temp_dir().join(format!("rawmix-infeasible-{}.json", std::process::id()));
        std::fs::write(&path, serde_json::to_string(&scenario).unwrap()).unwrap();

        let err = solve(&path, None, Format::Json, false).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(err.to_string().contains("Infeasible"), "{err}");
    }

    #[test]
    fn test_infeasible_json_shape() {
        let violations = vec![ConstraintViolation {
            constraint: "LSF_min".to_string(),
            required: 0.0,
            actual: -0.12,
            violation_amount: 0.12,
            description: "LSF_min short by 0.12".to_string(),
        }];
        let json = infeasible_json(&violations);
        assert_eq!(json["status"], "infeasible");
        assert_eq!(json["violations"][0]["constraint"], "LSF_min");
        assert_eq!(json["violations"].as_array().unwrap().len(), 1);
    }
}

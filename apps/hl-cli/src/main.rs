use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use hl_app::{
    AppError, AppResult, RunManifest, RunOptions, RunRequest, RunResponse, project_service,
    query, run_service,
};
use hl_calc::{CalcReport, ConsistencyWarning, FinalTotals, RoundingPolicy};
use tracing::debug;

#[derive(Parser)]
#[command(name = "heatload")]
#[command(about = "Heat load summary - aggregation, correction and audit traces", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create an empty project file
    Init {
        /// Path of the new project file (.yaml or .json)
        project_path: PathBuf,
        /// Project name
        #[arg(long, default_value = "New project")]
        name: String,
    },
    /// Validate project file syntax, structure and correction table
    Validate {
        /// Path to the project file
        project_path: PathBuf,
    },
    /// List systems and unassigned rooms in a project
    Systems {
        /// Path to the project file
        project_path: PathBuf,
    },
    /// Run the load calculation
    Run {
        /// Path to the project file
        project_path: PathBuf,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
        /// Assemble rooms on a single thread
        #[arg(long)]
        sequential: bool,
        /// Major cell registry YAML (defaults to the built-in summary sheet)
        #[arg(long)]
        cells: Option<PathBuf>,
        /// Also write the full report as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List cached runs for a project
    Runs {
        /// Path to the project file
        project_path: PathBuf,
    },
    /// Show a cached run (the latest one when no id is given)
    ShowRun {
        /// Path to the project file
        project_path: PathBuf,
        /// Run ID to display
        run_id: Option<String>,
    },
    /// Print the major cell table of a run
    Cells {
        /// Path to the project file
        project_path: PathBuf,
        /// Run ID (defaults to the latest run)
        #[arg(long)]
        run_id: Option<String>,
        /// Registry the run was made with
        #[arg(long)]
        cells: Option<PathBuf>,
    },
    /// Print the calculation traces of one entity as JSON
    Trace {
        /// Path to the project file
        project_path: PathBuf,
        /// room:ID, system:ID or project
        #[arg(long)]
        entity: String,
        /// Run ID (defaults to the latest run)
        #[arg(long)]
        run_id: Option<String>,
    },
    /// Apply the project's rounding policy to a raw quantity
    Round {
        /// Path to the project file
        project_path: PathBuf,
        /// Occupant count to round
        #[arg(long, conflicts_with = "outdoor_air", required_unless_present = "outdoor_air")]
        occupancy: Option<f64>,
        /// Outdoor-air volume to round [m³/h]
        #[arg(long)]
        outdoor_air: Option<f64>,
    },
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    debug!(command = ?cli.command, "dispatching");

    match cli.command {
        Commands::Init { project_path, name } => cmd_init(&project_path, &name),
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Systems { project_path } => cmd_systems(&project_path),
        Commands::Run {
            project_path,
            no_cache,
            sequential,
            cells,
            output,
        } => cmd_run(
            &project_path,
            !no_cache,
            !sequential,
            cells.as_deref(),
            output.as_deref(),
        ),
        Commands::Runs { project_path } => cmd_runs(&project_path),
        Commands::ShowRun {
            project_path,
            run_id,
        } => cmd_show_run(&project_path, run_id.as_deref()),
        Commands::Cells {
            project_path,
            run_id,
            cells,
        } => cmd_cells(&project_path, run_id.as_deref(), cells.as_deref()),
        Commands::Trace {
            project_path,
            entity,
            run_id,
        } => cmd_trace(&project_path, &entity, run_id.as_deref()),
        Commands::Round {
            project_path,
            occupancy,
            outdoor_air,
        } => cmd_round(&project_path, occupancy, outdoor_air),
    }
}

fn cmd_init(project_path: &Path, name: &str) -> AppResult<()> {
    let project = project_service::init_project(project_path, name)?;
    println!("✓ Created project '{}' ({})", project.name, project.id);
    Ok(())
}

fn cmd_validate(project_path: &Path) -> AppResult<()> {
    println!("Validating project: {}", project_path.display());
    let project = project_service::load_project(project_path)?;
    let warnings = project_service::check_project(&project)?;
    println!("✓ Project is valid");
    print_warnings(&warnings);
    Ok(())
}

fn cmd_systems(project_path: &Path) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;
    let systems = project_service::list_systems(&project);

    if systems.is_empty() {
        println!("No systems found in project");
    } else {
        println!("Systems in project:");
        for sys in systems {
            println!(
                "  {} - {} ({} rooms, {:.1} m²)",
                sys.id, sys.name, sys.room_count, sys.floor_area_m2
            );
            for missing in &sys.missing_rooms {
                println!("    ! room '{}' is not defined", missing);
            }
        }
    }

    let unassigned = project_service::unassigned_rooms(&project);
    if !unassigned.is_empty() {
        println!("Unassigned rooms:");
        for room in unassigned {
            println!("  {} - {} ({:.1} m²)", room.id, room.name, room.area_m2);
        }
    }
    Ok(())
}

fn cmd_run(
    project_path: &Path,
    use_cache: bool,
    parallel: bool,
    cells: Option<&Path>,
    output: Option<&Path>,
) -> AppResult<()> {
    println!("Running load calculation: {}", project_path.display());

    let request = RunRequest {
        project_path,
        options: RunOptions {
            use_cache,
            parallel,
            registry: run_service::load_registry(cells)?,
        },
    };
    let response = run_service::ensure_run(&request)?;

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.run_id);
    } else {
        println!("✓ Calculation completed: {}", response.run_id);
    }

    print_report(&response.report);
    print_warnings(&response.report.warnings);
    print_timing(&response);

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&response.report)
            .map_err(|e| AppError::Results(e.to_string()))?;
        std::fs::write(path, json)?;
        println!("✓ Report written to {}", path.display());
    }
    Ok(())
}

fn cmd_runs(project_path: &Path) -> AppResult<()> {
    let runs = run_service::list_runs(project_path)?;

    if runs.is_empty() {
        println!("No cached runs found");
    } else {
        println!("Cached runs:");
        for manifest in runs {
            println!(
                "  {} ({}) cooling {:.0} W, heating {:.0} W",
                manifest.run_id,
                manifest.timestamp,
                manifest.summary.cooling_total_w,
                manifest.summary.heating_total_w
            );
        }
    }
    Ok(())
}

fn cmd_show_run(project_path: &Path, run_id: Option<&str>) -> AppResult<()> {
    let (manifest, report) = load_run_or_latest(project_path, run_id)?;
    println!("Run: {}", manifest.run_id);
    println!("  Project: {} ({})", manifest.project_name, manifest.project_id);
    println!("  Timestamp: {}", manifest.timestamp);
    println!(
        "  Engine {} / cells {}",
        manifest.engine_version, manifest.registry_version
    );
    print_report(&report);
    print_warnings(&report.warnings);
    Ok(())
}

fn cmd_cells(project_path: &Path, run_id: Option<&str>, cells: Option<&Path>) -> AppResult<()> {
    let registry = run_service::load_registry(cells)?;
    let (manifest, report) = load_run_or_latest(project_path, run_id)?;
    if manifest.registry_version != registry.version() {
        println!(
            "Note: run was made with cells '{}', showing '{}'",
            manifest.registry_version,
            registry.version()
        );
    }

    println!("{:<8} {:<14} {:<34} {:>12}", "Cell", "Target", "Metric", "Value");
    for row in query::major_cell_rows(&report.result, &registry) {
        let value = row
            .value
            .map(|v| format!("{v:.1}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<8} {:<14} {:<34} {:>12}",
            row.name, row.target, row.metric, value
        );
    }
    Ok(())
}

fn cmd_trace(project_path: &Path, entity: &str, run_id: Option<&str>) -> AppResult<()> {
    let (entity_type, id) = query::parse_entity(entity)?;
    let (_manifest, report) = load_run_or_latest(project_path, run_id)?;
    let traces = query::traces_for(&report.result, entity_type, id.as_deref())?;
    let json =
        serde_json::to_string_pretty(&traces).map_err(|e| AppError::Results(e.to_string()))?;
    println!("{json}");
    Ok(())
}

fn cmd_round(project_path: &Path, occupancy: Option<f64>, outdoor_air: Option<f64>) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;
    let policy = RoundingPolicy::new(&project.metadata.rounding)?;

    if let Some(count) = occupancy {
        println!("{}", policy.round_occupancy(count));
    }
    if let Some(volume) = outdoor_air {
        println!("{}", policy.round_outdoor_air(volume));
    }
    Ok(())
}

fn load_run_or_latest(
    project_path: &Path,
    run_id: Option<&str>,
) -> AppResult<(RunManifest, CalcReport)> {
    match run_id {
        Some(id) => run_service::load_run(project_path, id),
        None => run_service::latest_run(project_path),
    }
}

fn print_report(report: &CalcReport) {
    let result = &report.result;
    println!("\nSystems:");
    for system in &result.system_results {
        println!(
            "  {:<16} peak {}  {}",
            system.system_id,
            system.peak_hour,
            format_totals(&system.totals)
        );
    }
    println!("Project:");
    println!("  {:<16} {}", "", format_totals(&result.totals));
}

fn format_totals(totals: &FinalTotals) -> String {
    format!(
        "cooling {:.0} W (S {:.0} / L {:.0}), heating {:.0} W (S {:.0} / L {:.0})",
        totals.cooling_total,
        totals.cooling_sensible,
        totals.cooling_latent,
        totals.heating_total,
        totals.heating_sensible,
        totals.heating_latent
    )
}

fn print_warnings(warnings: &[ConsistencyWarning]) {
    if warnings.is_empty() {
        return;
    }
    println!("\nWarnings ({}):", warnings.len());
    for w in warnings {
        println!(
            "  [{}] {} {}: {}",
            w.code, w.entity_type, w.entity_id, w.message
        );
    }
}

fn print_timing(response: &RunResponse) {
    let timing = &response.timing;
    println!("\nTiming summary:");
    println!("  Load:    {:.3}s", timing.load_project_time_s);
    if response.loaded_from_cache {
        println!("  Cache load: {:.3}s", timing.load_cache_time_s);
    } else {
        println!("  Calc:    {:.3}s", timing.calc_time_s);
        println!("  Save:    {:.3}s", timing.save_time_s);
    }
    println!("  Total:   {:.3}s", timing.total_time_s);
}

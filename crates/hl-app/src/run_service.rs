//! Run execution and caching service.

use std::path::Path;
use std::time::Instant;

use hl_calc::{CalcOptions, CalcReport, ENGINE_VERSION, MajorCellRegistry};
use hl_results::{RunManifest, RunStore, RunSummary, compute_fingerprint, compute_run_id};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::project_service;

/// Options for running a calculation.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub use_cache: bool,
    pub parallel: bool,
    pub registry: MajorCellRegistry,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            parallel: true,
            registry: MajorCellRegistry::standard(),
        }
    }
}

/// Request to execute a run.
pub struct RunRequest<'a> {
    pub project_path: &'a Path,
    pub options: RunOptions,
}

/// Wall-clock timing of a run.
#[derive(Debug, Clone, Default)]
pub struct RunTimingSummary {
    pub load_project_time_s: f64,
    pub calc_time_s: f64,
    pub save_time_s: f64,
    pub load_cache_time_s: f64,
    pub total_time_s: f64,
}

/// Response from a run execution.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run_id: String,
    pub manifest: RunManifest,
    pub report: CalcReport,
    pub loaded_from_cache: bool,
    pub timing: RunTimingSummary,
}

/// Load the major cell registry: the built-in table, or a YAML file.
pub fn load_registry(path: Option<&Path>) -> AppResult<MajorCellRegistry> {
    let Some(path) = path else {
        return Ok(MajorCellRegistry::standard());
    };
    let content = std::fs::read_to_string(path).map_err(|e| AppError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(MajorCellRegistry::from_yaml_str(&content)?)
}

/// Execute or load a run based on request.
pub fn ensure_run(request: &RunRequest) -> AppResult<RunResponse> {
    let started = Instant::now();
    let mut timing = RunTimingSummary::default();

    let project = project_service::load_project(request.project_path)?;
    timing.load_project_time_s = started.elapsed().as_secs_f64();

    let registry = &request.options.registry;
    let run_id = compute_run_id(&project, ENGINE_VERSION, &registry.to_def());
    let store = RunStore::for_project(request.project_path)?;

    if request.options.use_cache && store.has_run(&run_id) {
        let load_started = Instant::now();
        match store.load_report(&run_id) {
            Ok(report) => {
                let manifest = store.load_manifest(&run_id)?;
                timing.load_cache_time_s = load_started.elapsed().as_secs_f64();
                timing.total_time_s = started.elapsed().as_secs_f64();
                info!(run_id = %run_id, "loaded cached run");
                return Ok(RunResponse {
                    run_id,
                    manifest,
                    report,
                    loaded_from_cache: true,
                    timing,
                });
            }
            Err(e) => warn!(run_id = %run_id, error = %e, "cached run unusable, recalculating"),
        }
    }

    let calc_started = Instant::now();
    let options = CalcOptions {
        parallel: request.options.parallel,
    };
    let report = hl_calc::run_calculation(&project, registry, &options)?;
    timing.calc_time_s = calc_started.elapsed().as_secs_f64();

    let manifest = RunManifest {
        run_id: run_id.clone(),
        project_id: project.id.clone(),
        project_name: project.name.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        engine_version: report.engine_version.clone(),
        registry_version: report.registry_version.clone(),
        fingerprint: compute_fingerprint(&report.result),
        summary: RunSummary::from_report(&report),
    };

    let save_started = Instant::now();
    store.save_run(&manifest, &report)?;
    timing.save_time_s = save_started.elapsed().as_secs_f64();
    timing.total_time_s = started.elapsed().as_secs_f64();

    info!(run_id = %run_id, elapsed_s = timing.total_time_s, "run saved");

    Ok(RunResponse {
        run_id,
        manifest,
        report,
        loaded_from_cache: false,
        timing,
    })
}

/// List runs of the project at `project_path`, most recent first.
pub fn list_runs(project_path: &Path) -> AppResult<Vec<RunManifest>> {
    let project = project_service::load_project(project_path)?;
    let store = RunStore::for_project(project_path)?;
    Ok(store.list_runs(&project.id)?)
}

/// Load a specific run.
pub fn load_run(project_path: &Path, run_id: &str) -> AppResult<(RunManifest, CalcReport)> {
    let store = RunStore::for_project(project_path)?;

    let manifest = store.load_manifest(run_id)?;
    let report = store.load_report(run_id)?;

    Ok((manifest, report))
}

/// Most recent run of the project, if any.
pub fn latest_run(project_path: &Path) -> AppResult<(RunManifest, CalcReport)> {
    let runs = list_runs(project_path)?;
    let latest = runs
        .first()
        .ok_or_else(|| AppError::RunNotFound("no runs for this project".to_string()))?;
    load_run(project_path, &latest.run_id)
}

//! Shared application service layer for heatload.
//!
//! Gives the CLI (and any other front end) one place for project loading and
//! validation, cached calculation runs, and result queries.

pub mod error;
pub mod project_service;
pub mod query;
pub mod run_service;

// Re-export key types for convenience
pub use error::{AppError, AppResult};
pub use project_service::{
    SystemSummary, check_project, get_room, get_system, init_project, list_systems, load_project,
    save_project, unassigned_rooms, validate_project,
};
pub use query::{
    CellRow, major_cell_rows, parse_entity, room_result, system_result, traces_for,
};
pub use run_service::{
    RunOptions, RunRequest, RunResponse, RunTimingSummary, ensure_run, latest_run, list_runs,
    load_registry, load_run,
};
pub use hl_results::RunManifest;

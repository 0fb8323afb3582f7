//! Project loading, saving, validation, and introspection.

use std::collections::HashSet;
use std::path::Path;

use hl_calc::{CalcOptions, ConsistencyWarning, CorrectionFactors, MajorCellRegistry, RoundingPolicy};
use hl_project::{Project, ProjectError, Room, System};

use crate::error::{AppError, AppResult};

/// Summary of a system for listing.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemSummary {
    pub id: String,
    pub name: String,
    pub room_count: usize,
    pub floor_area_m2: f64,
    /// Listed room ids that the project does not define.
    pub missing_rooms: Vec<String>,
}

/// Load a project (YAML or JSON by extension), migrating and validating it.
pub fn load_project(path: &Path) -> AppResult<Project> {
    hl_project::load(path).map_err(|e| match e {
        ProjectError::Io(source) => AppError::FileRead {
            path: path.to_path_buf(),
            source,
        },
        other => other.into(),
    })
}

pub fn save_project(path: &Path, project: &Project) -> AppResult<()> {
    Ok(hl_project::save(path, project)?)
}

/// Structural validation plus the configuration checks the engine would
/// fail on (correction table, rounding settings).
pub fn validate_project(project: &Project) -> AppResult<()> {
    hl_project::validate_project(project)?;
    CorrectionFactors::from_def(&project.metadata.correction_factors)?;
    RoundingPolicy::new(&project.metadata.rounding)?;
    Ok(())
}

/// Validate, then run the engine once to collect data-consistency warnings.
pub fn check_project(project: &Project) -> AppResult<Vec<ConsistencyWarning>> {
    validate_project(project)?;
    let report = hl_calc::run_calculation(
        project,
        &MajorCellRegistry::standard(),
        &CalcOptions::default(),
    )?;
    Ok(report.warnings)
}

/// List declared systems with their membership.
pub fn list_systems(project: &Project) -> Vec<SystemSummary> {
    project
        .systems
        .iter()
        .map(|system| {
            let mut room_count = 0;
            let mut floor_area_m2 = 0.0;
            let mut missing_rooms = Vec::new();
            for room_id in &system.room_ids {
                match project.rooms.iter().find(|r| &r.id == room_id) {
                    Some(room) => {
                        room_count += 1;
                        floor_area_m2 += room.area_m2;
                    }
                    None => missing_rooms.push(room_id.clone()),
                }
            }
            SystemSummary {
                id: system.id.clone(),
                name: system.name.clone(),
                room_count,
                floor_area_m2,
                missing_rooms,
            }
        })
        .collect()
}

/// Rooms no system lists, in room-list order.
pub fn unassigned_rooms(project: &Project) -> Vec<&Room> {
    let listed: HashSet<&str> = project
        .systems
        .iter()
        .flat_map(|s| s.room_ids.iter().map(String::as_str))
        .collect();
    project
        .rooms
        .iter()
        .filter(|r| !listed.contains(r.id.as_str()))
        .collect()
}

pub fn get_system<'a>(project: &'a Project, system_id: &str) -> AppResult<&'a System> {
    project
        .systems
        .iter()
        .find(|s| s.id == system_id)
        .ok_or_else(|| AppError::SystemNotFound(system_id.to_string()))
}

pub fn get_room<'a>(project: &'a Project, room_id: &str) -> AppResult<&'a Room> {
    project
        .rooms
        .iter()
        .find(|r| r.id == room_id)
        .ok_or_else(|| AppError::RoomNotFound(room_id.to_string()))
}

/// Write a new empty project. Refuses to overwrite an existing file.
pub fn init_project(path: &Path, name: &str) -> AppResult<Project> {
    if path.exists() {
        return Err(AppError::InvalidInput(format!(
            "{} already exists",
            path.display()
        )));
    }
    let project = Project::new(name);
    save_project(path, &project)?;
    Ok(project)
}

//! Schema migration framework.

use crate::ProjectError;
use crate::schema::Project;

pub const LATEST_VERSION: u32 = 1;

pub fn migrate_to_latest(mut project: Project) -> Result<Project, ProjectError> {
    while project.version < LATEST_VERSION {
        project = migrate_one_version(project)?;
    }
    Ok(project)
}

fn migrate_one_version(project: Project) -> Result<Project, ProjectError> {
    match project.version {
        0 => migrate_v0_to_v1(project),
        v => Err(ProjectError::Migration {
            what: format!("No migration path from version {}", v),
        }),
    }
}

/// Version 0 recorded membership only on `Room::system_id`. Systems with an
/// empty room list inherit their rooms from those back-references, in room
/// order.
fn migrate_v0_to_v1(mut project: Project) -> Result<Project, ProjectError> {
    for system in &mut project.systems {
        if !system.room_ids.is_empty() {
            continue;
        }
        system.room_ids = project
            .rooms
            .iter()
            .filter(|room| room.system_id.as_deref() == Some(system.id.as_str()))
            .map(|room| room.id.clone())
            .collect();
    }

    project.version = 1;
    Ok(project)
}

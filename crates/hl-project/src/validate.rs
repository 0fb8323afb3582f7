//! Project validation logic.
//!
//! Only structural problems that would make results ambiguous are rejected
//! here. Data inconsistencies the reference worksheets themselves tolerate
//! (orientation breakdowns that do not add up, rooms listed twice) are left
//! to the calculation engine, which reports them as warnings.

use crate::schema::{OutdoorAirRounding, Project, Room};
use std::collections::HashSet;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Empty ID in {context}")]
    EmptyId { context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    check_unique(project.rooms.iter().map(|r| r.id.as_str()), "rooms")?;
    check_unique(project.systems.iter().map(|s| s.id.as_str()), "systems")?;
    check_unique(
        project.design_conditions.iter().map(|d| d.id.as_str()),
        "design_conditions",
    )?;
    check_unique(
        project.room_loads.iter().map(|l| l.room_id.as_str()),
        "room_loads",
    )?;

    for room in &project.rooms {
        validate_room(room)?;
    }

    validate_outdoor_air_rounding(&project.metadata.rounding.outdoor_air)?;

    Ok(())
}

fn check_unique<'a>(
    ids: impl Iterator<Item = &'a str>,
    context: &str,
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for id in ids {
        if id.trim().is_empty() {
            return Err(ValidationError::EmptyId {
                context: context.to_string(),
            });
        }
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateId {
                id: id.to_string(),
                context: context.to_string(),
            });
        }
    }
    Ok(())
}

fn validate_room(room: &Room) -> Result<(), ValidationError> {
    if !room.area_m2.is_finite() || room.area_m2 < 0.0 {
        return Err(ValidationError::InvalidValue {
            field: format!("room '{}' area_m2", room.id),
            value: room.area_m2.to_string(),
            reason: "must be non-negative and finite".to_string(),
        });
    }

    if let Some(h) = room.ceiling_height_m
        && (!h.is_finite() || h <= 0.0)
    {
        return Err(ValidationError::InvalidValue {
            field: format!("room '{}' ceiling_height_m", room.id),
            value: h.to_string(),
            reason: "must be positive and finite".to_string(),
        });
    }

    Ok(())
}

fn validate_outdoor_air_rounding(rounding: &OutdoorAirRounding) -> Result<(), ValidationError> {
    if !rounding.step.is_finite() || rounding.step <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "metadata.rounding.outdoor_air.step".to_string(),
            value: rounding.step.to_string(),
            reason: "must be positive and finite".to_string(),
        });
    }
    Ok(())
}

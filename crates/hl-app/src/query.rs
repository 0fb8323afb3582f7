//! Query helpers over calculation results.

use hl_calc::{CalcResult, CellDef, EntityType, MajorCellRegistry, RoomLoadSummary, SystemLoadSummary, Trace};

use crate::error::{AppError, AppResult};

/// One line of the major cell verification table.
#[derive(Debug, Clone, PartialEq)]
pub struct CellRow {
    pub name: String,
    pub target: String,
    pub metric: String,
    pub value: Option<f64>,
}

/// Major cells of `result` in registry order, with what each one reads.
///
/// Values come from the stored result; cells the registry defines but the
/// result lacks (registry changed since the run) read as `None`.
pub fn major_cell_rows(result: &CalcResult, registry: &MajorCellRegistry) -> Vec<CellRow> {
    registry
        .to_def()
        .cells
        .into_iter()
        .map(|CellDef { name, target, metric, .. }| {
            let value = result.major_cells.get(&name);
            CellRow {
                name,
                target: target.to_string(),
                metric,
                value,
            }
        })
        .collect()
}

/// Parse `room:ID`, `system:ID` or `project[:ID]`.
pub fn parse_entity(input: &str) -> AppResult<(EntityType, Option<String>)> {
    let (kind, id) = match input.split_once(':') {
        Some((kind, id)) => (kind, Some(id.to_string())),
        None => (input, None),
    };
    let entity_type = match kind.trim().to_ascii_lowercase().as_str() {
        "room" => EntityType::Room,
        "system" => EntityType::System,
        "project" => EntityType::Project,
        other => {
            return Err(AppError::InvalidInput(format!(
                "unknown entity type '{other}' (expected room, system or project)"
            )));
        }
    };
    if entity_type != EntityType::Project && id.as_deref().is_none_or(str::is_empty) {
        return Err(AppError::InvalidInput(format!(
            "entity '{input}' needs an id, e.g. {entity_type}:ID"
        )));
    }
    Ok((entity_type, id))
}

/// Traces of one entity. For the project the id may be omitted.
pub fn traces_for<'a>(
    result: &'a CalcResult,
    entity_type: EntityType,
    id: Option<&str>,
) -> AppResult<Vec<&'a Trace>> {
    let traces: Vec<&Trace> = result
        .traces
        .iter()
        .filter(|t| t.entity_type == entity_type && id.is_none_or(|id| t.entity_id == id))
        .collect();
    if traces.is_empty() {
        return Err(AppError::EntityNotFound {
            entity_type: entity_type.to_string(),
            id: id.unwrap_or_default().to_string(),
        });
    }
    Ok(traces)
}

pub fn room_result<'a>(result: &'a CalcResult, room_id: &str) -> AppResult<&'a RoomLoadSummary> {
    result
        .room(room_id)
        .ok_or_else(|| AppError::RoomNotFound(room_id.to_string()))
}

pub fn system_result<'a>(
    result: &'a CalcResult,
    system_id: &str,
) -> AppResult<&'a SystemLoadSummary> {
    result
        .system(system_id)
        .ok_or_else(|| AppError::SystemNotFound(system_id.to_string()))
}

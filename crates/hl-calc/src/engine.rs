//! Calculation entry point.

use std::collections::{HashMap, HashSet};

use hl_project::{Project, RawRoomLoads, Room};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::cells::MajorCellRegistry;
use crate::correction::CorrectionFactors;
use crate::error::EngineResult;
use crate::project::aggregate_project;
use crate::result::{CalcReport, assemble_result};
use crate::room::{RoomAssembly, RoomLoadSummary, assemble_room};
use crate::rounding::RoundingPolicy;
use crate::system::{aggregate_systems, membership_warnings};
use crate::trace::{EntityType, TraceBuffer, TraceRecorder};
use crate::warning::{ConsistencyWarning, WarningCode};

/// Version recorded with every report and folded into run ids.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalcOptions {
    /// Assemble rooms on the rayon pool.
    pub parallel: bool,
}

impl Default for CalcOptions {
    fn default() -> Self {
        Self { parallel: true }
    }
}

/// Room stage output in room-list order.
#[derive(Debug, Clone, Default)]
pub struct RoomStage {
    pub summaries: Vec<RoomLoadSummary>,
    pub traces: Vec<TraceBuffer>,
    pub warnings: Vec<ConsistencyWarning>,
}

/// Run one calculation over a project snapshot.
///
/// Configuration errors and non-finite loads abort the run; no partial result
/// is returned. Data inconsistencies are collected into the report.
pub fn run_calculation(
    project: &Project,
    registry: &MajorCellRegistry,
    options: &CalcOptions,
) -> EngineResult<CalcReport> {
    info!(
        project = %project.id,
        rooms = project.rooms.len(),
        systems = project.systems.len(),
        parallel = options.parallel,
        "calculation started"
    );

    let factors = CorrectionFactors::from_def(&project.metadata.correction_factors)?;
    // Rounding is applied upstream; an invalid policy is still a configuration error.
    let rounding = RoundingPolicy::new(&project.metadata.rounding)?;
    debug!(?rounding, "rounding policy");

    let mut warnings = input_warnings(project, &factors);
    let loads = room_loads_in_order(project, &mut warnings);

    let assemblies = assemble_rooms(&project.rooms, &loads, &factors, options.parallel)?;
    let rooms = merge_room_work(assemblies);
    warnings.extend(rooms.warnings);

    warnings.extend(membership_warnings(&project.rooms, &project.systems));
    let systems = aggregate_systems(&rooms.summaries, &project.systems)?;
    warnings.extend(systems.warnings);

    let (totals, project_traces) = aggregate_project(&project.id, &systems.summaries)?;

    let mut recorder = TraceRecorder::new();
    recorder.absorb(
        rooms
            .traces
            .into_iter()
            .chain(systems.traces)
            .chain(std::iter::once(project_traces)),
    );

    for warning in &warnings {
        warn!(code = %warning.code, entity = %warning.entity_id, "{}", warning.message);
    }

    let result = assemble_result(
        registry,
        rooms.summaries,
        systems.summaries,
        totals,
        recorder.into_traces(),
    );
    info!(
        traces = result.traces.len(),
        warnings = warnings.len(),
        cooling_total = result.totals.cooling_total,
        heating_total = result.totals.heating_total,
        "calculation finished"
    );

    Ok(CalcReport {
        result,
        warnings,
        engine_version: ENGINE_VERSION.to_string(),
        registry_version: registry.version().to_string(),
    })
}

/// Assemble every room. `loads[i]` belongs to `rooms[i]`.
///
/// In parallel mode workers may finish in any order; the returned vector is
/// still in room-list order and the first failing room (by position) wins.
pub fn assemble_rooms(
    rooms: &[Room],
    loads: &[RawRoomLoads],
    factors: &CorrectionFactors,
    parallel: bool,
) -> EngineResult<Vec<RoomAssembly>> {
    if parallel {
        let results: Vec<EngineResult<RoomAssembly>> = rooms
            .par_iter()
            .zip(loads.par_iter())
            .enumerate()
            .map(|(index, (room, raw))| assemble_room(index, room, raw, factors))
            .collect();
        results.into_iter().collect()
    } else {
        rooms
            .iter()
            .zip(loads)
            .enumerate()
            .map(|(index, (room, raw))| assemble_room(index, room, raw, factors))
            .collect()
    }
}

/// Reduce room work, delivered in any order, back into room-list order.
pub fn merge_room_work(mut assemblies: Vec<RoomAssembly>) -> RoomStage {
    assemblies.sort_by_key(|a| a.index);
    let mut stage = RoomStage::default();
    for assembly in assemblies {
        stage.summaries.push(assembly.summary);
        stage.traces.push(assembly.traces);
        stage.warnings.extend(assembly.warnings);
    }
    stage
}

fn input_warnings(project: &Project, factors: &CorrectionFactors) -> Vec<ConsistencyWarning> {
    let mut warnings = Vec::new();

    if project.rooms.is_empty() {
        warnings.push(ConsistencyWarning::new(
            WarningCode::EmptyProject,
            EntityType::Project,
            project.id.as_str(),
            "project has no rooms; all totals are zero",
        ));
    }

    for field in factors.zero_fields() {
        warnings.push(ConsistencyWarning::new(
            WarningCode::ZeroCorrectionFactor,
            EntityType::Project,
            project.id.as_str(),
            format!("correction factor {field} is 0; that slot is suppressed in every room"),
        ));
    }

    let conditions: HashSet<&str> = project
        .design_conditions
        .iter()
        .map(|dc| dc.id.as_str())
        .collect();
    for room in &project.rooms {
        let missing = room
            .design_condition_id
            .as_deref()
            .filter(|dc| !conditions.contains(dc));
        if let Some(dc) = missing {
            warnings.push(ConsistencyWarning::new(
                WarningCode::DesignConditionNotFound,
                EntityType::Room,
                room.id.as_str(),
                format!("design condition '{dc}' is not defined"),
            ));
        }
    }

    warnings
}

/// Raw loads aligned with `project.rooms`. Rooms without loads get zeros.
fn room_loads_in_order(project: &Project, warnings: &mut Vec<ConsistencyWarning>) -> Vec<RawRoomLoads> {
    let by_room: HashMap<&str, &RawRoomLoads> = project
        .room_loads
        .iter()
        .map(|l| (l.room_id.as_str(), l))
        .collect();
    let room_ids: HashSet<&str> = project.rooms.iter().map(|r| r.id.as_str()).collect();

    for loads in &project.room_loads {
        if !room_ids.contains(loads.room_id.as_str()) {
            warnings.push(ConsistencyWarning::new(
                WarningCode::RoomLoadsOrphan,
                EntityType::Room,
                loads.room_id.as_str(),
                "loads supplied for a room that is not defined; ignored",
            ));
        }
    }

    project
        .rooms
        .iter()
        .map(|room| match by_room.get(room.id.as_str()) {
            Some(loads) => (*loads).clone(),
            None => {
                warnings.push(ConsistencyWarning::new(
                    WarningCode::RoomLoadsMissing,
                    EntityType::Room,
                    room.id.as_str(),
                    "no loads supplied; zeros used",
                ));
                RawRoomLoads {
                    room_id: room.id.clone(),
                    ..RawRoomLoads::default()
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hl_core::LoadVector;
    use hl_project::{CorrectionFactorsDef, DesignCondition, System};

    fn project() -> Project {
        let mut project = Project::new("engine");
        project.design_conditions.push(DesignCondition {
            id: "dc".to_string(),
            name: "office".to_string(),
            indoor_cooling_c: Some(26.0),
            indoor_rh_pct: Some(50.0),
            indoor_heating_c: Some(22.0),
        });
        for (i, id) in ["r1", "r2", "r3"].into_iter().enumerate() {
            project.rooms.push(Room {
                id: id.to_string(),
                name: id.to_string(),
                floor: None,
                area_m2: 10.0,
                ceiling_height_m: None,
                design_condition_id: Some("dc".to_string()),
                system_id: None,
            });
            project.room_loads.push(RawRoomLoads {
                room_id: id.to_string(),
                envelope_loads: LoadVector::splat(100.0 * (i + 1) as f64),
                ..RawRoomLoads::default()
            });
        }
        project.systems.push(System {
            id: "s1".to_string(),
            name: "AHU-1".to_string(),
            room_ids: vec!["r1".to_string(), "r2".to_string()],
        });
        project
    }

    #[test]
    fn traces_follow_canonical_order() {
        let report = run_calculation(&project(), &MajorCellRegistry::standard(), &CalcOptions::default())
            .unwrap();
        let entities: Vec<(EntityType, &str)> = report
            .result
            .traces
            .iter()
            .map(|t| (t.entity_type, t.entity_id.as_str()))
            .collect();
        assert_eq!(entities.len(), 3 * 3 + 2 * 2 + 1);
        assert_eq!(entities[0], (EntityType::Room, "r1"));
        assert_eq!(entities[3], (EntityType::Room, "r2"));
        assert_eq!(entities[6], (EntityType::Room, "r3"));
        assert_eq!(entities[9], (EntityType::System, "s1"));
        assert_eq!(entities[11], (EntityType::System, "__unassigned__"));
        assert_eq!(entities[13].0, EntityType::Project);
    }

    #[test]
    fn reversed_room_completion_merges_identically() {
        let project = project();
        let factors = CorrectionFactors::IDENTITY;
        let loads = project.room_loads.clone();
        let forward = assemble_rooms(&project.rooms, &loads, &factors, false).unwrap();
        let mut reversed = forward.clone();
        reversed.reverse();

        let a = merge_room_work(forward);
        let b = merge_room_work(reversed);
        assert_eq!(a.summaries, b.summaries);
        let ta: Vec<_> = a.traces.iter().flat_map(|t| t.traces().to_vec()).collect();
        let tb: Vec<_> = b.traces.iter().flat_map(|t| t.traces().to_vec()).collect();
        assert_eq!(ta, tb);
    }

    #[test]
    fn missing_and_orphan_loads_warn() {
        let mut project = project();
        project.room_loads.retain(|l| l.room_id != "r2");
        project.room_loads.push(RawRoomLoads {
            room_id: "ghost".to_string(),
            ..RawRoomLoads::default()
        });
        let report = run_calculation(&project, &MajorCellRegistry::standard(), &CalcOptions::default())
            .unwrap();
        let codes: Vec<WarningCode> = report.warnings.iter().map(|w| w.code).collect();
        assert!(codes.contains(&WarningCode::RoomLoadsOrphan));
        assert!(codes.contains(&WarningCode::RoomLoadsMissing));
        assert_eq!(
            report.result.room("r2").unwrap().post_correction,
            LoadVector::ZERO
        );
    }

    #[test]
    fn zero_factor_and_unknown_design_condition_warn() {
        let mut project = project();
        project.metadata.correction_factors = CorrectionFactorsDef {
            heat_latent: Some(0.0),
            ..CorrectionFactorsDef::default()
        };
        project.rooms[0].design_condition_id = Some("nowhere".to_string());
        let report = run_calculation(&project, &MajorCellRegistry::standard(), &CalcOptions::default())
            .unwrap();
        let codes: Vec<WarningCode> = report.warnings.iter().map(|w| w.code).collect();
        assert!(codes.contains(&WarningCode::ZeroCorrectionFactor));
        assert!(codes.contains(&WarningCode::DesignConditionNotFound));
    }

    #[test]
    fn invalid_rounding_step_aborts() {
        let mut project = project();
        project.metadata.rounding.outdoor_air.step = -1.0;
        let err = run_calculation(&project, &MajorCellRegistry::standard(), &CalcOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("outdoor_air.step"));
    }
}

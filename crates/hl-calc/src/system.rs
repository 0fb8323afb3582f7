//! System aggregation.
//!
//! A system's figures come from the elementwise sum of its rooms'
//! post-correction vectors; the worst cooling hour is selected after summing.
//! Rooms peaking at different hours therefore do not add their individual
//! maxima.

use std::collections::{BTreeMap, HashMap};

use hl_core::{CoolingHour, LoadVector};
use hl_project::{Room, System};
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::room::{RoomLoadSummary, hour_map};
use crate::totals::FinalTotals;
use crate::trace::{EntityType, TraceBuffer, TraceBuilder};
use crate::warning::{ConsistencyWarning, WarningCode};

/// Id and name of the pseudo-system holding rooms no system lists.
pub const UNASSIGNED_SYSTEM_ID: &str = "__unassigned__";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemLoadSummary {
    pub system_id: String,
    pub system_name: String,
    /// Member rooms in listing order. Repeats are kept and counted again.
    pub room_ids: Vec<String>,
    pub post_correction: LoadVector,
    pub peak_hour: CoolingHour,
    pub totals: FinalTotals,
}

impl SystemLoadSummary {
    pub fn is_unassigned(&self) -> bool {
        self.system_id == UNASSIGNED_SYSTEM_ID
    }
}

#[derive(Debug, Clone, Default)]
pub struct SystemAggregation {
    pub summaries: Vec<SystemLoadSummary>,
    pub traces: Vec<TraceBuffer>,
    pub warnings: Vec<ConsistencyWarning>,
}

/// One summary per system in list order, then the unassigned pseudo-system
/// when at least one room is listed by no system.
///
/// Caller contract: a room should be listed by at most one system. Violations
/// are not deduplicated; the room is summed wherever it is listed and a
/// `room_in_multiple_systems` warning is raised.
pub fn aggregate_systems(
    rooms: &[RoomLoadSummary],
    systems: &[System],
) -> EngineResult<SystemAggregation> {
    let by_id: HashMap<&str, &RoomLoadSummary> =
        rooms.iter().map(|r| (r.room_id.as_str(), r)).collect();

    let mut out = SystemAggregation::default();
    let mut listings: HashMap<&str, usize> = HashMap::new();

    for (index, system) in systems.iter().enumerate() {
        let mut members = Vec::with_capacity(system.room_ids.len());
        for room_id in &system.room_ids {
            match by_id.get(room_id.as_str()) {
                Some(room) => {
                    *listings.entry(room.room_id.as_str()).or_default() += 1;
                    members.push(*room);
                }
                None => out.warnings.push(ConsistencyWarning::new(
                    WarningCode::SystemRoomNotFound,
                    EntityType::System,
                    system.id.as_str(),
                    format!("room '{room_id}' is not defined in the project; skipped"),
                )),
            }
        }
        let (summary, traces) = summarize(index, &system.id, &system.name, &members)?;
        out.summaries.push(summary);
        out.traces.push(traces);
    }

    for room in rooms {
        let count = listings.get(room.room_id.as_str()).copied().unwrap_or(0);
        if count > 1 {
            out.warnings.push(ConsistencyWarning::new(
                WarningCode::RoomInMultipleSystems,
                EntityType::Room,
                room.room_id.as_str(),
                format!("listed {count} times across systems; counted in each"),
            ));
        }
    }

    let unassigned: Vec<&RoomLoadSummary> = rooms
        .iter()
        .filter(|r| !listings.contains_key(r.room_id.as_str()))
        .collect();
    if !unassigned.is_empty() {
        let (summary, traces) = summarize(
            systems.len(),
            UNASSIGNED_SYSTEM_ID,
            UNASSIGNED_SYSTEM_ID,
            &unassigned,
        )?;
        out.summaries.push(summary);
        out.traces.push(traces);
    }

    Ok(out)
}

fn summarize(
    index: usize,
    system_id: &str,
    system_name: &str,
    members: &[&RoomLoadSummary],
) -> EngineResult<(SystemLoadSummary, TraceBuffer)> {
    let mut traces = TraceBuffer::new(EntityType::System, index, system_id);

    let post_correction: LoadVector = members.iter().map(|r| r.post_correction).sum();
    let room_inputs: Vec<BTreeMap<&str, serde_json::Value>> = members
        .iter()
        .map(|r| {
            BTreeMap::from([
                ("room_id", serde_json::Value::from(r.room_id.as_str())),
                (
                    "post_correction",
                    serde_json::to_value(r.post_correction).unwrap_or_default(),
                ),
            ])
        })
        .collect();
    traces.record(
        TraceBuilder::new("system.sum_post_correction")
            .input("rooms", room_inputs)
            .reference("system_id", system_id),
        post_correction,
    );

    let (peak_hour, totals) = FinalTotals::from_post_correction(&post_correction);
    totals.ensure_finite(EntityType::System, system_id)?;
    traces.record(
        TraceBuilder::new("system.final_totals")
            .input("post_correction", post_correction)
            .intermediate("peak_hour", peak_hour)
            .intermediate("cooling_hours", hour_map(&post_correction)),
        totals,
    );

    let summary = SystemLoadSummary {
        system_id: system_id.to_string(),
        system_name: system_name.to_string(),
        room_ids: members.iter().map(|r| r.room_id.clone()).collect(),
        post_correction,
        peak_hour,
        totals,
    };
    Ok((summary, traces))
}

/// Cross-check each room's informational `system_id` against system listings.
pub fn membership_warnings(rooms: &[Room], systems: &[System]) -> Vec<ConsistencyWarning> {
    let by_id: HashMap<&str, &System> = systems.iter().map(|s| (s.id.as_str(), s)).collect();
    let mut warnings = Vec::new();
    for room in rooms {
        let Some(system_id) = room.system_id.as_deref() else {
            continue;
        };
        match by_id.get(system_id) {
            None => warnings.push(ConsistencyWarning::new(
                WarningCode::RoomSystemNotFound,
                EntityType::Room,
                room.id.as_str(),
                format!("system_id '{system_id}' does not name a system"),
            )),
            Some(system) if !system.room_ids.contains(&room.id) => {
                warnings.push(ConsistencyWarning::new(
                    WarningCode::RoomSystemMismatch,
                    EntityType::Room,
                    room.id.as_str(),
                    format!(
                        "system_id is '{system_id}' but that system does not list the room; system listings decide membership"
                    ),
                ))
            }
            Some(_) => {}
        }
    }
    warnings
}



#[cfg(test)]
mod proptests {
    use super::fixtures::{summary, system};
    use super::*;
    use proptest::prelude::*;

    fn vector() -> impl Strategy<Value = LoadVector> {
        // Integer-valued loads keep the sum exact in either order.
        prop::array::uniform7(-100_000i32..100_000i32)
            .prop_map(|a| LoadVector::from_fn(|f| f64::from(a[f as usize])))
    }

    proptest! {
        #[test]
        fn system_sum_is_order_independent(a in vector(), b in vector()) {
            let rooms = [summary("A", a), summary("B", b)];
            let ab = aggregate_systems(&rooms, &[system("S", &["A", "B"])]).unwrap();
            let ba = aggregate_systems(&rooms, &[system("S", &["B", "A"])]).unwrap();
            prop_assert_eq!(ab.summaries[0].totals, ba.summaries[0].totals);
            prop_assert_eq!(ab.summaries[0].peak_hour, ba.summaries[0].peak_hour);
        }
    }
}

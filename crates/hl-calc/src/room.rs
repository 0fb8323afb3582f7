//! Room load assembly: raw loads -> pre-correction -> post-correction -> final totals.

use std::collections::BTreeMap;

use hl_core::{CoolingHour, LoadVector, Real, Tolerances};
use hl_project::{InternalLoadKind, RawRoomLoads, Room};
use serde::{Deserialize, Serialize};

use crate::correction::{self, CorrectionFactors};
use crate::error::{CalcError, EngineResult};
use crate::totals::FinalTotals;
use crate::trace::{EntityType, TraceBuffer, TraceBuilder};
use crate::warning::{ConsistencyWarning, WarningCode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomLoadSummary {
    pub room_id: String,
    pub room_name: String,
    pub area_m2: Real,
    pub envelope_loads: LoadVector,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub envelope_loads_by_orientation: BTreeMap<String, LoadVector>,
    pub internal_loads: LoadVector,
    pub ventilation_loads: LoadVector,
    pub pre_correction: LoadVector,
    pub post_correction: LoadVector,
    pub peak_hour: CoolingHour,
    pub final_totals: FinalTotals,
}

/// Output of [`assemble_room`]: the summary plus what was recorded on the way.
#[derive(Debug, Clone)]
pub struct RoomAssembly {
    /// Position of the room in the project's room list.
    pub index: usize,
    pub summary: RoomLoadSummary,
    pub traces: TraceBuffer,
    pub warnings: Vec<ConsistencyWarning>,
}

/// Assemble one room.
///
/// Depends only on its arguments, so rooms can be assembled in any order or
/// in parallel. `index` keys the trace buffer for the canonical merge.
pub fn assemble_room(
    index: usize,
    room: &Room,
    raw: &RawRoomLoads,
    factors: &CorrectionFactors,
) -> EngineResult<RoomAssembly> {
    check_finite(&room.id, "envelope_loads", &raw.envelope_loads)?;
    for (orientation, vector) in &raw.envelope_loads_by_orientation {
        check_finite(
            &room.id,
            &format!("envelope_loads_by_orientation.{orientation}"),
            vector,
        )?;
    }
    check_finite(&room.id, "internal_loads", &raw.internal_loads)?;
    for item in &raw.internal_breakdown {
        check_finite(&room.id, &format!("internal_breakdown.{}", item.id), &item.load)?;
    }
    check_finite(&room.id, "ventilation_loads", &raw.ventilation_loads)?;

    let mut warnings = Vec::new();
    let mut traces = TraceBuffer::new(EntityType::Room, index, room.id.as_str());

    // The authoritative total is `envelope_loads`; the breakdown is audit-only.
    let orientation_sum: LoadVector = raw.envelope_loads_by_orientation.values().sum();
    if !raw.envelope_loads_by_orientation.is_empty() {
        if let Some(field) = raw
            .envelope_loads
            .first_mismatch(&orientation_sum, Tolerances::consistency())
        {
            warnings.push(ConsistencyWarning::new(
                WarningCode::OrientationSumMismatch,
                EntityType::Room,
                room.id.as_str(),
                format!(
                    "orientation breakdown sums to {} but envelope_loads.{field} is {}",
                    orientation_sum.get(field),
                    raw.envelope_loads.get(field)
                ),
            ));
        }
    }

    let by_kind = internal_by_kind(raw);
    if !raw.internal_breakdown.is_empty() {
        let breakdown_sum: LoadVector = by_kind.values().sum();
        if let Some(field) = raw
            .internal_loads
            .first_mismatch(&breakdown_sum, Tolerances::consistency())
        {
            warnings.push(ConsistencyWarning::new(
                WarningCode::InternalBreakdownMismatch,
                EntityType::Room,
                room.id.as_str(),
                format!(
                    "internal breakdown sums to {} but internal_loads.{field} is {}",
                    breakdown_sum.get(field),
                    raw.internal_loads.get(field)
                ),
            ));
        }
    }

    let pre_correction = raw.envelope_loads + raw.internal_loads + raw.ventilation_loads;
    let mut pre_trace = TraceBuilder::new("room.pre_correction")
        .input("envelope_loads", raw.envelope_loads)
        .input("internal_loads", raw.internal_loads)
        .input("ventilation_loads", raw.ventilation_loads)
        .reference("room_id", &room.id);
    if let Some(dc) = &room.design_condition_id {
        pre_trace = pre_trace.reference("design_condition_id", dc);
    }
    if !raw.envelope_loads_by_orientation.is_empty() {
        pre_trace = pre_trace.intermediate(
            "envelope_by_orientation",
            &raw.envelope_loads_by_orientation,
        );
    }
    if !by_kind.is_empty() {
        pre_trace = pre_trace.intermediate("internal_by_kind", &by_kind);
    }
    traces.record(pre_trace, pre_correction);

    let post_correction = correction::apply(&pre_correction, factors);
    check_finite(&room.id, "post_correction", &post_correction)?;
    traces.record(
        TraceBuilder::new("room.post_correction")
            .input("pre_correction", pre_correction)
            .input("correction_factors", factors),
        post_correction,
    );

    let (peak_hour, final_totals) = FinalTotals::from_post_correction(&post_correction);
    final_totals.ensure_finite(EntityType::Room, &room.id)?;
    traces.record(
        TraceBuilder::new("room.final_totals")
            .input("post_correction", post_correction)
            .intermediate("peak_hour", peak_hour)
            .intermediate("cooling_hours", hour_map(&post_correction)),
        final_totals,
    );

    Ok(RoomAssembly {
        index,
        summary: RoomLoadSummary {
            room_id: room.id.clone(),
            room_name: room.name.clone(),
            area_m2: room.area_m2,
            envelope_loads: raw.envelope_loads,
            envelope_loads_by_orientation: raw.envelope_loads_by_orientation.clone(),
            internal_loads: raw.internal_loads,
            ventilation_loads: raw.ventilation_loads,
            pre_correction,
            post_correction,
            peak_hour,
            final_totals,
        },
        traces,
        warnings,
    })
}

/// Sensible cooling per hour, keyed by slot name, for peak-selection traces.
pub(crate) fn hour_map(vector: &LoadVector) -> BTreeMap<&'static str, Real> {
    vector
        .cooling_hours()
        .into_iter()
        .map(|(hour, value)| (hour.field().name(), value))
        .collect()
}

fn check_finite(room_id: &str, stage: &str, vector: &LoadVector) -> EngineResult<()> {
    match vector.first_non_finite() {
        Some((field, value)) => Err(CalcError::NonFiniteLoad {
            room_id: room_id.to_string(),
            stage: stage.to_string(),
            field,
            value,
        }),
        None => Ok(()),
    }
}

/// Group the internal breakdown of `raw` by kind.
pub fn internal_by_kind(raw: &RawRoomLoads) -> BTreeMap<InternalLoadKind, LoadVector> {
    let mut by_kind = BTreeMap::new();
    for item in &raw.internal_breakdown {
        *by_kind.entry(item.kind).or_insert(LoadVector::ZERO) += item.load;
    }
    by_kind
}

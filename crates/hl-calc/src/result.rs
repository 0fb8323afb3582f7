//! The calculation output document.

use serde::{Deserialize, Serialize};

use crate::cells::{CellSource, MajorCellRegistry, MajorCells};
use crate::room::RoomLoadSummary;
use crate::system::SystemLoadSummary;
use crate::totals::FinalTotals;
use crate::trace::{EntityType, Trace};
use crate::warning::ConsistencyWarning;

/// Field names here are a wire contract for report and UI consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalcResult {
    pub major_cells: MajorCells,
    pub totals: FinalTotals,
    pub room_results: Vec<RoomLoadSummary>,
    pub system_results: Vec<SystemLoadSummary>,
    pub traces: Vec<Trace>,
}

impl CalcResult {
    pub fn cell_source(&self) -> CellSource<'_> {
        CellSource {
            rooms: &self.room_results,
            systems: &self.system_results,
            totals: &self.totals,
        }
    }

    pub fn room(&self, room_id: &str) -> Option<&RoomLoadSummary> {
        self.room_results.iter().find(|r| r.room_id == room_id)
    }

    pub fn system(&self, system_id: &str) -> Option<&SystemLoadSummary> {
        self.system_results.iter().find(|s| s.system_id == system_id)
    }

    /// Traces recorded for one entity, in recording order.
    pub fn traces_for<'a>(
        &'a self,
        entity_type: EntityType,
        entity_id: &'a str,
    ) -> impl Iterator<Item = &'a Trace> + 'a {
        self.traces
            .iter()
            .filter(move |t| t.entity_type == entity_type && t.entity_id == entity_id)
    }
}

/// A result together with the non-fatal findings of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalcReport {
    pub result: CalcResult,
    #[serde(default)]
    pub warnings: Vec<ConsistencyWarning>,
    pub engine_version: String,
    pub registry_version: String,
}

/// Compose the output document and resolve the registry's cells against it.
pub fn assemble_result(
    registry: &MajorCellRegistry,
    room_results: Vec<RoomLoadSummary>,
    system_results: Vec<SystemLoadSummary>,
    totals: FinalTotals,
    traces: Vec<Trace>,
) -> CalcResult {
    let mut result = CalcResult {
        major_cells: MajorCells::default(),
        totals,
        room_results,
        system_results,
        traces,
    };
    result.major_cells = registry.resolve_all(result.cell_source());
    result
}

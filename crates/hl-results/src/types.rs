//! Stored run metadata.

use serde::{Deserialize, Serialize};

pub type RunId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub project_id: String,
    pub project_name: String,
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub engine_version: String,
    pub registry_version: String,
    /// SHA-256 of the serialized result document.
    pub fingerprint: String,
    pub summary: RunSummary,
}

/// Headline figures, readable without loading the full result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub room_count: usize,
    pub system_count: usize,
    pub warning_count: usize,
    pub trace_count: usize,
    pub cooling_total_w: f64,
    pub heating_total_w: f64,
}

impl RunSummary {
    pub fn from_report(report: &hl_calc::CalcReport) -> Self {
        Self {
            room_count: report.result.room_results.len(),
            system_count: report.result.system_results.len(),
            warning_count: report.warnings.len(),
            trace_count: report.result.traces.len(),
            cooling_total_w: report.result.totals.cooling_total,
            heating_total_w: report.result.totals.heating_total,
        }
    }
}

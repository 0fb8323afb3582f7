//! hl-calc: load aggregation, correction and audit-trace engine.
//!
//! Pipeline, leaf first:
//! - correction / rounding policies
//! - room assembly (raw loads -> pre/post correction -> final totals)
//! - system aggregation (sum, then pick the worst hour)
//! - project totals
//! - trace recording and the major cell table

pub mod cells;
pub mod correction;
pub mod engine;
pub mod error;
pub mod project;
pub mod result;
pub mod room;
pub mod rounding;
pub mod system;
pub mod totals;
pub mod trace;
pub mod warning;

pub use cells::{
    CellDef, CellMetric, CellRounding, CellSource, CellTarget, LoadStage, MajorCellRegistry,
    MajorCells, RegistryDef, STANDARD_REGISTRY_VERSION,
};
pub use correction::CorrectionFactors;
pub use engine::{
    CalcOptions, ENGINE_VERSION, RoomStage, assemble_rooms, merge_room_work, run_calculation,
};
pub use error::{CalcError, ConfigError, EngineResult};
pub use project::aggregate_project;
pub use result::{CalcReport, CalcResult, assemble_result};
pub use room::{RoomAssembly, RoomLoadSummary, assemble_room};
pub use rounding::RoundingPolicy;
pub use system::{
    SystemAggregation, SystemLoadSummary, UNASSIGNED_SYSTEM_ID, aggregate_systems,
    membership_warnings,
};
pub use totals::{FinalTotals, TotalsMetric};
pub use trace::{EntityType, Trace, TraceBuffer, TraceBuilder, TraceRecorder};
pub use warning::{ConsistencyWarning, WarningCode};

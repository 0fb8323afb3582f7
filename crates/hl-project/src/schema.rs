//! Project schema definitions.

use std::collections::BTreeMap;

use hl_core::LoadVector;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    /// Documents written before versioning was introduced deserialize as 0.
    #[serde(default)]
    pub version: u32,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub metadata: ProjectMetadata,
    #[serde(default)]
    pub design_conditions: Vec<DesignCondition>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub systems: Vec<System>,
    /// Per-room loads produced by the envelope/internal/ventilation calculators.
    #[serde(default)]
    pub room_loads: Vec<RawRoomLoads>,
}

impl Project {
    /// Empty project at the latest schema version with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: crate::migrate::LATEST_VERSION,
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            metadata: ProjectMetadata::default(),
            design_conditions: Vec::new(),
            rooms: Vec::new(),
            systems: Vec::new(),
            room_loads: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProjectMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub correction_factors: CorrectionFactorsDef,
    #[serde(default)]
    pub rounding: RoundingSettings,
}

/// Intermittent-operation correction multipliers as written in the document.
///
/// When the whole block is absent every factor defaults to 1.0. When the block
/// is present, every field must be spelled out; the engine rejects a partial
/// table instead of guessing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CorrectionFactorsDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cool_9: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cool_12: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cool_14: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cool_16: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cool_latent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heat_sensible: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heat_latent: Option<f64>,
}

impl CorrectionFactorsDef {
    /// Same factor for every slot.
    pub fn uniform(value: f64) -> Self {
        Self {
            cool_9: Some(value),
            cool_12: Some(value),
            cool_14: Some(value),
            cool_16: Some(value),
            cool_latent: Some(value),
            heat_sensible: Some(value),
            heat_latent: Some(value),
        }
    }
}

impl Default for CorrectionFactorsDef {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Nearest integer, halves away from zero.
    #[default]
    #[serde(alias = "round", alias = "half_up")]
    Nearest,
    /// Always up.
    #[serde(alias = "ceil")]
    Ceiling,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RoundingSettings {
    #[serde(default)]
    pub occupancy: OccupancyRounding,
    #[serde(default)]
    pub outdoor_air: OutdoorAirRounding,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OccupancyRounding {
    #[serde(default)]
    pub mode: RoundingMode,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutdoorAirRounding {
    #[serde(default)]
    pub mode: RoundingMode,
    /// Quantum in m³/h, e.g. 10.0 rounds to tens.
    #[serde(default = "default_outdoor_air_step")]
    pub step: f64,
}

impl Default for OutdoorAirRounding {
    fn default() -> Self {
        Self {
            mode: RoundingMode::Nearest,
            step: default_outdoor_air_step(),
        }
    }
}

fn default_outdoor_air_step() -> f64 {
    1.0
}

/// Indoor design state a room is calculated against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DesignCondition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indoor_cooling_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indoor_rh_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indoor_heating_c: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Room {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    pub area_m2: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ceiling_height_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_condition_id: Option<String>,
    /// Informational back-reference; membership is decided by `System::room_ids`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_id: Option<String>,
}

/// An air-handling system and the rooms it serves, in report order.
///
/// A room id should appear in at most one system. The data-entry layer owns
/// that rule; aggregation sums whatever is listed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct System {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub room_ids: Vec<String>,
}

/// Upstream-computed loads for one room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RawRoomLoads {
    pub room_id: String,
    /// Sum over every surface and opening of the room.
    #[serde(default)]
    pub envelope_loads: LoadVector,
    /// Audit breakdown of `envelope_loads` by orientation label (N, NE, ..., H).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub envelope_loads_by_orientation: BTreeMap<String, LoadVector>,
    #[serde(default)]
    pub internal_loads: LoadVector,
    /// Audit breakdown of `internal_loads` by source.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub internal_breakdown: Vec<InternalLoadItem>,
    #[serde(default)]
    pub ventilation_loads: LoadVector,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InternalLoadItem {
    pub id: String,
    pub kind: InternalLoadKind,
    #[serde(default)]
    pub load: LoadVector,
}

/// Source of an internal load. Unknown kinds are rejected at parse time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum InternalLoadKind {
    Lighting,
    Occupancy,
    Equipment,
    InternalEnvelope,
    InternalSolar,
    Other,
}

impl InternalLoadKind {
    pub const fn name(self) -> &'static str {
        match self {
            InternalLoadKind::Lighting => "lighting",
            InternalLoadKind::Occupancy => "occupancy",
            InternalLoadKind::Equipment => "equipment",
            InternalLoadKind::InternalEnvelope => "internal_envelope",
            InternalLoadKind::InternalSolar => "internal_solar",
            InternalLoadKind::Other => "other",
        }
    }
}

//! Non-fatal data consistency findings, returned alongside the result.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::trace::EntityType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningCode {
    /// Orientation breakdown does not add up to the room's envelope total.
    OrientationSumMismatch,
    /// Internal load items do not add up to the room's internal total.
    InternalBreakdownMismatch,
    /// A system lists a room id that is not in the project.
    SystemRoomNotFound,
    /// A room is listed more than once across systems and is counted each time.
    RoomInMultipleSystems,
    /// A room's `system_id` disagrees with the system room lists.
    RoomSystemMismatch,
    /// A room's `system_id` names a system that does not exist.
    RoomSystemNotFound,
    DesignConditionNotFound,
    /// No upstream loads were supplied for a room; zeros were used.
    RoomLoadsMissing,
    /// Upstream loads were supplied for a room that does not exist.
    RoomLoadsOrphan,
    /// A correction factor of exactly zero suppresses a slot entirely.
    ZeroCorrectionFactor,
    EmptyProject,
}

impl WarningCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            WarningCode::OrientationSumMismatch => "orientation_sum_mismatch",
            WarningCode::InternalBreakdownMismatch => "internal_breakdown_mismatch",
            WarningCode::SystemRoomNotFound => "system_room_not_found",
            WarningCode::RoomInMultipleSystems => "room_in_multiple_systems",
            WarningCode::RoomSystemMismatch => "room_system_mismatch",
            WarningCode::RoomSystemNotFound => "room_system_not_found",
            WarningCode::DesignConditionNotFound => "design_condition_not_found",
            WarningCode::RoomLoadsMissing => "room_loads_missing",
            WarningCode::RoomLoadsOrphan => "room_loads_orphan",
            WarningCode::ZeroCorrectionFactor => "zero_correction_factor",
            WarningCode::EmptyProject => "empty_project",
        }
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyWarning {
    pub code: WarningCode,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub message: String,
}

impl ConsistencyWarning {
    pub fn new(
        code: WarningCode,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            entity_type,
            entity_id: entity_id.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConsistencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} '{}': {}",
            self.code, self.entity_type, self.entity_id, self.message
        )
    }
}

//! Engine error types.

use hl_core::LoadField;

use crate::totals::TotalsMetric;
use crate::trace::EntityType;

/// Configuration problems. Any of these aborts the whole run; the messages
/// name the setting or cell so the project maintainer can fix it directly.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error(
        "metadata.correction_factors.{field} is missing; every factor must be given explicitly (use 1.0 for no correction)"
    )]
    MissingCorrectionFactor { field: LoadField },

    #[error(
        "metadata.correction_factors.{field} = {value} is invalid: must be finite and non-negative"
    )]
    InvalidCorrectionFactor { field: LoadField, value: f64 },

    #[error("metadata.rounding.{setting} = {value} is invalid: {reason}")]
    InvalidRounding {
        setting: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("Major cell '{cell}' references unknown metric '{metric}'")]
    UnknownCellMetric { cell: String, metric: String },

    #[error("Major cell '{cell}': metric '{metric}' is not available for {target}")]
    MetricNotApplicable {
        cell: String,
        metric: String,
        target: String,
    },

    #[error("Major cell '{cell}': invalid target ({reason})")]
    InvalidCellTarget { cell: String, reason: String },

    #[error("Major cell '{cell}' is defined more than once")]
    DuplicateCell { cell: String },

    #[error("Failed to parse major cell registry: {message}")]
    RegistryParse { message: String },
}

#[derive(thiserror::Error, Debug)]
pub enum CalcError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Non-finite load in room '{room_id}' ({stage}.{field}): {value}")]
    NonFiniteLoad {
        room_id: String,
        stage: String,
        field: LoadField,
        value: f64,
    },

    #[error("Non-finite {metric} for {entity_type} '{entity_id}': {value}")]
    NonFiniteTotal {
        entity_type: EntityType,
        entity_id: String,
        metric: TotalsMetric,
        value: f64,
    },
}

pub type EngineResult<T> = Result<T, CalcError>;

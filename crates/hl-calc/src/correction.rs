//! Intermittent-operation correction.

use hl_core::{LoadField, LoadVector, Real};
use hl_project::CorrectionFactorsDef;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A fully specified, validated set of per-slot multipliers.
///
/// Factors are finite and non-negative. Zero is accepted (the slot is fully
/// suppressed) but reported by [`CorrectionFactors::zero_fields`] so callers
/// can flag it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrectionFactors(LoadVector);

impl CorrectionFactors {
    /// No correction: every factor 1.0.
    pub const IDENTITY: CorrectionFactors = CorrectionFactors(LoadVector::splat(1.0));

    /// Resolve the document's table, field by field.
    pub fn from_def(def: &CorrectionFactorsDef) -> Result<Self, ConfigError> {
        let mut factors = LoadVector::ZERO;
        for field in LoadField::ALL {
            let value =
                def_value(def, field).ok_or(ConfigError::MissingCorrectionFactor { field })?;
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidCorrectionFactor { field, value });
            }
            factors = factors.with(field, value);
        }
        Ok(Self(factors))
    }

    pub fn get(&self, field: LoadField) -> Real {
        self.0.get(field)
    }

    pub fn as_vector(&self) -> &LoadVector {
        &self.0
    }

    pub fn zero_fields(&self) -> Vec<LoadField> {
        self.0
            .iter()
            .filter(|(_, v)| *v == 0.0)
            .map(|(f, _)| f)
            .collect()
    }
}

impl Default for CorrectionFactors {
    fn default() -> Self {
        Self::IDENTITY
    }
}

fn def_value(def: &CorrectionFactorsDef, field: LoadField) -> Option<Real> {
    match field {
        LoadField::Cool9 => def.cool_9,
        LoadField::Cool12 => def.cool_12,
        LoadField::Cool14 => def.cool_14,
        LoadField::Cool16 => def.cool_16,
        LoadField::CoolLatent => def.cool_latent,
        LoadField::HeatSensible => def.heat_sensible,
        LoadField::HeatLatent => def.heat_latent,
    }
}

/// Multiply each slot of `vector` by the factor of the same name.
///
/// Matching is by [`LoadField`], never by position. A missing factor cannot
/// reach this point: [`CorrectionFactors::from_def`] rejects incomplete tables.
pub fn apply(vector: &LoadVector, factors: &CorrectionFactors) -> LoadVector {
    LoadVector::from_fn(|field| vector.get(field) * factors.get(field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_is_identity() {
        let factors = CorrectionFactors::from_def(&CorrectionFactorsDef::default()).unwrap();
        assert_eq!(factors, CorrectionFactors::IDENTITY);
        let v = LoadVector::splat(123.0);
        assert_eq!(apply(&v, &factors), v);
    }

    #[test]
    fn missing_field_names_the_field() {
        let def = CorrectionFactorsDef {
            heat_latent: None,
            ..CorrectionFactorsDef::default()
        };
        let err = CorrectionFactors::from_def(&def).unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingCorrectionFactor {
                field: LoadField::HeatLatent
            }
        );
        assert!(err.to_string().contains("correction_factors.heat_latent"));
    }

    #[test]
    fn negative_or_nan_factor_is_rejected() {
        let def = CorrectionFactorsDef {
            cool_14: Some(-0.5),
            ..CorrectionFactorsDef::default()
        };
        assert!(matches!(
            CorrectionFactors::from_def(&def),
            Err(ConfigError::InvalidCorrectionFactor {
                field: LoadField::Cool14,
                ..
            })
        ));

        let def = CorrectionFactorsDef {
            cool_latent: Some(f64::NAN),
            ..CorrectionFactorsDef::default()
        };
        assert!(CorrectionFactors::from_def(&def).is_err());
    }

    #[test]
    fn zero_factor_is_allowed_but_reported() {
        let def = CorrectionFactorsDef {
            heat_latent: Some(0.0),
            ..CorrectionFactorsDef::default()
        };
        let factors = CorrectionFactors::from_def(&def).unwrap();
        assert_eq!(factors.zero_fields(), vec![LoadField::HeatLatent]);
        let corrected = apply(&LoadVector::splat(10.0), &factors);
        assert_eq!(corrected.heat_latent, 0.0);
        assert_eq!(corrected.heat_sensible, 10.0);
    }

    #[test]
    fn factors_are_matched_by_name() {
        let def = CorrectionFactorsDef {
            cool_9: Some(1.0),
            cool_12: Some(2.0),
            cool_14: Some(3.0),
            cool_16: Some(4.0),
            cool_latent: Some(5.0),
            heat_sensible: Some(6.0),
            heat_latent: Some(7.0),
        };
        let factors = CorrectionFactors::from_def(&def).unwrap();
        let corrected = apply(&LoadVector::splat(1.0), &factors);
        assert_eq!(corrected.cool_12, 2.0);
        assert_eq!(corrected.cool_latent, 5.0);
        assert_eq!(corrected.heat_latent, 7.0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn correction_is_multiplicative_per_field(
            values in prop::array::uniform7(-1.0e5_f64..1.0e5_f64),
            raw in prop::array::uniform7(0.01_f64..3.0_f64),
        ) {
            let vector = LoadVector::from_fn(|f| values[f as usize]);
            let def = CorrectionFactorsDef {
                cool_9: Some(raw[0]),
                cool_12: Some(raw[1]),
                cool_14: Some(raw[2]),
                cool_16: Some(raw[3]),
                cool_latent: Some(raw[4]),
                heat_sensible: Some(raw[5]),
                heat_latent: Some(raw[6]),
            };
            let factors = CorrectionFactors::from_def(&def).unwrap();
            let corrected = apply(&vector, &factors);
            for (i, field) in LoadField::ALL.into_iter().enumerate() {
                prop_assert_eq!(corrected.get(field), values[i] * raw[i]);
            }
        }
    }
}

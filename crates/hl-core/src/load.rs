//! The 7-slot load vector shared by every stage of the pipeline.
//!
//! Field names (`cool_9` .. `heat_latent`) are part of the wire format and
//! must not be renamed or reordered.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Mul, Sub};
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::numeric::{Real, Tolerances, nearly_equal};
use crate::{HlError, HlResult};

/// Name of one slot of a [`LoadVector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LoadField {
    #[serde(rename = "cool_9")]
    Cool9,
    #[serde(rename = "cool_12")]
    Cool12,
    #[serde(rename = "cool_14")]
    Cool14,
    #[serde(rename = "cool_16")]
    Cool16,
    #[serde(rename = "cool_latent")]
    CoolLatent,
    #[serde(rename = "heat_sensible")]
    HeatSensible,
    #[serde(rename = "heat_latent")]
    HeatLatent,
}

impl LoadField {
    /// All fields in wire order.
    pub const ALL: [LoadField; 7] = [
        LoadField::Cool9,
        LoadField::Cool12,
        LoadField::Cool14,
        LoadField::Cool16,
        LoadField::CoolLatent,
        LoadField::HeatSensible,
        LoadField::HeatLatent,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            LoadField::Cool9 => "cool_9",
            LoadField::Cool12 => "cool_12",
            LoadField::Cool14 => "cool_14",
            LoadField::Cool16 => "cool_16",
            LoadField::CoolLatent => "cool_latent",
            LoadField::HeatSensible => "heat_sensible",
            LoadField::HeatLatent => "heat_latent",
        }
    }
}

impl fmt::Display for LoadField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LoadField {
    type Err = HlError;

    fn from_str(s: &str) -> HlResult<Self> {
        LoadField::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| HlError::UnknownField {
                name: s.to_string(),
            })
    }
}

/// One of the four summer reference hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CoolingHour {
    #[serde(rename = "cool_9")]
    H9,
    #[serde(rename = "cool_12")]
    H12,
    #[serde(rename = "cool_14")]
    H14,
    #[serde(rename = "cool_16")]
    H16,
}

impl CoolingHour {
    pub const ALL: [CoolingHour; 4] = [
        CoolingHour::H9,
        CoolingHour::H12,
        CoolingHour::H14,
        CoolingHour::H16,
    ];

    /// Clock hour (9, 12, 14 or 16).
    pub const fn hour(self) -> u8 {
        match self {
            CoolingHour::H9 => 9,
            CoolingHour::H12 => 12,
            CoolingHour::H14 => 14,
            CoolingHour::H16 => 16,
        }
    }

    pub const fn field(self) -> LoadField {
        match self {
            CoolingHour::H9 => LoadField::Cool9,
            CoolingHour::H12 => LoadField::Cool12,
            CoolingHour::H14 => LoadField::Cool14,
            CoolingHour::H16 => LoadField::Cool16,
        }
    }
}

impl fmt::Display for CoolingHour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:00", self.hour())
    }
}

/// Load at four summer hours, summer latent, winter sensible and winter latent [W].
///
/// Missing fields deserialize as zero so vectors can always be summed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadVector {
    pub cool_9: Real,
    pub cool_12: Real,
    pub cool_14: Real,
    pub cool_16: Real,
    pub cool_latent: Real,
    pub heat_sensible: Real,
    pub heat_latent: Real,
}

impl LoadVector {
    pub const ZERO: LoadVector = LoadVector {
        cool_9: 0.0,
        cool_12: 0.0,
        cool_14: 0.0,
        cool_16: 0.0,
        cool_latent: 0.0,
        heat_sensible: 0.0,
        heat_latent: 0.0,
    };

    /// Vector with every slot set to `value`.
    pub const fn splat(value: Real) -> Self {
        LoadVector {
            cool_9: value,
            cool_12: value,
            cool_14: value,
            cool_16: value,
            cool_latent: value,
            heat_sensible: value,
            heat_latent: value,
        }
    }

    /// Build a vector slot by slot, by field name.
    pub fn from_fn(mut f: impl FnMut(LoadField) -> Real) -> Self {
        LoadVector {
            cool_9: f(LoadField::Cool9),
            cool_12: f(LoadField::Cool12),
            cool_14: f(LoadField::Cool14),
            cool_16: f(LoadField::Cool16),
            cool_latent: f(LoadField::CoolLatent),
            heat_sensible: f(LoadField::HeatSensible),
            heat_latent: f(LoadField::HeatLatent),
        }
    }

    pub fn get(&self, field: LoadField) -> Real {
        match field {
            LoadField::Cool9 => self.cool_9,
            LoadField::Cool12 => self.cool_12,
            LoadField::Cool14 => self.cool_14,
            LoadField::Cool16 => self.cool_16,
            LoadField::CoolLatent => self.cool_latent,
            LoadField::HeatSensible => self.heat_sensible,
            LoadField::HeatLatent => self.heat_latent,
        }
    }

    /// Copy of `self` with one slot replaced.
    pub fn with(self, field: LoadField, value: Real) -> Self {
        Self::from_fn(|f| if f == field { value } else { self.get(f) })
    }

    /// Iterate `(field, value)` pairs in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (LoadField, Real)> + '_ {
        LoadField::ALL.into_iter().map(|f| (f, self.get(f)))
    }

    /// Combine two vectors slot by slot.
    pub fn zip_with(self, other: LoadVector, mut f: impl FnMut(Real, Real) -> Real) -> Self {
        Self::from_fn(|field| f(self.get(field), other.get(field)))
    }

    /// Elementwise product.
    pub fn hadamard(self, other: LoadVector) -> Self {
        self.zip_with(other, |a, b| a * b)
    }

    pub fn scale(self, k: Real) -> Self {
        Self::from_fn(|f| self.get(f) * k)
    }

    pub fn cooling_hours(&self) -> [(CoolingHour, Real); 4] {
        CoolingHour::ALL.map(|h| (h, self.get(h.field())))
    }

    /// Worst sensible cooling hour. On ties the earliest hour wins.
    pub fn peak_cooling(&self) -> (CoolingHour, Real) {
        let hours = self.cooling_hours();
        let mut best = hours[0];
        for candidate in &hours[1..] {
            if candidate.1 > best.1 {
                best = *candidate;
            }
        }
        best
    }

    /// First slot holding NaN or an infinity.
    pub fn first_non_finite(&self) -> Option<(LoadField, Real)> {
        self.iter().find(|(_, v)| !v.is_finite())
    }

    /// First slot where `self` and `other` differ beyond `tol`.
    pub fn first_mismatch(&self, other: &LoadVector, tol: Tolerances) -> Option<LoadField> {
        LoadField::ALL
            .into_iter()
            .find(|&f| !nearly_equal(self.get(f), other.get(f), tol))
    }
}

impl Add for LoadVector {
    type Output = LoadVector;

    fn add(self, rhs: LoadVector) -> LoadVector {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl AddAssign for LoadVector {
    fn add_assign(&mut self, rhs: LoadVector) {
        *self = *self + rhs;
    }
}

impl Sub for LoadVector {
    type Output = LoadVector;

    fn sub(self, rhs: LoadVector) -> LoadVector {
        self.zip_with(rhs, |a, b| a - b)
    }
}

impl Mul<Real> for LoadVector {
    type Output = LoadVector;

    fn mul(self, rhs: Real) -> LoadVector {
        self.scale(rhs)
    }
}

impl Sum for LoadVector {
    fn sum<I: Iterator<Item = LoadVector>>(iter: I) -> Self {
        iter.fold(LoadVector::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a LoadVector> for LoadVector {
    fn sum<I: Iterator<Item = &'a LoadVector>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LoadVector {
        LoadVector {
            cool_9: 100.0,
            cool_12: 140.0,
            cool_14: 130.0,
            cool_16: 90.0,
            cool_latent: 30.0,
            heat_sensible: 200.0,
            heat_latent: 10.0,
        }
    }

    #[test]
    fn field_names_round_trip() {
        for field in LoadField::ALL {
            assert_eq!(field.name().parse::<LoadField>().unwrap(), field);
        }
        assert!("cool_10".parse::<LoadField>().is_err());
    }

    #[test]
    fn get_and_with_address_the_same_slot() {
        let v = sample();
        for field in LoadField::ALL {
            let replaced = v.with(field, -1.0);
            assert_eq!(replaced.get(field), -1.0);
            for other in LoadField::ALL.into_iter().filter(|f| *f != field) {
                assert_eq!(replaced.get(other), v.get(other));
            }
        }
    }

    #[test]
    fn peak_cooling_picks_worst_hour() {
        assert_eq!(sample().peak_cooling(), (CoolingHour::H12, 140.0));
    }

    #[test]
    fn peak_cooling_tie_prefers_earliest_hour() {
        let v = LoadVector {
            cool_14: 50.0,
            cool_16: 50.0,
            ..LoadVector::ZERO
        };
        assert_eq!(v.peak_cooling(), (CoolingHour::H14, 50.0));
        assert_eq!(LoadVector::ZERO.peak_cooling().0, CoolingHour::H9);
    }

    #[test]
    fn missing_fields_deserialize_as_zero() {
        let v: LoadVector = serde_json::from_str(r#"{"cool_12": 5.5}"#).unwrap();
        assert_eq!(v, LoadVector::ZERO.with(LoadField::Cool12, 5.5));
    }

    #[test]
    fn serialized_field_order_is_stable() {
        let json = serde_json::to_string(&LoadVector::ZERO).unwrap();
        assert_eq!(
            json,
            r#"{"cool_9":0.0,"cool_12":0.0,"cool_14":0.0,"cool_16":0.0,"cool_latent":0.0,"heat_sensible":0.0,"heat_latent":0.0}"#
        );
    }

    #[test]
    fn first_non_finite_reports_field() {
        let v = sample().with(LoadField::HeatLatent, f64::NAN);
        assert_eq!(v.first_non_finite().map(|(f, _)| f), Some(LoadField::HeatLatent));
        assert!(sample().first_non_finite().is_none());
    }

    #[test]
    fn first_mismatch_respects_tolerance() {
        let a = sample();
        let b = a.with(LoadField::Cool16, 90.0 + 1e-9);
        assert!(a.first_mismatch(&b, Tolerances::consistency()).is_none());
        let c = a.with(LoadField::Cool16, 91.0);
        assert_eq!(
            a.first_mismatch(&c, Tolerances::consistency()),
            Some(LoadField::Cool16)
        );
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn vector() -> impl Strategy<Value = LoadVector> {
        prop::array::uniform7(-1.0e6_f64..1.0e6_f64).prop_map(|a| LoadVector {
            cool_9: a[0],
            cool_12: a[1],
            cool_14: a[2],
            cool_16: a[3],
            cool_latent: a[4],
            heat_sensible: a[5],
            heat_latent: a[6],
        })
    }

    proptest! {
        #[test]
        fn addition_is_elementwise(a in vector(), b in vector()) {
            let sum = a + b;
            for field in LoadField::ALL {
                prop_assert_eq!(sum.get(field), a.get(field) + b.get(field));
            }
            prop_assert_eq!(a + b, b + a);
        }

        #[test]
        fn hadamard_is_field_aligned(a in vector(), b in vector()) {
            let product = a.hadamard(b);
            for field in LoadField::ALL {
                prop_assert_eq!(product.get(field), a.get(field) * b.get(field));
            }
        }

        #[test]
        fn peak_is_max_of_hours(a in vector()) {
            let (_, peak) = a.peak_cooling();
            let expected = a.cool_9.max(a.cool_12).max(a.cool_14).max(a.cool_16);
            prop_assert_eq!(peak, expected);
        }
    }
}

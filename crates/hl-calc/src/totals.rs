//! Reported design figures derived from a corrected load vector.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;
use core::str::FromStr;

use hl_core::{CoolingHour, LoadVector, Real};
use serde::{Deserialize, Serialize};

use crate::error::{CalcError, EngineResult};
use crate::trace::EntityType;

/// Named final figures [W], shared by rooms, systems and the project.
///
/// `cooling_sensible` is the worst of the four summer hours, not their sum.
/// The `cool_*_total` entries are sensible plus latent cooling at each hour.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FinalTotals {
    pub cooling_sensible: Real,
    pub cooling_latent: Real,
    pub cooling_total: Real,
    pub heating_sensible: Real,
    pub heating_latent: Real,
    pub heating_total: Real,
    pub cool_9_total: Real,
    pub cool_12_total: Real,
    pub cool_14_total: Real,
    pub cool_16_total: Real,
}

impl FinalTotals {
    /// Select the design figures from a post-correction vector.
    ///
    /// Returns the governing cooling hour alongside the figures.
    pub fn from_post_correction(post: &LoadVector) -> (CoolingHour, Self) {
        let (peak_hour, cooling_sensible) = post.peak_cooling();
        let latent = post.cool_latent;
        let totals = Self {
            cooling_sensible,
            cooling_latent: latent,
            cooling_total: cooling_sensible + latent,
            heating_sensible: post.heat_sensible,
            heating_latent: post.heat_latent,
            heating_total: post.heat_sensible + post.heat_latent,
            cool_9_total: post.cool_9 + latent,
            cool_12_total: post.cool_12 + latent,
            cool_14_total: post.cool_14 + latent,
            cool_16_total: post.cool_16 + latent,
        };
        (peak_hour, totals)
    }

    /// Sums of finite loads can still overflow; the first such figure.
    pub fn first_non_finite(&self) -> Option<(TotalsMetric, Real)> {
        TotalsMetric::ALL
            .into_iter()
            .map(|m| (m, self.get(m)))
            .find(|(_, v)| !v.is_finite())
    }

    /// Fail the run when a figure of `entity_id` is not finite.
    pub fn ensure_finite(&self, entity_type: EntityType, entity_id: &str) -> EngineResult<()> {
        match self.first_non_finite() {
            Some((metric, value)) => Err(CalcError::NonFiniteTotal {
                entity_type,
                entity_id: entity_id.to_string(),
                metric,
                value,
            }),
            None => Ok(()),
        }
    }

    pub fn get(&self, metric: TotalsMetric) -> Real {
        match metric {
            TotalsMetric::CoolingSensible => self.cooling_sensible,
            TotalsMetric::CoolingLatent => self.cooling_latent,
            TotalsMetric::CoolingTotal => self.cooling_total,
            TotalsMetric::HeatingSensible => self.heating_sensible,
            TotalsMetric::HeatingLatent => self.heating_latent,
            TotalsMetric::HeatingTotal => self.heating_total,
            TotalsMetric::Cool9Total => self.cool_9_total,
            TotalsMetric::Cool12Total => self.cool_12_total,
            TotalsMetric::Cool14Total => self.cool_14_total,
            TotalsMetric::Cool16Total => self.cool_16_total,
        }
    }

    fn from_fn(mut f: impl FnMut(TotalsMetric) -> Real) -> Self {
        Self {
            cooling_sensible: f(TotalsMetric::CoolingSensible),
            cooling_latent: f(TotalsMetric::CoolingLatent),
            cooling_total: f(TotalsMetric::CoolingTotal),
            heating_sensible: f(TotalsMetric::HeatingSensible),
            heating_latent: f(TotalsMetric::HeatingLatent),
            heating_total: f(TotalsMetric::HeatingTotal),
            cool_9_total: f(TotalsMetric::Cool9Total),
            cool_12_total: f(TotalsMetric::Cool12Total),
            cool_14_total: f(TotalsMetric::Cool14Total),
            cool_16_total: f(TotalsMetric::Cool16Total),
        }
    }
}

impl Add for FinalTotals {
    type Output = FinalTotals;

    fn add(self, rhs: FinalTotals) -> FinalTotals {
        FinalTotals::from_fn(|m| self.get(m) + rhs.get(m))
    }
}

impl Sum for FinalTotals {
    fn sum<I: Iterator<Item = FinalTotals>>(iter: I) -> Self {
        iter.fold(FinalTotals::default(), Add::add)
    }
}

impl<'a> Sum<&'a FinalTotals> for FinalTotals {
    fn sum<I: Iterator<Item = &'a FinalTotals>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Name of one entry of [`FinalTotals`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TotalsMetric {
    CoolingSensible,
    CoolingLatent,
    CoolingTotal,
    HeatingSensible,
    HeatingLatent,
    HeatingTotal,
    Cool9Total,
    Cool12Total,
    Cool14Total,
    Cool16Total,
}

impl TotalsMetric {
    pub const ALL: [TotalsMetric; 10] = [
        TotalsMetric::CoolingSensible,
        TotalsMetric::CoolingLatent,
        TotalsMetric::CoolingTotal,
        TotalsMetric::HeatingSensible,
        TotalsMetric::HeatingLatent,
        TotalsMetric::HeatingTotal,
        TotalsMetric::Cool9Total,
        TotalsMetric::Cool12Total,
        TotalsMetric::Cool14Total,
        TotalsMetric::Cool16Total,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            TotalsMetric::CoolingSensible => "cooling_sensible",
            TotalsMetric::CoolingLatent => "cooling_latent",
            TotalsMetric::CoolingTotal => "cooling_total",
            TotalsMetric::HeatingSensible => "heating_sensible",
            TotalsMetric::HeatingLatent => "heating_latent",
            TotalsMetric::HeatingTotal => "heating_total",
            TotalsMetric::Cool9Total => "cool_9_total",
            TotalsMetric::Cool12Total => "cool_12_total",
            TotalsMetric::Cool14Total => "cool_14_total",
            TotalsMetric::Cool16Total => "cool_16_total",
        }
    }
}

impl fmt::Display for TotalsMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TotalsMetric {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TotalsMetric::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or(())
    }
}

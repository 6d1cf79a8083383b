//! Sub-metric modules for layout scoring
//!
//! Each of the six metrics is implemented in its own module and returns a
//! typed result with the clamped [0, 1] score plus the intermediate figures
//! the response surfaces. The evaluator aggregates them with
//! objective-dependent weights.

pub mod bsn_soil_diversity;
pub mod cee_species_compatibility;
pub mod cs_harvest_sync;
pub mod eh_water_efficiency;
pub mod psrnt_category_distribution;
pub mod ue_space_utilization;

pub use bsn_soil_diversity::{calculate_bsn, BsnResult};
pub use cee_species_compatibility::{calculate_cee, CeeResult};
pub use cs_harvest_sync::{calculate_cs, CsResult};
pub use eh_water_efficiency::{calculate_eh, EhResult};
pub use psrnt_category_distribution::{calculate_psrnt, PsrntResult};
pub use ue_space_utilization::{calculate_ue, UeResult};

use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, Result};

/// Six sub-scores plus the aggregated fitness, all in [0, 1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Metrics {
    /// Species compatibility with distance weighting.
    pub cee: f64,
    /// Category-distribution (nutritional/therapeutic) satisfaction.
    pub psrnt: f64,
    /// Water efficiency.
    pub eh: f64,
    /// Space utilization.
    pub ue: f64,
    /// Harvest-cycle synchronization.
    pub cs: f64,
    /// Soil-type diversity.
    pub bsn: f64,
    /// Weighted aggregate.
    pub fitness: f64,
}

impl Metrics {
    /// Reject any score outside [0, 1]. An out-of-range value is an internal
    /// bug, not a data problem.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("cee", self.cee),
            ("psrnt", self.psrnt),
            ("eh", self.eh),
            ("ue", self.ue),
            ("cs", self.cs),
            ("bsn", self.bsn),
            ("fitness", self.fitness),
        ] {
            if !(0.0..=1.0).contains(&value) || value.is_nan() {
                return Err(EngineError::evaluation(format!(
                    "metric {} out of range: {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    pub fn sub_scores(&self) -> [f64; 6] {
        [self.cee, self.psrnt, self.eh, self.ue, self.cs, self.bsn]
    }
}

/// Clamp a raw score into the metric range.
pub(crate) fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_unit_range() {
        let m = Metrics {
            cee: 0.5,
            psrnt: 1.0,
            eh: 0.0,
            ue: 0.7,
            cs: 0.9,
            bsn: 0.6,
            fitness: 0.62,
        };
        assert!(m.validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range() {
        let m = Metrics {
            cee: 1.2,
            psrnt: 0.5,
            eh: 0.5,
            ue: 0.5,
            cs: 0.5,
            bsn: 0.5,
            fitness: 0.5,
        };
        let err = m.validate().unwrap_err();
        assert!(err.to_string().contains("cee"));
    }
}

use serde::{Deserialize, Serialize};

use crate::diffusion::DispersionRates;
use crate::error::{OutbreakError, Result};

pub const DEFAULT_INFECTION_RATE: f64 = 0.3;
pub const DEFAULT_INCUBATION_RATE: f64 = 0.1;
pub const DEFAULT_TIMESTEP: f64 = 1.0;
pub const DEFAULT_HOURS_PER_SECOND: f64 = 168.0;

/// Immutable model configuration of one simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelParams {
    infection_rate: f64,
    incubation_rate: f64,
    timestep: f64,
    hours_per_second: f64,
    dispersion_rates: DispersionRates,
}

impl ModelParams {
    pub fn new(
        infection_rate: f64,
        incubation_rate: f64,
        timestep: f64,
        hours_per_second: f64,
        dispersion_rates: DispersionRates,
    ) -> Result<ModelParams> {
        if !infection_rate.is_finite() {
            return Err("infection_rate must be finite".into());
        }
        if !incubation_rate.is_finite() {
            return Err("incubation_rate must be finite".into());
        }
        // A non-positive step would never reach the render target.
        if !(timestep.is_finite() && timestep > 0.0) {
            return Err(format!("timestep must be > 0, got {timestep}").into());
        }
        if !(hours_per_second.is_finite() && hours_per_second >= 0.0) {
            return Err(format!("hours_per_second must be >= 0, got {hours_per_second}").into());
        }
        if dispersion_rates.as_slice().iter().any(|r| !r.is_finite()) {
            return Err("dispersion rates must be finite".into());
        }

        Ok(ModelParams {
            infection_rate,
            incubation_rate,
            timestep,
            hours_per_second,
            dispersion_rates,
        })
    }

    pub fn infection_rate(&self) -> f64 {
        self.infection_rate
    }

    pub fn incubation_rate(&self) -> f64 {
        self.incubation_rate
    }

    /// Model hours per integration step.
    pub fn timestep(&self) -> f64 {
        self.timestep
    }

    /// Model hours represented by one second of rendered video.
    pub fn hours_per_second(&self) -> f64 {
        self.hours_per_second
    }

    pub fn dispersion_rates(&self) -> &DispersionRates {
        &self.dispersion_rates
    }
}

impl Default for ModelParams {
    fn default() -> Self {
        ModelParams {
            infection_rate: DEFAULT_INFECTION_RATE,
            incubation_rate: DEFAULT_INCUBATION_RATE,
            timestep: DEFAULT_TIMESTEP,
            hours_per_second: DEFAULT_HOURS_PER_SECOND,
            dispersion_rates: DispersionRates::DEFAULT,
        }
    }
}

/// Serialized form of [`ModelParams`]; absent fields fall back to defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    pub infection_rate: Option<f64>,
    pub incubation_rate: Option<f64>,
    pub timestep: Option<f64>,
    pub hours_per_second: Option<f64>,
    pub dispersion_rates: Option<Vec<f64>>,
}

impl ModelConfig {
    pub fn from_json(text: &str) -> Result<ModelConfig> {
        Ok(serde_json::from_str(text)?)
    }

    /// Fields set in `other` win.
    pub fn merge(self, other: ModelConfig) -> ModelConfig {
        ModelConfig {
            infection_rate: other.infection_rate.or(self.infection_rate),
            incubation_rate: other.incubation_rate.or(self.incubation_rate),
            timestep: other.timestep.or(self.timestep),
            hours_per_second: other.hours_per_second.or(self.hours_per_second),
            dispersion_rates: other.dispersion_rates.or(self.dispersion_rates),
        }
    }
}

impl TryFrom<ModelConfig> for ModelParams {
    type Error = OutbreakError;

    fn try_from(config: ModelConfig) -> Result<Self> {
        let dispersion_rates = match config.dispersion_rates {
            Some(rates) => DispersionRates::try_from(rates.as_slice())?,
            None => DispersionRates::DEFAULT,
        };

        ModelParams::new(
            config.infection_rate.unwrap_or(DEFAULT_INFECTION_RATE),
            config.incubation_rate.unwrap_or(DEFAULT_INCUBATION_RATE),
            config.timestep.unwrap_or(DEFAULT_TIMESTEP),
            config.hours_per_second.unwrap_or(DEFAULT_HOURS_PER_SECOND),
            dispersion_rates,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_gives_defaults() {
        let params = ModelParams::try_from(ModelConfig::from_json("{}").unwrap()).unwrap();
        assert_eq!(params, ModelParams::default());
    }

    #[test]
    fn partial_config_overrides_only_named_fields() {
        let config =
            ModelConfig::from_json(r#"{"timestep": 0.5, "dispersion_rates": [0, 0.1, 0.05]}"#)
                .unwrap();
        let params = ModelParams::try_from(config).unwrap();
        assert_eq!(params.timestep(), 0.5);
        assert_eq!(params.dispersion_rates(), &DispersionRates::new(0.0, 0.1, 0.05));
        assert_eq!(params.infection_rate(), DEFAULT_INFECTION_RATE);
    }

    #[test]
    fn wrong_rate_count_is_rejected() {
        let config = ModelConfig::from_json(r#"{"dispersion_rates": [0, 0.1]}"#).unwrap();
        let err = ModelParams::try_from(config).unwrap_err();
        assert!(matches!(err, OutbreakError::DispersionRateCount { actual: 2, .. }));
    }

    #[test]
    fn non_positive_timestep_is_rejected() {
        for dt in [0.0, -1.0, f64::NAN] {
            let err = ModelParams::new(0.3, 0.1, dt, 168.0, DispersionRates::DEFAULT).unwrap_err();
            assert!(matches!(err, OutbreakError::InvalidParameter(_)));
        }
    }

    #[test]
    fn unknown_fields_are_an_error() {
        assert!(ModelConfig::from_json(r#"{"infection": 0.3}"#).is_err());
    }

    #[test]
    fn merge_prefers_the_override() {
        let base = ModelConfig {
            timestep: Some(2.0),
            infection_rate: Some(0.5),
            ..ModelConfig::default()
        };
        let over = ModelConfig {
            timestep: Some(0.25),
            ..ModelConfig::default()
        };
        let merged = base.merge(over);
        assert_eq!(merged.timestep, Some(0.25));
        assert_eq!(merged.infection_rate, Some(0.5));
    }
}

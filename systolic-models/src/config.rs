// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Structural configuration of the accelerator.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! environment variables prefixed with `SYSTOLIC_` (e.g.
//! `SYSTOLIC_GRID_SIZE=8`).

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use systolic_components::arbiter::policy::PolicyKind;
use systolic_components::types::{Accumulator, BurstLengths, CoreSet, Operand};
use systolic_engine::sim_error;
use systolic_engine::types::{SimError, SimResult};

const ENV_PREFIX: &str = "SYSTOLIC_";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystolicConfig {
    /// Dimension N of the N×N PE grid.
    pub grid_size: usize,

    pub num_cores: usize,

    /// Beats in a load burst, including the header.
    pub burst_write_len: usize,

    /// Beats in an unload burst, including the header.
    pub burst_read_len: usize,

    /// Rows in each weight and input memory.
    pub mem_rows: usize,

    /// Rows in each output buffer.
    pub glb_rows: usize,

    pub policy: PolicyKind,
}

impl Default for SystolicConfig {
    fn default() -> Self {
        Self {
            grid_size: 4,
            num_cores: 4,
            burst_write_len: 17,
            burst_read_len: 5,
            mem_rows: 64,
            glb_rows: 64,
            policy: PolicyKind::FixedPriority,
        }
    }
}

impl SystolicConfig {
    fn figment(conf_file: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(SystolicConfig::default()));
        if let Some(conf_file) = conf_file {
            figment = figment.merge(Toml::file(conf_file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load the layered configuration and validate it.
    pub fn load(conf_file: Option<&Path>) -> Result<Self, SimError> {
        let config: SystolicConfig = Self::figment(conf_file)
            .extract()
            .map_err(|e| SimError(format!("invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn burst_lengths(&self) -> BurstLengths {
        BurstLengths {
            write: self.burst_write_len,
            read: self.burst_read_len,
        }
    }

    /// Payload rows in each load burst.
    #[must_use]
    pub fn load_rows(&self) -> usize {
        self.burst_write_len.saturating_sub(1)
    }

    /// Payload rows in each unload burst.
    #[must_use]
    pub fn unload_rows(&self) -> usize {
        self.burst_read_len.saturating_sub(1)
    }

    pub fn validate(&self) -> SimResult {
        if self.grid_size == 0 {
            return sim_error!("grid_size must be at least 1");
        }
        if self.num_cores == 0 || self.num_cores > CoreSet::MAX_CORES {
            return sim_error!(format!(
                "num_cores must be between 1 and {}, got {}",
                CoreSet::MAX_CORES,
                self.num_cores
            ));
        }
        if self.burst_write_len == 0 || self.burst_read_len == 0 {
            return sim_error!("burst lengths must be at least 1");
        }
        if self.load_rows() > self.mem_rows {
            return sim_error!(format!(
                "load bursts carry {} rows but memories hold {}",
                self.load_rows(),
                self.mem_rows
            ));
        }
        if self.unload_rows() > self.glb_rows {
            return sim_error!(format!(
                "unload bursts carry {} rows but output buffers hold {}",
                self.unload_rows(),
                self.glb_rows
            ));
        }
        if self.grid_size > self.glb_rows {
            return sim_error!(format!(
                "output buffers of {} rows cannot hold a {} row grid",
                self.glb_rows, self.grid_size
            ));
        }

        let product_bits = 2 * Operand::BITS;
        let sum_bits = self.load_rows().max(1).next_power_of_two().trailing_zeros();
        if product_bits + sum_bits > Accumulator::BITS {
            return sim_error!(format!(
                "{} row bursts can overflow a {} bit accumulator",
                self.load_rows(),
                Accumulator::BITS
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SystolicConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.load_rows(), 16);
        assert_eq!(config.unload_rows(), 4);
    }

    #[test]
    fn invalid_configs() {
        let cases = [
            SystolicConfig {
                grid_size: 0,
                ..SystolicConfig::default()
            },
            SystolicConfig {
                num_cores: 65,
                ..SystolicConfig::default()
            },
            SystolicConfig {
                burst_read_len: 0,
                ..SystolicConfig::default()
            },
            SystolicConfig {
                burst_write_len: 66,
                ..SystolicConfig::default()
            },
            SystolicConfig {
                grid_size: 8,
                glb_rows: 4,
                burst_read_len: 2,
                ..SystolicConfig::default()
            },
            SystolicConfig {
                burst_write_len: 70_000,
                mem_rows: 70_000,
                ..SystolicConfig::default()
            },
        ];
        for config in cases {
            assert!(config.validate().is_err(), "{config:?}");
        }
    }

    #[test]
    fn accumulator_width_boundary() {
        let config = SystolicConfig {
            burst_write_len: 65_537,
            mem_rows: 65_536,
            ..SystolicConfig::default()
        };
        assert_eq!(config.validate(), Ok(()));
    }
}

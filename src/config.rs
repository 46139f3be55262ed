//! Run configuration: defaults plus `QRLME_*` environment overrides.

use crate::{
    error::{ConfigError, QrlmeResult},
    pipeline::{PipelineOptions, RecordPolicy},
    scheme::{DecryptStrategy, NoiseRange, Qrlme},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub moduli: Vec<u64>,
    pub dataset_dir: PathBuf,
    pub output_dir: PathBuf,
    pub noise_min: u64,
    pub noise_max: u64,
    pub strategy: DecryptStrategy,
    pub policy: RecordPolicy,
    pub parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        let noise = NoiseRange::default();
        Self {
            moduli: vec![2, 3, 5, 7, 11],
            dataset_dir: PathBuf::from("dataset"),
            output_dir: PathBuf::from("output"),
            noise_min: noise.min(),
            noise_max: noise.max(),
            strategy: DecryptStrategy::BruteForce,
            policy: RecordPolicy::Reduce,
            parallel: false,
        }
    }
}

impl Config {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `QRLME_*` key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(v) = lookup("QRLME_MODULI") {
            cfg.moduli = v
                .split(',')
                .map(|m| m.trim().parse::<u64>())
                .collect::<Result<_, _>>()
                .map_err(|e| invalid("QRLME_MODULI", &v, e))?;
        }
        if let Some(v) = lookup("QRLME_DATASET_DIR") {
            cfg.dataset_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("QRLME_OUTPUT_DIR") {
            cfg.output_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("QRLME_NOISE_MIN") {
            cfg.noise_min = v
                .trim()
                .parse()
                .map_err(|e| invalid("QRLME_NOISE_MIN", &v, e))?;
        }
        if let Some(v) = lookup("QRLME_NOISE_MAX") {
            cfg.noise_max = v
                .trim()
                .parse()
                .map_err(|e| invalid("QRLME_NOISE_MAX", &v, e))?;
        }
        if let Some(v) = lookup("QRLME_DECRYPT") {
            cfg.strategy = match v.trim() {
                "brute-force" => DecryptStrategy::BruteForce,
                "crt" => DecryptStrategy::Crt,
                _ => return Err(invalid("QRLME_DECRYPT", &v, "expected brute-force or crt")),
            };
        }
        if let Some(v) = lookup("QRLME_POLICY") {
            cfg.policy = match v.trim() {
                "reduce" => RecordPolicy::Reduce,
                "reject" => RecordPolicy::Reject,
                _ => return Err(invalid("QRLME_POLICY", &v, "expected reduce or reject")),
            };
        }
        if let Some(v) = lookup("QRLME_PARALLEL") {
            cfg.parallel = match v.trim() {
                "1" | "true" => true,
                "0" | "false" => false,
                _ => return Err(invalid("QRLME_PARALLEL", &v, "expected true or false")),
            };
        }
        Ok(cfg)
    }

    /// Build the codec these settings describe.
    pub fn codec(&self) -> QrlmeResult<Qrlme> {
        let noise = NoiseRange::new(self.noise_min, self.noise_max)?;
        Qrlme::new(self.moduli.clone())?
            .with_noise(noise)
            .with_strategy(self.strategy)
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            policy: self.policy,
            parallel: self.parallel,
        }
    }
}

fn invalid(key: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QrlmeError;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, Config::default());
        let codec = cfg.codec().unwrap();
        assert_eq!(codec.key(), 2310);
        assert_eq!(codec.noise(), NoiseRange::default());
        assert_eq!(codec.strategy(), DecryptStrategy::BruteForce);
    }

    #[test]
    fn test_overrides() {
        let cfg = Config::from_lookup(lookup(&[
            ("QRLME_MODULI", "3, 5, 7"),
            ("QRLME_DATASET_DIR", "/tmp/in"),
            ("QRLME_NOISE_MIN", "2"),
            ("QRLME_NOISE_MAX", "4"),
            ("QRLME_DECRYPT", "crt"),
            ("QRLME_POLICY", "reject"),
            ("QRLME_PARALLEL", "true"),
        ]))
        .unwrap();
        assert_eq!(cfg.moduli, vec![3, 5, 7]);
        assert_eq!(cfg.dataset_dir, PathBuf::from("/tmp/in"));
        assert_eq!(cfg.output_dir, PathBuf::from("output"));
        assert_eq!(cfg.strategy, DecryptStrategy::Crt);
        assert_eq!(
            cfg.pipeline_options(),
            PipelineOptions {
                policy: RecordPolicy::Reject,
                parallel: true
            }
        );
        let codec = cfg.codec().unwrap();
        assert_eq!(codec.key(), 105);
        assert_eq!(codec.noise(), NoiseRange::new(2, 4).unwrap());
    }

    #[test]
    fn test_invalid_values() {
        let err = Config::from_lookup(lookup(&[("QRLME_MODULI", "2,x")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "QRLME_MODULI",
                ..
            }
        ));
        assert!(Config::from_lookup(lookup(&[("QRLME_DECRYPT", "fast")])).is_err());
        assert!(Config::from_lookup(lookup(&[("QRLME_PARALLEL", "maybe")])).is_err());
    }

    #[test]
    fn test_invalid_codec_settings() {
        let cfg = Config {
            noise_min: 9,
            noise_max: 1,
            ..Config::default()
        };
        assert_eq!(
            cfg.codec().unwrap_err(),
            QrlmeError::InvalidNoiseRange { min: 9, max: 1 }
        );
        let cfg = Config {
            moduli: vec![4, 6],
            strategy: DecryptStrategy::Crt,
            ..Config::default()
        };
        assert!(matches!(
            cfg.codec(),
            Err(QrlmeError::InvalidModulus { .. })
        ));
    }
}

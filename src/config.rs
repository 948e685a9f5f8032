//! Runtime configuration

use crate::error::{OsseError, Result};
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_DB_PATH: &str = "data/db.txt";
pub const DEFAULT_PERMUTATION_KEY_PATH: &str = "data/pk.txt";
pub const DEFAULT_INVERSE_KEY_PATH: &str = "data/ik.txt";

/// Parameters of the predicate encryption engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineParams {
    /// Bit length `N` of each secret prime
    pub prime_bits: u64,

    /// Security parameter lambda, in bits. The tag is `lambda / 8` bytes.
    pub security_bits: usize,

    /// Miller-Rabin rounds per candidate
    pub miller_rabin_rounds: usize,

    /// Upper bound on candidate pairs drawn during key generation
    pub max_prime_attempts: u64,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            prime_bits: 128,
            security_bits: 128,
            miller_rabin_rounds: 10,
            max_prime_attempts: 1_000_000,
        }
    }
}

impl EngineParams {
    /// Tag length `l` in bytes
    pub fn tag_len(&self) -> usize {
        self.security_bits / 8
    }

    pub fn validate(&self) -> Result<()> {
        if self.prime_bits < 16 {
            return Err(OsseError::InvalidConfig(format!(
                "prime_bits must be at least 16, got {}",
                self.prime_bits
            )));
        }
        // The PRF is AES-128 keyed directly by the tag
        if self.security_bits != 128 {
            return Err(OsseError::InvalidConfig(format!(
                "security_bits must be 128, got {}",
                self.security_bits
            )));
        }
        if self.miller_rabin_rounds == 0 {
            return Err(OsseError::InvalidConfig(
                "miller_rabin_rounds must be non-zero".to_string(),
            ));
        }
        if self.max_prime_attempts == 0 {
            return Err(OsseError::InvalidConfig(
                "max_prime_attempts must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where the result permutation comes from on each execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// A new permutation per execution, optionally written to the key files
    Fresh { persist: bool },
    /// A permutation pair read once from the key files and reused
    Stored,
}

impl FromStr for KeySource {
    type Err = OsseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fresh" => Ok(KeySource::Fresh { persist: true }),
            "ephemeral" => Ok(KeySource::Fresh { persist: false }),
            "stored" => Ok(KeySource::Stored),
            other => Err(OsseError::InvalidConfig(format!(
                "unknown key source '{}' (expected fresh, ephemeral or stored)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsseConfig {
    /// Corpus file, one document per line
    pub db_path: PathBuf,

    pub permutation_key_path: PathBuf,

    pub inverse_key_path: PathBuf,

    pub key_source: KeySource,

    pub engine: EngineParams,
}

impl Default for OsseConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            permutation_key_path: PathBuf::from(DEFAULT_PERMUTATION_KEY_PATH),
            inverse_key_path: PathBuf::from(DEFAULT_INVERSE_KEY_PATH),
            key_source: KeySource::Fresh { persist: true },
            engine: EngineParams::default(),
        }
    }
}

impl OsseConfig {
    /// Defaults overridden by `OSSE_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("OSSE_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("OSSE_PK_PATH") {
            config.permutation_key_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("OSSE_IK_PATH") {
            config.inverse_key_path = PathBuf::from(path);
        }
        if let Some(source) = lookup("OSSE_KEY_SOURCE") {
            config.key_source = source.parse()?;
        }
        if let Some(bits) = lookup("OSSE_PRIME_BITS") {
            config.engine.prime_bits = parse_var("OSSE_PRIME_BITS", &bits)?;
        }
        if let Some(bits) = lookup("OSSE_SECURITY_BITS") {
            config.engine.security_bits = parse_var("OSSE_SECURITY_BITS", &bits)?;
        }
        if let Some(rounds) = lookup("OSSE_MR_ROUNDS") {
            config.engine.miller_rabin_rounds = parse_var("OSSE_MR_ROUNDS", &rounds)?;
        }
        if let Some(attempts) = lookup("OSSE_MAX_PRIME_ATTEMPTS") {
            config.engine.max_prime_attempts = parse_var("OSSE_MAX_PRIME_ATTEMPTS", &attempts)?;
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.engine.validate()
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| OsseError::InvalidConfig(format!("{} has invalid value '{}'", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let config = OsseConfig::default();
        assert_eq!(config.db_path, PathBuf::from("data/db.txt"));
        assert_eq!(config.engine.prime_bits, 128);
        assert_eq!(config.engine.tag_len(), 16);
        assert_eq!(config.engine.miller_rabin_rounds, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides() {
        let config = OsseConfig::from_lookup(lookup_from(&[
            ("OSSE_DB_PATH", "/tmp/corpus.txt"),
            ("OSSE_KEY_SOURCE", "stored"),
            ("OSSE_PRIME_BITS", "64"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/corpus.txt"));
        assert_eq!(config.key_source, KeySource::Stored);
        assert_eq!(config.engine.prime_bits, 64);
    }

    #[test]
    fn env_bad_number() {
        let result = OsseConfig::from_lookup(lookup_from(&[("OSSE_MR_ROUNDS", "lots")]));
        assert!(matches!(result, Err(OsseError::InvalidConfig(_))));
    }

    #[test]
    fn key_source_names() {
        assert_eq!("ephemeral".parse::<KeySource>().unwrap(), KeySource::Fresh { persist: false });
        assert_eq!("Fresh".parse::<KeySource>().unwrap(), KeySource::Fresh { persist: true });
        assert!("sometimes".parse::<KeySource>().is_err());
    }

    #[test]
    fn rejects_unsupported_security_parameter() {
        let params = EngineParams {
            security_bits: 256,
            ..Default::default()
        };
        assert!(matches!(params.validate(), Err(OsseError::InvalidConfig(_))));
    }
}

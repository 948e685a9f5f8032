//! Obfuscated searchable symmetric encryption.
//!
//! A key holder encrypts a keyword corpus with an inner-product predicate
//! encryption scheme and issues encrypted conjunctive queries. The evaluator
//! computes inner products between ciphertexts and returns the matching
//! document identifiers relabelled through a secret permutation.
//!
//! ```no_run
//! use osse::{observe, Osse, OsseConfig};
//!
//! let config = OsseConfig::from_env()?;
//! let osse = Osse::from_config(&config, observe::tracing_observer())?;
//! let (edb, eidx) = osse.setup()?;
//! let query = osse.query(&["alpha", "beta"])?;
//! let results = osse.execute(&edb, &eidx, &query)?;
//! println!("{:?}", results.ids);
//! # Ok::<(), osse::OsseError>(())
//! ```

#[cfg(test)]
#[macro_use]
extern crate quickcheck;

pub mod ciphertext;
pub mod config;
pub mod database;
mod error;
pub mod obfuscation;
pub mod observe;
mod osse;
pub mod primitives;
pub mod scheme;
pub mod vectorize;

pub use crate::ciphertext::Ciphertext;
pub use crate::config::{EngineParams, KeySource, OsseConfig};
pub use crate::database::{Database, Document};
pub use crate::error::{OsseError, ParseError, Result};
pub use crate::obfuscation::Obfuscator;
pub use crate::osse::{EncryptedDatabase, EncryptedIndex, Osse, SearchResults};
pub use crate::primitives::prp::Permutation;
pub use crate::scheme::ippe::PredicateEncryption;
pub use crate::vectorize::{BitVector, KeywordUniverse};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("ParseError")]
pub struct ParseError;

#[derive(Debug, Error)]
pub enum OsseError {
    #[error("Database file not found: {}", .0.display())]
    DatabaseNotFound(PathBuf),

    #[error("Key file not found: {}", .0.display())]
    KeyFileNotFound(PathBuf),

    #[error("Corpus contains no keywords")]
    EmptyCorpus,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed key file {}: {reason}", path.display())]
    MalformedKeyFile { path: PathBuf, reason: String },

    #[error("Invalid permutation: {0}")]
    InvalidPermutation(String),

    #[error("Vector has dimension {actual}, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Ciphertext is {actual} bits, expected {expected}")]
    CiphertextLength { expected: usize, actual: usize },

    #[error("Query must contain at least one keyword")]
    EmptyQuery,

    #[error("Keyword not in universe: {0}")]
    UnknownKeyword(String),

    #[error("Permutation covers {actual} identifiers, expected {expected}")]
    PermutationDomain { expected: usize, actual: usize },

    #[error("No prime pair found after {attempts} attempts")]
    PrimeSearchExhausted { attempts: u64 },

    #[error("Could not decode ciphertext: {0}")]
    Parse(#[from] ParseError),
}

impl OsseError {
    /// Deployment mistakes (missing files, bad settings) as opposed to
    /// misuse of the API at runtime.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            OsseError::DatabaseNotFound(_)
                | OsseError::KeyFileNotFound(_)
                | OsseError::EmptyCorpus
                | OsseError::InvalidConfig(_)
                | OsseError::Io { .. }
                | OsseError::MalformedKeyFile { .. }
                | OsseError::InvalidPermutation(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, OsseError>;

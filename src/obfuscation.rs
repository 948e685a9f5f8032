//! Relabelling of result identifiers through a secret permutation.

use crate::{
    config::{KeySource, OsseConfig},
    error::{OsseError, Result},
    observe::{Observer, Phase, PhaseTimer},
    primitives::prp::Permutation,
};

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

impl Permutation {
    /// Writes `pk` and `ik`, each as a single line of space-separated
    /// integers.
    pub fn save(&self, pk_path: &Path, ik_path: &Path) -> Result<()> {
        write_key(pk_path, self.forward_slice())?;
        write_key(ik_path, self.inverse_slice())
    }

    /// Reads a key pair back and checks that the two files really are a
    /// permutation and its inverse.
    pub fn load(pk_path: &Path, ik_path: &Path) -> Result<Self> {
        let forward = read_key(pk_path)?;
        let inverse = read_key(ik_path)?;
        Permutation::from_parts(forward, inverse)
    }
}

pub fn read_key(path: &Path) -> Result<Vec<usize>> {
    let contents = fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => OsseError::KeyFileNotFound(path.to_path_buf()),
        _ => OsseError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    contents
        .split_whitespace()
        .map(|token| {
            token.parse::<usize>().map_err(|_| OsseError::MalformedKeyFile {
                path: path.to_path_buf(),
                reason: format!("'{}' is not a non-negative integer", token),
            })
        })
        .collect()
}

pub fn write_key(path: &Path, key: &[usize]) -> Result<()> {
    let io_err = |source| OsseError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(io_err)?;
    }

    let line = key
        .iter()
        .map(|x| x.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    fs::write(path, line).map_err(io_err)
}

/// Hands out the permutation used by each query execution.
pub struct Obfuscator {
    source: KeySource,
    pk_path: PathBuf,
    ik_path: PathBuf,
    stored: Option<Permutation>,
    // Serialises writes of the key files between concurrent executions
    persist_lock: Mutex<()>,
    observer: Arc<dyn Observer>,
}

impl Obfuscator {
    /// With [`KeySource::Stored`] the key files are read here, once.
    pub fn new(config: &OsseConfig, observer: Arc<dyn Observer>) -> Result<Self> {
        let stored = match config.key_source {
            KeySource::Stored => {
                let timer = PhaseTimer::start(observer.as_ref(), Phase::LoadPermutation);
                let perm =
                    Permutation::load(&config.permutation_key_path, &config.inverse_key_path)?;
                timer.finish(perm.len());
                Some(perm)
            }
            KeySource::Fresh { .. } => None,
        };

        Ok(Self {
            source: config.key_source,
            pk_path: config.permutation_key_path.clone(),
            ik_path: config.inverse_key_path.clone(),
            stored,
            persist_lock: Mutex::new(()),
            observer,
        })
    }

    pub fn key_source(&self) -> KeySource {
        self.source
    }

    /// The permutation for one execution over `n` identifiers.
    pub fn permutation(&self, n: usize) -> Result<Permutation> {
        match &self.stored {
            Some(perm) if perm.len() == n => Ok(perm.clone()),
            Some(perm) => Err(OsseError::PermutationDomain {
                expected: n,
                actual: perm.len(),
            }),
            None => self.generate(n),
        }
    }

    fn generate(&self, n: usize) -> Result<Permutation> {
        let timer = PhaseTimer::start(self.observer.as_ref(), Phase::GeneratePermutation);
        let mut rng = ChaCha20Rng::from_entropy();
        let perm = Permutation::generate(n, &mut rng);

        if let KeySource::Fresh { persist: true } = self.source {
            let _guard = match self.persist_lock.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            perm.save(&self.pk_path, &self.ik_path)?;
            tracing::debug!(pk = %self.pk_path.display(), ik = %self.ik_path.display(), "permutation keys saved");
        }

        timer.finish(n);
        Ok(perm)
    }
}

impl std::fmt::Debug for Obfuscator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Obfuscator")
            .field("source", &self.source)
            .field("pk_path", &self.pk_path)
            .field("ik_path", &self.ik_path)
            .finish_non_exhaustive()
    }
}

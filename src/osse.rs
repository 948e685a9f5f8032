//! Setup, query and execution over an encrypted corpus.
//!
//! Documents are stored as encryptions of their *absence* vectors, so the
//! inner product with a query's presence vector counts the query keywords a
//! document is missing. Zero means the document contains all of them.

use crate::{
    ciphertext::Ciphertext,
    config::OsseConfig,
    database::Database,
    error::{OsseError, Result},
    obfuscation::Obfuscator,
    observe::{Observer, Phase, PhaseTimer},
    primitives::prp::Permutation,
    scheme::ippe::PredicateEncryption,
    vectorize::BitVector,
};

use num::Zero;
use rand::rngs::OsRng;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One ciphertext per document; the position is the document identifier.
#[derive(Debug, Clone)]
pub struct EncryptedDatabase {
    documents: Vec<Ciphertext>,
}

impl EncryptedDatabase {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&Ciphertext> {
        self.documents.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ciphertext> {
        self.documents.iter()
    }
}

/// Per keyword, an encryption of the set of documents containing it.
#[derive(Debug, Clone)]
pub struct EncryptedIndex {
    entries: BTreeMap<String, Ciphertext>,
}

impl EncryptedIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, keyword: &str) -> Option<&Ciphertext> {
        self.entries.get(keyword)
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Obfuscated matches of one execution, with the permutation that produced
/// them so the key holder can undo it.
#[derive(Debug, Clone)]
pub struct SearchResults {
    /// Permuted identifiers of the matching documents, ascending
    pub ids: Vec<usize>,
    pub permutation: Permutation,
}

impl SearchResults {
    /// The true document identifiers, ascending
    pub fn recover(&self) -> Vec<usize> {
        let mut ids: Vec<usize> = self.ids.iter().map(|id| self.permutation.invert(*id)).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

pub struct Osse {
    db: Database,
    engine: PredicateEncryption,
    index_engine: PredicateEncryption,
    obfuscator: Obfuscator,
    observer: Arc<dyn Observer>,
}

impl Osse {
    /// Generates the secret key for `db` and prepares the obfuscator.
    pub fn new(db: Database, config: &OsseConfig, observer: Arc<dyn Observer>) -> Result<Self> {
        config.validate()?;

        let engine = PredicateEncryption::new(db.universe().len(), &config.engine, observer.as_ref())?;
        let index_engine = engine.with_dimension(db.len())?;
        let obfuscator = Obfuscator::new(config, Arc::clone(&observer))?;

        Ok(Self {
            db,
            engine,
            index_engine,
            obfuscator,
            observer,
        })
    }

    /// Loads the corpus named by `config` and calls [`Osse::new`].
    pub fn from_config(config: &OsseConfig, observer: Arc<dyn Observer>) -> Result<Self> {
        let db = Database::load(&config.db_path, observer.as_ref())?;
        Self::new(db, config, observer)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn engine(&self) -> &PredicateEncryption {
        &self.engine
    }

    pub fn setup(&self) -> Result<(EncryptedDatabase, EncryptedIndex)> {
        let timer = PhaseTimer::start(self.observer.as_ref(), Phase::Setup);
        let universe = self.db.universe();

        let documents = self
            .db
            .documents()
            .par_iter()
            .map(|doc| self.engine.encrypt(&universe.vectorize(doc).complement()))
            .collect::<Result<Vec<_>>>()?;

        let mut postings = vec![BitVector::zeros(self.db.len()); universe.len()];
        for (id, doc) in self.db.documents().iter().enumerate() {
            for keyword in doc {
                if let Some(i) = universe.position(keyword) {
                    postings[i].set(id, true);
                }
            }
        }

        let entries = universe
            .keywords()
            .par_iter()
            .zip(postings.par_iter())
            .map(|(keyword, ids)| -> Result<(String, Ciphertext)> {
                Ok((keyword.clone(), self.index_engine.encrypt(ids)?))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        timer.finish(documents.len());
        tracing::debug!(documents = documents.len(), keywords = entries.len(), "corpus encrypted");

        Ok((EncryptedDatabase { documents }, EncryptedIndex { entries }))
    }

    /// Encrypts a conjunctive query. Every keyword must be in the universe.
    pub fn query<S: AsRef<str>>(&self, keywords: &[S]) -> Result<Ciphertext> {
        if keywords.is_empty() {
            return Err(OsseError::EmptyQuery);
        }

        let timer = PhaseTimer::start(self.observer.as_ref(), Phase::Query);
        let bits = self.db.universe().vectorize_strict(keywords)?;
        let c = self.engine.encrypt(&bits)?;
        timer.finish(keywords.len());
        Ok(c)
    }

    pub fn random_query(&self) -> Result<Vec<String>> {
        self.db.random_query(&mut OsRng)
    }

    /// Runs on the evaluator's side: only ciphertexts go in, only permuted
    /// identifiers come out.
    pub fn execute(
        &self,
        edb: &EncryptedDatabase,
        eidx: &EncryptedIndex,
        query: &Ciphertext,
    ) -> Result<SearchResults> {
        let timer = PhaseTimer::start(self.observer.as_ref(), Phase::Execute);
        tracing::debug!(documents = edb.len(), index_entries = eidx.len(), "executing query");

        let matches = edb
            .documents
            .par_iter()
            .enumerate()
            .map(|(id, doc)| -> Result<(usize, bool)> {
                let missing = self.engine.inner_product(query, doc)?;
                Ok((id, missing.is_zero()))
            })
            .collect::<Result<Vec<_>>>()?;

        let permutation = self.obfuscator.permutation(edb.len())?;
        let mut ids: Vec<usize> = matches
            .into_iter()
            .filter(|(_, hit)| *hit)
            .map(|(id, _)| permutation.permute(id))
            .collect();
        ids.sort_unstable();
        tracing::debug!(matches = ids.len(), "query executed");

        timer.finish(ids.len());
        Ok(SearchResults { ids, permutation })
    }

    pub fn decrypt(&self, c: &Ciphertext) -> Result<BitVector> {
        self.engine.decrypt(c)
    }

    /// The identifiers of the documents containing `keyword`, read back from
    /// the encrypted index.
    pub fn decrypt_index_entry(&self, eidx: &EncryptedIndex, keyword: &str) -> Result<Vec<usize>> {
        let c = eidx
            .get(keyword)
            .ok_or_else(|| OsseError::UnknownKeyword(keyword.to_string()))?;
        Ok(self.index_engine.decrypt(c)?.ones())
    }
}

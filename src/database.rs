//! Plaintext corpus: one document per line, whitespace-separated keywords.

use crate::{
    error::{OsseError, Result},
    observe::{Observer, Phase, PhaseTimer},
    vectorize::KeywordUniverse,
};

use rand::seq::SliceRandom;
use rand::{CryptoRng, Rng};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub type Document = Vec<String>;

#[derive(Debug, Clone)]
pub struct Database {
    documents: Vec<Document>,
    universe: KeywordUniverse,
}

impl Database {
    /// Splits each line into a document. Blank lines are kept as empty
    /// documents so identifiers stay equal to line numbers.
    pub fn from_lines<I, S>(lines: I, observer: &dyn Observer) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let documents: Vec<Document> = lines
            .into_iter()
            .map(|line| line.as_ref().split_whitespace().map(str::to_string).collect())
            .collect();

        let timer = PhaseTimer::start(observer, Phase::BuildUniverse);
        let universe = KeywordUniverse::build(&documents)?;
        timer.finish(universe.len());

        Ok(Self {
            documents,
            universe,
        })
    }

    pub fn load(path: &Path, observer: &dyn Observer) -> Result<Self> {
        tracing::info!(path = %path.display(), "loading documents");
        let timer = PhaseTimer::start(observer, Phase::LoadCorpus);

        let contents = fs::read_to_string(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => OsseError::DatabaseNotFound(path.to_path_buf()),
            _ => OsseError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        let db = Self::from_lines(contents.lines(), observer)?;

        timer.finish(db.len());
        Ok(db)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, id: usize) -> Option<&Document> {
        self.documents.get(id)
    }

    pub fn universe(&self) -> &KeywordUniverse {
        &self.universe
    }

    /// A random non-empty subset of the keywords of a random non-empty
    /// document.
    pub fn random_query<R: Rng + CryptoRng + ?Sized>(&self, rng: &mut R) -> Result<Vec<String>> {
        let candidates: Vec<&Document> = self.documents.iter().filter(|d| !d.is_empty()).collect();
        let doc = candidates.choose(rng).ok_or(OsseError::EmptyCorpus)?;

        let distinct: Vec<&String> = doc.iter().collect::<BTreeSet<_>>().into_iter().collect();
        let k = rng.gen_range(1..=distinct.len());

        Ok(distinct
            .choose_multiple(rng, k)
            .map(|kw| kw.to_string())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::{NoopObserver, RecordingObserver};
    use rand::rngs::OsRng;
    use std::io::Write;

    const CORPUS: [&str; 3] = ["a b c", "b c d", "a d"];

    #[test]
    fn parses_lines() {
        let db = Database::from_lines(CORPUS.iter(), &NoopObserver).unwrap();
        assert_eq!(db.len(), 3);
        assert_eq!(db.document(1).unwrap(), &vec!["b", "c", "d"]);
        assert_eq!(db.universe().keywords(), &["a", "b", "c", "d"]);
    }

    #[test]
    fn blank_lines_are_documents() {
        let db = Database::from_lines(vec!["a b", "", "  c  "], &NoopObserver).unwrap();
        assert_eq!(db.len(), 3);
        assert!(db.document(1).unwrap().is_empty());
        assert_eq!(db.document(2).unwrap(), &vec!["c"]);
    }

    #[test]
    fn all_blank_is_empty_corpus() {
        let result = Database::from_lines(vec!["", "   "], &NoopObserver);
        assert!(matches!(result, Err(OsseError::EmptyCorpus)));
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.txt");
        match Database::load(&path, &NoopObserver) {
            Err(OsseError::DatabaseNotFound(p)) => assert_eq!(p, path),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn load_reports_phases() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "a b c\nb c d\na d").unwrap();

        let observer = RecordingObserver::new();
        let db = Database::load(file.path(), &observer).unwrap();
        assert_eq!(db.len(), 3);
        assert_eq!(observer.phases(), vec![Phase::BuildUniverse, Phase::LoadCorpus]);
    }

    #[test]
    fn random_query_comes_from_one_document() {
        let db = Database::from_lines(vec!["a b c", "", "d e", "f"], &NoopObserver).unwrap();
        let mut rng = OsRng;

        for _ in 0..50 {
            let query = db.random_query(&mut rng).unwrap();
            assert!(!query.is_empty());

            let distinct: BTreeSet<&String> = query.iter().collect();
            assert_eq!(distinct.len(), query.len());

            assert!(db
                .documents()
                .iter()
                .any(|doc| query.iter().all(|kw| doc.contains(kw))));
        }
    }

    #[test]
    fn random_query_with_repeated_tokens() {
        let db = Database::from_lines(vec!["x x x"], &NoopObserver).unwrap();
        assert_eq!(db.random_query(&mut OsRng).unwrap(), vec!["x"]);
    }
}

use crate::error::{OsseError, Result};
use std::collections::{BTreeSet, HashMap};
use std::ops::Index;

/// Keyword presence over a [`KeywordUniverse`]: bit `i` is set iff keyword
/// `i` is present.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BitVector(Vec<bool>);

impl BitVector {
    pub fn zeros(len: usize) -> Self {
        Self(vec![false; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn set(&mut self, index: usize, bit: bool) {
        self.0[index] = bit;
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter().copied()
    }

    pub fn count_ones(&self) -> usize {
        self.0.iter().filter(|b| **b).count()
    }

    /// Positions of the set bits, ascending
    pub fn ones(&self) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, b)| if *b { Some(i) } else { None })
            .collect()
    }

    /// Every bit flipped
    pub fn complement(&self) -> Self {
        Self(self.0.iter().map(|b| !b).collect())
    }
}

impl From<Vec<bool>> for BitVector {
    fn from(bits: Vec<bool>) -> Self {
        Self(bits)
    }
}

impl Index<usize> for BitVector {
    type Output = bool;

    fn index(&self, index: usize) -> &bool {
        &self.0[index]
    }
}

/// The sorted, deduplicated set of keywords of a corpus. Built once and
/// shared by reference afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordUniverse {
    keywords: Vec<String>,
    positions: HashMap<String, usize>,
}

impl KeywordUniverse {
    pub fn build<D, T>(documents: D) -> Result<Self>
    where
        D: IntoIterator<Item = T>,
        T: IntoIterator,
        T::Item: AsRef<str>,
    {
        let sorted: BTreeSet<String> = documents
            .into_iter()
            .flat_map(|doc| doc.into_iter().map(|kw| kw.as_ref().to_string()))
            .collect();

        if sorted.is_empty() {
            return Err(OsseError::EmptyCorpus);
        }

        let keywords: Vec<String> = sorted.into_iter().collect();
        let positions = keywords
            .iter()
            .enumerate()
            .map(|(i, kw)| (kw.clone(), i))
            .collect();

        Ok(Self {
            keywords,
            positions,
        })
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn position(&self, keyword: &str) -> Option<usize> {
        self.positions.get(keyword).copied()
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.positions.contains_key(keyword)
    }

    /// Presence vector of `tokens`. Tokens outside the universe are ignored;
    /// use [`KeywordUniverse::vectorize_strict`] to reject them.
    pub fn vectorize<I>(&self, tokens: I) -> BitVector
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut bits = BitVector::zeros(self.len());
        for token in tokens {
            if let Some(i) = self.position(token.as_ref()) {
                bits.set(i, true);
            }
        }
        bits
    }

    pub fn vectorize_strict<I>(&self, tokens: I) -> Result<BitVector>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut bits = BitVector::zeros(self.len());
        for token in tokens {
            let token = token.as_ref();
            let i = self
                .position(token)
                .ok_or_else(|| OsseError::UnknownKeyword(token.to_string()))?;
            bits.set(i, true);
        }
        Ok(bits)
    }
}

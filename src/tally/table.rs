//! Word frequency table shared by counting and aggregation

use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

/// Mapping from word to occurrence count
///
/// Words are byte strings: case-sensitive, punctuation kept, and not
/// required to be valid UTF-8. A stored count is always at least 1.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: HashMap<Vec<u8>, u64>,
}

/// The arg-max of a table
///
/// An empty table reports the sentinel `("", -1)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MostCommon {
    #[serde(serialize_with = "serialize_word")]
    pub word: Vec<u8>,
    pub count: i64,
}

/// One row of a ranked listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordCount {
    #[serde(serialize_with = "serialize_word")]
    pub word: Vec<u8>,
    pub count: u64,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `word`
    pub fn increment(&mut self, word: &[u8]) {
        self.add(word, 1);
    }

    /// Count `n` occurrences of `word`
    pub fn add(&mut self, word: &[u8], n: u64) {
        if n == 0 {
            return;
        }
        match self.counts.get_mut(word) {
            Some(count) => *count += n,
            None => {
                self.counts.insert(word.to_vec(), n);
            }
        }
    }

    /// Add every count of `other` into this table
    pub fn merge(&mut self, other: &FrequencyTable) {
        self.counts.reserve(other.len());
        for (word, &count) in &other.counts {
            self.add(word, count);
        }
    }

    /// Like [`merge`](Self::merge), reusing `other`'s keys
    pub fn merge_owned(&mut self, other: FrequencyTable) {
        if self.counts.is_empty() {
            self.counts = other.counts;
            return;
        }
        self.counts.reserve(other.len());
        for (word, count) in other.counts {
            *self.counts.entry(word).or_insert(0) += count;
        }
    }

    /// Word with the highest count
    ///
    /// Scans in the table's iteration order and keeps the first word whose
    /// count beats everything seen before it. When several words share the
    /// maximum, which one comes back is unspecified.
    pub fn most_common(&self) -> MostCommon {
        let mut best = MostCommon::empty();
        for (word, &count) in &self.counts {
            let count = count as i64;
            if count > best.count {
                best.word.clone_from(word);
                best.count = count;
            }
        }
        best
    }

    /// The `n` most frequent words, highest first, ties ordered by word
    pub fn top(&self, n: usize) -> Vec<WordCount> {
        let mut entries: Vec<(&Vec<u8>, &u64)> = self.counts.iter().collect();
        entries.sort_unstable_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        entries
            .into_iter()
            .take(n)
            .map(|(word, &count)| WordCount {
                word: word.clone(),
                count,
            })
            .collect()
    }

    /// Occurrences of `word`, zero if absent
    pub fn count(&self, word: impl AsRef<[u8]>) -> u64 {
        self.counts.get(word.as_ref()).copied().unwrap_or(0)
    }

    /// Number of unique words
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], u64)> + '_ {
        self.counts.iter().map(|(word, &count)| (word.as_slice(), count))
    }
}

impl<W: AsRef<[u8]>> FromIterator<W> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = W>>(iter: I) -> Self {
        let mut table = FrequencyTable::new();
        for word in iter {
            table.increment(word.as_ref());
        }
        table
    }
}

impl MostCommon {
    /// Sentinel for a table with no words
    pub fn empty() -> Self {
        Self {
            word: Vec::new(),
            count: -1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count < 0
    }

    /// Word as text, with invalid UTF-8 replaced
    pub fn word_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.word)
    }
}

impl WordCount {
    pub fn word_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.word)
    }
}

impl fmt::Display for MostCommon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self.word_lossy(), self.count)
    }
}

fn serialize_word<S: Serializer>(word: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(word))
}

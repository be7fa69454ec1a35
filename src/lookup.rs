// Q9 Lookup Service
// The five read-only lookups over the dataset

use crate::data::{DatasetInfo, LookupConfig};
use crate::homophone::{HomophoneRanker, HOMOPHONE_SQL};
use crate::segment::{grapheme_count, graphemes, Split};
use crate::store::Dataset;
use crate::types::{LookupError, PhoneticEntry, Result};
use rusqlite::{params, Connection};
use rustc_hash::FxHashMap;
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

const CHARACTERS_BY_ID_SQL: &str = "SELECT characters FROM mapped_table WHERE id = ?1";

const RELATED_SQL: &str =
    "SELECT candidates FROM related_candidates_table WHERE character = ?1 LIMIT 1";

const IDS_CONTAINING_SQL: &str = "SELECT id FROM mapped_table WHERE instr(characters, ?1) > 0";

const IDS_NON_EMPTY_SQL: &str = "SELECT id FROM mapped_table WHERE length(characters) > 0";

const SIMPLIFIED_SQL: &str =
    "SELECT simplified FROM ts_chinese_table WHERE traditional = ?1 LIMIT 1";

/// Main Q9 lookup service
///
/// Wraps one dataset connection and answers the five lookups:
/// - id → characters
/// - character → related words
/// - substring → ids
/// - character → ranked homophones
/// - traditional → simplified text
pub struct Q9Lookup {
    /// Dataset connection
    dataset: Dataset,

    /// Homophone ordering rules
    ranker: HomophoneRanker,

    /// Memoized simplification lookups, keyed by traditional graphemes that
    /// have a row in `ts_chinese_table`
    simplified: Mutex<FxHashMap<String, String>>,
}

impl Q9Lookup {
    /// Open the service on the dataset named by `config`
    pub fn open(config: &LookupConfig) -> Result<Self> {
        Ok(Self::with_dataset(Dataset::open(config)?))
    }

    /// Open the service on a dataset file with default settings
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::with_dataset(Dataset::open_path(path)?))
    }

    /// Build the service on an already open connection
    pub fn from_connection(conn: Connection) -> Result<Self> {
        Ok(Self::with_dataset(Dataset::from_connection(conn)?))
    }

    /// Build the service on a [`Dataset`]
    pub fn with_dataset(dataset: Dataset) -> Self {
        Self {
            dataset,
            ranker: HomophoneRanker::default(),
            simplified: Mutex::new(FxHashMap::default()),
        }
    }

    /// Replace the homophone ranking rules
    pub fn with_ranker(mut self, ranker: HomophoneRanker) -> Self {
        self.ranker = ranker;
        self
    }

    /// Characters mapped to a numeric id
    ///
    /// # Arguments
    /// * `id` - Q9 code (e.g. 123, or 1000-1009 for shortcut lists)
    ///
    /// # Returns
    /// The stored characters split into grapheme clusters, in storage order,
    /// or `None` if the id is absent
    ///
    /// # Example
    /// ```
    /// # use q9_lookup::Q9Lookup;
    /// # use rusqlite::Connection;
    /// # let conn = Connection::open_in_memory().unwrap();
    /// # conn.execute_batch("
    /// #   CREATE TABLE mapped_table (id INTEGER PRIMARY KEY, characters TEXT);
    /// #   CREATE TABLE related_candidates_table (character TEXT, candidates TEXT);
    /// #   CREATE TABLE word_meta (char TEXT, ping TEXT, ping2 TEXT);
    /// #   CREATE TABLE ts_chinese_table (traditional TEXT, simplified TEXT);
    /// #   INSERT INTO mapped_table VALUES (123, '甲乙');
    /// # ").unwrap();
    /// let lookup = Q9Lookup::from_connection(conn)?;
    /// assert_eq!(lookup.lookup_by_id(123)?, Some(vec!["甲".to_string(), "乙".to_string()]));
    /// assert_eq!(lookup.lookup_by_id(999)?, None);
    /// # Ok::<(), q9_lookup::LookupError>(())
    /// ```
    pub fn lookup_by_id(&self, id: i64) -> Result<Option<Vec<String>>> {
        let chars = self
            .dataset
            .query_split(CHARACTERS_BY_ID_SQL, params![id], Split::Graphemes)?;
        debug!(id, found = chars.as_ref().map(Vec::len), "lookup_by_id");
        Ok(chars)
    }

    /// Words related to a character
    ///
    /// # Returns
    /// Candidates split on single spaces, or `None` if the character has no
    /// row. A row with blank candidates gives `Some(vec![])`.
    pub fn lookup_related(&self, word: &str) -> Result<Option<Vec<String>>> {
        let words = self
            .dataset
            .query_split(RELATED_SQL, params![word], Split::Delimiter(" "))?;
        debug!(word, found = words.as_ref().map(Vec::len), "lookup_related");
        Ok(words)
    }

    /// Ids whose characters contain `word` as a raw substring
    ///
    /// Row order is whatever the table yields. An empty `word` matches
    /// every id with non-empty characters.
    pub fn find_ids_containing(&self, word: &str) -> Result<Vec<i64>> {
        let ids: Vec<i64> = if word.is_empty() {
            self.dataset.query_column(IDS_NON_EMPTY_SQL, [])?
        } else {
            self.dataset.query_column(IDS_CONTAINING_SQL, params![word])?
        };
        debug!(word, matches = ids.len(), "find_ids_containing");
        Ok(ids)
    }

    /// Characters sharing the primary phonetic key with `word`
    ///
    /// Characters that also share the secondary key come first; inside each
    /// group the join order is kept. `word` itself is included. Input that is
    /// not exactly one grapheme, or has no phonetic data, yields an empty
    /// list.
    pub fn homophones_of(&self, word: &str) -> Result<Vec<String>> {
        if grapheme_count(word) != 1 {
            debug!(word, "homophones_of: not a single character");
            return Ok(Vec::new());
        }

        let rows = self.dataset.with_connection(|conn| {
            let mut stmt = conn.prepare_cached(HOMOPHONE_SQL)?;
            let rows = stmt.query_map(params![word], |row| {
                let character: String = row.get(0)?;
                let ping2: Option<String> = row.get(1)?;
                let reference_ping2: Option<String> = row.get(2)?;
                Ok((
                    PhoneticEntry { character, ping2 },
                    PhoneticEntry {
                        character: word.to_string(),
                        ping2: reference_ping2,
                    },
                ))
            })?;
            let rows = rows.collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        let ranked = self.ranker.rank(rows);
        debug!(word, matches = ranked.len(), "homophones_of");
        Ok(ranked)
    }

    /// Convert traditional characters to simplified ones
    ///
    /// Each grapheme is looked up on its own; unmapped graphemes are copied
    /// unchanged, so the output has one item per input grapheme.
    pub fn simplify(&self, input: &str) -> Result<String> {
        let mut output = String::with_capacity(input.len());
        for ch in graphemes(input) {
            output.push_str(&self.simplify_one(ch)?);
        }
        Ok(output)
    }

    fn simplify_one(&self, ch: String) -> Result<String> {
        if !self.dataset.is_open()? {
            return Err(LookupError::Closed);
        }
        {
            let cache = self.simplified.lock().map_err(|_| LookupError::Poisoned)?;
            if let Some(hit) = cache.get(&ch) {
                return Ok(hit.clone());
            }
        }

        match self.dataset.query_text(SIMPLIFIED_SQL, params![ch])? {
            Some(mapped) => {
                // only mapped keys are kept, so the cache never outgrows the table
                let mut cache = self.simplified.lock().map_err(|_| LookupError::Poisoned)?;
                cache.insert(ch, mapped.clone());
                Ok(mapped)
            }
            None => Ok(ch),
        }
    }

    /// Row counts of the loaded dataset
    pub fn info(&self) -> Result<DatasetInfo> {
        self.dataset.info()
    }

    /// Close the dataset connection; later lookups fail with
    /// [`LookupError::Closed`]
    pub fn close(&self) -> Result<()> {
        self.dataset.close()?;
        self.simplified
            .lock()
            .map_err(|_| LookupError::Poisoned)?
            .clear();
        Ok(())
    }
}

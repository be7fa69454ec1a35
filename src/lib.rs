//! # Q9 Lookup: Character Lookup for the Q9 Input Method
//!
//! Read-only lookups over the Q9 SQLite dataset, plus the keypad session
//! that drives them.
//!
//! ## Lookups
//!
//! 1. **Id → characters** - `lookup_by_id(123)`
//! 2. **Related words** - `lookup_related("中")`
//! 3. **Reverse code search** - `find_ids_containing("中")`
//! 4. **Homophones** - `homophones_of("詩")`, same secondary key first
//! 5. **Simplification** - `simplify("詩詞")`
//!
//! Missing data is never an error: lookups return `None` or an empty list.
//! Query failures come back as [`LookupError`].
//!
//! ## Dataset Tables
//!
//! - `mapped_table(id, characters)`
//! - `related_candidates_table(character, candidates)`
//! - `word_meta(char, ping, ping2)`
//! - `ts_chinese_table(traditional, simplified)`
//!
//! ## Example Usage
//!
//! ```ignore
//! use q9_lookup::{Q9Command, Q9Lookup, Q9Session};
//!
//! let lookup = Q9Lookup::open_path("files/dataset.db")?;
//!
//! let chars = lookup.lookup_by_id(123)?;
//! let homophones = lookup.homophones_of("詩")?;
//!
//! let mut session = Q9Session::new(&lookup);
//! session.press_digit(1)?;
//! session.press_digit(2)?;
//! session.press_digit(3)?;
//! session.press_digit(1)?;
//! let text = session.take_commit();
//! # Ok::<(), q9_lookup::LookupError>(())
//! ```
//!
//! ## Architecture
//!
//! - **Dataset** - Read-only connection, parameterized queries
//! - **Segmentation** - Grapheme-cluster splitting of stored values
//! - **Homophone Ranker** - Tier-ordered self-join results
//! - **Q9Lookup** - The five lookups
//! - **Q9Session** - Keypad state machine over any `CharacterSource`

pub mod data;
pub mod homophone;
pub mod lookup;
pub mod segment;
pub mod session;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use data::{DatasetInfo, LookupConfig, PAGE_SIZE};
pub use homophone::{HomophoneRanker, TierRule};
pub use lookup::Q9Lookup;
pub use segment::{grapheme_count, graphemes, Split};
pub use session::{CharacterSource, Keypad, Q9Session, Q9State};
pub use store::Dataset;
pub use types::{LookupError, PhoneticEntry, Q9Command, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

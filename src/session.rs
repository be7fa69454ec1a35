// Q9 Input Session
// Keypad state machine driving the lookups from digit and command keys

use crate::data::PAGE_SIZE;
use crate::lookup::Q9Lookup;
use crate::segment::{grapheme_count, pair_graphemes};
use crate::types::{Q9Command, Result};

/// Code whose characters are the bracket pairs
pub const OPEN_CLOSE_CODE: i64 = 1;

/// Code of the general shortcut list; 1001-1009 are per-digit lists
pub const SHORTCUT_CODE: i64 = 1000;

/// Most ids reported in the status line after a homophone selection
const MAX_REPORTED_CODES: usize = 5;

/// Where the session reads characters from
///
/// Implemented by [`Q9Lookup`]; tests plug in in-memory tables.
pub trait CharacterSource {
    fn lookup_by_id(&self, id: i64) -> Result<Option<Vec<String>>>;
    fn lookup_related(&self, word: &str) -> Result<Option<Vec<String>>>;
    fn find_ids_containing(&self, word: &str) -> Result<Vec<i64>>;
    fn homophones_of(&self, word: &str) -> Result<Vec<String>>;
    fn simplify(&self, input: &str) -> Result<String>;
}

impl CharacterSource for Q9Lookup {
    fn lookup_by_id(&self, id: i64) -> Result<Option<Vec<String>>> {
        Q9Lookup::lookup_by_id(self, id)
    }

    fn lookup_related(&self, word: &str) -> Result<Option<Vec<String>>> {
        Q9Lookup::lookup_related(self, word)
    }

    fn find_ids_containing(&self, word: &str) -> Result<Vec<i64>> {
        Q9Lookup::find_ids_containing(self, word)
    }

    fn homophones_of(&self, word: &str) -> Result<Vec<String>> {
        Q9Lookup::homophones_of(self, word)
    }

    fn simplify(&self, input: &str) -> Result<String> {
        Q9Lookup::simplify(self, input)
    }
}

impl<T: CharacterSource + ?Sized> CharacterSource for &T {
    fn lookup_by_id(&self, id: i64) -> Result<Option<Vec<String>>> {
        (**self).lookup_by_id(id)
    }

    fn lookup_related(&self, word: &str) -> Result<Option<Vec<String>>> {
        (**self).lookup_related(word)
    }

    fn find_ids_containing(&self, word: &str) -> Result<Vec<i64>> {
        (**self).find_ids_containing(word)
    }

    fn homophones_of(&self, word: &str) -> Result<Vec<String>> {
        (**self).homophones_of(word)
    }

    fn simplify(&self, input: &str) -> Result<String> {
        (**self).simplify(input)
    }
}

/// Which key faces the keypad should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Keypad {
    /// First-level radicals
    #[default]
    Base,
    /// Second level after the given first digit
    Second(u8),
    /// Third level, after two digits
    Third,
    /// Candidate text instead of key faces
    Candidates,
}

/// Observable session state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Q9State {
    /// Digits typed so far (at most three)
    pub input_code: String,
    /// Every candidate of the current list
    pub candidates: Vec<String>,
    /// Zero-based current page
    pub page: usize,
    pub total_pages: usize,
    /// Candidates on the current page, bound to keys 1-9
    pub page_candidates: Vec<String>,
    pub candidate_mode: bool,
    /// Next selection lists homophones instead of committing
    pub homophone_mode: bool,
    /// Last list came from a homophone query
    pub after_homophone: bool,
    pub open_close_mode: bool,
    pub shortcut_mode: bool,
    /// Last committed single character, for the relate key
    pub last_word: String,
    /// Status line text
    pub status: String,
    pub keypad: Keypad,
    /// Words related to the last commit, shown on the key faces
    pub related_words: Vec<String>,
}

impl Q9State {
    pub fn has_candidates(&self) -> bool {
        !self.page_candidates.is_empty()
    }
}

/// One input session over a character source
pub struct Q9Session<S> {
    source: S,
    state: Q9State,
    commit: Option<String>,
    simplified_output: bool,
}

impl<S: CharacterSource> Q9Session<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: Q9State::default(),
            commit: None,
            simplified_output: false,
        }
    }

    /// Convert committed text to simplified characters
    pub fn with_simplified_output(mut self, enabled: bool) -> Self {
        self.simplified_output = enabled;
        self
    }

    pub fn state(&self) -> &Q9State {
        &self.state
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Text ready to be inserted, if any; clears it
    pub fn take_commit(&mut self) -> Option<String> {
        self.commit.take()
    }

    pub fn has_commit(&self) -> bool {
        self.commit.is_some()
    }

    /// Back to the initial state, dropping any pending commit
    pub fn reset(&mut self) {
        self.state = Q9State::default();
        self.commit = None;
    }

    /// Handle a digit key
    ///
    /// In candidate mode `0` turns the page and `1`-`9` select; otherwise
    /// digits build a code, looked up at three digits or when `0` ends it
    /// early.
    ///
    /// # Returns
    /// `false` if `digit` is not 0-9 (nothing changed)
    pub fn press_digit(&mut self, digit: u8) -> Result<bool> {
        if digit > 9 {
            return Ok(false);
        }

        if self.state.candidate_mode {
            if digit == 0 {
                self.add_page(1);
            } else {
                self.select_word(usize::from(digit - 1))?;
            }
            return Ok(true);
        }

        self.state.input_code.push(char::from(b'0' + digit));
        self.state.status = self.state.input_code.clone();

        if digit == 0 || self.state.input_code.len() == 3 {
            match self.state.input_code.parse::<i64>() {
                Ok(code) => {
                    let words = self.source.lookup_by_id(code)?.unwrap_or_default();
                    if words.is_empty() {
                        self.cancel(true);
                    } else {
                        self.start_select_word(words);
                    }
                }
                Err(_) => self.cancel(true),
            }
        } else if self.state.input_code.len() == 1 {
            self.state.keypad = Keypad::Second(digit);
        } else {
            self.state.keypad = Keypad::Third;
        }
        Ok(true)
    }

    /// Handle a command key
    pub fn press(&mut self, command: Q9Command) -> Result<bool> {
        match command {
            Q9Command::Cancel => self.cancel(true),

            Q9Command::Homophone => {
                self.state.homophone_mode = !self.state.homophone_mode;
            }

            Q9Command::Relate => {
                if !self.state.last_word.is_empty() {
                    self.state.homophone_mode = false;
                    self.state.status = format!("[{}]關聯", self.state.last_word);
                    let relates = self
                        .source
                        .lookup_related(&self.state.last_word)?
                        .unwrap_or_default();
                    self.start_select_word(relates);
                }
            }

            Q9Command::OpenClose => {
                self.state.homophone_mode = false;
                self.state.after_homophone = false;
                self.state.open_close_mode = true;
                self.state.status = "「」".to_string();
                let chars = self
                    .source
                    .lookup_by_id(OPEN_CLOSE_CODE)?
                    .unwrap_or_default();
                self.start_select_word(pair_graphemes(&chars));
            }

            Q9Command::Shortcut => {
                if !self.state.candidate_mode {
                    let code = match self.state.input_code.as_bytes() {
                        [] => Some(SHORTCUT_CODE),
                        [d] => Some(SHORTCUT_CODE + i64::from(d - b'0')),
                        _ => None,
                    };
                    if let Some(code) = code {
                        self.state.status = format!("速選{}", self.state.input_code);
                        let words = self.source.lookup_by_id(code)?.unwrap_or_default();
                        if !words.is_empty() {
                            self.state.shortcut_mode = true;
                            self.start_select_word(words);
                        }
                    }
                }
            }

            Q9Command::PrevPage => {
                if self.state.candidate_mode {
                    self.add_page(-1);
                }
            }

            Q9Command::NextPage => {
                if self.state.candidate_mode {
                    self.add_page(1);
                }
            }
        }
        Ok(true)
    }

    fn cancel(&mut self, clear_related: bool) {
        let state = &mut self.state;
        state.candidate_mode = false;
        state.homophone_mode = false;
        state.after_homophone = false;
        state.open_close_mode = false;
        state.shortcut_mode = false;
        state.input_code.clear();
        state.page = 0;
        state.total_pages = 0;
        state.candidates.clear();
        state.page_candidates.clear();
        state.status.clear();
        state.keypad = Keypad::Base;

        if clear_related {
            state.related_words.clear();
        }
    }

    fn start_select_word(&mut self, words: Vec<String>) {
        if words.is_empty() {
            return;
        }

        self.state.total_pages = words.len().div_ceil(PAGE_SIZE);
        self.state.candidates = words;
        self.state.candidate_mode = true;
        self.state.input_code.clear();
        self.state.keypad = Keypad::Candidates;
        self.state.page = 0;
        self.update_page();
    }

    /// Move by `delta` pages, wrapping at both ends
    fn add_page(&mut self, delta: isize) {
        let total = self.state.total_pages;
        if self.state.candidates.is_empty() || total == 0 {
            return;
        }

        let page = self.state.page as isize + delta;
        self.state.page = page.rem_euclid(total as isize) as usize;
        self.update_page();
    }

    fn update_page(&mut self) {
        let start = self.state.page * PAGE_SIZE;
        self.state.page_candidates = self
            .state
            .candidates
            .iter()
            .skip(start)
            .take(PAGE_SIZE)
            .cloned()
            .collect();
    }

    fn select_word(&mut self, index: usize) -> Result<()> {
        let Some(word) = self.state.page_candidates.get(index).cloned() else {
            return Ok(());
        };

        if self.state.homophone_mode {
            self.state.homophone_mode = false;
            self.state.after_homophone = true;
            self.state.status = format!("同音[{}]", word);
            let homophones = self.source.homophones_of(&word)?;
            self.start_select_word(homophones);
            return Ok(());
        }

        if self.state.open_close_mode {
            self.commit = Some(self.output(&word)?);
            self.cancel(true);
            return Ok(());
        }

        self.commit = Some(self.output(&word)?);

        self.state.last_word = if grapheme_count(&word) == 1 {
            word.clone()
        } else {
            String::new()
        };

        let relates = if self.state.last_word.is_empty() {
            Vec::new()
        } else {
            self.source
                .lookup_related(&self.state.last_word)?
                .unwrap_or_default()
        };

        let mut status = None;
        if self.state.after_homophone {
            let codes = self.source.find_ids_containing(&word)?;
            if !codes.is_empty() {
                let listed: Vec<String> = codes
                    .iter()
                    .take(MAX_REPORTED_CODES)
                    .map(i64::to_string)
                    .collect();
                status = Some(format!("{}key:{}", word, listed.join(",")));
            }
        }

        if relates.is_empty() {
            self.cancel(true);
        } else {
            self.state.related_words = relates;
            self.cancel(false);
        }

        if let Some(status) = status {
            self.state.status = status;
        }
        Ok(())
    }

    fn output(&self, word: &str) -> Result<String> {
        if self.simplified_output {
            self.source.simplify(word)
        } else {
            Ok(word.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::graphemes;
    use rustc_hash::FxHashMap;

    #[derive(Default)]
    struct MemorySource {
        mapped: FxHashMap<i64, String>,
        related: FxHashMap<String, String>,
        homophones: FxHashMap<String, Vec<String>>,
        simplified: FxHashMap<String, String>,
    }

    impl CharacterSource for MemorySource {
        fn lookup_by_id(&self, id: i64) -> Result<Option<Vec<String>>> {
            Ok(self.mapped.get(&id).map(|s| graphemes(s)))
        }

        fn lookup_related(&self, word: &str) -> Result<Option<Vec<String>>> {
            Ok(self
                .related
                .get(word)
                .map(|s| s.split(' ').map(str::to_string).collect()))
        }

        fn find_ids_containing(&self, word: &str) -> Result<Vec<i64>> {
            let mut ids: Vec<i64> = self
                .mapped
                .iter()
                .filter(|(_, chars)| chars.contains(word))
                .map(|(id, _)| *id)
                .collect();
            ids.sort_unstable();
            Ok(ids)
        }

        fn homophones_of(&self, word: &str) -> Result<Vec<String>> {
            Ok(self.homophones.get(word).cloned().unwrap_or_default())
        }

        fn simplify(&self, input: &str) -> Result<String> {
            Ok(graphemes(input)
                .into_iter()
                .map(|g| self.simplified.get(&g).cloned().unwrap_or(g))
                .collect())
        }
    }

    fn source() -> MemorySource {
        let mut src = MemorySource::default();
        src.mapped.insert(1, "「」『』".to_string());
        src.mapped.insert(123, "甲乙丙".to_string());
        src.mapped.insert(124, "乙丁".to_string());
        src.mapped.insert(20, "子丑寅卯辰巳午未申酉戌亥".to_string());
        src.mapped.insert(1000, "，。".to_string());
        src.mapped.insert(1002, "！？".to_string());
        src.related.insert("甲".to_string(), "甲乙 甲丙".to_string());
        src.homophones
            .insert("乙".to_string(), vec!["乙".to_string(), "已".to_string()]);
        src.simplified.insert("乙".to_string(), "乚".to_string());
        src
    }

    fn type_code(session: &mut Q9Session<MemorySource>, code: &str) {
        for b in code.bytes() {
            session.press_digit(b - b'0').unwrap();
        }
    }

    #[test]
    fn test_digit_levels() {
        let mut session = Q9Session::new(source());

        session.press_digit(1).unwrap();
        assert_eq!(session.state().keypad, Keypad::Second(1));
        assert_eq!(session.state().status, "1");

        session.press_digit(2).unwrap();
        assert_eq!(session.state().keypad, Keypad::Third);
        assert_eq!(session.state().input_code, "12");
    }

    #[test]
    fn test_three_digits_show_candidates() {
        let mut session = Q9Session::new(source());
        type_code(&mut session, "123");

        let state = session.state();
        assert!(state.candidate_mode);
        assert_eq!(state.keypad, Keypad::Candidates);
        assert_eq!(state.page_candidates, vec!["甲", "乙", "丙"]);
        assert_eq!(state.total_pages, 1);
        assert!(state.input_code.is_empty());
    }

    #[test]
    fn test_unknown_code_cancels() {
        let mut session = Q9Session::new(source());
        type_code(&mut session, "999");

        assert!(!session.state().candidate_mode);
        assert!(session.state().input_code.is_empty());
        assert_eq!(session.state().keypad, Keypad::Base);
    }

    #[test]
    fn test_zero_ends_code_early() {
        let mut session = Q9Session::new(source());
        type_code(&mut session, "20");

        assert!(session.state().candidate_mode);
        assert_eq!(session.state().candidates.len(), 12);
    }

    #[test]
    fn test_out_of_range_digit() {
        let mut session = Q9Session::new(source());
        assert!(!session.press_digit(10).unwrap());
        assert_eq!(session.state(), &Q9State::default());
    }

    #[test]
    fn test_paging_wraps() {
        let mut session = Q9Session::new(source());
        type_code(&mut session, "20");
        assert_eq!(session.state().total_pages, 2);
        assert_eq!(session.state().page_candidates.len(), 9);

        session.press_digit(0).unwrap();
        assert_eq!(session.state().page, 1);
        assert_eq!(session.state().page_candidates, vec!["酉", "戌", "亥"]);

        session.press(Q9Command::NextPage).unwrap();
        assert_eq!(session.state().page, 0);

        session.press(Q9Command::PrevPage).unwrap();
        assert_eq!(session.state().page, 1);
    }

    #[test]
    fn test_select_commits_and_relates() {
        let mut session = Q9Session::new(source());
        type_code(&mut session, "123");
        session.press_digit(1).unwrap();

        assert_eq!(session.take_commit().as_deref(), Some("甲"));
        assert!(!session.has_commit());

        let state = session.state();
        assert!(!state.candidate_mode);
        assert_eq!(state.last_word, "甲");
        assert_eq!(state.related_words, vec!["甲乙", "甲丙"]);
    }

    #[test]
    fn test_select_empty_slot_is_ignored() {
        let mut session = Q9Session::new(source());
        type_code(&mut session, "123");
        session.press_digit(9).unwrap();

        assert!(!session.has_commit());
        assert!(session.state().candidate_mode);
    }

    #[test]
    fn test_relate_key() {
        let mut session = Q9Session::new(source());
        type_code(&mut session, "123");
        session.press_digit(1).unwrap();
        session.take_commit();

        session.press(Q9Command::Relate).unwrap();
        let state = session.state();
        assert!(state.candidate_mode);
        assert_eq!(state.status, "[甲]關聯");
        assert_eq!(state.page_candidates, vec!["甲乙", "甲丙"]);
    }

    #[test]
    fn test_relate_without_last_word() {
        let mut session = Q9Session::new(source());
        session.press(Q9Command::Relate).unwrap();
        assert!(!session.state().candidate_mode);
    }

    #[test]
    fn test_homophone_flow() {
        let mut session = Q9Session::new(source());
        type_code(&mut session, "123");
        session.press(Q9Command::Homophone).unwrap();
        assert!(session.state().homophone_mode);

        session.press_digit(2).unwrap();
        assert!(!session.has_commit());
        assert!(session.state().after_homophone);
        assert_eq!(session.state().status, "同音[乙]");
        assert_eq!(session.state().page_candidates, vec!["乙", "已"]);

        session.press_digit(1).unwrap();
        assert_eq!(session.take_commit().as_deref(), Some("乙"));
        assert_eq!(session.state().status, "乙key:123,124");
        assert!(!session.state().after_homophone);
    }

    #[test]
    fn test_homophone_toggle() {
        let mut session = Q9Session::new(source());
        session.press(Q9Command::Homophone).unwrap();
        session.press(Q9Command::Homophone).unwrap();
        assert!(!session.state().homophone_mode);
    }

    #[test]
    fn test_open_close_pairs() {
        let mut session = Q9Session::new(source());
        session.press(Q9Command::OpenClose).unwrap();

        assert!(session.state().open_close_mode);
        assert_eq!(session.state().page_candidates, vec!["「」", "『』"]);

        session.press_digit(2).unwrap();
        assert_eq!(session.take_commit().as_deref(), Some("『』"));
        assert!(!session.state().open_close_mode);
        assert!(session.state().last_word.is_empty());
    }

    #[test]
    fn test_shortcuts() {
        let mut session = Q9Session::new(source());
        session.press(Q9Command::Shortcut).unwrap();
        assert!(session.state().shortcut_mode);
        assert_eq!(session.state().status, "速選");
        assert_eq!(session.state().page_candidates, vec!["，", "。"]);

        session.press(Q9Command::Cancel).unwrap();
        session.press_digit(2).unwrap();
        session.press(Q9Command::Shortcut).unwrap();
        assert_eq!(session.state().status, "速選2");
        assert_eq!(session.state().page_candidates, vec!["！", "？"]);
    }

    #[test]
    fn test_shortcut_ignored_after_two_digits() {
        let mut session = Q9Session::new(source());
        type_code(&mut session, "12");
        session.press(Q9Command::Shortcut).unwrap();
        assert!(!session.state().shortcut_mode);
        assert_eq!(session.state().input_code, "12");
    }

    #[test]
    fn test_simplified_output() {
        let mut session = Q9Session::new(source()).with_simplified_output(true);
        type_code(&mut session, "123");
        session.press_digit(2).unwrap();
        assert_eq!(session.take_commit().as_deref(), Some("乚"));
    }

    #[test]
    fn test_reset() {
        let mut session = Q9Session::new(source());
        type_code(&mut session, "123");
        session.press_digit(1).unwrap();
        session.reset();

        assert!(!session.has_commit());
        assert_eq!(session.state(), &Q9State::default());
    }
}

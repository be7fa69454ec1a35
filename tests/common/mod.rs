// Shared fixture: a small Q9 dataset written to a temporary SQLite file

#![allow(dead_code)]

use q9_lookup::Q9Lookup;
use rusqlite::Connection;
use std::path::PathBuf;
use tempfile::TempDir;

/// Combining acute accent after "e", a CJK character, then a ZWJ family emoji
pub const COMPOSED: &str = "e\u{301}字👨\u{200d}👩\u{200d}👧";

pub const FIXTURE_SQL: &str = "
    CREATE TABLE mapped_table (id INTEGER PRIMARY KEY, characters TEXT);
    CREATE TABLE related_candidates_table (character TEXT, candidates TEXT);
    CREATE TABLE word_meta (char TEXT, ping TEXT, ping2 TEXT);
    CREATE TABLE ts_chinese_table (traditional TEXT, simplified TEXT);

    INSERT INTO mapped_table VALUES
        (1, '「」『』（）'),
        (20, '子丑寅卯辰巳午未申酉戌亥'),
        (123, '甲乙丙'),
        (124, '乙丁'),
        (125, '戊'),
        (126, ''),
        (127, NULL),
        (1000, '，。、'),
        (1003, '！？');

    INSERT INTO related_candidates_table VALUES
        ('甲', '甲 乙 丙'),
        ('乙', '乙丑 乙未'),
        ('空', '');

    INSERT INTO word_meta VALUES
        ('A', 'P1', 'S1'),
        ('B', 'P1', 'S2'),
        ('C', 'P1', 'S1'),
        ('D', 'P1', 'S1'),
        ('E', 'P2', 'S1'),
        ('甲', 'gaap', 'gaap3'),
        ('鉀', 'gaap', 'gaap3'),
        ('夾', 'gaap', 'gaap6');

    INSERT INTO ts_chinese_table VALUES
        ('A', 'a'),
        ('鉀', '钾'),
        ('詩', '诗'),
        ('體', '体');
";

/// A dataset file living as long as the returned `TempDir`
pub struct Fixture {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let fixture = Self::with_sql(FIXTURE_SQL);
        let conn = Connection::open(&fixture.path).expect("reopen dataset");
        conn.execute("INSERT INTO mapped_table VALUES (300, ?1)", [COMPOSED])
            .expect("insert composed row");
        fixture
    }

    pub fn with_sql(sql: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("dataset.db");
        let conn = Connection::open(&path).expect("create dataset");
        conn.execute_batch(sql).expect("load fixture");
        Self { dir, path }
    }

    pub fn open(&self) -> Q9Lookup {
        Q9Lookup::open_path(&self.path).expect("open fixture dataset")
    }
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// Q9 Lookup Text Segmentation
// Splits stored values into user-perceived characters or delimited words

use unicode_segmentation::UnicodeSegmentation;

/// How a scalar column value is cut into items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split<'a> {
    /// One item per extended grapheme cluster
    Graphemes,

    /// One item per delimiter-separated word
    Delimiter(&'a str),
}

/// Split a string into extended grapheme clusters
///
/// Composed characters (base + combining marks, emoji ZWJ sequences,
/// regional indicator pairs) stay in one item.
///
/// # Examples
/// ```
/// # use q9_lookup::segment::graphemes;
/// assert_eq!(graphemes("字e\u{301}"), vec!["字", "e\u{301}"]);
/// ```
pub fn graphemes(text: &str) -> Vec<String> {
    text.graphemes(true).map(str::to_string).collect()
}

/// Number of user-perceived characters in `text`
pub fn grapheme_count(text: &str) -> usize {
    text.graphemes(true).count()
}

/// Split on `delimiter`, dropping empty words produced by repeated,
/// leading or trailing delimiters
///
/// An empty delimiter falls back to grapheme segmentation.
pub fn split_delimited(text: &str, delimiter: &str) -> Vec<String> {
    if delimiter.is_empty() {
        return graphemes(text);
    }
    text.split(delimiter)
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

/// Apply a [`Split`] rule to a decoded scalar
pub fn split_value(text: &str, split: Split<'_>) -> Vec<String> {
    match split {
        Split::Graphemes => graphemes(text),
        Split::Delimiter(delimiter) => split_delimited(text, delimiter),
    }
}

/// Join consecutive graphemes two at a time
///
/// Bracket pairs are stored as one flat run of characters ("「」『』()"),
/// so the items are concatenated first and re-cut in pairs. A trailing
/// unpaired character is dropped.
pub fn pair_graphemes(items: &[String]) -> Vec<String> {
    let combined: String = items.concat();
    let clusters: Vec<&str> = combined.graphemes(true).collect();
    clusters
        .chunks_exact(2)
        .map(|pair| pair.concat())
        .collect()
}

//! Table-driven cue matching and span selection.
//!
//! Matching is ASCII case-insensitive so byte offsets in the folded text are
//! valid offsets into the original text.

/// How a cue must align with word boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Cue must start and end on a word boundary.
    WholeWord,
    /// Cue must start on a word boundary; `risk` matches `risks` and `risky`.
    Prefix,
}

/// Location of a cue occurrence, as byte offsets into the searched text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CueMatch {
    /// Offset of the first byte of the cue.
    pub start: usize,
    /// Offset one past the last byte of the cue.
    pub end: usize,
}

/// Candidate text span produced by a strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Position the candidate is ranked by.
    pub position: usize,
    /// Captured text.
    pub text: String,
}

/// Set of cue phrases matched against free text.
#[derive(Debug, Clone)]
pub struct CueLexicon {
    cues: Vec<String>,
    mode: MatchMode,
}

impl CueLexicon {
    /// Builds a lexicon, dropping blank cues.
    pub fn new<I, S>(cues: I, mode: MatchMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let cues = cues
            .into_iter()
            .map(|cue| cue.as_ref().trim().to_ascii_lowercase())
            .filter(|cue| !cue.is_empty())
            .collect();
        Self { cues, mode }
    }

    /// Returns `true` when the lexicon has no cues.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Returns every cue occurrence ordered by position.
    ///
    /// When several cues start at the same offset only the longest is kept.
    #[must_use]
    pub fn find_all(&self, text: &str) -> Vec<CueMatch> {
        let folded = text.to_ascii_lowercase();
        let mut matches: Vec<CueMatch> = Vec::new();

        for cue in &self.cues {
            for (start, _) in folded.match_indices(cue.as_str()) {
                let end = start + cue.len();
                if self.aligned(&folded, start, end) {
                    matches.push(CueMatch { start, end });
                }
            }
        }

        matches.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
        matches.dedup_by_key(|m| m.start);
        matches
    }

    /// Returns the earliest cue occurrence.
    #[must_use]
    pub fn first(&self, text: &str) -> Option<CueMatch> {
        self.find_all(text).into_iter().next()
    }

    /// Returns `true` when any cue occurs in `text`.
    #[must_use]
    pub fn contains(&self, text: &str) -> bool {
        self.first(text).is_some()
    }

    fn aligned(&self, folded: &str, start: usize, end: usize) -> bool {
        let before_ok = folded[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        if self.mode == MatchMode::Prefix {
            return before_ok;
        }
        let after_ok = folded[end..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());
        before_ok && after_ok
    }
}

/// Picks the earliest candidate, breaking ties by the longest text.
#[must_use]
pub fn earliest_longest(candidates: Vec<Span>) -> Option<Span> {
    candidates.into_iter().min_by(|a, b| {
        a.position
            .cmp(&b.position)
            .then(b.text.chars().count().cmp(&a.text.chars().count()))
    })
}

/// Truncates `text` to at most `max_chars` characters.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((offset, _)) => &text[..offset],
        None => text,
    }
}

/// Collapses whitespace and lowercases, for deduplication.
#[must_use]
pub fn dedup_key(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Splits text into clauses at line breaks, semicolons, and sentence ends.
///
/// A `.`, `!`, or `?` only ends a sentence when followed by whitespace or the
/// end of input, so `$1.5M` and `2.5%` stay intact.
#[must_use]
pub fn clauses(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        let boundary = match c {
            '\n' | ';' => Some(offset),
            '.' | '!' | '?' => match chars.peek() {
                None => Some(offset + c.len_utf8()),
                Some((_, next)) if next.is_whitespace() => Some(offset + c.len_utf8()),
                Some(_) => None,
            },
            _ => None,
        };

        if let Some(end) = boundary {
            push_clause(&mut out, &text[start..end]);
            start = offset + c.len_utf8();
        }
    }
    push_clause(&mut out, &text[start..]);
    out
}

fn push_clause<'a>(out: &mut Vec<&'a str>, clause: &'a str) {
    let trimmed = clause.trim();
    if !trimmed.is_empty() {
        out.push(trimmed);
    }
}

/// Returns the body of a bulleted or numbered list line, if `line` is one.
#[must_use]
pub fn list_item_body(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let mut chars = trimmed.char_indices();
    let (_, first) = chars.next()?;

    let marker_end = if matches!(first, '-' | '*' | '•') {
        first.len_utf8()
    } else if first.is_ascii_digit() {
        let digits_end = trimmed
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map_or(trimmed.len(), |(i, _)| i);
        match trimmed[digits_end..].chars().next() {
            Some('.' | ')') => digits_end + 1,
            _ => return None,
        }
    } else if first.is_ascii_alphabetic() && trimmed[1..].starts_with(')') {
        2
    } else {
        return None;
    };

    let rest = &trimmed[marker_end..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let body = rest.trim();
    (!body.is_empty()).then_some(body)
}

/// Removes a leading list marker if present.
#[must_use]
pub fn strip_list_marker(line: &str) -> &str {
    list_item_body(line).unwrap_or_else(|| line.trim())
}

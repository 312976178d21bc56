use std::ops::Range;

/// A keyword filter over log lines.
///
/// The expression is split on whitespace into keywords. A line is kept when
/// it contains *any* keyword, compared case-insensitively, so adding a
/// keyword widens the result instead of narrowing it. A blank expression
/// keeps everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterExpression {
    /// The expression as typed
    pub pattern: String,
    /// Lowercased, non-blank keywords in the order typed
    keywords: Vec<String>,
}

impl FilterExpression {
    pub fn parse(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let mut keywords: Vec<String> = Vec::new();
        for word in pattern.split_whitespace() {
            let word = word.to_lowercase();
            if !keywords.contains(&word) {
                keywords.push(word);
            }
        }

        Self { pattern, keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// True when no keyword survived parsing, so every line passes
    pub fn is_identity(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Check if a line matches this filter
    pub fn matches(&self, line: &str) -> bool {
        if self.is_identity() {
            return true;
        }
        let line = line.to_lowercase();
        self.keywords.iter().any(|keyword| line.contains(keyword.as_str()))
    }

    /// Produce the text to display for `raw`.
    ///
    /// Lines are split on `\n` only; a `\r` stays part of its line. Kept
    /// lines are joined with `\n` and, when anything matched, a single
    /// trailing `\n` is added.
    pub fn apply(&self, raw: &str) -> String {
        if self.is_identity() {
            return raw.to_string();
        }

        let mut out = String::new();
        for line in raw.split('\n').filter(|line| self.matches(line)) {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    /// Byte ranges of keyword occurrences in `line`, sorted and merged.
    pub fn highlight_ranges(&self, line: &str) -> Vec<Range<usize>> {
        if self.is_identity() || line.is_empty() {
            return Vec::new();
        }

        // Lowercasing can change a char's byte length, so remember where
        // each lowered byte came from in the original line.
        let mut lowered = String::with_capacity(line.len());
        let mut origin: Vec<Range<usize>> = Vec::with_capacity(line.len());
        for (start, ch) in line.char_indices() {
            let end = start + ch.len_utf8();
            for lower in ch.to_lowercase() {
                lowered.push(lower);
                origin.resize(lowered.len(), start..end);
            }
        }

        let mut ranges: Vec<Range<usize>> = Vec::new();
        for keyword in &self.keywords {
            for (at, _) in lowered.match_indices(keyword.as_str()) {
                let last = at + keyword.len() - 1;
                ranges.push(origin[at].start..origin[last].end);
            }
        }

        ranges.sort_by_key(|range| range.start);
        let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match merged.last_mut() {
                Some(prev) if range.start <= prev.end => prev.end = prev.end.max(range.end),
                _ => merged.push(range),
            }
        }
        merged
    }
}

/// Filter `raw` by the whitespace-separated keywords in `expression`
pub fn filter(raw: &str, expression: &str) -> String {
    FilterExpression::parse(expression).apply(raw)
}

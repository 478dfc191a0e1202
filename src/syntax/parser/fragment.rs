//! Whitespace-stripped source text that still knows where it came from.
//!
//! The DSL is parsed by slicing the cleaned program text, so every slice
//! carries the original byte offset of each of its bytes. Spans of any
//! fragment therefore point back into the text the user wrote.

use crate::span::Span;

/// The program with all whitespace removed, plus an offset map.
pub(crate) struct Cleaned {
    text: String,
    origin: Vec<u32>,
    source_len: u32,
}

impl Cleaned {
    pub(crate) fn new(source: &str) -> Self {
        let mut text = String::with_capacity(source.len());
        let mut origin = Vec::with_capacity(source.len());
        for (offset, ch) in source.char_indices() {
            if ch.is_whitespace() {
                continue;
            }
            text.push(ch);
            for k in 0..ch.len_utf8() {
                origin.push((offset + k) as u32);
            }
        }
        Self {
            text,
            origin,
            source_len: source.len() as u32,
        }
    }

    pub(crate) fn fragment(&self) -> Fragment<'_> {
        Fragment {
            text: &self.text,
            origin: &self.origin,
            anchor: self.source_len,
        }
    }
}

/// A slice of cleaned text. `anchor` locates empty fragments.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Fragment<'a> {
    text: &'a str,
    origin: &'a [u32],
    anchor: u32,
}

impl<'a> Fragment<'a> {
    pub(crate) fn as_str(&self) -> &'a str {
        self.text
    }

    pub(crate) fn len(&self) -> usize {
        self.text.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Span in the original source covering this fragment.
    pub(crate) fn span(&self) -> Span {
        match (self.origin.first(), self.origin.last()) {
            (Some(&first), Some(&last)) => Span::new(first, last + 1),
            _ => Span::point(self.anchor),
        }
    }

    /// Span of the single byte at `at`.
    pub(crate) fn span_at(&self, at: usize) -> Span {
        self.slice(at, (at + 1).min(self.len())).span()
    }

    /// Sub-fragment `[start, end)`. Callers only cut at ASCII delimiters.
    pub(crate) fn slice(&self, start: usize, end: usize) -> Fragment<'a> {
        let anchor = match self.origin.get(start) {
            Some(&o) => o,
            None => self.origin.last().map(|&o| o + 1).unwrap_or(self.anchor),
        };
        Fragment {
            text: &self.text[start..end],
            origin: &self.origin[start..end],
            anchor,
        }
    }

    pub(crate) fn slice_from(&self, start: usize) -> Fragment<'a> {
        self.slice(start, self.len())
    }

    /// First occurrence of `pat` that starts a token: at the beginning,
    /// after whitespace in the source, or after a non-identifier byte.
    pub(crate) fn find_token(&self, pat: &str) -> Option<usize> {
        self.text
            .match_indices(pat)
            .map(|(at, _)| at)
            .find(|&at| self.starts_token(at))
    }

    fn starts_token(&self, at: usize) -> bool {
        if at == 0 {
            return true;
        }
        let prev = self.text.as_bytes()[at - 1];
        let spaced = self.origin[at] != self.origin[at - 1] + 1;
        spaced || !(prev.is_ascii_alphanumeric() || prev == b'_')
    }

    pub(crate) fn find_byte(&self, b: u8) -> Option<usize> {
        self.text.bytes().position(|c| c == b)
    }

    /// Split on an ASCII delimiter at bracket/paren depth 0. Empty pieces are kept.
    pub(crate) fn split_top_level(&self, delim: u8) -> Vec<Fragment<'a>> {
        let mut pieces = Vec::new();
        let mut depth = 0i32;
        let mut start = 0;
        for (i, b) in self.text.bytes().enumerate() {
            match b {
                b'(' | b'[' => depth += 1,
                b')' | b']' => depth -= 1,
                _ if b == delim && depth == 0 => {
                    pieces.push(self.slice(start, i));
                    start = i + 1;
                }
                _ => {}
            }
        }
        pieces.push(self.slice_from(start));
        pieces
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleaning_keeps_offsets() {
        let c = Cleaned::new("  a b\n c ");
        let f = c.fragment();
        assert_eq!(f.as_str(), "abc");
        assert_eq!(f.span(), Span::new(2, 8));
        assert_eq!(f.slice(1, 2).span(), Span::new(4, 5));
        assert_eq!(f.span_at(2), Span::new(7, 8));
    }

    #[test]
    fn test_empty_fragment_anchor() {
        let c = Cleaned::new("ab = ");
        let f = c.fragment();
        assert_eq!(f.as_str(), "ab=");
        let rhs = f.slice_from(3);
        assert!(rhs.is_empty());
        assert_eq!(rhs.span(), Span::point(4));
        let whole_empty = Cleaned::new("   ");
        assert_eq!(whole_empty.fragment().span(), Span::point(3));
    }

    #[test]
    fn test_find_token_skips_identifier_suffixes() {
        let c = Cleaned::new("N:NOBODY:1 BODY: x");
        let f = c.fragment();
        assert_eq!(f.find_token("BODY:"), Some(10));
        let glued = Cleaned::new("a,BODY:x");
        assert_eq!(glued.fragment().find_token("BODY:"), Some(2));
        let none = Cleaned::new("SOMEBODY:x");
        assert_eq!(none.fragment().find_token("BODY:"), None);
    }

    #[test]
    fn test_split_top_level() {
        let c = Cleaned::new("A[i, j], B[j], (x, y)");
        let parts: Vec<&str> = c
            .fragment()
            .split_top_level(b',')
            .iter()
            .map(|p| p.as_str())
            .collect();
        assert_eq!(parts, vec!["A[i,j]", "B[j]", "(x,y)"]);
    }
}

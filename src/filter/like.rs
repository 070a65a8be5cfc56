//! SQL-style `LIKE` wildcard matching: `%` (zero or more chars), `_` (any
//! one char), with an optional escape character that literalizes the
//! character following it.

use std::collections::BTreeSet;
use std::hash::Hash;
use std::sync::Arc;

use crate::error::Result;
use crate::extractor::Extractor;
use crate::filter::leaf::Equals;
use crate::filter::Filter;
use crate::index::registry::IndexRegistry;

/// One segment of a compiled pattern: a run of literal characters and
/// single-character wildcards (`_`), matched contiguously.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Literal(char),
    AnyOne,
}

/// A pattern compiled into anchored match steps around `%` boundaries.
/// `leading`/`trailing` record whether the pattern starts/ends with `%`,
/// which drops the corresponding anchor requirement.
#[derive(Clone, Debug)]
struct CompiledPattern {
    segments: Vec<Vec<Token>>,
    leading_any: bool,
    trailing_any: bool,
}

impl CompiledPattern {
    fn compile(pattern: &str, escape: Option<char>) -> Self {
        let mut segments: Vec<Vec<Token>> = vec![Vec::new()];
        let mut leading_any = false;
        let mut trailing_any = false;
        let mut chars = pattern.chars().peekable();
        let mut first = true;
        let mut last_was_percent = false;

        while let Some(c) = chars.next() {
            last_was_percent = false;
            if Some(c) == escape {
                if let Some(next) = chars.next() {
                    segments.last_mut().unwrap().push(Token::Literal(next));
                }
                first = false;
                continue;
            }
            match c {
                '%' => {
                    if first {
                        leading_any = true;
                    } else {
                        segments.push(Vec::new());
                    }
                    last_was_percent = true;
                }
                '_' => segments.last_mut().unwrap().push(Token::AnyOne),
                other => segments.last_mut().unwrap().push(Token::Literal(other)),
            }
            first = false;
        }
        if last_was_percent {
            trailing_any = true;
            segments.pop();
        }
        // drop any empty segments produced by adjacent `%%`
        segments.retain(|s| !s.is_empty());

        CompiledPattern { segments, leading_any, trailing_any }
    }

    /// The pattern is wholly literal (no `%`/`_`) and can degrade to a
    /// plain `Equals` comparison.
    fn as_literal(&self) -> Option<String> {
        if self.leading_any || self.trailing_any || self.segments.len() != 1 {
            return None;
        }
        self.segments[0]
            .iter()
            .map(|t| match t {
                Token::Literal(c) => Some(*c),
                Token::AnyOne => None,
            })
            .collect::<Option<String>>()
    }

    fn matches(&self, text: &str) -> bool {
        let chars: Vec<char> = text.chars().collect();
        let segs = &self.segments;
        let n = segs.len();

        if n == 0 {
            // pattern was entirely made of '%' (or empty) — matches anything
            return true;
        }

        if n == 1 && !self.leading_any && !self.trailing_any {
            return chars.len() == segs[0].len() && segment_matches_at(&segs[0], &chars, 0);
        }

        let mut pos = 0usize;
        let mut start_idx = 0;
        let mut end_idx = n;

        if !self.leading_any {
            if !segment_matches_at(&segs[0], &chars, 0) {
                return false;
            }
            pos = segs[0].len();
            start_idx = 1;
        }

        if !self.trailing_any {
            end_idx = n - 1;
        }

        for seg in &segs[start_idx..end_idx] {
            match find_segment_from(seg, &chars, pos) {
                Some(found) => pos = found + seg.len(),
                None => return false,
            }
        }

        if !self.trailing_any {
            let back = &segs[n - 1];
            match chars.len().checked_sub(back.len()) {
                Some(start) => start >= pos && segment_matches_at(back, &chars, start),
                None => false,
            }
        } else {
            true
        }
    }
}

fn segment_matches_at(seg: &[Token], chars: &[char], at: usize) -> bool {
    if at + seg.len() > chars.len() {
        return false;
    }
    seg.iter().enumerate().all(|(i, t)| match t {
        Token::AnyOne => true,
        Token::Literal(c) => chars[at + i] == *c,
    })
}

fn find_segment_from(seg: &[Token], chars: &[char], from: usize) -> Option<usize> {
    if seg.is_empty() {
        return Some(from);
    }
    if from + seg.len() > chars.len() {
        return None;
    }
    (from..=chars.len() - seg.len()).find(|&start| segment_matches_at(seg, chars, start))
}

/// `extractor(value) LIKE pattern`, with `%`/`_` wildcards and an optional
/// escape character. `ignore_case` folds both the extracted text and the
/// pattern to a common case before matching.
pub struct Like<K, V> {
    extractor: Arc<dyn Extractor<V, String>>,
    pattern_text: String,
    escape: Option<char>,
    ignore_case: bool,
    compiled: CompiledPattern,
    _marker: std::marker::PhantomData<fn(&K)>,
}

impl<K, V> Like<K, V> {
    pub fn new(extractor: Arc<dyn Extractor<V, String>>, pattern: impl Into<String>, escape: Option<char>, ignore_case: bool) -> Self {
        let pattern_text = pattern.into();
        let folded = if ignore_case { pattern_text.to_lowercase() } else { pattern_text.clone() };
        let compiled = CompiledPattern::compile(&folded, escape);
        Like { extractor, pattern_text, escape, ignore_case, compiled, _marker: std::marker::PhantomData }
    }
}

impl<K, V> Filter<K, V> for Like<K, V>
where
    K: Ord + Clone + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn evaluate(&self, value: &V) -> bool {
        let text = match self.extractor.extract(value) {
            Some(t) => t,
            None => return false,
        };
        let folded = if self.ignore_case { text.to_lowercase() } else { text };
        self.compiled.matches(&folded)
    }

    fn apply_index(
        &self,
        indexes: &IndexRegistry<K, V>,
        keys: &mut BTreeSet<K>,
    ) -> Result<Option<Box<dyn Filter<K, V>>>>
    where
        K: Ord + Clone,
    {
        // A wholly-literal pattern (no wildcards at all) degrades to an
        // exact-match lookup, which can ride the same inverted index as
        // `Equals`. Anything containing `%`/`_` falls back to a full
        // entry-by-entry scan; there is no posting-list shape that
        // represents "matches a wildcard pattern".
        match self.compiled.as_literal() {
            Some(literal) => {
                Equals::new(self.extractor.clone(), literal).apply_index(indexes, keys)
            }
            None => Ok(Some(self.box_clone())),
        }
    }

    fn box_clone(&self) -> Box<dyn Filter<K, V>> {
        Box::new(Like {
            extractor: self.extractor.clone(),
            pattern_text: self.pattern_text.clone(),
            escape: self.escape,
            ignore_case: self.ignore_case,
            compiled: self.compiled.clone(),
            _marker: std::marker::PhantomData,
        })
    }
}

#[cfg(test)]
#[path = "like_test.rs"]
mod like_test;

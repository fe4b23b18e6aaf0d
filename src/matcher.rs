//! Compiled token matching
//!
//! A [`CompiledMatcher`] freezes the enabled token definitions into priority
//! buckets. Within a bucket, literal lexemes match first with maximal munch
//! (longest literal wins, via length-bucketed maps), then regex patterns in
//! registration order. Buckets are tried lowest priority number first, so a
//! function name like `sin` can outrank the single-letter name pattern.
//!
//! [`Scanner`] walks an input string against a compiled matcher, skipping
//! whitespace between tokens and reporting the byte offset of anything it
//! cannot match.
use crate::error::ParseError;
use crate::parser::TokenDef;
use fnv::FnvHashMap;
use regex::Regex;
use std::collections::BTreeMap;

/// Literal lexemes of one priority bucket, bucketed by byte length
///
/// Lookup scans lengths longest-first so `<=` always beats `<`.
#[derive(Debug)]
struct LexemeMap {
    by_len: Vec<(usize, FnvHashMap<String, String>)>,
}

impl LexemeMap {
    fn build(entries: Vec<(String, String)>) -> Self {
        let mut grouped: BTreeMap<usize, FnvHashMap<String, String>> = BTreeMap::new();
        for (lexeme, id) in entries {
            grouped
                .entry(lexeme.len())
                .or_default()
                .entry(lexeme)
                .or_insert(id);
        }
        LexemeMap {
            by_len: grouped.into_iter().rev().collect(),
        }
    }

    fn longest_match<'m>(&'m self, input: &str) -> Option<(&'m str, usize)> {
        for (len, map) in &self.by_len {
            // get() rejects prefixes that split a char boundary
            if let Some(prefix) = input.get(..*len) {
                if let Some(id) = map.get(prefix) {
                    return Some((id, *len));
                }
            }
        }
        None
    }
}

#[derive(Debug)]
struct Bucket {
    literals: LexemeMap,
    patterns: Vec<(Regex, String)>,
}

impl Bucket {
    fn try_match<'m>(&'m self, input: &str) -> Option<(&'m str, usize)> {
        if let Some(hit) = self.literals.longest_match(input) {
            return Some(hit);
        }
        for (re, id) in &self.patterns {
            if let Some(found) = re.find(input) {
                // zero-length matches would stall the scanner
                if !found.is_empty() {
                    return Some((id, found.end()));
                }
            }
        }
        None
    }
}

/// The frozen matcher for one grammar configuration
///
/// Compiled lazily by the parser when the token registry has changed, and
/// never mutated during a parse.
#[derive(Debug)]
pub(crate) struct CompiledMatcher {
    buckets: Vec<Bucket>,
}

impl CompiledMatcher {
    /// Compile the given (enabled) definitions
    pub(crate) fn compile<'a>(
        defs: impl Iterator<Item = &'a TokenDef>,
    ) -> Result<Self, ParseError> {
        let mut grouped: BTreeMap<u32, (Vec<(String, String)>, Vec<(Regex, String)>)> =
            BTreeMap::new();
        for def in defs {
            let (literals, patterns) = grouped.entry(def.priority).or_default();
            for lexeme in &def.literals {
                literals.push((lexeme.clone(), def.id.clone()));
            }
            if let Some(raw) = &def.pattern {
                let re = Regex::new(&format!("^(?:{raw})")).map_err(|err| {
                    ParseError::Pattern {
                        id: def.id.clone(),
                        detail: err.to_string(),
                    }
                })?;
                patterns.push((re, def.id.clone()));
            }
        }
        Ok(CompiledMatcher {
            buckets: grouped
                .into_values()
                .map(|(literals, patterns)| Bucket {
                    literals: LexemeMap::build(literals),
                    patterns,
                })
                .collect(),
        })
    }

    /// Scan an input string
    pub(crate) fn scan<'m, 's>(&'m self, input: &'s str) -> Scanner<'m, 's> {
        Scanner {
            matcher: self,
            rest: input,
            offset: 0,
        }
    }

    fn try_match<'m>(&'m self, input: &str) -> Option<(&'m str, usize)> {
        self.buckets
            .iter()
            .find_map(|bucket| bucket.try_match(input))
    }
}

/// One matched token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Scanned<'m, 's> {
    /// The id of the definition that matched
    pub id: &'m str,
    /// The matched text
    pub text: &'s str,
    /// Byte offset of the match in the original input
    pub offset: usize,
}

/// Iterator over the tokens of one input string
pub(crate) struct Scanner<'m, 's> {
    matcher: &'m CompiledMatcher,
    rest: &'s str,
    offset: usize,
}

impl<'m, 's> Iterator for Scanner<'m, 's> {
    type Item = Result<Scanned<'m, 's>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let trimmed = self.rest.trim_start();
        self.offset += self.rest.len() - trimmed.len();
        self.rest = trimmed;
        if self.rest.is_empty() {
            return None;
        }
        match self.matcher.try_match(self.rest) {
            Some((id, len)) => {
                let scanned = Scanned {
                    id,
                    text: &self.rest[..len],
                    offset: self.offset,
                };
                self.rest = &self.rest[len..];
                self.offset += len;
                Some(Ok(scanned))
            }
            None => {
                let found: String = self.rest.chars().take(1).collect();
                self.rest = "";
                Some(Err(ParseError::Lexical {
                    found,
                    offset: self.offset,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CompiledMatcher;
    use crate::parser::TokenDef;
    use crate::stack::Item;
    use assert_matches::assert_matches;
    use crate::error::ParseError;

    fn noop(_: &TokenDef, _: &str) -> Item {
        Item::End
    }

    fn defs() -> Vec<TokenDef> {
        vec![
            TokenDef::new("sin", 10, noop).with_literals(["sin"]),
            TokenDef::new("rel", 30, noop).with_literals(["<", "<="]),
            TokenDef::new("plus", 30, noop).with_literals(["+"]),
            TokenDef::new("number", 50, noop).with_pattern(r"\d+\.?\d*|\.\d+"),
            TokenDef::new("name", 60, noop).with_pattern("[A-Za-z]"),
        ]
    }

    fn scan_ids(input: &str) -> Vec<(String, String)> {
        let defs = defs();
        let matcher = CompiledMatcher::compile(defs.iter()).unwrap();
        matcher
            .scan(input)
            .map(|tok| {
                let tok = tok.unwrap();
                (tok.id.to_owned(), tok.text.to_owned())
            })
            .collect()
    }

    #[test]
    fn literals_use_maximal_munch() {
        assert_eq!(
            scan_ids("x<=y"),
            [
                ("name".to_owned(), "x".to_owned()),
                ("rel".to_owned(), "<=".to_owned()),
                ("name".to_owned(), "y".to_owned()),
            ]
        );
    }

    #[test]
    fn lower_priority_wins_over_patterns() {
        // "sin" outranks three single-letter names
        assert_eq!(
            scan_ids("sine"),
            [
                ("sin".to_owned(), "sin".to_owned()),
                ("name".to_owned(), "e".to_owned()),
            ]
        );
    }

    #[test]
    fn numbers_match_greedily() {
        assert_eq!(
            scan_ids("3.14+.5"),
            [
                ("number".to_owned(), "3.14".to_owned()),
                ("plus".to_owned(), "+".to_owned()),
                ("number".to_owned(), ".5".to_owned()),
            ]
        );
    }

    #[test]
    fn whitespace_skipped_and_offsets_tracked() {
        let defs = defs();
        let matcher = CompiledMatcher::compile(defs.iter()).unwrap();
        let offsets: Vec<_> = matcher
            .scan("  x + 12")
            .map(|tok| tok.unwrap().offset)
            .collect();
        assert_eq!(offsets, [2, 4, 6]);
    }

    #[test]
    fn unmatched_input_reports_offset() {
        let defs = defs();
        let matcher = CompiledMatcher::compile(defs.iter()).unwrap();
        let err = matcher.scan("x ?").nth(1).unwrap();
        assert_matches!(
            err,
            Err(ParseError::Lexical { found, offset: 2 }) if found == "?"
        );
    }

    #[test]
    fn bad_patterns_fail_compilation() {
        let defs = vec![TokenDef::new("broken", 10, noop).with_pattern("(")];
        assert_matches!(
            CompiledMatcher::compile(defs.iter()),
            Err(ParseError::Pattern { id, .. }) if id == "broken"
        );
    }
}

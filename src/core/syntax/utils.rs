//! Helpers for slicing leaf payloads and token streams.

use super::bracket::Entry;
use super::token::{join_tokens, Bracket, Delimiter, Symbol, Token};

fn is_separator(entry: &Entry, separator: Symbol) -> bool {
    entry
        .token()
        .and_then(Token::symbol_kind)
        .map_or(false, |s| s == separator)
}

/// Split a payload on every top-level `separator`. Empty pieces are kept so
/// callers decide whether `[1,,2]` means anything.
pub fn split_entries(entries: &[Entry], separator: Symbol) -> Vec<&[Entry]> {
    entries
        .split(|e| is_separator(e, separator))
        .collect()
}

/// Split a payload on its first top-level `separator`.
pub fn split_first(entries: &[Entry], separator: Symbol) -> Option<(&[Entry], &[Entry])> {
    let pos = entries.iter().position(|e| is_separator(e, separator))?;
    Some((&entries[..pos], &entries[pos + 1..]))
}

/// Strip leading and trailing whitespace entries.
pub fn trim_entries(entries: &[Entry]) -> &[Entry] {
    let start = entries
        .iter()
        .position(|e| !e.is_space())
        .unwrap_or(entries.len());
    let end = entries
        .iter()
        .rposition(|e| !e.is_space())
        .map_or(start, |i| i + 1);
    &entries[start..end]
}

/// Merge every quoted run, quotes included, into a single span token. An
/// unterminated quote leaves the rest of the stream untouched.
pub fn group_quotes(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut pending: Vec<Token> = Vec::new();
    let mut open: Option<Delimiter> = None;

    for token in tokens {
        let bracket = token.bracket();
        match open {
            None => {
                if let Some(Bracket::Quote(d)) = bracket {
                    open = Some(d);
                    pending.push(token);
                } else {
                    out.push(token);
                }
            }
            Some(d) => {
                pending.push(token);
                if bracket == Some(Bracket::Quote(d)) {
                    let offset = pending[0].offset;
                    out.push(Token::span(join_tokens(&pending), offset));
                    pending.clear();
                    open = None;
                }
            }
        }
    }

    out.extend(pending);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::syntax::bracket::BracketTree;
    use crate::core::syntax::lexer::tokenize;

    #[test]
    fn test_split_entries_top_level_only() {
        let tree = BracketTree::structural(tokenize("1, [2, 3], ,4"));
        let pieces = split_entries(&tree.root().entries, Symbol::Comma);
        assert_eq!(pieces.len(), 4);
        assert_eq!(tree.rebuild_entries(trim_entries(pieces[1])), "[2, 3]");
        assert!(trim_entries(pieces[2]).is_empty());
    }

    #[test]
    fn test_split_first_colon() {
        let tree = BracketTree::structural(tokenize("url: 'http://x' : y"));
        let (key, value) = split_first(&tree.root().entries, Symbol::Colon).unwrap();
        assert_eq!(tree.rebuild_entries(key), "url");
        assert_eq!(tree.rebuild_entries(trim_entries(value)), "'http://x' : y");
        assert!(split_first(&tree.root().entries[..1], Symbol::Colon).is_none());
    }

    #[test]
    fn test_group_quotes() {
        let grouped = group_quotes(tokenize("\"a + b\" + 'c'"));
        let texts: Vec<_> = grouped.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["\"a + b\"", " ", "+", " ", "'c'"]);
        assert!(grouped[0].is_quoted());

        let unterminated = tokenize("1 + \"x");
        let grouped = group_quotes(unterminated.clone());
        assert_eq!(join_tokens(&grouped), "1 + \"x");
        assert!(grouped.iter().any(|t| t.is_quote()));
    }
}

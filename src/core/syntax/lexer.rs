//! Tokenizer for the value notation.
//!
//! Converts raw text into a stream of [`Token`]s in four passes:
//! - split on every recognized symbol, keeping the symbols
//! - re-merge numbers that the split tore apart, and fuse a leading `-`
//!   onto a number when it starts an operand
//! - fuse member-access chains (`a.b`, `rows[0].name`)
//! - drop empty tokens
//!
//! Spaces are kept as tokens so any span can be rebuilt verbatim.

use indexmap::IndexSet;

use super::token::{
    is_number_literal, join_tokens, Bracket, Delimiter, Operator, Symbol, Token, TokenKind,
    SYMBOLS,
};

/// The symbol-splitting pass over raw text.
pub struct Lexer<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    /// Run all passes.
    pub fn tokenize(mut self) -> Vec<Token> {
        let split = self.split_symbols();
        let merged = fuse_unary_minus(merge_decimals(split));
        let fused = fuse_member_access(merged);
        fused
            .into_iter()
            .filter(|t| !t.text.is_empty())
            .map(recognize_null)
            .collect()
    }

    /// Recognize the symbol starting at `offset`, preferring two-character
    /// operators.
    fn symbol_at(&self, offset: usize, c: char) -> Option<(Symbol, usize)> {
        if c.is_whitespace() {
            return Some((Symbol::Space, c.len_utf8()));
        }
        let rest = &self.input[offset..];
        if rest.len() >= 2 && rest.is_char_boundary(2) {
            if let Some(symbol) = SYMBOLS.get(&rest[..2]) {
                return Some((*symbol, 2));
            }
        }
        let one = &rest[..c.len_utf8()];
        SYMBOLS.get(one).map(|symbol| (*symbol, one.len()))
    }

    fn split_symbols(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut span_start: Option<usize> = None;

        while let Some(&(offset, c)) = self.chars.peek() {
            match self.symbol_at(offset, c) {
                Some((symbol, len)) => {
                    if let Some(start) = span_start.take() {
                        tokens.push(Token::span(&self.input[start..offset], start));
                    }
                    let end = offset + len;
                    tokens.push(Token::symbol(symbol, &self.input[offset..end], offset));
                    while matches!(self.chars.peek(), Some(&(i, _)) if i < end) {
                        self.chars.next();
                    }
                }
                None => {
                    span_start.get_or_insert(offset);
                    self.chars.next();
                }
            }
        }

        if let Some(start) = span_start {
            tokens.push(Token::span(&self.input[start..], start));
        }
        tokens
    }
}

/// Tokenize `input`.
pub fn tokenize(input: &str) -> Vec<Token> {
    let tokens = Lexer::new(input).tokenize();
    log::trace!("tokenized {:?} into {} tokens", input, tokens.len());
    tokens
}

fn recognize_null(token: Token) -> Token {
    if token.is_span() && super::token::is_null_literal(&token.text) {
        Token::symbol(Symbol::Null, token.text, token.offset)
    } else {
        token
    }
}

/// `5e` in `5e-3`.
fn is_exponent_head(text: &str) -> bool {
    match text.strip_suffix(|c: char| c == 'e' || c == 'E') {
        Some(mantissa) => !mantissa.is_empty() && is_number_literal(mantissa),
        None => false,
    }
}

/// Digits that may continue a decimal, possibly with an exponent.
fn is_fraction_tail(token: &Token) -> bool {
    token.is_span()
        && token.text.starts_with(|c: char| c.is_ascii_digit())
        && (is_number_literal(&token.text) || is_exponent_head(&token.text))
}

fn merge_decimals(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut iter = tokens.into_iter().peekable();

    while let Some(token) = iter.next() {
        // `3` `.` `14` and a leading `.` `5`
        if token.is_dot() && iter.peek().map_or(false, is_fraction_tail) {
            let prev_digits = out.last().map_or(false, Token::is_digits);
            let prev_span = out.last().map_or(false, Token::is_span);
            if prev_digits || !prev_span {
                if let Some(tail) = iter.next() {
                    match out.last_mut() {
                        Some(last) if prev_digits => {
                            last.text.push('.');
                            last.text.push_str(&tail.text);
                        }
                        _ => out.push(Token::span(format!(".{}", tail.text), token.offset)),
                    }
                    continue;
                }
            }
        }

        // `1e` `-` `5`
        if matches!(token.operator(), Some(Operator::Add | Operator::Sub))
            && out
                .last()
                .map_or(false, |t| t.is_span() && is_exponent_head(&t.text))
            && iter.peek().map_or(false, Token::is_digits)
        {
            if let (Some(last), Some(exponent)) = (out.last_mut(), iter.next()) {
                last.text.push_str(&token.text);
                last.text.push_str(&exponent.text);
                continue;
            }
        }

        out.push(token);
    }
    out
}

/// Whether a `-` following `prev` (the previous non-space token) begins a
/// new operand instead of subtracting.
pub(crate) fn starts_operand(prev: Option<&Token>) -> bool {
    match prev {
        None => true,
        Some(t) => {
            t.is_operator()
                || t.is_comma()
                || t.is_colon()
                || t.bracket().map_or(false, |b| b.is_opening())
        }
    }
}

/// Fuse a `-` that starts an operand into a directly following unsigned
/// number. Source text is kept intact: `--2` stays `-`, `-2`.
pub(crate) fn fuse_unary_minus(tokens: Vec<Token>) -> Vec<Token> {
    fuse_minus(tokens, false)
}

/// Like [`fuse_unary_minus`], but also folds a `-` into a signed number, so
/// `- -2` becomes `2`. For evaluator atoms only.
pub(crate) fn fold_unary_minus(tokens: Vec<Token>) -> Vec<Token> {
    fuse_minus(tokens, true)
}

fn fuse_minus(tokens: Vec<Token>, fold_signed: bool) -> Vec<Token> {
    // Right to left; `out` is built in reverse
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());

    for (i, token) in tokens.iter().enumerate().rev() {
        let before_number = out.last().map_or(false, |next| {
            next.is_number() && (fold_signed || !next.text.starts_with(['-', '+']))
        });
        if before_number
            && token.operator() == Some(Operator::Sub)
            && starts_operand(tokens[..i].iter().rev().find(|t| !t.is_space()))
        {
            if let Some(number) = out.pop() {
                out.push(Token::span(negate(&number.text), token.offset));
                continue;
            }
        }
        out.push(token.clone());
    }
    out.reverse();
    out
}

fn negate(text: &str) -> String {
    match text.strip_prefix('-') {
        Some(magnitude) => magnitude.to_string(),
        None => format!("-{}", text.trim_start_matches('+')),
    }
}

fn starts_identifier(text: &str) -> bool {
    text.starts_with(|c: char| c.is_alphabetic() || c == '_')
}

/// Index of the `]` closing the subscript opened at `open`. Subscripts never
/// cross a quote.
fn matching_subscript(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        if token.is_quote() {
            return None;
        }
        if token.is_open(Delimiter::Square) {
            depth += 1;
        } else if token.is_close(Delimiter::Square) {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

fn fuse_member_access(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];

        if token.is_dot() {
            let next = tokens.get(i + 1).filter(|t| t.is_span());
            if let (Some(last), Some(next)) = (out.last_mut().filter(|t| t.is_span()), next) {
                last.text.push('.');
                last.text.push_str(&next.text);
                i += 2;
                continue;
            }
        }

        if token.is_open(Delimiter::Square) {
            let subscripted = out
                .last()
                .map_or(false, |t| t.is_span() && starts_identifier(&t.text));
            if let (true, Some(end)) = (subscripted, matching_subscript(&tokens, i)) {
                if let Some(last) = out.last_mut() {
                    last.text.push_str(&join_tokens(&tokens[i..=end]));
                    i = end + 1;
                    continue;
                }
            }
        }

        out.push(token.clone());
        i += 1;
    }
    out
}

/// Contents of the top-level `[...]` subscripts of a fused span.
fn subscripts(text: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '[' => {
                if depth == 0 {
                    start = i + 1;
                }
                depth += 1;
            }
            ']' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    found.push(&text[start..i]);
                }
            }
            _ => {}
        }
    }
    found
}

/// Every span in `tokens` that is not a number, boolean or `Null`, outside
/// quotes, in order of first appearance. Subscripts are searched too, so
/// `grid[row]` reports both `grid[row]` and `row`.
pub fn unrecognized_symbols(tokens: &[Token]) -> Vec<String> {
    let mut found = IndexSet::new();
    collect_unrecognized(tokens, &mut found);
    found.into_iter().collect()
}

fn collect_unrecognized(tokens: &[Token], found: &mut IndexSet<String>) {
    let mut quote: Option<Delimiter> = None;
    for token in tokens {
        if let TokenKind::Symbol(Symbol::Bracket(Bracket::Quote(d))) = token.kind {
            quote = match quote {
                Some(open) if open == d => None,
                None => Some(d),
                still_open => still_open,
            };
            continue;
        }
        if quote.is_some() || !token.is_word() {
            continue;
        }
        found.insert(token.text.clone());
        for inner in subscripts(&token.text) {
            collect_unrecognized(&tokenize(inner), found);
        }
    }
}

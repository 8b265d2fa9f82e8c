//! Token definitions for the value notation.
//!
//! The tokenizer only knows a fixed table of symbols. Everything else is an
//! unrecognized span which later passes classify as a number, a boolean, a
//! variable name or plain text.

use std::fmt;

use lazy_static::lazy_static;
use phf::phf_map;
use regex::Regex;

/// A matched delimiter pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delimiter {
    /// `( )`: sets and arithmetic grouping
    Paren,
    /// `[ ]`: lists
    Square,
    /// `{ }`: dictionaries
    Curly,
    /// `" "`
    DoubleQuote,
    /// `' '`
    SingleQuote,
}

impl Delimiter {
    /// All delimiters the value parser tracks.
    pub const STRUCTURAL: [Delimiter; 5] = [
        Delimiter::Paren,
        Delimiter::Square,
        Delimiter::Curly,
        Delimiter::DoubleQuote,
        Delimiter::SingleQuote,
    ];

    pub fn open_char(&self) -> char {
        match self {
            Delimiter::Paren => '(',
            Delimiter::Square => '[',
            Delimiter::Curly => '{',
            Delimiter::DoubleQuote => '"',
            Delimiter::SingleQuote => '\'',
        }
    }

    pub fn close_char(&self) -> char {
        match self {
            Delimiter::Paren => ')',
            Delimiter::Square => ']',
            Delimiter::Curly => '}',
            Delimiter::DoubleQuote => '"',
            Delimiter::SingleQuote => '\'',
        }
    }

    /// Quotes never nest: the next quote of the same kind always closes.
    pub fn is_quote(&self) -> bool {
        matches!(self, Delimiter::DoubleQuote | Delimiter::SingleQuote)
    }
}

/// One of the eight bracket and quote characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bracket {
    Open(Delimiter),
    Close(Delimiter),
    /// A quote character; whether it opens or closes depends on context.
    Quote(Delimiter),
}

impl Bracket {
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c {
            '(' => Bracket::Open(Delimiter::Paren),
            ')' => Bracket::Close(Delimiter::Paren),
            '[' => Bracket::Open(Delimiter::Square),
            ']' => Bracket::Close(Delimiter::Square),
            '{' => Bracket::Open(Delimiter::Curly),
            '}' => Bracket::Close(Delimiter::Curly),
            '"' => Bracket::Quote(Delimiter::DoubleQuote),
            '\'' => Bracket::Quote(Delimiter::SingleQuote),
            _ => return None,
        })
    }

    pub fn delimiter(&self) -> Delimiter {
        match *self {
            Bracket::Open(d) | Bracket::Close(d) | Bracket::Quote(d) => d,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Bracket::Open(d) | Bracket::Quote(d) => d.open_char(),
            Bracket::Close(d) => d.close_char(),
        }
    }

    pub fn is_opening(&self) -> bool {
        matches!(self, Bracket::Open(_))
    }
}

/// An infix (or, for `!`, prefix) operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Rem,
    Or,
    And,
    Lt,
    Le,
    Gt,
    Ge,
    Ne,
    Eq,
    Not,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Pow => "^",
            Operator::Rem => "%",
            Operator::Or => "||",
            Operator::And => "&&",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Ne => "!=",
            Operator::Eq => "==",
            Operator::Not => "!",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match SYMBOLS.get(s) {
            Some(Symbol::Operator(op)) => Some(*op),
            _ => None,
        }
    }

    /// Precedence tier, 1 binds tightest.
    pub fn tier(&self) -> u8 {
        match self {
            Operator::Pow => 1,
            Operator::Mul | Operator::Div | Operator::Rem => 2,
            Operator::Add | Operator::Sub => 3,
            Operator::Lt
            | Operator::Le
            | Operator::Gt
            | Operator::Ge
            | Operator::Eq
            | Operator::Ne
            | Operator::Not
            | Operator::Or
            | Operator::And => 4,
        }
    }

    /// `!` takes only a right operand.
    pub fn is_prefix(&self) -> bool {
        matches!(self, Operator::Not)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recognized symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// Any whitespace character
    Space,
    Bracket(Bracket),
    Operator(Operator),
    Dot,
    Comma,
    Colon,
    /// The literal `Null`
    Null,
}

/// Fixed symbol table. Two-character entries must be tried before
/// one-character ones.
pub static SYMBOLS: phf::Map<&'static str, Symbol> = phf_map! {
    "(" => Symbol::Bracket(Bracket::Open(Delimiter::Paren)),
    ")" => Symbol::Bracket(Bracket::Close(Delimiter::Paren)),
    "[" => Symbol::Bracket(Bracket::Open(Delimiter::Square)),
    "]" => Symbol::Bracket(Bracket::Close(Delimiter::Square)),
    "{" => Symbol::Bracket(Bracket::Open(Delimiter::Curly)),
    "}" => Symbol::Bracket(Bracket::Close(Delimiter::Curly)),
    "\"" => Symbol::Bracket(Bracket::Quote(Delimiter::DoubleQuote)),
    "'" => Symbol::Bracket(Bracket::Quote(Delimiter::SingleQuote)),
    "+" => Symbol::Operator(Operator::Add),
    "-" => Symbol::Operator(Operator::Sub),
    "*" => Symbol::Operator(Operator::Mul),
    "/" => Symbol::Operator(Operator::Div),
    "^" => Symbol::Operator(Operator::Pow),
    "%" => Symbol::Operator(Operator::Rem),
    "||" => Symbol::Operator(Operator::Or),
    "&&" => Symbol::Operator(Operator::And),
    "<" => Symbol::Operator(Operator::Lt),
    "<=" => Symbol::Operator(Operator::Le),
    ">" => Symbol::Operator(Operator::Gt),
    ">=" => Symbol::Operator(Operator::Ge),
    "!=" => Symbol::Operator(Operator::Ne),
    "==" => Symbol::Operator(Operator::Eq),
    "!" => Symbol::Operator(Operator::Not),
    "." => Symbol::Dot,
    "," => Symbol::Comma,
    ":" => Symbol::Colon,
};

lazy_static! {
    static ref INTEGER: Regex = Regex::new(r"^[-+]?\d+$").unwrap();
    static ref FLOAT: Regex =
        Regex::new(r"^[-+]?(\d+\.\d*|\.\d+|\d+)([eE][-+]?\d+)?$").unwrap();
    static ref IDENTIFIER: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z0-9_]+|\[[^\[\]]*(\[[^\[\]]*\][^\[\]]*)*\])*$")
            .unwrap();
}

/// Whether `text` is an integer literal.
pub fn is_integer_literal(text: &str) -> bool {
    INTEGER.is_match(text)
}

/// Whether `text` is a numeric literal (integer, decimal or exponent form).
pub fn is_number_literal(text: &str) -> bool {
    FLOAT.is_match(text)
}

/// Whether `text` is one of the boolean spellings, case-insensitive.
pub fn boolean_literal(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => None,
    }
}

/// Whether `text` spells the null literal.
pub fn is_null_literal(text: &str) -> bool {
    text == "Null" || text == "null"
}

/// Whether `text` can name an expression variable (`a`, `a.b`, `a[0].c`).
pub fn is_variable_name(text: &str) -> bool {
    IDENTIFIER.is_match(text)
}

/// What a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Symbol(Symbol),
    /// Unrecognized text: a number, boolean, variable or word
    Span,
}

/// A single token with its text and byte offset in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub offset: usize,
}

impl Token {
    pub fn symbol(symbol: Symbol, text: impl Into<String>, offset: usize) -> Self {
        Self {
            kind: TokenKind::Symbol(symbol),
            text: text.into(),
            offset,
        }
    }

    pub fn span(text: impl Into<String>, offset: usize) -> Self {
        Self {
            kind: TokenKind::Span,
            text: text.into(),
            offset,
        }
    }

    pub fn symbol_kind(&self) -> Option<Symbol> {
        match self.kind {
            TokenKind::Symbol(s) => Some(s),
            TokenKind::Span => None,
        }
    }

    pub fn is_span(&self) -> bool {
        matches!(self.kind, TokenKind::Span)
    }

    pub fn is_space(&self) -> bool {
        matches!(self.kind, TokenKind::Symbol(Symbol::Space))
    }

    pub fn is_comma(&self) -> bool {
        matches!(self.kind, TokenKind::Symbol(Symbol::Comma))
    }

    pub fn is_colon(&self) -> bool {
        matches!(self.kind, TokenKind::Symbol(Symbol::Colon))
    }

    pub fn is_dot(&self) -> bool {
        matches!(self.kind, TokenKind::Symbol(Symbol::Dot))
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, TokenKind::Symbol(Symbol::Null))
    }

    pub fn operator(&self) -> Option<Operator> {
        match self.kind {
            TokenKind::Symbol(Symbol::Operator(op)) => Some(op),
            _ => None,
        }
    }

    pub fn is_operator(&self) -> bool {
        self.operator().is_some()
    }

    pub fn bracket(&self) -> Option<Bracket> {
        match self.kind {
            TokenKind::Symbol(Symbol::Bracket(b)) => Some(b),
            _ => None,
        }
    }

    pub fn is_open(&self, delimiter: Delimiter) -> bool {
        self.bracket() == Some(Bracket::Open(delimiter))
    }

    pub fn is_close(&self, delimiter: Delimiter) -> bool {
        self.bracket() == Some(Bracket::Close(delimiter))
    }

    pub fn is_quote(&self) -> bool {
        matches!(self.bracket(), Some(Bracket::Quote(_)))
    }

    /// An unrecognized span holding a numeric literal.
    pub fn is_number(&self) -> bool {
        self.is_span() && is_number_literal(&self.text)
    }

    /// An unrecognized span consisting only of ASCII digits.
    pub fn is_digits(&self) -> bool {
        self.is_span() && !self.text.is_empty() && self.text.bytes().all(|b| b.is_ascii_digit())
    }

    pub fn is_boolean(&self) -> bool {
        self.is_span() && boolean_literal(&self.text).is_some()
    }

    /// A span that is a quoted string grouped into one atom.
    pub fn is_quoted(&self) -> bool {
        let mut chars = self.text.chars();
        match (self.is_span(), chars.next(), chars.next_back()) {
            (true, Some(first), Some(last)) => {
                first == last && (first == '"' || first == '\'') && self.text.len() >= 2
            }
            _ => false,
        }
    }

    /// A span that is neither a number, a boolean nor a quoted string.
    pub fn is_word(&self) -> bool {
        self.is_span() && !self.is_number() && !self.is_boolean() && !self.is_quoted()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Concatenate token texts.
pub fn join_tokens<'a>(tokens: impl IntoIterator<Item = &'a Token>) -> String {
    tokens.into_iter().map(|t| t.text.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_table() {
        assert_eq!(SYMBOLS.get("<="), Some(&Symbol::Operator(Operator::Le)));
        assert_eq!(SYMBOLS.get("'"), Some(&Symbol::Bracket(Bracket::Quote(Delimiter::SingleQuote))));
        assert_eq!(SYMBOLS.get("="), None);
        assert_eq!(Operator::from_str("&&"), Some(Operator::And));
        assert_eq!(Operator::from_str(","), None);
    }

    #[test]
    fn test_operator_tiers() {
        assert_eq!(Operator::Pow.tier(), 1);
        assert_eq!(Operator::Rem.tier(), 2);
        assert_eq!(Operator::Sub.tier(), 3);
        assert_eq!(Operator::Or.tier(), 4);
        assert!(Operator::Not.is_prefix());
    }

    #[test]
    fn test_literal_predicates() {
        assert!(is_integer_literal("-42"));
        assert!(!is_integer_literal("4.2"));
        assert!(is_number_literal("4.2"));
        assert!(is_number_literal(".5"));
        assert!(is_number_literal("1e-5"));
        assert!(!is_number_literal("1e"));
        assert_eq!(boolean_literal("YES"), Some(true));
        assert_eq!(boolean_literal("No"), Some(false));
        assert_eq!(boolean_literal("nope"), None);
        assert!(is_null_literal("Null"));
    }

    #[test]
    fn test_variable_names() {
        assert!(is_variable_name("temp"));
        assert!(is_variable_name("temp.a"));
        assert!(is_variable_name("rows[0].name"));
        assert!(is_variable_name("grid[rows[1]]"));
        assert!(!is_variable_name("3abc"));
        assert!(!is_variable_name("a@b"));
    }

    #[test]
    fn test_quoted_span() {
        assert!(Token::span("\"a b\"", 0).is_quoted());
        assert!(Token::span("'x'", 0).is_quoted());
        assert!(!Token::span("\"", 0).is_quoted());
        assert!(!Token::span("'x\"", 0).is_quoted());
    }
}

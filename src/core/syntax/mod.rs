//! Text-level machinery: tokens, the tokenizer and the bracket tree.

pub mod bracket;
pub mod lexer;
pub mod token;
pub mod utils;

pub use bracket::{BracketMismatch, BracketTree, Entry, Leaf, LeafId, ROOT};
pub use lexer::{tokenize, unrecognized_symbols, Lexer};
pub use token::{Bracket, Delimiter, Operator, Symbol, Token, TokenKind};

//! # dynval
//!
//! A dynamically typed value model with a compact text notation.
//!
//! The notation reads like JSON with extras: `( , )` builds a set, bare
//! words are strings, numbers take the narrowest width that holds them and
//! any piece containing an operator is evaluated in place.
//!
//! ## Features
//!
//! - **Values**: Null, Boolean, six numeric widths, String, List, Set,
//!   Dictionary and unevaluated Expressions
//! - **Evaluation**: arithmetic, comparison and logical operators with
//!   automatic numeric widening
//! - **Expressions**: operator chains over identifiers keep their variables
//!   for later binding
//! - **JSON**: lossless interchange for the data kinds via marker keys
//!
//! ## Example
//!
//! ```
//! use dynval::{parse, Value};
//!
//! let value = parse("[1, 'two', (3, 4), {five: 2 + 3}]").unwrap();
//! let list = value.as_list().unwrap();
//! assert_eq!(list.len(), 4);
//! assert!(list.get(2).unwrap().is_set());
//! assert_eq!(
//!     list.get(3).unwrap().as_dict().unwrap().get("five"),
//!     Some(&Value::from(5i8))
//! );
//! ```

pub mod core;
pub mod utils;

pub use crate::core::engine::{
    apply_markers, classify_literal, evaluate, evaluate_value, from_json, parse, parse_json,
    parse_with_config, to_json, to_json_string, total_cmp, Dictionary, EvalConfig, EvalError,
    EvalErrorKind, EvalResult, Evaluator, Expression, List, Number, NumericType, Parser, Set,
    SourceSpan, ValType, Value, Variables,
};
pub use crate::core::syntax::{tokenize, BracketTree, Token};

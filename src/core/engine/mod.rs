//! The value engine.
//!
//! # Architecture
//!
//! ```text
//! notation text
//!        │
//!        ▼
//!    ┌───────────────┐
//!    │    syntax     │  (tokens, bracket tree)
//!    └───────────────┘
//!        │
//!        ▼
//!    ┌───────────────┐        ┌───────────────┐
//!    │    Parser     │ ─────▶ │   Evaluator   │  (operator pieces)
//!    └───────────────┘        └───────────────┘
//!        │
//!        ▼
//!      Value ◀──▶ JSON
//! ```
//!
//! # Example
//!
//! ```
//! use dynval::parse;
//!
//! let value = parse("{name: 'Ada', scores: [(2 * 3), 7.5]}").unwrap();
//! assert_eq!(value.to_notation(), r#"{"name": "Ada", "scores": [6, 7.5]}"#);
//! ```

mod data;
mod eval;
mod library;
mod ops;
mod parse;
mod scope;
mod value;

pub use data::{from_json, parse_json, to_json, to_json_string};
pub use eval::{evaluate, evaluate_value, EvalConfig, Evaluator};
pub use library::total_cmp;
pub use ops::{add, binary, compare, not};
pub use parse::{apply_markers, classify_literal, parse, parse_with_config, Parser};
pub use scope::Variables;
pub use value::{
    is_marker_key, quote_str, Dictionary, EvalError, EvalErrorKind, EvalResult, Expression,
    List, Number, NumericError, NumericType, Set, SourceSpan, ValType, Value, CLASS_NAME_KEY,
    LIST_MARKER, SET_MARKER, VALUE_MARKER,
};

//! Value types for the notation engine.
//!
//! This module defines the dynamically-typed [`Value`] every parse produces,
//! its container types and the error types shared across the engine.

use std::fmt;

use indexmap::IndexMap;

pub use dynval_numeric::{Number, NumericError, NumericType};

use super::scope::Variables;
use crate::core::syntax::token::{Bracket, Operator};

/// Key promoting a dictionary's string value to its type name.
pub const CLASS_NAME_KEY: &str = "ClassName";
/// Single-key wrapper around an arbitrary value.
pub const VALUE_MARKER: &str = "__value__";
/// Single-key wrapper around a list.
pub const LIST_MARKER: &str = "__list__";
/// Single-key wrapper turning a list into a set.
pub const SET_MARKER: &str = "__set__";

/// Whether `key` is one of the wrapper keys.
pub fn is_marker_key(key: &str) -> bool {
    matches!(key, VALUE_MARKER | LIST_MARKER | SET_MARKER)
}

// ============================================================================
// Containers
// ============================================================================

/// An ordered sequence keyed by contiguous ordinals starting at 0.
#[derive(Debug, Clone, Default)]
pub struct List {
    pub(crate) items: Vec<Value>,
    pub(crate) class_name: Option<String>,
}

impl List {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<Value>) -> Self {
        Self {
            items,
            class_name: None,
        }
    }

    pub fn with_class_name(mut self, name: impl Into<String>) -> Self {
        self.class_name = Some(name.into());
        self
    }

    /// Custom type name, if one was set.
    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn type_name(&self) -> &str {
        self.class_name().unwrap_or("List")
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.items.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.items
    }

    /// Ordinal keys: `"0"`, `"1"`, ...
    pub fn keys(&self) -> impl Iterator<Item = String> {
        (0..self.items.len()).map(|i| i.to_string())
    }

    pub fn into_items(self) -> Vec<Value> {
        self.items
    }
}

/// A sequence whose reads always hand out deep copies.
///
/// Order and duplicates are kept exactly as given.
#[derive(Debug, Clone, Default)]
pub struct Set {
    pub(crate) items: Vec<Value>,
    pub(crate) class_name: Option<String>,
}

impl Set {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<Value>) -> Self {
        Self {
            items,
            class_name: None,
        }
    }

    pub fn with_class_name(mut self, name: impl Into<String>) -> Self {
        self.class_name = Some(name.into());
        self
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn type_name(&self) -> &str {
        self.class_name().unwrap_or("Set")
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// A copy of the element at `index`.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.items.get(index).cloned()
    }

    /// Copies of every element, in order.
    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        self.items.iter().cloned()
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.items.clone()
    }

    pub fn keys(&self) -> impl Iterator<Item = String> {
        (0..self.items.len()).map(|i| i.to_string())
    }

    pub fn into_items(self) -> Vec<Value> {
        self.items
    }
}

/// A string-keyed map. Insertion order is kept for rendering only.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    pub(crate) entries: IndexMap<String, Value>,
    pub(crate) class_name: Option<String>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: IndexMap<String, Value>) -> Self {
        Self {
            entries,
            class_name: None,
        }
    }

    pub fn with_class_name(mut self, name: impl Into<String>) -> Self {
        self.class_name = Some(name.into());
        self
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn type_name(&self) -> &str {
        self.class_name().unwrap_or("Dictionary")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> IndexMap<String, Value> {
        self.entries
    }
}

/// Unevaluated expression text together with its variables.
#[derive(Debug, Clone)]
pub struct Expression {
    text: String,
    variables: Variables,
}

impl Expression {
    pub fn new<I, S>(text: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            text: text.into(),
            variables: Variables::declared(names),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    /// Bind one of the expression's variables.
    pub fn assign(&mut self, name: &str, value: Value) -> EvalResult<()> {
        self.variables.assign(name, value)
    }

    pub fn is_resolved(&self) -> bool {
        self.variables.is_resolved()
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text && self.variables.names().eq(other.variables.names())
    }
}

// ============================================================================
// Value
// ============================================================================

/// A dynamically-typed value.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    Str(String),
    List(List),
    Set(Set),
    Dict(Dictionary),
    /// A lone `.`, `,` or `:`
    Symbol(String),
    /// A lone operator
    Operator(Operator),
    /// A lone bracket character
    Bracket(Bracket),
    Expression(Expression),
}

/// The structural kind of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValType {
    Null,
    Bool,
    Byte,
    Short,
    Int32,
    Int64,
    Float32,
    Float64,
    Str,
    List,
    Set,
    Dict,
    Symbol,
    Operator,
    Bracket,
    Expression,
}

impl ValType {
    pub fn name(&self) -> &'static str {
        match self {
            ValType::Null => "Null",
            ValType::Bool => "Boolean",
            ValType::Byte => "Byte",
            ValType::Short => "Short",
            ValType::Int32 => "Int32",
            ValType::Int64 => "Int64",
            ValType::Float32 => "Float32",
            ValType::Float64 => "Float64",
            ValType::Str => "String",
            ValType::List => "List",
            ValType::Set => "Set",
            ValType::Dict => "Dictionary",
            ValType::Symbol => "Symbol",
            ValType::Operator => "Operator",
            ValType::Bracket => "Bracket",
            ValType::Expression => "Expression",
        }
    }

    fn of_number(ty: NumericType) -> Self {
        match ty {
            NumericType::Byte => ValType::Byte,
            NumericType::Short => ValType::Short,
            NumericType::Int32 => ValType::Int32,
            NumericType::Int64 => ValType::Int64,
            NumericType::Float32 => ValType::Float32,
            NumericType::Float64 => ValType::Float64,
        }
    }
}

impl fmt::Display for ValType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}({})", n.numeric_type(), n),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::List(list) => {
                if let Some(name) = list.class_name() {
                    write!(f, "{}", name)?;
                }
                f.debug_list().entries(list.iter()).finish()
            }
            Value::Set(set) => {
                write!(f, "{}", set.type_name())?;
                f.debug_set().entries(set.items.iter()).finish()
            }
            Value::Dict(dict) => {
                if let Some(name) = dict.class_name() {
                    write!(f, "{}", name)?;
                }
                f.debug_map().entries(dict.iter()).finish()
            }
            Value::Symbol(s) => write!(f, "Symbol({})", s),
            Value::Operator(op) => write!(f, "Operator({})", op),
            Value::Bracket(b) => write!(f, "Bracket({})", b.as_char()),
            Value::Expression(e) => {
                write!(f, "Expression({:?}, ", e.text())?;
                f.debug_list().entries(e.variables().names()).finish()?;
                write!(f, ")")
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                a.type_name() == b.type_name() && a.items == b.items
            }
            (Value::Set(a), Value::Set(b)) => {
                a.type_name() == b.type_name() && a.items == b.items
            }
            (Value::Dict(a), Value::Dict(b)) => {
                a.type_name() == b.type_name()
                    && a.len() == b.len()
                    && a.iter().all(|(k, v)| b.get(k) == Some(v))
            }
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Operator(a), Value::Operator(b)) => a == b,
            (Value::Bracket(a), Value::Bracket(b)) => a == b,
            (Value::Expression(a), Value::Expression(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// Get the structural kind of this value.
    pub fn val_type(&self) -> ValType {
        match self {
            Value::Null => ValType::Null,
            Value::Bool(_) => ValType::Bool,
            Value::Number(n) => ValType::of_number(n.numeric_type()),
            Value::Str(_) => ValType::Str,
            Value::List(_) => ValType::List,
            Value::Set(_) => ValType::Set,
            Value::Dict(_) => ValType::Dict,
            Value::Symbol(_) => ValType::Symbol,
            Value::Operator(_) => ValType::Operator,
            Value::Bracket(_) => ValType::Bracket,
            Value::Expression(_) => ValType::Expression,
        }
    }

    /// The type name: a container's custom name when set, the structural
    /// name otherwise.
    pub fn type_name(&self) -> &str {
        match self {
            Value::List(list) => list.type_name(),
            Value::Set(set) => set.type_name(),
            Value::Dict(dict) => dict.type_name(),
            _ => self.val_type().name(),
        }
    }

    /// Override the type name of a container.
    pub fn set_type_name(&mut self, name: impl Into<String>) -> EvalResult<()> {
        let name = Some(name.into());
        match self {
            Value::List(list) => list.class_name = name,
            Value::Set(set) => set.class_name = name,
            Value::Dict(dict) => dict.class_name = name,
            other => {
                return Err(EvalError::wrong_input(
                    "List, Set or Dictionary",
                    other.type_name(),
                ))
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Predicates
    // ------------------------------------------------------------------------

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, Value::Number(n) if n.is_integral())
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, Value::Number(n) if n.is_floating())
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Value::Set(_))
    }

    pub fn is_dict(&self) -> bool {
        matches!(self, Value::Dict(_))
    }

    /// List, Set or Dictionary.
    pub fn is_container(&self) -> bool {
        matches!(self, Value::List(_) | Value::Set(_) | Value::Dict(_))
    }

    pub fn is_expression(&self) -> bool {
        matches!(self, Value::Expression(_))
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, Value::Symbol(_))
    }

    pub fn is_operator(&self) -> bool {
        matches!(self, Value::Operator(_))
    }

    pub fn is_bracket(&self) -> bool {
        matches!(self, Value::Bracket(_))
    }

    /// Null, boolean, number or string: the values an expression variable
    /// can be substituted with.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::Str(_)
        )
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn as_bool(&self) -> EvalResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            _ => Err(EvalError::wrong_input("Boolean", self.type_name())),
        }
    }

    pub fn as_number(&self) -> EvalResult<Number> {
        match self {
            Value::Number(n) => Ok(*n),
            _ => Err(EvalError::wrong_input("number", self.type_name())),
        }
    }

    /// The value as an `i64`; floats must be whole and in range.
    pub fn as_i64(&self) -> EvalResult<i64> {
        match self {
            Value::Number(n) if n.can_narrow_to(NumericType::Int64) => n
                .cast(NumericType::Int64)
                .as_i64()
                .ok_or_else(|| EvalError::wrong_input("integral number", self.type_name())),
            _ => Err(EvalError::wrong_input("integral number", self.type_name())),
        }
    }

    pub fn as_f64(&self) -> EvalResult<f64> {
        match self {
            Value::Number(n) => Ok(n.as_f64()),
            _ => Err(EvalError::wrong_input("number", self.type_name())),
        }
    }

    pub fn as_str(&self) -> EvalResult<&str> {
        match self {
            Value::Str(s) => Ok(s),
            _ => Err(EvalError::wrong_input("String", self.type_name())),
        }
    }

    pub fn as_list(&self) -> EvalResult<&List> {
        match self {
            Value::List(list) => Ok(list),
            _ => Err(EvalError::wrong_input("List", self.type_name())),
        }
    }

    pub fn as_list_mut(&mut self) -> EvalResult<&mut List> {
        match self {
            Value::List(list) => Ok(list),
            _ => Err(EvalError::wrong_input("List", self.type_name())),
        }
    }

    pub fn as_set(&self) -> EvalResult<&Set> {
        match self {
            Value::Set(set) => Ok(set),
            _ => Err(EvalError::wrong_input("Set", self.type_name())),
        }
    }

    pub fn as_set_mut(&mut self) -> EvalResult<&mut Set> {
        match self {
            Value::Set(set) => Ok(set),
            _ => Err(EvalError::wrong_input("Set", self.type_name())),
        }
    }

    pub fn as_dict(&self) -> EvalResult<&Dictionary> {
        match self {
            Value::Dict(dict) => Ok(dict),
            _ => Err(EvalError::wrong_input("Dictionary", self.type_name())),
        }
    }

    pub fn as_dict_mut(&mut self) -> EvalResult<&mut Dictionary> {
        match self {
            Value::Dict(dict) => Ok(dict),
            _ => Err(EvalError::wrong_input("Dictionary", self.type_name())),
        }
    }

    pub fn as_expression(&self) -> EvalResult<&Expression> {
        match self {
            Value::Expression(e) => Ok(e),
            _ => Err(EvalError::wrong_input("Expression", self.type_name())),
        }
    }

    pub fn as_expression_mut(&mut self) -> EvalResult<&mut Expression> {
        match self {
            Value::Expression(e) => Ok(e),
            _ => Err(EvalError::wrong_input("Expression", self.type_name())),
        }
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    /// Render as notation text that parses back to an equal value.
    pub fn to_notation(&self) -> String {
        let mut out = String::new();
        write_notation(self, &mut out);
        out
    }

    /// Like [`Value::to_notation`], but a string renders as its raw text.
    pub fn display(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            _ => self.to_notation(),
        }
    }
}

/// Quote a string with whichever quote character it does not contain.
pub fn quote_str(s: &str) -> String {
    if s.contains('"') {
        format!("'{}'", s)
    } else {
        format!("\"{}\"", s)
    }
}

fn write_items<'a>(items: impl Iterator<Item = &'a Value>, out: &mut String) {
    for (i, item) in items.enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_notation(item, out);
    }
}

fn write_marked(class_name: &str, marker: &str, items: &[Value], out: &mut String) {
    out.push('{');
    out.push_str(&quote_str(CLASS_NAME_KEY));
    out.push_str(": ");
    out.push_str(&quote_str(class_name));
    out.push_str(", ");
    out.push_str(&quote_str(marker));
    out.push_str(": [");
    write_items(items.iter(), out);
    out.push_str("]}");
}

fn write_notation(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("Null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::Str(s) => out.push_str(&quote_str(s)),
        Value::List(list) => match list.class_name() {
            Some(name) => write_marked(name, LIST_MARKER, &list.items, out),
            None => {
                out.push('[');
                write_items(list.iter(), out);
                out.push(']');
            }
        },
        Value::Set(set) => match (set.class_name(), set.items.len()) {
            (Some(name), _) => write_marked(name, SET_MARKER, &set.items, out),
            (None, 0) => {
                out.push('{');
                out.push_str(&quote_str(SET_MARKER));
                out.push_str(": []}");
            }
            (None, 1) => {
                out.push('(');
                write_notation(&set.items[0], out);
                out.push_str(",)");
            }
            (None, _) => {
                out.push('(');
                write_items(set.items.iter(), out);
                out.push(')');
            }
        },
        Value::Dict(dict) => {
            out.push('{');
            let mut first = true;
            if let Some(name) = dict.class_name() {
                out.push_str(&quote_str(CLASS_NAME_KEY));
                out.push_str(": ");
                out.push_str(&quote_str(name));
                first = false;
            }
            for (key, item) in dict.iter() {
                if !first {
                    out.push_str(", ");
                }
                first = false;
                out.push_str(&quote_str(key));
                out.push_str(": ");
                write_notation(item, out);
            }
            out.push('}');
        }
        Value::Symbol(s) => out.push_str(s),
        Value::Operator(op) => out.push_str(op.as_str()),
        Value::Bracket(b) => out.push(b.as_char()),
        Value::Expression(e) => out.push_str(e.text()),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_notation())
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

macro_rules! impl_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Number(Number::from(v))
                }
            }
        )*
    };
}

impl_from_number!(i8, i16, i32, i64, f32, f64);

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<List> for Value {
    fn from(list: List) -> Self {
        Value::List(list)
    }
}

impl From<Set> for Value {
    fn from(set: Set) -> Self {
        Value::Set(set)
    }
}

impl From<Dictionary> for Value {
    fn from(dict: Dictionary) -> Self {
        Value::Dict(dict)
    }
}

impl From<Expression> for Value {
    fn from(e: Expression) -> Self {
        Value::Expression(e)
    }
}

// ============================================================================
// Source Span Types
// ============================================================================

/// A byte range in the parsed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceSpan {
    /// Start byte offset in the source
    pub start: usize,
    /// End byte offset in the source
    pub end: usize,
}

impl SourceSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// A span covering the single character at `offset`.
    pub fn at(offset: usize) -> Self {
        Self::new(offset, offset + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Extract the text covered by this span from a source string.
    pub fn extract<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.start..self.end)
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// The kind of failure (without span information).
#[derive(Debug, Clone, PartialEq)]
pub enum EvalErrorKind {
    /// Unbalanced brackets or quotes, or a malformed piece
    ParseError(String),
    /// Spans that are neither literals nor usable variables
    UnrecognizedSymbols(Vec<String>),
    /// The text produced a value of the wrong type for its position
    WrongExecutionType { expected: String, got: String },
    /// An operation received an operand of the wrong type
    WrongInputType { expected: String, got: String },
    DivisionByZero,
    /// Arithmetic overflowed to infinity or produced NaN
    NonFiniteResult,
    /// An operator without its operand
    MissingOperand(String),
    /// Reduction stopped making progress
    NonConvergence(String),
    /// An expression variable without a value
    UnassignedVariable(String),
    IndexOutOfBounds { index: usize, len: usize },
    KeyNotFound(String),
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalErrorKind::ParseError(msg) => write!(f, "parse error: {}", msg),
            EvalErrorKind::UnrecognizedSymbols(symbols) => {
                write!(f, "unrecognized symbols: {}", symbols.join(", "))
            }
            EvalErrorKind::WrongExecutionType { expected, got } => {
                write!(f, "wrong execution type: expected {}, got {}", expected, got)
            }
            EvalErrorKind::WrongInputType { expected, got } => {
                write!(f, "wrong input type: expected {}, got {}", expected, got)
            }
            EvalErrorKind::DivisionByZero => write!(f, "division by zero"),
            EvalErrorKind::NonFiniteResult => write!(f, "result is not a finite number"),
            EvalErrorKind::MissingOperand(op) => write!(f, "missing operand for `{}`", op),
            EvalErrorKind::NonConvergence(text) => {
                write!(f, "evaluation made no progress on `{}`", text)
            }
            EvalErrorKind::UnassignedVariable(name) => {
                write!(f, "unassigned variable: {}", name)
            }
            EvalErrorKind::IndexOutOfBounds { index, len } => {
                write!(f, "index {} out of bounds for length {}", index, len)
            }
            EvalErrorKind::KeyNotFound(key) => write!(f, "key not found: {}", key),
        }
    }
}

/// Errors raised while parsing or evaluating, with optional source span.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalError {
    /// The kind of error
    pub kind: EvalErrorKind,
    /// Optional source span where the error occurred
    pub span: Option<SourceSpan>,
}

impl EvalError {
    /// Create a new error from a kind.
    pub fn new(kind: EvalErrorKind) -> Self {
        Self { kind, span: None }
    }

    /// Attach a span to this error.
    pub fn with_span(mut self, span: SourceSpan) -> Self {
        self.span = Some(span);
        self
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::ParseError(msg.into()))
    }

    pub fn unrecognized(symbols: Vec<String>) -> Self {
        Self::new(EvalErrorKind::UnrecognizedSymbols(symbols))
    }

    pub fn wrong_execution(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::WrongExecutionType {
            expected: expected.into(),
            got: got.into(),
        })
    }

    pub fn wrong_input(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::WrongInputType {
            expected: expected.into(),
            got: got.into(),
        })
    }

    pub fn div_zero() -> Self {
        Self::new(EvalErrorKind::DivisionByZero)
    }

    pub fn missing_operand(op: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::MissingOperand(op.into()))
    }

    pub fn non_convergence(text: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::NonConvergence(text.into()))
    }

    pub fn unassigned(name: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::UnassignedVariable(name.into()))
    }

    pub fn index_oob(index: usize, len: usize) -> Self {
        Self::new(EvalErrorKind::IndexOutOfBounds { index, len })
    }

    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::KeyNotFound(key.into()))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &EvalErrorKind {
        &self.kind
    }

    /// Format error with source context if available.
    pub fn format_with_source(&self, source: &str) -> String {
        let mut msg = self.kind.to_string();

        if let Some(span) = &self.span {
            let prefix = source.get(..span.start).unwrap_or(source);
            let line = prefix.matches('\n').count() + 1;
            let last_newline = prefix.rfind('\n').map(|i| i + 1).unwrap_or(0);
            let col = prefix.len() - last_newline + 1;

            msg = format!("{}:{}: {}", line, col, msg);

            if let Some(extract) = span.extract(source) {
                let snippet: String = extract.chars().take(40).collect();
                let ellipsis = if snippet.len() < extract.len() { "..." } else { "" };
                msg = format!("{}\n  --> `{}{}`", msg, snippet, ellipsis);
            }
        }

        msg
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(span) = &self.span {
            write!(f, " at {}", span)?;
        }
        Ok(())
    }
}

impl std::error::Error for EvalError {}

impl From<EvalErrorKind> for EvalError {
    fn from(kind: EvalErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<NumericError> for EvalError {
    fn from(err: NumericError) -> Self {
        match err {
            NumericError::DivisionByZero => Self::div_zero(),
            NumericError::NonFinite => Self::new(EvalErrorKind::NonFiniteResult),
        }
    }
}

/// Result type for parse and evaluation operations.
pub type EvalResult<T> = Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Null.type_name(), "Null");
        assert_eq!(Value::Bool(true).type_name(), "Boolean");
        assert_eq!(Value::from(5i8).type_name(), "Byte");
        assert_eq!(Value::from(2.5f64).type_name(), "Float64");
        assert_eq!(Value::from("x").type_name(), "String");
        assert_eq!(Value::from(List::new()).type_name(), "List");
        assert_eq!(Value::from(Dictionary::new()).type_name(), "Dictionary");

        let mut point = Value::from(Dictionary::new());
        point.set_type_name("Point").unwrap();
        assert_eq!(point.type_name(), "Point");
        assert!(Value::from(1i8).set_type_name("X").is_err());
    }

    #[test]
    fn test_numeric_equality_ignores_width() {
        assert_eq!(Value::from(5i8), Value::from(5i64));
        assert_eq!(Value::from(2.0f32), Value::from(2i16));
        assert_ne!(Value::from(1i8), Value::Bool(true));
        assert_ne!(Value::Null, Value::from(""));
    }

    #[test]
    fn test_container_equality() {
        let a = Value::from(List::from_items(vec![Value::from(1i8), Value::from("x")]));
        let b = Value::from(List::from_items(vec![Value::from(1i64), Value::from("x")]));
        assert_eq!(a, b);

        let set = Value::from(Set::from_items(vec![Value::from(1i8), Value::from("x")]));
        assert_ne!(a, set);

        let named = Value::from(
            List::from_items(vec![Value::from(1i8), Value::from("x")]).with_class_name("Pair"),
        );
        assert_ne!(a, named);

        let reversed = Value::from(Set::from_items(vec![Value::from("x"), Value::from(1i8)]));
        assert_ne!(set, reversed);
    }

    #[test]
    fn test_dictionary_equality_ignores_order() {
        let mut first = IndexMap::new();
        first.insert("a".to_string(), Value::from(1i8));
        first.insert("b".to_string(), Value::Null);
        let mut second = IndexMap::new();
        second.insert("b".to_string(), Value::Null);
        second.insert("a".to_string(), Value::from(1i32));
        assert_eq!(
            Value::from(Dictionary::from_entries(first)),
            Value::from(Dictionary::from_entries(second))
        );
    }

    #[test]
    fn test_set_reads_are_copies() {
        let set = Set::from_items(vec![Value::from(List::from_items(vec![Value::from(1i8)]))]);
        let mut copy = set.get(0).unwrap();
        copy.as_list_mut().unwrap().items.push(Value::from(2i8));
        assert_eq!(set.get(0).unwrap().as_list().unwrap().len(), 1);
    }

    #[test]
    fn test_notation() {
        let mut entries = IndexMap::new();
        entries.insert("name".to_string(), Value::from("bob"));
        entries.insert("tags".to_string(), Value::from(Set::from_items(vec![Value::from(1i8)])));
        let dict = Value::from(Dictionary::from_entries(entries).with_class_name("Person"));
        assert_eq!(
            dict.to_notation(),
            r#"{"ClassName": "Person", "name": "bob", "tags": (1,)}"#
        );

        let list = Value::from(List::from_items(vec![Value::Null, Value::Bool(false)]));
        assert_eq!(list.to_string(), "[Null, false]");
        assert_eq!(Value::from(Set::new()).to_notation(), r#"{"__set__": []}"#);
        assert_eq!(
            Value::from(List::new().with_class_name("Row")).to_notation(),
            r#"{"ClassName": "Row", "__list__": []}"#
        );
        assert_eq!(Value::from("say \"hi\"").to_notation(), "'say \"hi\"'");
        assert_eq!(Value::from("plain").display(), "plain");
    }

    #[test]
    fn test_accessor_errors() {
        let err = Value::from("x").as_bool().unwrap_err();
        assert_eq!(
            err.kind,
            EvalErrorKind::WrongInputType {
                expected: "Boolean".to_string(),
                got: "String".to_string()
            }
        );
        assert!(Value::from(2.5f64).as_i64().is_err());
        assert_eq!(Value::from(4.0f64).as_i64().unwrap(), 4);
        assert_eq!(Value::from(-3.0f32).as_i64().unwrap(), -3);
        assert!(Value::from(1e300f64).as_i64().is_err());
    }

    #[test]
    fn test_format_with_source() {
        let err = EvalError::parse("unclosed `[`").with_span(SourceSpan::at(7));
        let msg = err.format_with_source("a: 1\nb [2");
        assert!(msg.starts_with("2:3: parse error"));
        assert!(msg.contains("--> `[`"));
    }
}

//! The value parser.
//!
//! Text is tokenized and arranged into a bracket tree, then consumed
//! breadth-first: every piece of a leaf's payload becomes a task that fills
//! one slot of an arena. The final [`Value`] is assembled from the slots only
//! after the worklist is empty, so a failure never leaves a half-built value
//! behind.

use std::collections::VecDeque;

use indexmap::IndexMap;

use super::eval::{EvalConfig, Evaluator};
use super::value::{
    is_marker_key, Dictionary, EvalError, EvalResult, Expression, List, Number, Set,
    SourceSpan, Value, CLASS_NAME_KEY, LIST_MARKER, SET_MARKER,
};
use crate::core::syntax::bracket::{BracketTree, Entry, LeafId, ROOT};
use crate::core::syntax::lexer::{tokenize, unrecognized_symbols};
use crate::core::syntax::token::{
    boolean_literal, is_integer_literal, is_null_literal, is_number_literal, is_variable_name,
    Bracket, Delimiter, Operator, Symbol, Token,
};
use crate::core::syntax::utils::{split_entries, split_first, trim_entries};

type SlotId = usize;

/// A partially built value.
#[derive(Debug)]
enum Slot {
    Pending,
    Ready(Value),
    List(Vec<SlotId>),
    Set(Vec<SlotId>),
    Dict(Vec<(String, SlotId)>),
}

/// A run of payload entries waiting to be turned into the value of `slot`.
struct Task<'t> {
    entries: &'t [Entry],
    slot: SlotId,
}

/// Parses notation text into a [`Value`].
#[derive(Debug, Clone, Default)]
pub struct Parser {
    config: EvalConfig,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EvalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn parse(&self, text: &str) -> EvalResult<Value> {
        let mut tree = BracketTree::structural(tokenize(text));
        if let Some(mismatch) = tree.error() {
            return Err(EvalError::parse(mismatch.description.clone())
                .with_span(SourceSpan::at(mismatch.offset)));
        }
        tree.collapse_single_element_objects();

        let mut slots = vec![Slot::Pending];
        let mut queue: VecDeque<Task<'_>> = VecDeque::new();

        let root = tree.root();
        if trim_entries(&root.entries).is_empty() {
            return Ok(Value::Null);
        }
        if root.has_commas {
            let items = self.schedule_items(&root.entries, &mut slots, &mut queue);
            slots[ROOT] = Slot::List(items);
        } else {
            queue.push_back(Task {
                entries: &root.entries,
                slot: ROOT,
            });
        }

        while let Some(task) = queue.pop_front() {
            let filled = self.resolve(&tree, task.entries, &mut slots, &mut queue)?;
            slots[task.slot] = filled;
        }

        Ok(apply_markers(assemble(&mut slots, ROOT)))
    }

    /// One slot and task per non-empty comma-separated piece.
    fn schedule_items<'t>(
        &self,
        entries: &'t [Entry],
        slots: &mut Vec<Slot>,
        queue: &mut VecDeque<Task<'t>>,
    ) -> Vec<SlotId> {
        split_entries(entries, Symbol::Comma)
            .into_iter()
            .map(trim_entries)
            .filter(|piece| !piece.is_empty())
            .map(|piece| schedule(piece, slots, queue))
            .collect()
    }

    fn schedule_dict<'t>(
        &self,
        tree: &BracketTree,
        entries: &'t [Entry],
        slots: &mut Vec<Slot>,
        queue: &mut VecDeque<Task<'t>>,
    ) -> EvalResult<Vec<(String, SlotId)>> {
        let mut pairs = Vec::new();
        for piece in split_entries(entries, Symbol::Comma) {
            let piece = trim_entries(piece);
            if piece.is_empty() {
                continue;
            }
            let (key, value) = match split_first(piece, Symbol::Colon) {
                Some((key, value)) => (key, trim_entries(value)),
                None => (piece, &piece[piece.len()..]),
            };
            let key = dict_key(tree, key)?;
            let slot = if value.is_empty() {
                slots.push(Slot::Ready(Value::Null));
                slots.len() - 1
            } else {
                schedule(value, slots, queue)
            };
            pairs.push((key, slot));
        }
        Ok(pairs)
    }

    /// Resolve one piece into a slot, scheduling its children.
    fn resolve<'t>(
        &self,
        tree: &'t BracketTree,
        entries: &'t [Entry],
        slots: &mut Vec<Slot>,
        queue: &mut VecDeque<Task<'t>>,
    ) -> EvalResult<Slot> {
        let piece = trim_entries(entries);
        let non_space: Vec<&Entry> = piece.iter().filter(|e| !e.is_space()).collect();

        if let [Entry::Leaf(id)] = non_space.as_slice() {
            let leaf = tree.leaf(*id);
            match leaf.delimiter() {
                Some(Delimiter::Square) => {
                    return Ok(Slot::List(self.schedule_items(&leaf.entries, slots, queue)));
                }
                Some(Delimiter::Paren) if leaf.has_commas => {
                    return Ok(Slot::Set(self.schedule_items(&leaf.entries, slots, queue)));
                }
                Some(Delimiter::Curly) => {
                    return Ok(Slot::Dict(self.schedule_dict(tree, &leaf.entries, slots, queue)?));
                }
                Some(Delimiter::DoubleQuote) | Some(Delimiter::SingleQuote) => {
                    return Ok(Slot::Ready(Value::Str(tree.rebuild_inner(*id))));
                }
                Some(Delimiter::Paren) | None => {}
            }
        }

        if let Some(leaf) = mixed_structure(tree, &non_space) {
            return Err(EvalError::parse(format!(
                "`{}` cannot be combined with other content",
                tree.rebuild_string(leaf)
            )));
        }

        self.resolve_bare(tree, piece, &non_space).map(Slot::Ready)
    }

    /// A piece without list, set or dictionary structure.
    fn resolve_bare(
        &self,
        tree: &BracketTree,
        piece: &[Entry],
        non_space: &[&Entry],
    ) -> EvalResult<Value> {
        let text = tree.rebuild_entries(piece);

        if let [Entry::Token(token)] = non_space {
            if let Some(op) = token.operator() {
                return Ok(Value::Operator(op));
            }
        }

        let tokens = tokenize(&text);
        // `2(3)` and `(2)(3)` are implicit products
        let juxtaposed_group = non_space.len() > 1
            && non_space.iter().any(|e| {
                e.leaf()
                    .map_or(false, |id| tree.leaf(id).delimiter() == Some(Delimiter::Paren))
            });
        if juxtaposed_group
            && !tokens.iter().any(Token::is_quote)
            && unrecognized_symbols(&tokens).is_empty()
        {
            let evaluator = Evaluator::with_config(self.config.clone());
            return evaluator.evaluate_value(&text);
        }
        if !tokens.iter().any(Token::is_operator) || only_quoted_operators(&tokens) {
            // `(hello world)` classifies its inner text
            if let [Entry::Leaf(id)] = non_space {
                return Ok(classify_literal(&tree.rebuild_inner(*id)));
            }
            return Ok(classify_literal(&text));
        }

        let unknown = unrecognized_symbols(&tokens);
        if unknown.is_empty() {
            let evaluator = Evaluator::with_config(self.config.clone());
            return evaluator.evaluate_value(&text);
        }

        let invalid: Vec<String> = unknown
            .iter()
            .filter(|name| !is_variable_name(name))
            .cloned()
            .collect();
        if !invalid.is_empty() {
            return Err(EvalError::unrecognized(invalid));
        }
        if !self.config.allow_expressions {
            return Err(EvalError::unrecognized(unknown));
        }

        let names = top_level_words(&tokens);
        log::debug!("`{}` kept as an expression over {:?}", text, names);
        Ok(Value::Expression(Expression::new(text, names)))
    }
}

/// Parse with the default configuration.
pub fn parse(text: &str) -> EvalResult<Value> {
    Parser::new().parse(text)
}

/// Parse with an explicit configuration.
pub fn parse_with_config(text: &str, config: EvalConfig) -> EvalResult<Value> {
    Parser::with_config(config).parse(text)
}

fn schedule<'t>(
    entries: &'t [Entry],
    slots: &mut Vec<Slot>,
    queue: &mut VecDeque<Task<'t>>,
) -> SlotId {
    slots.push(Slot::Pending);
    let slot = slots.len() - 1;
    queue.push_back(Task { entries, slot });
    slot
}

/// A list or dictionary leaf sharing its piece with anything else.
fn mixed_structure(tree: &BracketTree, non_space: &[&Entry]) -> Option<LeafId> {
    if non_space.len() < 2 {
        return None;
    }
    non_space.iter().find_map(|e| {
        e.leaf().filter(|id| {
            matches!(
                tree.leaf(*id).delimiter(),
                Some(Delimiter::Square) | Some(Delimiter::Curly)
            )
        })
    })
}

/// True when every operator sits inside quotes.
fn only_quoted_operators(tokens: &[Token]) -> bool {
    let mut quote: Option<Delimiter> = None;
    for token in tokens {
        if let Some(Bracket::Quote(d)) = token.bracket() {
            quote = match quote {
                Some(open) if open == d => None,
                None => Some(d),
                still_open => still_open,
            };
        } else if quote.is_none() && token.is_operator() {
            return false;
        }
    }
    true
}

/// Words outside quotes, without descending into subscripts.
fn top_level_words(tokens: &[Token]) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    let mut quote: Option<Delimiter> = None;
    for token in tokens {
        if let Some(Bracket::Quote(d)) = token.bracket() {
            quote = match quote {
                Some(open) if open == d => None,
                None => Some(d),
                still_open => still_open,
            };
        } else if quote.is_none() && token.is_word() && !words.contains(&token.text) {
            words.push(token.text.clone());
        }
    }
    words
}

fn dict_key(tree: &BracketTree, entries: &[Entry]) -> EvalResult<String> {
    let key = trim_entries(entries);
    if let [Entry::Leaf(id)] = key {
        if tree.leaf(*id).delimiter().map_or(false, |d| d.is_quote()) {
            return Ok(tree.rebuild_inner(*id));
        }
    }
    match classify_literal(&tree.rebuild_entries(key)) {
        Value::Str(s) => Ok(s),
        Value::Number(n) if n.is_integral() => Ok(n.to_string()),
        other => Err(EvalError::wrong_execution(
            "String or whole number key",
            other.type_name(),
        )),
    }
}

fn assemble(slots: &mut Vec<Slot>, id: SlotId) -> Value {
    match std::mem::replace(&mut slots[id], Slot::Pending) {
        Slot::Ready(value) => value,
        Slot::List(ids) => Value::List(List::from_items(
            ids.into_iter().map(|i| assemble(slots, i)).collect(),
        )),
        Slot::Set(ids) => Value::Set(Set::from_items(
            ids.into_iter().map(|i| assemble(slots, i)).collect(),
        )),
        Slot::Dict(pairs) => {
            let mut entries = IndexMap::new();
            for (key, i) in pairs {
                let value = assemble(slots, i);
                entries.insert(key, value);
            }
            Value::Dict(Dictionary::from_entries(entries))
        }
        // Every scheduled slot is filled before the worklist drains.
        Slot::Pending => Value::Null,
    }
}

// ============================================================================
// Literals
// ============================================================================

/// The quoted body of `text`, if it is one quoted string.
fn unquote(text: &str) -> Option<&str> {
    let quote = text.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let inner = text.get(1..text.len().checked_sub(1)?)?;
    if text.len() >= 2 && text.ends_with(quote) && !inner.contains(quote) {
        Some(inner)
    } else {
        None
    }
}

/// Classify a literal by priority: quoted string, `Null`, integer at its
/// narrowest width, floating point, boolean, operator, bracket, symbol and
/// finally plain string.
pub fn classify_literal(text: &str) -> Value {
    let text = text.trim();
    if text.is_empty() {
        return Value::Null;
    }
    if let Some(inner) = unquote(text) {
        return Value::Str(inner.to_string());
    }
    if is_null_literal(text) {
        return Value::Null;
    }
    if is_integer_literal(text) {
        let number = match text.parse::<i64>() {
            Ok(n) => Number::Int64(n),
            Err(_) => match text.parse::<f64>() {
                Ok(f) => Number::Float64(f),
                Err(_) => return Value::Str(text.to_string()),
            },
        };
        return Value::Number(number.shrink_to_smallest());
    }
    if is_number_literal(text) {
        if let Ok(f) = text.parse::<f64>() {
            return Value::Number(Number::Float64(f).shrink_to_smallest());
        }
    }
    if let Some(b) = boolean_literal(text) {
        return Value::Bool(b);
    }
    if let Some(op) = Operator::from_str(text) {
        return Value::Operator(op);
    }
    let mut chars = text.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if let Some(bracket) = Bracket::from_char(c) {
            return Value::Bracket(bracket);
        }
        if matches!(c, '.' | ',' | ':') {
            return Value::Symbol(text.to_string());
        }
    }
    Value::Str(text.to_string())
}

// ============================================================================
// Marker post-pass
// ============================================================================

/// Resolve `ClassName` keys and single-key marker wrappers, bottom-up.
pub fn apply_markers(value: Value) -> Value {
    match value {
        Value::List(mut list) => {
            list.items = list.items.into_iter().map(apply_markers).collect();
            Value::List(list)
        }
        Value::Set(mut set) => {
            set.items = set.items.into_iter().map(apply_markers).collect();
            Value::Set(set)
        }
        Value::Dict(dict) => {
            let mut class_name = dict.class_name;
            let mut entries: IndexMap<String, Value> = dict
                .entries
                .into_iter()
                .map(|(k, v)| (k, apply_markers(v)))
                .collect();

            if matches!(entries.get(CLASS_NAME_KEY), Some(Value::Str(_))) {
                if let Some(Value::Str(name)) = entries.shift_remove(CLASS_NAME_KEY) {
                    class_name = Some(name);
                }
            }

            if entries.len() == 1 && entries.keys().all(|k| is_marker_key(k)) {
                if let Some((marker, inner)) = entries.pop() {
                    log::debug!("collapsing `{}` wrapper", marker);
                    return unwrap_marker(&marker, inner, class_name);
                }
            }

            Value::Dict(Dictionary {
                entries,
                class_name,
            })
        }
        other => other,
    }
}

fn unwrap_marker(marker: &str, inner: Value, class_name: Option<String>) -> Value {
    let value = match (marker, inner) {
        (SET_MARKER, Value::List(list)) => Value::Set(Set {
            items: list.items,
            class_name: list.class_name,
        }),
        (_, inner) => inner,
    };
    match (value, class_name) {
        (Value::List(list), Some(name)) if marker == LIST_MARKER || marker == SET_MARKER => {
            Value::List(list.with_class_name(name))
        }
        (Value::Set(set), Some(name)) => Value::Set(set.with_class_name(name)),
        (value, _) => value,
    }
}

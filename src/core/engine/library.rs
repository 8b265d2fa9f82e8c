//! Container editing for parsed values.
//!
//! Lists and sets grow, shrink, sort and merge in place. Every edit goes
//! through these methods so a list's indices stay contiguous and a set never
//! hands out a reference into its storage.

use std::cmp::Ordering;

use dynval_numeric as numeric;

use super::value::{Dictionary, EvalError, EvalResult, List, Set, Value};

// ============================================================================
// Ordering
// ============================================================================

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::Str(_) => 3,
        Value::List(_) => 4,
        Value::Set(_) => 5,
        Value::Dict(_) => 6,
        Value::Symbol(_) => 7,
        Value::Operator(_) => 8,
        Value::Bracket(_) => 9,
        Value::Expression(_) => 10,
    }
}

fn cmp_sequence<'a>(
    lhs: impl IntoIterator<Item = &'a Value>,
    rhs: impl IntoIterator<Item = &'a Value>,
) -> Ordering {
    let mut lhs = lhs.into_iter();
    let mut rhs = rhs.into_iter();
    loop {
        match (lhs.next(), rhs.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(a), Some(b)) => match total_cmp(a, b) {
                Ordering::Equal => continue,
                other => return other,
            },
        }
    }
}

/// A total order over all values.
///
/// Kinds sort by rank (`Null` first, expressions last). Numbers compare
/// after promotion with NaN after every other number, strings compare
/// lexicographically and containers compare element by element.
pub fn total_cmp(lhs: &Value, rhs: &Value) -> Ordering {
    match (lhs, rhs) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => match numeric::compare(*a, *b) {
            Some(order) => order,
            None => a.as_f64().is_nan().cmp(&b.as_f64().is_nan()),
        },
        (Value::Str(a), Value::Str(b)) | (Value::Symbol(a), Value::Symbol(b)) => a.cmp(b),
        (Value::List(a), Value::List(b)) => cmp_sequence(&a.items, &b.items),
        (Value::Set(a), Value::Set(b)) => cmp_sequence(&a.items, &b.items),
        (Value::Dict(a), Value::Dict(b)) => {
            let mut lhs = a.entries.iter();
            let mut rhs = b.entries.iter();
            loop {
                match (lhs.next(), rhs.next()) {
                    (None, None) => return Ordering::Equal,
                    (None, Some(_)) => return Ordering::Less,
                    (Some(_), None) => return Ordering::Greater,
                    (Some((ka, va)), Some((kb, vb))) => {
                        match ka.cmp(kb).then_with(|| total_cmp(va, vb)) {
                            Ordering::Equal => continue,
                            other => return other,
                        }
                    }
                }
            }
        }
        (Value::Operator(a), Value::Operator(b)) => a.as_str().cmp(b.as_str()),
        (Value::Bracket(a), Value::Bracket(b)) => a.as_char().cmp(&b.as_char()),
        (Value::Expression(a), Value::Expression(b)) => a.text().cmp(b.text()),
        _ => rank(lhs).cmp(&rank(rhs)),
    }
}

/// Keep the first of every run of structurally equal items.
fn dedup_items(items: &mut Vec<Value>) {
    let mut kept: Vec<Value> = Vec::with_capacity(items.len());
    for item in items.drain(..) {
        if !kept.contains(&item) {
            kept.push(item);
        }
    }
    *items = kept;
}

fn combined_items(other: &Value) -> Vec<Value> {
    match other {
        Value::List(list) => list.items.clone(),
        Value::Set(set) => set.items.clone(),
        single => vec![single.clone()],
    }
}

fn insert_at(items: &mut Vec<Value>, index: usize, value: Value) -> EvalResult<()> {
    if index > items.len() {
        return Err(EvalError::index_oob(index, items.len()));
    }
    items.insert(index, value);
    Ok(())
}

fn remove_at(items: &mut Vec<Value>, index: usize) -> EvalResult<Value> {
    if index >= items.len() {
        return Err(EvalError::index_oob(index, items.len()));
    }
    Ok(items.remove(index))
}

// ============================================================================
// List
// ============================================================================

impl List {
    pub fn append(&mut self, value: Value) {
        self.items.push(value);
    }

    /// Insert before `index`; `index == len` appends.
    pub fn insert(&mut self, index: usize, value: Value) -> EvalResult<()> {
        insert_at(&mut self.items, index, value)
    }

    /// Remove and return the item at `index`, shifting the rest down.
    pub fn remove(&mut self, index: usize) -> EvalResult<Value> {
        remove_at(&mut self.items, index)
    }

    pub fn sort(&mut self) {
        self.items.sort_by(total_cmp);
    }

    pub fn dedup(&mut self) {
        dedup_items(&mut self.items);
    }

    /// Append the items of a list or set, or `other` itself.
    pub fn combine(&mut self, other: &Value) {
        self.items.extend(combined_items(other));
    }
}

// ============================================================================
// Set
// ============================================================================

impl Set {
    pub fn append(&mut self, value: Value) {
        self.items.push(value);
    }

    pub fn insert(&mut self, index: usize, value: Value) -> EvalResult<()> {
        insert_at(&mut self.items, index, value)
    }

    pub fn remove(&mut self, index: usize) -> EvalResult<Value> {
        remove_at(&mut self.items, index)
    }

    pub fn sort(&mut self) {
        self.items.sort_by(total_cmp);
    }

    pub fn dedup(&mut self) {
        dedup_items(&mut self.items);
    }

    pub fn combine(&mut self, other: &Value) {
        self.items.extend(combined_items(other));
    }
}

// ============================================================================
// Dictionary
// ============================================================================

impl Dictionary {
    /// Insert or replace; a replaced key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    /// Remove `key`, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> EvalResult<Value> {
        self.entries
            .shift_remove(key)
            .ok_or_else(|| EvalError::key_not_found(key))
    }

    /// Merge another dictionary; its values win on shared keys.
    pub fn combine(&mut self, other: &Value) -> EvalResult<()> {
        match other {
            Value::Dict(dict) => {
                for (key, value) in dict.iter() {
                    self.entries.insert(key.clone(), value.clone());
                }
                Ok(())
            }
            other => Err(EvalError::wrong_input("Dictionary", other.type_name())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::value::EvalErrorKind;
    use pretty_assertions::assert_eq;

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().map(|v| Value::from(*v)).collect()
    }

    #[test]
    fn test_list_insert_and_remove() {
        let mut list = List::from_items(ints(&[1, 3]));
        list.insert(1, Value::from(2i64)).unwrap();
        list.insert(3, Value::from(4i64)).unwrap();
        assert_eq!(list.as_slice(), ints(&[1, 2, 3, 4]).as_slice());

        let err = list.insert(9, Value::Null).unwrap_err();
        assert_eq!(err.kind, EvalErrorKind::IndexOutOfBounds { index: 9, len: 4 });

        assert_eq!(list.remove(0).unwrap(), Value::from(1i64));
        assert_eq!(list.get(0), Some(&Value::from(2i64)));
        assert!(list.remove(3).is_err());
    }

    #[test]
    fn test_sort_uses_total_order() {
        let mut list = List::from_items(vec![
            Value::from("b"),
            Value::from(f64::NAN),
            Value::from(2i8),
            Value::Null,
            Value::from(1.5f32),
            Value::Bool(true),
            Value::from("a"),
        ]);
        list.sort();
        let text: Vec<String> = list.iter().map(Value::to_notation).collect();
        assert_eq!(text, vec!["Null", "true", "1.5", "2", "NaN", "\"a\"", "\"b\""]);
    }

    #[test]
    fn test_sequences_compare_elementwise() {
        let short = Value::from(List::from_items(ints(&[1, 2])));
        let long = Value::from(List::from_items(ints(&[1, 2, 0])));
        let big = Value::from(List::from_items(ints(&[3])));
        assert_eq!(total_cmp(&short, &long), Ordering::Less);
        assert_eq!(total_cmp(&big, &long), Ordering::Greater);
        assert_eq!(total_cmp(&short, &Value::from(Set::new())), Ordering::Less);
    }

    #[test]
    fn test_dedup_and_combine() {
        let mut set = Set::from_items(vec![Value::from(1i8), Value::from(1i64), Value::from(2i8)]);
        set.dedup();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(0), Some(Value::from(1i8)));

        set.combine(&Value::from(List::from_items(ints(&[5, 6]))));
        set.combine(&Value::from("x"));
        assert_eq!(set.len(), 5);
        assert_eq!(set.get(4), Some(Value::from("x")));
    }

    #[test]
    fn test_set_reads_are_copies() {
        let set = Set::from_items(vec![Value::from(List::from_items(ints(&[1])))]);
        let mut copy = set.get(0).unwrap();
        copy.as_list_mut().unwrap().append(Value::from(2i64));
        assert_eq!(set.get(0).unwrap().as_list().unwrap().len(), 1);
    }

    #[test]
    fn test_dictionary_edits() {
        let mut dict = Dictionary::new();
        dict.insert("a", Value::from(1i8));
        dict.insert("b", Value::from(2i8));
        assert_eq!(dict.insert("a", Value::from(3i8)), Some(Value::from(1i8)));
        assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["a", "b"]);

        let mut other = Dictionary::new();
        other.insert("c", Value::Null);
        dict.combine(&Value::from(other)).unwrap();
        assert_eq!(dict.len(), 3);

        assert_eq!(dict.remove("b").unwrap(), Value::from(2i8));
        assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["a", "c"]);
        let err = dict.remove("zzz").unwrap_err();
        assert_eq!(err.kind, EvalErrorKind::KeyNotFound("zzz".to_string()));

        let err = dict.combine(&Value::from(List::new())).unwrap_err();
        assert!(matches!(err.kind, EvalErrorKind::WrongInputType { .. }));
    }
}

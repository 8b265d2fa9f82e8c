//! Nested bracket tree over a token stream.
//!
//! Leaves live in an arena and refer to each other by [`LeafId`]. The root
//! (id 0) is the unbracketed top level; every matched delimiter pair below it
//! is one leaf whose payload is a mix of plain tokens and child leaves.

use std::fmt;

use super::token::{Bracket, Delimiter, Token};

/// Index of a leaf in its tree.
pub type LeafId = usize;

/// The unbracketed top level.
pub const ROOT: LeafId = 0;

/// One payload entry of a leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Token(Token),
    Leaf(LeafId),
}

impl Entry {
    pub fn token(&self) -> Option<&Token> {
        match self {
            Entry::Token(t) => Some(t),
            Entry::Leaf(_) => None,
        }
    }

    pub fn leaf(&self) -> Option<LeafId> {
        match self {
            Entry::Leaf(id) => Some(*id),
            Entry::Token(_) => None,
        }
    }

    pub fn is_space(&self) -> bool {
        self.token().map_or(false, Token::is_space)
    }
}

/// A matched delimiter region, or the root.
#[derive(Debug, Clone)]
pub struct Leaf {
    pub open: Option<Token>,
    pub close: Option<Token>,
    pub entries: Vec<Entry>,
    pub parent: Option<LeafId>,
    pub children: Vec<LeafId>,
    pub depth: usize,
    /// A comma sits directly in this leaf's payload
    pub has_commas: bool,
    /// This leaf has at least one child leaf
    pub has_brackets: bool,
    resolved: bool,
}

impl Leaf {
    fn new(open: Option<Token>, parent: Option<LeafId>, depth: usize) -> Self {
        Self {
            open,
            close: None,
            entries: Vec::new(),
            parent,
            children: Vec::new(),
            depth,
            has_commas: false,
            has_brackets: false,
            resolved: false,
        }
    }

    /// The delimiter that opened this leaf; `None` for the root.
    pub fn delimiter(&self) -> Option<Delimiter> {
        self.open
            .as_ref()
            .and_then(Token::bracket)
            .map(|b| b.delimiter())
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Payload entries other than whitespace.
    pub fn non_space_entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| !e.is_space())
    }
}

/// The first delimiter mismatch found while building a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketMismatch {
    pub description: String,
    pub offset: usize,
}

impl fmt::Display for BracketMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.description, self.offset)
    }
}

/// Arena of leaves built from a token stream.
#[derive(Debug, Clone)]
pub struct BracketTree {
    leaves: Vec<Leaf>,
    error: Option<BracketMismatch>,
}

impl BracketTree {
    /// Track all bracket pairs and both quote kinds.
    pub fn structural(tokens: Vec<Token>) -> Self {
        Self::build(tokens, &Delimiter::STRUCTURAL)
    }

    /// Track parentheses only; every other token is payload.
    pub fn parentheses(tokens: Vec<Token>) -> Self {
        Self::build(tokens, &[Delimiter::Paren])
    }

    pub fn build(tokens: Vec<Token>, delimiters: &[Delimiter]) -> Self {
        let mut tree = BracketTree {
            leaves: vec![Leaf::new(None, None, 0)],
            error: None,
        };
        let mut current = ROOT;

        for token in tokens {
            let bracket = token
                .bracket()
                .filter(|b| delimiters.contains(&b.delimiter()));

            // Inside quotes only the matching quote means anything.
            if let Some(quote) = tree.leaves[current].delimiter().filter(Delimiter::is_quote) {
                if bracket == Some(Bracket::Quote(quote)) {
                    current = tree.close_leaf(current, token);
                } else {
                    tree.leaves[current].entries.push(Entry::Token(token));
                }
                continue;
            }

            match bracket {
                Some(Bracket::Open(_)) | Some(Bracket::Quote(_)) => {
                    current = tree.open_leaf(current, token);
                }
                Some(Bracket::Close(d)) => {
                    if tree.leaves[current].delimiter() == Some(d) {
                        current = tree.close_leaf(current, token);
                    } else {
                        let description = match tree.leaves[current].open.as_ref() {
                            Some(open) => format!(
                                "`{}` does not close `{}` opened at offset {}",
                                token.text, open.text, open.offset
                            ),
                            None => format!("unmatched `{}`", token.text),
                        };
                        tree.record(description, token.offset);
                        tree.leaves[current].entries.push(Entry::Token(token));
                    }
                }
                None => {
                    if token.is_comma() {
                        tree.leaves[current].has_commas = true;
                    }
                    tree.leaves[current].entries.push(Entry::Token(token));
                }
            }
        }

        while current != ROOT {
            let leaf = &tree.leaves[current];
            let (description, offset) = match leaf.open.as_ref() {
                Some(open) => (format!("unclosed `{}`", open.text), open.offset),
                None => ("unclosed bracket".to_string(), 0),
            };
            let parent = leaf.parent.unwrap_or(ROOT);
            tree.record(description, offset);
            current = parent;
        }

        log::trace!(
            "bracket tree: {} leaves, depth {}",
            tree.leaves.len(),
            tree.max_depth()
        );
        tree
    }

    fn open_leaf(&mut self, parent: LeafId, open: Token) -> LeafId {
        let id = self.leaves.len();
        let depth = self.leaves[parent].depth + 1;
        self.leaves.push(Leaf::new(Some(open), Some(parent), depth));
        let parent_leaf = &mut self.leaves[parent];
        parent_leaf.entries.push(Entry::Leaf(id));
        parent_leaf.children.push(id);
        parent_leaf.has_brackets = true;
        id
    }

    fn close_leaf(&mut self, id: LeafId, close: Token) -> LeafId {
        let leaf = &mut self.leaves[id];
        leaf.close = Some(close);
        leaf.parent.unwrap_or(ROOT)
    }

    fn record(&mut self, description: String, offset: usize) {
        if self.error.is_none() {
            self.error = Some(BracketMismatch {
                description,
                offset,
            });
        }
    }

    /// The first mismatch, if any.
    pub fn error(&self) -> Option<&BracketMismatch> {
        self.error.as_ref()
    }

    pub fn leaf(&self, id: LeafId) -> &Leaf {
        &self.leaves[id]
    }

    pub fn root(&self) -> &Leaf {
        &self.leaves[ROOT]
    }

    /// Number of leaves in the arena, root included.
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves[ROOT].entries.is_empty()
    }

    /// Deepest nesting level reachable from the root.
    pub fn max_depth(&self) -> usize {
        self.reachable().map(|id| self.leaves[id].depth).max().unwrap_or(0)
    }

    fn reachable(&self) -> impl Iterator<Item = LeafId> + '_ {
        let mut stack = vec![ROOT];
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            stack.extend(self.leaves[id].children.iter().rev());
            Some(id)
        })
    }

    // ========================================================================
    // Rebuilding
    // ========================================================================

    /// Exact source text of a leaf, delimiters included.
    pub fn rebuild_string(&self, id: LeafId) -> String {
        let mut out = String::new();
        self.write_leaf(id, None, &mut out);
        out
    }

    /// Source text of a leaf's payload.
    pub fn rebuild_inner(&self, id: LeafId) -> String {
        self.rebuild_entries(&self.leaves[id].entries)
    }

    pub fn rebuild_entries(&self, entries: &[Entry]) -> String {
        let mut out = String::new();
        self.write_entries(entries, None, &mut out);
        out
    }

    /// Whole text with the span of `target` replaced by `replacement`.
    pub fn rebuild_with(&self, target: LeafId, replacement: &str) -> String {
        let mut out = String::new();
        self.write_leaf(ROOT, Some((target, replacement)), &mut out);
        out
    }

    fn write_leaf(&self, id: LeafId, swap: Option<(LeafId, &str)>, out: &mut String) {
        if let Some((target, replacement)) = swap {
            if target == id {
                out.push_str(replacement);
                return;
            }
        }
        let leaf = &self.leaves[id];
        if let Some(open) = &leaf.open {
            out.push_str(&open.text);
        }
        self.write_entries(&leaf.entries, swap, out);
        if let Some(close) = &leaf.close {
            out.push_str(&close.text);
        }
    }

    fn write_entries(&self, entries: &[Entry], swap: Option<(LeafId, &str)>, out: &mut String) {
        for entry in entries {
            match entry {
                Entry::Token(t) => out.push_str(&t.text),
                Entry::Leaf(child) => self.write_leaf(*child, swap, out),
            }
        }
    }

    // ========================================================================
    // Restructuring
    // ========================================================================

    /// Inline every parenthesis leaf that wraps a single entry and no comma,
    /// so `((1, 2))` becomes the set `(1, 2)` and `(5)` becomes `5`.
    ///
    /// A group is only inlined when it stands alone between separators;
    /// `2(3)` keeps its group for the evaluator's implicit product.
    pub fn collapse_single_element_objects(&mut self) {
        // Children always have larger ids than their parents.
        for id in (1..self.leaves.len()).rev() {
            let leaf = &self.leaves[id];
            let single = leaf.non_space_entries().count() == 1;
            if leaf.delimiter() != Some(Delimiter::Paren)
                || leaf.has_commas
                || !single
                || leaf.close.is_none()
            {
                continue;
            }
            let Some(parent) = leaf.parent else { continue };
            if !self.stands_alone(id, parent) {
                continue;
            }
            self.inline_into_parent(id, parent);
        }
    }

    /// True when `id` is the only non-space entry of its comma or colon
    /// separated piece in `parent`.
    fn stands_alone(&self, id: LeafId, parent: LeafId) -> bool {
        let entries = &self.leaves[parent].entries;
        let Some(pos) = entries.iter().position(|e| e.leaf() == Some(id)) else {
            return false;
        };
        let is_separator =
            |e: &Entry| e.token().map_or(false, |t| t.is_comma() || t.is_colon());
        let clear = |e: &Entry| e.is_space();
        entries[..pos]
            .iter()
            .rev()
            .take_while(|e| !is_separator(*e))
            .all(clear)
            && entries[pos + 1..]
                .iter()
                .take_while(|e| !is_separator(*e))
                .all(clear)
    }

    fn inline_into_parent(&mut self, id: LeafId, parent: LeafId) {
        let entries = std::mem::take(&mut self.leaves[id].entries);
        let children = std::mem::take(&mut self.leaves[id].children);
        self.leaves[id].resolved = true;
        self.leaves[id].parent = None;

        for child in &children {
            self.leaves[*child].parent = Some(parent);
            self.shift_depth(*child);
        }

        let parent_leaf = &mut self.leaves[parent];
        if let Some(pos) = parent_leaf.entries.iter().position(|e| e.leaf() == Some(id)) {
            parent_leaf.entries.splice(pos..=pos, entries);
        }
        if let Some(pos) = parent_leaf.children.iter().position(|c| *c == id) {
            parent_leaf.children.splice(pos..=pos, children);
        }
        parent_leaf.has_brackets = !parent_leaf.children.is_empty();
    }

    fn shift_depth(&mut self, id: LeafId) {
        self.leaves[id].depth = self.leaves[id].depth.saturating_sub(1);
        for child in self.leaves[id].children.clone() {
            self.shift_depth(child);
        }
    }

    // ========================================================================
    // Innermost-first traversal
    // ========================================================================

    /// Unresolved leaves without unresolved children, in document order.
    pub fn top_leaves(&self) -> Vec<LeafId> {
        let mut found = Vec::new();
        self.collect_top(ROOT, &mut found);
        found
    }

    fn collect_top(&self, id: LeafId, found: &mut Vec<LeafId>) {
        let leaf = &self.leaves[id];
        if leaf.resolved {
            return;
        }
        let mut open_children = leaf
            .children
            .iter()
            .filter(|c| !self.leaves[**c].resolved)
            .peekable();
        if open_children.peek().is_none() {
            found.push(id);
            return;
        }
        for child in open_children {
            self.collect_top(*child, found);
        }
    }

    pub fn mark_resolved(&mut self, id: LeafId) {
        self.leaves[id].resolved = true;
    }
}

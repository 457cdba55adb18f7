//! spec §4.3 Structure Tracker.
//!
//! Walks a grammar's structure tree in lock-step with incoming tokens. All
//! state is a handful of path-keyed maps (spec §3 "Tracker state"); the tree
//! itself lives in the [`Grammar`] and is never mutated or rebuilt.

use std::rc::Rc;

use indexmap::IndexSet;

use crate::grammar::{Grammar, StructureNode};
use crate::limit::LimitTracker;

/// `path` is a dotted string built from root index, one-of alternative
/// index, and sequence element index (see the `*_path` helpers below). It is
/// stable for the lifetime of a grammar, so counts/choices/cursors keyed by
/// it survive across `tryMatch` calls without needing to walk the tree to
/// find "the same node" again.
#[derive(Debug, Clone, Default)]
pub struct StructureTracker {
    grammar: Option<Rc<Grammar>>,
    counts: std::collections::HashMap<String, u32>,
    choices: std::collections::HashMap<String, usize>,
    seq_cursors: std::collections::HashMap<String, usize>,
    current_index: usize,
}

/// Bumps `depth`'s recursion counter before a recursive descent into the
/// grammar's structure tree, logging and stopping rather than risking a
/// stack overflow on a pathological or hand-edited grammar document. Called
/// at the top of every function that recurses into child nodes.
fn enter(depth: LimitTracker) -> Option<LimitTracker> {
    let mut depth = depth;
    depth.consume();
    if depth.limited() {
        log::warn!("grammar structure recursion limit exceeded");
        return None;
    }
    Some(depth)
}

impl StructureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopts `grammar` as current and resets all tracking state.
    pub fn set_grammar(&mut self, grammar: Grammar) {
        self.grammar = Some(Rc::new(grammar));
        self.reset();
    }

    /// Clears counts, choices, cursors and the root cursor, keeping whatever
    /// grammar is currently loaded (spec §4.3 `reset`).
    pub fn reset(&mut self) {
        self.counts.clear();
        self.choices.clear();
        self.seq_cursors.clear();
        self.current_index = 0;
    }

    fn count(&self, path: &str) -> u32 {
        *self.counts.get(path).unwrap_or(&0)
    }

    fn bump(&mut self, path: &str) {
        *self.counts.entry(path.to_string()).or_insert(0) += 1;
    }

    fn can_match_more_top(&self, node: &StructureNode, count: u32) -> bool {
        node.cardinality().can_match_more(count)
    }

    /// spec §4.3 `hasActiveChildren`.
    fn has_active_children(&self, node: &StructureNode, path: &str, depth: LimitTracker) -> bool {
        let Some(depth) = enter(depth) else {
            return false;
        };
        match node {
            StructureNode::Token { cardinality, .. } => cardinality.can_match_more(self.count(path)),
            StructureNode::OneOf { children, .. } => match self.choices.get(path) {
                Some(&chosen) => {
                    let child_path = oneof_child_path(path, chosen);
                    self.has_active_children(&children[chosen], &child_path, depth)
                }
                None => children.iter().enumerate().any(|(j, child)| {
                    let child_path = oneof_child_path(path, j);
                    let child_count = self.count(&child_path);
                    self.can_match_more_top(child, child_count)
                        || self.has_active_children(child, &child_path, depth)
                }),
            },
            StructureNode::Sequence { children, cardinality } => {
                let count = self.count(path);
                let completed_and_repeatable = cardinality.repeatable() && count >= 1;
                completed_and_repeatable
                    || children.iter().enumerate().any(|(k, child)| {
                        let child_path = seq_child_path(path, k);
                        let child_count = self.count(&child_path);
                        self.can_match_more_top(child, child_count)
                            || self.has_active_children(child, &child_path, depth)
                    })
            }
        }
    }

    /// spec §4.3 "collecting expected kinds": walk a sibling list in order,
    /// collecting from any node that can accept, and stop advancing past a
    /// node whose count is below its minimum unless it is effectively
    /// optional.
    fn collect_siblings(
        &self,
        nodes: &[StructureNode],
        path_fn: impl Fn(usize) -> String,
        out: &mut IndexSet<String>,
        depth: LimitTracker,
    ) {
        for (i, node) in nodes.iter().enumerate() {
            let path = path_fn(i);
            let count = self.count(&path);
            if self.can_match_more_top(node, count) || self.has_active_children(node, &path, depth) {
                self.collect_node_tokens(node, &path, out, depth);
            }
            if count < node.cardinality().min && !node.effectively_optional() {
                break;
            }
        }
    }

    fn collect_node_tokens(
        &self,
        node: &StructureNode,
        path: &str,
        out: &mut IndexSet<String>,
        depth: LimitTracker,
    ) {
        let Some(depth) = enter(depth) else {
            return;
        };
        match node {
            StructureNode::Token { id, .. } => {
                out.insert(id.clone());
            }
            StructureNode::OneOf { children, cardinality } => {
                let count = self.count(path);
                match self.choices.get(path).copied() {
                    None => {
                        for child in children {
                            out.extend(first_tokens(child));
                        }
                    }
                    Some(chosen) => {
                        let child_path = oneof_child_path(path, chosen);
                        self.collect_siblings(
                            std::slice::from_ref(&children[chosen]),
                            |_| child_path.clone(),
                            out,
                            depth,
                        );
                        if cardinality.can_match_more(count) && count >= 1 {
                            for child in children {
                                out.extend(first_tokens(child));
                            }
                        }
                    }
                }
            }
            StructureNode::Sequence { children, cardinality } => {
                let count = self.count(path);
                self.collect_siblings(children, |k| seq_child_path(path, k), out, depth);
                if cardinality.can_match_more(count) && count >= 1 {
                    if let Some(first_child) = children.first() {
                        out.extend(first_tokens(first_child));
                    }
                }
            }
        }
    }

    /// spec §4.3 `getExpectedTokenIds`.
    pub fn get_expected_token_ids(&self) -> IndexSet<String> {
        let mut out = IndexSet::new();
        if let Some(grammar) = &self.grammar {
            self.collect_siblings(&grammar.structure, |i| i.to_string(), &mut out, LimitTracker::default());
        }
        out
    }

    /// Root-level nodes that are required (not effectively optional) but not
    /// yet satisfied, each described by the token kinds that could start it.
    /// Used by the validator to report "missing required field".
    pub fn missing_required(&self) -> Vec<String> {
        let Some(grammar) = &self.grammar else {
            return Vec::new();
        };
        grammar
            .structure
            .iter()
            .enumerate()
            .filter(|(i, node)| {
                !node.effectively_optional() && !node.cardinality().satisfied(self.count(&i.to_string()))
            })
            .map(|(_, node)| first_tokens(node).into_iter().collect::<Vec<_>>().join(" or "))
            .collect()
    }

    /// spec §4.3 `tryMatch`. Attempts the current root index first, then
    /// every other root index in order, so a token can still land inside a
    /// node with active children even after the cursor has moved past it.
    /// State is unchanged on failure (spec §8, invariant 3): every attempt
    /// runs against a clone, which is only committed back on success.
    pub fn try_match(&mut self, kind_id: &str) -> bool {
        let Some(grammar) = self.grammar.clone() else {
            return false;
        };
        let len = grammar.structure.len();
        if len == 0 {
            return false;
        }

        let mut order = Vec::with_capacity(len);
        if self.current_index < len {
            order.push(self.current_index);
        }
        order.extend((0..len).filter(|&i| i != self.current_index));

        for i in order {
            let mut trial = self.clone();
            let path = i.to_string();
            if trial.try_match_node(&grammar.structure[i], &path, kind_id, LimitTracker::default()) {
                trial.advance_root_cursor(i, &grammar.structure[i]);
                *self = trial;
                return true;
            }
        }
        false
    }

    fn advance_root_cursor(&mut self, i: usize, node: &StructureNode) {
        let count = self.count(&i.to_string());
        self.current_index = if node.cardinality().fully_complete(count) {
            i + 1
        } else {
            i
        };
    }

    fn try_match_node(
        &mut self,
        node: &StructureNode,
        path: &str,
        kind_id: &str,
        depth: LimitTracker,
    ) -> bool {
        let Some(depth) = enter(depth) else {
            return false;
        };
        match node {
            StructureNode::Token { id, cardinality } => {
                if id != kind_id {
                    return false;
                }
                if !cardinality.can_match_more(self.count(path)) {
                    return false;
                }
                self.bump(path);
                true
            }
            StructureNode::OneOf { children, cardinality } => {
                let count = self.count(path);
                let chosen = self.choices.get(path).copied();

                let mut order: Vec<usize> = Vec::with_capacity(children.len());
                if let Some(c) = chosen {
                    order.push(c);
                }
                order.extend((0..children.len()).filter(|j| Some(*j) != chosen));

                for j in order {
                    let is_continuation = chosen == Some(j);
                    if !is_continuation && !cardinality.can_match_more(count) {
                        continue;
                    }
                    let child_path = oneof_child_path(path, j);
                    let count_before = self.count(&child_path);
                    if self.try_match_node(&children[j], &child_path, kind_id, depth) {
                        self.choices.insert(path.to_string(), j);
                        let count_after = self.count(&child_path);
                        let increments_oneof = match &children[j] {
                            StructureNode::Token { .. } | StructureNode::OneOf { .. } => true,
                            StructureNode::Sequence { .. } => count_after > count_before,
                        };
                        if increments_oneof {
                            self.bump(path);
                        }
                        return true;
                    }
                }
                false
            }
            StructureNode::Sequence { children, cardinality } => {
                let count = self.count(path);
                let cursor = *self.seq_cursors.get(&seq_cursor_path(path)).unwrap_or(&0);
                let was_complete = self.all_required_satisfied(children, path);

                if self.try_match_sequence_body(children, path, cursor, kind_id, depth) {
                    self.advance_seq_cursor(children, path, depth);
                    let now_complete = self.all_required_satisfied(children, path);
                    if !was_complete && now_complete {
                        let next = self.count(path) + 1;
                        self.counts.insert(path.to_string(), next);
                    }
                    return true;
                }

                if cardinality.can_match_more(count) && count >= 1 {
                    if let Some(first_child) = children.first() {
                        if first_tokens(first_child).contains(kind_id) {
                            self.clear_subtree(path);
                            if self.try_match_sequence_body(children, path, 0, kind_id, depth) {
                                self.advance_seq_cursor(children, path, depth);
                                if self.all_required_satisfied(children, path) {
                                    let next = self.count(path) + 1;
                                    self.counts.insert(path.to_string(), next);
                                }
                                return true;
                            }
                            return false;
                        }
                    }
                }
                false
            }
        }
    }

    fn try_match_sequence_body(
        &mut self,
        children: &[StructureNode],
        seq_path: &str,
        start: usize,
        kind_id: &str,
        depth: LimitTracker,
    ) -> bool {
        for k in start..children.len() {
            let child_path = seq_child_path(seq_path, k);
            let child = &children[k];
            let count = self.count(&child_path);
            if self.can_match_more_top(child, count) || self.has_active_children(child, &child_path, depth) {
                if self.try_match_node(child, &child_path, kind_id, depth) {
                    return true;
                }
            }
            if count < child.cardinality().min && !child.effectively_optional() {
                break;
            }
        }
        false
    }

    fn all_required_satisfied(&self, children: &[StructureNode], seq_path: &str) -> bool {
        children.iter().enumerate().all(|(k, child)| {
            let child_path = seq_child_path(seq_path, k);
            child.effectively_optional() || child.cardinality().satisfied(self.count(&child_path))
        })
    }

    fn advance_seq_cursor(&mut self, children: &[StructureNode], seq_path: &str, depth: LimitTracker) {
        let cursor_key = seq_cursor_path(seq_path);
        let mut cursor = *self.seq_cursors.get(&cursor_key).unwrap_or(&0);
        while cursor < children.len() {
            let child_path = seq_child_path(seq_path, cursor);
            let child = &children[cursor];
            let fully_done = child.cardinality().fully_complete(self.count(&child_path));
            let no_active = !self.has_active_children(child, &child_path, depth);
            if fully_done && no_active {
                cursor += 1;
            } else {
                break;
            }
        }
        self.seq_cursors.insert(cursor_key, cursor);
    }

    /// Drops every tracked entry strictly beneath `path`, preserving `path`'s
    /// own count (the sequence's own completion tally survives a restart of
    /// its body).
    fn clear_subtree(&mut self, path: &str) {
        let prefix = format!("{path}.");
        self.counts.retain(|k, _| !k.starts_with(&prefix));
        self.choices.retain(|k, _| !k.starts_with(&prefix));
        self.seq_cursors.retain(|k, _| !k.starts_with(&prefix));
    }
}

/// The set of token kinds that could legally start `node` from a completely
/// fresh state, ignoring any tracker state. Used where the tracker needs to
/// reason about a node it has not yet entered (a fresh one-of alternative, a
/// sequence's possible next iteration).
fn first_tokens(node: &StructureNode) -> IndexSet<String> {
    match node {
        StructureNode::Token { id, .. } => {
            let mut set = IndexSet::new();
            set.insert(id.clone());
            set
        }
        StructureNode::OneOf { children, .. } => children.iter().flat_map(first_tokens).collect(),
        StructureNode::Sequence { children, .. } => {
            let mut out = IndexSet::new();
            for child in children {
                out.extend(first_tokens(child));
                if !child.effectively_optional() {
                    break;
                }
            }
            out
        }
    }
}

fn oneof_child_path(parent: &str, j: usize) -> String {
    format!("{parent}.{j}")
}

fn seq_child_path(parent: &str, k: usize) -> String {
    format!("{parent}.s.{k}")
}

fn seq_cursor_path(parent: &str) -> String {
    format!("{parent}.seq")
}

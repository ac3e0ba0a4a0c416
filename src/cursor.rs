use std::collections::btree_map;

use crate::index::Index;
use crate::node::NodeId;
use crate::terminal::{SharedTerminal, Terminal};
use crate::vector::Vector;

/// `map.range(..)` when `bound` is "don't care" (zero or a variable),
/// `map.range(bound..=bound)` when it's a literal value to seek to. Using
/// the same `Range` type for both means the rest of `Cursor` doesn't need
/// to know which case it's in.
fn ranged<V>(map: &std::collections::BTreeMap<NodeId, V>, bound: NodeId) -> btree_map::Range<'_, NodeId, V> {
    if bound > 0 {
        map.range(bound..=bound)
    } else {
        map.range(..)
    }
}

/// The leaves of `terminal` a cursor should descend into, as an owned
/// snapshot so the `Mutex` guard doesn't have to outlive `advance()`.
fn leaf_slice(terminal: &Terminal, bound: NodeId) -> Vec<NodeId> {
    if bound > 0 {
        if terminal.contains(bound) {
            vec![bound]
        } else {
            Vec::new()
        }
    } else {
        terminal.iterate().collect()
    }
}

/// A stateful, prefix-filtered iterator over one `Index` (§4.7).
///
/// `current`/`advance` walk the index's own permuted order; `current`
/// un-permutes back to `(subject, predicate, object)` before handing a
/// row to the caller. Repeated-variable constraints (e.g. `?x ?x ?x`,
/// spec §4.6 step 3) are checked here, not by the caller: a row that
/// violates one is skipped transparently during `advance`.
pub struct Cursor<'a> {
    index: &'a Index,
    bound: [NodeId; 3],
    constraints: Vec<(usize, usize)>,
    top_range: btree_map::Range<'a, NodeId, Vector>,
    cur_top: Option<NodeId>,
    mid_range: Option<btree_map::Range<'a, NodeId, SharedTerminal>>,
    cur_mid: Option<NodeId>,
    leaves: Vec<NodeId>,
    leaf_pos: usize,
    exhausted: bool,
}

impl<'a> Cursor<'a> {
    /// `bound` is the seek prefix in the index's own permuted order, as
    /// returned by [`crate::planner::choose_index`]. `constraints` are
    /// pairs of *source* positions (0=s, 1=p, 2=o) that must be equal,
    /// from [`crate::planner::variable_constraints`].
    pub(crate) fn new(index: &'a Index, bound: [NodeId; 3], constraints: Vec<(usize, usize)>) -> Self {
        let top_range = ranged(index.head().map(), bound[0]);
        let mut cursor = Cursor {
            index,
            bound,
            constraints,
            top_range,
            cur_top: None,
            mid_range: None,
            cur_mid: None,
            leaves: Vec::new(),
            leaf_pos: 0,
            exhausted: false,
        };
        if !cursor.advance_raw() {
            cursor.exhausted = true;
        }
        cursor.skip_to_match();
        cursor
    }

    /// Moves to the next `(top, mid, leaf)` satisfying the bound prefix,
    /// ignoring variable constraints. Returns `false` once the index is
    /// exhausted, and marks `self.exhausted` in that case.
    fn advance_raw(&mut self) -> bool {
        if self.leaf_pos + 1 < self.leaves.len() {
            self.leaf_pos += 1;
            return true;
        }
        loop {
            if let Some(mid_range) = self.mid_range.as_mut() {
                if let Some((mid, terminal)) = mid_range.next() {
                    self.cur_mid = Some(*mid);
                    let guard = terminal.lock().expect("terminal lock poisoned");
                    self.leaves = leaf_slice(&guard, self.bound[2]);
                    drop(guard);
                    self.leaf_pos = 0;
                    if !self.leaves.is_empty() {
                        return true;
                    }
                    continue;
                }
            }
            match self.top_range.next() {
                Some((top, vector)) => {
                    self.cur_top = Some(*top);
                    self.mid_range = Some(ranged(vector.map(), self.bound[1]));
                    continue;
                }
                None => {
                    self.exhausted = true;
                    return false;
                }
            }
        }
    }

    fn satisfies_constraints(&self) -> bool {
        if self.constraints.is_empty() {
            return true;
        }
        let (s, p, o) = self.current_unchecked();
        let triple = [s, p, o];
        self.constraints.iter().all(|&(i, j)| triple[i] == triple[j])
    }

    fn skip_to_match(&mut self) {
        while !self.exhausted && !self.satisfies_constraints() {
            if !self.advance_raw() {
                self.exhausted = true;
            }
        }
    }

    fn current_unchecked(&self) -> (NodeId, NodeId, NodeId) {
        let ordered = [
            self.cur_top.expect("cursor positioned"),
            self.cur_mid.expect("cursor positioned"),
            self.leaves[self.leaf_pos],
        ];
        let [s, p, o] = self.index.unapply(ordered);
        (s, p, o)
    }

    /// Whether iteration is complete; `current` is only valid when this
    /// is `false`.
    pub fn finished(&self) -> bool {
        self.exhausted
    }

    /// The row at the cursor's current position, as `(subject,
    /// predicate, object)` regardless of which index is backing it.
    pub fn current(&self) -> Option<(NodeId, NodeId, NodeId)> {
        if self.exhausted {
            None
        } else {
            Some(self.current_unchecked())
        }
    }

    /// Moves to the next matching row. Returns `true` if one was found.
    pub fn advance(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        if !self.advance_raw() {
            return false;
        }
        self.skip_to_match();
        !self.exhausted
    }

    /// Positions at the first row whose leaf value is `>= key`, useful
    /// for a merge join driving this cursor from another. A no-op once
    /// exhausted.
    pub fn seek(&mut self, key: NodeId) {
        loop {
            if self.exhausted {
                return;
            }
            let pos = self.leaves.partition_point(|&l| l < key);
            if pos < self.leaves.len() {
                self.leaf_pos = pos;
                if self.satisfies_constraints() {
                    return;
                }
                if !self.advance_raw() {
                    return;
                }
                continue;
            }
            if !self.advance_raw() {
                return;
            }
        }
    }

    /// No-op: ownership and `Drop` release everything a `Cursor` holds.
    /// Kept for parity with the abstract cursor surface.
    pub fn release(self) {}
}

use std::io::{self, Read, Write};
use std::sync::Arc;

use crate::config::BulkInsertConfig;
use crate::cursor::Cursor;
use crate::errors::{PersistError, StoreError};
use crate::index::{Index, OPS, OSP, POS, PSO, SOP, SPO};
use crate::io_util::{read_magic, write_magic};
use crate::metrics::MetricsSink;
use crate::node::NodeId;
use crate::planner;

const MAGIC: u8 = b'X';

/// Position of each permutation's `Index` in [`Hexastore::indexes`] and in
/// the on-disk snapshot order (§4.8): SPO, SOP, PSO, POS, OSP, OPS.
const IDX_SPO: usize = 0;
const IDX_SOP: usize = 1;
const IDX_PSO: usize = 2;
const IDX_POS: usize = 3;
const IDX_OSP: usize = 4;
const IDX_OPS: usize = 5;

/// A six-way permuted index over `(subject, predicate, object)` triples
/// (§2). Every operation keeps all six `Index`es consistent; callers only
/// ever see the logical triple set through [`Hexastore::add_triple`],
/// [`Hexastore::remove_triple`] and [`Hexastore::get_statements`].
pub struct Hexastore {
    indexes: [Index; 6],
    config: BulkInsertConfig,
    metrics: Option<Arc<dyn MetricsSink>>,
}

impl Default for Hexastore {
    fn default() -> Self {
        Self::new()
    }
}

impl Hexastore {
    pub fn new() -> Self {
        Self::with_config(BulkInsertConfig::default())
    }

    pub fn with_config(config: BulkInsertConfig) -> Self {
        Hexastore {
            indexes: [
                Index::new(SPO),
                Index::new(SOP),
                Index::new(PSO),
                Index::new(POS),
                Index::new(OSP),
                Index::new(OPS),
            ],
            config,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(sink);
        self
    }

    /// Total triples currently stored, read from the SPO index (§6).
    pub fn triples_count(&self) -> u64 {
        self.indexes[IDX_SPO].triples_count()
    }

    /// A best-effort estimate of heap bytes held across all six indexes,
    /// counting each shared `Terminal` once per index that references it
    /// (i.e. twice overall, since every `Terminal` belongs to exactly one
    /// pair). Not a contract, not used by any invariant or test; a
    /// diagnostic only (§9, "Memory-size reporting... warns it is
    /// approximate").
    pub fn memory_size(&self) -> usize {
        self.indexes
            .iter()
            .map(|index| {
                index
                    .head()
                    .iterate()
                    .map(|(_, vector)| {
                        std::mem::size_of::<(NodeId, crate::terminal::SharedTerminal)>()
                            * vector.size()
                            + vector
                                .iterate()
                                .map(|(_, terminal)| {
                                    terminal.lock().expect("terminal lock poisoned").size()
                                        * std::mem::size_of::<NodeId>()
                                })
                                .sum::<usize>()
                    })
                    .sum::<usize>()
            })
            .sum()
    }

    /// Inserts one triple into all six indexes (§4.4). `s`, `p`, `o` must
    /// all be positive; stored triples carry no variable/any encoding.
    /// Returns whether the triple was new.
    pub fn add_triple(&mut self, s: NodeId, p: NodeId, o: NodeId) -> bool {
        assert!(s > 0 && p > 0 && o > 0, "stored triples must be positive NodeIds");
        let mut added = false;
        for &(creating, attaching) in &[
            (IDX_SPO, IDX_PSO),
            (IDX_SOP, IDX_OSP),
            (IDX_POS, IDX_OPS),
        ] {
            let (terminal, was_added) = self.indexes[creating].insert_creating(s, p, o);
            self.indexes[attaching].insert_attaching(s, p, o, terminal, was_added);
            added = was_added;
        }
        if added {
            if let Some(sink) = &self.metrics {
                sink.record_insert(1);
            }
        }
        added
    }

    /// Inserts a batch of triples (§4.4, §5). Below
    /// `config.threaded_batch_size` this is a plain sequential loop; at or
    /// above it, the three Terminal-sharing pairs are each driven by their
    /// own worker thread, since no two threads ever touch the same pair.
    /// Returns the number of triples that were newly added, or a
    /// [`StoreError`] if a worker thread panicked.
    pub fn add_triples(&mut self, batch: &[(NodeId, NodeId, NodeId)]) -> Result<u64, StoreError> {
        if batch.len() < self.config.threaded_batch_size {
            let mut added = 0u64;
            for &(s, p, o) in batch {
                if self.add_triple(s, p, o) {
                    added += 1;
                }
            }
            if added > 0 {
                if let Some(sink) = &self.metrics {
                    sink.record_batch_insert(added);
                }
            }
            return Ok(added);
        }

        log::debug!(
            "add_triples: batch of {} crosses threaded_batch_size ({}), fanning out across 3 workers",
            batch.len(),
            self.config.threaded_batch_size
        );

        let [spo, sop, pso, pos, osp, ops] = &mut self.indexes;
        let scope_result = crossbeam_utils::thread::scope(|scope| {
            let h_spo_pso = scope.spawn(|| insert_pair(spo, pso, batch));
            let h_sop_osp = scope.spawn(|| insert_pair(sop, osp, batch));
            let h_pos_ops = scope.spawn(|| insert_pair(pos, ops, batch));
            [h_spo_pso.join(), h_sop_osp.join(), h_pos_ops.join()]
        });

        let joins = scope_result.map_err(|_| {
            StoreError::ExternalError("bulk insert thread scope panicked".to_string())
        })?;

        let mut counts = [0u64; 3];
        for (slot, join) in counts.iter_mut().zip(joins) {
            *slot = join.map_err(|_| {
                StoreError::ExternalError("a bulk insert worker thread panicked".to_string())
            })?;
        }
        debug_assert!(counts.iter().all(|&c| c == counts[0]));
        let added = counts[0];

        if added > 0 {
            if let Some(sink) = &self.metrics {
                sink.record_batch_insert(added);
            }
        }
        Ok(added)
    }

    /// Removes a triple from all six indexes (§4.4). A no-op, not an
    /// error, if the triple isn't present. Returns whether it was removed.
    ///
    /// Runs through the same three Terminal-sharing pairs `add_triple`
    /// does, creating side first: the creating side of each pair is the
    /// one that actually mutates the shared `Terminal`, and the `removed`
    /// flag it reports is passed to the paired index's `remove_attaching`
    /// rather than let that side re-derive "was it present" by probing
    /// the `Terminal` a second time, after the creating side has already
    /// changed its contents.
    pub fn remove_triple(&mut self, s: NodeId, p: NodeId, o: NodeId) -> bool {
        let mut removed = false;
        for &(creating, attaching) in &[
            (IDX_SPO, IDX_PSO),
            (IDX_SOP, IDX_OSP),
            (IDX_POS, IDX_OPS),
        ] {
            let was_removed = self.indexes[creating].remove_creating(s, p, o);
            self.indexes[attaching].remove_attaching(s, p, o, was_removed);
            removed = was_removed;
        }
        if removed {
            if let Some(sink) = &self.metrics {
                sink.record_remove(1);
            }
        }
        removed
    }

    /// Selects the best index for the access pattern (§4.6) and returns a
    /// cursor over the matching triples, ordered by that index's
    /// permutation.
    pub fn get_statements(&self, s: NodeId, p: NodeId, o: NodeId, order_position: usize) -> Cursor<'_> {
        let (perm, seek) = planner::choose_index(s, p, o, order_position);
        let index = self.index_for(perm);
        let constraints = planner::variable_constraints(s, p, o);
        Cursor::new(index, seek, constraints)
    }

    fn index_for(&self, perm: crate::index::Perm) -> &Index {
        self.indexes
            .iter()
            .find(|index| index.perm() == perm)
            .expect("perm_for always returns one of the six stored permutations")
    }

    /// Writes every index in turn, in the fixed order SPO, SOP, PSO, POS,
    /// OSP, OPS (§4.8). `config` and `metrics` are not persisted.
    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_magic(w, MAGIC)?;
        for index in &self.indexes {
            index.write(w)?;
        }
        Ok(())
    }

    /// Reads a snapshot written by [`Hexastore::write`]. Any index failing
    /// to read aborts the whole read; no partial store is returned (§7).
    pub fn read<R: Read>(r: &mut R) -> Result<Self, PersistError> {
        read_magic(r, MAGIC, "hexastore")?;
        Ok(Hexastore {
            indexes: [
                Index::read(r)?,
                Index::read(r)?,
                Index::read(r)?,
                Index::read(r)?,
                Index::read(r)?,
                Index::read(r)?,
            ],
            config: BulkInsertConfig::default(),
            metrics: None,
        })
    }
}

/// Drives one Terminal-sharing pair through a whole batch, sequentially
/// within this pair (§4.4 step order still applies: creating side first).
fn insert_pair(creating: &mut Index, attaching: &mut Index, batch: &[(NodeId, NodeId, NodeId)]) -> u64 {
    let mut added = 0u64;
    for &(s, p, o) in batch {
        let (terminal, was_added) = creating.insert_creating(s, p, o);
        attaching.insert_attaching(s, p, o, terminal, was_added);
        if was_added {
            added += 1;
        }
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(mut cursor: Cursor<'_>) -> Vec<(NodeId, NodeId, NodeId)> {
        let mut out = Vec::new();
        while let Some(row) = cursor.current() {
            out.push(row);
            if !cursor.advance() {
                break;
            }
        }
        out
    }

    #[test]
    fn memory_size_grows_with_content() {
        let mut hx = Hexastore::new();
        assert_eq!(hx.memory_size(), 0);
        hx.add_triple(1, 2, 3);
        assert!(hx.memory_size() > 0);
    }

    #[test]
    fn insert_is_visible_from_all_six_indexes() {
        let mut hx = Hexastore::new();
        assert!(hx.add_triple(1, 2, 3));
        assert_eq!(hx.triples_count(), 1);
        for perm in [SPO, SOP, PSO, POS, OSP, OPS] {
            let idx = hx.index_for(perm);
            assert_eq!(idx.triples_count(), 1);
        }
    }

    #[test]
    fn every_permutation_cursor_sees_exactly_one_full_prefix_match() {
        let mut hx = Hexastore::new();
        hx.add_triple(1, 2, 3);
        for perm in [SPO, SOP, PSO, POS, OSP, OPS] {
            let index = hx.index_for(perm);
            let seek = index.apply([1, 2, 3]);
            let mut cursor = Cursor::new(index, seek, Vec::new());
            assert_eq!(cursor.current(), Some((1, 2, 3)));
            assert!(!cursor.advance());
        }
    }

    #[test]
    fn remove_keeps_triples_count_in_sync_across_all_six_indexes() {
        let mut hx = Hexastore::new();
        hx.add_triple(1, 2, 3);
        assert!(hx.remove_triple(1, 2, 3));
        for perm in [SPO, SOP, PSO, POS, OSP, OPS] {
            let index = hx.index_for(perm);
            assert_eq!(index.triples_count(), 0, "perm {perm:?} left with a stale triples_count");
            let seek = index.apply([1, 2, 3]);
            let cursor = Cursor::new(index, seek, Vec::new());
            assert!(cursor.finished());
        }
    }

    #[test]
    fn remove_twice_is_idempotent() {
        let mut hx = Hexastore::new();
        assert!(hx.add_triple(7, 8, 9));
        assert!(hx.remove_triple(7, 8, 9));
        assert!(!hx.remove_triple(7, 8, 9));
        assert_eq!(hx.triples_count(), 0);
        for perm in [SPO, SOP, PSO, POS, OSP, OPS] {
            assert_eq!(hx.index_for(perm).triples_count(), 0);
        }
    }

    #[test]
    fn reinsert_is_idempotent() {
        let mut hx = Hexastore::new();
        assert!(hx.add_triple(1, 2, 3));
        assert!(!hx.add_triple(1, 2, 3));
        assert_eq!(hx.triples_count(), 1);
    }

    #[test]
    fn scenario_1_object_ordered_query() {
        let mut hx = Hexastore::new();
        hx.add_triple(1, 2, 3);
        hx.add_triple(1, 2, 4);
        hx.add_triple(1, 5, 3);
        assert_eq!(hx.triples_count(), 3);
        let cursor = hx.get_statements(1, 0, 0, 2);
        assert_eq!(drain(cursor), vec![(1, 2, 3), (1, 5, 3), (1, 2, 4)]);
    }

    #[test]
    fn scenario_2_predicate_bound_query() {
        let mut hx = Hexastore::new();
        hx.add_triple(1, 2, 3);
        hx.add_triple(4, 2, 3);
        hx.add_triple(1, 2, 5);
        let cursor = hx.get_statements(0, 2, 0, 0);
        assert_eq!(drain(cursor), vec![(1, 2, 3), (1, 2, 5), (4, 2, 3)]);
    }

    #[test]
    fn insert_then_remove_leaves_store_empty() {
        let mut hx = Hexastore::new();
        assert!(hx.add_triple(7, 8, 9));
        assert!(hx.remove_triple(7, 8, 9));
        assert_eq!(hx.triples_count(), 0);
        assert!(hx.get_statements(0, 0, 0, 0).finished());
    }

    #[test]
    fn threaded_bulk_insert_matches_sequential() {
        let mut cfg = BulkInsertConfig::default();
        cfg.threaded_batch_size = 4;
        let batch: Vec<_> = (1..=20).map(|i| (i, i + 1, i + 2)).collect();

        let mut threaded = Hexastore::with_config(cfg);
        let added = threaded.add_triples(&batch).unwrap();
        assert_eq!(added, 20);

        let mut serial = Hexastore::new();
        for &(s, p, o) in &batch {
            serial.add_triple(s, p, o);
        }

        assert_eq!(threaded.triples_count(), serial.triples_count());
        let threaded_rows = drain(threaded.get_statements(0, 0, 0, 0));
        let serial_rows = drain(serial.get_statements(0, 0, 0, 0));
        assert_eq!(threaded_rows, serial_rows);
    }

    #[test]
    fn round_trip_preserves_triples() {
        let mut hx = Hexastore::new();
        for (s, p, o) in [(1, 2, 3), (1, 5, 3), (2, 2, 2)] {
            hx.add_triple(s, p, o);
        }
        let mut buf = Vec::new();
        hx.write(&mut buf).unwrap();
        let back = Hexastore::read(&mut &buf[..]).unwrap();
        assert_eq!(back.triples_count(), hx.triples_count());
        assert_eq!(
            drain(back.get_statements(0, 0, 0, 0)),
            drain(hx.get_statements(0, 0, 0, 0)),
        );
    }
}

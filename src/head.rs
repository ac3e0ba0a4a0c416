use std::collections::BTreeMap;
use std::io::{self, Read, Write};

use crate::errors::PersistError;
use crate::io_util::{
    checked_capacity, read_magic, read_node_id, read_u32, read_u64, write_magic, write_node_id,
    write_u32, write_u64,
};
use crate::node::NodeId;
use crate::vector::Vector;

const MAGIC: u8 = b'H';

/// The top level of an index: an ordered map from a top-coordinate
/// `NodeId` to its `Vector`, plus a cached total triple count (§4.3).
///
/// Ordering is strict ascending `NodeId` order; `BTreeMap` gives that for
/// free along with logarithmic positioning via `range()`, which is what a
/// `Cursor` needs for "seek to or past key K".
#[derive(Debug, Default, Clone)]
pub struct Head {
    entries: BTreeMap<NodeId, Vector>,
    triples_count: u64,
}

impl Head {
    pub fn new() -> Self {
        Head {
            entries: BTreeMap::new(),
            triples_count: 0,
        }
    }

    pub fn get(&self, top: NodeId) -> Option<&Vector> {
        self.entries.get(&top)
    }

    pub fn get_or_insert(&mut self, top: NodeId) -> &mut Vector {
        self.entries.entry(top).or_insert_with(Vector::new)
    }

    pub fn get_mut(&mut self, top: NodeId) -> Option<&mut Vector> {
        self.entries.get_mut(&top)
    }

    pub fn remove(&mut self, top: NodeId) -> Option<Vector> {
        self.entries.remove(&top)
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn triples_count(&self) -> u64 {
        self.triples_count
    }

    pub fn bump_triples_count(&mut self) {
        self.triples_count += 1;
    }

    pub fn drop_triples_count(&mut self) {
        self.triples_count -= 1;
    }

    pub fn iterate(&self) -> impl Iterator<Item = (NodeId, &Vector)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn range_from(&self, from: NodeId) -> impl DoubleEndedIterator<Item = (NodeId, &Vector)> {
        self.entries.range(from..).map(|(k, v)| (*k, v))
    }

    /// Raw access to the backing map, for `Cursor`'s fine-grained seeking.
    pub(crate) fn map(&self) -> &BTreeMap<NodeId, Vector> {
        &self.entries
    }

    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_magic(w, MAGIC)?;
        write_u32(w, self.entries.len() as u32)?;
        write_u64(w, self.triples_count)?;
        for (top, vector) in &self.entries {
            write_node_id(w, *top)?;
            vector.write(w)?;
        }
        Ok(())
    }

    pub fn read<R: Read>(r: &mut R) -> Result<Self, PersistError> {
        read_magic(r, MAGIC, "head")?;
        let len = read_u32(r, "head.head_size")?;
        let triples_count = read_u64(r, "head.triples_count")?;
        let cap = checked_capacity(len)?;
        let mut entries = BTreeMap::new();
        for _ in 0..cap.min(len as usize) {
            let top = read_node_id(r, "head.top")?;
            let vector = Vector::read(r)?;
            entries.insert(top, vector);
        }
        Ok(Head {
            entries,
            triples_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_insert_is_idempotent() {
        let mut h = Head::new();
        h.get_or_insert(5).add_creating(1, 1);
        h.get_or_insert(5).add_creating(1, 2);
        assert_eq!(h.size(), 1);
        assert_eq!(h.get(5).unwrap().triples_count(), 2);
    }

    #[test]
    fn range_from_skips_to_bound() {
        let mut h = Head::new();
        for top in [1, 3, 5, 7] {
            h.get_or_insert(top);
        }
        let keys: Vec<_> = h.range_from(4).map(|(k, _)| k).collect();
        assert_eq!(keys, vec![5, 7]);
    }

    #[test]
    fn round_trip() {
        let mut h = Head::new();
        h.get_or_insert(1).add_creating(2, 3);
        h.bump_triples_count();
        let mut buf = Vec::new();
        h.write(&mut buf).unwrap();
        let back = Head::read(&mut &buf[..]).unwrap();
        assert_eq!(back.triples_count(), h.triples_count());
        assert_eq!(back.size(), 1);
    }
}

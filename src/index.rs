use std::io::{self, Read, Write};

use crate::errors::PersistError;
use crate::head::Head;
use crate::io_util::{read_magic, read_u32, write_magic, write_u32};
use crate::node::NodeId;
use crate::terminal::SharedTerminal;

const MAGIC: u8 = b'I';

/// A permutation of `{subject=0, predicate=1, object=2}`, naming which
/// source position is top/mid/leaf in a given index (§3).
pub type Perm = [usize; 3];

/// The six orderings, in the snapshot order required by §4.8.
pub const SPO: Perm = [0, 1, 2];
pub const SOP: Perm = [0, 2, 1];
pub const PSO: Perm = [1, 0, 2];
pub const POS: Perm = [2, 1, 0];
pub const OSP: Perm = [2, 0, 1];
pub const OPS: Perm = [1, 2, 0];

pub(crate) fn apply(perm: Perm, triple: [NodeId; 3]) -> [NodeId; 3] {
    [triple[perm[0]], triple[perm[1]], triple[perm[2]]]
}

/// The inverse of `apply`: given `ordered = apply(perm, triple)`, recovers
/// `triple`.
pub(crate) fn unapply(perm: Perm, ordered: [NodeId; 3]) -> [NodeId; 3] {
    let mut triple = [0; 3];
    for (slot, value) in perm.iter().zip(ordered) {
        triple[*slot] = value;
    }
    triple
}

/// One of the six permutations of the triple: a [`Head`] plus the fixed
/// ordering it stores triples under (§4.4).
#[derive(Debug, Clone)]
pub struct Index {
    head: Head,
    perm: Perm,
}

impl Index {
    pub fn new(perm: Perm) -> Self {
        Index {
            head: Head::new(),
            perm,
        }
    }

    pub fn perm(&self) -> Perm {
        self.perm
    }

    pub fn head(&self) -> &Head {
        &self.head
    }

    pub fn triples_count(&self) -> u64 {
        self.head.triples_count()
    }

    pub fn apply(&self, triple: [NodeId; 3]) -> [NodeId; 3] {
        apply(self.perm, triple)
    }

    pub fn unapply(&self, ordered: [NodeId; 3]) -> [NodeId; 3] {
        unapply(self.perm, ordered)
    }

    /// The creating side of a paired insert (§4.4 step 2). Returns the
    /// `Terminal` the caller must hand to the paired index's
    /// [`Index::insert_attaching`], and whether the triple was new.
    pub fn insert_creating(&mut self, s: NodeId, p: NodeId, o: NodeId) -> (SharedTerminal, bool) {
        let [top, mid, leaf] = self.apply([s, p, o]);
        let (terminal, added) = self.head.get_or_insert(top).add_creating(mid, leaf);
        if added {
            self.head.bump_triples_count();
        }
        (terminal, added)
    }

    /// The paired side of a paired insert (§4.4 step 3).
    pub fn insert_attaching(
        &mut self,
        s: NodeId,
        p: NodeId,
        o: NodeId,
        terminal: SharedTerminal,
        added: bool,
    ) {
        let [top, mid, _leaf] = self.apply([s, p, o]);
        self.head.get_or_insert(top).add_attaching(mid, terminal, added);
        if added {
            self.head.bump_triples_count();
        }
    }

    /// The creating side of a paired removal (§4.4 "Removal"), mirroring
    /// `insert_creating`: actually removes the leaf from the shared
    /// `Terminal` and reports whether it was present. A leaf-absent
    /// delete is a no-op, not an error.
    pub fn remove_creating(&mut self, s: NodeId, p: NodeId, o: NodeId) -> bool {
        let [top, mid, leaf] = self.apply([s, p, o]);
        let Some(vector) = self.head.get_mut(top) else {
            return false;
        };
        let removed = vector.remove_creating(mid, leaf);
        let empty = vector.size() == 0;
        if empty {
            self.head.remove(top);
        }
        if removed {
            self.head.drop_triples_count();
        }
        removed
    }

    /// The paired side of a paired removal, mirroring `insert_attaching`:
    /// the creating side has already removed the leaf from the shared
    /// `Terminal`, so this index applies the `removed` flag it is handed
    /// instead of probing the (already-mutated) `Terminal` itself.
    pub fn remove_attaching(&mut self, s: NodeId, p: NodeId, o: NodeId, removed: bool) {
        let [top, mid, _leaf] = self.apply([s, p, o]);
        let Some(vector) = self.head.get_mut(top) else {
            return;
        };
        vector.remove_attaching(mid, removed);
        let empty = vector.size() == 0;
        if empty {
            self.head.remove(top);
        }
        if removed {
            self.head.drop_triples_count();
        }
    }

    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_magic(w, MAGIC)?;
        for p in self.perm {
            write_u32(w, p as u32)?;
        }
        self.head.write(w)
    }

    pub fn read<R: Read>(r: &mut R) -> Result<Self, PersistError> {
        read_magic(r, MAGIC, "index")?;
        let mut perm = [0usize; 3];
        for slot in perm.iter_mut() {
            *slot = read_u32(r, "index.permutation")? as usize;
        }
        let head = Head::read(r)?;
        Ok(Index { head, perm })
    }
}

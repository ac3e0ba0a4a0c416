use crate::index::{self, Perm, OPS, OSP, POS, PSO, SOP, SPO};
use crate::node::{binding_of, is_bound, Binding, NodeId};

/// Maps `(top, mid)` (two of `{subject=0, predicate=1, object=2}`) to
/// the one permutation that starts with that pair. All six ordered pairs
/// of distinct positions are covered by exactly one of the six indexes.
fn perm_for(top: usize, mid: usize) -> Perm {
    match (top, mid) {
        (0, 1) => SPO,
        (0, 2) => SOP,
        (1, 0) => PSO,
        (1, 2) => OPS,
        (2, 0) => OSP,
        (2, 1) => POS,
        _ => unreachable!("top and mid must be distinct positions in 0..3"),
    }
}

/// Selects the index whose permutation best matches an access pattern,
/// and the seek prefix to use against it (§4.6).
///
/// `s`, `p`, `o` follow the query-time sign convention (bound/variable/
/// any, §3). `order_position` is which source position the caller wants
/// the iteration ordered by once the bound prefix is exhausted.
///
/// Returns the chosen permutation and `(s, p, o)` reordered into it,
/// exactly what a [`crate::cursor::Cursor`] needs as its seek prefix.
pub fn choose_index(s: NodeId, p: NodeId, o: NodeId, order_position: usize) -> (Perm, [NodeId; 3]) {
    assert!(order_position < 3, "order_position must be 0, 1 or 2");
    let triple = [s, p, o];
    let mut cols: Vec<usize> = Vec::with_capacity(3);
    let mut used = [false; 3];

    // 1. every bound position, in source order: the mandatory prefix.
    for i in 0..3 {
        if is_bound(triple[i]) {
            cols.push(i);
            used[i] = true;
        }
    }

    // 2. the requested ordering position, whenever there's room. This
    // fires even when that position is itself unbound ("any"): ordering
    // by an unconstrained position is exactly what order_position is for.
    if cols.len() < 3 && !used[order_position] {
        cols.push(order_position);
        used[order_position] = true;
    }

    // 3. repeated variables: a not-yet-placed position whose value
    // equals a value already placed should be co-located with it, so the
    // scan can exploit the equality instead of checking it post hoc.
    for j in 0..3 {
        if used[j] {
            continue;
        }
        if triple[j] != 0 && cols.iter().any(|&k| triple[k] == triple[j]) {
            cols.push(j);
            used[j] = true;
        }
    }

    // 4. whatever's left, keeping order_position for last so it only
    // lands in the prefix when nothing else justified it.
    for j in 0..3 {
        if cols.len() == 3 {
            break;
        }
        if !used[j] && j != order_position {
            cols.push(j);
            used[j] = true;
        }
    }
    if cols.len() < 3 {
        cols.push(order_position);
    }

    log::trace!(
        "choose_index: pattern ({s},{p},{o}) order={order_position} -> cols={cols:?}"
    );

    let perm = perm_for(cols[0], cols[1]);
    let nodes = index::apply(perm, triple);
    (perm, nodes)
}

/// Pairs of source positions (0=subject, 1=predicate, 2=object) bound to
/// the same repeated variable. A `Cursor` checks these post hoc: the
/// index it walks is chosen to co-locate them where possible (step 3
/// above), but the scan itself only matches on value equality, not on
/// variable identity, so the check still has to happen on every row.
pub fn variable_constraints(s: NodeId, p: NodeId, o: NodeId) -> Vec<(usize, usize)> {
    let triple = [s, p, o];
    let mut constraints = Vec::new();
    for i in 0..3 {
        if binding_of(triple[i]) != Binding::Variable {
            continue;
        }
        for j in (i + 1)..3 {
            if triple[j] == triple[i] {
                constraints.push((i, j));
            }
        }
    }
    constraints
}

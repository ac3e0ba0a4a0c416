//------------ NodeId ---------------------------------------------------------

/// An opaque node identifier.
///
/// The sign only carries meaning in the query APIs (§6 in the design notes):
/// a positive value is a concrete, bound node; a negative value names a
/// variable (two query positions sharing the same negative value unify);
/// zero means "don't care". Stored triples always hold three positive
/// `NodeId`s; the sign distinction never appears inside an index.
pub type NodeId = i64;

/// How a query-time `NodeId` should be treated by the planner and cursor.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Binding {
    /// `> 0`: a concrete value the result must equal.
    Bound,
    /// `< 0`: a named variable. Repeated occurrences of the same value
    /// must unify.
    Variable,
    /// `= 0`: unconstrained.
    Any,
}

/// Classifies a query-time `NodeId` by its sign.
pub fn binding_of(value: NodeId) -> Binding {
    match value.signum() {
        1 => Binding::Bound,
        -1 => Binding::Variable,
        _ => Binding::Any,
    }
}

pub fn is_bound(value: NodeId) -> bool {
    value > 0
}

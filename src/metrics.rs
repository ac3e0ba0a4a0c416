//------------ MetricsSink ------------------------------------------------------

/// An optional, per-store observer of mutation events.
///
/// The source this crate is modeled on keeps a process-wide allocator
/// counter toggled by a compile-time flag. That doesn't translate: a
/// process-global counter can't distinguish two stores in the same
/// process, and has no defined lifetime. This trait is the replacement:
/// inject an implementation at construction time via
/// [`crate::Hexastore::with_metrics`] if you want counters; the default is
/// no sink and therefore no overhead beyond a branch.
pub trait MetricsSink: Send + Sync {
    /// Called after a single `add_triple` that actually added a new
    /// triple (idempotent re-inserts are not reported).
    fn record_insert(&self, _triples: u64) {}

    /// Called once per `add_triples` batch with the number of triples
    /// that were newly added (may be less than the batch length if some
    /// were already present).
    fn record_batch_insert(&self, _triples: u64) {}

    /// Called after a `remove_triple` that actually removed a triple.
    fn record_remove(&self, _triples: u64) {}
}

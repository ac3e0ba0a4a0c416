//------------ BulkInsertConfig ------------------------------------------------

/// Tunables for [`crate::Hexastore`].
///
/// The only knob the design calls for is the batch-size threshold past
/// which [`crate::Hexastore::add_triples`] fans out to the three pair
/// worker threads instead of inserting sequentially (§4.5).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BulkInsertConfig {
    /// Batches at or above this size are split across three worker
    /// threads, one per index pair.
    pub threaded_batch_size: usize,
}

impl Default for BulkInsertConfig {
    fn default() -> Self {
        BulkInsertConfig {
            threaded_batch_size: 256,
        }
    }
}

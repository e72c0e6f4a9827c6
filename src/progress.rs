//! Progress-callback trait for per-file and per-stage events.
//!
//! Inject an [`Arc<dyn CompressionProgressCallback>`] via
//! [`crate::config::CompressionConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves each image through its stages.
//!
//! # Example
//!
//! ```rust
//! use pixel_compress::{CompressionConfig, CompressionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl CompressionProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, index: usize, total: usize, input_bytes: usize, output_bytes: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{}: {} -> {} bytes", index + 1, total, input_bytes, output_bytes);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = CompressionConfig::builder()
//!     .progress_callback(counter as Arc<dyn CompressionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::PipelineStage;
use std::sync::Arc;

/// Called by the pipeline as it processes each image.
///
/// Implementations must be `Send + Sync`: batch runs call these methods from
/// several blocking-pool threads at once. All methods have default no-op
/// implementations so callers only override what they care about.
///
/// Single-image entry points report `index = 0` and `total = 1`.
pub trait CompressionProgressCallback: Send + Sync {
    /// Called once before any file of a batch is read.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called when processing of one image begins, before its extension is
    /// checked or its file is read. Always precedes `on_file_complete` or
    /// `on_file_error` for the same `index`.
    ///
    /// # Arguments
    /// * `index` — 0-based position in the batch
    /// * `total` — batch size
    /// * `name`  — file name, or `"<memory>"` for unnamed buffers
    fn on_file_start(&self, index: usize, total: usize, name: String) {
        let _ = (index, total, name);
    }

    /// Called each time an image enters a new pipeline state.
    fn on_stage(&self, name: String, stage: PipelineStage) {
        let _ = (name, stage);
    }

    /// Called when an image has been encoded successfully.
    fn on_file_complete(&self, index: usize, total: usize, input_bytes: usize, output_bytes: usize) {
        let _ = (index, total, input_bytes, output_bytes);
    }

    /// Called when an image fails at any stage.
    fn on_file_error(&self, index: usize, total: usize, error: String) {
        let _ = (index, total, error);
    }

    /// Called once after every file of a batch has been attempted.
    fn on_batch_complete(&self, total: usize, success_count: usize) {
        let _ = (total, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl CompressionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::CompressionConfig`].
pub type ProgressCallback = Arc<dyn CompressionProgressCallback>;

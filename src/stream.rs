//! Streaming batch API: emit per-file results as they complete.
//!
//! ## Why stream?
//!
//! Large batches take a while. A stream-based API lets callers display
//! partial results immediately, drive progress bars, or write results to
//! disk incrementally instead of buffering the whole report in memory.
//!
//! Unlike the eager [`crate::extract::extract_batch`] which returns only
//! after every file finishes, [`extract_stream`] yields one [`FileResult`]
//! per input as each file completes. Files are processed in input order, so
//! the stream order matches the report order.

use std::path::PathBuf;
use std::pin::Pin;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio_stream::Stream;

use crate::config::ExtractionConfig;
use crate::engine::RecognitionEngine;
use crate::error::FileError;
use crate::extract::{extract, CancelFlag};
use crate::output::FileResult;

/// A boxed stream of per-file results.
pub type ResultStream = Pin<Box<dyn Stream<Item = FileResult> + Send>>;

/// Extract a list of files as a stream, one result per input in input order.
///
/// Setting the cancellation flag mid-stream skips the files that have not
/// started yet; their entries carry a cancellation error so the stream still
/// yields exactly one item per input.
pub fn extract_stream(
    paths: Vec<PathBuf>,
    engine: Arc<dyn RecognitionEngine>,
    config: ExtractionConfig,
    cancel: Option<CancelFlag>,
) -> ResultStream {
    let s = stream::iter(paths).then(move |path| {
        let engine = Arc::clone(&engine);
        let config = config.clone();
        let cancel = cancel.clone();
        async move {
            if cancel.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
                return FileResult::from_error(&FileError::Cancelled, 0);
            }
            extract(&path, &engine, &config).await
        }
    });

    Box::pin(s)
}

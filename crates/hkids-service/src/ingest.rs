//! Page-ingestion queue.
//!
//! Book creation answers the HTTP caller as soon as the metadata row
//! commits; the page files are handed to this queue and inserted by a
//! single worker task spawned at startup. The worker shares the process,
//! the runtime, and the connection pool with the request handlers.
//!
//! A failed batch rolls back inside the store, is logged here, and is
//! otherwise terminal: there is no retry, no timeout, and the original
//! caller is never informed. The book keeps `page_count = 0` and no page
//! rows.

use std::sync::Arc;

use tokio::sync::mpsc;

use hkids_core::{BookId, NewPage};
use hkids_store::Store;

/// A batch of pages awaiting insertion for one book.
#[derive(Debug)]
pub struct PageBatch {
    /// The book the pages belong to.
    pub book_id: BookId,

    /// Pages in submission order, `page_number` already assigned.
    pub pages: Vec<NewPage>,
}

/// Sender half of the ingestion queue, cloned into the application state.
#[derive(Clone)]
pub struct IngestQueue {
    tx: mpsc::UnboundedSender<PageBatch>,
}

impl IngestQueue {
    /// Spawn the worker task and return the queue handle.
    #[must_use]
    pub fn start(store: Arc<dyn Store>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<PageBatch>();

        tokio::spawn(async move {
            while let Some(batch) = rx.recv().await {
                let book_id = batch.book_id;
                let count = batch.pages.len();

                match store.insert_pages(&book_id, &batch.pages).await {
                    Ok(()) => {
                        tracing::info!(book_id = %book_id, pages = count, "page batch committed");
                    }
                    Err(e) => {
                        tracing::error!(
                            book_id = %book_id,
                            pages = count,
                            error = %e,
                            "page batch failed; book keeps page_count = 0"
                        );
                    }
                }
            }

            tracing::debug!("ingestion queue closed");
        });

        Self { tx }
    }

    /// Enqueue a page batch for background insertion.
    ///
    /// The send only fails if the worker task is gone, which means the
    /// runtime is shutting down; the failure is logged, not propagated,
    /// matching the fire-and-forget contract of the ingestion path.
    pub fn enqueue(&self, batch: PageBatch) {
        let book_id = batch.book_id;
        if self.tx.send(batch).is_err() {
            tracing::error!(book_id = %book_id, "ingestion worker is gone, page batch dropped");
        }
    }
}

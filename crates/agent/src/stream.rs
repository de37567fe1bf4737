//! Caller-facing operation streams.

use conductor_core::error::ProviderError;
use conductor_core::provider::StreamChunk;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::{Stream, wrappers::ReceiverStream};

/// A lazily-consumed stream of chunks from one streaming operation.
///
/// A provider rejection mid-stream surfaces as an `Err` item carrying the
/// original `ProviderError` unchanged; the history entry and `on_end` reflect
/// the failure regardless of whether the caller keeps polling. Dropping the
/// stream does not abort the underlying provider call.
pub struct OperationStream {
    /// The history entry this operation writes to
    pub history_id: String,

    /// The operation's unique id
    pub operation_id: String,

    inner: ReceiverStream<Result<StreamChunk, ProviderError>>,
}

impl OperationStream {
    pub(crate) fn new(
        history_id: String,
        operation_id: String,
        rx: mpsc::Receiver<Result<StreamChunk, ProviderError>>,
    ) -> Self {
        Self { history_id, operation_id, inner: ReceiverStream::new(rx) }
    }

    /// Receive the next chunk. `None` once the stream has settled.
    pub async fn next(&mut self) -> Option<Result<StreamChunk, ProviderError>> {
        use tokio_stream::StreamExt;
        StreamExt::next(&mut self.inner).await
    }

    /// Drain the stream, concatenating text deltas. Returns the full text on
    /// success or the first provider error encountered.
    pub async fn collect_text(mut self) -> Result<String, ProviderError> {
        let mut text = String::new();
        while let Some(item) = self.next().await {
            if let Some(delta) = item?.delta {
                text.push_str(&delta);
            }
        }
        Ok(text)
    }

    /// Drain the stream, returning the last partial object seen. Returns the
    /// first provider error encountered, if any.
    pub async fn collect_object(mut self) -> Result<Option<serde_json::Value>, ProviderError> {
        let mut object = None;
        while let Some(item) = self.next().await {
            if let Some(partial) = item?.object {
                object = Some(partial);
            }
        }
        Ok(object)
    }
}

impl Stream for OperationStream {
    type Item = Result<StreamChunk, ProviderError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

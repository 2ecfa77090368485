//! Where sessions read readiness from.

use async_trait::async_trait;
use bookify_api::{ApiError, BookClient, BookDetail, BookId, ReadinessStatus};

/// Backend queried by polling sessions.
///
/// [`BookClient`] is the production implementation; tests substitute a
/// scripted source.
#[async_trait]
pub trait ReadinessSource: Send + Sync + 'static {
    /// Read the readiness flag, once per tick.
    async fn status(&self, book_id: BookId) -> Result<ReadinessStatus, ApiError>;

    /// Fetch the full resource once readiness is confirmed.
    async fn resource(&self, book_id: BookId) -> Result<BookDetail, ApiError>;
}

#[async_trait]
impl ReadinessSource for BookClient {
    async fn status(&self, book_id: BookId) -> Result<ReadinessStatus, ApiError> {
        self.readiness(book_id).await
    }

    async fn resource(&self, book_id: BookId) -> Result<BookDetail, ApiError> {
        self.book(book_id).await
    }
}

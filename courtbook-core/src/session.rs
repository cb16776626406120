//! Browser session lifetime seams.

use async_trait::async_trait;

use crate::error::BookingError;
use crate::page::BookingPage;

/// Produces one exclusively owned session per run.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Session: BrowserSession;

    async fn acquire(&self) -> Result<Self::Session, BookingError>;
}

/// A live browser session. Consumed by `release`, so it can only be released once.
///
/// Implementations must also clean up when dropped without `release`
/// (panic or cancellation mid-run).
#[async_trait]
pub trait BrowserSession: Send {
    type Page: BookingPage;

    fn page(&self) -> &Self::Page;

    async fn release(self) -> Result<(), BookingError>;
}

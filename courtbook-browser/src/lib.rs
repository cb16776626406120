//! courtbook-browser: drives the booking page in Chrome over the DevTools
//! Protocol.

pub mod client;
pub mod error;
pub mod launcher;
pub mod page;
pub mod protocol;
pub mod script;
pub mod session;

pub use client::CdpClient;
pub use error::CdpError;
pub use launcher::{BrowserOptions, ChromeSession, ChromeSessionFactory, chrome_args, find_chrome};
pub use page::CdpBookingPage;
pub use session::PageSession;

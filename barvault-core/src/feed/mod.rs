//! Paced, blocking client for the brokerage data gateway.

pub mod client;
pub mod inbox;
pub mod tcp;
pub mod transport;

pub use client::{FeedClient, CLIENT_IDS, PACING_DELAY, STANDARD_TIMEOUT, WIDE_TIMEOUT};
pub use inbox::{FeedInbox, WaitError};
pub use tcp::TcpTransport;
pub use transport::{BarRequest, FeedError, FeedTransport, FeedWire};

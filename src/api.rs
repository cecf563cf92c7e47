//! Provider API clients.

pub mod postmark;

pub use postmark::{PostmarkClient, POSTMARK_API_BASE};

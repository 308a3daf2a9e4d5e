pub mod client;
pub mod error;
pub mod types;

pub use client::{decode_attachment_data, GmailClient, GMAIL_BASE};
pub use error::{GmailError, GmailResult};
pub use types::*;

//! Types for the mail module.

use std::path::PathBuf;

use serde::Serialize;

/// An outgoing message with file attachments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
    /// Raw headers, e.g. `From: Shop <shop@example.com>`.
    pub headers: Vec<String>,
    pub attachments: Vec<PathBuf>,
}

impl MailMessage {
    /// Value of the first `From` header, if any.
    pub fn from_header(&self) -> Option<&str> {
        self.headers.iter().find_map(|header| {
            let (name, value) = header.split_once(':')?;
            name.trim()
                .eq_ignore_ascii_case("from")
                .then(|| value.trim())
        })
    }
}

/// Build a `From` header from a display name and address.
pub fn from_header(name: &str, address: &str) -> String {
    format!("From: {} <{}>", name, address)
}

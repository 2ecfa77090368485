//! Wire models for the book endpoints.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Identifier of a generated book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(u64);

impl BookId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BookId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(BookId)
    }
}

impl From<u64> for BookId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Body of `GET /{id}/status`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessStatus {
    pub pdf_ready: bool,
    /// The backend sends an empty string until the PDF exists
    #[serde(default, deserialize_with = "empty_as_none")]
    pub pdf_path: Option<String>,
}

impl ReadinessStatus {
    pub fn is_ready(&self) -> bool {
        self.pdf_ready
    }
}

/// Body of `GET /{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDetail {
    pub book_id: BookId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub giver: Option<String>,
    #[serde(default)]
    pub appearance: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub pdf_path: Option<String>,
    #[serde(default)]
    pub pdf_ready: Option<bool>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

impl BookDetail {
    /// Both the flag and the artifact path must be present.
    pub fn has_pdf(&self) -> bool {
        self.pdf_ready.unwrap_or(false) && self.pdf_path.is_some()
    }

    pub fn title(&self) -> String {
        match &self.name {
            Some(name) => format!("{}'s book", name),
            None => format!("Book {}", self.book_id),
        }
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

//! # bookify-api
//!
//! Typed async client for the BookifyAI book REST API.
//!
//! The backend creates a book record synchronously and renders its PDF in the
//! background. This crate covers the endpoints a client needs to follow that
//! process: the readiness status, the full book detail, the PDF itself, and
//! the view/download counters.
//!
//! ```rust,ignore
//! use bookify_api::{BookClient, BookId, EnvToken};
//!
//! let client = BookClient::new("http://localhost:8080/api/book")?
//!     .with_credentials(EnvToken::default());
//!
//! let status = client.readiness(BookId::new(42)).await?;
//! if status.is_ready() {
//!     let book = client.book(BookId::new(42)).await?;
//!     println!("{} is ready", book.title());
//! }
//! ```

mod client;
mod credentials;
mod error;
mod models;

pub use client::{BookClient, ClientConfig};
pub use credentials::{Anonymous, CredentialProvider, EnvToken, StaticToken};
pub use error::{ApiError, Result};
pub use models::{BookDetail, BookId, ReadinessStatus};

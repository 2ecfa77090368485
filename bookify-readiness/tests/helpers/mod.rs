//! Scripted readiness source for session tests.
//!
//! Each book gets its own queue of replies; once a queue runs dry the
//! fallback reply is used. Calls are counted per book so tests can assert
//! exactly how many ticks happened.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bookify_api::{ApiError, BookDetail, BookId, ReadinessStatus};
use bookify_readiness::ReadinessSource;

/// Reply to one status request.
#[derive(Debug, Clone)]
pub enum Step {
    NotReady,
    Ready,
    Fail(ApiError),
    /// Answer `ready` after the given delay, simulating a request in flight
    SlowReady(Duration),
}

#[derive(Default)]
struct Calls {
    status: HashMap<BookId, u32>,
    resource: HashMap<BookId, u32>,
}

pub struct ScriptedSource {
    fallback: Step,
    scripts: Mutex<HashMap<BookId, VecDeque<Step>>>,
    resource_failures: Mutex<HashMap<BookId, VecDeque<ApiError>>>,
    calls: Mutex<Calls>,
}

impl ScriptedSource {
    pub fn new(fallback: Step) -> Self {
        Self {
            fallback,
            scripts: Mutex::new(HashMap::new()),
            resource_failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Calls::default()),
        }
    }

    pub fn always_not_ready() -> Self {
        Self::new(Step::NotReady)
    }

    pub fn with_script(self, book_id: u64, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(BookId::new(book_id), steps.into());
        self
    }

    /// Make the next resource fetches for `book_id` fail with these errors.
    pub fn with_resource_failures(self, book_id: u64, errors: Vec<ApiError>) -> Self {
        self.resource_failures
            .lock()
            .unwrap()
            .insert(BookId::new(book_id), errors.into());
        self
    }

    pub fn status_calls(&self, book_id: u64) -> u32 {
        let calls = self.calls.lock().unwrap();
        calls.status.get(&BookId::new(book_id)).copied().unwrap_or(0)
    }

    pub fn resource_calls(&self, book_id: u64) -> u32 {
        let calls = self.calls.lock().unwrap();
        calls.resource.get(&BookId::new(book_id)).copied().unwrap_or(0)
    }

    fn next_step(&self, book_id: BookId) -> Step {
        self.scripts
            .lock()
            .unwrap()
            .get_mut(&book_id)
            .and_then(|steps| steps.pop_front())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

pub fn book(book_id: BookId) -> BookDetail {
    BookDetail {
        book_id,
        name: Some("Ada".to_string()),
        age: Some(6),
        theme: Some("space".to_string()),
        tone: None,
        giver: None,
        appearance: None,
        content: Some("Once upon a time".to_string()),
        pdf_path: Some(format!("/pdfs/book_{}.pdf", book_id)),
        pdf_ready: Some(true),
        created_at: None,
    }
}

fn ready() -> ReadinessStatus {
    ReadinessStatus {
        pdf_ready: true,
        pdf_path: Some("/pdfs/book.pdf".to_string()),
    }
}

#[async_trait]
impl ReadinessSource for ScriptedSource {
    async fn status(&self, book_id: BookId) -> Result<ReadinessStatus, ApiError> {
        *self.calls.lock().unwrap().status.entry(book_id).or_insert(0) += 1;

        match self.next_step(book_id) {
            Step::NotReady => Ok(ReadinessStatus::default()),
            Step::Ready => Ok(ready()),
            Step::Fail(error) => Err(error),
            Step::SlowReady(delay) => {
                tokio::time::sleep(delay).await;
                Ok(ready())
            }
        }
    }

    async fn resource(&self, book_id: BookId) -> Result<BookDetail, ApiError> {
        *self.calls.lock().unwrap().resource.entry(book_id).or_insert(0) += 1;

        let failure = self
            .resource_failures
            .lock()
            .unwrap()
            .get_mut(&book_id)
            .and_then(|errors| errors.pop_front());

        match failure {
            Some(error) => Err(error),
            None => Ok(book(book_id)),
        }
    }
}

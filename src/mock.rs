//! In-memory [`Connection`] for tests.
//!
//! `MockConnection` records every call with the exact shape it was made in, so tests can
//! assert that a link used `post(path, body)` rather than a generic request. Responses are
//! stubbed per path; unstubbed paths answer `404` with no body.

use crate::{Connection, Error, Response};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A call received by a [`MockConnection`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Get(String),
    Head(String),
    Delete(String),
    Post(String, Value),
    Put(String, Value),
    Patch(String, Value),
    Request {
        method: Method,
        path: String,
        body: Option<Value>,
        headers: Option<HeaderMap>,
    },
}

#[derive(Debug, Default)]
pub struct MockConnection {
    calls: Mutex<Vec<Call>>,
    responses: Mutex<HashMap<String, Result<Response, Error>>>,
}

impl MockConnection {
    pub fn new() -> MockConnection {
        MockConnection::default()
    }

    pub fn stub(&self, path: &str, response: Response) {
        lock(&self.responses).insert(path.to_string(), Ok(response));
    }

    /// Makes every call to `path` fail with `error`.
    pub fn stub_err(&self, path: &str, error: Error) {
        lock(&self.responses).insert(path.to_string(), Err(error));
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    fn record(&self, call: Call, path: &str) -> Result<Response, Error> {
        lock(&self.calls).push(call);
        match lock(&self.responses).get(path) {
            Some(response) => response.clone(),
            None => Ok(Response::new(404, None)),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl Connection for MockConnection {
    async fn run_request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: Option<HeaderMap>,
    ) -> Result<Response, Error> {
        let call = Call::Request {
            method,
            path: path.to_string(),
            body,
            headers,
        };
        self.record(call, path)
    }

    async fn get(&self, path: &str) -> Result<Response, Error> {
        self.record(Call::Get(path.to_string()), path)
    }

    async fn head(&self, path: &str) -> Result<Response, Error> {
        self.record(Call::Head(path.to_string()), path)
    }

    async fn delete(&self, path: &str) -> Result<Response, Error> {
        self.record(Call::Delete(path.to_string()), path)
    }

    async fn post(&self, path: &str, body: Value) -> Result<Response, Error> {
        self.record(Call::Post(path.to_string(), body), path)
    }

    async fn put(&self, path: &str, body: Value) -> Result<Response, Error> {
        self.record(Call::Put(path.to_string(), body), path)
    }

    async fn patch(&self, path: &str, body: Value) -> Result<Response, Error> {
        self.record(Call::Patch(path.to_string(), body), path)
    }
}

//! Recording logical client for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use vaultkv_common::{Error, Result};

use crate::logical::LogicalClient;
use crate::secret::{QueryData, Secret, SecretData};

/// One call received by a [`MockLogical`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Read { path: String },
    ReadWithData { path: String, data: QueryData },
    List { path: String },
    Write { path: String, data: SecretData },
    Delete { path: String },
    DeleteWithData { path: String, data: QueryData },
    Unwrap { token: String },
}

impl Call {
    /// Path the call was issued against, if it has one.
    pub fn path(&self) -> Option<&str> {
        match self {
            Call::Read { path }
            | Call::ReadWithData { path, .. }
            | Call::List { path }
            | Call::Write { path, .. }
            | Call::Delete { path }
            | Call::DeleteWithData { path, .. } => Some(path),
            Call::Unwrap { .. } => None,
        }
    }
}

/// Logical client that records every call and replays queued responses.
///
/// Responses are consumed in order, one per call regardless of the
/// operation. Once the queue is empty every call answers `Ok(None)`.
#[derive(Default)]
pub struct MockLogical {
    calls: Mutex<Vec<Call>>,
    responses: Mutex<VecDeque<Result<Option<Secret>>>>,
}

impl MockLogical {
    /// Create a mock with no queued responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw response.
    pub fn respond(&self, response: Option<Secret>) -> &Self {
        self.push(Ok(response))
    }

    /// Queue a response whose envelope carries `data`.
    pub fn respond_with_data(&self, data: SecretData) -> &Self {
        self.respond(Some(Secret::with_data(data)))
    }

    /// Queue a failure.
    pub fn fail(&self, err: Error) -> &Self {
        self.push(Err(err))
    }

    /// All calls received so far, oldest first.
    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn push(&self, response: Result<Option<Secret>>) -> &Self {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
        self
    }

    fn record(&self, call: Call) -> Result<Option<Secret>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(Ok(None))
    }
}

#[async_trait]
impl LogicalClient for MockLogical {
    async fn read(&self, path: &str) -> Result<Option<Secret>> {
        self.record(Call::Read {
            path: path.to_string(),
        })
    }

    async fn read_with_data(&self, path: &str, data: &QueryData) -> Result<Option<Secret>> {
        self.record(Call::ReadWithData {
            path: path.to_string(),
            data: data.clone(),
        })
    }

    async fn list(&self, path: &str) -> Result<Option<Secret>> {
        self.record(Call::List {
            path: path.to_string(),
        })
    }

    async fn write(&self, path: &str, data: SecretData) -> Result<Option<Secret>> {
        self.record(Call::Write {
            path: path.to_string(),
            data,
        })
    }

    async fn delete(&self, path: &str) -> Result<Option<Secret>> {
        self.record(Call::Delete {
            path: path.to_string(),
        })
    }

    async fn delete_with_data(&self, path: &str, data: &QueryData) -> Result<Option<Secret>> {
        self.record(Call::DeleteWithData {
            path: path.to_string(),
            data: data.clone(),
        })
    }

    async fn unwrap_token(&self, wrapping_token: &str) -> Result<Option<Secret>> {
        self.record(Call::Unwrap {
            token: wrapping_token.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_records_calls_in_order() {
        let mock = MockLogical::new();

        mock.read("/a").await.unwrap();
        mock.list("/b").await.unwrap();
        mock.unwrap_token("tok").await.unwrap();

        assert_eq!(
            mock.calls(),
            vec![
                Call::Read { path: "/a".to_string() },
                Call::List { path: "/b".to_string() },
                Call::Unwrap { token: "tok".to_string() },
            ]
        );
        assert_eq!(mock.calls()[1].path(), Some("/b"));
        assert_eq!(mock.calls()[2].path(), None);
    }

    #[tokio::test]
    async fn test_replays_responses_then_none() {
        let mock = MockLogical::new();
        let mut data = SecretData::new();
        data.insert("foo".to_string(), json!("bar"));

        mock.respond_with_data(data.clone())
            .fail(Error::Network("boom".to_string()));

        let first = mock.read("/x").await.unwrap().unwrap();
        assert_eq!(first.data, data);
        assert!(matches!(mock.read("/x").await, Err(Error::Network(_))));
        assert!(mock.read("/x").await.unwrap().is_none());
        assert_eq!(mock.call_count(), 3);
    }
}

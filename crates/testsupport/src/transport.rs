//! In-memory transport that records every call made through it.
//!
//! Used to verify transaction boundaries and connection release without a real
//! database, and to inject failures at chosen points.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use common::BoxError;
use executor::{Connection, ConnectionProvider};
use types::Value;

/// One call observed by a [`RecordingProvider`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    Acquire,
    Begin,
    Execute(String),
    Query(String),
    Commit,
    Rollback,
    Release,
}

#[derive(Default)]
struct Recorder {
    events: Vec<TransportEvent>,
    params: Vec<Vec<Value>>,
    query_results: VecDeque<Vec<Vec<Value>>>,
    fail_acquire: bool,
    fail_commit: bool,
    fail_execute_containing: Option<String>,
}

/// Connection provider whose connections log into a shared event list.
///
/// # Example
///
/// ```
/// use testsupport::transport::{RecordingProvider, TransportEvent};
/// use executor::ConnectionProvider;
///
/// let provider = RecordingProvider::new();
/// drop(provider.acquire().unwrap());
/// assert_eq!(
///     provider.events(),
///     vec![TransportEvent::Acquire, TransportEvent::Release]
/// );
/// ```
#[derive(Clone, Default)]
pub struct RecordingProvider {
    recorder: Arc<Mutex<Recorder>>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far, oldest first.
    pub fn events(&self) -> Vec<TransportEvent> {
        self.lock().events.clone()
    }

    /// Parameters bound to every `execute` and `query` call, in call order.
    pub fn bound_params(&self) -> Vec<Vec<Value>> {
        self.lock().params.clone()
    }

    /// SQL text of every `execute` call.
    pub fn executed_sql(&self) -> Vec<String> {
        self.lock()
            .events
            .iter()
            .filter_map(|event| match event {
                TransportEvent::Execute(sql) => Some(sql.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, event: &TransportEvent) -> usize {
        self.lock().events.iter().filter(|e| *e == event).count()
    }

    pub fn clear(&self) {
        let mut recorder = self.lock();
        recorder.events.clear();
        recorder.params.clear();
    }

    /// Rows returned by the next `query` call. Queries without a queued result return no rows.
    pub fn push_query_result(&self, rows: Vec<Vec<Value>>) -> &Self {
        self.lock().query_results.push_back(rows);
        self
    }

    pub fn fail_acquire(&self) -> &Self {
        self.lock().fail_acquire = true;
        self
    }

    pub fn fail_commit(&self) -> &Self {
        self.lock().fail_commit = true;
        self
    }

    /// Fail every `execute` whose SQL or bound parameters mention `needle`.
    pub fn fail_execute_containing(&self, needle: impl Into<String>) -> &Self {
        self.lock().fail_execute_containing = Some(needle.into());
        self
    }

    fn lock(&self) -> MutexGuard<'_, Recorder> {
        self.recorder.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ConnectionProvider for RecordingProvider {
    fn acquire(&self) -> Result<Box<dyn Connection>, BoxError> {
        let mut recorder = self.lock();
        if recorder.fail_acquire {
            return Err("connection refused".into());
        }
        recorder.events.push(TransportEvent::Acquire);
        Ok(Box::new(RecordingConnection {
            recorder: Arc::clone(&self.recorder),
        }))
    }
}

struct RecordingConnection {
    recorder: Arc<Mutex<Recorder>>,
}

impl RecordingConnection {
    fn lock(&self) -> MutexGuard<'_, Recorder> {
        self.recorder.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Connection for RecordingConnection {
    fn begin(&mut self) -> Result<(), BoxError> {
        self.lock().events.push(TransportEvent::Begin);
        Ok(())
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, BoxError> {
        let mut recorder = self.lock();
        recorder.events.push(TransportEvent::Execute(sql.to_string()));
        recorder.params.push(params.to_vec());
        if let Some(needle) = &recorder.fail_execute_containing {
            let in_params = params
                .iter()
                .any(|value| value.as_str() == Some(needle.as_str()));
            if sql.contains(needle.as_str()) || in_params {
                return Err(format!("injected failure on '{needle}'").into());
            }
        }
        Ok(1)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Vec<Value>>, BoxError> {
        let mut recorder = self.lock();
        recorder.events.push(TransportEvent::Query(sql.to_string()));
        recorder.params.push(params.to_vec());
        Ok(recorder.query_results.pop_front().unwrap_or_default())
    }

    fn commit(&mut self) -> Result<(), BoxError> {
        let mut recorder = self.lock();
        if recorder.fail_commit {
            return Err("commit refused".into());
        }
        recorder.events.push(TransportEvent::Commit);
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), BoxError> {
        self.lock().events.push(TransportEvent::Rollback);
        Ok(())
    }
}

impl Drop for RecordingConnection {
    fn drop(&mut self) {
        self.lock().events.push(TransportEvent::Release);
    }
}

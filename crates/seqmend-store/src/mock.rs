use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};

use crate::error::{SessionError, SessionResult};
use crate::session::SqlSession;

/// A mock session for testing the repair and migration paths.
///
/// Scalar query results are scripted in FIFO order; every statement that
/// passes through the session is recorded so tests can assert ordering.
#[derive(Clone, Default)]
pub struct MockSession {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Scripted results for `query_opt_i64`, FIFO. Empty means `None`.
    i64_results: VecDeque<Option<i64>>,
    /// Scripted results for `query_opt_text`, FIFO. Empty means `None`.
    text_results: VecDeque<Option<String>>,
    /// Every statement seen, in order.
    log: Vec<String>,
    /// Statements passed to `execute`, in order.
    executed: Vec<String>,
    /// If set, all scalar queries fail with this message.
    fail_queries: Option<String>,
    /// If set, `execute` fails for statements containing the needle.
    fail_execute_containing: Option<(String, String)>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next `query_opt_i64` result.
    pub fn script_i64(&self, result: Option<i64>) -> &Self {
        self.state.lock().unwrap().i64_results.push_back(result);
        self
    }

    /// Script the next `query_opt_text` result.
    pub fn script_text(&self, result: Option<&str>) -> &Self {
        self.state
            .lock()
            .unwrap()
            .text_results
            .push_back(result.map(str::to_string));
        self
    }

    /// Make all scalar queries fail.
    pub fn fail_queries(&self, message: impl Into<String>) -> &Self {
        self.state.lock().unwrap().fail_queries = Some(message.into());
        self
    }

    /// Make `execute` fail for statements containing `needle`.
    pub fn fail_execute_containing(
        &self,
        needle: impl Into<String>,
        message: impl Into<String>,
    ) -> &Self {
        self.state.lock().unwrap().fail_execute_containing =
            Some((needle.into(), message.into()));
        self
    }

    /// All statements seen, in order.
    pub fn statement_log(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }

    /// Statements passed to `execute`, in order.
    pub fn executed_statements(&self) -> Vec<String> {
        self.state.lock().unwrap().executed.clone()
    }
}

impl SqlSession for MockSession {
    fn query_opt_i64(
        &self,
        statement: &str,
    ) -> impl Future<Output = SessionResult<Option<i64>>> + Send {
        let state = self.state.clone();
        let statement = statement.to_string();
        async move {
            let mut state = state.lock().unwrap();
            state.log.push(statement);

            if let Some(ref message) = state.fail_queries {
                return Err(SessionError::Execution(message.clone()));
            }

            Ok(state.i64_results.pop_front().flatten())
        }
    }

    fn query_opt_text(
        &self,
        statement: &str,
    ) -> impl Future<Output = SessionResult<Option<String>>> + Send {
        let state = self.state.clone();
        let statement = statement.to_string();
        async move {
            let mut state = state.lock().unwrap();
            state.log.push(statement);

            if let Some(ref message) = state.fail_queries {
                return Err(SessionError::Execution(message.clone()));
            }

            Ok(state.text_results.pop_front().flatten())
        }
    }

    fn execute(&self, statement: &str) -> impl Future<Output = SessionResult<u64>> + Send {
        let state = self.state.clone();
        let statement = statement.to_string();
        async move {
            let mut state = state.lock().unwrap();
            // The attempt is logged either way, as a real session would
            // observe it; only successful statements count as executed.
            state.log.push(statement.clone());

            if let Some((ref needle, ref message)) = state.fail_execute_containing {
                if statement.contains(needle.as_str()) {
                    return Err(SessionError::Execution(message.clone()));
                }
            }

            state.executed.push(statement);
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_results_are_fifo() {
        let session = MockSession::new();
        session.script_i64(Some(5)).script_i64(None);

        assert_eq!(session.query_opt_i64("SELECT 1").await.unwrap(), Some(5));
        assert_eq!(session.query_opt_i64("SELECT 2").await.unwrap(), None);
        // Unscripted queries return None.
        assert_eq!(session.query_opt_i64("SELECT 3").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_log_preserves_order() {
        let session = MockSession::new();
        session.query_opt_i64("a").await.unwrap();
        session.execute("b").await.unwrap();
        session.query_opt_text("c").await.unwrap();

        assert_eq!(session.statement_log(), vec!["a", "b", "c"]);
        assert_eq!(session.executed_statements(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_targeted_execute_failure() {
        let session = MockSession::new();
        session.fail_execute_containing("CREATE", "boom");

        assert!(session.execute("DROP SEQUENCE S").await.is_ok());
        assert!(session.execute("CREATE SEQUENCE S").await.is_err());

        // The failed attempt shows up in the log but not as executed.
        assert_eq!(
            session.statement_log(),
            vec!["DROP SEQUENCE S", "CREATE SEQUENCE S"]
        );
        assert_eq!(session.executed_statements(), vec!["DROP SEQUENCE S"]);
    }
}

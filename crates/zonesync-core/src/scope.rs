// # Task Scope
//
// Structured fan-out/fan-in for one zone, one zone's changes, or one zone's
// record fetches. Every spawned task is joined before the scope returns; no
// task is aborted and a failed task never cancels its siblings. The scope owns
// a child of the caller's cancellation token, so only the caller can stop the
// tasks early.

use std::future::Future;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

pub(crate) struct TaskScope<T> {
    tasks: JoinSet<Result<T>>,
    token: CancellationToken,
}

impl<T: Send + 'static> TaskScope<T> {
    pub(crate) fn new(parent: &CancellationToken) -> Self {
        Self {
            tasks: JoinSet::new(),
            token: parent.child_token(),
        }
    }

    /// Token tasks of this scope must observe
    pub(crate) fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub(crate) fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        self.tasks.spawn(task);
    }

    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Join every task, returning results in completion order
    pub(crate) async fn join_all(mut self) -> Vec<Result<T>> {
        let mut results = Vec::with_capacity(self.tasks.len());
        while let Some(joined) = self.tasks.join_next().await {
            results.push(joined.unwrap_or_else(|e| Err(Error::Task(e.to_string()))));
        }
        results
    }

    /// Join every task; the first recorded error wins
    pub(crate) async fn join(self) -> Result<Vec<T>> {
        let mut values = Vec::new();
        let mut first_error = None;
        for result in self.join_all().await {
            match result {
                Ok(value) => values.push(value),
                Err(e) if first_error.is_none() => first_error = Some(e),
                Err(_) => {}
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(values),
        }
    }
}

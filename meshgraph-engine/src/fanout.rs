//! Parallel fetches joined at a barrier.
//!
//! Every task owns its result and tags it with its spawn index. Nothing is
//! shared between tasks; results are merged on the calling task once all of
//! them have finished. A failing task does not cancel its siblings.

use std::future::Future;

use tokio::task::JoinSet;
use tracing::{error, Instrument, Span};

use crate::{EngineError, SourceError};

/// A set of indexed fetch tasks.
pub(crate) struct FanOut<T> {
    tasks: JoinSet<(usize, Result<T, SourceError>)>,
    spawned: usize,
}

impl<T: Send + 'static> FanOut<T> {
    pub(crate) fn new() -> Self {
        Self {
            tasks: JoinSet::new(),
            spawned: 0,
        }
    }

    /// Spawn a fetch inside the given span.
    pub(crate) fn spawn<F>(&mut self, span: Span, fetch: F)
    where
        F: Future<Output = Result<T, SourceError>> + Send + 'static,
    {
        let index = self.spawned;
        self.spawned += 1;
        self.tasks
            .spawn(async move { (index, fetch.await) }.instrument(span));
    }

    /// Wait for every task, then return the results in spawn order.
    ///
    /// If any task failed, the first failure recorded at the barrier is
    /// returned and every result is discarded.
    pub(crate) async fn join(mut self) -> Result<Vec<T>, EngineError> {
        let mut results = Vec::with_capacity(self.spawned);
        let mut first_error: Option<EngineError> = None;

        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok((index, Ok(value))) => results.push((index, value)),
                Ok((index, Err(err))) => {
                    error!(task = index, error = %err, "Fetch failed");
                    first_error.get_or_insert(EngineError::Source(err));
                }
                Err(err) => {
                    error!(error = %err, "Fetch task did not complete");
                    first_error.get_or_insert(EngineError::Task(err));
                }
            }
        }

        if let Some(err) = first_error {
            return Err(err);
        }

        results.sort_by_key(|(index, _)| *index);
        Ok(results.into_iter().map(|(_, value)| value).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tracing::info_span;

    #[tokio::test]
    async fn test_results_in_spawn_order() {
        let mut fan_out = FanOut::new();
        for (i, delay) in [30u64, 10, 20].into_iter().enumerate() {
            fan_out.spawn(info_span!("task"), async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok(i)
            });
        }
        assert_eq!(fan_out.join().await.unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_failure_discards_results() {
        let mut fan_out = FanOut::new();
        fan_out.spawn(info_span!("ok"), async { Ok(1) });
        fan_out.spawn(info_span!("bad"), async {
            Err(SourceError::backend("boom"))
        });

        let err = fan_out.join().await.unwrap_err();
        assert!(matches!(err, EngineError::Source(ref e) if e.message() == "boom"));
    }

    #[tokio::test]
    async fn test_siblings_run_to_completion() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut fan_out = FanOut::new();
        fan_out.spawn(info_span!("bad"), async {
            Err::<(), _>(SourceError::backend("first"))
        });
        fan_out.spawn(info_span!("slow"), async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let _ = tx.send(());
            Ok(())
        });

        assert!(fan_out.join().await.is_err());
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_empty_fan_out() {
        let fan_out: FanOut<()> = FanOut::new();
        assert!(fan_out.join().await.unwrap().is_empty());
    }
}

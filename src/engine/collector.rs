// src/engine/collector.rs
use std::sync::Arc;
use parking_lot::Mutex;
use tracing::{error, trace};

use super::result::ExecutionResult;

/// Aggregates outcomes from concurrently finishing jobs.
///
/// Clones share the same storage, so a clone can be moved into every job's
/// completion handler. Each entry remembers the submission index of its job,
/// which lets the caller read results back either in completion order or in
/// submission order. The collector never holds more entries than jobs were
/// submitted.
#[derive(Clone)]
pub struct ResultCollector {
    entries: Arc<Mutex<Vec<(usize, ExecutionResult)>>>,
    submitted: usize,
}

impl ResultCollector {
    /// Create a collector for `submitted` jobs
    pub fn new(submitted: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::with_capacity(submitted))),
            submitted,
        }
    }

    /// Record the outcome of job `index`. Returns false if the entry was refused.
    pub fn append(&self, index: usize, result: ExecutionResult) -> bool {
        let mut entries = self.entries.lock();

        if index >= self.submitted || entries.len() >= self.submitted {
            error!("Refusing result for job {} from worker {}: {} of {} slots used",
                index, result.worker(), entries.len(), self.submitted);
            return false;
        }

        trace!("Collected result for job {} from worker {}", index, result.worker());
        entries.push((index, result));
        true
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Take every collected result in the order jobs finished
    pub fn drain_completion_order(&self) -> Vec<ExecutionResult> {
        let entries = std::mem::take(&mut *self.entries.lock());
        entries.into_iter().map(|(_, result)| result).collect()
    }

    /// Take every collected result in the order jobs were submitted
    pub fn drain_submission_order(&self) -> Vec<ExecutionResult> {
        let mut entries = std::mem::take(&mut *self.entries.lock());
        entries.sort_by_key(|(index, _)| *index);
        entries.into_iter().map(|(_, result)| result).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::result::FailureKind;

    #[test]
    fn test_orders() {
        let collector = ResultCollector::new(3);
        assert!(collector.append(2, ExecutionResult::success("c", "third")));
        assert!(collector.append(0, ExecutionResult::success("a", "first")));
        assert!(collector.append(1, ExecutionResult::failed("b", "t", FailureKind::WorkerError, "boom")));

        let snapshot = collector.clone();
        let by_submission: Vec<_> = snapshot.drain_submission_order().iter().map(|r| r.worker().to_string()).collect();
        assert_eq!(by_submission, vec!["a", "b", "c"]);
        assert!(collector.is_empty());
    }

    #[test]
    fn test_completion_order_is_append_order() {
        let collector = ResultCollector::new(2);
        collector.append(1, ExecutionResult::success("b", "x"));
        collector.append(0, ExecutionResult::success("a", "y"));

        let workers: Vec<_> = collector.drain_completion_order().iter().map(|r| r.worker().to_string()).collect();
        assert_eq!(workers, vec!["b", "a"]);
    }

    #[test]
    fn test_never_exceeds_submitted() {
        let collector = ResultCollector::new(1);
        assert!(collector.append(0, ExecutionResult::success("a", "x")));
        assert!(!collector.append(0, ExecutionResult::success("a", "again")));
        assert!(!collector.append(5, ExecutionResult::success("z", "out of range")));
        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn test_concurrent_writers() {
        let collector = ResultCollector::new(64);
        std::thread::scope(|scope| {
            for index in 0..64 {
                let collector = collector.clone();
                scope.spawn(move || {
                    collector.append(index, ExecutionResult::success(format!("w{}", index), "ok"));
                });
            }
        });

        let results = collector.drain_submission_order();
        assert_eq!(results.len(), 64);
        assert_eq!(results[10].worker(), "w10");
    }
}

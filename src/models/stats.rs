use std::sync::{Arc, Mutex, MutexGuard};

use super::RagFlag;

/// Counter values at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Generation failures (transport, empty stream, malformed output)
    pub errors: u64,
    /// RAG documents whose publish call completed, whatever the status
    pub rag_generated: u64,
    /// NO-RAG documents whose publish call completed, whatever the status
    pub no_rag_generated: u64,
    /// RAG documents the storage API confirmed as created
    pub rag_persisted: u64,
    /// NO-RAG documents the storage API confirmed as created
    pub no_rag_persisted: u64,
}

/// Run-wide counters shared by every generation task.
///
/// Cloning hands out another handle to the same counters. All updates go
/// through a single lock so concurrent tasks never lose an increment.
#[derive(Debug, Clone, Default)]
pub struct RunStatistics {
    inner: Arc<Mutex<StatsSnapshot>>,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StatsSnapshot> {
        // A panicking task cannot leave the counters half-updated
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn record_error(&self) {
        self.lock().errors += 1;
    }

    /// Record a completed publish attempt for one variant
    pub fn record_publish(&self, rag: RagFlag, persisted: bool) {
        let mut stats = self.lock();
        match rag {
            RagFlag::Rag => {
                stats.rag_generated += 1;
                if persisted {
                    stats.rag_persisted += 1;
                }
            }
            RagFlag::NoRag => {
                stats.no_rag_generated += 1;
                if persisted {
                    stats.no_rag_persisted += 1;
                }
            }
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        *self.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_publish_splits_attempted_and_persisted() {
        let stats = RunStatistics::new();
        stats.record_publish(RagFlag::Rag, true);
        stats.record_publish(RagFlag::Rag, false);
        stats.record_publish(RagFlag::NoRag, false);

        let snap = stats.snapshot();
        assert_eq!(snap.rag_generated, 2);
        assert_eq!(snap.rag_persisted, 1);
        assert_eq!(snap.no_rag_generated, 1);
        assert_eq!(snap.no_rag_persisted, 0);
        assert_eq!(snap.errors, 0);
    }

    #[test]
    fn test_concurrent_error_increments_are_not_lost() {
        const THREADS: u64 = 16;
        const PER_THREAD: u64 = 5_000;

        let stats = RunStatistics::new();
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let stats = stats.clone();
                std::thread::spawn(move || {
                    for _ in 0..PER_THREAD {
                        stats.record_error();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(stats.snapshot().errors, THREADS * PER_THREAD);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_tasks_share_counters() {
        let stats = RunStatistics::new();
        let mut set = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let stats = stats.clone();
            set.spawn(async move {
                for i in 0..1_000 {
                    stats.record_publish(RagFlag::Rag, i % 2 == 0);
                    stats.record_publish(RagFlag::NoRag, true);
                    tokio::task::yield_now().await;
                }
            });
        }
        while let Some(res) = set.join_next().await {
            res.unwrap();
        }

        let snap = stats.snapshot();
        assert_eq!(snap.rag_generated, 8_000);
        assert_eq!(snap.rag_persisted, 4_000);
        assert_eq!(snap.no_rag_generated, 8_000);
        assert_eq!(snap.no_rag_persisted, 8_000);
    }
}

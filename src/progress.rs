//! Explicit progress reporting for long-running collaborator calls
//!
//! Pipeline tools can run for minutes; whatever invokes them receives a
//! [`ProgressSink`] to report into instead of reaching for process-global
//! progress state. The blackboard itself never touches progress reporting.

/// Receives progress from a running tool invocation.
///
/// Implementations are expected to be driven from the model's single
/// logical thread; a worker that produces progress off-thread must marshal
/// its reports back.
#[cfg_attr(test, mockall::automock)]
pub trait ProgressSink {
    /// A task is starting. `total` is the number of work units when known.
    fn begin(&mut self, task: &str, total: Option<u64>);

    /// `amount` additional work units completed
    fn advance(&mut self, amount: u64);

    /// Human-readable status line, e.g. "1200/4096 [01:10<02:48]"
    fn message(&mut self, text: &str);

    /// Polled by cooperative tools between work units
    fn is_cancelled(&self) -> bool {
        false
    }

    /// The task ended, successfully or not
    fn finish(&mut self);
}

/// Discards all progress. Useful for headless invocations and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn begin(&mut self, _task: &str, _total: Option<u64>) {}
    fn advance(&mut self, _amount: u64) {}
    fn message(&mut self, _text: &str) {}
    fn finish(&mut self) {}
}

/// Forwards progress to the tracing subscriber
#[derive(Debug, Default)]
pub struct LogProgress {
    task: String,
    total: Option<u64>,
    done: u64,
}

impl ProgressSink for LogProgress {
    fn begin(&mut self, task: &str, total: Option<u64>) {
        self.task = task.to_string();
        self.total = total;
        self.done = 0;
        tracing::info!(task, total, "task started");
    }

    fn advance(&mut self, amount: u64) {
        self.done += amount;
        tracing::debug!(task = %self.task, done = self.done, total = self.total, "progress");
    }

    fn message(&mut self, text: &str) {
        tracing::info!(task = %self.task, "{text}");
    }

    fn finish(&mut self) {
        tracing::info!(task = %self.task, done = self.done, "task finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_progress_accumulates() {
        let mut progress = LogProgress::default();
        progress.begin("warp", Some(10));
        progress.advance(4);
        progress.advance(2);
        assert_eq!(progress.done, 6);
        progress.finish();
    }

    #[test]
    fn null_progress_never_cancels() {
        let progress = NullProgress;
        assert!(!progress.is_cancelled());
    }
}

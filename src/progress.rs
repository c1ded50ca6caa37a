// src/progress.rs
/// Lightweight progress reporting for batch jobs (resolve, sweep, crawl).
/// The CLI implements this to print `[i/n]` lines; library callers can pass
/// `NullProgress`.
pub trait Progress {
    /// Called at the start with the total number of items.
    fn begin(&mut self, _total: usize) {}

    /// Free-form status line for human eyes.
    fn log(&mut self, _msg: &str) {}

    /// One item finished with data (or a confirmed "nothing there").
    fn item_done(&mut self, _label: &str) {}

    /// One item failed; the batch carries on.
    fn item_failed(&mut self, _label: &str, _reason: &str) {}

    /// Called at the end, successful or not.
    fn finish(&mut self) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}

/// Prints one line per item to stderr.
#[derive(Default)]
pub struct ConsoleProgress {
    total: usize,
    seen: usize,
    failed: usize,
}

impl ConsoleProgress {
    pub fn failed(&self) -> usize {
        self.failed
    }

    fn tick(&mut self) -> String {
        self.seen += 1;
        format!("[{}/{}]", self.seen, self.total)
    }
}

impl Progress for ConsoleProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
        self.seen = 0;
        self.failed = 0;
    }

    fn log(&mut self, msg: &str) {
        eprintln!("{msg}");
    }

    fn item_done(&mut self, label: &str) {
        let n = self.tick();
        eprintln!("{n} {label}");
    }

    fn item_failed(&mut self, label: &str, reason: &str) {
        self.failed += 1;
        let n = self.tick();
        eprintln!("{n} {label}: FAILED ({reason})");
    }

    fn finish(&mut self) {
        if self.failed > 0 {
            eprintln!("done: {} items, {} failed", self.seen, self.failed);
        } else {
            eprintln!("done: {} items", self.seen);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_counts_failures_and_resets_on_begin() {
        let mut p = ConsoleProgress::default();
        p.begin(2);
        p.item_done("a");
        p.item_failed("b", "timeout");
        assert_eq!(p.failed(), 1);
        assert_eq!(p.seen, 2);
        p.begin(1);
        assert_eq!(p.failed(), 0);
    }
}

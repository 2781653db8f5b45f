//! Progress indication for the dispatch loop.
//!
//! Purely observational: either an indicatif bar on an interactive terminal
//! or a log line every `interval` hosts.

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} hosts ({percent}%) {msg}";

/// Reports how many host units have been dispatched.
#[derive(Debug)]
pub struct Progress {
    bar: Option<ProgressBar>,
    total: usize,
    interval: usize,
}

impl Progress {
    /// Create a reporter for `total` hosts.
    pub fn new(total: usize, interval: usize, show_bar: bool) -> Self {
        let bar = show_bar.then(|| {
            let style = ProgressStyle::with_template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-");
            let pb = ProgressBar::new(total as u64);
            pb.set_style(style);
            pb
        });

        Self {
            bar,
            total,
            interval: interval.max(1),
        }
    }

    /// Note that host number `index` (1-based) has been admitted.
    pub fn host_dispatched(&self, index: usize) {
        match &self.bar {
            Some(pb) => pb.set_position(index as u64),
            None if self.should_log(index) => {
                info!("scanning host {}/{}", index, self.total);
            }
            None => {}
        }
    }

    fn should_log(&self, index: usize) -> bool {
        index % self.interval == 0
    }

    /// Close out the bar, if any.
    pub fn finish(&self) {
        if let Some(pb) = &self.bar {
            pb.finish_with_message("dispatch complete");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_interval() {
        let progress = Progress::new(250, 100, false);
        assert!(!progress.should_log(1));
        assert!(progress.should_log(100));
        assert!(progress.should_log(200));
        assert!(!progress.should_log(250));
    }

    #[test]
    fn test_zero_interval_logs_every_host() {
        let progress = Progress::new(3, 0, false);
        assert!(progress.should_log(1));
        assert!(progress.should_log(2));
    }

    #[test]
    fn test_bar_tracks_position() {
        let progress = Progress::new(10, 1, true);
        progress.host_dispatched(4);
        assert_eq!(progress.bar.as_ref().map(|pb| pb.position()), Some(4));
        progress.finish();
    }
}

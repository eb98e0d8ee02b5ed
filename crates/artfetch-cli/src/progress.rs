//! Terminal progress reporter backed by indicatif.

use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};

use artfetch_core::ProgressReporter;

/// CLI progress reporter with terminal progress bars.
///
/// A known total renders a byte-count bar; an unknown total renders a
/// spinner. The two modes mirror the library's known/unknown declared-size
/// branching.
pub struct CliProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliProgress {
    /// Create a new CLI progress reporter.
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    /// Create a download-style progress bar.
    fn create_download_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})")
                .unwrap()
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Create a spinner for indeterminate progress.
    fn create_spinner() -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {bytes} {msg}")
                .unwrap(),
        );
        pb
    }
}

impl Default for CliProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for CliProgress {
    fn start(&self, message: &str, total: Option<u64>) {
        let pb = match total {
            Some(t) if t > 0 => Self::create_download_bar(t),
            _ => Self::create_spinner(),
        };
        pb.set_message(message.to_string());

        let mut guard = self.bar.lock().unwrap();
        *guard = Some(pb);
    }

    fn update(&self, current: u64, _total: Option<u64>) {
        if let Some(pb) = self.bar.lock().unwrap().as_ref() {
            pb.set_position(current);
        }
    }

    fn message(&self, msg: &str) {
        match self.bar.lock().unwrap().as_ref() {
            Some(pb) => pb.set_message(msg.to_string()),
            None => println!("{msg}"),
        }
    }

    fn finish(&self, message: &str) {
        if let Some(pb) = self.bar.lock().unwrap().take() {
            pb.finish_with_message(message.to_string());
        }
    }

    fn finish_with_error(&self, message: &str) {
        if let Some(pb) = self.bar.lock().unwrap().take() {
            pb.abandon_with_message(message.to_string());
        }
    }
}

//! Progress indicators for long-running operations
//!
//! Uses `linya` for allocation-free progress bars drawn on stderr.

use linya::{Bar, Progress};

/// Byte-count progress for a download of known size
pub struct DownloadProgress {
  progress: Progress,
  bar: Bar,
}

impl DownloadProgress {
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self { progress, bar }
  }

  /// Advance by `bytes`
  pub fn inc(&mut self, bytes: usize) {
    self.progress.inc_and_draw(&self.bar, bytes);
  }
}

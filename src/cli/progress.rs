//! CLI-specific progress handling for baryscore
//!
//! Provides the spinner shown while geocoding, searching and scoring.

use std::sync::Arc;
use std::time::Duration;

use baryscore::RetryCallback;
use indicatif::{ProgressBar, ProgressStyle};

/// Creates a spinner for CLI display
pub fn create_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Progress manager for the search pipeline
pub struct ProgressManager {
    pub pb: ProgressBar,
}

impl ProgressManager {
    pub fn new(message: &str) -> Self {
        let pb = create_spinner();
        pb.set_message(message.to_string());
        Self { pb }
    }

    pub fn set_message(&self, message: &str) {
        self.pb.set_message(message.to_string());
    }

    /// Retry callback that surfaces live search retries on the spinner
    pub fn retry_callback(&self, base_message: &str) -> RetryCallback {
        let pb = self.pb.clone();
        let base_message = base_message.to_string();
        Arc::new(move |attempt, total| {
            pb.set_message(format!("{base_message} (service busy, retrying {attempt}/{total})"));
        })
    }

    pub fn finish(&self, message: &str) {
        self.pb.finish_with_message(message.to_string());
    }

    pub fn abandon(&self) {
        self.pb.finish_and_clear();
    }
}

//! Progress reporting module

use embalign_core::application::BatchProgress;
use indicatif::{ProgressBar, ProgressStyle};

/// Progress reporter for batch alignment
pub struct ProgressReporter {
    progress_bar: Option<ProgressBar>,
}

impl ProgressReporter {
    /// Create a new progress reporter; nothing is drawn when `quiet`
    pub fn new(quiet: bool) -> Self {
        if quiet {
            return Self { progress_bar: None };
        }

        let pb = ProgressBar::new(0);
        match ProgressStyle::with_template(
            "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} pairs {msg}",
        ) {
            Ok(style) => pb.set_style(style.progress_chars("##-")),
            Err(e) => log::debug!("default progress style: {e}"),
        }

        Self {
            progress_bar: Some(pb),
        }
    }

    /// Update progress after a finished batch
    pub fn batch_completed(&self, progress: BatchProgress) {
        if let Some(pb) = &self.progress_bar {
            pb.set_length(progress.pairs_total as u64);
            pb.set_position(progress.pairs_done as u64);
            pb.set_message(format!(
                "batch {}/{}",
                progress.batch + 1,
                progress.batch_count
            ));
        }
    }

    /// Finish progress reporting
    pub fn finish(&self) {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message("Complete");
        }
    }
}

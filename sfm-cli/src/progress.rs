//! Terminal progress for long imports and exports.

use indicatif::{ProgressBar, ProgressStyle};
use sfm_codec::ProgressSink;

/// A spinner counting sections and chapters, labelled with the current book.
/// Hidden automatically when stderr is not a terminal.
pub struct SpinnerProgress {
    bar: ProgressBar,
}

impl SpinnerProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner} [{elapsed_precise}] {msg} ({pos} units)")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for SpinnerProgress {
    fn step(&self, amount: u64) {
        self.bar.inc(amount);
    }

    fn message(&self, text: &str) {
        self.bar.set_message(text.to_string());
    }
}

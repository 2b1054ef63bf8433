use std::collections::HashSet;

use indicatif::{ProgressBar, ProgressStyle};

use crate::loader::TaskKey;
use crate::Result;

/// Tracks coarse progress over the steps of a run.
pub struct StepContext {
    bar: ProgressBar,
}

impl StepContext {
    pub fn new(tasks: &HashSet<TaskKey>) -> Self {
        let bar = ProgressBar::new(tasks.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("[{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .expect("valid progress template")
                .progress_chars("=> "),
        );
        Self { bar }
    }

    /// Marks a step complete.
    pub fn finish(&mut self, task: TaskKey) {
        self.bar.inc(1);
        self.bar.set_message(task.description());
        if Some(self.bar.position()) == self.bar.length() {
            self.bar.finish_and_clear();
        }
    }

    /// Finalizes the progress display before an error propagates.
    pub fn check<T>(&mut self, res: Result<T>) -> Result<T> {
        if res.is_err() {
            self.bar.abandon_with_message("failed");
        }
        res
    }
}

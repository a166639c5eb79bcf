use indicatif::{ProgressBar, ProgressStyle};

/// A single pipeline phase backed by an indicatif bar.
///
/// On a non-TTY the bar draws nothing; finish lines still land on stderr.
pub struct Phase {
    bar: ProgressBar,
    label: String,
}

impl Phase {
    /// Start a counted phase (e.g. files scanned)
    pub fn bar(label: impl Into<String>, len: u64) -> Self {
        let label = label.into();
        let bar = ProgressBar::new(len);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40.cyan/blue}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        bar.set_message(label.clone());
        Self { bar, label }
    }

    /// Start an uncounted spinner phase
    pub fn spinner(label: impl Into<String>) -> Self {
        let label = label.into();
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(format!("{}...", label));
        bar.enable_steady_tick(std::time::Duration::from_millis(100));
        Self { bar, label }
    }

    pub fn inc(&self) {
        self.bar.inc(1);
    }

    pub fn finish(&self, summary: &str) {
        self.bar.finish_and_clear();
        eprintln!("  {}... done — {}", self.label, summary);
    }
}

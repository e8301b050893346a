//! Status output.

use indicatif::{ProgressBar, ProgressStyle};

/// How much non-critical status information to print.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Verbosity {
    Quiet,
    Messages,
    Progress,
}

impl Verbosity {
    /// Whether status messages should be printed.
    pub fn print_messages(&self) -> bool {
        match self {
            Self::Quiet => false,
            Self::Messages | Self::Progress => true,
        }
    }

    /// Whether progress bars should be shown.
    pub fn show_progress(&self) -> bool {
        *self == Self::Progress
    }

    /// Creates a progress bar for the given number of items, which is
    /// hidden unless progress reporting is enabled.
    pub fn create_progress_bar(&self, n_items: usize) -> ProgressBar {
        if self.show_progress() {
            let bar = ProgressBar::new(n_items as u64);
            bar.set_style(ProgressStyle::default_bar());
            bar
        } else {
            ProgressBar::hidden()
        }
    }
}

impl Default for Verbosity {
    fn default() -> Self {
        Self::Quiet
    }
}

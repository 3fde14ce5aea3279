//! Status reporting and output persistence.

use indicatif::{ProgressBar, ProgressStyle};

#[cfg(feature = "json")]
use serde::Serialize;
#[cfg(feature = "json")]
use std::{fs, io, path};

const PROGRESS_TEMPLATE: &str = "Progress: {bar:40}  {percent}% | ETA: {eta}";

/// How much non-critical status information to report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Messages,
    Progress,
}

impl Verbosity {
    /// Whether status messages should be logged.
    pub fn print_messages(&self) -> bool {
        !matches!(self, Self::Quiet)
    }

    /// Creates a progress bar for the given number of work items.
    ///
    /// The bar is hidden unless progress reporting is requested.
    pub fn create_progress_bar(&self, n_items: usize) -> ProgressBar {
        match self {
            Self::Progress => {
                let style = ProgressStyle::with_template(PROGRESS_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_bar());
                let bar = ProgressBar::new(n_items as u64);
                bar.set_style(style);
                bar
            }
            _ => ProgressBar::hidden(),
        }
    }
}

impl Default for Verbosity {
    fn default() -> Self {
        Self::Quiet
    }
}

/// Serializes the given data as JSON into a file at the given path.
#[cfg(feature = "json")]
pub fn save_data_as_json<T: Serialize>(file_path: &path::Path, data: &T) -> io::Result<()> {
    let file = fs::File::create(file_path)?;
    let writer = io::BufWriter::new(file);
    serde_json::to_writer(writer, data).map_err(io::Error::from)
}

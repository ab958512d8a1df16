//! Host file-picker seam.

use std::path::{Path, PathBuf};

/// Asks the user for a program path. `None` means the user cancelled.
pub trait PathPicker {
    fn pick_open(&mut self) -> Option<PathBuf>;

    /// `current` is the path the program was last saved to, if any.
    fn pick_save(&mut self, current: Option<&Path>) -> Option<PathBuf>;
}

/// Answers every prompt with a fixed path. Useful for scripted sessions.
#[derive(Debug, Clone, Default)]
pub struct FixedPicker {
    pub path: Option<PathBuf>,
}

impl FixedPicker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FixedPicker {
            path: Some(path.into()),
        }
    }

    pub fn cancelled() -> Self {
        FixedPicker { path: None }
    }
}

impl PathPicker for FixedPicker {
    fn pick_open(&mut self) -> Option<PathBuf> {
        self.path.clone()
    }

    fn pick_save(&mut self, _current: Option<&Path>) -> Option<PathBuf> {
        self.path.clone()
    }
}

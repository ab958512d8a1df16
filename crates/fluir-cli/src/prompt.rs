//! Terminal implementation of the path picker.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use fluir_client::PathPicker;

/// Prompts on `output` and reads one line from `input`. An empty answer or
/// end of input cancels.
pub struct PromptPicker<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptPicker<R, W> {
    pub fn new(input: R, output: W) -> Self {
        PromptPicker { input, output }
    }

    fn ask(&mut self, prompt: &str) -> Option<PathBuf> {
        write!(self.output, "{}", prompt).ok()?;
        self.output.flush().ok()?;
        let mut line = String::new();
        self.input.read_line(&mut line).ok()?;
        let answer = line.trim();
        if answer.is_empty() {
            None
        } else {
            Some(PathBuf::from(answer))
        }
    }
}

impl<R: BufRead, W: Write> PathPicker for PromptPicker<R, W> {
    fn pick_open(&mut self) -> Option<PathBuf> {
        self.ask("Program to open: ")
    }

    fn pick_save(&mut self, current: Option<&Path>) -> Option<PathBuf> {
        match current {
            Some(path) => {
                let prompt = format!("Save as [{}]: ", path.display());
                self.ask(&prompt).or_else(|| Some(path.to_path_buf()))
            }
            None => self.ask("Save as: "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_trimmed_path() {
        let mut out = Vec::new();
        let mut picker = PromptPicker::new(Cursor::new("  /tmp/a.fl \n"), &mut out);
        assert_eq!(picker.pick_open(), Some(PathBuf::from("/tmp/a.fl")));
        assert_eq!(String::from_utf8(out).unwrap(), "Program to open: ");
    }

    #[test]
    fn empty_answer_cancels_open() {
        let mut picker = PromptPicker::new(Cursor::new("\n"), Vec::new());
        assert_eq!(picker.pick_open(), None);
        let mut picker = PromptPicker::new(Cursor::new(""), Vec::new());
        assert_eq!(picker.pick_open(), None);
    }

    #[test]
    fn save_defaults_to_current_path() {
        let mut picker = PromptPicker::new(Cursor::new("\n"), Vec::new());
        assert_eq!(
            picker.pick_save(Some(Path::new("/tmp/b.fl"))),
            Some(PathBuf::from("/tmp/b.fl"))
        );
        let mut picker = PromptPicker::new(Cursor::new("\n"), Vec::new());
        assert_eq!(picker.pick_save(None), None);
    }
}

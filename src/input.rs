use std::io::{self, Read};
use std::path::Path;

use anyhow::Result;
use mediaid::{Analyzer, Report};

/// A command-line input: a path on disk or "-" for stdin.
pub enum Input<'a> {
    Path(&'a Path),
    Stdin,
}

impl<'a> Input<'a> {
    pub fn new(path: &'a Path) -> Self {
        if path.as_os_str() == "-" {
            Input::Stdin
        } else {
            Input::Path(path)
        }
    }

    /// Name shown in progress messages and headings.
    pub fn display_name(&self) -> String {
        match self {
            Input::Path(path) => path.display().to_string(),
            Input::Stdin => "<stdin>".to_string(),
        }
    }

    /// Stdin is read into memory in full since parsers need random access.
    pub fn analyze(&self, analyzer: &Analyzer) -> Result<Report> {
        match self {
            Input::Path(path) => Ok(analyzer.analyze_path(path)),
            Input::Stdin => {
                let mut data = Vec::new();
                io::stdin().lock().read_to_end(&mut data)?;
                log::debug!("read {} bytes from stdin", data.len());
                Ok(analyzer.analyze_bytes(data))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dash_means_stdin() {
        assert!(matches!(Input::new(Path::new("-")), Input::Stdin));
        assert_eq!(Input::new(Path::new("-")).display_name(), "<stdin>");
        assert!(matches!(Input::new(Path::new("a.mkv")), Input::Path(_)));
    }

    #[test]
    fn missing_file_is_reported_not_returned() -> Result<()> {
        let input = Input::new(Path::new("/nonexistent/a.mkv"));
        let report = input.analyze(&Analyzer::default())?;
        assert_eq!(report.error.len(), 1);
        Ok(())
    }
}

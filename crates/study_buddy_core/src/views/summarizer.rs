//! Summarizer view: notes in, structured summary out.

use serde::Serialize;
use std::path::Path;
use tracing::{error, warn};

use super::{Operation, Ticket, ViewError};
use crate::domain::Summary;
use crate::ports::PortResult;

pub const SUMMARIZE_FAILURE_MESSAGE: &str = "Failed to summarize. Check your content and try again.";

const ACCEPTED_EXTENSIONS: [&str; 2] = ["txt", "md"];

#[derive(Debug, Clone)]
pub struct SummarizeDispatch {
    pub ticket: Ticket,
    pub notes: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizerView {
    notes: String,
    summary: Option<Summary>,
    failure: Option<String>,
    #[serde(rename = "status")]
    operation: Operation,
}

impl SummarizerView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    /// Loads a `.txt` or `.md` file into the notes field as-is.
    pub fn load_file(&mut self, file_name: &str, bytes: &[u8]) -> Result<(), ViewError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        if !extension.is_some_and(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str())) {
            return Err(ViewError::UnsupportedFile(format!(
                "{file_name}: only .txt and .md files are accepted"
            )));
        }

        let text = std::str::from_utf8(bytes).map_err(|e| {
            ViewError::UnsupportedFile(format!("{file_name}: not valid UTF-8 text ({e})"))
        })?;
        self.notes = text.to_string();
        Ok(())
    }

    pub fn begin_summarize(&mut self) -> Result<SummarizeDispatch, ViewError> {
        if self.notes.trim().is_empty() {
            return Err(ViewError::EmptyInput);
        }
        let ticket = self.operation.begin()?;
        self.failure = None;
        Ok(SummarizeDispatch {
            ticket,
            notes: self.notes.clone(),
        })
    }

    /// A success replaces the shown summary. A failure only raises the
    /// user-facing message; the last good summary stays.
    pub fn settle(&mut self, ticket: Ticket, result: PortResult<Summary>) -> bool {
        if !self.operation.settle(ticket, result.is_ok()) {
            warn!(ticket, "Discarding stale summary");
            return false;
        }
        match result {
            Ok(summary) => {
                self.summary = Some(summary);
                self.failure = None;
            }
            Err(e) => {
                error!("Summarization failed: {}", e);
                self.failure = Some(SUMMARIZE_FAILURE_MESSAGE.to_string());
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::PortError;

    fn sample_summary(title: &str) -> Summary {
        Summary {
            title: title.to_string(),
            main_points: vec!["Light becomes chemical energy".to_string()],
            simplified_explanation: "Plants eat sunlight.".to_string(),
            flashcards: Vec::new(),
        }
    }

    #[test]
    fn load_file_accepts_txt_and_md() {
        let mut view = SummarizerView::new();
        view.load_file("notes.TXT", b"Mitochondria").unwrap();
        assert_eq!(view.notes(), "Mitochondria");
        view.load_file("lecture.md", b"# Cells").unwrap();
        assert_eq!(view.notes(), "# Cells");
    }

    #[test]
    fn load_file_rejects_other_types() {
        let mut view = SummarizerView::new();
        view.set_notes("keep me");
        assert!(matches!(
            view.load_file("slides.pdf", b"%PDF"),
            Err(ViewError::UnsupportedFile(_))
        ));
        assert!(matches!(
            view.load_file("notes.txt", &[0xff, 0xfe]),
            Err(ViewError::UnsupportedFile(_))
        ));
        assert_eq!(view.notes(), "keep me");
    }

    #[test]
    fn blank_notes_are_not_dispatched() {
        let mut view = SummarizerView::new();
        view.set_notes("  \n ");
        assert_eq!(view.begin_summarize().unwrap_err(), ViewError::EmptyInput);
    }

    #[test]
    fn dispatch_carries_the_exact_notes() {
        let mut view = SummarizerView::new();
        view.set_notes("  Photosynthesis converts light to energy.\n");
        let dispatch = view.begin_summarize().unwrap();
        assert_eq!(dispatch.notes, "  Photosynthesis converts light to energy.\n");
    }

    #[test]
    fn failure_keeps_previous_summary_and_flags_message() {
        let mut view = SummarizerView::new();
        view.set_notes("notes");
        let first = view.begin_summarize().unwrap();
        view.settle(first.ticket, Ok(sample_summary("Photosynthesis")));

        let second = view.begin_summarize().unwrap();
        view.settle(second.ticket, Err(PortError::Parse("EOF".to_string())));

        assert_eq!(view.summary().unwrap().title, "Photosynthesis");
        assert_eq!(view.failure(), Some(SUMMARIZE_FAILURE_MESSAGE));

        let third = view.begin_summarize().unwrap();
        assert!(view.failure().is_none());
        view.settle(third.ticket, Ok(sample_summary("Respiration")));
        assert_eq!(view.summary().unwrap().title, "Respiration");
    }
}

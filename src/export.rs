use std::cell::Cell;

use base64::Engine;
use serde::{Deserialize, Serialize};

/// How rendered geometry leaves the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStrategy {
    /// Hand the text back to the caller, who transmits it.
    ReturnText,
    /// POST it to the STL endpoint and download the reply.
    PostAndDownload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportState {
    #[default]
    Idle,
    Requesting,
    Downloading,
    Alerted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Returned(String),
    Downloaded(Download),
}

/// A text file offered to the user for saving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: String,
    pub contents: String,
}

impl Download {
    pub fn new(filename: impl Into<String>, contents: impl Into<String>) -> Self {
        Self { filename: filename.into(), contents: contents.into() }
    }

    /// `data:` URI carrying the contents verbatim.
    pub fn data_uri(&self) -> String {
        let b64 = base64::engine::general_purpose::STANDARD.encode(self.contents.as_bytes());
        format!("data:text/plain;charset=utf-8;base64,{b64}")
    }
}

/// Marks an export as in flight; drops back to [`ExportState::Idle`].
pub(crate) struct InFlight<'a>(&'a Cell<ExportState>);

impl<'a> InFlight<'a> {
    /// `None` if another export already holds the state.
    pub(crate) fn begin(state: &'a Cell<ExportState>) -> Option<Self> {
        if state.get() != ExportState::Idle {
            return None;
        }
        state.set(ExportState::Requesting);
        Some(Self(state))
    }

    pub(crate) fn advance(&self, next: ExportState) {
        self.0.set(next);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(ExportState::Idle);
    }
}

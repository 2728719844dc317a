use std::fmt;

use super::render::PreviewView;

/// The single status message under the form
#[derive(Debug, Clone, PartialEq)]
pub enum StatusLine {
    Progress(String),
    Success(String),
    Error(String),
}

impl StatusLine {
    pub fn is_error(&self) -> bool {
        matches!(self, StatusLine::Error(_))
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusLine::Progress(message) | StatusLine::Success(message) => f.write_str(message),
            StatusLine::Error(message) => write!(f, "Error: {message}"),
        }
    }
}

/// Everything a front end needs to draw the session
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub input: String,
    pub submit_enabled: bool,
    pub confirm_enabled: bool,
    pub status: Option<StatusLine>,
    pub preview: Option<PreviewView>,
    pub warnings: Vec<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            input: String::new(),
            submit_enabled: true,
            confirm_enabled: false,
            status: None,
            preview: None,
            warnings: Vec::new(),
        }
    }
}

impl ViewState {
    pub fn status_text(&self) -> Option<String> {
        self.status.as_ref().map(ToString::to_string)
    }

    pub fn has_error(&self) -> bool {
        self.status.as_ref().is_some_and(StatusLine::is_error)
    }

    /// Drop a leftover error before a new attempt
    pub(super) fn clear_error(&mut self) {
        if self.has_error() {
            self.status = None;
        }
        self.warnings.clear();
    }
}

use std::fmt;
use std::time::Duration;

use crate::error::ServiceError;
use crate::models::{DownloadReceipt, PlaylistInfo, PlaylistPreview, Track};

/// Tag attached to every outstanding request.
///
/// Cancel and reset move the session to a new generation, so a response
/// carrying an older tag can't repopulate state it no longer owns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Generation {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where the session is in the analyze → preview → download cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Idle,
    AwaitingAnalysis,
    Previewing {
        playlist: PlaylistInfo,
        tracks: Vec<Track>,
    },
    AwaitingDownload {
        playlist: PlaylistInfo,
        tracks: Vec<Track>,
    },
}

impl SessionState {
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::AwaitingAnalysis => "awaiting analysis",
            SessionState::Previewing { .. } => "previewing",
            SessionState::AwaitingDownload { .. } => "awaiting download",
        }
    }

    /// Tracks from the most recent successful analysis, if still held
    pub fn tracks(&self) -> Option<&[Track]> {
        match self {
            SessionState::Previewing { tracks, .. }
            | SessionState::AwaitingDownload { tracks, .. } => Some(tracks),
            SessionState::Idle | SessionState::AwaitingAnalysis => None,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            SessionState::AwaitingAnalysis | SessionState::AwaitingDownload { .. }
        )
    }
}

/// Inputs to the controller: user actions and request completions
#[derive(Debug, Clone)]
pub enum Event {
    Submit(String),
    AnalysisFinished {
        generation: Generation,
        outcome: Result<PlaylistPreview, ServiceError>,
    },
    Confirm,
    Cancel,
    DownloadFinished {
        generation: Generation,
        outcome: Result<DownloadReceipt, ServiceError>,
    },
    ResetElapsed {
        generation: Generation,
    },
}

/// Work the controller asks its runner to perform
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Analyze {
        generation: Generation,
        url: String,
    },
    Download {
        generation: Generation,
        songs: Vec<Track>,
    },
    /// Send the user to the finished artifact, e.g. `/downloads/abc.zip`
    Navigate { path: String },
    ScheduleReset {
        generation: Generation,
        after: Duration,
    },
}

use std::mem;
use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use super::render::render_preview;
use super::state::{Effect, Event, Generation, SessionState};
use super::view::{StatusLine, ViewState};
use crate::error::ServiceError;
use crate::models::{DownloadReceipt, PlaylistPreview, Track};

pub const ANALYZING_MESSAGE: &str = "Analyzing playlist...";
pub const DOWNLOADING_MESSAGE: &str = "Downloading songs... This may take a few minutes.";
pub const EMPTY_URL_MESSAGE: &str = "Please enter a playlist URL";
pub const INVALID_URL_MESSAGE: &str = "Please enter a valid playlist URL";

/// The interaction state machine for one session.
///
/// `handle` never performs I/O: it updates the state and view, then returns
/// the effects a runner has to carry out.
#[derive(Debug)]
pub struct Controller {
    state: SessionState,
    view: ViewState,
    generation: Generation,
    reset_delay: Duration,
}

impl Controller {
    pub fn new(reset_delay: Duration) -> Self {
        Self {
            state: SessionState::Idle,
            view: ViewState::default(),
            generation: Generation::default(),
            reset_delay,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    #[cfg(test)]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn current_tracks(&self) -> Option<&[Track]> {
        self.state.tracks()
    }

    /// Apply one event and return the effects it triggers
    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::Submit(url) => self.submit(url),
            Event::AnalysisFinished {
                generation,
                outcome,
            } => self.analysis_finished(generation, outcome),
            Event::Confirm => self.confirm(),
            Event::Cancel => {
                self.reset();
                Vec::new()
            }
            Event::DownloadFinished {
                generation,
                outcome,
            } => self.download_finished(generation, outcome),
            Event::ResetElapsed { generation } => {
                if generation == self.generation {
                    self.reset();
                } else {
                    debug!("ignoring stale reset from generation {generation}");
                }
                Vec::new()
            }
        }
    }

    fn submit(&mut self, url: String) -> Vec<Effect> {
        if self.state.is_in_flight() || !self.view.submit_enabled {
            debug!("submit ignored while {}", self.state.label());
            return Vec::new();
        }

        self.view.clear_error();
        let url = url.trim().to_string();
        self.view.input = url.clone();

        if url.is_empty() {
            self.view.status = Some(StatusLine::Error(EMPTY_URL_MESSAGE.to_string()));
            return Vec::new();
        }
        if !is_web_url(&url) {
            self.view.status = Some(StatusLine::Error(INVALID_URL_MESSAGE.to_string()));
            return Vec::new();
        }

        let generation = self.advance();
        info!("analyzing {url} ({generation})");

        self.state = SessionState::AwaitingAnalysis;
        self.view.submit_enabled = false;
        self.view.confirm_enabled = false;
        self.view.preview = None;
        self.view.status = Some(StatusLine::Progress(ANALYZING_MESSAGE.to_string()));

        vec![Effect::Analyze { generation, url }]
    }

    fn analysis_finished(
        &mut self,
        generation: Generation,
        outcome: Result<PlaylistPreview, ServiceError>,
    ) -> Vec<Effect> {
        if generation != self.generation || self.state != SessionState::AwaitingAnalysis {
            debug!(
                "dropping analysis result from {generation} while {} at {}",
                self.state.label(),
                self.generation
            );
            return Vec::new();
        }

        self.view.submit_enabled = true;

        match outcome {
            Ok(PlaylistPreview { playlist, tracks }) => {
                info!("playlist '{}' resolved to {} tracks", playlist.name, tracks.len());
                self.view.preview = Some(render_preview(&playlist, &tracks));
                self.view.confirm_enabled = true;
                self.view.status = None;
                self.state = SessionState::Previewing { playlist, tracks };
            }
            Err(e) => {
                warn!("analysis failed: {e}");
                self.view.status = Some(StatusLine::Error(e.user_message().to_string()));
                self.state = SessionState::Idle;
            }
        }

        Vec::new()
    }

    fn confirm(&mut self) -> Vec<Effect> {
        if !self.view.confirm_enabled {
            debug!("confirm ignored while {}", self.state.label());
            return Vec::new();
        }

        let (playlist, tracks) = match mem::take(&mut self.state) {
            SessionState::Previewing { playlist, tracks } => (playlist, tracks),
            other => {
                debug!("confirm ignored while {}", other.label());
                self.state = other;
                return Vec::new();
            }
        };

        self.view.clear_error();
        let generation = self.advance();
        info!("requesting download of {} tracks ({generation})", tracks.len());

        self.view.confirm_enabled = false;
        self.view.status = Some(StatusLine::Progress(DOWNLOADING_MESSAGE.to_string()));

        let songs = tracks.clone();
        self.state = SessionState::AwaitingDownload { playlist, tracks };

        vec![Effect::Download { generation, songs }]
    }

    fn download_finished(
        &mut self,
        generation: Generation,
        outcome: Result<DownloadReceipt, ServiceError>,
    ) -> Vec<Effect> {
        if generation != self.generation
            || !matches!(self.state, SessionState::AwaitingDownload { .. })
        {
            debug!(
                "dropping download result from {generation} while {} at {}",
                self.state.label(),
                self.generation
            );
            return Vec::new();
        }

        match outcome {
            Ok(receipt) => {
                info!(
                    "download ready: {} ({} songs)",
                    receipt.zip_file, receipt.song_count
                );
                // The tracks are done with; only the success display lingers
                self.state = SessionState::Idle;
                self.view.submit_enabled = true;
                self.view.confirm_enabled = false;
                self.view.status = Some(StatusLine::Success(format!(
                    "Downloaded {} songs successfully!",
                    receipt.song_count
                )));
                if !receipt.unmatched.is_empty() {
                    self.view.warnings.push(unmatched_warning(receipt.unmatched.len()));
                }

                vec![
                    Effect::Navigate {
                        path: format!("/downloads/{}", receipt.zip_file),
                    },
                    Effect::ScheduleReset {
                        generation: self.generation,
                        after: self.reset_delay,
                    },
                ]
            }
            Err(e) => {
                warn!("download failed: {e}");
                if let SessionState::AwaitingDownload { playlist, tracks } =
                    mem::take(&mut self.state)
                {
                    self.state = SessionState::Previewing { playlist, tracks };
                }
                self.view.confirm_enabled = true;
                self.view.status = Some(StatusLine::Error(e.user_message().to_string()));
                Vec::new()
            }
        }
    }

    /// Back to a blank form; anything still in flight becomes stale
    fn reset(&mut self) {
        self.advance();
        debug!("session reset to idle at {}", self.generation);
        self.state = SessionState::Idle;
        self.view = ViewState::default();
    }

    fn advance(&mut self) -> Generation {
        self.generation = self.generation.next();
        self.generation
    }
}

fn is_web_url(input: &str) -> bool {
    Url::parse(input)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false)
}

fn unmatched_warning(count: usize) -> String {
    if count == 1 {
        "1 song could not be matched".to_string()
    } else {
        format!("{count} songs could not be matched")
    }
}

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::error::{GENERIC_FAILURE, ServiceError};
    use crate::models::{DownloadReceipt, PlaylistInfo, PlaylistPreview, Track};
    use std::time::Duration;

    const PLAYLIST_URL: &str = "https://open.spotify.com/playlist/abc";
    const RESET_DELAY: Duration = Duration::from_millis(3000);

    fn create_track(title: &str, bpm: Option<f64>, key: Option<i32>, mode: &str) -> Track {
        Track {
            title: title.to_string(),
            artist: "Test Artist".to_string(),
            duration: 3.5,
            bpm,
            key,
            mode: mode.to_string(),
            ..Track::default()
        }
    }

    fn create_preview() -> PlaylistPreview {
        PlaylistPreview {
            playlist: PlaylistInfo {
                name: "Road Trip".to_string(),
                owner: "sam".to_string(),
                track_count: 3,
            },
            tracks: vec![
                create_track("First", Some(128.0), Some(0), "major"),
                create_track("Second", None, None, "minor"),
            ],
        }
    }

    fn receipt() -> DownloadReceipt {
        DownloadReceipt {
            song_count: 2,
            zip_file: "abc.zip".to_string(),
            unmatched: Vec::new(),
        }
    }

    /// Submit a URL and return the generation of the analyze request
    fn submit(controller: &mut Controller) -> Generation {
        let effects = controller.handle(Event::Submit(PLAYLIST_URL.to_string()));
        match effects.as_slice() {
            [Effect::Analyze { generation, url }] => {
                assert_eq!(url, PLAYLIST_URL);
                *generation
            }
            other => panic!("expected a single analyze effect, got {other:?}"),
        }
    }

    fn previewing_controller() -> Controller {
        let mut controller = Controller::new(RESET_DELAY);
        let generation = submit(&mut controller);
        controller.handle(Event::AnalysisFinished {
            generation,
            outcome: Ok(create_preview()),
        });
        controller
    }

    /// Confirm and return the generation of the download request
    fn confirm(controller: &mut Controller) -> Generation {
        match controller.handle(Event::Confirm).as_slice() {
            [Effect::Download { generation, songs }] => {
                assert_eq!(songs, &create_preview().tracks);
                *generation
            }
            other => panic!("expected a single download effect, got {other:?}"),
        }
    }

    #[test]
    fn test_submit_disables_form_and_requests_analysis() {
        let mut controller = Controller::new(RESET_DELAY);
        submit(&mut controller);

        assert_eq!(controller.state(), &SessionState::AwaitingAnalysis);
        assert!(!controller.view().submit_enabled);
        assert_eq!(
            controller.view().status_text().as_deref(),
            Some(ANALYZING_MESSAGE)
        );
    }

    #[test]
    fn test_submit_is_ignored_while_analysis_is_outstanding() {
        let mut controller = Controller::new(RESET_DELAY);
        submit(&mut controller);

        let effects = controller.handle(Event::Submit("https://example.com/other".to_string()));
        assert!(effects.is_empty());
        assert_eq!(controller.view().input, PLAYLIST_URL);
    }

    #[test]
    fn test_empty_or_invalid_url_sends_nothing() {
        let mut controller = Controller::new(RESET_DELAY);

        assert!(controller.handle(Event::Submit("   ".to_string())).is_empty());
        assert_eq!(
            controller.view().status_text(),
            Some(format!("Error: {EMPTY_URL_MESSAGE}"))
        );
        assert_eq!(controller.state(), &SessionState::Idle);

        assert!(controller.handle(Event::Submit("not a url".to_string())).is_empty());
        assert!(controller.handle(Event::Submit("ftp://host/list".to_string())).is_empty());
        assert_eq!(
            controller.view().status_text(),
            Some(format!("Error: {INVALID_URL_MESSAGE}"))
        );
        assert!(controller.view().submit_enabled);
    }

    #[test]
    fn test_successful_analysis_previews_tracks_in_order() {
        let controller = previewing_controller();

        let tracks = controller.current_tracks().unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].title, "First");
        assert_eq!(tracks[1].title, "Second");

        let view = controller.view();
        assert!(view.submit_enabled);
        assert!(view.confirm_enabled);
        assert!(view.status.is_none());

        let preview = view.preview.as_ref().unwrap();
        // Count comes from the tracks received, not playlist_info.track_count
        assert_eq!(preview.track_count, 2);
        assert!(preview.lines[0].ends_with("128 BPM • C major"));
        assert!(preview.lines[1].ends_with("Unknown"));
        assert!(!preview.lines[1].contains("BPM"));
    }

    #[test]
    fn test_failed_analysis_shows_server_message_and_returns_to_idle() {
        let mut controller = Controller::new(RESET_DELAY);
        let generation = submit(&mut controller);

        controller.handle(Event::AnalysisFinished {
            generation,
            outcome: Err(ServiceError::Rejected("Invalid Spotify playlist URL".to_string())),
        });

        assert_eq!(controller.state(), &SessionState::Idle);
        assert!(controller.view().submit_enabled);
        assert_eq!(
            controller.view().status_text().as_deref(),
            Some("Error: Invalid Spotify playlist URL")
        );
    }

    #[test]
    fn test_transport_failure_uses_generic_message() {
        let mut controller = Controller::new(RESET_DELAY);
        let generation = submit(&mut controller);

        controller.handle(Event::AnalysisFinished {
            generation,
            outcome: Err(ServiceError::Transport("connection refused".to_string())),
        });

        assert_eq!(
            controller.view().status_text(),
            Some(format!("Error: {GENERIC_FAILURE}"))
        );
    }

    #[test]
    fn test_next_submit_clears_error() {
        let mut controller = Controller::new(RESET_DELAY);
        let generation = submit(&mut controller);
        controller.handle(Event::AnalysisFinished {
            generation,
            outcome: Err(ServiceError::UnexpectedPhase(None)),
        });
        assert!(controller.view().has_error());

        submit(&mut controller);
        assert!(!controller.view().has_error());
    }

    #[test]
    fn test_cancel_discards_preview() {
        let mut controller = previewing_controller();

        assert!(controller.handle(Event::Cancel).is_empty());

        assert_eq!(controller.state(), &SessionState::Idle);
        assert!(controller.current_tracks().is_none());
        assert_eq!(controller.view(), &ViewState::default());
    }

    #[test]
    fn test_late_analysis_after_cancel_is_ignored() {
        let mut controller = Controller::new(RESET_DELAY);
        let generation = submit(&mut controller);
        controller.handle(Event::Cancel);

        controller.handle(Event::AnalysisFinished {
            generation,
            outcome: Ok(create_preview()),
        });

        assert_eq!(controller.state(), &SessionState::Idle);
        assert!(controller.current_tracks().is_none());
        assert!(controller.view().preview.is_none());
    }

    #[test]
    fn test_analysis_from_superseded_submit_is_ignored() {
        let mut controller = Controller::new(RESET_DELAY);
        let first = submit(&mut controller);
        controller.handle(Event::Cancel);
        let second = submit(&mut controller);
        assert_ne!(first, second);

        controller.handle(Event::AnalysisFinished {
            generation: first,
            outcome: Err(ServiceError::Rejected("old".to_string())),
        });
        assert_eq!(controller.state(), &SessionState::AwaitingAnalysis);
        assert!(!controller.view().has_error());
    }

    #[test]
    fn test_confirm_without_preview_is_a_noop() {
        let mut controller = Controller::new(RESET_DELAY);
        assert!(controller.handle(Event::Confirm).is_empty());
        assert_eq!(controller.state(), &SessionState::Idle);

        submit(&mut controller);
        assert!(controller.handle(Event::Confirm).is_empty());
        assert_eq!(controller.state(), &SessionState::AwaitingAnalysis);
    }

    #[test]
    fn test_confirm_sends_stored_tracks_and_disables_confirm() {
        let mut controller = previewing_controller();
        confirm(&mut controller);

        assert!(matches!(
            controller.state(),
            SessionState::AwaitingDownload { .. }
        ));
        assert!(!controller.view().confirm_enabled);
        assert_eq!(
            controller.view().status_text().as_deref(),
            Some(DOWNLOADING_MESSAGE)
        );
        // A second confirm while downloading does nothing
        assert!(controller.handle(Event::Confirm).is_empty());
    }

    #[test]
    fn test_successful_download_navigates_then_resets() {
        let mut controller = previewing_controller();
        let generation = confirm(&mut controller);

        let effects = controller.handle(Event::DownloadFinished {
            generation,
            outcome: Ok(receipt()),
        });

        let reset_generation = controller.generation();
        assert_eq!(
            effects,
            vec![
                Effect::Navigate {
                    path: "/downloads/abc.zip".to_string()
                },
                Effect::ScheduleReset {
                    generation: reset_generation,
                    after: RESET_DELAY
                },
            ]
        );
        assert_eq!(
            controller.view().status_text().as_deref(),
            Some("Downloaded 2 songs successfully!")
        );
        assert!(controller.current_tracks().is_none());

        controller.handle(Event::ResetElapsed {
            generation: reset_generation,
        });
        assert_eq!(controller.state(), &SessionState::Idle);
        assert_eq!(controller.view(), &ViewState::default());
    }

    #[test]
    fn test_unmatched_songs_are_reported() {
        let mut controller = previewing_controller();
        let generation = confirm(&mut controller);

        controller.handle(Event::DownloadFinished {
            generation,
            outcome: Ok(DownloadReceipt {
                unmatched: vec!["No result found".to_string(), "Error: Could not search".to_string()],
                ..receipt()
            }),
        });

        assert_eq!(controller.view().warnings, vec!["2 songs could not be matched"]);
    }

    #[test]
    fn test_failed_download_keeps_tracks_for_retry() {
        let mut controller = previewing_controller();
        let generation = confirm(&mut controller);

        let effects = controller.handle(Event::DownloadFinished {
            generation,
            outcome: Err(ServiceError::Rejected("rate limited".to_string())),
        });

        assert!(effects.is_empty());
        assert!(matches!(controller.state(), SessionState::Previewing { .. }));
        assert_eq!(controller.current_tracks().unwrap().len(), 2);
        assert!(controller.view().confirm_enabled);
        assert_eq!(
            controller.view().status_text().as_deref(),
            Some("Error: rate limited")
        );

        // Retrying clears the error and resends the same list
        confirm(&mut controller);
        assert!(!controller.view().has_error());
    }

    #[test]
    fn test_late_download_after_cancel_is_ignored() {
        let mut controller = previewing_controller();
        let generation = confirm(&mut controller);
        controller.handle(Event::Cancel);

        let effects = controller.handle(Event::DownloadFinished {
            generation,
            outcome: Ok(receipt()),
        });

        assert!(effects.is_empty());
        assert_eq!(controller.view(), &ViewState::default());
    }

    #[test]
    fn test_stale_reset_does_not_clobber_new_submission() {
        let mut controller = previewing_controller();
        let generation = confirm(&mut controller);
        controller.handle(Event::DownloadFinished {
            generation,
            outcome: Ok(receipt()),
        });
        let reset_generation = controller.generation();

        // The user starts over before the reset fires
        submit(&mut controller);
        controller.handle(Event::ResetElapsed {
            generation: reset_generation,
        });

        assert_eq!(controller.state(), &SessionState::AwaitingAnalysis);
        assert_eq!(controller.view().input, PLAYLIST_URL);
    }

    #[test]
    fn test_resubmit_from_preview_replaces_tracks() {
        let mut controller = previewing_controller();
        let generation = submit(&mut controller);
        assert!(controller.current_tracks().is_none());

        controller.handle(Event::AnalysisFinished {
            generation,
            outcome: Ok(PlaylistPreview {
                playlist: PlaylistInfo::default(),
                tracks: vec![create_track("Only", None, Some(4), "minor")],
            }),
        });

        match controller.handle(Event::Confirm).as_slice() {
            [Effect::Download { songs, .. }] => {
                assert_eq!(songs.len(), 1);
                assert_eq!(songs[0].title, "Only");
            }
            other => panic!("expected a download effect, got {other:?}"),
        }
    }
}

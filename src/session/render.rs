use crate::models::{PlaylistInfo, Track};

/// Pitch classes in key-index order
pub const PITCH_CLASSES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

pub const UNKNOWN_KEY: &str = "Unknown";

/// What the preview screen shows for one analyzed playlist
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewView {
    pub name: String,
    pub owner: String,
    pub track_count: usize,
    pub lines: Vec<String>,
}

impl PreviewView {
    /// Header lines: name, owner and the number of tracks actually received
    pub fn summary(&self) -> Vec<String> {
        vec![
            format!("Playlist: {}", self.name),
            format!("Owner: {}", self.owner),
            format!("Tracks: {}", self.track_count),
        ]
    }
}

/// Format a duration given in fractional minutes as `M:SS`
pub fn format_duration(minutes: f64) -> String {
    let minutes = if minutes.is_finite() && minutes > 0.0 {
        minutes
    } else {
        0.0
    };

    let mut whole = minutes.trunc() as u64;
    let mut seconds = (minutes.fract() * 60.0).round() as u64;
    // 3.999 minutes rounds up to a full minute
    if seconds >= 60 {
        whole += 1;
        seconds = 0;
    }

    format!("{whole}:{seconds:02}")
}

/// Label a detected key, e.g. `C major`; a missing key is always `Unknown`
pub fn key_name(key: Option<i32>, mode: &str) -> String {
    let pitch = key
        .and_then(|k| usize::try_from(k).ok())
        .and_then(|k| PITCH_CLASSES.get(k));

    match pitch {
        Some(pitch) if mode.trim().is_empty() => pitch.to_string(),
        Some(pitch) => format!("{} {}", pitch, mode.trim()),
        None => UNKNOWN_KEY.to_string(),
    }
}

/// One listing line: position, title, artist, duration, optional tempo, key
pub fn track_line(position: usize, track: &Track) -> String {
    let bpm_display = track
        .bpm
        .filter(|bpm| bpm.is_finite() && *bpm > 0.0)
        .map(|bpm| format!(" • {} BPM", bpm.round() as u64))
        .unwrap_or_default();

    format!(
        "{}. {} - {} ({}){} • {}",
        position,
        track.title,
        track.artist,
        format_duration(track.duration),
        bpm_display,
        key_name(track.key, &track.mode)
    )
}

/// Render a playlist and its tracks, preserving track order
pub fn render_preview(playlist: &PlaylistInfo, tracks: &[Track]) -> PreviewView {
    PreviewView {
        name: playlist.name.clone(),
        owner: if playlist.owner.is_empty() {
            "Unknown".to_string()
        } else {
            playlist.owner.clone()
        },
        track_count: tracks.len(),
        lines: tracks
            .iter()
            .enumerate()
            .map(|(i, track)| track_line(i + 1, track))
            .collect(),
    }
}

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::ServiceError;

/// A track as returned by the conversion service's playlist lookup.
///
/// The typed fields are for display. Serialization writes `raw` back out, so a
/// download request carries each track exactly as the service sent it.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub title: String,
    pub artist: String,
    pub duration: f64, // minutes, fractional
    pub bpm: Option<f64>,
    pub key: Option<i32>, // pitch class 0-11
    pub mode: String,
    /// The object as received; empty for tracks built locally
    pub raw: Map<String, Value>,
}

impl Default for Track {
    fn default() -> Self {
        Track {
            title: "Unknown".to_string(),
            artist: "Unknown Artist".to_string(),
            duration: 0.0,
            bpm: None,
            key: None,
            mode: String::new(),
            raw: Map::new(),
        }
    }
}

impl Track {
    /// Read the display fields out of a track object, leniently
    pub fn from_raw(raw: Map<String, Value>) -> Self {
        let text = |field: &str| {
            raw.get(field)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let title = text("title");
        let artist = text("artist");
        let mode = text("mode");
        let duration = raw.get("duration").and_then(Value::as_f64).unwrap_or(0.0);
        let bpm = raw.get("bpm").and_then(Value::as_f64);
        let key = raw
            .get("key")
            .and_then(Value::as_i64)
            .and_then(|k| i32::try_from(k).ok());

        Track {
            title,
            artist,
            duration,
            bpm,
            key,
            mode,
            raw,
        }
    }

    /// The object to send back to the service
    pub fn to_wire(&self) -> Map<String, Value> {
        if !self.raw.is_empty() {
            return self.raw.clone();
        }

        // Built locally rather than received; only the fields we know about
        let mut wire = Map::new();
        wire.insert("title".to_string(), Value::from(self.title.clone()));
        wire.insert("artist".to_string(), Value::from(self.artist.clone()));
        wire.insert("duration".to_string(), Value::from(self.duration));
        if let Some(bpm) = self.bpm {
            wire.insert("bpm".to_string(), Value::from(bpm));
        }
        if let Some(key) = self.key {
            wire.insert("key".to_string(), Value::from(key));
        }
        if !self.mode.is_empty() {
            wire.insert("mode".to_string(), Value::from(self.mode.clone()));
        }
        wire
    }
}

impl<'de> Deserialize<'de> for Track {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Track::from_raw(Map::deserialize(deserializer)?))
    }
}

impl Serialize for Track {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}

/// Summary of the resolved playlist
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaylistInfo {
    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub owner: String,
    #[serde(default)]
    pub track_count: u32,
}

/// Body of `POST /convert`.
///
/// The service dispatches on the presence of `url` or `songs`; the `phase`
/// tag is sent as well so the request is self-describing.
#[derive(Debug, Serialize)]
#[serde(tag = "phase")]
pub enum ConvertRequest<'a> {
    #[serde(rename = "info")]
    Analyze { url: &'a str },
    #[serde(rename = "download")]
    Download { songs: &'a [Track] },
}

/// Raw response of `POST /convert`, shared by both phases
#[derive(Debug, Default, Deserialize)]
pub struct ConvertResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub playlist_info: Option<PlaylistInfo>,
    #[serde(default)]
    pub songs: Option<Vec<Track>>,
    #[serde(rename = "songCount", default)]
    pub song_count: Option<u32>,
    #[serde(rename = "zipFile", default)]
    pub zip_file: Option<String>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub errors: Vec<String>,
    #[serde(rename = "downloadedSongs", default, deserialize_with = "nullable_vec")]
    pub downloaded_songs: Vec<Track>,
}

/// A successful phase-1 result: the playlist and its tracks, in service order
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistPreview {
    pub playlist: PlaylistInfo,
    pub tracks: Vec<Track>,
}

/// A successful phase-2 result
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadReceipt {
    pub song_count: u32,
    pub zip_file: String,
    pub unmatched: Vec<String>,
}

impl ConvertResponse {
    /// Interpret this response as the answer to an analyze request
    pub fn into_preview(self) -> Result<PlaylistPreview, ServiceError> {
        if !self.success {
            return Err(rejection(self.error));
        }
        if self.phase.as_deref() != Some("info") {
            return Err(ServiceError::UnexpectedPhase(self.phase));
        }

        let playlist = self
            .playlist_info
            .ok_or_else(|| ServiceError::Malformed("missing playlist_info".to_string()))?;
        let tracks = self
            .songs
            .ok_or_else(|| ServiceError::Malformed("missing songs".to_string()))?;

        if tracks.is_empty() {
            return Err(ServiceError::EmptyPlaylist);
        }

        Ok(PlaylistPreview { playlist, tracks })
    }

    /// Interpret this response as the answer to a download request
    pub fn into_receipt(self) -> Result<DownloadReceipt, ServiceError> {
        if !self.success {
            return Err(rejection(self.error));
        }

        let zip_file = self
            .zip_file
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ServiceError::Malformed("missing zipFile".to_string()))?;

        Ok(DownloadReceipt {
            song_count: self
                .song_count
                .unwrap_or(self.downloaded_songs.len() as u32),
            zip_file,
            unmatched: self.errors,
        })
    }
}

fn rejection(error: Option<String>) -> ServiceError {
    match error {
        Some(message) => ServiceError::Rejected(message),
        None => ServiceError::Malformed("failure without an error message".to_string()),
    }
}

fn nullable_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConvertError;

/// A source playlist as the backend describes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub tracks: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Body of `GET /public-playlist/{id}`, which answers 200 even on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicPlaylistReply {
    Found(Playlist),
    Error(String),
    Empty,
}

impl PublicPlaylistReply {
    pub fn from_body(body: &str) -> Result<Self, ConvertError> {
        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(PublicPlaylistReply::Empty);
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Error { error: String },
            Found(Playlist),
        }

        match serde_json::from_str::<Wire>(trimmed) {
            Ok(Wire::Error { error }) => Ok(PublicPlaylistReply::Error(error)),
            Ok(Wire::Found(playlist)) => Ok(PublicPlaylistReply::Found(playlist)),
            Err(e) => Err(ConvertError::MalformedResponse(format!(
                "public playlist body: {}",
                e
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvertRequest {
    pub playlist_id: String,
    pub playlist_name: String,
    pub description: String,
}

impl ConvertRequest {
    pub fn for_playlist(playlist: &Playlist) -> Self {
        Self {
            playlist_id: playlist.id.clone(),
            playlist_name: playlist.name.clone(),
            description: format!("Converted from Spotify playlist: {}", playlist.name),
        }
    }
}

/// Success body of `POST /convert`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConvertReply {
    pub youtube_playlist_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub spotify_tracks: Option<u32>,
    #[serde(default)]
    pub youtube_tracks_added: Option<u32>,
    #[serde(default)]
    pub youtube_tracks_failed: Option<u32>,
}

/// One progress event as pushed on `/convert-progress/{id}`.
///
/// Each snapshot replaces the previous one in full.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub total: u32,
    pub processed: u32,
    pub added: u32,
    pub failed: u32,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub playlist_id: String,
}

impl ProgressSnapshot {
    /// Zeroed snapshot shown between launch and the first event.
    pub fn pending(playlist_id: &str, total: u32) -> Self {
        Self {
            total,
            processed: 0,
            added: 0,
            failed: 0,
            completed: false,
            playlist_id: playlist_id.to_string(),
        }
    }

    /// Decode and validate one event payload.
    pub fn parse(data: &str) -> Result<Self, ConvertError> {
        let snapshot: ProgressSnapshot = serde_json::from_str(data)
            .map_err(|e| ConvertError::StreamDecodeError(format!("{}: {}", e, data)))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn validate(&self) -> Result<(), ConvertError> {
        if self.processed > self.total {
            return Err(ConvertError::StreamDecodeError(format!(
                "processed {} exceeds total {}",
                self.processed, self.total
            )));
        }
        if self.added as u64 + self.failed as u64 > self.processed as u64 {
            return Err(ConvertError::StreamDecodeError(format!(
                "added {} + failed {} exceeds processed {}",
                self.added, self.failed, self.processed
            )));
        }
        Ok(())
    }

    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        (self.processed as f64 / self.total as f64 * 100.0).round() as u32
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginReply {
    pub auth_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceStatus {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub sample_data: Option<String>,
}

/// Body of `GET /diagnose`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiagnosticReport {
    #[serde(default)]
    pub spotify: ServiceStatus,
    #[serde(default)]
    pub youtube_music: ServiceStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestPlaylistStatus {
    pub status: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tracks: Option<u32>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `GET /test-playlists`, keyed by probe name.
pub type TestPlaylists = BTreeMap<String, TestPlaylistStatus>;

#[derive(Debug, Clone, Deserialize)]
pub struct YoutubePlaylist {
    pub title: String,
    #[serde(rename = "playlistId")]
    pub playlist_id: String,
    #[serde(default)]
    pub count: Option<u32>,
}

/// Body of `GET /test-youtube`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct YoutubeTest {
    #[serde(default)]
    pub playlists: Option<Vec<YoutubePlaylist>>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(total: u32, processed: u32, added: u32, failed: u32) -> ProgressSnapshot {
        ProgressSnapshot {
            total,
            processed,
            added,
            failed,
            completed: false,
            playlist_id: "PL123".to_string(),
        }
    }

    #[test]
    fn test_percent() {
        assert_eq!(snapshot(0, 0, 0, 0).percent(), 0);
        assert_eq!(snapshot(40, 10, 9, 1).percent(), 25);
        assert_eq!(snapshot(42, 42, 40, 2).percent(), 100);
        assert_eq!(snapshot(3, 1, 1, 0).percent(), 33);
        assert_eq!(snapshot(3, 2, 2, 0).percent(), 67);
    }

    #[test]
    fn test_parse_valid_event() {
        let snap = ProgressSnapshot::parse(
            r#"{"total":42,"processed":10,"added":9,"failed":1,"completed":false,"playlist_id":"PL123"}"#,
        )
        .unwrap();
        assert_eq!(snap, snapshot(42, 10, 9, 1));
    }

    #[test]
    fn test_parse_rejects_processed_over_total() {
        let err = ProgressSnapshot::parse(
            r#"{"total":5,"processed":6,"added":6,"failed":0,"completed":false}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::StreamDecodeError(_)));
    }

    #[test]
    fn test_parse_rejects_outcomes_over_processed() {
        let err = ProgressSnapshot::parse(
            r#"{"total":10,"processed":4,"added":3,"failed":2,"completed":false}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::StreamDecodeError(_)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            ProgressSnapshot::parse("not json"),
            Err(ConvertError::StreamDecodeError(_))
        ));
        assert!(matches!(
            ProgressSnapshot::parse(r#"{"total":-1,"processed":0,"added":0,"failed":0}"#),
            Err(ConvertError::StreamDecodeError(_))
        ));
    }

    #[test]
    fn test_public_reply_variants() {
        let found = PublicPlaylistReply::from_body(
            r#"{"id":"37i9dQZF1","name":"Road Trip","tracks":42}"#,
        )
        .unwrap();
        assert_eq!(
            found,
            PublicPlaylistReply::Found(Playlist {
                id: "37i9dQZF1".to_string(),
                name: "Road Trip".to_string(),
                tracks: 42,
                image: None,
            })
        );

        let error =
            PublicPlaylistReply::from_body(r#"{"error":"Could not access playlist"}"#).unwrap();
        assert_eq!(
            error,
            PublicPlaylistReply::Error("Could not access playlist".to_string())
        );

        assert_eq!(
            PublicPlaylistReply::from_body("  ").unwrap(),
            PublicPlaylistReply::Empty
        );
        assert_eq!(
            PublicPlaylistReply::from_body("null").unwrap(),
            PublicPlaylistReply::Empty
        );
        assert!(PublicPlaylistReply::from_body(r#"{"name":"x"}"#).is_err());
    }

    #[test]
    fn test_convert_request_description() {
        let playlist = Playlist {
            id: "abc".to_string(),
            name: "Road Trip".to_string(),
            tracks: 42,
            image: None,
        };
        let req = ConvertRequest::for_playlist(&playlist);
        assert_eq!(req.playlist_id, "abc");
        assert_eq!(req.description, "Converted from Spotify playlist: Road Trip");
    }
}

use chrono::{DateTime, Utc};

use crate::backend::{Backend, ConvertRequest, Playlist};
use crate::error::{ConvertError, Result};

/// A launched conversion, keyed by the destination playlist the backend created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub destination_id: String,
    pub source: Playlist,
    pub launched_at: DateTime<Utc>,
}

/// Submit one conversion. Never retried here: a failed call may already have
/// created the destination playlist.
pub async fn launch(backend: &dyn Backend, selection: &Playlist) -> Result<ConversionJob> {
    let request = ConvertRequest::for_playlist(selection);
    tracing::info!(
        playlist_id = %selection.id,
        name = %selection.name,
        "submitting conversion"
    );

    let reply = backend.start_conversion(&request).await?;

    let destination_id = reply.youtube_playlist_id.trim().to_string();
    if destination_id.is_empty() {
        return Err(ConvertError::MalformedResponse(
            "conversion reply has an empty youtube_playlist_id".to_string(),
        ));
    }

    tracing::info!(
        destination_id = %destination_id,
        status = ?reply.status,
        spotify_tracks = ?reply.spotify_tracks,
        added = ?reply.youtube_tracks_added,
        failed = ?reply.youtube_tracks_failed,
        "conversion launched"
    );

    Ok(ConversionJob {
        destination_id,
        source: selection.clone(),
        launched_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{convert_reply, playlist, FakeBackend};

    #[tokio::test]
    async fn test_launch_returns_job() {
        let backend = FakeBackend::new().with_convert(Ok(convert_reply("PL123")));
        let selection = playlist("37i9dQZF1", "Road Trip", 42);

        let job = launch(&backend, &selection).await.unwrap();
        assert_eq!(job.destination_id, "PL123");
        assert_eq!(job.source, selection);

        let requests = backend.convert_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].playlist_id, "37i9dQZF1");
        assert_eq!(requests[0].playlist_name, "Road Trip");
        assert_eq!(
            requests[0].description,
            "Converted from Spotify playlist: Road Trip"
        );
    }

    #[tokio::test]
    async fn test_launch_failure_is_verbatim_and_not_retried() {
        let backend = FakeBackend::new().with_convert(Err(ConvertError::server(
            400,
            "Invalid playlist ID",
        )));

        let err = launch(&backend, &playlist("x", "X", 1)).await.unwrap_err();
        assert_eq!(err, ConvertError::server(400, "Invalid playlist ID"));
        assert_eq!(backend.convert_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_launch_rejects_blank_destination() {
        let backend = FakeBackend::new().with_convert(Ok(convert_reply("  ")));
        let err = launch(&backend, &playlist("x", "X", 1)).await.unwrap_err();
        assert!(matches!(err, ConvertError::MalformedResponse(_)));
    }
}

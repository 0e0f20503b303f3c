use std::collections::HashSet;

use crate::backend::{Backend, Playlist, PublicPlaylistReply};
use crate::error::{ConvertError, Result};

/// What the user navigated to: one public playlist, or their own collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationQuery {
    Public(String),
    Collection,
}

impl NavigationQuery {
    pub fn from_input(input: Option<&str>) -> Self {
        match input.and_then(extract_playlist_id) {
            Some(id) => NavigationQuery::Public(id),
            None => NavigationQuery::Collection,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, NavigationQuery::Collection)
    }
}

/// Extract playlist ID from a Spotify URL or URI, or return it as-is if already an ID.
pub fn extract_playlist_id(input: &str) -> Option<String> {
    let input = input.trim();

    // spotify:playlist:37i9dQZF1DXcBWIGoYBM5M
    if let Some(id) = input.strip_prefix("spotify:playlist:") {
        return non_empty(id);
    }

    let without_query = input.split(|c: char| c == '?' || c == '#').next().unwrap_or(input);
    if !without_query.contains('/') {
        return non_empty(without_query);
    }

    // https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M?si=...
    let mut segments = without_query.split('/');
    segments.find(|s| *s == "playlist")?;
    segments.next().and_then(non_empty)
}

fn non_empty(id: &str) -> Option<String> {
    let id = id.trim();
    (!id.is_empty()).then(|| id.to_string())
}

/// Normalized result of a resolution: the new working set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub playlists: Vec<Playlist>,
    /// Set for the public-link path, which needs no selection step.
    pub auto_selected: Option<Playlist>,
}

pub async fn resolve(backend: &dyn Backend, query: &NavigationQuery) -> Result<Resolution> {
    match query {
        NavigationQuery::Public(id) => resolve_public(backend, id).await,
        NavigationQuery::Collection => resolve_collection(backend).await,
    }
}

async fn resolve_public(backend: &dyn Backend, playlist_id: &str) -> Result<Resolution> {
    tracing::info!(playlist_id, "fetching public playlist");

    match backend.public_playlist(playlist_id).await? {
        PublicPlaylistReply::Found(playlist) => {
            tracing::info!(
                playlist_id,
                name = %playlist.name,
                tracks = playlist.tracks,
                "public playlist resolved"
            );
            Ok(Resolution {
                playlists: vec![playlist.clone()],
                auto_selected: Some(playlist),
            })
        }
        PublicPlaylistReply::Error(message) => {
            tracing::warn!(playlist_id, %message, "public playlist lookup failed");
            Err(ConvertError::PlaylistNotFound(message))
        }
        PublicPlaylistReply::Empty => Err(ConvertError::EmptyResponse),
    }
}

async fn resolve_collection(backend: &dyn Backend) -> Result<Resolution> {
    tracing::info!("fetching user playlists");

    let fetched = backend.user_playlists().await?;
    let fetched_count = fetched.len();

    let mut seen = HashSet::new();
    let playlists: Vec<Playlist> = fetched
        .into_iter()
        .filter(|p| seen.insert(p.id.clone()))
        .collect();

    if playlists.len() != fetched_count {
        tracing::warn!(
            dropped = fetched_count - playlists.len(),
            "duplicate playlist ids in collection"
        );
    }
    tracing::info!(count = playlists.len(), "user playlists resolved");

    Ok(Resolution {
        playlists,
        auto_selected: None,
    })
}

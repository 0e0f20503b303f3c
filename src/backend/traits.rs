use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

use crate::backend::{
    ConvertReply, ConvertRequest, DiagnosticReport, Playlist, ProgressSnapshot,
    PublicPlaylistReply, TestPlaylists, YoutubeTest,
};
use crate::error::Result;

/// Lazy sequence of snapshots for one job. Dropping it closes the connection.
pub type ProgressStream = Pin<Box<dyn Stream<Item = Result<ProgressSnapshot>> + Send>>;

#[async_trait]
pub trait Backend: Send + Sync {
    /// `GET /login`: authorization URL to send the user to
    async fn login_url(&self) -> Result<String>;

    /// `GET /playlists`: requires an authenticated session
    async fn user_playlists(&self) -> Result<Vec<Playlist>>;

    /// `GET /public-playlist/{id}`
    async fn public_playlist(&self, playlist_id: &str) -> Result<PublicPlaylistReply>;

    /// `POST /convert`: creates the destination playlist and starts the job
    async fn start_conversion(&self, request: &ConvertRequest) -> Result<ConvertReply>;

    /// `GET /convert-progress/{id}`: server-push stream keyed by the destination id
    async fn open_progress_stream(&self, job_id: &str) -> Result<ProgressStream>;

    async fn diagnose(&self) -> Result<DiagnosticReport>;

    async fn test_playlists(&self) -> Result<TestPlaylists>;

    async fn test_youtube(&self) -> Result<YoutubeTest>;
}

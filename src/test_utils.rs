use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures_util::{stream, Stream, StreamExt};

use crate::backend::{
    Backend, ConvertReply, ConvertRequest, DiagnosticReport, Playlist, ProgressSnapshot,
    ProgressStream, PublicPlaylistReply, TestPlaylists, YoutubeTest,
};
use crate::convert::{ConversionState, Renderer};
use crate::error::{ConvertError, Result};

pub fn playlist(id: &str, name: &str, tracks: u32) -> Playlist {
    Playlist {
        id: id.to_string(),
        name: name.to_string(),
        tracks,
        image: None,
    }
}

pub fn convert_reply(destination_id: &str) -> ConvertReply {
    ConvertReply {
        youtube_playlist_id: destination_id.to_string(),
        status: Some("success".to_string()),
        spotify_tracks: None,
        youtube_tracks_added: None,
        youtube_tracks_failed: None,
    }
}

pub fn progress(total: u32, processed: u32, added: u32, failed: u32, completed: bool) -> ProgressSnapshot {
    ProgressSnapshot {
        total,
        processed,
        added,
        failed,
        completed,
        playlist_id: "PL123".to_string(),
    }
}

/// Scripted in-memory backend that records every call and stream lifetime.
pub struct FakeBackend {
    playlists: Result<Vec<Playlist>>,
    public: Result<PublicPlaylistReply>,
    convert: Result<ConvertReply>,
    stream_script: Vec<Result<ProgressSnapshot>>,
    stream_open_error: Option<ConvertError>,
    hold_open: bool,
    public_calls: Mutex<usize>,
    convert_requests: Mutex<Vec<ConvertRequest>>,
    log: Arc<Mutex<Vec<String>>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            playlists: Err(ConvertError::server(400, "No token available. Please login first.")),
            public: Ok(PublicPlaylistReply::Empty),
            convert: Err(ConvertError::server(500, "convert not scripted")),
            stream_script: Vec::new(),
            stream_open_error: None,
            hold_open: false,
            public_calls: Mutex::new(0),
            convert_requests: Mutex::new(Vec::new()),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_playlists(mut self, playlists: Result<Vec<Playlist>>) -> Self {
        self.playlists = playlists;
        self
    }

    pub fn with_public(mut self, reply: Result<PublicPlaylistReply>) -> Self {
        self.public = reply;
        self
    }

    pub fn with_convert(mut self, reply: Result<ConvertReply>) -> Self {
        self.convert = reply;
        self
    }

    /// Events replayed on every stream this backend opens.
    pub fn with_stream(mut self, events: Vec<Result<ProgressSnapshot>>) -> Self {
        self.stream_script = events;
        self
    }

    pub fn with_stream_open_error(mut self, err: ConvertError) -> Self {
        self.stream_open_error = Some(err);
        self
    }

    /// Streams stay pending after the script instead of ending.
    pub fn holding_streams_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    pub fn public_calls(&self) -> usize {
        *self.public_calls.lock().unwrap()
    }

    pub fn convert_requests(&self) -> Vec<ConvertRequest> {
        self.convert_requests.lock().unwrap().clone()
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn opened_streams(&self) -> usize {
        self.log().iter().filter(|l| l.starts_with("open ")).count()
    }

    pub fn closed_streams(&self) -> usize {
        self.log().iter().filter(|l| l.starts_with("close ")).count()
    }
}

/// Logs `close <job>` when the stream is dropped.
struct TrackedStream {
    job_id: String,
    inner: ProgressStream,
    log: Arc<Mutex<Vec<String>>>,
}

impl Stream for TrackedStream {
    type Item = Result<ProgressSnapshot>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl Drop for TrackedStream {
    fn drop(&mut self) {
        self.log.lock().unwrap().push(format!("close {}", self.job_id));
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn login_url(&self) -> Result<String> {
        Ok("https://accounts.spotify.com/authorize?client_id=test".to_string())
    }

    async fn user_playlists(&self) -> Result<Vec<Playlist>> {
        self.playlists.clone()
    }

    async fn public_playlist(&self, _playlist_id: &str) -> Result<PublicPlaylistReply> {
        *self.public_calls.lock().unwrap() += 1;
        self.public.clone()
    }

    async fn start_conversion(&self, request: &ConvertRequest) -> Result<ConvertReply> {
        self.convert_requests.lock().unwrap().push(request.clone());
        self.convert.clone()
    }

    async fn open_progress_stream(&self, job_id: &str) -> Result<ProgressStream> {
        if let Some(err) = &self.stream_open_error {
            return Err(err.clone());
        }
        self.log.lock().unwrap().push(format!("open {}", job_id));

        let scripted = stream::iter(self.stream_script.clone());
        let inner: ProgressStream = if self.hold_open {
            Box::pin(scripted.chain(stream::pending()))
        } else {
            Box::pin(scripted)
        };

        Ok(Box::pin(TrackedStream {
            job_id: job_id.to_string(),
            inner,
            log: self.log.clone(),
        }))
    }

    async fn diagnose(&self) -> Result<DiagnosticReport> {
        Ok(DiagnosticReport::default())
    }

    async fn test_playlists(&self) -> Result<TestPlaylists> {
        Ok(TestPlaylists::new())
    }

    async fn test_youtube(&self) -> Result<YoutubeTest> {
        Ok(YoutubeTest::default())
    }
}

/// Renderer that keeps every state it was handed.
#[derive(Clone, Default)]
pub struct RecordingRenderer {
    pub states: Arc<Mutex<Vec<ConversionState>>>,
}

impl RecordingRenderer {
    pub fn rendered(&self) -> Vec<ConversionState> {
        self.states.lock().unwrap().clone()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, state: &ConversionState) {
        self.states.lock().unwrap().push(state.clone());
    }
}

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{cookie::Jar, header, Client, RequestBuilder, Response, Url};
use serde::{de::DeserializeOwned, Deserialize};

use crate::backend::{
    sse, Backend, ConvertReply, ConvertRequest, DiagnosticReport, LoginReply, Playlist,
    ProgressStream, PublicPlaylistReply, TestPlaylists, YoutubeTest,
};
use crate::error::{ConvertError, Result};
use crate::state::{Config, Session};

/// Transport client for the conversion backend.
///
/// All request/response calls share one cookie jar and the configured timeout.
/// The progress stream uses a second client on the same jar with no total
/// timeout, since it lives as long as the job runs.
pub struct HttpBackend {
    base_url: Url,
    http: Client,
    stream_http: Client,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct MessageBody {
    message: String,
}

impl HttpBackend {
    pub fn new(config: &Config, session: Option<&Session>) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.backend_url)
            .with_context(|| format!("Invalid backend URL: {}", config.backend_url))?;

        let jar = Arc::new(Jar::default());
        if let Some(session) = session {
            jar.add_cookie_str(&session.cookie, &base_url);
        }

        let http = Client::builder()
            .cookie_provider(jar.clone())
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        let stream_http = Client::builder()
            .cookie_provider(jar)
            .connect_timeout(config.connect_timeout())
            .build()
            .context("Failed to build streaming HTTP client")?;

        Ok(Self {
            base_url,
            http,
            stream_http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// Send, log, and turn non-2xx answers into `ServerError`.
    async fn execute(&self, builder: RequestBuilder) -> Result<Response> {
        let (client, request) = builder.build_split();
        let request = request.map_err(|e| ConvertError::from_transport(&e))?;
        let method = request.method().clone();
        let url = request.url().clone();

        tracing::debug!(%method, %url, "sending request");

        let response = client.execute(request).await.map_err(|e| {
            let err = ConvertError::from_transport(&e);
            tracing::error!(%method, %url, error = %e, "no response received");
            err
        })?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(%method, %url, status = status.as_u16(), "response");
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });
        tracing::warn!(%method, %url, status = status.as_u16(), %message, "error response");
        Err(ConvertError::server(status.as_u16(), message))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.execute(self.http.get(self.url(path))).await?;
        read_json(response, path).await
    }
}

/// Pull a human-readable message out of an error body.
fn error_message(body: &str) -> Option<String> {
    if let Ok(ErrorBody { error }) = serde_json::from_str(body) {
        return Some(error);
    }
    if let Ok(MessageBody { message }) = serde_json::from_str(body) {
        return Some(message);
    }
    let trimmed = body.trim();
    (!trimmed.is_empty() && trimmed.len() <= 200 && !trimmed.starts_with('<'))
        .then(|| trimmed.to_string())
}

/// Decode a 2xx body, honouring `{error}` envelopes sent with a success status.
async fn read_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| ConvertError::from_transport(&e))?;

    if body.trim().is_empty() {
        return Err(ConvertError::EmptyResponse);
    }
    if let Ok(ErrorBody { error }) = serde_json::from_str(&body) {
        return Err(ConvertError::server(status, error));
    }
    serde_json::from_str(&body)
        .map_err(|e| ConvertError::MalformedResponse(format!("{}: {}", what, e)))
}

#[async_trait]
impl Backend for HttpBackend {
    async fn login_url(&self) -> Result<String> {
        let reply: LoginReply = self.get_json("/login").await?;
        Ok(reply.auth_url)
    }

    async fn user_playlists(&self) -> Result<Vec<Playlist>> {
        self.get_json("/playlists").await
    }

    async fn public_playlist(&self, playlist_id: &str) -> Result<PublicPlaylistReply> {
        let path = format!("/public-playlist/{}", urlencoding::encode(playlist_id));
        let response = self.execute(self.http.get(self.url(&path))).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ConvertError::from_transport(&e))?;
        PublicPlaylistReply::from_body(&body)
    }

    async fn start_conversion(&self, request: &ConvertRequest) -> Result<ConvertReply> {
        let builder = self.http.post(self.url("/convert")).json(request);
        let response = self.execute(builder).await?;
        read_json(response, "/convert").await
    }

    async fn open_progress_stream(&self, job_id: &str) -> Result<ProgressStream> {
        let path = format!("/convert-progress/{}", urlencoding::encode(job_id));
        let builder = self
            .stream_http
            .get(self.url(&path))
            .header(header::ACCEPT, "text/event-stream")
            .header(header::CACHE_CONTROL, "no-cache");

        let response = self.execute(builder).await?;
        tracing::info!(job_id, "progress stream opened");
        Ok(sse::decode_snapshots(response.bytes_stream()))
    }

    async fn diagnose(&self) -> Result<DiagnosticReport> {
        self.get_json("/diagnose").await
    }

    async fn test_playlists(&self) -> Result<TestPlaylists> {
        self.get_json("/test-playlists").await
    }

    async fn test_youtube(&self) -> Result<YoutubeTest> {
        self.get_json("/test-youtube").await
    }
}

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::backend::{Backend, Playlist, ProgressSnapshot};
use crate::convert::launcher::{self, ConversionJob};
use crate::convert::progress::ProgressSubscription;
use crate::convert::resolver::{self, NavigationQuery};
use crate::convert::Renderer;
use crate::error::{ConvertError, Result};

/// What the user can do from `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Back to the landing state; the attempt cannot be retried from here.
    Home,
    /// Re-run the last resolution.
    Retry,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionSummary {
    pub destination_playlist_id: String,
    pub source_name: String,
    pub total: u32,
    pub added: u32,
    pub failed: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ConversionSummary {
    pub fn playlist_url(&self) -> String {
        format!(
            "https://music.youtube.com/playlist?list={}",
            urlencoding::encode(&self.destination_playlist_id)
        )
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionState {
    Idle,
    ResolvingPlaylists { query: NavigationQuery },
    AwaitingSelection { playlists: Vec<Playlist> },
    /// `submitted` is false while an auto-selected playlist waits for confirmation.
    Launching { playlist: Playlist, submitted: bool },
    Converting { job_id: String, snapshot: ProgressSnapshot },
    Completed { summary: ConversionSummary },
    Failed { reason: ConvertError, recovery: Recovery },
}

impl ConversionState {
    pub fn name(&self) -> &'static str {
        match self {
            ConversionState::Idle => "idle",
            ConversionState::ResolvingPlaylists { .. } => "resolving",
            ConversionState::AwaitingSelection { .. } => "awaiting-selection",
            ConversionState::Launching { .. } => "launching",
            ConversionState::Converting { .. } => "converting",
            ConversionState::Completed { .. } => "completed",
            ConversionState::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConversionState::Completed { .. } | ConversionState::Failed { .. }
        )
    }
}

/// Drives one conversion attempt at a time and pushes every state to a renderer.
///
/// Owns the selection, the launched job, and the open progress subscription.
/// The subscription is released on completion, failure, dismissal,
/// cancellation, and before any new resolve or launch.
pub struct ConversionViewModel {
    backend: Arc<dyn Backend>,
    renderer: Box<dyn Renderer>,
    state: ConversionState,
    query: Option<NavigationQuery>,
    playlists: Vec<Playlist>,
    selection: Option<Playlist>,
    job: Option<ConversionJob>,
    subscription: Option<ProgressSubscription>,
}

impl ConversionViewModel {
    pub fn new(backend: Arc<dyn Backend>, renderer: Box<dyn Renderer>) -> Self {
        Self {
            backend,
            renderer,
            state: ConversionState::Idle,
            query: None,
            playlists: Vec::new(),
            selection: None,
            job: None,
            subscription: None,
        }
    }

    pub fn state(&self) -> &ConversionState {
        &self.state
    }

    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    pub fn selection(&self) -> Option<&Playlist> {
        self.selection.as_ref()
    }

    pub fn job(&self) -> Option<&ConversionJob> {
        self.job.as_ref()
    }

    pub fn has_open_stream(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn is_converting(&self) -> bool {
        matches!(self.state, ConversionState::Converting { .. })
    }

    pub async fn resolve(&mut self, query: NavigationQuery) -> &ConversionState {
        self.release_stream().await;
        self.clear_attempt();
        self.query = Some(query.clone());
        self.transition(ConversionState::ResolvingPlaylists {
            query: query.clone(),
        });

        match resolver::resolve(self.backend.as_ref(), &query).await {
            Ok(resolution) => {
                self.playlists = resolution.playlists;
                match resolution.auto_selected {
                    Some(playlist) => {
                        self.selection = Some(playlist.clone());
                        self.transition(ConversionState::Launching {
                            playlist,
                            submitted: false,
                        });
                    }
                    None => self.transition(ConversionState::AwaitingSelection {
                        playlists: self.playlists.clone(),
                    }),
                }
            }
            Err(reason) => {
                let recovery = if query.is_collection() {
                    Recovery::Home
                } else {
                    Recovery::Retry
                };
                self.fail(reason, recovery);
            }
        }

        &self.state
    }

    /// Choose a playlist from the working set.
    pub fn select(&mut self, playlist_id: &str) -> Result<&Playlist> {
        if !matches!(self.state, ConversionState::AwaitingSelection { .. }) {
            return Err(ConvertError::PreconditionViolation(
                "select is only valid while awaiting a selection",
            ));
        }

        let playlist = self
            .playlists
            .iter()
            .find(|p| p.id == playlist_id)
            .cloned()
            .ok_or(ConvertError::PreconditionViolation(
                "selected playlist is not in the working set",
            ))?;

        tracing::debug!(playlist_id, name = %playlist.name, "playlist selected");
        Ok(&*self.selection.insert(playlist))
    }

    /// Launch the selection and attach to its progress stream.
    ///
    /// Any stream from an earlier launch is closed first. Errors only for
    /// caller bugs; launch failures land in `Failed`.
    pub async fn confirm(&mut self) -> Result<&ConversionState> {
        let launchable = matches!(
            self.state,
            ConversionState::AwaitingSelection { .. }
                | ConversionState::Launching {
                    submitted: false,
                    ..
                }
                | ConversionState::Converting { .. }
        );
        if !launchable {
            tracing::error!(state = self.state.name(), "confirm called outside a launchable state");
            return Err(ConvertError::PreconditionViolation(
                "confirm is only valid while selecting, awaiting confirmation, or converting",
            ));
        }

        let Some(playlist) = self.selection.clone() else {
            tracing::error!(state = self.state.name(), "confirm called without a selection");
            return Err(ConvertError::PreconditionViolation(
                "confirm requires a selection",
            ));
        };

        self.release_stream().await;
        self.job = None;
        self.transition(ConversionState::Launching {
            playlist: playlist.clone(),
            submitted: true,
        });

        let job = match launcher::launch(self.backend.as_ref(), &playlist).await {
            Ok(job) => job,
            Err(reason) => {
                self.fail(reason, Recovery::Retry);
                return Ok(&self.state);
            }
        };

        let subscription =
            match ProgressSubscription::open(self.backend.as_ref(), &job.destination_id).await {
                Ok(subscription) => subscription,
                Err(reason) => {
                    tracing::warn!(job_id = %job.destination_id, "job launched but its progress is unobservable");
                    self.fail(reason, Recovery::Retry);
                    return Ok(&self.state);
                }
            };

        let job_id = job.destination_id.clone();
        let snapshot = ProgressSnapshot::pending(&job_id, playlist.tracks);
        self.job = Some(job);
        self.subscription = Some(subscription);
        self.transition(ConversionState::Converting { job_id, snapshot });

        Ok(&self.state)
    }

    /// Wait for and apply one stream event. No-op without an open stream.
    pub async fn next_event(&mut self) -> &ConversionState {
        if let Some(subscription) = self.subscription.as_mut() {
            let event = subscription.next().await;
            self.apply(event).await;
        }
        &self.state
    }

    /// Apply one already-arrived event, if any. Returns whether one was applied.
    pub async fn try_next_event(&mut self) -> bool {
        let Some(event) = self.subscription.as_mut().and_then(|s| s.try_next()) else {
            return false;
        };
        self.apply(event).await;
        true
    }

    pub async fn run_to_completion(&mut self) -> &ConversionState {
        while self.is_converting() && self.has_open_stream() {
            self.next_event().await;
        }
        &self.state
    }

    async fn apply(&mut self, event: Result<ProgressSnapshot>) {
        let ConversionState::Converting { job_id, .. } = &self.state else {
            tracing::warn!(state = self.state.name(), "dropping progress event outside converting");
            return;
        };
        let job_id = job_id.clone();

        let snapshot = match event {
            Ok(snapshot) if !snapshot.playlist_id.is_empty() && snapshot.playlist_id != job_id => {
                Err(ConvertError::StreamDecodeError(format!(
                    "event for job {} on stream for {}",
                    snapshot.playlist_id, job_id
                )))
            }
            other => other,
        };

        match snapshot {
            Ok(snapshot) if snapshot.completed => {
                self.release_stream().await;
                let summary = self.summarize(&job_id, &snapshot);
                self.job.take();
                tracing::info!(
                    job_id = %job_id,
                    total = summary.total,
                    added = summary.added,
                    failed = summary.failed,
                    "conversion completed"
                );
                self.transition(ConversionState::Completed { summary });
            }
            Ok(snapshot) => {
                tracing::debug!(
                    job_id = %job_id,
                    processed = snapshot.processed,
                    total = snapshot.total,
                    percent = snapshot.percent(),
                    "progress"
                );
                self.transition(ConversionState::Converting { job_id, snapshot });
            }
            Err(reason) => {
                self.release_stream().await;
                self.job.take();
                let reason = match reason {
                    ConvertError::StreamDecodeError(_) | ConvertError::ProgressStreamInterrupted(_) => {
                        reason
                    }
                    other => ConvertError::ProgressStreamInterrupted(other.to_string()),
                };
                self.fail(reason, Recovery::Retry);
            }
        }
    }

    /// Leave a terminal state and drop everything from the attempt.
    pub async fn dismiss(&mut self) -> &ConversionState {
        self.release_stream().await;
        self.clear_attempt();
        self.query = None;
        self.transition(ConversionState::Idle);
        &self.state
    }

    /// Retry from `Failed`: re-resolve, or go home when retry is not possible.
    pub async fn retry(&mut self) -> Result<&ConversionState> {
        let recovery = match &self.state {
            ConversionState::Failed { recovery, .. } => *recovery,
            _ => {
                return Err(ConvertError::PreconditionViolation(
                    "retry is only valid from a failed state",
                ))
            }
        };

        match (recovery, self.query.clone()) {
            (Recovery::Retry, Some(query)) => Ok(self.resolve(query).await),
            _ => Ok(self.dismiss().await),
        }
    }

    /// Navigate away mid-attempt. The backend job, if any, keeps running unobserved.
    pub async fn cancel(&mut self) -> &ConversionState {
        if let Some(job) = &self.job {
            if self.subscription.is_some() {
                tracing::warn!(
                    job_id = %job.destination_id,
                    "cancelled while converting; the job may continue server-side"
                );
            }
        }
        self.dismiss().await
    }

    fn summarize(&self, job_id: &str, snapshot: &ProgressSnapshot) -> ConversionSummary {
        let (source_name, started_at) = match &self.job {
            Some(job) => (job.source.name.clone(), job.launched_at),
            None => (String::new(), Utc::now()),
        };
        ConversionSummary {
            destination_playlist_id: job_id.to_string(),
            source_name,
            total: snapshot.total,
            added: snapshot.added,
            failed: snapshot.failed,
            started_at,
            finished_at: Utc::now(),
        }
    }

    fn fail(&mut self, reason: ConvertError, recovery: Recovery) {
        if reason.is_user_facing() {
            tracing::warn!(error = %reason, ?recovery, "conversion attempt failed");
        } else {
            tracing::error!(error = %reason, "conversion attempt failed on a precondition");
        }
        self.transition(ConversionState::Failed { reason, recovery });
    }

    fn clear_attempt(&mut self) {
        self.playlists.clear();
        self.selection = None;
        self.job = None;
    }

    async fn release_stream(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.close().await;
        }
    }

    fn transition(&mut self, next: ConversionState) {
        if self.state.name() != next.name() {
            tracing::debug!(from = self.state.name(), to = next.name(), "state change");
        }
        self.state = next;
        self.renderer.render(&self.state);
    }
}

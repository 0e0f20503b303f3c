use futures_util::StreamExt;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::task::JoinHandle;

use crate::backend::{Backend, ProgressSnapshot, ProgressStream};
use crate::error::{ConvertError, Result};

const EVENT_BUFFER: usize = 32;

/// An open progress stream for one job.
///
/// A reader task pumps decoded snapshots into a channel so the owner never
/// blocks on the connection. `close` releases the connection and waits for it;
/// dropping the subscription aborts the reader as well.
pub struct ProgressSubscription {
    job_id: String,
    events: mpsc::Receiver<Result<ProgressSnapshot>>,
    reader: JoinHandle<()>,
}

impl ProgressSubscription {
    pub async fn open(backend: &dyn Backend, job_id: &str) -> Result<Self> {
        let stream = backend.open_progress_stream(job_id).await?;
        Ok(Self::spawn(job_id, stream))
    }

    pub fn spawn(job_id: &str, stream: ProgressStream) -> Self {
        let (tx, events) = mpsc::channel(EVENT_BUFFER);
        let reader = tokio::spawn(Self::read_events(stream, tx));
        tracing::debug!(job_id, "progress subscription opened");

        Self {
            job_id: job_id.to_string(),
            events,
            reader,
        }
    }

    async fn read_events(
        mut stream: ProgressStream,
        tx: mpsc::Sender<Result<ProgressSnapshot>>,
    ) {
        while let Some(item) = stream.next().await {
            let terminal = match &item {
                Ok(snapshot) => snapshot.completed,
                Err(_) => true,
            };
            if tx.send(item).await.is_err() || terminal {
                break;
            }
        }
    }

    /// Wait for the next event. A reader that ended without a terminal
    /// event counts as an interrupted stream.
    pub async fn next(&mut self) -> Result<ProgressSnapshot> {
        match self.events.recv().await {
            Some(item) => item,
            None => Err(Self::ended()),
        }
    }

    /// Non-blocking poll; `None` when nothing has arrived yet.
    pub fn try_next(&mut self) -> Option<Result<ProgressSnapshot>> {
        match self.events.try_recv() {
            Ok(item) => Some(item),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(Self::ended())),
        }
    }

    pub async fn close(mut self) {
        self.reader.abort();
        let _ = (&mut self.reader).await;
        tracing::debug!(job_id = %self.job_id, "progress subscription closed");
    }

    fn ended() -> ConvertError {
        ConvertError::ProgressStreamInterrupted("stream ended without completion".to_string())
    }
}

impl Drop for ProgressSubscription {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

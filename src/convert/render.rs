use std::io::Write;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::backend::ProgressSnapshot;
use crate::convert::machine::{ConversionState, Recovery};
use crate::convert::resolver::NavigationQuery;

/// Receives every state the view-model enters.
pub trait Renderer: Send {
    fn render(&mut self, state: &ConversionState);
}

pub fn progress_line(snapshot: &ProgressSnapshot) -> String {
    format!(
        "{}/{} tracks ({}%) - {} added, {} failed",
        snapshot.processed,
        snapshot.total,
        snapshot.percent(),
        snapshot.added,
        snapshot.failed
    )
}

/// Prints states as text and drives a progress bar while converting.
pub struct TerminalRenderer<W: Write + Send> {
    out: W,
    bar: Option<ProgressBar>,
    draw_bar: bool,
    last_line: Option<String>,
}

impl TerminalRenderer<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            out: std::io::stdout(),
            bar: None,
            draw_bar: true,
            last_line: None,
        }
    }
}

impl<W: Write + Send> TerminalRenderer<W> {
    /// Plain text only; progress is written as one line per change.
    pub fn plain(out: W) -> Self {
        Self {
            out,
            bar: None,
            draw_bar: false,
            last_line: None,
        }
    }

    pub fn into_inner(mut self) -> W {
        self.finish_bar();
        self.out
    }

    fn line(&mut self, text: impl AsRef<str>) {
        // output is best effort; a closed pipe must not abort the conversion
        let _ = writeln!(self.out, "{}", text.as_ref());
        let _ = self.out.flush();
    }

    fn show_progress(&mut self, snapshot: &ProgressSnapshot) {
        if !self.draw_bar {
            let line = progress_line(snapshot);
            if self.last_line.as_deref() != Some(line.as_str()) {
                self.line(format!("Converting: {}", line));
                self.last_line = Some(line);
            }
            return;
        }

        let bar = self.bar.get_or_insert_with(|| {
            let bar = ProgressBar::with_draw_target(
                Some(u64::from(snapshot.total)),
                ProgressDrawTarget::stderr(),
            );
            let style = ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>4}/{len:4} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar());
            bar.set_style(style);
            bar
        });
        bar.set_length(u64::from(snapshot.total));
        bar.set_position(u64::from(snapshot.processed));
        bar.set_message(format!(
            "{}% - {} added, {} failed",
            snapshot.percent(),
            snapshot.added,
            snapshot.failed
        ));
    }

    fn finish_bar(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
        self.last_line = None;
    }
}

impl<W: Write + Send> Renderer for TerminalRenderer<W> {
    fn render(&mut self, state: &ConversionState) {
        match state {
            ConversionState::Idle => self.finish_bar(),
            ConversionState::ResolvingPlaylists { query } => match query {
                NavigationQuery::Public(id) => self.line(format!("Fetching playlist {}...", id)),
                NavigationQuery::Collection => self.line("Fetching your playlists..."),
            },
            ConversionState::AwaitingSelection { playlists } => {
                if playlists.is_empty() {
                    self.line("No playlists found.");
                    return;
                }
                self.line(format!("\nYour playlists ({}):\n", playlists.len()));
                for (i, playlist) in playlists.iter().enumerate() {
                    self.line(format!(
                        "{:>3}. {} ({} tracks) [{}]",
                        i + 1,
                        playlist.name,
                        playlist.tracks,
                        playlist.id
                    ));
                }
            }
            ConversionState::Launching {
                playlist,
                submitted: false,
            } => self.line(format!(
                "\nPlaylist: {}\nTracks: {}",
                playlist.name, playlist.tracks
            )),
            ConversionState::Launching {
                playlist,
                submitted: true,
            } => {
                self.finish_bar();
                self.line(format!("Converting '{}' to YouTube Music...", playlist.name));
            }
            ConversionState::Converting { snapshot, .. } => self.show_progress(snapshot),
            ConversionState::Completed { summary } => {
                self.finish_bar();
                self.line(format!("\nConversion of '{}' complete.", summary.source_name));
                self.line(format!("  Total:  {}", summary.total));
                self.line(format!("  Added:  {}", summary.added));
                self.line(format!("  Failed: {}", summary.failed));
                self.line(format!(
                    "  Took:   {}s",
                    summary.elapsed().num_seconds().max(0)
                ));
                self.line(format!("\nOpen on YouTube Music: {}", summary.playlist_url()));
            }
            ConversionState::Failed { reason, recovery } => {
                self.finish_bar();
                self.line(format!("Error: {}", reason));
                match recovery {
                    Recovery::Home => self.line("Run 'pconv login' and try again."),
                    Recovery::Retry => self.line("You can retry the conversion."),
                }
            }
        }
    }
}

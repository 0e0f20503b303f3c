use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// pconv - Convert Spotify playlists to YouTube Music
///
/// Drives a running conversion backend: pick a playlist, start the
/// conversion, and follow its progress live.
#[derive(Parser, Debug)]
#[command(name = "pconv")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Conversion backend base URL (overrides config and PCONV_BACKEND_URL)
    #[arg(short, long, global = true)]
    pub backend_url: Option<String>,

    /// Directory holding config.toml and the stored session
    #[arg(short, long, global = true, default_value = ".pconv")]
    pub data_dir: PathBuf,

    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the Spotify login flow in the browser
    Login,
    /// Manage the stored backend session cookie
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// List your Spotify playlists
    Playlists,
    /// Convert a playlist to YouTube Music
    Convert {
        /// Playlist URL, URI or ID (e.g., https://open.spotify.com/playlist/37i9...).
        /// Omit to choose from your own playlists.
        playlist: Option<String>,
        /// Start without asking for confirmation
        #[arg(short, long, default_value_t = false)]
        yes: bool,
        /// Playlist to pick from your collection, by ID or 1-based index
        #[arg(short, long)]
        pick: Option<String>,
    },
    /// Check backend connectivity and credentials
    Diagnose,
    /// List YouTube Music playlists visible to the backend
    TestYoutube,
}

#[derive(Subcommand, Debug)]
pub enum SessionAction {
    /// Store the session cookie set by the backend after login
    Set {
        /// Cookie value, `session=...` pair, or a full `Cookie:` header
        cookie: String,
    },
    /// Remove the stored session
    Clear,
    /// Show whether a session is stored
    Show,
}

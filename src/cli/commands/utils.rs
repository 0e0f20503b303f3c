use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::{
    backend::{Backend, HttpBackend, Playlist},
    state::{session, Config},
};

/// Defaults, then `<data_dir>/config.toml`, then environment, then flags.
pub fn load_config(data_dir: &Path, backend_url: Option<&str>) -> Result<Config> {
    let mut config = Config::load_or_default(data_dir)?;
    config.apply_env()?;
    if let Some(url) = backend_url {
        config.backend_url = url.to_string();
    }
    tracing::debug!(backend_url = %config.backend_url, data_dir = ?config.data_dir, "configuration loaded");
    Ok(config)
}

/// Transport client carrying the stored session, if any.
pub fn create_backend(config: &Config) -> Result<Arc<dyn Backend>> {
    let stored = session::load(&config.data_dir).context("Failed to load stored session")?;
    if stored.is_none() {
        tracing::debug!("no stored session; requests go out unauthenticated");
    }
    let backend = HttpBackend::new(config, stored.as_ref())?;
    Ok(Arc::new(backend))
}

pub fn prompt(question: &str) -> Result<String> {
    print!("{}", question);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read from stdin")?;
    Ok(answer.trim().to_string())
}

pub fn confirm(question: &str) -> Result<bool> {
    let answer = prompt(&format!("{} [y/N] ", question))?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Match a 1-based index first, then a playlist id.
pub fn pick_playlist<'a>(playlists: &'a [Playlist], choice: &str) -> Option<&'a Playlist> {
    let choice = choice.trim();
    if let Ok(index) = choice.parse::<usize>() {
        if (1..=playlists.len()).contains(&index) {
            return playlists.get(index - 1);
        }
    }
    playlists.iter().find(|p| p.id == choice)
}

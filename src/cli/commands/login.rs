use anyhow::{Context, Result};

use crate::cli::commands::utils;
use crate::state::Config;

/// Ask the backend for its Spotify authorization URL and open it.
pub async fn run(config: &Config) -> Result<()> {
    let backend = utils::create_backend(config)?;
    let auth_url = backend
        .login_url()
        .await
        .context("Failed to start login")?;

    println!("Opening browser for Spotify authorization...\n");
    println!("If it doesn't open, visit:\n{}\n", auth_url);

    if let Err(e) = open::that(&auth_url) {
        tracing::warn!(error = %e, "could not open browser");
    }

    println!("After authorizing, the backend sets a `session` cookie for {}.", config.backend_url);
    println!("Copy its value from your browser and run:\n");
    println!("  pconv session set <cookie>");

    Ok(())
}

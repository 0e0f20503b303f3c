use anyhow::{Context, Result};

use crate::cli::commands::utils;
use crate::convert::{resolver, NavigationQuery};
use crate::state::Config;

pub async fn run(config: &Config) -> Result<()> {
    let backend = utils::create_backend(config)?;
    let resolution = resolver::resolve(backend.as_ref(), &NavigationQuery::Collection)
        .await
        .context("Failed to fetch playlists")?;

    if resolution.playlists.is_empty() {
        println!("No playlists found.");
        return Ok(());
    }

    println!("\nYour playlists ({}):\n", resolution.playlists.len());
    for (i, playlist) in resolution.playlists.iter().enumerate() {
        println!(
            "{:>3}. {} ({} tracks)\n     {}",
            i + 1,
            playlist.name,
            playlist.tracks,
            playlist.id
        );
    }

    Ok(())
}

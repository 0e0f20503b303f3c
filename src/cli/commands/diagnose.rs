use anyhow::{Context, Result};

use crate::backend::{ServiceStatus, TestPlaylists};
use crate::cli::commands::utils;
use crate::state::Config;

pub async fn run(config: &Config) -> Result<()> {
    let backend = utils::create_backend(config)?;

    println!("Backend: {}\n", config.backend_url);

    let report = backend
        .diagnose()
        .await
        .context("Failed to reach /diagnose")?;
    println!("{}", service_line("Spotify", &report.spotify));
    println!("{}", service_line("YouTube Music", &report.youtube_music));

    match backend.test_playlists().await {
        Ok(probes) => print_probes(&probes),
        Err(e) => println!("\nPlaylist probes unavailable: {}", e),
    }

    Ok(())
}

pub async fn test_youtube(config: &Config) -> Result<()> {
    let backend = utils::create_backend(config)?;
    let result = backend
        .test_youtube()
        .await
        .context("Failed to reach /test-youtube")?;

    if let Some(message) = &result.message {
        println!("{}", message);
    }

    let playlists = result.playlists.unwrap_or_default();
    if playlists.is_empty() {
        println!("No YouTube Music playlists found.");
        return Ok(());
    }

    println!("\nYouTube Music playlists ({}):\n", playlists.len());
    for (i, playlist) in playlists.iter().enumerate() {
        let count = playlist
            .count
            .map(|c| format!("{} tracks", c))
            .unwrap_or_else(|| "? tracks".to_string());
        println!("{:>3}. {} ({}) [{}]", i + 1, playlist.title, count, playlist.playlist_id);
    }

    Ok(())
}

fn service_line(name: &str, status: &ServiceStatus) -> String {
    let mut line = format!("{:<14} {}", format!("{}:", name), status.status);
    if let Some(message) = &status.message {
        line.push_str(&format!(" - {}", message));
    }
    if let Some(sample) = &status.sample_data {
        line.push_str(&format!(" (sample: {})", sample));
    }
    line
}

fn print_probes(probes: &TestPlaylists) {
    if probes.is_empty() {
        return;
    }
    println!("\nPlaylist probes:");
    for (name, probe) in probes {
        let mut line = format!("  {:<20} {}", name, probe.status);
        if let Some(playlist) = &probe.name {
            line.push_str(&format!(" - {}", playlist));
        }
        if let Some(tracks) = probe.tracks {
            line.push_str(&format!(" ({} tracks)", tracks));
        }
        if let Some(message) = &probe.message {
            line.push_str(&format!(": {}", message));
        }
        println!("{}", line);
    }
}

mod backend;
mod cli;
mod convert;
mod error;
mod logging;
mod state;
mod utils;

#[cfg(test)]
mod test_utils;

use clap::Parser;
use cli::commands::{self, convert::ConvertOptions};
use cli::{Cli, Commands, SessionAction};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (ignores if missing)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let config = commands::utils::load_config(&cli.data_dir, cli.backend_url.as_deref())?;

    match cli.command {
        Commands::Login => commands::login::run(&config).await?,
        Commands::Session { action } => match action {
            SessionAction::Set { cookie } => commands::session::set(&config, &cookie)?,
            SessionAction::Clear => commands::session::clear(&config)?,
            SessionAction::Show => commands::session::show(&config)?,
        },
        Commands::Playlists => commands::playlists::run(&config).await?,
        Commands::Convert {
            playlist,
            yes,
            pick,
        } => {
            let options = ConvertOptions {
                playlist: playlist.as_deref(),
                yes,
                pick: pick.as_deref(),
            };
            commands::convert::run(&config, options).await?;
        }
        Commands::Diagnose => commands::diagnose::run(&config).await?,
        Commands::TestYoutube => commands::diagnose::test_youtube(&config).await?,
    }

    Ok(())
}

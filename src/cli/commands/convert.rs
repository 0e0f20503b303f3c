use anyhow::{bail, Context, Result};

use crate::cli::commands::utils;
use crate::convert::{
    ConversionState, ConversionViewModel, NavigationQuery, Recovery, TerminalRenderer,
};
use crate::state::Config;

pub struct ConvertOptions<'a> {
    pub playlist: Option<&'a str>,
    pub yes: bool,
    pub pick: Option<&'a str>,
}

enum Follow {
    Finished,
    Interrupted,
}

pub async fn run(config: &Config, options: ConvertOptions<'_>) -> Result<()> {
    let backend = utils::create_backend(config)?;
    let mut vm = ConversionViewModel::new(backend, Box::new(TerminalRenderer::stdout()));

    vm.resolve(NavigationQuery::from_input(options.playlist)).await;

    loop {
        match vm.state().clone() {
            ConversionState::AwaitingSelection { .. } => {
                if vm.playlists().is_empty() {
                    vm.dismiss().await;
                    bail!("No playlists to convert");
                }

                let choice = match options.pick {
                    Some(pick) => pick.to_string(),
                    None => utils::prompt("\nPick a playlist (number or ID): ")?,
                };
                let chosen = utils::pick_playlist(vm.playlists(), &choice)
                    .with_context(|| format!("No playlist matches '{}'", choice))?
                    .clone();
                vm.select(&chosen.id)?;

                if !options.yes && !utils::confirm(&format!("Convert '{}'?", chosen.name))? {
                    vm.cancel().await;
                    println!("Cancelled.");
                    return Ok(());
                }
                vm.confirm().await?;
            }
            ConversionState::Launching {
                playlist,
                submitted: false,
            } => {
                if !options.yes
                    && !utils::confirm(&format!("Convert '{}' to YouTube Music?", playlist.name))?
                {
                    vm.cancel().await;
                    println!("Cancelled.");
                    return Ok(());
                }
                vm.confirm().await?;
            }
            ConversionState::Converting { .. } => match follow(&mut vm).await {
                Follow::Interrupted => {
                    vm.cancel().await;
                    println!("\nCancelled. The backend may keep converting in the background.");
                    return Ok(());
                }
                Follow::Finished if !vm.state().is_terminal() => {
                    vm.cancel().await;
                    bail!("Progress stopped before the conversion finished");
                }
                Follow::Finished => {}
            },
            ConversionState::Completed { .. } => {
                vm.dismiss().await;
                return Ok(());
            }
            ConversionState::Failed { reason, recovery } => {
                if recovery == Recovery::Retry && !options.yes && utils::confirm("Retry?")? {
                    vm.retry().await?;
                    continue;
                }
                vm.dismiss().await;
                return Err(anyhow::Error::new(reason).context("Conversion failed"));
            }
            other => bail!("Conversion stopped in unexpected state '{}'", other.name()),
        }
    }
}

/// Apply stream events until the conversion leaves `Converting` or Ctrl-C arrives.
///
/// On Ctrl-C, events that already arrived are still applied, so a job that
/// finished just before the interrupt reports as finished.
async fn follow(vm: &mut ConversionViewModel) -> Follow {
    let interrupted = tokio::select! {
        _ = vm.run_to_completion() => false,
        _ = tokio::signal::ctrl_c() => true,
    };
    if !interrupted {
        return Follow::Finished;
    }

    while vm.is_converting() && vm.try_next_event().await {}
    if vm.is_converting() {
        Follow::Interrupted
    } else {
        Follow::Finished
    }
}

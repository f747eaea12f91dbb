//! Subcommand handlers.

use crate::{Commands, ConfigAction};
use std::path::Path;

pub async fn handle_command(command: Commands, workspace: &Path) -> anyhow::Result<()> {
    match command {
        Commands::Config { action } => handle_config(action, workspace),
    }
}

fn handle_config(action: ConfigAction, workspace: &Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_path = deckagent_core::config::workspace_config_path(workspace);
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }
            if let Some(dir) = config_path.parent() {
                std::fs::create_dir_all(dir)?;
            }

            let default_config = deckagent_core::DeckConfig::default();
            let toml_str = toml::to_string_pretty(&default_config)?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = deckagent_core::load_config(Some(workspace), &Default::default())
                .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
            // `api_key` is skipped during serialization, so the secret never prints.
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{}", toml_str);
            Ok(())
        }
        ConfigAction::Path => {
            match deckagent_core::config::user_config_path() {
                Some(path) => println!("user:      {}", path.display()),
                None => println!("user:      (no config directory on this platform)"),
            }
            println!(
                "workspace: {}",
                deckagent_core::config::workspace_config_path(workspace).display()
            );
            Ok(())
        }
    }
}

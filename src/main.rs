// ABOUTME: Entry point for the charm CLI application.
// ABOUTME: Parses arguments and dispatches to account operations.

mod cli;

use charm_client::client::API_AUDIENCE;
use charm_client::output::{Output, OutputMode};
use charm_client::types::{AccountName, PublicKeyRecord};
use charm_client::{Client, Config, Error, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let output = Output::new(cli.output_mode());

    let result = match Config::from_env() {
        Ok(config) => {
            init_tracing(cli.verbose, &config);
            run(cli.command, config, &output).await
        }
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool, config: &Config) {
    let filter = if verbose || config.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let Some(path) = config.logfile.as_ref() else {
        builder.init();
        return;
    };
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => builder.with_ansi(false).with_writer(Mutex::new(file)).init(),
        Err(e) => {
            builder.init();
            tracing::warn!(path = %path.display(), "cannot open log file: {}", e);
        }
    }
}

async fn run(command: Commands, config: Config, output: &Output) -> Result<()> {
    // Reject bad input before any key is generated or connection made.
    match &command {
        Commands::Name { name } => {
            AccountName::new(name.as_str())?;
        }
        Commands::Unlink { key } => {
            PublicKeyRecord::parse(key)?;
        }
        _ => {}
    }

    let client = Client::new(config).await?;

    match command {
        Commands::Id => {
            let id = client.id().await?;
            output.value("ID", id.trim_end());
        }
        Commands::Bio => {
            let user = client.bio().await?;
            output.bio(&user);
        }
        Commands::Name { name } => {
            let user = client.set_name(&name).await?;
            output.success(&format!("OK! Your new username is {}", user.name));
        }
        Commands::Keys { metadata } => {
            if metadata || output.mode() == OutputMode::Json {
                output.keys(&client.authorized_keys_with_metadata().await?);
            } else {
                output.text(&client.authorized_keys().await?);
            }
        }
        Commands::Link { path } => {
            let text = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| Error::ReadKeyFile {
                    path: path.clone(),
                    source,
                })?;
            client.link_key_text(&text).await?;
            output.success(&format!("Linked key from {}", path.display()));
        }
        Commands::Unlink { key } => {
            let record = PublicKeyRecord::parse(&key)?;
            client.unlink_key(&record).await?;
            output.success("Unlinked key");
        }
        Commands::Jwt { audience } => {
            let audience: Vec<&str> = if audience.is_empty() {
                vec![API_AUDIENCE]
            } else {
                audience.iter().map(String::as_str).collect()
            };
            let token = client.jwt(&audience).await?;
            output.value("JWT", token.trim_end());
        }
    }

    Ok(())
}

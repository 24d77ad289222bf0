mod actions;
mod cli;
mod client;
mod commands;
mod config;
mod debounce;
mod error;
mod output;
mod overlay;
mod pager;
mod resource;
mod route;
mod session;
mod types;

use std::error::Error;
use std::io;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, TaskCommands, UserCommands};
use client::{TodoApi, TodoClient};
use config::Config;
use error::Result;
use route::Route;
use session::{Session, SessionSettings};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");

        // Show error chain if verbose flag was passed
        if std::env::args().any(|arg| arg == "--verbose" || arg == "-v") {
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("Caused by: {cause}");
                source = std::error::Error::source(cause);
            }
        }

        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    // Set global output format
    output::set_format(cli.output_format());
    output::set_quiet(cli.quiet);

    match cli.command {
        // Commands that don't require config/client
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "todo", &mut io::stdout());
        }
        Commands::Init => {
            commands::init::run().await?;
        }
        // Commands that require config and client
        command => {
            let config = Config::load()?;
            let base_url = config.base_url(cli.base_url.as_deref())?;
            tracing::debug!(%base_url, "using backend");
            let client = TodoClient::new(base_url);

            match command {
                Commands::Users { action } => match action {
                    UserCommands::List => commands::users::list(&client).await?,
                    UserCommands::Add { email } => commands::users::add(&client, &email).await?,
                    UserCommands::Rm { id } => commands::users::remove(&client, &id).await?,
                },
                Commands::Tasks { action } => match action {
                    TaskCommands::List(args) => {
                        commands::tasks::list(&client, config.per_page(), args).await?;
                    }
                    TaskCommands::Add { user_id, title } => {
                        commands::tasks::add(&client, &user_id, &title).await?;
                    }
                    TaskCommands::Done { id, undo } => {
                        commands::tasks::set_done(&client, &id, !undo).await?;
                    }
                    TaskCommands::Rm { id } => commands::tasks::remove(&client, &id).await?,
                },
                Commands::Browse { route } => {
                    let route = Route::parse(&route)?;
                    let api: Arc<dyn TodoApi> = Arc::new(client);
                    let mut session = Session::new(api, SessionSettings::from(&config));
                    commands::browse::run(&mut session, route).await?;
                }
                Commands::Completions { .. } | Commands::Init => {
                    // Already handled above
                }
            }
        }
    }

    Ok(())
}

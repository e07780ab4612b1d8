//! Customer satisfaction pipeline - Main Entry Point

use clap::Parser;
use satisfaction_pipeline::cli::{
    cmd_deploy, cmd_init_config, cmd_stop, cmd_train, load_config, show_help, Cli, Commands,
};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "satisfaction=info,satisfaction_pipeline=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = || load_config(cli.pipeline_config.as_deref(), cli.data.as_deref());

    match &cli.command {
        Some(Commands::Train) => cmd_train(config()?)?,
        Some(Commands::Deploy { config: mode, min_accuracy }) => {
            cmd_deploy(config()?, *mode, *min_accuracy)?;
        }
        Some(Commands::Stop) => cmd_stop(config()?)?,
        Some(Commands::InitConfig { output }) => cmd_init_config(output)?,
        None => show_help(),
    }

    Ok(())
}

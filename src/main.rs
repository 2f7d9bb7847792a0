use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    sitemigrate::logging::init().context("init logging")?;

    let cli = sitemigrate::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        sitemigrate::cli::Command::Build(args) => {
            sitemigrate::build::run(args).await.context("build")?;
        }
        sitemigrate::cli::Command::Crawl(args) => {
            sitemigrate::crawl::run(args).await.context("crawl")?;
        }
        sitemigrate::cli::Command::Compile(args) => {
            sitemigrate::compile::run(args).context("compile")?;
        }
        sitemigrate::cli::Command::Migrate(args) => {
            sitemigrate::migrate::run(args).context("migrate")?;
        }
        sitemigrate::cli::Command::Previews(args) => {
            sitemigrate::previews::run(args).context("previews")?;
        }
    }

    Ok(())
}

use std::path::Path;

use anyhow::Context as _;

use crate::cli::{BuildArgs, CompileArgs, CrawlArgs, MigrateArgs, PreviewsArgs};

pub async fn run(args: BuildArgs) -> anyhow::Result<()> {
    tracing::info!(site = %args.site, content = %args.content_dir, "build: crawl");
    crate::crawl::run(CrawlArgs {
        site: args.site.clone(),
        content_dir: args.content_dir.clone(),
        concurrency: args.concurrency,
        force: args.force,
    })
    .await
    .context("crawl")?;

    tracing::info!("build: compile");
    crate::compile::run(CompileArgs {
        content_dir: args.content_dir.clone(),
        public_dir: args.public_dir.clone(),
    })
    .context("compile")?;

    tracing::info!(archive = %args.archive_root, "build: migrate");
    crate::migrate::run(MigrateArgs {
        content_dir: args.content_dir.clone(),
        public_dir: args.public_dir.clone(),
        archive_root: args.archive_root.clone(),
    })
    .context("migrate")?;

    if !Path::new(&args.catalog).is_file() {
        tracing::info!(catalog = %args.catalog, "build: no look catalog; previews skipped");
        return Ok(());
    }
    tracing::info!(catalog = %args.catalog, "build: previews");
    crate::previews::run(PreviewsArgs {
        content_dir: args.content_dir.clone(),
        catalog: args.catalog.clone(),
    })
    .context("previews")?;

    Ok(())
}

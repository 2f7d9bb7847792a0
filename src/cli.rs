use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run crawl, compile, migrate and previews in sequence.
    Build(BuildArgs),
    Crawl(CrawlArgs),
    Compile(CompileArgs),
    Migrate(MigrateArgs),
    Previews(PreviewsArgs),
}

#[derive(Debug, Args)]
pub struct CrawlArgs {
    /// Root URL of the live WordPress site (must be http/https).
    #[arg(long)]
    pub site: String,

    /// Content directory; fragments and the manifest land in `<dir>/wp`.
    #[arg(long, default_value = "content")]
    pub content_dir: String,

    /// Maximum concurrent page fetches.
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,

    /// Replace an existing `<content-dir>/wp` snapshot.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct CompileArgs {
    /// Content directory holding the `wp` snapshot (created by `crawl`).
    #[arg(long, default_value = "content")]
    pub content_dir: String,

    /// Public directory; `inline.css` is written to `<dir>/marketing`.
    #[arg(long, default_value = "public")]
    pub public_dir: String,
}

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Content directory holding `marketing/pages.json` (created by `compile`).
    #[arg(long, default_value = "content")]
    pub content_dir: String,

    /// Public directory; primary source root and output tree for assets.
    #[arg(long, default_value = "public")]
    pub public_dir: String,

    /// Archived copy of the old site, searched when an asset is not in the public directory.
    #[arg(long, default_value = "Old Site Archive/files")]
    pub archive_root: String,
}

#[derive(Debug, Args)]
pub struct PreviewsArgs {
    /// Content directory holding `marketing/pages.json`.
    #[arg(long, default_value = "content")]
    pub content_dir: String,

    /// Look catalog JSON file to enrich with preview images.
    #[arg(long, default_value = "content/looks.json")]
    pub catalog: String,
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Root URL of the live WordPress site (must be http/https).
    #[arg(long)]
    pub site: String,

    #[arg(long, default_value = "content")]
    pub content_dir: String,

    #[arg(long, default_value = "public")]
    pub public_dir: String,

    #[arg(long, default_value = "Old Site Archive/files")]
    pub archive_root: String,

    /// Look catalog JSON file; the previews stage is skipped when it does not exist.
    #[arg(long, default_value = "content/looks.json")]
    pub catalog: String,

    /// Maximum concurrent page fetches.
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,

    /// Replace an existing `<content-dir>/wp` snapshot.
    #[arg(long)]
    pub force: bool,
}

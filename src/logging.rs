use anyhow::Context as _;

/// Stage progress at `info`; dependencies (reqwest, hyper) only at `warn`.
const DEFAULT_DIRECTIVES: &str = "warn,sitemigrate=info";

/// Installs the stderr subscriber. `RUST_LOG` replaces the default directives.
pub fn init() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(DEFAULT_DIRECTIVES))
        .context("build log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("install tracing subscriber: {err}"))?;

    Ok(())
}

//! Noteva Import - migrate a WordPress export into a Noteva blog

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use noteva_import::{
    config::Config,
    db,
    import::{MigrationOptions, Migrator, StdConsole},
    services::http::ReqwestHttpClient,
    wxr::ExportDocument,
};

#[derive(Parser)]
#[command(name = "noteva-import")]
#[command(about = "Import a WordPress WXR export into a Noteva blog")]
#[command(version)]
struct Cli {
    /// WordPress eXtended RSS file
    wxr_file: PathBuf,

    /// Slug of the destination blog page
    #[arg(long, default_value = "blog")]
    slug: String,

    /// Title of the destination blog page, used when it has to be created
    #[arg(long, default_value = "Blog")]
    title: String,

    /// Configuration file path
    #[arg(short, long, default_value = "config.yml")]
    config: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "noteva_import=info",
        1 => "noteva_import=debug",
        _ => "noteva_import=trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load_with_env(&cli.config)?;
    tracing::debug!("Configuration loaded from {:?}", cli.config);

    // The export is parsed first so nothing is written when its version is unknown
    let doc = ExportDocument::load(&cli.wxr_file)?;
    tracing::info!("Loaded WXR {} export from {:?}", doc.version(), cli.wxr_file);

    let pool = db::create_pool(&config.database).await?;
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database ready: {}", config.database.url);

    let http = ReqwestHttpClient::boxed(&config.import, config.upload.max_file_size)
        .context("Failed to build HTTP client")?;
    let migrator = Migrator::new(pool.clone(), &config, http);
    let options = MigrationOptions {
        blog_slug: cli.slug,
        blog_title: cli.title,
    };

    let result = migrator.run(&doc, &options, &mut StdConsole).await;
    pool.close().await;

    let stats = result?;
    if stats.failed > 0 {
        tracing::warn!("{} entries could not be imported", stats.failed);
    }
    Ok(())
}

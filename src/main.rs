//! Tululu crawler main entry point
//!
//! This is the command-line interface for the tululu.org catalog crawler.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use tululu_crawler::config::{load_config_with_hash, validate, Config};
use tululu_crawler::crawler::{run_crawl, CrawlParams};
use tululu_crawler::output::{
    catalog_file_path, print_statistics, render_catalog_file, render_gallery, Catalog,
    GalleryOptions,
};
use tracing_subscriber::EnvFilter;

/// Tululu crawler: downloads a book catalog
///
/// Walks the listing pages of a tululu.org catalog, downloads every book's
/// text and cover, writes a JSON catalog and renders a static HTML gallery.
#[derive(Parser, Debug)]
#[command(name = "tululu-crawler")]
#[command(version)]
#[command(about = "Downloads books and covers from a tululu.org catalog", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// First catalog page to crawl
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    start_page: u32,

    /// Last catalog page to crawl (defaults to the last page of the catalog)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    end_page: Option<u32>,

    /// Do not download cover images
    #[arg(long)]
    skip_imgs: bool,

    /// Do not download book texts
    #[arg(long)]
    skip_txt: bool,

    /// Where to write the JSON catalog: a file, or a directory that receives books.json
    #[arg(long, value_name = "PATH")]
    json_path: Option<PathBuf>,

    /// Folder that receives books/ and images/
    #[arg(long, value_name = "PATH")]
    dest_folder: Option<PathBuf>,

    /// Folder that receives the rendered gallery pages
    #[arg(long, value_name = "PATH")]
    pages_dir: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["render_only", "no_render"])]
    dry_run: bool,

    /// Render the gallery from an existing catalog file and exit
    #[arg(long, conflicts_with_all = ["dry_run", "no_render"])]
    render_only: bool,

    /// Crawl without rendering the gallery afterwards
    #[arg(long, conflicts_with_all = ["dry_run", "render_only"])]
    no_render: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load_effective_config(&cli)?;
    let params = CrawlParams::new(cli.start_page, cli.end_page, cli.skip_imgs, cli.skip_txt)
        .context("Invalid page range")?;

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config, &params);
    } else if cli.render_only {
        handle_render(&config)?;
    } else {
        let options = GalleryOptions::from_config(&config.output);
        let catalog = handle_crawl(config, params).await?;
        if !cli.no_render {
            let pages = render_gallery(&catalog, &options).context("Failed to render gallery")?;
            println!(
                "✓ Rendered {} gallery pages into {}",
                pages.len(),
                options.pages_dir.display()
            );
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tululu_crawler=info,warn"),
            1 => EnvFilter::new("tululu_crawler=debug,info"),
            2 => EnvFilter::new("tululu_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file (or defaults), applies path overrides, validates
fn load_effective_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(path) = &cli.json_path {
        config.output.json_path = path_string(&catalog_file_path(path));
    }
    if let Some(path) = &cli.dest_folder {
        config.output.dest_folder = path_string(path);
    }
    if let Some(path) = &cli.pages_dir {
        config.output.pages_dir = path_string(path);
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config, params: &CrawlParams) {
    println!("=== Tululu Crawler Dry Run ===\n");

    println!("Site:");
    println!("  Catalog: {}", config.site.catalog_url);
    match params.end_page {
        Some(end) => println!("  Pages: {} to {}", params.start_page, end),
        None => println!("  Pages: {} to last", params.start_page),
    }

    println!("\nCrawler:");
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    println!("  Retry backoff: {}ms", config.crawler.retry_backoff_ms);
    println!(
        "  Max connection retries: {}",
        config.crawler.max_connection_retries
    );
    println!("  Request timeout: {}ms", config.crawler.request_timeout_ms);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Content root: {}", config.output.dest_folder);
    println!("  Catalog: {}", config.output.json_path);
    println!("  Gallery: {}", config.output.pages_dir);
    println!("  Download texts: {}", !params.skip_text);
    println!("  Download covers: {}", !params.skip_images);

    println!("\n✓ Configuration is valid");
}

/// Handles gallery rendering from the catalog file
fn handle_render(config: &Config) -> anyhow::Result<()> {
    let catalog_path = Path::new(&config.output.json_path);
    let options = GalleryOptions::from_config(&config.output);

    let pages = render_catalog_file(catalog_path, &options)
        .with_context(|| format!("Failed to render {}", catalog_path.display()))?;

    println!(
        "✓ Rendered {} gallery pages into {}",
        pages.len(),
        options.pages_dir.display()
    );
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, params: CrawlParams) -> anyhow::Result<Catalog> {
    tracing::info!(
        "Starting crawl (texts: {}, covers: {})",
        !params.skip_text,
        !params.skip_images
    );

    match run_crawl(config, params).await {
        Ok(report) => {
            print_statistics(&report.stats);
            tracing::info!("Crawl completed successfully");
            Ok(report.catalog)
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

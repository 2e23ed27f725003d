//! Crawler coordinator - main crawl orchestration logic
//!
//! The run is a strict sequence against a single origin:
//! - Resolve the page range, bootstrapping the last page from the pagination
//!   control when no end page was given
//! - Collect book URLs from every listing page in the range
//! - Fetch, parse and download every book in collection order
//! - Hand back the catalog and run statistics
//!
//! Every page and book goes through the [`RetryGovernor`]; a permanent
//! failure skips that item, running out of connectivity retries halts the run.

use crate::config::Config;
use crate::crawler::book::parse_book;
use crate::crawler::catalog::{parse_last_page_number, parse_listing};
use crate::crawler::downloader::{url_basename, AssetDownloader, BOOKS_DIR, IMAGES_DIR};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::pacer::Pacer;
use crate::crawler::retry::{Outcome, RetryGovernor};
use crate::output::{write_catalog, BookRecord, Catalog, CrawlStats};
use crate::{Result, TululuError};
use std::path::PathBuf;
use url::Url;

/// Already-validated run parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlParams {
    /// First listing page, 1-based
    pub start_page: u32,

    /// Last listing page, inclusive; resolved from the site when absent
    pub end_page: Option<u32>,

    pub skip_images: bool,
    pub skip_text: bool,
}

impl CrawlParams {
    /// Creates run parameters, rejecting an empty or zero-based page range
    pub fn new(
        start_page: u32,
        end_page: Option<u32>,
        skip_images: bool,
        skip_text: bool,
    ) -> Result<Self> {
        let params = Self {
            start_page,
            end_page,
            skip_images,
            skip_text,
        };
        params.validate()?;
        Ok(params)
    }

    /// Checks that `1 <= start_page <= end_page`
    pub fn validate(&self) -> Result<()> {
        let invalid =
            self.start_page == 0 || self.end_page.is_some_and(|end| end < self.start_page);

        if invalid {
            return Err(TululuError::InvalidPageRange {
                start: self.start_page,
                end: self.end_page,
            });
        }

        Ok(())
    }
}

impl Default for CrawlParams {
    fn default() -> Self {
        Self {
            start_page: 1,
            end_page: None,
            skip_images: false,
            skip_text: false,
        }
    }
}

/// What a run produced
#[derive(Debug)]
pub struct CrawlReport {
    /// Books collected, in collection order
    pub catalog: Catalog,

    pub stats: CrawlStats,

    /// Set when connectivity loss stopped the run early
    pub halted: Option<TululuError>,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    params: CrawlParams,
    catalog_url: Url,
    fetcher: Fetcher,
    downloader: AssetDownloader,
    governor: RetryGovernor,
    pacer: Pacer,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `params` - Page range and download toggles
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run; no request has been made yet
    /// * `Err(TululuError)` - Invalid page range, catalog URL or HTTP client setup
    pub fn new(config: &Config, params: CrawlParams) -> Result<Self> {
        params.validate()?;

        let catalog_url = Url::parse(&config.site.catalog_url)?;
        let fetcher = Fetcher::new(config)?;
        let downloader = AssetDownloader::new(fetcher.clone(), &config.output.dest_folder);
        let governor = RetryGovernor::from_config(&config.crawler);
        let pacer = Pacer::from_config(&config.crawler);

        Ok(Self {
            params,
            catalog_url,
            fetcher,
            downloader,
            governor,
            pacer,
        })
    }

    /// URL of listing page `page`
    pub fn page_url(&self, page: u32) -> Result<Url> {
        Ok(self.catalog_url.join(&page.to_string())?)
    }

    /// Runs the crawl
    ///
    /// Returns `Err` only when the run cannot start: an invalid page range, or
    /// an unresolvable last page. Connectivity loss during the crawl is
    /// reported through [`CrawlReport::halted`] alongside the partial catalog.
    pub async fn run(&mut self) -> Result<CrawlReport> {
        self.params.validate()?;
        self.pacer.reset();

        let mut stats = CrawlStats::new();
        let mut catalog = Catalog::new();

        let end_page = match self.params.end_page {
            Some(end) => end,
            None => self.resolve_last_page().await?,
        };

        if end_page < self.params.start_page {
            return Err(TululuError::InvalidPageRange {
                start: self.params.start_page,
                end: Some(end_page),
            });
        }

        tracing::info!(
            "Crawling catalog pages {} to {} of {}",
            self.params.start_page,
            end_page,
            self.catalog_url
        );

        let book_urls = match self.collect_book_urls(end_page, &mut stats).await {
            Ok(urls) => urls,
            Err(halt) => {
                stats.halted = true;
                return Ok(CrawlReport {
                    catalog,
                    stats,
                    halted: Some(halt),
                });
            }
        };

        tracing::info!("Collected {} book URLs", book_urls.len());

        let total = book_urls.len();
        for (index, book_url) in book_urls.iter().enumerate() {
            self.pacer.pace().await;

            let label = format!("book {}", book_url);
            let this = &*self;
            match self
                .governor
                .run(&label, || this.process_book(book_url))
                .await
            {
                Outcome::Done(record) => {
                    tracing::info!(
                        "[{}/{}] {} :: {}",
                        index + 1,
                        total,
                        record.title,
                        record.author
                    );
                    stats.record_book_success();
                    catalog.push(record);
                }
                Outcome::Skipped(_) => {
                    stats.record_book_failure(book_url.as_str());
                }
                Outcome::Exhausted { attempts, last } => {
                    stats.record_book_failure(book_url.as_str());
                    stats.halted = true;
                    return Ok(CrawlReport {
                        catalog,
                        stats,
                        halted: Some(connection_lost(attempts, last)),
                    });
                }
            }
        }

        Ok(CrawlReport {
            catalog,
            stats,
            halted: None,
        })
    }

    /// Reads the last page number from the first listing page
    async fn resolve_last_page(&mut self) -> Result<u32> {
        let url = self.page_url(1)?;
        tracing::info!("No end page given, reading pagination from {}", url);

        self.pacer.pace().await;
        let fetcher = &self.fetcher;
        let page_url = &url;
        let outcome = self
            .governor
            .run("pagination", || async move {
                let html = fetcher.fetch_text(page_url, &[]).await?;
                Ok::<_, TululuError>(parse_last_page_number(&html)?)
            })
            .await;

        match outcome {
            Outcome::Done(last) => {
                tracing::info!("Catalog has {} pages", last);
                Ok(last)
            }
            Outcome::Skipped(_) => Err(TululuError::PageRangeUnresolved {
                url: url.to_string(),
            }),
            Outcome::Exhausted { attempts, last } => Err(connection_lost(attempts, last)),
        }
    }

    /// Fetches every listing page in range, skipping pages that fail
    ///
    /// Returns the halt error if connectivity retries run out.
    async fn collect_book_urls(
        &mut self,
        end_page: u32,
        stats: &mut CrawlStats,
    ) -> Result<Vec<Url>> {
        let mut book_urls = Vec::new();

        for page in self.params.start_page..=end_page {
            self.pacer.pace().await;

            let url = match self.page_url(page) {
                Ok(url) => url,
                Err(err) => {
                    tracing::warn!("Skipping page {}: {}", page, err);
                    stats.record_page_failure(page);
                    continue;
                }
            };

            let label = format!("page {}", page);
            let fetcher = &self.fetcher;
            let page_url = &url;
            let outcome = self
                .governor
                .run(&label, || async move {
                    let html = fetcher.fetch_text(page_url, &[]).await?;
                    Ok::<_, TululuError>(parse_listing(&html, page_url)?)
                })
                .await;

            match outcome {
                Outcome::Done(urls) => {
                    tracing::info!("Page {}: {} books", page, urls.len());
                    stats.record_page_success();
                    book_urls.extend(urls);
                }
                Outcome::Skipped(_) => stats.record_page_failure(page),
                Outcome::Exhausted { attempts, last } => {
                    stats.record_page_failure(page);
                    return Err(connection_lost(attempts, last));
                }
            }
        }

        Ok(book_urls)
    }

    /// Fetches one book page, downloads its assets and builds the record
    async fn process_book(&self, book_url: &Url) -> Result<BookRecord> {
        let html = self.fetcher.fetch_text(book_url, &[]).await?;
        let fields = parse_book(&html, book_url)?;

        let book_path = match &fields.download_url {
            Some(download_url) if !self.params.skip_text => {
                let filename = format!("{}.txt", fields.title);
                Some(
                    self.downloader
                        .store_text(download_url, BOOKS_DIR, &filename)
                        .await?,
                )
            }
            Some(_) => None,
            None => {
                tracing::debug!("{} has no text download", book_url);
                None
            }
        };

        let img_src = if self.params.skip_images {
            None
        } else {
            let filename = url_basename(&fields.image_url);
            Some(
                self.downloader
                    .store_image(&fields.image_url, IMAGES_DIR, &filename)
                    .await?,
            )
        };

        Ok(BookRecord {
            book_path,
            img_src,
            title: fields.title,
            author: fields.author,
            comments: fields.comments,
            genres: fields.genres,
            source_url: book_url.to_string(),
        })
    }
}

fn connection_lost(attempts: u32, last: TululuError) -> TululuError {
    TululuError::ConnectionLost {
        attempts,
        source: Box::new(last),
    }
}

/// Runs the main crawl operation
///
/// This function orchestrates the entire crawl process:
///
/// 1. Validate the page range before any request is made
/// 2. Crawl pages and books through the coordinator
/// 3. Write the catalog file, partial or not
/// 4. Return the report, or the connectivity error that halted the run
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `params` - Page range and download toggles
///
/// # Example
///
/// ```no_run
/// use tululu_crawler::config::Config;
/// use tululu_crawler::crawler::{run_crawl, CrawlParams};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let params = CrawlParams::new(1, Some(2), false, false)?;
/// let report = run_crawl(Config::default(), params).await?;
/// println!("{} books", report.catalog.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, params: CrawlParams) -> Result<CrawlReport> {
    let json_path = PathBuf::from(&config.output.json_path);
    let mut coordinator = Coordinator::new(&config, params)?;

    let mut report = coordinator.run().await?;
    report.stats.finish();

    write_catalog(&json_path, &report.catalog)?;

    if let Some(halt) = report.halted.take() {
        for line in report.stats.summary_lines() {
            tracing::warn!("{}", line);
        }
        tracing::error!("Connection problems. Please try again later");
        return Err(halt);
    }

    Ok(report)
}

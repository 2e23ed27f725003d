//! Run statistics
//!
//! Counts of pages and books attempted versus collected, plus the identifiers
//! of everything that was skipped, surfaced at the end of a crawl.

use chrono::{DateTime, Utc};

/// Progress and failure bookkeeping for a crawl run
#[derive(Debug, Clone)]
pub struct CrawlStats {
    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished (set by [`CrawlStats::finish`])
    pub finished_at: Option<DateTime<Utc>>,

    /// Listing pages requested
    pub pages_attempted: u32,

    /// Listing pages fetched and parsed
    pub pages_succeeded: u32,

    /// Page numbers that were skipped
    pub failed_pages: Vec<u32>,

    /// Book pages requested
    pub books_attempted: u32,

    /// Books added to the catalog
    pub books_succeeded: u32,

    /// Detail-page URLs of books that were skipped
    pub failed_books: Vec<String>,

    /// Whether connectivity loss stopped the run early
    pub halted: bool,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            pages_attempted: 0,
            pages_succeeded: 0,
            failed_pages: Vec::new(),
            books_attempted: 0,
            books_succeeded: 0,
            failed_books: Vec::new(),
            halted: false,
        }
    }

    pub fn record_page_success(&mut self) {
        self.pages_attempted += 1;
        self.pages_succeeded += 1;
    }

    pub fn record_page_failure(&mut self, page: u32) {
        self.pages_attempted += 1;
        self.failed_pages.push(page);
    }

    pub fn record_book_success(&mut self) {
        self.books_attempted += 1;
        self.books_succeeded += 1;
    }

    pub fn record_book_failure(&mut self, url: &str) {
        self.books_attempted += 1;
        self.failed_books.push(url.to_string());
    }

    /// Stamps the finish time
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Run duration in seconds, once finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// Books collected as a percentage of books attempted
    pub fn book_success_rate(&self) -> f64 {
        if self.books_attempted == 0 {
            return 0.0;
        }
        (self.books_succeeded as f64 / self.books_attempted as f64) * 100.0
    }

    /// One-line-per-fact human summary
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!(
                "{} of {} pages has been downloaded",
                self.pages_succeeded, self.pages_attempted
            ),
            format!(
                "{} of {} books has been downloaded ({:.1}%)",
                self.books_succeeded,
                self.books_attempted,
                self.book_success_rate()
            ),
        ];

        if !self.failed_pages.is_empty() {
            let pages: Vec<String> = self.failed_pages.iter().map(u32::to_string).collect();
            lines.push(format!("Failed pages: {}", pages.join(", ")));
        }

        if !self.failed_books.is_empty() {
            lines.push(format!("Failed books ({}):", self.failed_books.len()));
            for url in &self.failed_books {
                lines.push(format!("  - {}", url));
            }
        }

        if let Some(duration) = self.duration_seconds() {
            lines.push(format!("Duration: {} seconds", duration));
        }

        if self.halted {
            lines.push("Run halted early: connection problems. Please try again later".to_string());
        }

        lines
    }
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Prints statistics to stdout
pub fn print_statistics(stats: &CrawlStats) {
    println!("=== Crawl Statistics ===\n");
    for line in stats.summary_lines() {
        println!("{}", line);
    }
}

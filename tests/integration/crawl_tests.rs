//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small fake catalog and run the full
//! crawl cycle end-to-end against it, writing into temporary directories.

use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tululu_crawler::config::Config;
use tululu_crawler::crawler::{run_crawl, Coordinator, CrawlParams};
use tululu_crawler::output::{read_catalog, render_gallery, GalleryOptions};
use tululu_crawler::TululuError;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server, with short delays
fn create_test_config(server: &MockServer, root: &Path) -> Config {
    let mut config = Config::default();
    config.site.catalog_url = format!("{}/l55/", server.uri());
    config.crawler.request_delay_ms = 1;
    config.crawler.retry_backoff_ms = 10;
    config.crawler.max_connection_retries = 3;
    config.crawler.request_timeout_ms = 2000;
    config.crawler.connect_timeout_ms = 1000;
    config.output.dest_folder = root.join("media").to_string_lossy().into_owned();
    config.output.json_path = root
        .join("media")
        .join("books.json")
        .to_string_lossy()
        .into_owned();
    config.output.pages_dir = root.join("pages").to_string_lossy().into_owned();
    config
}

fn params(start: u32, end: Option<u32>) -> CrawlParams {
    CrawlParams::new(start, end, false, false).unwrap()
}

/// A listing page with one card per book id, plus a pagination control
fn listing_page(book_ids: &[u32], last_page: u32) -> String {
    let cards: String = book_ids
        .iter()
        .map(|id| {
            format!(
                r#"<table class="d_book"><tr><td>
                    <div class="bookimage"><a href="/b{id}/"><img src="/shots/{id}.jpg"></a></div>
                </td></tr></table>"#
            )
        })
        .collect();
    let pagination: String = (1..=last_page)
        .map(|n| format!(r#"<a class="npage" href="/l55/{n}/">{n}</a>"#))
        .collect();

    format!(
        r#"<html><body><div id="content">{cards}<p class="center">{pagination}</p></div></body></html>"#
    )
}

/// A book detail page; `with_text` controls whether a txt download is offered
fn book_page(id: u32, title: &str, author: &str, with_text: bool) -> String {
    let text_link = if with_text {
        format!(r#"<a href="/txt.php?id={id}">скачать txt</a>"#)
    } else {
        String::new()
    };

    format!(
        r#"<html><body><div id="content">
            <h1>{title} &nbsp; :: &nbsp; {author}</h1>
            <div class="bookimage"><a href="/read{id}/"><img src="/shots/{id}.jpg"></a></div>
            <table class="d_book"><tr><td>{text_link}</td></tr></table>
            <span class="d_book"><b>Жанр книги:</b> <a href="/l55/">Научная фантастика</a></span>
            <div class="texts"><b>Читатель</b><br><span class="black">Отзыв о книге {id}</span></div>
        </div></body></html>"#
    )
}

async fn mount_listing(server: &MockServer, page: u32, book_ids: &[u32], last_page: u32) {
    Mock::given(method("GET"))
        .and(path(format!("/l55/{}", page)))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(listing_page(book_ids, last_page)),
        )
        .mount(server)
        .await;
}

async fn mount_book(server: &MockServer, id: u32, title: &str, author: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/b{}/", id)))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(book_page(id, title, author, true)),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/txt.php"))
        .and(query_param("id", id.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/plain; charset=utf-8")
                .set_body_string(format!("Текст книги {}", title)),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/shots/{}.jpg", id)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xff, 0xd8, id as u8]))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_two_pages() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, dir.path());

    mount_listing(&server, 1, &[1, 2], 2).await;
    mount_listing(&server, 2, &[3], 2).await;
    mount_book(&server, 1, "Книга А", "Автор А").await;
    mount_book(&server, 2, "Книга Б", "Автор Б").await;
    mount_book(&server, 3, "Книга В", "Автор В").await;

    let report = run_crawl(config.clone(), params(1, Some(2))).await.unwrap();

    let titles: Vec<_> = report.catalog.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["Книга А", "Книга Б", "Книга В"]);
    assert_eq!(report.stats.pages_succeeded, 2);
    assert_eq!(report.stats.books_succeeded, 3);
    assert!(report.halted.is_none());

    let media = dir.path().join("media");
    for book in &report.catalog {
        assert!(!book.author.is_empty());
        let book_path = book.book_path.as_ref().expect("text should be stored");
        let img_src = book.img_src.as_ref().expect("cover should be stored");
        assert!(media.join(book_path).is_file());
        assert!(media.join(img_src).is_file());
    }

    assert_eq!(
        report.catalog[0].book_path.as_deref(),
        Some("books/Книга А.txt")
    );
    assert_eq!(report.catalog[0].img_src.as_deref(), Some("images/1.jpg"));
    assert_eq!(report.catalog[2].comments, vec!["Отзыв о книге 3"]);
    assert_eq!(report.catalog[2].genres, vec!["Научная фантастика"]);
    assert_eq!(
        std::fs::read_to_string(media.join("books/Книга Б.txt")).unwrap(),
        "Текст книги Книга Б"
    );

    // The catalog file matches what the run returned
    let stored = read_catalog(Path::new(&config.output.json_path)).unwrap();
    assert_eq!(stored.len(), 3);
    assert_eq!(stored[1].title, "Книга Б");
    assert_eq!(stored[1].author, "Автор Б");

    let raw = std::fs::read_to_string(&config.output.json_path).unwrap();
    assert!(raw.contains("\"title\": \"Книга А\""));
}

#[tokio::test]
async fn test_skip_text_keeps_images() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, dir.path());

    mount_listing(&server, 1, &[1, 2], 1).await;
    mount_book(&server, 1, "Первая", "Автор").await;
    mount_book(&server, 2, "Вторая", "Автор").await;

    Mock::given(method("GET"))
        .and(path("/txt.php"))
        .respond_with(ResponseTemplate::new(200))
        .with_priority(1)
        .expect(0)
        .mount(&server)
        .await;

    let params = CrawlParams::new(1, Some(1), false, true).unwrap();
    let report = run_crawl(config.clone(), params).await.unwrap();

    assert_eq!(report.catalog.len(), 2);
    for book in &report.catalog {
        assert!(book.book_path.is_none());
        assert!(book.img_src.is_some());
    }

    let raw = std::fs::read_to_string(&config.output.json_path).unwrap();
    assert!(!raw.contains("book_path"));
    assert!(raw.contains("img_src"));
    assert!(!dir.path().join("media").join("books").exists());
}

#[tokio::test]
async fn test_skip_images() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, dir.path());

    mount_listing(&server, 1, &[1], 1).await;
    mount_book(&server, 1, "Без обложки", "Автор").await;

    let params = CrawlParams::new(1, Some(1), true, false).unwrap();
    let report = run_crawl(config, params).await.unwrap();

    assert_eq!(report.catalog.len(), 1);
    assert!(report.catalog[0].img_src.is_none());
    assert!(report.catalog[0].book_path.is_some());
    assert!(!dir.path().join("media").join("images").exists());
}

#[tokio::test]
async fn test_book_without_text_download() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, dir.path());

    mount_listing(&server, 1, &[7], 1).await;
    Mock::given(method("GET"))
        .and(path("/b7/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(book_page(
            7,
            "Под копирайтом",
            "Автор",
            false,
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/shots/7.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
        .mount(&server)
        .await;

    let report = run_crawl(config, params(1, Some(1))).await.unwrap();

    assert_eq!(report.catalog.len(), 1);
    assert!(report.catalog[0].book_path.is_none());
    assert_eq!(report.catalog[0].img_src.as_deref(), Some("images/7.jpg"));
}

#[tokio::test]
async fn test_redirected_book_is_skipped() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, dir.path());

    mount_listing(&server, 1, &[1, 2, 3], 1).await;
    mount_book(&server, 1, "Есть", "Автор").await;
    mount_book(&server, 3, "Тоже есть", "Автор").await;

    // The site answers missing books with a redirect to its front page
    Mock::given(method("GET"))
        .and(path("/b2/"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/"))
        .expect(1)
        .mount(&server)
        .await;

    let report = run_crawl(config, params(1, Some(1))).await.unwrap();

    let titles: Vec<_> = report.catalog.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["Есть", "Тоже есть"]);
    assert_eq!(report.stats.books_attempted, 3);
    assert_eq!(report.stats.failed_books, vec![format!("{}/b2/", server.uri())]);
}

#[tokio::test]
async fn test_missing_text_skips_whole_book() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, dir.path());

    mount_listing(&server, 1, &[4], 1).await;
    Mock::given(method("GET"))
        .and(path("/b4/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(book_page(4, "Т", "А", true)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/txt.php"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/"))
        .mount(&server)
        .await;

    let report = run_crawl(config, params(1, Some(1))).await.unwrap();

    assert!(report.catalog.is_empty());
    assert_eq!(report.stats.failed_books.len(), 1);
}

#[tokio::test]
async fn test_failed_page_does_not_stop_run() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, dir.path());

    mount_listing(&server, 1, &[1], 3).await;
    mount_listing(&server, 3, &[3], 3).await;
    mount_book(&server, 1, "Один", "Автор").await;
    mount_book(&server, 3, "Три", "Автор").await;

    Mock::given(method("GET"))
        .and(path("/l55/2"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let report = run_crawl(config, params(1, Some(3))).await.unwrap();

    let titles: Vec<_> = report.catalog.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["Один", "Три"]);
    assert_eq!(report.stats.pages_attempted, 3);
    assert_eq!(report.stats.pages_succeeded, 2);
    assert_eq!(report.stats.failed_pages, vec![2]);
}

#[tokio::test]
async fn test_duplicate_books_are_kept() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, dir.path());

    mount_listing(&server, 1, &[1], 2).await;
    mount_listing(&server, 2, &[1], 2).await;
    mount_book(&server, 1, "Дважды", "Автор").await;

    let report = run_crawl(config, params(1, Some(2))).await.unwrap();

    assert_eq!(report.catalog.len(), 2);
    assert_eq!(report.catalog[0], report.catalog[1]);
}

#[tokio::test]
async fn test_end_before_start_is_rejected_without_requests() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, dir.path());

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert!(matches!(
        CrawlParams::new(3, Some(2), false, false),
        Err(TululuError::InvalidPageRange { .. })
    ));

    let params = CrawlParams {
        start_page: 3,
        end_page: Some(2),
        skip_images: false,
        skip_text: false,
    };
    let result = run_crawl(config.clone(), params).await;

    assert!(matches!(result, Err(TululuError::InvalidPageRange { .. })));
    assert!(!Path::new(&config.output.json_path).exists());
}

#[tokio::test]
async fn test_single_page_range() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, dir.path());

    mount_listing(&server, 2, &[5], 9).await;
    mount_book(&server, 5, "Пятая", "Автор").await;

    for other in [1, 3] {
        Mock::given(method("GET"))
            .and(path(format!("/l55/{}", other)))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
    }

    let report = run_crawl(config, params(2, Some(2))).await.unwrap();

    assert_eq!(report.stats.pages_attempted, 1);
    assert_eq!(report.catalog.len(), 1);
}

#[tokio::test]
async fn test_end_page_read_from_pagination() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, dir.path());

    // Page 1 is read once for the pagination and once for its books
    Mock::given(method("GET"))
        .and(path("/l55/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[1], 2)))
        .expect(2)
        .mount(&server)
        .await;
    mount_listing(&server, 2, &[2], 2).await;
    mount_book(&server, 1, "Первая", "Автор").await;
    mount_book(&server, 2, "Вторая", "Автор").await;

    let report = run_crawl(config, params(1, None)).await.unwrap();

    assert_eq!(report.stats.pages_attempted, 2);
    assert_eq!(report.catalog.len(), 2);
}

#[tokio::test]
async fn test_missing_pagination_fails_run() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, dir.path());

    Mock::given(method("GET"))
        .and(path("/l55/1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"<div id="content"></div>"#),
        )
        .mount(&server)
        .await;

    let mut coordinator = Coordinator::new(&config, params(1, None)).unwrap();
    let result = coordinator.run().await;

    assert!(matches!(result, Err(TululuError::PageRangeUnresolved { .. })));
}

#[tokio::test]
async fn test_connection_loss_halts_and_keeps_partial_catalog() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, dir.path());
    config.crawler.request_timeout_ms = 200;
    config.crawler.max_connection_retries = 2;

    mount_listing(&server, 1, &[1, 2, 3], 1).await;
    mount_book(&server, 1, "Успела", "Автор").await;
    mount_book(&server, 3, "Не дошли", "Автор").await;

    // Book 2 never answers in time
    Mock::given(method("GET"))
        .and(path("/b2/"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let result = run_crawl(config.clone(), params(1, Some(1))).await;

    match result {
        Err(TululuError::ConnectionLost { attempts, .. }) => assert_eq!(attempts, 2),
        other => panic!("expected connection loss, got {:?}", other.map(|r| r.catalog)),
    }

    // Book 3 is never attempted, book 1 is in the partial catalog
    let stored = read_catalog(Path::new(&config.output.json_path)).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].title, "Успела");
    assert!(!dir.path().join("media/images/3.jpg").exists());
}

#[tokio::test]
async fn test_crawl_then_render_gallery() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, dir.path());
    config.output.books_per_page = 2;

    mount_listing(&server, 1, &[1, 2, 3], 1).await;
    mount_book(&server, 1, "Раз", "Автор").await;
    mount_book(&server, 2, "Два", "Автор").await;
    mount_book(&server, 3, "Три & больше", "Автор").await;

    let report = run_crawl(config.clone(), params(1, Some(1))).await.unwrap();
    let pages = render_gallery(&report.catalog, &GalleryOptions::from_config(&config.output))
        .unwrap();

    assert_eq!(pages.len(), 2);
    let second = std::fs::read_to_string(dir.path().join("pages").join("index2.html")).unwrap();
    assert!(second.contains("Три &amp; больше"));
    assert!(second.contains("../media/images/3.jpg"));
}

#[tokio::test]
async fn test_unsupported_cover_scheme_skips_book() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, dir.path());

    mount_listing(&server, 1, &[1, 2], 1).await;
    mount_book(&server, 2, "Обычная", "Автор").await;

    // Book 1 embeds its cover inline, which cannot be downloaded
    let inline_cover = book_page(1, "Встроенная", "Автор", false)
        .replace("/shots/1.jpg", "data:image/gif;base64,R0lGOD");
    Mock::given(method("GET"))
        .and(path("/b1/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(inline_cover))
        .expect(1)
        .mount(&server)
        .await;

    let report = run_crawl(config, params(1, Some(1))).await.unwrap();

    assert!(report.halted.is_none());
    let titles: Vec<_> = report.catalog.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["Обычная"]);
    assert_eq!(report.stats.failed_books, vec![format!("{}/b1/", server.uri())]);
}

#[tokio::test]
async fn test_listing_without_content_is_skipped() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, dir.path());

    mount_listing(&server, 1, &[1], 3).await;
    mount_listing(&server, 3, &[3], 3).await;
    mount_book(&server, 1, "Один", "Автор").await;
    mount_book(&server, 3, "Три", "Автор").await;

    Mock::given(method("GET"))
        .and(path("/l55/2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><p>Технические работы</p></body></html>"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let report = run_crawl(config, params(1, Some(3))).await.unwrap();

    let titles: Vec<_> = report.catalog.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["Один", "Три"]);
    assert_eq!(report.stats.failed_pages, vec![2]);
}

#[tokio::test]
async fn test_malformed_heading_skips_book() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, dir.path());

    mount_listing(&server, 1, &[1, 2], 1).await;
    mount_book(&server, 2, "Правильная", "Автор").await;

    let no_delimiter = book_page(1, "Без", "разделителя", true).replace("&nbsp; :: &nbsp;", "/");
    Mock::given(method("GET"))
        .and(path("/b1/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(no_delimiter))
        .expect(1)
        .mount(&server)
        .await;

    let report = run_crawl(config, params(1, Some(1))).await.unwrap();

    let titles: Vec<_> = report.catalog.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["Правильная"]);
    assert_eq!(report.stats.books_attempted, 2);
    assert_eq!(report.stats.failed_books, vec![format!("{}/b1/", server.uri())]);
}

#[tokio::test]
async fn test_pacing_applies_after_failures() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, dir.path());
    config.crawler.request_delay_ms = 300;

    // Two failing pages, then a page with one book: four operations
    Mock::given(method("GET"))
        .and(path("/l55/1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/l55/2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;
    mount_listing(&server, 3, &[3], 3).await;
    mount_book(&server, 3, "Последняя", "Автор").await;

    let started = std::time::Instant::now();
    let report = run_crawl(config, params(1, Some(3))).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(report.stats.failed_pages, vec![1, 2]);
    assert_eq!(report.catalog.len(), 1);
    assert!(
        elapsed >= Duration::from_millis(3 * 300),
        "expected three pacing delays, took {:?}",
        elapsed
    );
}

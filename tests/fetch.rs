use govwatch::models::{Config, PageKind, TrackedPage};
use govwatch::services::{HttpFetcher, PageFetcher};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING: &str = r#"
    <html><body><ul>
      <li class="gem-c-document-list__item">
        <a class="gem-c-document-list__item-title" href="/government/publications/grid-report">Grid report</a>
        <p class="gem-c-document-list__item-description">Annual grid capacity report.</p>
        <time datetime="2025-07-01">1 July 2025</time>
      </li>
      <li class="gem-c-document-list__item">
        <a class="gem-c-document-list__item-title" href="/government/publications/heat-networks">Heat networks</a>
      </li>
    </ul></body></html>
"#;

const PUBLICATION: &str = r#"
    <html><body>
      <h1>Auction parameters</h1>
      <time>10 July 2025</time>
      <section class="attachment"><a href="/media/letter.pdf">Letter</a></section>
    </body></html>
"#;

fn tracked(name: &str, url: String, kind: PageKind) -> TrackedPage {
    TrackedPage {
        name: name.to_string(),
        display_name: None,
        url,
        kind,
        required: false,
        detect_renames: None,
        track_marker: None,
        tag: None,
    }
}

async fn serve(server: &MockServer, route: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(status).set_body_raw(body, "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn fetches_listing_page_items() {
    let server = MockServer::start().await;
    serve(&server, "/search/all", 200, LISTING).await;

    let fetcher = HttpFetcher::new(&Config::default()).expect("client");
    let page = tracked(
        "listing",
        format!("{}/search/all", server.uri()),
        PageKind::Listing,
    );

    let snapshot = fetcher.fetch_page(&page).await.expect("snapshot");

    assert_eq!(snapshot.len(), 2);
    assert_eq!(
        snapshot.items[0].url,
        format!("{}/government/publications/grid-report", server.uri())
    );
    assert_eq!(snapshot.items[0].title, "Grid report");
    assert_eq!(snapshot.items[0].display_date(), "1 July 2025");
    assert_eq!(snapshot.items[0].kind, "listing");
    assert!(snapshot.check_time.is_some());
    assert_eq!(snapshot.url.as_deref(), Some(page.url.as_str()));
}

#[tokio::test]
async fn fetches_attachment_page_marker() {
    let server = MockServer::start().await;
    serve(&server, "/government/publications/params", 200, PUBLICATION).await;

    let fetcher = HttpFetcher::new(&Config::default()).expect("client");
    let page = tracked(
        "specific_page",
        format!("{}/government/publications/params", server.uri()),
        PageKind::Attachments,
    );

    let snapshot = fetcher.fetch_page(&page).await.expect("snapshot");

    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.items[0].url, format!("{}/media/letter.pdf", server.uri()));
    assert_eq!(snapshot.marker(), "10 July 2025");
    assert_eq!(snapshot.display_title(), "Auction parameters");
}

#[tokio::test]
async fn http_error_yields_no_snapshot() {
    let server = MockServer::start().await;
    serve(&server, "/search/all", 500, "oops").await;

    let fetcher = HttpFetcher::new(&Config::default()).expect("client");
    let page = tracked(
        "listing",
        format!("{}/search/all", server.uri()),
        PageKind::Listing,
    );

    assert!(fetcher.fetch_page(&page).await.is_none());
    assert!(fetcher.try_fetch_page(&page).await.is_err());
}

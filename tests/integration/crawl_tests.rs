//! Integration tests for the harvester
//!
//! These tests use wiremock to serve a small category site and run the
//! real HTTP fetcher and HTML extractor end-to-end.

use canopy::config::{
    Config, ConsolidationConfig, CrawlerConfig, ExtractorConfig, LinkConfig, OutputConfig,
    ResolverConfig, UserAgentConfig,
};
use canopy::crawler::{Harvester, HtmlExtractor, HttpFetcher};
use canopy::output::{write_tree_json, TreeStatistics};
use canopy::{SessionStatus, TreeNode};
use std::collections::BTreeMap;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration rooted at `{base_url}/Device`
fn create_test_config(base_url: &str, state_dir: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_depth: 4,
            delay_min_ms: 0,
            delay_max_ms: 0,
            request_timeout_secs: 5,
            ..CrawlerConfig::default()
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            state_dir: state_dir.join("state").display().to_string(),
            tree_path: state_dir.join("tree.json").display().to_string(),
            summary_path: None,
        },
        resolver: ResolverConfig {
            root_url: format!("{}/Device", base_url),
            root_name: "Device".to_string(),
            category_base: None,
            join_char: '_',
            search_depth: 2,
            search_budget: 10,
            generic_suffixes: Vec::new(),
            aliases: BTreeMap::new(),
        },
        links: LinkConfig::default(),
        consolidation: ConsolidationConfig::default(),
        extractor: ExtractorConfig::default(),
    }
}

fn harvester(config: &Config) -> Harvester<HttpFetcher, HtmlExtractor> {
    let fetcher = HttpFetcher::new(&config.user_agent, &config.crawler).unwrap();
    let extractor = HtmlExtractor::new(&config.extractor).unwrap();
    Harvester::new(config, fetcher, extractor).unwrap()
}

fn category_page(title: &str, breadcrumb: &[&str], links: &[(&str, &str)]) -> String {
    let crumbs: String = breadcrumb
        .iter()
        .map(|label| format!(r##"<a href="#">{}</a>"##, label))
        .collect();
    let items: String = links
        .iter()
        .map(|(name, href)| format!(r#"<li><a href="{}">{}</a></li>"#, href, name))
        .collect();

    format!(
        r#"<html><head><title>{title}</title></head><body>
        <nav class="breadcrumb">{crumbs}</nav>
        <h1>{title}</h1>
        <ul class="category-list">{items}</ul>
        </body></html>"#
    )
}

fn leaf_page(title: &str, breadcrumb: &[&str], paragraphs: &[&str]) -> String {
    let crumbs: String = breadcrumb
        .iter()
        .map(|label| format!(r##"<a href="#">{}</a>"##, label))
        .collect();
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<p>{}</p>", p))
        .collect();

    format!(
        r#"<html><head><title>{title}</title></head><body>
        <nav class="breadcrumb">{crumbs}</nav>
        <h1>{title}</h1>
        <div class="item-content"><article>{body}</article></div>
        </body></html>"#
    )
}

async fn mount_page(server: &MockServer, page_path: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html; charset=utf-8"))
        .mount(server)
        .await;
}

async fn request_count(server: &MockServer, page_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == page_path)
        .count()
}

fn find<'t>(tree: &'t TreeNode, url: &str) -> &'t TreeNode {
    tree.find(url)
        .unwrap_or_else(|| panic!("{} missing from tree", url))
}

/// Root with a leaf, a failing child and a denied edit link
async fn mount_device_site(server: &MockServer) {
    mount_page(
        server,
        "/Device",
        category_page(
            "Device",
            &[],
            &[
                ("Phone", "/Device/Phone"),
                ("Laptop", "/Device/Laptop"),
                ("Edit", "/Device/Phone/edit"),
            ],
        ),
    )
    .await;

    mount_page(
        server,
        "/Device/Phone",
        leaf_page(
            "Phone",
            &["Device", "Phone"],
            &[
                "Buy now $9.99",
                "The fan may fail due to dust buildup.",
                "The fan may fail due to dust buildup and clogged vents.",
            ],
        ),
    )
    .await;
}

#[tokio::test]
async fn test_full_harvest_with_failure() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    mount_device_site(&server).await;
    Mock::given(method("GET"))
        .and(path("/Device/Laptop"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, dir.path());
    let harvester = harvester(&config);
    let root_url = format!("{}/Device", base_url);
    let phone_url = format!("{}/Device/Phone", base_url);
    let laptop_url = format!("{}/Device/Laptop", base_url);

    let harvest = harvester.harvest(&root_url).await;

    assert_eq!(harvest.state.status, SessionStatus::Completed);
    assert_eq!(harvest.tree.children.len(), 2);

    let phone = find(&harvest.tree, &phone_url);
    let content = phone.content.as_ref().expect("phone should be a leaf");
    assert_eq!(content.title.as_deref(), Some("Phone"));
    assert_eq!(
        content.section("content").unwrap().text,
        "The fan may fail due to dust buildup."
    );

    let laptop = find(&harvest.tree, &laptop_url);
    assert!(laptop.content.is_none());
    assert!(harvest.state.failed_urls.contains(&laptop_url));
    assert!(harvest
        .state
        .processed_urls
        .is_disjoint(&harvest.state.failed_urls));
    assert_eq!(request_count(&server, "/Device/Phone/edit").await, 0);

    // The checkpoint is on disk and the exported tree matches
    assert!(harvester.store().state_path(&root_url).exists());
    let tree_path = Path::new(&config.output.tree_path);
    write_tree_json(&harvest.tree, tree_path).unwrap();
    let written: TreeNode =
        serde_json::from_str(&std::fs::read_to_string(tree_path).unwrap()).unwrap();
    assert_eq!(written, harvest.tree);

    let stats = TreeStatistics::from_tree(&harvest.tree);
    assert_eq!(stats.nodes, 3);
    assert_eq!(stats.leaves, 1);
    assert_eq!(stats.max_depth, 1);
}

#[tokio::test]
async fn test_resume_and_explicit_retry() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    mount_device_site(&server).await;

    // The laptop page fails once, then recovers
    Mock::given(method("GET"))
        .and(path("/Device/Laptop"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/Device/Laptop",
        leaf_page("Laptop", &["Device", "Laptop"], &["Laptops overheat."]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, dir.path());
    let harvester = harvester(&config);
    let root_url = format!("{}/Device", base_url);
    let laptop_url = format!("{}/Device/Laptop", base_url);

    let first = harvester.harvest(&root_url).await;
    assert!(first.state.failed_urls.contains(&laptop_url));

    // Resuming neither refetches completed pages nor retries failures
    let second = harvester.harvest(&root_url).await;
    assert_eq!(second.tree, first.tree);
    assert_eq!(request_count(&server, "/Device").await, 1);
    assert_eq!(request_count(&server, "/Device/Phone").await, 1);
    assert_eq!(request_count(&server, "/Device/Laptop").await, 1);

    let mut state = harvester.store().load(&root_url);
    assert!(harvester
        .store()
        .clear_failed(&mut state, &laptop_url)
        .unwrap());

    let third = harvester.harvest(&root_url).await;
    assert_eq!(request_count(&server, "/Device/Laptop").await, 2);
    assert!(third.state.failed_urls.is_empty());
    assert_eq!(
        find(&third.tree, &laptop_url)
            .content
            .as_ref()
            .unwrap()
            .section("content")
            .unwrap()
            .text,
        "Laptops overheat."
    );
    assert_eq!(request_count(&server, "/Device").await, 1);
}

#[tokio::test]
async fn test_target_resolved_from_breadcrumb() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(
        &server,
        "/Device",
        category_page("Device", &[], &[("Phones", "/Device/Phone")]),
    )
    .await;
    mount_page(
        &server,
        "/Device/Phone",
        category_page(
            "Phone",
            &["Device", "Phone"],
            &[("Galaxy S", "/Device/Galaxy_S")],
        ),
    )
    .await;
    mount_page(
        &server,
        "/Device/Galaxy_S",
        category_page(
            "Galaxy S",
            &["Device", "Phone", "Galaxy S"],
            &[("Galaxy S Battery", "/Device/Galaxy_S_Battery")],
        ),
    )
    .await;
    mount_page(
        &server,
        "/Device/Galaxy_S_Battery",
        leaf_page(
            "Galaxy S Battery",
            &["Device", "Phone", "Galaxy S", "Galaxy S Battery"],
            &["Swap the battery."],
        ),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, dir.path());
    let harvester = harvester(&config);
    let target = format!("{}/Device/Galaxy_S", base_url);

    let trail = harvester.resolve_trail(&target).await;
    let trail_urls: Vec<String> = trail.iter().map(|c| c.url.clone()).collect();
    assert_eq!(
        trail_urls,
        vec![
            format!("{}/Device", base_url),
            format!("{}/Device/Phone", base_url),
            target.clone(),
        ]
    );

    let harvest = harvester.harvest(&target).await;

    assert_eq!(harvest.state.status, SessionStatus::Completed);
    assert_eq!(harvest.state.trail.len(), 3);
    let phone = &harvest.tree.children[0];
    assert_eq!(phone.url, format!("{}/Device/Phone", base_url));
    let galaxy = &phone.children[0];
    assert_eq!(galaxy.url, target);
    assert!(galaxy.content.is_none());
    assert!(galaxy.children[0].content.is_some());
    assert!(harvest.tree.is_acyclic());
}

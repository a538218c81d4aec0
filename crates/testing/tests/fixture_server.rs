//! Exercises `FixtureServer` against the sample `robots.txt`/sitemap HTML
//! fixtures end to end: start the server, fetch both routes over a real
//! `reqwest` round trip, and check the bodies round-trip unmodified.

use std::collections::HashMap;

use authscope_testing::html::{ROBOTS_TXT, SITEMAP_XML};
use authscope_testing::http_fixture::{FixtureResponse, FixtureServer};

#[tokio::test]
async fn serves_robots_and_sitemap_fixtures() {
    let mut routes = HashMap::new();
    routes.insert("/robots.txt", FixtureResponse::ok("text/plain", ROBOTS_TXT));
    routes.insert("/sitemap.xml", FixtureResponse::ok("application/xml", SITEMAP_XML));
    let server = FixtureServer::start(routes).await.unwrap();

    let client = reqwest::Client::new();

    let robots = client.get(format!("{}/robots.txt", server.base_url)).send().await.unwrap();
    assert_eq!(robots.status(), 200);
    assert_eq!(robots.text().await.unwrap(), ROBOTS_TXT);

    let sitemap = client.get(format!("{}/sitemap.xml", server.base_url)).send().await.unwrap();
    assert_eq!(sitemap.status(), 200);
    let body = sitemap.text().await.unwrap();
    assert!(body.contains("<loc>https://example.com/login</loc>"));
}

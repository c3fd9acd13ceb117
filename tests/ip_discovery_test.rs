// Integration tests for `IpDiscovery` using wiremock.

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doddns::ip_discovery::IpDiscovery;

async fn setup() -> (MockServer, IpDiscovery) {
    let server = MockServer::start().await;
    let discovery = IpDiscovery::new(
        &format!("{}/ip4", server.uri()),
        &format!("{}/ip6", server.uri()),
        Duration::from_secs(5),
    )
    .unwrap();
    (server, discovery)
}

#[tokio::test]
async fn test_discover_trims_both_addresses() {
    let (server, discovery) = setup().await;

    Mock::given(method("GET"))
        .and(path("/ip4"))
        .respond_with(ResponseTemplate::new(200).set_body_string("203.0.113.5\n"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ip6"))
        .respond_with(ResponseTemplate::new(200).set_body_string(" 2606:4700:4700::1111 \n"))
        .mount(&server)
        .await;

    let ips = discovery.discover().await.unwrap();
    assert_eq!(ips.ipv4, "203.0.113.5");
    assert_eq!(ips.ipv6.as_deref(), Some("2606:4700:4700::1111"));
}

#[tokio::test]
async fn test_ipv4_failure_is_fatal() {
    let (server, discovery) = setup().await;

    Mock::given(method("GET"))
        .and(path("/ip4"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = discovery.discover().await.unwrap_err();
    assert!(format!("{err:#}").contains("IPv4 discovery failed"));
}

#[tokio::test]
async fn test_ipv6_http_error_is_fatal() {
    let (server, discovery) = setup().await;

    Mock::given(method("GET"))
        .and(path("/ip6"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(discovery.ipv6().await.is_err());
}

#[tokio::test]
async fn test_garbage_body_is_rejected() {
    let (server, discovery) = setup().await;

    Mock::given(method("GET"))
        .and(path("/ip4"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>rate limited</html>"))
        .mount(&server)
        .await;

    assert!(discovery.ipv4().await.is_err());
}

//! Wire-level tests for the Vault client against a mock server.

use std::time::{Duration, Instant};

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use secret_courier::vault::{AuthDescriptor, VaultClient, VaultFetcher};
use secret_courier::{secrets::SecretFetcher, Error};

#[tokio::test]
async fn login_posts_the_kubernetes_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/kubernetes/login"))
        .and(body_json(json!({"jwt": "sa-jwt", "role": "sync-role"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"auth": {"client_token": "token"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = VaultClient::new(&server.uri(), None).unwrap();
    let auth =
        AuthDescriptor::from_parts("auth/kubernetes", "sync-role", "sa-jwt".into()).unwrap();

    let token = client.login(&auth).await.unwrap();
    assert_eq!(token, "token");
}

#[tokio::test]
async fn login_sends_the_configured_namespace() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/approle/login"))
        .and(header("X-Vault-Namespace", "team-a"))
        .and(body_json(json!({"role_id": "rid", "secret_id": "sid"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"auth": {"client_token": "token"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = VaultClient::new(&server.uri(), Some("team-a".to_string())).unwrap();
    let auth = AuthDescriptor::from_parts("auth/approle", "rid", "sid".into()).unwrap();

    client.login(&auth).await.unwrap();
}

#[tokio::test]
async fn login_failure_surfaces_the_errors_array() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/kubernetes/login"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"errors": ["permission denied"]})),
        )
        .mount(&server)
        .await;

    let client = VaultClient::new(&server.uri(), None).unwrap();
    let auth = AuthDescriptor::from_parts("auth/kubernetes", "r", "jwt".into()).unwrap();

    let err = client.login(&auth).await.unwrap_err();
    assert!(matches!(err, Error::Auth { .. }));
    assert!(err.to_string().contains("permission denied"));
}

#[tokio::test]
async fn login_without_a_token_in_the_response_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/kubernetes/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"auth": {}})))
        .mount(&server)
        .await;

    let client = VaultClient::new(&server.uri(), None).unwrap();
    let auth = AuthDescriptor::from_parts("auth/kubernetes", "r", "jwt".into()).unwrap();

    let err = client.login(&auth).await.unwrap_err();
    assert!(err.to_string().contains("no client token"));
}

#[tokio::test]
async fn read_secret_unwraps_the_kv_v2_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/sit-sre/service"))
        .and(header("X-Vault-Token", "token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"data": {"tls": "data"}}})),
        )
        .mount(&server)
        .await;

    let client = VaultClient::new(&server.uri(), None).unwrap();
    let pairs = client.read_secret("token", "secret/data/sit-sre/service").await.unwrap();

    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs["tls"], "data");
}

#[tokio::test]
async fn missing_secret_is_a_backend_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/sit-sre/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"errors": []})))
        .mount(&server)
        .await;

    let client = VaultClient::new(&server.uri(), None).unwrap();
    let err = client.read_secret("token", "secret/data/sit-sre/gone").await.unwrap_err();

    assert!(matches!(err, Error::Backend { .. }));
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn response_without_the_kv_envelope_is_a_backend_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/sit-sre/bare"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = VaultClient::new(&server.uri(), None).unwrap();
    let err = client.read_secret("token", "secret/data/sit-sre/bare").await.unwrap_err();

    assert!(matches!(err, Error::Backend { .. }));
    assert!(err.to_string().contains("no key/value data"));
}

#[tokio::test]
async fn null_secret_data_is_a_backend_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/sit-sre/hollow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"data": null}})))
        .mount(&server)
        .await;

    let client = VaultClient::new(&server.uri(), None).unwrap();
    let err = client.read_secret("token", "secret/data/sit-sre/hollow").await.unwrap_err();

    assert!(matches!(err, Error::Backend { .. }));
    assert!(err.to_string().contains("no key/value data"));
}

#[tokio::test]
async fn empty_secret_data_reads_as_an_empty_map() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/sit-sre/blank"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"data": {}}})))
        .mount(&server)
        .await;

    let client = VaultClient::new(&server.uri(), None).unwrap();
    let pairs = client.read_secret("token", "secret/data/sit-sre/blank").await.unwrap();

    assert!(pairs.is_empty());
}

#[tokio::test]
async fn fetcher_resolves_paths_under_the_root() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/sit-sre/service"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"data": {"k": "v"}}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = VaultClient::new(&server.uri(), None).unwrap();
    let fetcher = VaultFetcher::new(&client, "token", "secret/data/sit-sre");

    let pairs = fetcher.fetch("service").await.unwrap();
    assert_eq!(pairs["k"], "v");
}

#[tokio::test]
async fn ready_gate_waits_out_a_rate_limited_backend() {
    let server = MockServer::start().await;
    // First poll: standby node answering 429. Second poll: ready.
    Mock::given(method("GET"))
        .and(path("/v1/sys/health"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({"standby": true})))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/sys/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"initialized": true, "sealed": false})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = VaultClient::new(&server.uri(), None).unwrap();
    let started = Instant::now();
    client.wait_until_ready().await;

    // One full poll interval must have passed between the two calls.
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn revoke_posts_to_revoke_self() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/token/revoke-self"))
        .and(header("X-Vault-Token", "token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = VaultClient::new(&server.uri(), None).unwrap();
    client.revoke_token("token").await.unwrap();
}

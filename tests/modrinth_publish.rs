//! Modrinth publisher against a mock API

use mod_publisher::core::config::{ModrinthConfig, ReleaseConfig};
use mod_publisher::core::http::ApiClient;
use mod_publisher::core::types::LoaderType;
use mod_publisher::{ModrinthPublisher, PlatformPublisher, PublishError, PublishOutcome};
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn game_versions() -> serde_json::Value {
    json!([
        { "version": "1.20.2", "version_type": "release", "date": "2023-09-20T09:02:57Z", "major": false },
        { "version": "1.20.1", "version_type": "release", "date": "2023-06-12T13:25:51Z", "major": false },
        { "version": "23w31a", "version_type": "snapshot", "date": "2023-08-01T11:51:05Z", "major": false },
        { "version": "1.19.4", "version_type": "release", "date": "2023-03-14T12:56:18Z", "major": false }
    ])
}

fn jars(dir: &TempDir, names: &[&str]) -> Vec<PathBuf> {
    names
        .iter()
        .map(|name| {
            let file = dir.path().join(name);
            std::fs::write(&file, b"PK\x03\x04jar").unwrap();
            file
        })
        .collect()
}

fn release(files: Vec<PathBuf>) -> ReleaseConfig {
    ReleaseConfig {
        version: "1.2.0".to_string(),
        changelog: "Fixed things".to_string(),
        game_versions: vec!["1.20.1".to_string()],
        loaders: vec![LoaderType::Fabric, LoaderType::Quilt],
        files,
        ..Default::default()
    }
}

fn config() -> ModrinthConfig {
    let mut config = ModrinthConfig {
        token: Some("mr-token".to_string()),
        project_id: Some("AABBCCDD".to_string()),
        ..Default::default()
    };
    config.dependencies.required("P7dR8mSH");
    config
}

async fn mount_game_versions(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v2/tag/game_version"))
        .and(header("authorization", "mr-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(game_versions()))
        .mount(server)
        .await;
}

fn publisher(server: &MockServer, release: ReleaseConfig, config: ModrinthConfig) -> ModrinthPublisher {
    ModrinthPublisher::new(release, config, ApiClient::new().unwrap()).with_api_base(server.uri())
}

#[tokio::test]
async fn test_publish_uploads_metadata_and_files() {
    let server = MockServer::start().await;
    mount_game_versions(&server).await;
    Mock::given(method("POST"))
        .and(path("/v2/version"))
        .and(header("authorization", "mr-token"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id":"IIJJKKLL"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let files = jars(&dir, &["mod-1.2.0.jar", "mod-1.2.0-sources.jar"]);
    let outcome = publisher(&server, release(files), config()).publish().await.unwrap();

    assert_eq!(
        outcome,
        PublishOutcome::Published {
            response: Some(r#"{"id":"IIJJKKLL"}"#.to_string())
        }
    );

    let requests = server.received_requests().await.unwrap();
    let upload = requests
        .iter()
        .find(|request| request.url.path() == "/v2/version")
        .unwrap();
    let body = String::from_utf8_lossy(&upload.body);

    assert!(body.contains(r#"name="data""#));
    assert!(body.contains(r#"name="file""#));
    assert!(body.contains(r#"name="file_1""#));
    assert!(body.contains(r#"filename="mod-1.2.0.jar""#));
    assert!(body.contains(r#"filename="mod-1.2.0-sources.jar""#));
    assert!(body.contains(r#""game_versions":["1.20.1"]"#));
    assert!(body.contains(r#""loaders":["fabric","quilt"]"#));
    assert!(body.contains(r#""file_parts":["file","file_1"]"#));
    assert!(body.contains(r#""dependencies":[{"project_id":"P7dR8mSH","dependency_type":"required"}]"#));
}

#[tokio::test]
async fn test_no_matching_version_aborts_without_upload() {
    let server = MockServer::start().await;
    mount_game_versions(&server).await;
    Mock::given(method("POST"))
        .and(path("/v2/version"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut release = release(jars(&dir, &["mod.jar"]));
    release.game_versions = vec!["1.99".to_string()];

    let outcome = publisher(&server, release, config()).publish().await.unwrap();

    match outcome {
        PublishOutcome::Aborted { reasons } => {
            assert!(reasons[0].starts_with("No valid game versions found"));
        }
        other => panic!("expected abort, got {:?}", other),
    }
}

#[tokio::test]
async fn test_padded_game_version_still_matches() {
    let server = MockServer::start().await;
    mount_game_versions(&server).await;

    let dir = TempDir::new().unwrap();
    let mut release = release(jars(&dir, &["mod.jar"]));
    release.game_versions = vec![" 1.20.1 ".to_string()];

    let report = publisher(&server, release, config()).dry_run().await.unwrap();

    assert!(report.aborted.is_empty());
    assert_eq!(report.resolved_versions, vec!["1.20.1"]);
}

#[tokio::test]
async fn test_unknown_release_type_aborts_before_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(game_versions()))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut release = release(jars(&dir, &["mod.jar"]));
    release.release_type = "nightly".to_string();

    let publisher = publisher(&server, release, config());
    assert!(!publisher.validate().valid);

    match publisher.publish().await.unwrap() {
        PublishOutcome::Aborted { reasons } => {
            assert!(reasons.iter().any(|r| r.contains("nightly")));
        }
        other => panic!("expected abort, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_on_upload_is_raised() {
    let server = MockServer::start().await;
    mount_game_versions(&server).await;
    Mock::given(method("POST"))
        .and(path("/v2/version"))
        .respond_with(ResponseTemplate::new(500).set_body_string("server error"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let err = publisher(&server, release(jars(&dir, &["mod.jar"])), config())
        .publish()
        .await
        .unwrap_err();

    assert!(matches!(err, PublishError::Upload { .. }));
    assert_eq!(err.status(), Some(500));
    let message = err.to_string();
    assert!(message.contains("500"));
    assert!(message.contains("Internal Server Error"));
    assert!(message.contains("server error"));
}

#[tokio::test]
async fn test_malformed_version_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/tag/game_version"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let err = publisher(&server, release(jars(&dir, &["mod.jar"])), config())
        .publish()
        .await
        .unwrap_err();

    assert_eq!(err.code(), "MALFORMED_RESPONSE");
}

#[tokio::test]
async fn test_timeout_is_a_fetch_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/tag/game_version"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(game_versions())
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = ApiClient::with_timeout(Duration::from_millis(200)).unwrap();
    let publisher = ModrinthPublisher::new(release(jars(&dir, &["mod.jar"])), config(), client)
        .with_api_base(server.uri());

    let err = publisher.publish().await.unwrap_err();

    assert!(matches!(err, PublishError::FetchVersions { status: None, .. }));
    assert!(err.to_string().contains("timed out"));
}

#[tokio::test]
async fn test_dry_run_does_not_upload() {
    let server = MockServer::start().await;
    mount_game_versions(&server).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let files = jars(&dir, &["mod.jar"]);
    let report = publisher(&server, release(files.clone()), config())
        .dry_run()
        .await
        .unwrap();

    assert_eq!(report.resolved_versions, vec!["1.20.1"]);
    assert_eq!(report.files, files);
    assert!(report.aborted.is_empty());
    assert!(report.metadata.unwrap().contains(r#""version_number":"1.2.0""#));
}

mod common;

use common::RecordingDisplay;
use httpmock::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use triad_loader::config::toml_config::{DiagnosticsConfig, ResourcesConfig, RuntimeConfig};
use triad_loader::{LoaderConfig, LoaderEngine, SessionState};

const CODE: &str = "var deus = function (config) {};";
const DATA: &[u8] = b"PAK\x01\x02\x03\x04\x05\x06\x07";
const MODULE: &[u8] = b"\0asm\x01\0\0\0";

fn total_size() -> u64 {
    (CODE.len() + DATA.len() + MODULE.len()) as u64
}

fn config_for(server: &MockServer, output: &TempDir) -> LoaderConfig {
    let mut config = LoaderConfig::new(ResourcesConfig {
        js: server.url("/deus.js"),
        data: server.url("/deus.data"),
        wasm: server.url("/deus.wasm"),
        total_size: total_size(),
    });
    config.runtime = Some(RuntimeConfig {
        output_path: Some(output.path().to_str().unwrap().to_string()),
        ..RuntimeConfig::default()
    });
    config
}

#[tokio::test]
async fn test_end_to_end_handoff_and_staging() {
    let output = TempDir::new().unwrap();
    let server = MockServer::start();

    // js 先到，接著 wasm，最後 data
    let js = server.mock(|when, then| {
        when.method(GET).path("/deus.js");
        then.status(200).body(CODE);
    });
    let wasm = server.mock(|when, then| {
        when.method(GET).path("/deus.wasm");
        then.status(200).delay(Duration::from_millis(100)).body(MODULE);
    });
    let data = server.mock(|when, then| {
        when.method(GET).path("/deus.data");
        then.status(200).delay(Duration::from_millis(250)).body(DATA);
    });

    let display = Arc::new(RecordingDisplay::default());
    let engine = LoaderEngine::new(config_for(&server, &output)).with_display(display.clone());
    let outcome = engine.run().await.unwrap();

    js.assert();
    wasm.assert();
    data.assert();

    assert_eq!(outcome.report.state, SessionState::HandedOff);
    assert!(outcome.report.handed_off);
    assert_eq!(outcome.report.bytes_seen, total_size());
    assert_eq!(outcome.report.percent, 100.0);
    assert!(!display.any_error_state());
    assert!(display.errors.lock().is_empty());

    let statuses = display.statuses.lock().clone();
    assert_eq!(statuses.first().map(String::as_str), Some("loading ..."));
    assert!(statuses.iter().any(|s| s == "running ..."));
    assert!(statuses.iter().any(|s| s == "staged 3 files"));

    let manifest = outcome.manifest.expect("staging manifest");
    assert_eq!(manifest.files.len(), 3);
    assert_eq!(std::fs::read_to_string(output.path().join("runtime.js")).unwrap(), CODE);
    assert_eq!(std::fs::read(output.path().join("deus.data")).unwrap(), DATA);
    assert_eq!(std::fs::read(output.path().join("module.wasm")).unwrap(), MODULE);
    assert!(output.path().join("manifest.json").exists());
}

#[tokio::test]
async fn test_data_not_found_blocks_handoff() {
    let output = TempDir::new().unwrap();
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/deus.js");
        then.status(200).delay(Duration::from_millis(150)).body(CODE);
    });
    server.mock(|when, then| {
        when.method(GET).path("/deus.wasm");
        then.status(200).delay(Duration::from_millis(150)).body(MODULE);
    });
    server.mock(|when, then| {
        when.method(GET).path("/deus.data");
        then.status(404);
    });

    let display = Arc::new(RecordingDisplay::default());
    let engine = LoaderEngine::new(config_for(&server, &output)).with_display(display.clone());
    let outcome = engine.run().await.unwrap();

    assert_eq!(outcome.report.state, SessionState::Errored);
    assert!(!outcome.report.handed_off);
    assert!(outcome.manifest.is_none());

    let errors = display.errors.lock().clone();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, "404 Not Found");
    assert!(errors[0].1.contains("/deus.data"));
    assert_eq!(display.progress.lock().last(), Some(&(100.0, true)));
    assert!(!display.statuses.lock().iter().any(|s| s == "running ..."));
    assert!(!output.path().join("runtime.js").exists());
}

#[tokio::test]
async fn test_progress_is_monotonic_with_undersized_hint() {
    let output = TempDir::new().unwrap();
    let server = MockServer::start();

    for (path, body) in [
        ("/deus.js", CODE.as_bytes()),
        ("/deus.data", DATA),
        ("/deus.wasm", MODULE),
    ] {
        server.mock(|when, then| {
            when.method(GET).path(path);
            then.status(200).body(body);
        });
    }

    let mut config = config_for(&server, &output);
    config.resources.total_size = 8;

    let display = Arc::new(RecordingDisplay::default());
    let outcome = LoaderEngine::new(config)
        .with_display(display.clone())
        .run()
        .await
        .unwrap();

    let percents = display.percents();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    assert!(percents.iter().all(|p| (0.0..=100.0).contains(p)));
    assert_eq!(outcome.report.percent, 100.0);
    assert!(outcome.report.bytes_seen > 8);
    assert!(outcome.report.handed_off);
}

#[tokio::test]
async fn test_local_files_without_status() {
    let source = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    std::fs::write(source.path().join("deus.js"), CODE).unwrap();
    std::fs::write(source.path().join("deus.data"), DATA).unwrap();
    std::fs::write(source.path().join("deus.wasm"), MODULE).unwrap();

    let file_url = |name: &str| {
        url::Url::from_file_path(source.path().join(name))
            .unwrap()
            .to_string()
    };

    let mut config = LoaderConfig::new(ResourcesConfig {
        js: file_url("deus.js"),
        data: file_url("deus.data"),
        wasm: file_url("deus.wasm"),
        total_size: total_size(),
    });
    config.runtime = Some(RuntimeConfig {
        output_path: Some(output.path().to_str().unwrap().to_string()),
        data_file_name: Some("game.data".to_string()),
        ..RuntimeConfig::default()
    });

    let display = Arc::new(RecordingDisplay::default());
    let outcome = LoaderEngine::new(config)
        .with_display(display.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(outcome.report.state, SessionState::HandedOff);
    assert_eq!(std::fs::read(output.path().join("game.data")).unwrap(), DATA);
}

#[tokio::test]
async fn test_empty_local_file_is_failure() {
    let source = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    std::fs::write(source.path().join("deus.js"), CODE).unwrap();
    std::fs::write(source.path().join("deus.data"), b"").unwrap();
    std::fs::write(source.path().join("deus.wasm"), MODULE).unwrap();

    let file_url = |name: &str| {
        url::Url::from_file_path(source.path().join(name))
            .unwrap()
            .to_string()
    };

    let mut config = LoaderConfig::new(ResourcesConfig {
        js: file_url("deus.js"),
        data: file_url("deus.data"),
        wasm: file_url("deus.wasm"),
        total_size: total_size(),
    });
    config.runtime = Some(RuntimeConfig {
        output_path: Some(output.path().to_str().unwrap().to_string()),
        ..RuntimeConfig::default()
    });

    let display = Arc::new(RecordingDisplay::default());
    let outcome = LoaderEngine::new(config)
        .with_display(display.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(outcome.report.state, SessionState::Errored);
    assert_eq!(display.errors.lock()[0].0, "empty response");
}

#[tokio::test]
async fn test_suppressed_transport_failure_still_prevents_handoff() {
    let output = TempDir::new().unwrap();
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/deus.js");
        then.status(200).body(CODE);
    });
    server.mock(|when, then| {
        when.method(GET).path("/deus.data");
        then.status(503);
    });
    server.mock(|when, then| {
        when.method(GET).path("/deus.wasm");
        then.status(200).body(MODULE);
    });

    let mut config = config_for(&server, &output);
    config.diagnostics = Some(DiagnosticsConfig {
        benign_patterns: Some(vec!["^503".to_string()]),
        fallback_patterns: None,
    });

    let display = Arc::new(RecordingDisplay::default());
    let outcome = LoaderEngine::new(config)
        .with_display(display.clone())
        .run()
        .await
        .unwrap();

    assert!(display.errors.lock().is_empty());
    assert!(!display.any_error_state());
    assert!(!outcome.report.handed_off);
    assert_eq!(outcome.report.state, SessionState::Errored);
}

#![allow(unused_crate_dependencies)]

mod common;

use cli::{AddRequest, FocusAction};
use common::client_at;
use schema::AttentionFilter;

fn request(module: &str, title: &str) -> AddRequest {
    AddRequest {
        module: module.to_string(),
        title: title.to_string(),
        ..AddRequest::default()
    }
}

#[tokio::test]
async fn test_state_persists_between_invocations_sqlite() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("attention.db");

    {
        let client = client_at(&path, false).await;
        let out = client
            .add(AddRequest {
                id: Some("msg-1".into()),
                ..request("messages", "Hello")
            })
            .await
            .unwrap();
        assert!(out.starts_with("✓ Added msg-1 [attention]"));
        assert!(out.contains("(new bundle)"));
    }

    let client = client_at(&path, false).await;
    let counts = client.counts(false).unwrap();
    assert!(counts.contains("attention: 1"));
    assert!(counts.ends_with("total: 1"));

    let out = client.dismiss("msg-1").await.unwrap();
    assert_eq!(out, "✓ Dismissed item msg-1");
    assert_eq!(client.badge().unwrap(), "No badge");
}

#[tokio::test]
async fn test_json_state_file_and_output() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("state.json");

    let client = client_at(&path, true).await;
    client.add(request("planner", "Water plants")).await.unwrap();
    client.add(request("planner", "Buy soil")).await.unwrap();
    assert!(path.exists());

    let listed: serde_json::Value =
        serde_json::from_str(&client.list(&AttentionFilter::default()).unwrap()).unwrap();
    assert_eq!(listed[0]["title"], "2 Planner updates");
    assert_eq!(listed[0]["items"].as_array().unwrap().len(), 2);

    let badge: serde_json::Value = serde_json::from_str(&client.badge().unwrap()).unwrap();
    assert_eq!(badge["label"], "2");
    assert_eq!(badge["tier"], "fyi");
}

#[tokio::test]
async fn test_focus_commands_update_settings() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("state.json");

    {
        let client = client_at(&path, false).await;
        let out = client
            .focus(FocusAction::On {
                modules: vec!["planner".into()],
                block_urgent: false,
            })
            .await
            .unwrap();
        assert!(out.starts_with("Focus mode: on"));

        client
            .focus(FocusAction::Allow("calendar".into()))
            .await
            .unwrap();
        client.add(request("notes", "Hidden note")).await.unwrap();
        assert!(client.counts(false).unwrap().ends_with("total: 0"));
        assert!(client.counts(true).unwrap().ends_with("total: 1"));
    }

    let client = client_at(&path, false).await;
    let status = client.focus(FocusAction::Status).await.unwrap();
    assert!(status.contains("Allowed modules: calendar, planner"));

    let off = client.focus(FocusAction::Off).await.unwrap();
    assert!(off.starts_with("Focus mode: off"));
    assert!(client.counts(false).unwrap().ends_with("total: 1"));
}

#[tokio::test]
async fn test_invalid_input_reports_codes() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let client = client_at(&tmp.path().join("state.json"), false).await;

    let err = client
        .add(AddRequest {
            due: Some("whenever".into()),
            ..request("planner", "Bad due")
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), "ATTN001");

    let err = client.dismiss("missing").await.unwrap_err();
    assert_eq!(err.code(), "ATTN002");

    let err = client
        .add(AddRequest {
            meta: vec!["broken".into()],
            ..request("planner", "Bad meta")
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), "CLI002");

    assert_eq!(
        client.list(&AttentionFilter::default()).unwrap(),
        "Nothing needs your attention"
    );
}

#[tokio::test]
async fn test_config_file_is_applied() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config = tmp.path().join("beacon.toml");
    std::fs::write(&config, "maxBundleSize = 1\n").unwrap();

    let options = cli::EngineOptions {
        state: Some(tmp.path().join("state.json")),
        config: Some(config),
        notify: false,
    };
    let client = cli::Client::new(cli::open_engine(&options).await.unwrap(), false);
    client.add(request("budget", "One")).await.unwrap();
    let out = client.add(request("budget", "Two")).await.unwrap();
    assert!(out.contains("(new bundle)"));
}

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use watcher::{
    RetryError, RpcClient, RpcConfig, StatusRenderer, TrackedAccounts, Watcher, WatcherConfig,
    WatcherState,
};

use common::{Reply, fixture_error, spawn_stub};

fn watcher_for(url: String) -> Watcher<RpcClient> {
    let client = RpcClient::new(&RpcConfig {
        endpoint: url,
        timeout: Duration::from_secs(5),
    })
    .expect("client");

    let config = WatcherConfig {
        refresh_rate: Duration::from_millis(50),
        retry_delay: Duration::from_millis(5),
        tracked_accounts: TrackedAccounts::new(["kiln.pool.f863973.m0"]),
        colored: false,
        ..WatcherConfig::default()
    };

    Watcher::with_registry(client, config)
        .expect("watcher")
        .with_renderer(StatusRenderer::new(Box::new(std::io::sink()), false))
}

#[tokio::test]
async fn one_cycle_publishes_the_full_metric_set() {
    let stub = spawn_stub().await;
    let watcher = watcher_for(stub.url());

    watcher
        .refresh(&CancellationToken::new())
        .await
        .expect("refresh");
    assert!(watcher.is_synced());

    let text = watcher.metrics().gather_text();
    let expect = [
        "near_validator_watcher_block_number 142259035",
        "near_validator_watcher_epoch_length 43200",
        "near_validator_watcher_epoch_start_height 142256359",
        "near_validator_watcher_protocol_version 63",
        "near_validator_watcher_sync_state 0",
        r#"near_validator_watcher_validator_rank{account_id="node2",epoch_start_height="142256359",public_key="ed25519:GkDv7nSMS3xcqA45cpMvFmfV1o4fRF6zYo1JRR6mNqg5",tracked="0"} 2"#,
        r#"near_validator_watcher_validator_rank{account_id="kiln.pool.f863973.m0",epoch_start_height="142256359",public_key="ed25519:Bq8fe1eUgDRexX2CYDMhMMQBiN13j8vTAVFyTNhEfh1W",tracked="1"} 4"#,
        r#"near_validator_watcher_prev_epoch_kickout{account_id="example1.pool.f863973.m0",epoch_start_height="142256359",reason="{\"NotEnoughBlocks\":{\"expected\":16,\"produced\":0}}",tracked="0"} 1"#,
    ];
    for line in expect {
        assert!(text.contains(line), "missing {line}\n{text}");
    }

    let rank_series = text
        .lines()
        .filter(|l| l.starts_with("near_validator_watcher_validator_rank{"))
        .count();
    assert_eq!(rank_series, 5);
}

#[tokio::test]
async fn error_envelope_exhausts_retries_and_keeps_metrics() {
    let stub = spawn_stub().await;
    let watcher = watcher_for(stub.url());
    let cancel = CancellationToken::new();

    watcher.refresh(&cancel).await.expect("first refresh");
    let before = watcher.metrics().gather_text();

    stub.state.set("validators", Reply::Error(fixture_error()));
    let calls_before = stub.state.hits_for("validators");

    let err = watcher.refresh(&cancel).await.expect_err("must fail");
    assert!(matches!(err, RetryError::Exhausted { attempts: 3, .. }));
    assert_eq!(stub.state.hits_for("validators") - calls_before, 3);

    assert_eq!(watcher.metrics().gather_text(), before);
}

#[tokio::test]
async fn syncing_node_is_not_ready() {
    let stub = spawn_stub().await;
    let mut status: serde_json::Value = serde_json::from_str(common::STATUS).unwrap();
    status["sync_info"]["syncing"] = json!(true);
    stub.state.set("status", Reply::Result(status));

    let watcher = watcher_for(stub.url());
    watcher
        .refresh(&CancellationToken::new())
        .await
        .expect("refresh");

    assert!(!watcher.is_synced());
    assert_eq!(watcher.metrics().watcher.sync_state.get(), 1.0);
}

#[tokio::test]
async fn loop_keeps_running_through_failures_until_cancelled() {
    let stub = spawn_stub().await;
    stub.state.set("validators", Reply::Error(fixture_error()));
    let watcher = Arc::new(watcher_for(stub.url()));
    let cancel = CancellationToken::new();

    let handle = tokio::spawn({
        let watcher = watcher.clone();
        let cancel = cancel.clone();
        async move { watcher.start(cancel).await }
    });

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(watcher.state(), WatcherState::Running);
    assert!(stub.state.hits_for("validators") > 3);

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("stops promptly")
        .expect("join")
        .expect("clean stop");
    assert_eq!(watcher.state(), WatcherState::Stopped);
}

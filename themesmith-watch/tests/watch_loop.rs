use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use themesmith_core::ThemeConfig;
use themesmith_sync::BuildContext;
use themesmith_watch::{watch_until, WatchOptions};
use tokio::sync::broadcast;

async fn wait_for(path: &Path, expected: &str, touch: impl Fn(usize)) -> bool {
    for attempt in 0..100 {
        if fs::read_to_string(path).map(|c| c == expected).unwrap_or(false) {
            return true;
        }
        if attempt % 10 == 0 {
            touch(attempt);
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    false
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn edit_in_source_is_mirrored_to_dist() {
    let root = TempDir::new().expect("root");
    fs::create_dir_all(root.path().join("src/layout")).expect("mkdir");

    let config = ThemeConfig::defaults(root.path());
    let ctx = Arc::new(BuildContext::new(&config, false).expect("ctx"));
    let options = WatchOptions {
        poll_interval: Some(Duration::from_millis(50)),
        debounce: Duration::from_millis(10),
    };

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = tokio::spawn(watch_until(ctx, options, shutdown_rx));

    let src = root.path().join("src/layout/theme.liquid");
    let dist = root.path().join("dist/layout/theme.liquid");
    let mirrored = wait_for(&dist, "layout v1", |_| {
        fs::write(&src, "layout v1").expect("write");
    })
    .await;

    shutdown_tx.send(()).expect("shutdown");
    handle.await.expect("join").expect("watch");
    assert!(mirrored, "dist/layout/theme.liquid was never written");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_trees_are_an_error() {
    let root = TempDir::new().expect("root");
    let config = ThemeConfig::defaults(root.path());
    let ctx = Arc::new(BuildContext::new(&config, false).expect("ctx"));
    let (_tx, rx) = broadcast::channel(1);
    let options = WatchOptions {
        poll_interval: None,
        debounce: Duration::from_millis(100),
    };
    let err = watch_until(ctx, options, rx).await.unwrap_err();
    assert!(err.to_string().contains("nothing to watch"));
}

fn start(
    root: &Path,
    store: Option<&str>,
    debounce: Duration,
) -> (
    broadcast::Sender<()>,
    tokio::task::JoinHandle<Result<(), themesmith_watch::WatchError>>,
) {
    let mut config = ThemeConfig::defaults(root);
    config.store = store.map(themesmith_core::StoreName::from);
    let ctx = Arc::new(BuildContext::new(&config, false).expect("ctx"));
    let options = WatchOptions {
        poll_interval: Some(Duration::from_millis(50)),
        debounce,
    };
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    (shutdown_tx, tokio::spawn(watch_until(ctx, options, shutdown_rx)))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rapid_successive_edits_settle_on_the_last_one() {
    let root = TempDir::new().expect("root");
    let src = root.path().join("src/snippets/card.liquid");
    fs::create_dir_all(src.parent().expect("parent")).expect("mkdir");
    let (shutdown_tx, handle) = start(root.path(), None, Duration::from_millis(200));
    tokio::time::sleep(Duration::from_millis(200)).await;

    fs::write(&src, "card v1").expect("write");
    tokio::time::sleep(Duration::from_millis(30)).await;
    fs::write(&src, "card v2").expect("write");
    tokio::time::sleep(Duration::from_millis(30)).await;
    fs::write(&src, "card final").expect("write");

    let dist = root.path().join("dist/snippets/card.liquid");
    let settled = wait_for(&dist, "card final", |attempt| {
        if attempt > 0 {
            fs::write(&src, "card final").expect("write");
        }
    })
    .await;
    // Nothing stale may land after the final content.
    tokio::time::sleep(Duration::from_millis(400)).await;
    let last = fs::read_to_string(&dist).unwrap_or_default();

    shutdown_tx.send(()).expect("shutdown");
    handle.await.expect("join").expect("watch");
    assert!(settled, "dist/snippets/card.liquid never reached the last edit");
    assert_eq!(last, "card final");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn store_override_wins_over_concurrent_source_edit() {
    let root = TempDir::new().expect("root");
    let src = root.path().join("src/templates/index.json");
    let store = root.path().join("stores/uk/templates/index.json");
    fs::create_dir_all(src.parent().expect("parent")).expect("mkdir");
    fs::create_dir_all(store.parent().expect("parent")).expect("mkdir");
    fs::write(&src, "generic v0").expect("write");
    fs::write(&store, "uk v0").expect("write");
    let (shutdown_tx, handle) = start(root.path(), Some("uk"), Duration::from_millis(20));
    tokio::time::sleep(Duration::from_millis(200)).await;

    fs::write(&store, "uk v1").expect("write");
    fs::write(&src, "generic v1").expect("write");

    let dist = root.path().join("dist/templates/index.json");
    let settled = wait_for(&dist, "uk v1", |attempt| {
        if attempt > 0 {
            fs::write(&src, "generic v1").expect("write");
        }
    })
    .await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    let last = fs::read_to_string(&dist).unwrap_or_default();

    shutdown_tx.send(()).expect("shutdown");
    handle.await.expect("join").expect("watch");
    assert!(settled, "dist/templates/index.json never picked up the override");
    assert_eq!(last, "uk v1");
}

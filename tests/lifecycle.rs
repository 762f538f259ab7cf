//! Lifecycle loop behaviour against real marker files, on paused time.

use std::time::Duration;

use sentinel_service::config::LifecycleConfig;
use sentinel_service::lifecycle::{FsMarkerStore, LoopState, ServiceLoop};
use tokio::time::{sleep, timeout, Instant};

mod common;

#[tokio::test(start_paused = true)]
async fn test_stop_marker_present_at_start() {
    let fx = common::MarkerFixture::new();
    fx.touch(fx.markers.stop());

    let started = Instant::now();
    let report = ServiceLoop::new(fx.markers.clone(), FsMarkerStore, LifecycleConfig::default())
        .run()
        .await;

    assert_eq!(report.state, LoopState::Stopped);
    assert!(report.iterations >= 3);
    assert!(started.elapsed() <= Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn test_stop_marker_created_while_running() {
    let fx = common::MarkerFixture::new();
    let config = LifecycleConfig::default();
    let check_interval = config.check_interval();
    let mut service = ServiceLoop::new(fx.markers.clone(), FsMarkerStore, config);

    let requester = async {
        sleep(Duration::from_millis(4_500)).await;
        fx.touch(fx.markers.stop());
        Instant::now()
    };

    let (report, requested_at) = tokio::join!(service.run(), requester);

    assert_eq!(report.state, LoopState::Stopped);
    assert!(Instant::now() - requested_at <= check_interval);
    // Only reload markers are consumed by the loop.
    assert!(fx.markers.stop().exists());
}

#[tokio::test(start_paused = true)]
async fn test_reload_marker_is_consumed_and_loop_continues() {
    let fx = common::MarkerFixture::new();
    fx.touch(fx.markers.reload());
    let mut service = ServiceLoop::new(fx.markers.clone(), FsMarkerStore, LifecycleConfig::default());

    let first = timeout(Duration::from_millis(3_500), service.run()).await;
    assert!(first.is_err());
    assert!(!fx.markers.reload().exists());
    assert_eq!(service.report().reloads, 1);

    let later = timeout(Duration::from_secs(30), service.run()).await;
    assert!(later.is_err());
    assert_eq!(service.report().state, LoopState::Running);
    assert_eq!(service.report().reloads, 1);
}

#[tokio::test(start_paused = true)]
async fn test_reload_marker_created_while_running() {
    let fx = common::MarkerFixture::new();
    let config = LifecycleConfig::default();
    let check_interval = config.check_interval();
    let mut service = ServiceLoop::new(fx.markers.clone(), FsMarkerStore, config);

    let requester = async {
        sleep(Duration::from_millis(4_500)).await;
        fx.touch(fx.markers.reload());
        let requested_at = Instant::now();

        while fx.markers.reload().exists() {
            sleep(Duration::from_millis(100)).await;
        }
        Instant::now() - requested_at
    };

    let (result, consumed_after) =
        tokio::join!(timeout(Duration::from_millis(20_500), service.run()), requester);

    assert!(result.is_err());
    assert!(consumed_after <= check_interval);
    assert_eq!(service.report().reloads, 1);
    assert_eq!(service.report().state, LoopState::Running);
}

#[tokio::test(start_paused = true)]
async fn test_reload_applies_new_check_interval() {
    let fx = common::MarkerFixture::new();
    let config_path = fx.write_config("[lifecycle]\ncheck_interval_ms = 1000\n");
    fx.touch(fx.markers.reload());
    let mut service = ServiceLoop::new(fx.markers.clone(), FsMarkerStore, LifecycleConfig::default())
        .with_config_path(&config_path);

    let result = timeout(Duration::from_millis(6_500), service.run()).await;

    assert!(result.is_err());
    assert_eq!(service.config().check_interval(), Duration::from_secs(1));
    // One check at 3s on the old interval, then one per second.
    assert_eq!(service.report().checks, 4);
}

#[tokio::test(start_paused = true)]
async fn test_idle_without_markers() {
    let fx = common::MarkerFixture::new();
    let mut service = ServiceLoop::new(fx.markers.clone(), FsMarkerStore, LifecycleConfig::default());

    let result = timeout(Duration::from_secs(120), service.run()).await;

    assert!(result.is_err());
    assert_eq!(service.report().state, LoopState::Running);
    assert_eq!(service.report().reloads, 0);
    assert!(service.report().iterations >= 119);
}

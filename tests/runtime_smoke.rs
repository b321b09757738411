use std::sync::Arc;

use qsoscore::{
    config::Settings,
    core::log::QsoLog,
    engine::{lookup::NoLookup, registry::Registry},
    operation::Operation,
    qso::Qso,
    runtime::handle::{spawn_scoring, AnalyzeRequest, RuntimeConfig, RuntimeError, ScoringHandle},
    types::{Band, Mode},
};

fn spawn() -> ScoringHandle {
    spawn_scoring(
        Arc::new(Registry::with_builtins()),
        Arc::new(NoLookup),
        RuntimeConfig {
            debounce_ms: 20,
            queue_bound: 16,
        },
    )
}

fn log_of(n: u64) -> QsoLog {
    let mut log = QsoLog::new();
    for i in 0..n {
        log.append(Qso::contact(0, format!("K{i}AA"), Band::B20m, Mode::CW, Some(1_000 * (i + 1))));
    }
    log
}

#[tokio::test]
async fn analyze_and_resolve_round_trip() {
    let handle = spawn();
    let request = AnalyzeRequest::from_log(&log_of(3), Operation::default(), Settings::default());

    let analysis = handle.analyze(request).await.expect("analysis");
    assert_eq!(analysis.sections.len(), 1);
    assert_eq!(analysis.sections[0].count, 3);
    assert_eq!(analysis.sections[0].scores["defaultOperation"].qsos, 3);

    let resolved = handle
        .resolve_handlers(Operation::default(), Settings::default())
        .await
        .expect("resolve");
    assert_eq!(resolved.len(), 5);

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn burst_of_requests_shares_the_latest_snapshot() {
    let handle = spawn();
    let request =
        |n| AnalyzeRequest::from_log(&log_of(n), Operation::default(), Settings::default());

    let (a, b, c) = tokio::join!(
        handle.analyze(request(1)),
        handle.analyze(request(2)),
        handle.analyze(request(3)),
    );
    let (a, b, c) = (a.expect("a"), b.expect("b"), c.expect("c"));

    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&b, &c));
    assert_eq!(c.active_qsos.len(), 3);
}

#[tokio::test]
async fn commands_after_shutdown_fail() {
    let handle = spawn();
    handle.shutdown().await.expect("shutdown");

    let err = handle
        .analyze(AnalyzeRequest::default())
        .await
        .expect_err("closed");
    assert!(matches!(err, RuntimeError::ChannelClosed));
}

//! Prometheus metrics for the exchange core: HTTP traffic, order-matching
//! throughput, accrual claims, contest settlement, scheduler job runs, and
//! websocket fan-out.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";

    pub const ORDERS_SUBMITTED_TOTAL: &str = "orders_submitted_total";
    pub const ORDERS_CANCELLED_TOTAL: &str = "orders_cancelled_total";
    pub const TRADES_EXECUTED_TOTAL: &str = "trades_executed_total";

    pub const ACCRUAL_CLAIMED_SHARES_TOTAL: &str = "accrual_claimed_shares_total";
    pub const CONTEST_ENTRIES_TOTAL: &str = "contest_entries_total";
    pub const CONTEST_SETTLEMENTS_TOTAL: &str = "contest_settlements_total";

    pub const SCHEDULER_JOB_RUNS_TOTAL: &str = "scheduler_job_runs_total";
    pub const BOT_TICKS_TOTAL: &str = "bot_ticks_total";

    pub const WS_CONNECTIONS_ACTIVE: &str = "ws_connections_active";
}

pub mod labels {
    pub const METHOD: &str = "method";
    pub const ENDPOINT: &str = "endpoint";
    pub const STATUS: &str = "status";
    pub const SIDE: &str = "side";
    pub const JOB: &str = "job";
    pub const JOB_STATUS: &str = "job_status";
}

pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(names::HTTP_REQUEST_DURATION_SECONDS.to_string()),
            &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0],
        )
        .expect("static bucket config is valid")
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

pub fn record_http_request(method: &str, endpoint: &str, status: u16, duration_secs: f64) {
    let status_str = status.to_string();
    counter!(
        names::HTTP_REQUESTS_TOTAL,
        labels::METHOD => method.to_string(),
        labels::ENDPOINT => endpoint.to_string(),
        labels::STATUS => status_str.clone()
    )
    .increment(1);

    histogram!(
        names::HTTP_REQUEST_DURATION_SECONDS,
        labels::METHOD => method.to_string(),
        labels::ENDPOINT => endpoint.to_string(),
        labels::STATUS => status_str
    )
    .record(duration_secs);
}

pub fn record_order_submitted(side: &str) {
    counter!(names::ORDERS_SUBMITTED_TOTAL, labels::SIDE => side.to_string()).increment(1);
}

pub fn record_order_cancelled() {
    counter!(names::ORDERS_CANCELLED_TOTAL).increment(1);
}

pub fn record_trade_executed() {
    counter!(names::TRADES_EXECUTED_TOTAL).increment(1);
}

pub fn record_accrual_claimed(shares: i64) {
    counter!(names::ACCRUAL_CLAIMED_SHARES_TOTAL).increment(shares.max(0) as u64);
}

pub fn record_contest_entry() {
    counter!(names::CONTEST_ENTRIES_TOTAL).increment(1);
}

pub fn record_contest_settlement() {
    counter!(names::CONTEST_SETTLEMENTS_TOTAL).increment(1);
}

pub fn record_scheduler_job_run(job: &str, status: &str) {
    counter!(
        names::SCHEDULER_JOB_RUNS_TOTAL,
        labels::JOB => job.to_string(),
        labels::JOB_STATUS => status.to_string()
    )
    .increment(1);
}

pub fn record_bot_tick() {
    counter!(names::BOT_TICKS_TOTAL).increment(1);
}

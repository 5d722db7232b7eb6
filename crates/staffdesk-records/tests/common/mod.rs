//! Common helpers for staffdesk-records integration tests

#![allow(dead_code, unreachable_pub)]

use staffdesk_records::MockGateway;
use std::sync::Once;
use std::time::Duration;

static INIT_LOGGER: Once = Once::new();

/// Initialize test logging (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    });
}

/// Wait until the mock has received at least `count` requests
pub async fn wait_for_calls(gateway: &MockGateway, count: usize) {
    for _ in 0..400 {
        if gateway.calls().len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("mock gateway never received {count} calls");
}

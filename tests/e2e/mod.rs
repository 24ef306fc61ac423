use std::sync::Once;
use tracing_subscriber::{self, fmt::format::FmtSpan};

// E2E test configuration
mod offline_mark_all;

static INIT: Once = Once::new();

pub fn setup_test_env() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_span_events(FmtSpan::CLOSE)
            .with_test_writer()
            .compact()
            .try_init();

        dotenv::dotenv().ok();
    });
}

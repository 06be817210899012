use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = concat!(env!("CARGO_CRATE_NAME"), "=info");
const TEST_DIRECTIVE: &str = concat!(env!("CARGO_CRATE_NAME"), "=debug");

/// Installs a global fmt subscriber. `RUST_LOG` overrides the default
/// `castlink_session=info` filter. Calling it twice is harmless.
pub fn init_tracing() {
    install(DEFAULT_DIRECTIVE, false);
}

/// Same subscriber at debug level, writing through the test harness so
/// output is captured per test.
pub fn init_test_tracing() {
    install(TEST_DIRECTIVE, true);
}

fn install(default_directive: &str, test_writer: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_ids(true);
    let _ = if test_writer {
        builder.with_test_writer().try_init()
    } else {
        builder.try_init()
    };
}

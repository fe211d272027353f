use tracing::Level;
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt, Registry};

pub fn parse_level(log_level: &str) -> Level {
    match log_level {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    }
}

/// Installs the global subscriber. Our own crate logs at `log_level`,
/// request tracing from tower-http is kept at its usual verbosity.
pub fn init_tracing(log_level: &str) {
    let level = parse_level(log_level);

    let filter = filter::Targets::new()
        .with_target("tower_http::trace::on_response", Level::TRACE)
        .with_target("tower_http::trace::on_request", Level::TRACE)
        .with_target("tower_http::trace::make_span", Level::DEBUG)
        .with_target("axum::rejection", Level::TRACE)
        .with_target(env!("CARGO_PKG_NAME"), level)
        .with_default(Level::WARN);

    let tracing_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    // Tests may initialise more than once.
    let _ = Registry::default().with(tracing_layer).with(filter).try_init();
}

use std::io;

use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::environment::get_env_secret;

const DEFAULT_STDERR_FILTER: &str = "warn,llm_request=info,search_request=info,web_request=info";
const FILE_FILTER: &str = "info,pipeline=debug,llm_request=debug,search_request=debug,web_request=debug";

/// Installs the global subscriber.
///
/// Logs go to stderr so stdout carries only the generated content. `RUST_LOG` overrides the
/// stderr filter; setting `NEWSFORGE_LOG_DIR` adds a daily rolling file log in that directory.
pub fn configure_logging() {
    let stderr_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_STDERR_FILTER));

    let stderr_log = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_filter(stderr_filter);

    let file_log = get_env_secret("NEWSFORGE_LOG_DIR").map(|dir| {
        let file_appender = tracing_appender::rolling::daily(dir, "newsforge.log");
        fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender)
            .with_filter(EnvFilter::new(FILE_FILTER))
    });

    tracing_subscriber::Registry::default()
        .with(stderr_log)
        .with(file_log)
        .init();
}

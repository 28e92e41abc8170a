//! Diagnostics for the console itself.
//!
//! Everything goes to stderr so the menus on stdout stay readable.

use std::str::FromStr;

use tracing::metadata::LevelFilter;
use tracing_subscriber::{
    Layer, filter::FilterFn, fmt::time::ChronoUtc, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Environment variable holding the log level
pub const LEVEL_ENV: &str = "LOG_LEVEL";

const DEFAULT_LEVEL: LevelFilter = LevelFilter::WARN;

/// Event about the console itself rather than the queue it manages
#[macro_export]
macro_rules! internal {
    (level = $level:ident, $($msg:expr),*) => {
        $crate::tracing::event!(target: "postqctl::internal", $crate::tracing::Level::$level, $($msg),*)
    };

    ($($msg:expr),*) => {
        $crate::internal!(level = TRACE, $($msg),*)
    };
}

/// Level named by `raw`, or `warn` when it is absent or unrecognised
fn level_from(raw: Option<&str>) -> LevelFilter {
    let Some(raw) = raw else {
        return DEFAULT_LEVEL;
    };

    LevelFilter::from_str(raw).unwrap_or_else(|_| {
        eprintln!("Invalid {LEVEL_ENV} {raw:?}, defaulting to {DEFAULT_LEVEL}");
        DEFAULT_LEVEL
    })
}

pub fn init() {
    let level = level_from(std::env::var(LEVEL_ENV).ok().as_deref());

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .with_timer(ChronoUtc::rfc_3339())
        .with_filter(level)
        .with_filter(FilterFn::new(|metadata| {
            metadata.target().starts_with("postqctl")
        }));

    tracing_subscriber::Registry::default().with(layer).init();
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn level_defaults_to_warn() {
        assert_eq!(level_from(None), LevelFilter::WARN);
        assert_eq!(level_from(Some("chatty")), LevelFilter::WARN);
    }

    #[test]
    fn level_names_are_case_insensitive() {
        assert_eq!(level_from(Some("debug")), LevelFilter::DEBUG);
        assert_eq!(level_from(Some("TRACE")), LevelFilter::TRACE);
        assert_eq!(level_from(Some("off")), LevelFilter::OFF);
    }
}

use anyhow::Result;
use std::env::var;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

pub const LOG_FORMAT_ENV: &str = "TASKDESK_LOG_FORMAT";

/// `TASKDESK_LOG_FORMAT=json` switches to one JSON object per line.
fn json_requested() -> bool {
    var(LOG_FORMAT_ENV).is_ok_and(|format| format.trim().eq_ignore_ascii_case("json"))
}

/// Initialize logging. Logs go to stderr; stdout carries command output.
///
/// # Errors
///
/// Returns an error if the subscriber cannot be installed
pub fn init(verbosity_level: Option<Level>) -> Result<()> {
    let verbosity_level = verbosity_level.unwrap_or(Level::ERROR);

    // RUST_LOG=
    let filter = EnvFilter::builder()
        .with_default_directive(verbosity_level.into())
        .from_env_lossy()
        .add_directive("hyper=error".parse()?)
        .add_directive("hyper_util=error".parse()?)
        .add_directive("reqwest=warn".parse()?);

    if json_requested() {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(false);
        let subscriber = Registry::default().with(fmt_layer).with(filter);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_file(false)
            .with_line_number(false)
            .with_thread_ids(false)
            .with_target(false);
        let subscriber = Registry::default().with(fmt_layer).with(filter);
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_format_from_env() {
        temp_env::with_var(LOG_FORMAT_ENV, Some("JSON"), || assert!(json_requested()));
        temp_env::with_var(LOG_FORMAT_ENV, Some("pretty"), || assert!(!json_requested()));
        temp_env::with_var(LOG_FORMAT_ENV, None::<&str>, || assert!(!json_requested()));
    }
}

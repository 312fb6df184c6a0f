//! Logging support for the probe pipeline
//!
//! Every event carries a [`Code`] and optional `key=value` context. Events are
//! forwarded to the `log` facade, so the embedding binary decides where they go
//! (the scanner CLI installs `env_logger`).

pub mod codes;
#[macro_use]
pub mod macros;

pub use codes::Code;
pub use log::Level;

/// Log target shared by all probe events
pub const LOG_TARGET: &str = "hsi_scanner";

/// Render context pairs as ` key=value key=value`
pub fn format_context(context: &[(&str, String)]) -> String {
    let mut rendered = String::new();
    for (key, value) in context {
        rendered.push(' ');
        rendered.push_str(key);
        rendered.push('=');
        if value.contains(char::is_whitespace) || value.is_empty() {
            rendered.push_str(&format!("{:?}", value));
        } else {
            rendered.push_str(value);
        }
    }
    rendered
}

/// Emit one event (used by the logging macros)
pub fn emit(level: Level, code: Code, message: &str, context: &[(&str, String)]) {
    if !log::log_enabled!(target: LOG_TARGET, level) {
        return;
    }

    log::log!(
        target: LOG_TARGET,
        level,
        "[{}:{}] {}{}",
        code,
        code.category(),
        message,
        format_context(context)
    );
}

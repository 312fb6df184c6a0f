//! Code-tagged logging macros accepting Display values as context

/// Log error with Code type - accepts Display types for context values
#[macro_export]
macro_rules! log_error {
    ($code:expr, $message:expr) => {
        $crate::logging::emit($crate::logging::Level::Error, $code, $message, &[])
    };

    ($code:expr, $message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        $crate::logging::emit(
            $crate::logging::Level::Error,
            $code,
            $message,
            &[$(($key, format!("{}", $value))),+],
        )
    };
}

/// Log warning with Code type
#[macro_export]
macro_rules! log_warning {
    ($code:expr, $message:expr) => {
        $crate::logging::emit($crate::logging::Level::Warn, $code, $message, &[])
    };

    ($code:expr, $message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        $crate::logging::emit(
            $crate::logging::Level::Warn,
            $code,
            $message,
            &[$(($key, format!("{}", $value))),+],
        )
    };
}

/// Log informational message with Code type
#[macro_export]
macro_rules! log_info {
    ($code:expr, $message:expr) => {
        $crate::logging::emit($crate::logging::Level::Info, $code, $message, &[])
    };

    ($code:expr, $message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        $crate::logging::emit(
            $crate::logging::Level::Info,
            $code,
            $message,
            &[$(($key, format!("{}", $value))),+],
        )
    };
}

/// Log success - emitted at info level with a success code
#[macro_export]
macro_rules! log_success {
    ($code:expr, $message:expr) => {
        $crate::log_info!($code, $message)
    };

    ($code:expr, $message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        $crate::log_info!($code, $message, $($key => $value),+)
    };
}

/// Log debug message with Code type
#[macro_export]
macro_rules! log_debug {
    ($code:expr, $message:expr) => {
        $crate::logging::emit($crate::logging::Level::Debug, $code, $message, &[])
    };

    ($code:expr, $message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        $crate::logging::emit(
            $crate::logging::Level::Debug,
            $code,
            $message,
            &[$(($key, format!("{}", $value))),+],
        )
    };
}

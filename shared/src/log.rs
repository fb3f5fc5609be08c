//! Logging facade for the fixture scripts. The `deployments` and `typed-signer`
//! binaries log through `shared::log_*!` and only pull in `tracing-subscriber`
//! to install a subscriber.

// Paths go through `$crate::tracing`, re-exported from lib.rs.

/// Log at INFO level
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::tracing::info!($($arg)*);
    };
}

/// Log at DEBUG level
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::tracing::debug!($($arg)*);
    };
}

/// Log at WARN level
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::tracing::warn!($($arg)*);
    };
}

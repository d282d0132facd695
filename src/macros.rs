//! Logging shims.
//!
//! Forward to the `log` crate when the `logging` feature is enabled and
//! compile away otherwise, keeping the arguments type-checked either way.

macro_rules! engine_log {
    ($level:ident, $($arg:tt)+) => {{
        #[cfg(feature = "logging")]
        {
            log::$level!(target: "uci_interface", $($arg)+);
        }
        #[cfg(not(feature = "logging"))]
        {
            if false {
                let _ = format!($($arg)+);
            }
        }
    }};
}

macro_rules! engine_trace {
    ($($arg:tt)+) => { engine_log!(trace, $($arg)+) };
}

macro_rules! engine_debug {
    ($($arg:tt)+) => { engine_log!(debug, $($arg)+) };
}

macro_rules! engine_info {
    ($($arg:tt)+) => { engine_log!(info, $($arg)+) };
}

macro_rules! engine_warn {
    ($($arg:tt)+) => { engine_log!(warn, $($arg)+) };
}

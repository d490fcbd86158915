//! ---
//! pwrmon_section: "03-logging"
//! pwrmon_subsection: "module"
//! pwrmon_type: "source"
//! pwrmon_scope: "code"
//! pwrmon_description: "Structured logging context and convenience macros."
//! pwrmon_version: "v0.1.0"
//! pwrmon_owner: "tbd"
//! ---

/// Shared expansion for the leveled macros below.
#[doc(hidden)]
#[macro_export]
macro_rules! __pm_event {
    ($level:expr, $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            $level,
            channel = ctx.channel.unwrap_or(""),
            ticker = ctx.ticker.unwrap_or(""),
            tick = ctx.tick.unwrap_or_default(),
            view = ctx.view.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
}

/// Emit an informational log enriched with dashboard context.
#[macro_export]
macro_rules! pm_info {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__pm_event!(tracing::Level::INFO, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__pm_event!(tracing::Level::INFO, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a debug log enriched with dashboard context.
#[macro_export]
macro_rules! pm_debug {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__pm_event!(tracing::Level::DEBUG, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__pm_event!(tracing::Level::DEBUG, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a warning enriched with dashboard context.
#[macro_export]
macro_rules! pm_warn {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__pm_event!(tracing::Level::WARN, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__pm_event!(tracing::Level::WARN, $crate::LogContext::default(), $($arg)+)
    };
}

// Logging macros that attach a redacted excerpt of document text

/// `redacted_debug!(text, "message", args..)` logs at debug with a
/// `document` field holding a redacted, truncated excerpt of `text`.
#[macro_export]
macro_rules! redacted_debug {
    ($text:expr, $($arg:tt)+) => {
        $crate::tracing::debug!(
            document = %$crate::redact_snippet(&$text, $crate::SNIPPET_CHARS),
            $($arg)+
        )
    };
}

#[macro_export]
macro_rules! redacted_warn {
    ($text:expr, $($arg:tt)+) => {
        $crate::tracing::warn!(
            document = %$crate::redact_snippet(&$text, $crate::SNIPPET_CHARS),
            $($arg)+
        )
    };
}

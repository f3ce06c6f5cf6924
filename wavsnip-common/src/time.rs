//! Time value formatting
//!
//! Two renderings of fractional seconds are needed: a fixed two-decimal form
//! for UI display, and a canonical plain-number form for engine command
//! arguments (no trailing zeros, no scientific notation).

/// Format seconds for display: always two decimals with an `s` suffix.
///
/// # Examples
///
/// ```
/// use wavsnip_common::time::format_seconds;
///
/// assert_eq!(format_seconds(0.0), "0.00s");
/// assert_eq!(format_seconds(5.0), "5.00s");
/// assert_eq!(format_seconds(12.3), "12.30s");
/// ```
pub fn format_seconds(seconds: f64) -> String {
    format!("{:.2}s", seconds)
}

/// Render a number as a canonical engine command argument.
///
/// Whole values render without a decimal point, fractional values render with
/// up to six decimals and trailing zeros trimmed. Negative values keep their
/// sign (gain arguments may be negative).
///
/// # Examples
///
/// ```
/// use wavsnip_common::time::format_arg;
///
/// assert_eq!(format_arg(5.0), "5");
/// assert_eq!(format_arg(0.5), "0.5");
/// assert_eq!(format_arg(-3.0), "-3");
/// assert_eq!(format_arg(4.8), "4.8");
/// ```
pub fn format_arg(value: f64) -> String {
    if value == value.trunc() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let rendered = format!("{:.6}", value);
        rendered
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

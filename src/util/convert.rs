//! Safe numeric conversions with bounds checking.

/// Converts a `u64` to `u32`, panicking with `$context` if it overflows.
///
/// Used at points where an in-memory count (offset, length) is about to be
/// written as a fixed-width field in a persisted file.
///
/// # Examples
///
/// ```
/// use pgx_ann::checked_u32;
///
/// let value: u64 = 100;
/// let result = checked_u32!(value, "document ID");
/// assert_eq!(result, 100u32);
/// ```
#[macro_export]
macro_rules! checked_u32 {
    ($value:expr, $context:expr) => {{
        let v: u64 = $value;
        #[allow(clippy::checked_conversions)]
        {
            assert!(v <= u32::MAX as u64, "{} {} exceeds u32::MAX", $context, v);
            v as u32
        }
    }};
}

pub use checked_u32;

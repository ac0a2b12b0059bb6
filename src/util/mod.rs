//! Small helper functions and macros shared across modules.

pub mod checksum;
pub mod convert;

pub use checksum::crc32;
pub use convert::checked_u32;

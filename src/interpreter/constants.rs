// Constants for the interpreter

/// Starting address for heap allocations
pub const HEAP_ADDRESS_START: u64 = 0x1000_0000;

/// Distance between consecutive object addresses
pub const OBJECT_ALIGNMENT: u64 = 16;

/// Preallocated (shared) integer range
pub const SMALL_INT_MIN: i64 = -5;
pub const SMALL_INT_MAX: i64 = 256;

/// Upper bound on the length of a sequence built by repetition or collected
/// from an iterable, and on padding widths
pub const MAX_REPEAT_LEN: usize = 10_000_000;

/// Largest precision the float formatters accept
pub const MAX_FORMAT_PRECISION: usize = u16::MAX as usize;

/// Maximum number of live frames before `RecursionError`
pub const RECURSION_LIMIT: usize = 200;

/// Name of the library source unit loaded before the user program
pub const PRELUDE_NAME: &str = "<prelude>";

//! Tinct Core: numeric infrastructure for colour science.
//!
//! This crate holds the process-wide domain-range scale, the memoization
//! cache registry, array coercion and validation helpers, case-insensitive
//! name registries, and categorized warnings. No colour model math lives
//! here; conversion code builds on top of it.

pub mod array;
pub mod cache;
pub mod error;
pub mod mapping;
pub mod precision;
pub mod scale;
pub mod settings;
pub mod verbose;

// Re-exports for convenience.
pub use array::{ArrayLike, FloatArray, IntArray, Numeric, as_float, as_float_array, as_int, as_int_array, as_numeric};
pub use cache::{Cache, CachePolicy, CacheRegistry, Fingerprint};
pub use error::{TinctError, TinctResult};
pub use mapping::{CaseInsensitiveMapping, LazyCaseInsensitiveMapping, Lookup, validate_method};
pub use precision::{FloatPrecision, IntPrecision};
pub use scale::{BitDepth, Domain, ScaleMode, domain_range_scale, get_domain_range_scale, set_domain_range_scale};
pub use settings::NumericSettings;
pub use verbose::WarningCategory;

//! Process-wide numeric precision used by array coercion.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

use crate::cache::CacheRegistry;
use crate::error::TinctError;
use crate::mapping::validate_method;
use crate::verbose::usage_warning;

/// Floating point precision of coerced arrays. Default: [`FloatPrecision::F64`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FloatPrecision {
    /// 32-bit IEEE 754.
    F32,
    /// 64-bit IEEE 754.
    #[default]
    F64,
}

/// Integer precision of coerced arrays. Default: [`IntPrecision::I64`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IntPrecision {
    /// 32-bit signed.
    I32,
    /// 64-bit signed.
    #[default]
    I64,
}

impl FloatPrecision {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::F32 => "float32",
            Self::F64 => "float64",
        }
    }

    const fn to_u8(self) -> u8 {
        match self {
            Self::F32 => 0,
            Self::F64 => 1,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::F32,
            _ => Self::F64,
        }
    }
}

impl IntPrecision {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::I32 => "int32",
            Self::I64 => "int64",
        }
    }

    /// Inclusive range of values representable at this precision.
    pub const fn bounds(&self) -> (f64, f64) {
        match self {
            Self::I32 => (i32::MIN as f64, i32::MAX as f64),
            // Largest f64 below 2^63.
            Self::I64 => (i64::MIN as f64, 9_223_372_036_854_774_784.0),
        }
    }

    const fn to_u8(self) -> u8 {
        match self {
            Self::I32 => 0,
            Self::I64 => 1,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::I32,
            _ => Self::I64,
        }
    }
}

impl fmt::Display for FloatPrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for IntPrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FloatPrecision {
    type Err = TinctError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match validate_method(s, &["float32", "float64", "f32", "f64"])? {
            "float32" | "f32" => Ok(Self::F32),
            _ => Ok(Self::F64),
        }
    }
}

impl FromStr for IntPrecision {
    type Err = TinctError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match validate_method(s, &["int32", "int64", "i32", "i64"])? {
            "int32" | "i32" => Ok(Self::I32),
            _ => Ok(Self::I64),
        }
    }
}

static FLOAT_PRECISION: AtomicU8 = AtomicU8::new(FloatPrecision::F64.to_u8());
static INT_PRECISION: AtomicU8 = AtomicU8::new(IntPrecision::I64.to_u8());

pub fn float_precision() -> FloatPrecision {
    FloatPrecision::from_u8(FLOAT_PRECISION.load(Ordering::Acquire))
}

pub fn int_precision() -> IntPrecision {
    IntPrecision::from_u8(INT_PRECISION.load(Ordering::Acquire))
}

/// Set the process-wide float precision, returning the previous one.
///
/// Values held by the global [`CacheRegistry`] were computed at the previous
/// precision, so a change clears every global cache.
pub fn set_float_precision(precision: FloatPrecision) -> FloatPrecision {
    let previous = FloatPrecision::from_u8(FLOAT_PRECISION.swap(precision.to_u8(), Ordering::AcqRel));
    if previous != precision {
        tracing::debug!("float precision changed: {previous} -> {precision}");
        CacheRegistry::global().clear_all_caches();
        if precision == FloatPrecision::F32 {
            usage_warning(
                "float32 precision is not exercised by the reference datasets; \
                 results may differ from published values",
            );
        }
    }
    previous
}

/// Set the process-wide integer precision, returning the previous one.
pub fn set_int_precision(precision: IntPrecision) -> IntPrecision {
    let previous = IntPrecision::from_u8(INT_PRECISION.swap(precision.to_u8(), Ordering::AcqRel));
    if previous != precision {
        tracing::debug!("int precision changed: {previous} -> {precision}");
    }
    previous
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::global_state_lock;

    #[test]
    fn test_defaults_are_double_width() {
        assert_eq!(FloatPrecision::default(), FloatPrecision::F64);
        assert_eq!(IntPrecision::default(), IntPrecision::I64);
    }

    #[test]
    fn test_set_precision_returns_previous() {
        let _lock = global_state_lock();
        let float_before = set_float_precision(FloatPrecision::F32);
        assert_eq!(float_precision(), FloatPrecision::F32);
        assert_eq!(set_float_precision(float_before), FloatPrecision::F32);

        let int_before = set_int_precision(IntPrecision::I32);
        assert_eq!(int_precision(), IntPrecision::I32);
        assert_eq!(set_int_precision(int_before), IntPrecision::I32);
    }

    #[test]
    fn test_float_precision_change_clears_global_caches() {
        let _lock = global_state_lock();
        let registry = CacheRegistry::global();
        let cache = registry.register_cache("precision::test");
        let key = crate::cache::Fingerprint::of_str("key");
        cache.insert(key, 1.0_f64);
        assert_eq!(cache.len(), 1);

        let before = set_float_precision(FloatPrecision::F32);
        assert!(cache.is_empty(), "float precision change should clear caches");
        set_float_precision(before);
        registry.unregister_cache("precision::test");
    }

    #[test]
    fn test_precision_names_parse() {
        assert_eq!("Float32".parse::<FloatPrecision>(), Ok(FloatPrecision::F32));
        assert_eq!("f64".parse::<FloatPrecision>(), Ok(FloatPrecision::F64));
        assert_eq!("INT32".parse::<IntPrecision>(), Ok(IntPrecision::I32));
        assert!("float16".parse::<FloatPrecision>().is_err());
    }

    #[test]
    fn test_int_bounds() {
        let (lo, hi) = IntPrecision::I32.bounds();
        assert_eq!(lo, -2_147_483_648.0);
        assert_eq!(hi, 2_147_483_647.0);
    }
}

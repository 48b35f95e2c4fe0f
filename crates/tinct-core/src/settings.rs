//! Snapshot of every process-wide numeric setting.

use serde::{Deserialize, Serialize};

use crate::cache::{is_caching_enabled, set_caching_enable};
use crate::error::TinctResult;
use crate::precision::{
    FloatPrecision, IntPrecision, float_precision, int_precision, set_float_precision, set_int_precision,
};
use crate::scale::{ScaleMode, get_domain_range_scale, set_domain_range_scale};

/// Environment variable read for [`NumericSettings::float_precision`].
pub const FLOAT_PRECISION_VAR: &str = "TINCT_FLOAT_PRECISION";
/// Environment variable read for [`NumericSettings::int_precision`].
pub const INT_PRECISION_VAR: &str = "TINCT_INT_PRECISION";
/// Environment variable read for [`NumericSettings::domain_range_scale`].
pub const DOMAIN_RANGE_SCALE_VAR: &str = "TINCT_DOMAIN_RANGE_SCALE";

/// Numeric configuration shared by every computation in the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumericSettings {
    /// Domain-range scale. Default: [`ScaleMode::Reference`].
    pub domain_range_scale: ScaleMode,
    /// Precision of coerced float arrays. Default: [`FloatPrecision::F64`].
    pub float_precision: FloatPrecision,
    /// Precision of coerced integer arrays. Default: [`IntPrecision::I64`].
    pub int_precision: IntPrecision,
    /// Whether memoizing caches are consulted. Default: `true`.
    pub caching_enabled: bool,
}

impl Default for NumericSettings {
    fn default() -> Self {
        Self {
            domain_range_scale: ScaleMode::Reference,
            float_precision: FloatPrecision::F64,
            int_precision: IntPrecision::I64,
            caching_enabled: true,
        }
    }
}

impl NumericSettings {
    /// The settings in effect on the calling thread.
    pub fn current() -> Self {
        Self {
            domain_range_scale: get_domain_range_scale(),
            float_precision: float_precision(),
            int_precision: int_precision(),
            caching_enabled: is_caching_enabled(),
        }
    }

    /// Install these settings, returning the ones they replace.
    pub fn apply(&self) -> TinctResult<Self> {
        let previous = Self::current();
        set_domain_range_scale(self.domain_range_scale)?;
        set_float_precision(self.float_precision);
        set_int_precision(self.int_precision);
        set_caching_enable(self.caching_enabled);
        tracing::debug!("applied numeric settings: {self:?}");
        Ok(previous)
    }

    /// The current settings overridden by any `TINCT_*` environment variables.
    ///
    /// Nothing is installed until the result is [applied](Self::apply).
    pub fn from_env() -> TinctResult<Self> {
        Self::current().with_overrides(|name| std::env::var(name).ok())
    }

    /// Override fields from `lookup`, which maps a variable name to its value.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> TinctResult<Self> {
        if let Some(value) = lookup(DOMAIN_RANGE_SCALE_VAR) {
            self.domain_range_scale = value.parse()?;
        }
        if let Some(value) = lookup(FLOAT_PRECISION_VAR) {
            self.float_precision = value.parse()?;
        }
        if let Some(value) = lookup(INT_PRECISION_VAR) {
            self.int_precision = value.parse()?;
        }
        Ok(self)
    }
}

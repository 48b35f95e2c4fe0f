//! Domain-range scale: the convention numeric entry and exit points use for
//! their input domain and output range.
//!
//! The process-wide mode is an atomic. A [`ScaleGuard`] shadows it on the
//! current thread only, so scoped overrides never leak into other threads.

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

use ndarray::{Array, Dimension};
use serde::{Deserialize, Serialize};

use crate::error::{TinctError, TinctResult};
use crate::mapping::validate_method;

/// Scaling convention for values crossing the public numeric API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ScaleMode {
    /// Each function uses its own reference domain; no rescaling.
    #[default]
    Reference,
    /// Values are normalized to `[0, 1]`.
    #[serde(rename = "1")]
    Scale1,
    /// Values are normalized to `[0, 100]`.
    #[serde(rename = "100")]
    Scale100,
}

impl ScaleMode {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Reference => "Reference",
            Self::Scale1 => "1",
            Self::Scale100 => "100",
        }
    }

    pub fn all() -> &'static [Self] {
        &[Self::Reference, Self::Scale1, Self::Scale100]
    }

    const fn to_u8(self) -> u8 {
        match self {
            Self::Reference => 0,
            Self::Scale1 => 1,
            Self::Scale100 => 2,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Scale1,
            2 => Self::Scale100,
            _ => Self::Reference,
        }
    }

    /// Rescale `value` from this mode into `domain`'s canonical domain.
    pub fn to_domain<T: Rescalable>(self, value: T, domain: Domain) -> T {
        value.rescale(domain.to_domain_op(self))
    }

    /// Rescale `value` from `domain`'s canonical range into this mode.
    pub fn from_range<T: Rescalable>(self, value: T, domain: Domain) -> T {
        value.rescale(domain.to_domain_op(self).inverse())
    }
}

impl fmt::Display for ScaleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ScaleMode {
    type Err = TinctError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = validate_method(s.trim(), &["Reference", "1", "100"])
            .map_err(|_| TinctError::InvalidScaleMode(s.to_string()))?;
        match label {
            "1" => Ok(Self::Scale1),
            "100" => Ok(Self::Scale100),
            _ => Ok(Self::Reference),
        }
    }
}

/// Anything [`set_domain_range_scale`] accepts.
pub trait IntoScaleMode {
    fn into_scale_mode(self) -> TinctResult<ScaleMode>;
}

impl IntoScaleMode for ScaleMode {
    fn into_scale_mode(self) -> TinctResult<ScaleMode> {
        Ok(self)
    }
}

impl IntoScaleMode for &str {
    fn into_scale_mode(self) -> TinctResult<ScaleMode> {
        self.parse()
    }
}

impl IntoScaleMode for String {
    fn into_scale_mode(self) -> TinctResult<ScaleMode> {
        self.parse()
    }
}

impl IntoScaleMode for &String {
    fn into_scale_mode(self) -> TinctResult<ScaleMode> {
        self.parse()
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

static GLOBAL_SCALE: AtomicU8 = AtomicU8::new(ScaleMode::Reference.to_u8());

/// Scoped overrides on one thread, innermost last. Each entry is tagged with
/// the id of the guard that owns it.
#[derive(Default)]
struct ScopeStack {
    next_id: u64,
    overrides: Vec<(u64, ScaleMode)>,
}

impl ScopeStack {
    fn current(&self) -> Option<ScaleMode> {
        self.overrides.last().map(|(_, mode)| *mode)
    }

    fn push(&mut self, mode: ScaleMode) -> u64 {
        self.next_id += 1;
        self.overrides.push((self.next_id, mode));
        self.next_id
    }

    fn remove(&mut self, id: u64) {
        if let Some(position) = self.overrides.iter().rposition(|(owner, _)| *owner == id) {
            self.overrides.remove(position);
        }
    }
}

thread_local! {
    static SCOPED_SCALE: RefCell<ScopeStack> = RefCell::new(ScopeStack::default());
}

fn global_scale() -> ScaleMode {
    ScaleMode::from_u8(GLOBAL_SCALE.load(Ordering::Acquire))
}

/// The mode in effect on this thread.
pub fn get_domain_range_scale() -> ScaleMode {
    SCOPED_SCALE
        .with(|stack| stack.borrow().current())
        .unwrap_or_else(global_scale)
}

/// Set the mode, returning the previous one.
///
/// Inside a [`domain_range_scale`] scope this replaces the innermost scoped
/// override, which is discarded when its guard drops. Otherwise it sets the
/// process-wide mode. An invalid mode leaves all state untouched.
pub fn set_domain_range_scale(mode: impl IntoScaleMode) -> TinctResult<ScaleMode> {
    let mode = mode.into_scale_mode()?;
    let scoped = SCOPED_SCALE.with(|stack| {
        let mut stack = stack.borrow_mut();
        let (_, current) = stack.overrides.last_mut()?;
        Some(std::mem::replace(current, mode))
    });
    let previous = match scoped {
        Some(previous) => previous,
        None => ScaleMode::from_u8(GLOBAL_SCALE.swap(mode.to_u8(), Ordering::AcqRel)),
    };
    if previous != mode {
        tracing::debug!("domain-range scale changed: {previous} -> {mode}");
    }
    Ok(previous)
}

/// Scoped override returned by [`domain_range_scale`].
///
/// Dropping the guard, including while unwinding, removes exactly the
/// override it installed. Guards may be dropped in any order; once all of a
/// thread's guards are gone the process-wide mode applies again.
#[must_use = "the override is reverted when the guard is dropped"]
pub struct ScaleGuard {
    id: u64,
    previous: ScaleMode,
    // Thread-local state: the guard must be dropped on the thread that made it.
    _not_send: PhantomData<*const ()>,
}

impl ScaleGuard {
    /// Mode that was in effect when this guard was created.
    pub fn previous(&self) -> ScaleMode {
        self.previous
    }
}

impl Drop for ScaleGuard {
    fn drop(&mut self) {
        // The thread-local may already be gone during thread teardown.
        let _ = SCOPED_SCALE.try_with(|stack| stack.borrow_mut().remove(self.id));
    }
}

/// Use `mode` on the current thread until the returned guard is dropped.
pub fn domain_range_scale(mode: impl IntoScaleMode) -> TinctResult<ScaleGuard> {
    let mode = mode.into_scale_mode()?;
    let previous = get_domain_range_scale();
    let id = SCOPED_SCALE.with(|stack| stack.borrow_mut().push(mode));
    Ok(ScaleGuard {
        id,
        previous,
        _not_send: PhantomData,
    })
}

/// Run `f` with `mode` in effect on the current thread.
pub fn with_domain_range_scale<R>(mode: impl IntoScaleMode, f: impl FnOnce() -> R) -> TinctResult<R> {
    let _guard = domain_range_scale(mode)?;
    Ok(f())
}

// ---------------------------------------------------------------------------
// Domains
// ---------------------------------------------------------------------------

/// Bit depth of an integer code-value domain, `1..=64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct BitDepth(u32);

impl BitDepth {
    pub const MAX: u32 = 64;

    pub fn new(bits: u32) -> TinctResult<Self> {
        if (1..=Self::MAX).contains(&bits) {
            Ok(Self(bits))
        } else {
            Err(TinctError::InvalidBitDepth(bits))
        }
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// `2^bits - 1`.
    pub fn max_code_value(self) -> f64 {
        2.0_f64.powi(self.0 as i32) - 1.0
    }
}

impl TryFrom<u32> for BitDepth {
    type Error = TinctError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        Self::new(bits)
    }
}

impl From<BitDepth> for u32 {
    fn from(depth: BitDepth) -> Self {
        depth.0
    }
}

/// Canonical domain a numeric routine works in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    /// `[0, 1]`.
    One,
    /// `[0, 10]`.
    Ten,
    /// `[0, 100]`.
    Hundred,
    /// `[0, 360]`.
    Degrees,
    /// Integer code values `[0, 2^bits - 1]`.
    Int(BitDepth),
}

impl Domain {
    /// 8-bit integer code values.
    pub const INT8: Self = Self::Int(BitDepth(8));

    /// Integer code values at `bits` of depth.
    pub fn int(bits: u32) -> TinctResult<Self> {
        BitDepth::new(bits).map(Self::Int)
    }

    fn to_domain_op(self, mode: ScaleMode) -> Rescale {
        use Rescale::{Div, Identity, Mul};

        match (self, mode) {
            (_, ScaleMode::Reference) => Identity,
            (Self::One, ScaleMode::Scale1) => Identity,
            (Self::One, ScaleMode::Scale100) => Div(100.0),
            (Self::Ten, ScaleMode::Scale1) => Mul(10.0),
            (Self::Ten, ScaleMode::Scale100) => Div(10.0),
            (Self::Hundred, ScaleMode::Scale1) => Mul(100.0),
            (Self::Hundred, ScaleMode::Scale100) => Identity,
            (Self::Degrees, ScaleMode::Scale1) => Mul(360.0),
            (Self::Degrees, ScaleMode::Scale100) => Mul(360.0 / 100.0),
            (Self::Int(depth), ScaleMode::Scale1) => Mul(depth.max_code_value()),
            (Self::Int(depth), ScaleMode::Scale100) => Mul(depth.max_code_value() / 100.0),
        }
    }
}

/// Linear rescale applied to every element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rescale {
    Identity,
    Mul(f64),
    Div(f64),
}

impl Rescale {
    /// The rescale undoing this one exactly.
    pub const fn inverse(self) -> Self {
        match self {
            Self::Identity => Self::Identity,
            Self::Mul(factor) => Self::Div(factor),
            Self::Div(factor) => Self::Mul(factor),
        }
    }

    pub fn apply(self, value: f64) -> f64 {
        match self {
            Self::Identity => value,
            Self::Mul(factor) => value * factor,
            Self::Div(factor) => value / factor,
        }
    }
}

/// Values the scale conversions accept.
pub trait Rescalable: Sized {
    fn rescale(self, op: Rescale) -> Self;
}

impl Rescalable for f64 {
    fn rescale(self, op: Rescale) -> Self {
        op.apply(self)
    }
}

impl Rescalable for f32 {
    fn rescale(self, op: Rescale) -> Self {
        op.apply(f64::from(self)) as f32
    }
}

impl Rescalable for Vec<f64> {
    fn rescale(mut self, op: Rescale) -> Self {
        if op != Rescale::Identity {
            self.iter_mut().for_each(|value| *value = op.apply(*value));
        }
        self
    }
}

impl<const N: usize> Rescalable for [f64; N] {
    fn rescale(self, op: Rescale) -> Self {
        self.map(|value| op.apply(value))
    }
}

impl<D: Dimension> Rescalable for Array<f64, D> {
    fn rescale(mut self, op: Rescale) -> Self {
        if op != Rescale::Identity {
            self.mapv_inplace(|value| op.apply(value));
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Conversions using the current mode
// ---------------------------------------------------------------------------

pub fn to_domain<T: Rescalable>(value: T, domain: Domain) -> T {
    get_domain_range_scale().to_domain(value, domain)
}

pub fn from_range<T: Rescalable>(value: T, domain: Domain) -> T {
    get_domain_range_scale().from_range(value, domain)
}

pub fn to_domain_1<T: Rescalable>(value: T) -> T {
    to_domain(value, Domain::One)
}

pub fn to_domain_10<T: Rescalable>(value: T) -> T {
    to_domain(value, Domain::Ten)
}

pub fn to_domain_100<T: Rescalable>(value: T) -> T {
    to_domain(value, Domain::Hundred)
}

pub fn to_domain_degrees<T: Rescalable>(value: T) -> T {
    to_domain(value, Domain::Degrees)
}

/// Fails with [`TinctError::InvalidBitDepth`] outside `1..=64`.
pub fn to_domain_int<T: Rescalable>(value: T, bit_depth: u32) -> TinctResult<T> {
    Ok(to_domain(value, Domain::int(bit_depth)?))
}

pub fn from_range_1<T: Rescalable>(value: T) -> T {
    from_range(value, Domain::One)
}

pub fn from_range_10<T: Rescalable>(value: T) -> T {
    from_range(value, Domain::Ten)
}

pub fn from_range_100<T: Rescalable>(value: T) -> T {
    from_range(value, Domain::Hundred)
}

pub fn from_range_degrees<T: Rescalable>(value: T) -> T {
    from_range(value, Domain::Degrees)
}

/// Fails with [`TinctError::InvalidBitDepth`] outside `1..=64`.
pub fn from_range_int<T: Rescalable>(value: T, bit_depth: u32) -> TinctResult<T> {
    Ok(from_range(value, Domain::int(bit_depth)?))
}

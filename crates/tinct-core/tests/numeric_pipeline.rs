//! End-to-end use of the numeric core the way a conversion routine uses it:
//! coerce the input, rescale into the working domain, memoize, rescale out.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};

use ndarray::{ArrayD, arr1};
use tinct_core::array::{FillNan, as_float_array_with, fill_nan, is_uniform, tsplit, tstack};
use tinct_core::cache::{CachePolicy, caching_enable};
use tinct_core::scale::{from_range_1, from_range_100, to_domain_1, to_domain_100};
use tinct_core::{
    CacheRegistry, FloatPrecision, Fingerprint, NumericSettings, ScaleMode, TinctError, domain_range_scale,
    set_domain_range_scale,
};

fn settings_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

static CALLS: AtomicUsize = AtomicUsize::new(0);

/// A stand-in conversion: Y in `[0, 1]` to lightness-like `[0, 100]`.
fn lightness(y: &[f64]) -> ArrayD<f64> {
    let cache = CacheRegistry::global()
        .register_cache_with_policy("numeric_pipeline::lightness", CachePolicy::Lru { capacity: 8 });
    let input = to_domain_1(
        as_float_array_with(&y.to_vec(), FloatPrecision::F64)
            .unwrap()
            .into_f64(),
    );
    let key = Fingerprint::builder().with_array(&input).finish();
    let output = cache.get_or_insert_with(key, || {
        CALLS.fetch_add(1, Ordering::SeqCst);
        input.mapv(|v| 116.0 * v.cbrt() - 16.0)
    });
    from_range_100((*output).clone())
}

fn assert_close(actual: &ArrayD<f64>, expected: &[f64], tol: f64) {
    assert_eq!(actual.len(), expected.len(), "length mismatch");
    for (i, (got, want)) in actual.iter().zip(expected).enumerate() {
        assert!(
            (got - want).abs() <= tol,
            "element {i} mismatch: got {got}, expected {want}"
        );
    }
}

#[test]
fn test_conversion_honours_scale_mode() {
    let _lock = settings_lock().lock().expect("settings lock poisoned");
    let reference = lightness(&[0.18, 1.0]);
    assert_close(&reference, &[49.4961, 100.0], 1e-4);

    {
        let _scale = domain_range_scale("100").unwrap();
        let scaled = lightness(&[18.0, 100.0]);
        assert_close(&scaled, &[49.4961, 100.0], 1e-4);
    }

    {
        let _scale = domain_range_scale(ScaleMode::Scale1).unwrap();
        let unit = lightness(&[0.18, 1.0]);
        assert_close(&unit, &[0.494961, 1.0], 1e-6);
    }
}

#[test]
fn test_repeated_calls_hit_the_cache() {
    let _lock = settings_lock().lock().expect("settings lock poisoned");
    CacheRegistry::global().clear_cache("numeric_pipeline::lightness");
    let before = CALLS.load(Ordering::SeqCst);

    lightness(&[0.5]);
    lightness(&[0.5]);
    assert_eq!(CALLS.load(Ordering::SeqCst) - before, 1);

    {
        let _off = caching_enable(false);
        lightness(&[0.5]);
    }
    assert_eq!(CALLS.load(Ordering::SeqCst) - before, 2, "disabled caching recomputes");

    CacheRegistry::global().clear_all_caches();
    lightness(&[0.5]);
    assert_eq!(CALLS.load(Ordering::SeqCst) - before, 3, "clear forces a miss");
}

#[test]
fn test_invalid_scale_mode_is_reported() {
    let _lock = settings_lock().lock().expect("settings lock poisoned");
    let err = set_domain_range_scale("0-1").unwrap_err();
    assert_eq!(err, TinctError::InvalidScaleMode("0-1".to_string()));
    assert!(err.to_string().contains("\"0-1\""));
}

#[test]
fn test_unit_round_trip_through_scale_100() {
    let _lock = settings_lock().lock().expect("settings lock poisoned");
    let _scale = domain_range_scale("100").unwrap();
    for value in [0.0_f64, 0.25, 42.0, 99.999] {
        let back = from_range_1(to_domain_1(value));
        assert!((back - value).abs() < 1e-10, "round trip of {value} gave {back}");
        let back = from_range_100(to_domain_100(value));
        assert!((back - value).abs() < 1e-10, "round trip of {value} gave {back}");
    }
}

#[test]
fn test_sampled_data_cleanup() {
    let wavelengths = arr1(&[400.0, 410.0, 420.0, 430.0]);
    let values = arr1(&[0.1, f64::NAN, 0.3, 0.4]);
    assert!(is_uniform(&wavelengths).unwrap());

    let values = fill_nan(&values, FillNan::Interpolation).unwrap();
    let table = tstack(&[wavelengths.clone(), values.clone()]).unwrap();
    assert_eq!(table.shape(), &[4, 2]);

    let columns = tsplit(&table).unwrap();
    assert_eq!(columns[0], wavelengths);
    assert!((columns[1][1] - 0.2).abs() < 1e-12);
}

#[test]
fn test_settings_snapshot_restores_everything() {
    let _lock = settings_lock().lock().expect("settings lock poisoned");
    let original = NumericSettings::current();
    let previous = NumericSettings {
        domain_range_scale: ScaleMode::Scale1,
        caching_enabled: false,
        ..original
    }
    .apply()
    .unwrap();
    assert_eq!(previous, original);
    assert_eq!(NumericSettings::current().domain_range_scale, ScaleMode::Scale1);
    original.apply().unwrap();
    assert_eq!(NumericSettings::current(), original);
}

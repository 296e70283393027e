//! PM2.5 estimation from a pretrained regression model.
//!
//! The crate loads a model and its two fitted scalers once, turns a
//! coordinate and a wall-clock time into a prediction, and derives a
//! daily forecast series from repeated predictions. The C ABI at the
//! bottom of this file lets a desktop front end drive the same context.

pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod inference;
pub mod model;
pub mod utils;

pub use app::{AppContext, FormInput, LocationInput, Submission};
pub use config::{AppConfig, NoiseModel};
pub use data::places::PlaceTable;
pub use data::preprocessing::Coordinate;
pub use error::{FormError, InferenceError, LookupError, ParseError, StartupError};
pub use inference::forecast::ForecastPoint;
pub use model::artifacts::{ArtifactCache, Artifacts};

use std::ffi::CStr;
use std::path::Path;

use crate::data::preprocessing::parse_timestamp;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct PointEstimate {
    pub raw: f64,
    pub estimate: f64,
}

unsafe fn c_str<'a>(ptr: *const libc::c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Opens a context, loading the artifacts. `config_path` may be null for
/// defaults. Returns null when config or artifacts fail to load.
#[unsafe(no_mangle)]
pub extern "C" fn pm25_context_open(config_path: *const libc::c_char) -> *mut AppContext {
    let path = unsafe { c_str(config_path) };
    let config = match AppConfig::load(path.map(Path::new)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to load config");
            return std::ptr::null_mut();
        }
    };
    match AppContext::start(config) {
        Ok(ctx) => Box::into_raw(Box::new(ctx)),
        Err(e) => {
            tracing::error!(error = %e, "failed to load artifacts");
            std::ptr::null_mut()
        }
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn pm25_context_free(ctx: *mut AppContext) {
    if !ctx.is_null() {
        unsafe {
            let _ = Box::from_raw(ctx);
        }
    }
}

/// Writes the place's coordinate into `lat`/`lon`.
#[unsafe(no_mangle)]
pub extern "C" fn pm25_resolve_place(
    ctx: *const AppContext,
    name: *const libc::c_char,
    lat: *mut f64,
    lon: *mut f64,
) -> bool {
    if ctx.is_null() || lat.is_null() || lon.is_null() {
        return false;
    }
    let ctx = unsafe { &*ctx };
    let Some(name) = (unsafe { c_str(name) }) else {
        return false;
    };
    match ctx.places().lookup(name) {
        Ok(c) => {
            unsafe {
                *lat = c.latitude();
                *lon = c.longitude();
            }
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "place lookup failed");
            false
        }
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn pm25_predict(
    ctx: *const AppContext,
    latitude: f64,
    longitude: f64,
    timestamp: *const libc::c_char,
    out: *mut PointEstimate,
) -> bool {
    if ctx.is_null() || out.is_null() {
        return false;
    }
    let ctx = unsafe { &*ctx };
    let Some(timestamp) = (unsafe { c_str(timestamp) }) else {
        return false;
    };

    let result = Coordinate::new(latitude, longitude)
        .map_err(FormError::from)
        .and_then(|c| Ok((c, parse_timestamp(timestamp)?)))
        .and_then(|(c, ts)| ctx.with_rng(|rng| ctx.point_estimate(c, ts, rng)));

    match result {
        Ok((raw, estimate)) => {
            unsafe {
                *out = PointEstimate {
                    raw: raw as f64,
                    estimate: estimate as f64,
                };
            }
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "prediction failed");
            false
        }
    }
}

/// Fills `values` with up to `capacity` daily forecast values and returns
/// how many were written, or -1 on error.
#[unsafe(no_mangle)]
pub extern "C" fn pm25_forecast(
    ctx: *const AppContext,
    latitude: f64,
    longitude: f64,
    start: *const libc::c_char,
    values: *mut f64,
    capacity: libc::size_t,
) -> libc::c_int {
    if ctx.is_null() || values.is_null() {
        return -1;
    }
    let ctx = unsafe { &*ctx };
    let Some(start) = (unsafe { c_str(start) }) else {
        return -1;
    };

    let result = Coordinate::new(latitude, longitude)
        .map_err(FormError::from)
        .and_then(|c| Ok((c, parse_timestamp(start)?)))
        .and_then(|(c, ts)| ctx.with_rng(|rng| ctx.forecast(c, ts, rng)));

    match result {
        Ok(points) => {
            let out = unsafe { std::slice::from_raw_parts_mut(values, capacity) };
            let written = points.len().min(capacity);
            for (slot, point) in out.iter_mut().zip(&points) {
                *slot = point.value as f64;
            }
            written as libc::c_int
        }
        Err(e) => {
            tracing::warn!(error = %e, "forecast failed");
            -1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::layers::Activation;
    use crate::model::network::{DenseLayer, RegressionNetwork};
    use crate::model::scaler::Scaler;
    use crate::utils::io::save_artifact;
    use ndarray::{Array2, array};
    use std::ffi::CString;
    use tempfile::TempDir;

    /// Writes a constant model (raw output 50) and a config pointing at it.
    fn write_config(dir: &TempDir) -> CString {
        let model = dir.path().join("model.bin");
        let input_scaler = dir.path().join("scaler_x.bin");
        let output_scaler = dir.path().join("scaler_y.bin");
        let network = RegressionNetwork {
            layers: vec![DenseLayer {
                weights: Array2::zeros((3, 1)),
                bias: array![[0.5]],
                activation: Activation::Linear,
            }],
        };
        save_artifact(&model, &network).unwrap();
        save_artifact(
            &input_scaler,
            &Scaler::standard(array![0.0, 0.0, 0.0], array![1.0, 1.0, 1.0]),
        )
        .unwrap();
        save_artifact(&output_scaler, &Scaler::min_max(array![0.0], array![100.0])).unwrap();

        let config = format!(
            "seed = 7\n\n[artifacts]\nmodel = {:?}\ninput_scaler = {:?}\noutput_scaler = {:?}\n",
            model.display().to_string(),
            input_scaler.display().to_string(),
            output_scaler.display().to_string(),
        );
        let path = dir.path().join("pm25.toml");
        std::fs::write(&path, config).unwrap();
        CString::new(path.display().to_string()).unwrap()
    }

    fn open(dir: &TempDir) -> *mut AppContext {
        let config = write_config(dir);
        let ctx = pm25_context_open(config.as_ptr());
        assert!(!ctx.is_null());
        ctx
    }

    #[test]
    fn open_fails_without_artifacts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pm25.toml");
        std::fs::write(&path, "[artifacts]\nmodel = \"/nonexistent/model.bin\"\n").unwrap();
        let config = CString::new(path.display().to_string()).unwrap();
        assert!(pm25_context_open(config.as_ptr()).is_null());

        let missing = CString::new("/nonexistent/pm25.toml").unwrap();
        assert!(pm25_context_open(missing.as_ptr()).is_null());
    }

    #[test]
    fn resolve_place_writes_coordinates() {
        let dir = TempDir::new().unwrap();
        let ctx = open(&dir);
        let (mut lat, mut lon) = (0.0, 0.0);

        let known = CString::new("สีลม").unwrap();
        assert!(pm25_resolve_place(ctx, known.as_ptr(), &mut lat, &mut lon));
        assert_eq!((lat, lon), (13.73, 100.525));

        let unknown = CString::new("Atlantis").unwrap();
        assert!(!pm25_resolve_place(ctx, unknown.as_ptr(), &mut lat, &mut lon));
        assert_eq!((lat, lon), (13.73, 100.525));

        pm25_context_free(ctx);
    }

    #[test]
    fn predict_fills_the_estimate() {
        let dir = TempDir::new().unwrap();
        let ctx = open(&dir);
        let ts = CString::new("2024-01-15 08:00:00").unwrap();
        let mut out = PointEstimate::default();

        assert!(pm25_predict(ctx, 13.7563, 100.5018, ts.as_ptr(), &mut out));
        assert!((out.raw - 50.0).abs() < 1e-4);
        assert!(out.estimate >= 50.5 - 1e-4 && out.estimate <= 51.5 + 1e-4);

        let bad = CString::new("15/01/2024").unwrap();
        assert!(!pm25_predict(ctx, 13.7563, 100.5018, bad.as_ptr(), &mut out));
        assert!(!pm25_predict(ctx, 95.0, 100.5018, ts.as_ptr(), &mut out));

        pm25_context_free(ctx);
    }

    #[test]
    fn forecast_respects_capacity() {
        let dir = TempDir::new().unwrap();
        let ctx = open(&dir);
        let start = CString::new("2024-01-01 00:00:00").unwrap();

        let mut short = [f64::NAN; 5];
        let written = pm25_forecast(ctx, 13.7563, 100.5018, start.as_ptr(), short.as_mut_ptr(), 5);
        assert_eq!(written, 5);
        assert!(short.iter().all(|v| (48.999..=51.001).contains(v)));

        let mut long = [f64::NAN; 40];
        let written = pm25_forecast(ctx, 13.7563, 100.5018, start.as_ptr(), long.as_mut_ptr(), 40);
        assert_eq!(written, 30);
        assert!(long[..30].iter().all(|v| v.is_finite()));
        assert!(long[30..].iter().all(|v| v.is_nan()));

        pm25_context_free(ctx);
    }

    #[test]
    fn null_pointers_are_refused() {
        let dir = TempDir::new().unwrap();
        let ctx = open(&dir);
        let name = CString::new("สีลม").unwrap();
        let ts = CString::new("2024-01-15 08:00:00").unwrap();
        let (mut lat, mut lon) = (0.0, 0.0);
        let mut out = PointEstimate::default();
        let mut values = [0.0; 3];

        assert!(!pm25_resolve_place(std::ptr::null(), name.as_ptr(), &mut lat, &mut lon));
        assert!(!pm25_resolve_place(ctx, std::ptr::null(), &mut lat, &mut lon));
        assert!(!pm25_resolve_place(ctx, name.as_ptr(), std::ptr::null_mut(), &mut lon));
        assert!(!pm25_predict(std::ptr::null(), 0.0, 0.0, ts.as_ptr(), &mut out));
        assert!(!pm25_predict(ctx, 0.0, 0.0, std::ptr::null(), &mut out));
        assert!(!pm25_predict(ctx, 0.0, 0.0, ts.as_ptr(), std::ptr::null_mut()));
        assert_eq!(
            pm25_forecast(std::ptr::null(), 0.0, 0.0, ts.as_ptr(), values.as_mut_ptr(), 3),
            -1
        );
        assert_eq!(
            pm25_forecast(ctx, 0.0, 0.0, ts.as_ptr(), std::ptr::null_mut(), 3),
            -1
        );

        pm25_context_free(ctx);
        pm25_context_free(std::ptr::null_mut());
    }
}

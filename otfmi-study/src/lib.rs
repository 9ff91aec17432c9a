//! A function object from an OpenTURNS study exported over the C plugin ABI.
//!
//! The study is read from the location given by [`StudyConfig::from_env`] (by default the object
//! `function` in `/tmp/function.xml`) the first time the plugin is called, through an embedded
//! Python interpreter. Every later call reuses the loaded function.
use libc::{c_double, c_int};
use otfmi_core::Evaluator;
use otfmi_core::ffi::{evaluate_raw, guarded, or_abort, status_code};
use otfmi_core::logging::setup_plugin_tracing;
use otfmi_core::study::{OpenTurnsBackend, StudyConfig, StudyEvaluator};
use std::sync::OnceLock;
use tracing::{debug, info};

static EVALUATOR: OnceLock<StudyEvaluator<OpenTurnsBackend>> = OnceLock::new();

/// The process-wide evaluator context, created on first use.
pub fn evaluator() -> &'static StudyEvaluator<OpenTurnsBackend> {
    EVALUATOR.get_or_init(|| {
        setup_plugin_tracing();
        let config = StudyConfig::from_env();
        info!("Study plugin configured with {config:?}.");
        StudyEvaluator::new(OpenTurnsBackend, config)
    })
}

/// Load the study now rather than on the first evaluation.
///
/// Hosts that evaluate from several threads may call this once up front. Returns `0` on success
/// and `2` if the study could not be loaded.
#[unsafe(no_mangle)]
pub extern "C" fn otfmi_study_initialise() -> c_int {
    let result = guarded(|| evaluator().initialise().map(|_| ()));
    status_code(&result)
}

/// Evaluate the study function, aborting the process on any failure.
///
/// # Safety
///
/// `x` must point to `nin` doubles and `y` to `nout` writable doubles for the duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn c_func(nin: c_int, x: *const c_double, nout: c_int, y: *mut c_double) {
    let evaluator = evaluator();
    debug!("c_func(nin={nin}, nout={nout}) on `{}`", evaluator.name());
    // SAFETY: forwarded from the caller.
    or_abort(unsafe { evaluate_raw(evaluator, nin, x, nout, y) });
}

/// Evaluate the study function and return a status code instead of aborting.
///
/// Returns `0` on success, `1` for unusable buffers or a dimension mismatch, `2` when the study
/// or the embedded interpreter failed and `3` if the evaluation panicked.
///
/// # Safety
///
/// As for [`c_func`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn otfmi_study_evaluate(
    nin: c_int,
    x: *const c_double,
    nout: c_int,
    y: *mut c_double,
) -> c_int {
    // SAFETY: forwarded from the caller.
    status_code(&unsafe { evaluate_raw(evaluator(), nin, x, nout, y) })
}

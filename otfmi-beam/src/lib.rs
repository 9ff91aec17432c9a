//! Cantilever-beam deflection exported over the C plugin ABI.
//!
//! The host passes `x = [E, F, L, I]` and receives the deflection in `y[0]`.
use libc::{c_double, c_int};
use otfmi_core::beam::CantileverBeam;
use otfmi_core::ffi::{evaluate_raw, or_abort, status_code};
use otfmi_core::logging::setup_plugin_tracing;
use tracing::trace;

/// Evaluate the beam deflection, aborting the process if the buffers are unusable.
///
/// # Safety
///
/// `x` must point to `nin` doubles and `y` to `nout` writable doubles for the duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn c_func(nin: c_int, x: *const c_double, nout: c_int, y: *mut c_double) {
    setup_plugin_tracing();
    trace!("c_func(nin={nin}, nout={nout})");
    // SAFETY: forwarded from the caller.
    or_abort(unsafe { evaluate_raw(&CantileverBeam, nin, x, nout, y) });
}

/// Evaluate the beam deflection and return a status code instead of aborting.
///
/// Returns `0` on success and `1` when the buffers are too short or invalid.
///
/// # Safety
///
/// As for [`c_func`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn otfmi_beam_evaluate(nin: c_int, x: *const c_double, nout: c_int, y: *mut c_double) -> c_int {
    setup_plugin_tracing();
    // SAFETY: forwarded from the caller.
    status_code(&unsafe { evaluate_raw(&CantileverBeam, nin, x, nout, y) })
}

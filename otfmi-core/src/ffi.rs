//! Helpers shared by the plugins' C entry points.
//!
//! Hosts call the plugins as `void f(int nin, double *x, int nout, double *y)`. The helpers here
//! turn those raw arguments into slices, keep panics from unwinding into the host, and map
//! results to either a status code or process termination.
use crate::{ErrorKind, Evaluator, EvaluatorError};
use libc::{c_double, c_int};
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::error;

pub const STATUS_OK: c_int = 0;
pub const STATUS_SHAPE_ERROR: c_int = 1;
pub const STATUS_EXTERNAL_ERROR: c_int = 2;
pub const STATUS_PANIC: c_int = 3;

fn checked_len(argument: &'static str, len: c_int, is_null: bool) -> Result<usize, EvaluatorError> {
    let length = usize::try_from(len).map_err(|_| EvaluatorError::NegativeLength {
        argument,
        length: len.into(),
    })?;

    if is_null && length > 0 {
        return Err(EvaluatorError::NullPointer { argument, length });
    }

    Ok(length)
}

/// View the host's input buffer as a slice.
///
/// # Safety
///
/// When `ptr` is non-null it must point to `len` initialised doubles that stay valid and
/// unmodified for `'a`.
pub unsafe fn input_slice<'a>(len: c_int, ptr: *const c_double) -> Result<&'a [f64], EvaluatorError> {
    let len = checked_len("input", len, ptr.is_null())?;
    if len == 0 {
        return Ok(&[]);
    }
    // SAFETY: non-null and `len` elements long per the caller's contract.
    Ok(unsafe { std::slice::from_raw_parts(ptr, len) })
}

/// View the host's output buffer as a mutable slice.
///
/// # Safety
///
/// When `ptr` is non-null it must point to `len` writable doubles, not aliased by the input
/// buffer, that stay valid for `'a`.
pub unsafe fn output_slice<'a>(len: c_int, ptr: *mut c_double) -> Result<&'a mut [f64], EvaluatorError> {
    let len = checked_len("output", len, ptr.is_null())?;
    if len == 0 {
        return Ok(&mut []);
    }
    // SAFETY: non-null and `len` elements long per the caller's contract.
    Ok(unsafe { std::slice::from_raw_parts_mut(ptr, len) })
}

/// Run `f`, converting a panic into [`EvaluatorError::Panic`].
pub fn guarded<F>(f: F) -> Result<(), EvaluatorError>
where
    F: FnOnce() -> Result<(), EvaluatorError>,
{
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        Err(EvaluatorError::Panic { message })
    })
}

/// Evaluate `evaluator` on the raw host buffers.
///
/// # Safety
///
/// See [`input_slice`] and [`output_slice`].
pub unsafe fn evaluate_raw<E>(
    evaluator: &E,
    nin: c_int,
    x: *const c_double,
    nout: c_int,
    y: *mut c_double,
) -> Result<(), EvaluatorError>
where
    E: Evaluator + ?Sized,
{
    guarded(|| {
        // SAFETY: forwarded from the caller.
        let x = unsafe { input_slice(nin, x) }?;
        let y = unsafe { output_slice(nout, y) }?;
        evaluator.evaluate(x, y)
    })
}

pub fn status_code(result: &Result<(), EvaluatorError>) -> c_int {
    match result {
        Ok(()) => STATUS_OK,
        Err(e) => {
            error!("Evaluation failed: {e}");
            match e.kind() {
                ErrorKind::Shape => STATUS_SHAPE_ERROR,
                ErrorKind::External => STATUS_EXTERNAL_ERROR,
                ErrorKind::Internal => STATUS_PANIC,
            }
        }
    }
}

/// Log `error` and abort the process.
///
/// Used by entry points whose signature has no way to report a failure.
pub fn fatal(error: &EvaluatorError) -> ! {
    report_fatal(error);
    std::process::abort()
}

/// Log a fatal error, writing it to stderr directly when no subscriber is installed.
///
/// Returns `true` if the stderr fallback was used.
fn report_fatal(error: &EvaluatorError) -> bool {
    error!("Fatal evaluation error: {error}");
    if tracing::dispatcher::has_been_set() {
        return false;
    }
    eprintln!("otfmi: fatal evaluation error: {error}");
    true
}

/// Unwrap the result of an entry point that cannot report failure, aborting on error.
pub fn or_abort(result: Result<(), EvaluatorError>) {
    if let Err(error) = result {
        fatal(&error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beam::CantileverBeam;
    use std::ptr;

    #[test]
    fn test_slices() {
        let x = [1.0, 2.0, 3.0];
        let slice = unsafe { input_slice(3, x.as_ptr()) }.unwrap();
        assert_eq!(slice, &x);

        let empty = unsafe { input_slice(0, ptr::null()) }.unwrap();
        assert!(empty.is_empty());

        let mut y = [0.0; 2];
        let out = unsafe { output_slice(2, y.as_mut_ptr()) }.unwrap();
        out[1] = 5.0;
        assert_eq!(y, [0.0, 5.0]);
    }

    #[test]
    fn test_invalid_buffers() {
        let err = unsafe { input_slice(-1, ptr::null()) }.unwrap_err();
        assert!(matches!(err, EvaluatorError::NegativeLength { argument: "input", length: -1 }));

        let err = unsafe { output_slice(2, ptr::null_mut()) }.unwrap_err();
        assert!(matches!(err, EvaluatorError::NullPointer { argument: "output", length: 2 }));
        assert_eq!(status_code(&Err(err)), STATUS_SHAPE_ERROR);
    }

    #[test]
    fn test_evaluate_raw() {
        let x = [1.0; 4];
        let mut y = [0.0];

        let result = unsafe { evaluate_raw(&CantileverBeam, 4, x.as_ptr(), 1, y.as_mut_ptr()) };
        assert_eq!(status_code(&result), STATUS_OK);
        assert_eq!(y, [1.0 / 3.0]);

        let result = unsafe { evaluate_raw(&CantileverBeam, 2, x.as_ptr(), 1, y.as_mut_ptr()) };
        assert_eq!(status_code(&result), STATUS_SHAPE_ERROR);
    }

    #[test]
    fn test_guarded_panic() {
        let result = guarded(|| panic!("lost the beam"));
        assert!(matches!(&result, Err(EvaluatorError::Panic { message }) if message == "lost the beam"));
        assert_eq!(status_code(&result), STATUS_PANIC);
    }

    #[test]
    fn test_fatal_reported_once_with_subscriber() {
        let error = EvaluatorError::OutputDimension { expected: 2, found: 1 };
        let used_stderr = tracing::subscriber::with_default(tracing_subscriber::registry(), || report_fatal(&error));
        assert!(!used_stderr);
    }
}

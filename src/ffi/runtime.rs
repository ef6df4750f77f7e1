//! FFI functions for the functional test runtime.

use std::ffi::{c_char, c_void, CStr, CString};
use std::path::PathBuf;

use super::types::{CTestStatus, CompletionCallback, GisasStatus, ProgressCallback, TestResultCallback};
use crate::runtime::{Runtime, RuntimeConfig, RuntimeError, TestOutcome, TestStatus};

/// Opaque handle to a Runtime.
pub type RuntimeHandle = *mut Runtime;

/// Configuration for creating a runtime.
#[repr(C)]
#[derive(Debug, Clone)]
pub struct CRuntimeConfig {
    /// Number of worker threads (0 = auto-detect).
    pub worker_count: usize,
    /// Reference directory (null = default).
    pub reference_dir: *const c_char,
    /// Non-zero to stop after the first failure.
    pub fail_fast: u8,
}

impl Default for CRuntimeConfig {
    fn default() -> Self {
        Self {
            worker_count: 0,
            reference_dir: std::ptr::null(),
            fail_fast: 0,
        }
    }
}

impl CRuntimeConfig {
    /// # Safety
    /// `reference_dir` must be null or a valid C string.
    unsafe fn to_config(&self) -> Result<RuntimeConfig, GisasStatus> {
        let mut config = RuntimeConfig::default();
        if self.worker_count != 0 {
            config.worker_count = self.worker_count;
        }
        if !self.reference_dir.is_null() {
            let dir = CStr::from_ptr(self.reference_dir)
                .to_str()
                .map_err(|_| GisasStatus::InvalidUtf8)?;
            config.reference_dir = PathBuf::from(dir);
        }
        config.fail_fast = self.fail_fast != 0;
        Ok(config)
    }
}

/// Create a new runtime.
///
/// # Safety
/// out_handle must be a valid pointer; config must be null or valid.
#[no_mangle]
pub unsafe extern "C" fn gisas_runtime_create(
    config: *const CRuntimeConfig,
    out_handle: *mut RuntimeHandle,
) -> GisasStatus {
    if out_handle.is_null() {
        return GisasStatus::NullPointer;
    }

    let cfg = if config.is_null() {
        RuntimeConfig::default()
    } else {
        match (*config).to_config() {
            Ok(cfg) => cfg,
            Err(status) => return status,
        }
    };

    match Runtime::new(cfg) {
        Ok(runtime) => {
            *out_handle = Box::into_raw(Box::new(runtime));
            GisasStatus::Ok
        }
        Err(e) => {
            tracing::error!(error = %e, "cannot create runtime");
            GisasStatus::RuntimeError
        }
    }
}

/// Free a runtime handle.
///
/// # Safety
/// Handle must be valid or null.
#[no_mangle]
pub unsafe extern "C" fn gisas_runtime_free(handle: RuntimeHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Queue a standard functional test by name.
///
/// # Safety
/// Runtime handle and name must be valid.
#[no_mangle]
pub unsafe extern "C" fn gisas_runtime_add_test(runtime: RuntimeHandle, name: *const c_char) -> GisasStatus {
    if runtime.is_null() || name.is_null() {
        return GisasStatus::NullPointer;
    }
    let name = match CStr::from_ptr(name).to_str() {
        Ok(s) => s,
        Err(_) => return GisasStatus::InvalidUtf8,
    };
    match (*runtime).add_test_by_name(name) {
        Ok(()) => GisasStatus::Ok,
        Err(RuntimeError::UnknownTest(_)) => GisasStatus::NotFound,
        Err(_) => GisasStatus::RuntimeError,
    }
}

fn difference_of(outcome: &TestOutcome) -> f64 {
    match outcome.status {
        TestStatus::Success(d) | TestStatus::Failed(d) => d,
        _ => f64::NAN,
    }
}

/// Run the queued tests asynchronously.
///
/// This function returns immediately. The completion callback will be
/// invoked when all tests have finished.
///
/// # Safety
/// Runtime handle must be valid. Callbacks and user_data must remain valid
/// until the completion callback is invoked.
#[no_mangle]
pub unsafe extern "C" fn gisas_runtime_run_async(
    runtime: RuntimeHandle,
    on_complete: CompletionCallback,
    on_progress: ProgressCallback,
    on_result: TestResultCallback,
    user_data: *mut c_void,
) -> GisasStatus {
    if runtime.is_null() {
        return GisasStatus::NullPointer;
    }

    let rt = &mut *runtime;

    // Carried as usize to be Send.
    let user_data = user_data as usize;

    let complete_cb = move |status: GisasStatus| {
        on_complete(user_data as *mut c_void, status);
    };

    let progress_cb = move |completed: usize, total: usize| {
        on_progress(user_data as *mut c_void, completed, total);
    };

    let result_cb = move |outcome: &TestOutcome| {
        let name = CString::new(outcome.name.replace('\0', "")).unwrap_or_default();
        on_result(
            user_data as *mut c_void,
            name.as_ptr(),
            CTestStatus::from(&outcome.status),
            difference_of(outcome),
        );
    };

    let handle = rt.run_async(complete_cb, progress_cb, result_cb);
    rt.detach(handle);

    GisasStatus::Ok
}

/// Block until the last asynchronous run has finished.
///
/// Returns `RuntimeError` if that run panicked; `Ok` when nothing is running.
///
/// # Safety
/// Runtime handle must be valid.
#[no_mangle]
pub unsafe extern "C" fn gisas_runtime_wait(runtime: RuntimeHandle) -> GisasStatus {
    if runtime.is_null() {
        return GisasStatus::NullPointer;
    }

    match (*runtime).wait_background() {
        Ok(()) => GisasStatus::Ok,
        Err(e) => {
            tracing::error!(error = %e, "asynchronous functional test run failed");
            GisasStatus::RuntimeError
        }
    }
}

/// Run the queued tests synchronously (blocking).
///
/// # Safety
/// Runtime handle must be valid.
#[no_mangle]
pub unsafe extern "C" fn gisas_runtime_run_sync(runtime: RuntimeHandle) -> GisasStatus {
    if runtime.is_null() {
        return GisasStatus::NullPointer;
    }

    match (*runtime).run_sync() {
        Ok(_) if (*runtime).is_cancelled() => GisasStatus::Cancelled,
        Ok(_) => GisasStatus::Ok,
        Err(e) => {
            tracing::error!(error = %e, "functional test run failed");
            GisasStatus::RuntimeError
        }
    }
}

/// Number of finished tests.
///
/// # Safety
/// Handle must be valid or null.
#[no_mangle]
pub unsafe extern "C" fn gisas_runtime_completed_count(runtime: RuntimeHandle) -> usize {
    if runtime.is_null() {
        return 0;
    }
    (*runtime).completed_count()
}

/// Number of failed or errored tests.
///
/// # Safety
/// Handle must be valid or null.
#[no_mangle]
pub unsafe extern "C" fn gisas_runtime_failed_count(runtime: RuntimeHandle) -> usize {
    if runtime.is_null() {
        return 0;
    }
    (*runtime).failed_count()
}

/// Number of queued tests.
///
/// # Safety
/// Handle must be valid or null.
#[no_mangle]
pub unsafe extern "C" fn gisas_runtime_pending_count(runtime: RuntimeHandle) -> usize {
    if runtime.is_null() {
        return 0;
    }
    (*runtime).pending_count()
}

/// Cancel all pending operations.
///
/// # Safety
/// Handle must be valid or null.
#[no_mangle]
pub unsafe extern "C" fn gisas_runtime_cancel(runtime: RuntimeHandle) -> GisasStatus {
    if runtime.is_null() {
        return GisasStatus::NullPointer;
    }

    (*runtime).cancel();
    GisasStatus::Ok
}

/// Reset the runtime for reuse.
///
/// # Safety
/// Handle must be valid or null.
#[no_mangle]
pub unsafe extern "C" fn gisas_runtime_reset(runtime: RuntimeHandle) -> GisasStatus {
    if runtime.is_null() {
        return GisasStatus::NullPointer;
    }

    (*runtime).reset();
    GisasStatus::Ok
}

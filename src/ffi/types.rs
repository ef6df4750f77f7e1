//! C-compatible type definitions for FFI.

use std::ffi::{c_char, c_void};

/// Result status codes for FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GisasStatus {
    /// Operation succeeded.
    Ok = 0,
    /// Null pointer was passed.
    NullPointer = 1,
    /// Invalid argument.
    InvalidArgument = 2,
    /// Array length mismatch.
    LengthMismatch = 3,
    /// Invalid UTF-8 string.
    InvalidUtf8 = 4,
    /// Simulation or runtime error.
    RuntimeError = 5,
    /// Operation was cancelled.
    Cancelled = 6,
    /// Unknown builder, simulation or test name.
    NotFound = 7,
}

/// C-compatible array view (pointer + length).
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CArrayView {
    pub data: *const f64,
    pub len: usize,
}

impl CArrayView {
    pub fn empty() -> Self {
        Self {
            data: std::ptr::null(),
            len: 0,
        }
    }

    pub fn from_slice(values: &[f64]) -> Self {
        Self {
            data: values.as_ptr(),
            len: values.len(),
        }
    }
}

/// Outcome code of one functional test as seen from C.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CTestStatus {
    Success = 0,
    Failed = 1,
    NoReference = 2,
    Error = 3,
}

impl From<&crate::runtime::TestStatus> for CTestStatus {
    fn from(status: &crate::runtime::TestStatus) -> Self {
        use crate::runtime::TestStatus;
        match status {
            TestStatus::Success(_) => CTestStatus::Success,
            TestStatus::Failed(_) => CTestStatus::Failed,
            TestStatus::NoReference => CTestStatus::NoReference,
            TestStatus::Error(_) => CTestStatus::Error,
        }
    }
}

/// Callback invoked once when an asynchronous run finishes.
pub type CompletionCallback = extern "C" fn(user_data: *mut c_void, status: GisasStatus);

/// Callback for progress updates.
///
/// # Arguments
/// * `user_data` - User-provided context pointer
/// * `completed` - Number of finished tests
/// * `total` - Total number of tests
pub type ProgressCallback = extern "C" fn(user_data: *mut c_void, completed: usize, total: usize);

/// Callback for each finished functional test.
///
/// # Arguments
/// * `user_data` - User-provided context pointer
/// * `test_name` - C string, valid only during the call
/// * `status` - Outcome code
/// * `difference` - Relative difference, NaN when not compared
pub type TestResultCallback = extern "C" fn(
    user_data: *mut c_void,
    test_name: *const c_char,
    status: CTestStatus,
    difference: f64,
);

//! FFI functions for standard simulations.

use std::ffi::{c_char, CStr};

use super::types::{CArrayView, GisasStatus};
use crate::data::relative_difference_values;
use crate::sample::SampleBuilderRegistry;
use crate::simulation::{GisasSimulation, SimulationError, SimulationRegistry};

/// A simulation plus the last intensity map handed out to C.
pub struct SimulationState {
    simulation: GisasSimulation,
    values: Vec<f64>,
    shape: (usize, usize),
}

/// Opaque handle to a simulation.
pub type SimulationHandle = *mut SimulationState;

unsafe fn str_arg<'a>(ptr: *const c_char) -> Result<&'a str, GisasStatus> {
    if ptr.is_null() {
        return Err(GisasStatus::NullPointer);
    }
    CStr::from_ptr(ptr).to_str().map_err(|_| GisasStatus::InvalidUtf8)
}

/// Create a standard simulation with a standard sample builder attached.
///
/// # Safety
/// Both names must be valid C strings; out_handle must be valid.
#[no_mangle]
pub unsafe extern "C" fn gisas_simulation_create_standard(
    sample_builder: *const c_char,
    simulation: *const c_char,
    out_handle: *mut SimulationHandle,
) -> GisasStatus {
    if out_handle.is_null() {
        return GisasStatus::NullPointer;
    }
    let (builder_name, simulation_name) = match (str_arg(sample_builder), str_arg(simulation)) {
        (Ok(b), Ok(s)) => (b, s),
        (Err(status), _) | (_, Err(status)) => return status,
    };

    let builders = SampleBuilderRegistry::new_with_defaults();
    let Ok(builder) = builders.create(builder_name) else {
        return GisasStatus::NotFound;
    };
    let mut sim = match SimulationRegistry::new_with_defaults().create(simulation_name) {
        Ok(sim) => sim,
        Err(SimulationError::UnknownSimulation(_)) => return GisasStatus::NotFound,
        Err(_) => return GisasStatus::RuntimeError,
    };
    sim.set_sample_builder(builder);

    let state = SimulationState {
        simulation: sim,
        values: Vec::new(),
        shape: (0, 0),
    };
    *out_handle = Box::into_raw(Box::new(state));
    GisasStatus::Ok
}

/// Run the simulation (blocking).
///
/// # Safety
/// Handle must be valid.
#[no_mangle]
pub unsafe extern "C" fn gisas_simulation_run(handle: SimulationHandle) -> GisasStatus {
    if handle.is_null() {
        return GisasStatus::NullPointer;
    }
    let state = &mut *handle;
    match state.simulation.run_simulation() {
        Ok(()) => {
            let data = state.simulation.intensity_data();
            state.shape = data.shape();
            state.values = data.raw_values();
            GisasStatus::Ok
        }
        Err(e) => {
            tracing::error!(error = %e, "simulation failed");
            GisasStatus::RuntimeError
        }
    }
}

/// View the last intensity map, flattened as `ix * ny + iy`.
///
/// # Safety
/// All pointers must be valid. The view is valid until the next run or free.
#[no_mangle]
pub unsafe extern "C" fn gisas_simulation_get_intensity(
    handle: SimulationHandle,
    out_view: *mut CArrayView,
    out_nx: *mut usize,
    out_ny: *mut usize,
) -> GisasStatus {
    if handle.is_null() || out_view.is_null() || out_nx.is_null() || out_ny.is_null() {
        return GisasStatus::NullPointer;
    }
    let state = &*handle;
    if state.values.is_empty() {
        *out_view = CArrayView::empty();
        *out_nx = 0;
        *out_ny = 0;
        return GisasStatus::NotFound;
    }
    *out_view = CArrayView::from_slice(&state.values);
    *out_nx = state.shape.0;
    *out_ny = state.shape.1;
    GisasStatus::Ok
}

/// Free a simulation handle.
///
/// # Safety
/// Handle must be valid or null.
#[no_mangle]
pub unsafe extern "C" fn gisas_simulation_free(handle: SimulationHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Mean relative difference of two arrays of length `len`.
///
/// # Safety
/// Both arrays must hold `len` values; out must be valid.
#[no_mangle]
pub unsafe extern "C" fn gisas_relative_difference(
    data: *const f64,
    reference: *const f64,
    len: usize,
    out: *mut f64,
) -> GisasStatus {
    if data.is_null() || reference.is_null() || out.is_null() {
        return GisasStatus::NullPointer;
    }
    if len == 0 {
        return GisasStatus::InvalidArgument;
    }
    let a = std::slice::from_raw_parts(data, len);
    let b = std::slice::from_raw_parts(reference, len);
    match relative_difference_values(a, b) {
        Ok(diff) => {
            *out = diff;
            GisasStatus::Ok
        }
        Err(_) => GisasStatus::RuntimeError,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn test_simulation_roundtrip() {
        let builder = CString::new("CylindersInBA").unwrap();
        let sim = CString::new("MiniGISAS").unwrap();
        unsafe {
            let mut handle: SimulationHandle = std::ptr::null_mut();
            assert_eq!(
                gisas_simulation_create_standard(builder.as_ptr(), sim.as_ptr(), &mut handle),
                GisasStatus::Ok
            );

            let mut view = CArrayView::empty();
            let (mut nx, mut ny) = (0usize, 0usize);
            assert_eq!(
                gisas_simulation_get_intensity(handle, &mut view, &mut nx, &mut ny),
                GisasStatus::NotFound
            );

            assert_eq!(gisas_simulation_run(handle), GisasStatus::Ok);
            assert_eq!(
                gisas_simulation_get_intensity(handle, &mut view, &mut nx, &mut ny),
                GisasStatus::Ok
            );
            assert_eq!((nx, ny), (25, 25));
            assert_eq!(view.len, 625);

            let mut diff = -1.0;
            assert_eq!(
                gisas_relative_difference(view.data, view.data, view.len, &mut diff),
                GisasStatus::Ok
            );
            assert_eq!(diff, 0.0);
            gisas_simulation_free(handle);
        }
    }

    #[test]
    fn test_unknown_names() {
        let bad = CString::new("Nope").unwrap();
        let sim = CString::new("MiniGISAS").unwrap();
        unsafe {
            let mut handle: SimulationHandle = std::ptr::null_mut();
            assert_eq!(
                gisas_simulation_create_standard(bad.as_ptr(), sim.as_ptr(), &mut handle),
                GisasStatus::NotFound
            );
            assert!(handle.is_null());
        }
    }
}

//! FFI bindings for Plant Pulse
//!
//! This module provides C-compatible functions for driving an engine from a
//! mobile or embedded host. All functions use C strings (null-terminated) and
//! return allocated memory that must be freed by the caller using
//! `plant_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::adapters::{CsvFrameAdapter, FrameAdapter, JsonFrameAdapter};
use crate::care::CareProfile;
use crate::config::EngineConfig;
use crate::encoder::OutputEncoder;
use crate::error::EngineError;
use crate::pipeline::PlantEngine;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Pick the adapter by the first character of the frame
fn adapter_for(frame: &str) -> &'static dyn FrameAdapter {
    if frame.trim_start().starts_with('{') {
        &JsonFrameAdapter
    } else {
        &CsvFrameAdapter
    }
}

/// Opaque handle to a PlantEngine
pub struct PlantEngineHandle {
    engine: PlantEngine,
    encoder: OutputEncoder,
}

/// Create a new engine.
///
/// # Safety
/// - `config_json` must be NULL (defaults) or a valid null-terminated C string.
/// - Returns a pointer that must be freed with `plant_engine_free`.
/// - Returns NULL on error; call `plant_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn plant_engine_new(config_json: *const c_char) -> *mut PlantEngineHandle {
    clear_last_error();

    let config = if config_json.is_null() {
        EngineConfig::default()
    } else {
        let json = match cstr_to_string(config_json) {
            Some(s) => s,
            None => {
                set_last_error("Invalid config string pointer");
                return ptr::null_mut();
            }
        };
        match EngineConfig::from_json(&json) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    let handle = Box::new(PlantEngineHandle {
        engine: PlantEngine::with_config(config),
        encoder: OutputEncoder::new(),
    });
    Box::into_raw(handle)
}

/// Free an engine.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `plant_engine_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn plant_engine_free(engine: *mut PlantEngineHandle) {
    if !engine.is_null() {
        drop(Box::from_raw(engine));
    }
}

/// Ingest one JSON or CSV frame and return the encoded output record.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `plant_engine_new`.
/// - `frame` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `plant_free_string`.
/// - Returns NULL on error; call `plant_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn plant_engine_ingest(
    engine: *mut PlantEngineHandle,
    frame: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &mut *engine;

    let frame = match cstr_to_string(frame) {
        Some(s) => s,
        None => {
            set_last_error("Invalid frame string pointer");
            return ptr::null_mut();
        }
    };

    let result = handle
        .engine
        .ingest_frame(adapter_for(&frame), &frame)
        .and_then(|output| handle.encoder.encode_to_json(&output));

    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Apply a species care profile given as JSON.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `plant_engine_new`.
/// - `profile_json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
#[no_mangle]
pub unsafe extern "C" fn plant_engine_apply_care_profile(
    engine: *mut PlantEngineHandle,
    profile_json: *const c_char,
) -> i32 {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return -1;
    }
    let handle = &mut *engine;

    let json = match cstr_to_string(profile_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid profile string pointer");
            return -1;
        }
    };

    match serde_json::from_str::<CareProfile>(&json) {
        Ok(profile) => {
            handle.engine.apply_care_profile(&profile);
            0
        }
        Err(e) => {
            set_last_error(&EngineError::from(e).to_string());
            -1
        }
    }
}

/// Replace the expected watering interval in days.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `plant_engine_new`.
/// - Returns 0 on success, non-zero when the pointer is NULL or the value is rejected.
#[no_mangle]
pub unsafe extern "C" fn plant_engine_set_benchmark_days(
    engine: *mut PlantEngineHandle,
    days: f64,
) -> i32 {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return -1;
    }
    let handle = &mut *engine;

    if handle.engine.set_benchmark_days(days) {
        0
    } else {
        set_last_error(&format!("benchmark days must be positive, got {days}"));
        -1
    }
}

/// Replace the clean-air gas baseline.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `plant_engine_new`.
/// - Returns 0 on success, non-zero when the pointer is NULL or the value is rejected.
#[no_mangle]
pub unsafe extern "C" fn plant_engine_set_gas_baseline(
    engine: *mut PlantEngineHandle,
    baseline: f64,
) -> i32 {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return -1;
    }
    let handle = &mut *engine;

    if handle.engine.set_gas_baseline(baseline) {
        0
    } else {
        set_last_error("gas baseline must be a finite number");
        -1
    }
}

/// Switch realtime publishing on (non-zero) or off (zero).
///
/// # Safety
/// - `engine` must be a valid pointer returned by `plant_engine_new`.
#[no_mangle]
pub unsafe extern "C" fn plant_engine_set_realtime(engine: *mut PlantEngineHandle, realtime: i32) {
    clear_last_error();
    if engine.is_null() {
        set_last_error("Null engine pointer");
        return;
    }
    (*engine).engine.set_realtime(realtime != 0);
}

/// Return the event log as a JSON array, oldest first.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `plant_engine_new`.
/// - Returns a newly allocated string that must be freed with `plant_free_string`.
#[no_mangle]
pub unsafe extern "C" fn plant_engine_events(engine: *const PlantEngineHandle) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &*engine;

    let events: Vec<_> = handle.engine.events().collect();
    match serde_json::to_string(&events) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Save learned engine state to JSON.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `plant_engine_new`.
/// - Returns a newly allocated string that must be freed with `plant_free_string`.
/// - Returns NULL on error; call `plant_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn plant_engine_save_state(engine: *const PlantEngineHandle) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &*engine;

    match handle.engine.save_state() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Load learned engine state from JSON.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `plant_engine_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
#[no_mangle]
pub unsafe extern "C" fn plant_engine_load_state(
    engine: *mut PlantEngineHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return -1;
    }
    let handle = &mut *engine;

    let json = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return -1;
        }
    };

    match handle.engine.load_state(&json) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Free a string returned by Plant Pulse functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Plant Pulse function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn plant_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

/// Get the last error message.
///
/// # Safety
/// - The returned pointer is valid until the next Plant Pulse call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn plant_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn plant_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

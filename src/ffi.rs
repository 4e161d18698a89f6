//! FFI bindings for Synheart Vision
//!
//! This module provides C-compatible functions for calling Vision from other languages.
//! All functions use C strings (null-terminated) and return allocated memory that
//! must be freed by the caller using `vision_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::VisionConfig;
use crate::emitter::CollectingSink;
use crate::error::ComputeError;
use crate::pipeline::{samples_to_metrics, VisionProcessor};
use crate::schema::FrameReader;
use crate::types::MetricEvent;

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

/// Join already-encoded JSON documents into a JSON array string
fn vec_to_json_array(vec: Vec<String>) -> String {
    format!("[{}]", vec.join(","))
}

/// Hand a result back across the boundary: a JSON array string or NULL
fn array_result(result: Result<Vec<String>, ComputeError>) -> *mut c_char {
    match result {
        Ok(lines) => string_to_cstr(&vec_to_json_array(lines)),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Run an NDJSON frame stream and return the emitted metric envelopes as a
/// JSON array.
///
/// # Safety
/// - `ndjson` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `vision_free_string`.
/// - Returns NULL on error; call `vision_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vision_samples_to_metrics(ndjson: *const c_char) -> *mut c_char {
    clear_last_error();

    let ndjson_str = match cstr_to_string(ndjson) {
        Some(s) => s,
        None => {
            set_last_error("Invalid NDJSON string pointer");
            return ptr::null_mut();
        }
    };

    array_result(samples_to_metrics(&ndjson_str))
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a VisionProcessor
pub struct VisionProcessorHandle {
    processor: VisionProcessor,
}

/// Create and start a VisionProcessor.
///
/// # Safety
/// - `config_json` must be a valid null-terminated C string, or NULL for the
///   default configuration.
/// - Returns a pointer to a newly allocated processor.
/// - Must be freed with `vision_processor_free`.
/// - Returns NULL on error; call `vision_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vision_processor_new(
    config_json: *const c_char,
) -> *mut VisionProcessorHandle {
    clear_last_error();

    let config = if config_json.is_null() {
        Ok(VisionConfig::default())
    } else {
        match cstr_to_string(config_json) {
            Some(json) => VisionConfig::from_json(&json),
            None => {
                set_last_error("Invalid config string pointer");
                return ptr::null_mut();
            }
        }
    };

    let processor = config
        .and_then(|config| VisionProcessor::new(config, Box::new(CollectingSink::new())))
        .and_then(|mut processor| processor.start().map(|_| processor));

    match processor {
        Ok(processor) => Box::into_raw(Box::new(VisionProcessorHandle { processor })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a VisionProcessor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `vision_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn vision_processor_free(processor: *mut VisionProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Push one frame record and return the metrics it produced.
///
/// Returns a JSON array of metric envelopes, possibly empty.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `vision_processor_new`.
/// - `record_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `vision_free_string`.
/// - Returns NULL on error; call `vision_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vision_processor_push(
    processor: *mut VisionProcessorHandle,
    record_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &mut *processor;

    let record_str = match cstr_to_string(record_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid record string pointer");
            return ptr::null_mut();
        }
    };

    let result = FrameReader::parse_line(&record_str, 1)
        .and_then(|record| handle.processor.process_record(record))
        .and_then(|_| handle.processor.drain_encoded());
    array_result(result)
}

/// Run the heart rate cadence at `now_ms` and return any reading produced.
///
/// Returns a JSON array holding zero or one metric envelope.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `vision_processor_new`.
/// - Returns a newly allocated string that must be freed with `vision_free_string`.
/// - Returns NULL on error; call `vision_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vision_processor_tick(
    processor: *mut VisionProcessorHandle,
    now_ms: f64,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &mut *processor;
    handle.processor.tick(now_ms);
    array_result(handle.processor.drain_encoded())
}

/// Read the current windowed attention metrics without recording them.
///
/// Returns a JSON array holding zero or one metric envelope; it is empty until
/// enough eye samples and fixations have been collected.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `vision_processor_new`.
/// - Returns a newly allocated string that must be freed with `vision_free_string`.
/// - Returns NULL on error; call `vision_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vision_processor_attention_snapshot(
    processor: *const VisionProcessorHandle,
    now_ms: f64,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;
    let result = handle
        .processor
        .attention()
        .current_metrics(now_ms)
        .map(|metrics| handle.processor.encoder().encode_to_json(MetricEvent::Attention(metrics)))
        .into_iter()
        .collect();
    array_result(result)
}

/// Clear all buffered state of a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `vision_processor_new`.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn vision_processor_reset(processor: *mut VisionProcessorHandle) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;
    handle.processor.reset();
    0
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Vision functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Vision function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn vision_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Vision function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn vision_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Vision library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn vision_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

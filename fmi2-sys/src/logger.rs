//! Forwards FMU logger callbacks into the [`log`] facade.
//!
//! The FMI logger callback is variadic, which stable Rust cannot define. A
//! small C shim (`logger.c`) formats the message with `vsnprintf` and hands
//! the result to [`callback_log`]. The `log` facade is thread-safe, so the
//! FMU may invoke the callback from any thread it creates.

use std::ffi::CStr;
use std::os::raw::c_int;

use crate::{fmi2ComponentEnvironment, fmi2String, fmi2Status};

fn cstr_or<'a>(ptr: fmi2String, fallback: &'a str) -> &'a str {
    if ptr.is_null() {
        fallback
    } else {
        unsafe { CStr::from_ptr(ptr) }.to_str().unwrap_or(fallback)
    }
}

/// Receives the formatted message from the C shim.
#[no_mangle]
extern "C" fn callback_log(
    _component_environment: fmi2ComponentEnvironment,
    instance_name: fmi2String,
    status: c_int,
    category: fmi2String,
    message: fmi2String,
) {
    let instance_name = cstr_or(instance_name, "unknown");
    let category = cstr_or(category, "");
    let message = cstr_or(message, "");

    let level = match status {
        s if s == fmi2Status::OK as c_int => log::Level::Info,
        s if s == fmi2Status::Warning as c_int => log::Level::Warn,
        s if s == fmi2Status::Discard as c_int => log::Level::Trace,
        _ => log::Level::Error,
    };

    log::logger().log(
        &log::Record::builder()
            .args(format_args!("[{category}] {message}"))
            .level(level)
            .module_path(Some(module_path!()))
            .target(instance_name)
            .build(),
    );
}

extern "C" {
    /// The variadic entry point installed as the FMU's logger callback.
    /// Implemented in `logger.c`; formats the message and calls
    /// [`callback_log`].
    pub fn callback_logger_handler(
        component_environment: fmi2ComponentEnvironment,
        instance_name: fmi2String,
        status: fmi2Status,
        category: fmi2String,
        message: fmi2String,
        ...
    );
}

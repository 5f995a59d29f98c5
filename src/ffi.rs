//! C FFI layer for the book build scripts.

use crate::config::{Dialect, RenderConfig};
use libc::{c_char, c_int};
use std::ffi::{CStr, CString};
use std::ptr;

/// Result type for FFI operations.
#[repr(C)]
pub struct Html2LatexResult {
    /// Pointer to the LaTeX output (caller must free with html2latex_free_string)
    pub data: *mut c_char,
    /// Error message if data is null (caller must free with html2latex_free_string)
    pub error: *mut c_char,
}

impl Html2LatexResult {
    fn ok(data: String) -> Self {
        match CString::new(data) {
            Ok(c_string) => Self {
                data: c_string.into_raw(),
                error: ptr::null_mut(),
            },
            Err(_) => Self::err("Output contains a NUL byte".to_string()),
        }
    }

    fn err(error: String) -> Self {
        let c_string = CString::new(error.replace('\0', " ")).unwrap_or_default();
        Self {
            data: ptr::null_mut(),
            error: c_string.into_raw(),
        }
    }
}

/// Read a C string argument as UTF-8.
///
/// # Safety
///
/// `s` must be null or a valid null-terminated string.
unsafe fn read_str<'a>(s: *const c_char, what: &str) -> Result<&'a str, Html2LatexResult> {
    if s.is_null() {
        return Err(Html2LatexResult::err(format!("Null {what} pointer")));
    }
    CStr::from_ptr(s)
        .to_str()
        .map_err(|_| Html2LatexResult::err(format!("Invalid UTF-8 {what}")))
}

fn run(input: &str, config: &RenderConfig) -> Html2LatexResult {
    match crate::render(input, Some(config)) {
        Ok(latex) => Html2LatexResult::ok(latex),
        Err(e) => Html2LatexResult::err(e.to_string()),
    }
}

/// Parse, normalize and render an XML document in one step.
///
/// `dialect`: 0 = CNXML+, 1 = HTML.
///
/// # Safety
///
/// - `input` must be a valid null-terminated UTF-8 string.
/// - The returned strings must be freed with `html2latex_free_string` or
///   `html2latex_free_result`.
#[no_mangle]
pub unsafe extern "C" fn html2latex_render(input: *const c_char, dialect: c_int) -> Html2LatexResult {
    let input = match read_str(input, "input") {
        Ok(s) => s,
        Err(e) => return e,
    };

    let dialect = match dialect {
        0 => Dialect::Cnxml,
        1 => Dialect::Html,
        other => return Html2LatexResult::err(format!("Unknown dialect: {other}")),
    };

    run(input, &RenderConfig::for_dialect(dialect))
}

/// Render with a TOML configuration. A null `config` uses the defaults.
///
/// # Safety
///
/// - `input` must be a valid null-terminated UTF-8 string.
/// - `config` must be null or a valid null-terminated UTF-8 string.
/// - The returned strings must be freed with `html2latex_free_string` or
///   `html2latex_free_result`.
#[no_mangle]
pub unsafe extern "C" fn html2latex_render_with_config(
    input: *const c_char,
    config: *const c_char,
) -> Html2LatexResult {
    let input = match read_str(input, "input") {
        Ok(s) => s,
        Err(e) => return e,
    };

    let config = if config.is_null() {
        RenderConfig::default()
    } else {
        let toml = match read_str(config, "config") {
            Ok(s) => s,
            Err(e) => return e,
        };
        match RenderConfig::from_toml(toml) {
            Ok(c) => c,
            Err(e) => return Html2LatexResult::err(format!("Configuration error: {e}")),
        }
    };

    run(input, &config)
}

/// Free a string returned by html2latex functions.
///
/// # Safety
///
/// - `s` must be a pointer returned by a html2latex function, or null.
#[no_mangle]
pub unsafe extern "C" fn html2latex_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Free both strings of a result struct.
///
/// # Safety
///
/// - `result` must be a valid Html2LatexResult.
#[no_mangle]
pub unsafe extern "C" fn html2latex_free_result(result: Html2LatexResult) {
    html2latex_free_string(result.data);
    html2latex_free_string(result.error);
}

/// Get the library version.
///
/// # Safety
///
/// The returned string is static and must not be freed.
#[no_mangle]
pub extern "C" fn html2latex_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

// Generate C header content for documentation
/// ```c
/// // html2latex.h
/// #ifndef HTML2LATEX_H
/// #define HTML2LATEX_H
///
/// typedef struct {
///     char* data;
///     char* error;
/// } Html2LatexResult;
///
/// // dialect: 0 = CNXML+, 1 = HTML
/// Html2LatexResult html2latex_render(const char* input, int dialect);
/// Html2LatexResult html2latex_render_with_config(const char* input, const char* config_toml);
/// void html2latex_free_string(char* s);
/// void html2latex_free_result(Html2LatexResult result);
/// const char* html2latex_version(void);
///
/// #endif
/// ```
const _: () = ();

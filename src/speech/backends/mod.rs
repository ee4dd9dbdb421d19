//! Concrete synthesis backends
//!
//! Local engines are executables spawned once per chunk; remote engines are
//! HTTP services reached through a blocking client with [`REQUEST_TIMEOUT`].

pub mod espeak;
pub mod festival;
pub mod marytts;
pub mod mimic;
pub mod pico;
pub mod voicerss;

use crate::{Result, TtsError};
use log::{debug, error};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::process::{Command, Output, Stdio};
use std::time::Duration;

/// Upper bound on one remote request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Parse a backend's options out of its configuration section
///
/// Keys the backend doesn't know (`lang`, `voice`, `effects`) are ignored.
pub(crate) fn options<T: DeserializeOwned>(module: &str, section: &Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(section.clone()))
        .map_err(|e| TtsError::Config(format!("Invalid {} configuration: {}", module, e)))
}

/// Run a synthesis command to completion, failing on a non-zero exit
pub(crate) fn run(command: &mut Command) -> Result<Output> {
    let program = command.get_program().to_string_lossy().into_owned();
    debug!("Running {:?}", command);

    let output = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| {
            error!("Failed to spawn {}: {}", program, e);
            TtsError::Backend(format!("Failed to start {}: {}", program, e))
        })?;

    check_exit(&program, output)
}

pub(crate) fn check_exit(program: &str, output: Output) -> Result<Output> {
    if output.status.success() {
        return Ok(output);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    error!("{} exited with {}: {}", program, output.status, stderr.trim());
    Err(TtsError::Backend(format!(
        "{} exited with {}: {}",
        program,
        output.status,
        stderr.trim()
    )))
}

/// Blocking HTTP client giving up on a request after `timeout`
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| TtsError::Backend(format!("Failed to build HTTP client: {}", e)))
}

/// Fail on anything but 200 OK
pub(crate) fn check_status(
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response> {
    let status = response.status();
    if status == reqwest::StatusCode::OK {
        return Ok(response);
    }
    error!("{} Http Error for url: {}", status, response.url());
    Err(TtsError::Backend(format!(
        "{} Http Error for url: {}",
        status,
        response.url()
    )))
}

/// Strip a trailing slash so paths can be appended
pub(crate) fn base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

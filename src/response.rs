//! Typed view of the JSON documents printed by the array management CLI.
//!
//! Every CLI answer is parsed exactly once, here, into a [`Response`]. The
//! rest of the harness only looks at typed fields. Two envelope layouts are
//! accepted: the bare document (`{"command": ..., "result": {...}}`) and the
//! older wrapped one (`{"Request": {...}, "Response": {...}}`).

use log::trace;
use serde::Deserialize;
use serde_json::Value;
use strum_macros::{Display, IntoStaticStr};

use arraycheck_api::error::{HarnessError, InvocationError, ReportError};

/// A parsed CLI answer. Immutable once parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// The document exactly as printed by the CLI.
    pub raw_text: String,
    /// Name of the command the CLI reports having run, if any.
    pub command: Option<String>,
    /// Zero on success, otherwise a product specific failure code.
    pub code: i64,
    pub description: String,
    /// Operation specific payload, `Value::Null` when absent.
    pub data: Value,
}

#[derive(Deserialize)]
struct Body {
    #[serde(default)]
    command: Option<String>,
    result: ResultBody,
}

#[derive(Deserialize)]
struct ResultBody {
    status: Status,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
struct Status {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    description: String,
}

impl Response {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// Parses a CLI answer. `operation` is only used to label errors.
pub fn parse(operation: &'static str, raw_text: &str) -> Result<Response, HarnessError> {
    let malformed = |reason: String| InvocationError::MalformedResponse { operation, reason };

    let document: Value = serde_json::from_str(raw_text.trim()).structured(malformed(
        "output is not a JSON document".into(),
    ))?;
    let body = document.get("Response").unwrap_or(&document);
    let body = Body::deserialize(body).structured(malformed(
        "missing 'result.status' section".into(),
    ))?;
    let code = body
        .result
        .status
        .code
        .structured(malformed("missing 'result.status.code'".into()))?;

    trace!("Parsed '{operation}' response with code {code}");
    Ok(Response {
        raw_text: raw_text.to_string(),
        command: body.command,
        code,
        description: body.result.status.description,
        data: body.result.data,
    })
}

/// Extracts the response code from a raw CLI answer.
pub fn get_response_code(detail: &str) -> Result<i64, HarnessError> {
    parse("response-code", detail).map(|response| response.code)
}

/// Whether a raw CLI answer describes an online array. Anything that is not
/// clearly online, including unparsable text and failed queries, counts as not
/// online.
pub fn is_online(detail: &str) -> bool {
    match parse("array-state", detail) {
        Ok(response) => {
            response.is_success() && ArrayState::from_data(&response.data) == ArrayState::Online
        }
        Err(_) => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ArrayState {
    Online,
    Offline,
    Degraded,
    Unknown,
}

impl ArrayState {
    /// Reads the `state` field of an array info payload, case insensitive. An
    /// online array whose `situation` is degraded is reported as degraded.
    pub fn from_data(data: &Value) -> Self {
        let field = |key: &str| {
            data.get(key)
                .and_then(Value::as_str)
                .map(|value| value.trim().to_ascii_lowercase())
        };

        match field("state").as_deref() {
            Some("online") => match field("situation").as_deref() {
                Some("degraded") => ArrayState::Degraded,
                _ => ArrayState::Online,
            },
            Some("offline") => ArrayState::Offline,
            Some("degraded") => ArrayState::Degraded,
            _ => ArrayState::Unknown,
        }
    }
}

/// Current state of one array, always fetched fresh from the CLI.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayInfo {
    pub name: String,
    pub state: ArrayState,
    pub raw: String,
}

impl ArrayInfo {
    pub fn from_response(name: &str, response: &Response) -> Self {
        let state = if response.is_success() {
            ArrayState::from_data(&response.data)
        } else {
            ArrayState::Unknown
        };

        ArrayInfo {
            name: response
                .data
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or(name)
                .to_string(),
            state,
            raw: response.raw_text.clone(),
        }
    }
}

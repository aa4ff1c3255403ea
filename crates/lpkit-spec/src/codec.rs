//! Text boundary: JSON decode/encode and the infinity convention.
//!
//! Infinite bounds travel as `±1.7976931348623157e308`, the largest finite
//! double. Anything at or beyond that magnitude decodes to an infinity, and
//! infinities are clamped back on the way out.

use serde::Serialize;
use serde_json::Value;

use crate::error::SpecError;

pub fn decode(text: &str) -> Result<Value, SpecError> {
    serde_json::from_str(text).map_err(|e| SpecError::Parse {
        message: e.to_string(),
        line: e.line(),
        column: e.column(),
    })
}

pub fn encode<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String, SpecError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    text.map_err(|e| SpecError::Encode(e.to_string()))
}

/// Read a wire number, see [`widen`].
pub fn to_f64(value: &Value) -> Option<f64> {
    value.as_f64().map(widen)
}

/// Map `|x| >= f64::MAX` to the matching infinity.
pub fn widen(x: f64) -> f64 {
    if x >= f64::MAX {
        f64::INFINITY
    } else if x <= f64::MIN {
        f64::NEG_INFINITY
    } else {
        x
    }
}

/// Inverse of [`widen`] for output. NaN stays NaN and encodes as `null`.
pub fn clamp(x: f64) -> f64 {
    if x == f64::INFINITY {
        f64::MAX
    } else if x == f64::NEG_INFINITY {
        f64::MIN
    } else {
        x
    }
}

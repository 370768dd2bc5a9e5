//! Response rounding
//!
//! Analytics results keep full precision; only the serialised response is
//! rounded, so repeated requests over the same records return the same bytes.

use serde::Serialize;
use serde_json::{Number, Value};

use crate::error::{AppError, AppResult};

fn round(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}

/// Round every float in a JSON tree in place; integers are left alone
pub fn round_floats(value: &mut Value, decimals: u32) {
    match value {
        Value::Number(n) if n.is_f64() => {
            if let Some(rounded) = n.as_f64().and_then(|f| Number::from_f64(round(f, decimals))) {
                *n = rounded;
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|v| round_floats(v, decimals)),
        Value::Object(map) => map.values_mut().for_each(|v| round_floats(v, decimals)),
        _ => {}
    }
}

/// Serialise a result and round it for display
pub fn present<T: Serialize>(result: &T, decimals: u32) -> AppResult<Value> {
    let mut value = serde_json::to_value(result)
        .map_err(|e| AppError::Internal(format!("Failed to serialise result: {}", e)))?;
    round_floats(&mut value, decimals);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rounds_nested_floats() {
        let mut value = json!({
            "cpue": 16.123456789,
            "recordCount": 2,
            "bins": [{ "mid": 12.500049 }, { "mid": 2.0 }],
            "label": "x"
        });
        round_floats(&mut value, 4);
        assert_eq!(value["cpue"], json!(16.1235));
        assert_eq!(value["recordCount"], json!(2));
        assert_eq!(value["bins"][0]["mid"], json!(12.5));
        assert_eq!(value["label"], json!("x"));
    }

    #[test]
    fn test_present_is_idempotent() {
        #[derive(Serialize)]
        struct Sample {
            value: f64,
            missing: Option<f64>,
        }
        let sample = Sample {
            value: 1.0 / 3.0,
            missing: None,
        };
        let once = present(&sample, 4).unwrap();
        let mut twice = once.clone();
        round_floats(&mut twice, 4);
        assert_eq!(once, twice);
        assert_eq!(once["value"], json!(0.3333));
        assert!(once["missing"].is_null());
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframes, parameter values and value interpolation.

use crate::easing::{apply_easing, Easing};
use crate::ids::{IdGenerator, KeyframeId};
use serde::{Deserialize, Serialize};

/// A leaf value in the parameter tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Numeric value
    Number(f64),
    /// Text value; `#rgb` / `#rrggbb` strings interpolate as colors
    Text(String),
    /// Boolean flag
    Bool(bool),
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Number(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<ParamValue> for serde_json::Value {
    fn from(value: ParamValue) -> Self {
        match value {
            ParamValue::Number(v) => serde_json::Number::from_f64(v)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            ParamValue::Text(v) => serde_json::Value::String(v),
            ParamValue::Bool(v) => serde_json::Value::Bool(v),
        }
    }
}

/// One animation control point on a parameter path.
///
/// `time` is relative to the start of the owning sequence. `easing` shapes
/// the segment that runs from this keyframe to the next one on the same path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keyframe {
    /// Unique keyframe ID
    pub id: KeyframeId,
    /// Time in seconds, sequence-local
    pub time: f64,
    /// Dot-separated address into the parameter tree
    pub path: String,
    /// Value at this keyframe
    pub value: ParamValue,
    /// Easing of the outgoing segment
    #[serde(default)]
    pub easing: Easing,
}

impl Keyframe {
    /// Create a new linear keyframe
    pub fn new(
        ids: &mut impl IdGenerator,
        time: f64,
        path: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Self {
        Self {
            id: KeyframeId::generate(ids),
            time,
            path: path.into(),
            value: value.into(),
            easing: Easing::Linear,
        }
    }

    /// Set the easing
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

/// Interpolate between two parameter values at progress `t`.
///
/// Numbers blend linearly and hex colors blend per channel. Everything else
/// (text, booleans, mismatched kinds) snaps from `a` to `b` at `t = 0.5`.
pub fn interpolate_value(a: &ParamValue, b: &ParamValue, t: f64) -> ParamValue {
    match (a, b) {
        (ParamValue::Number(a), ParamValue::Number(b)) => ParamValue::Number(a + (b - a) * t),
        (ParamValue::Text(ta), ParamValue::Text(tb)) => {
            match (parse_hex_color(ta), parse_hex_color(tb)) {
                (Some(ca), Some(cb)) => ParamValue::Text(format_hex_color(lerp_rgb(ca, cb, t))),
                _ => snap(a, b, t),
            }
        }
        _ => snap(a, b, t),
    }
}

fn snap(a: &ParamValue, b: &ParamValue, t: f64) -> ParamValue {
    if t < 0.5 {
        a.clone()
    } else {
        b.clone()
    }
}

fn lerp_rgb(a: [u8; 3], b: [u8; 3], t: f64) -> [u8; 3] {
    let mut out = [0u8; 3];
    for (channel, (ca, cb)) in out.iter_mut().zip(a.iter().zip(b.iter())) {
        let (ca, cb) = (f64::from(*ca), f64::from(*cb));
        let blended = (ca + (cb - ca) * t).round();
        *channel = if blended.is_nan() { 0 } else { blended.clamp(0.0, 255.0) as u8 };
    }
    out
}

/// Parse `#rgb` or `#rrggbb` into channel bytes
pub fn parse_hex_color(text: &str) -> Option<[u8; 3]> {
    let digits = text.strip_prefix('#')?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    match digits.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (slot, c) in rgb.iter_mut().zip(digits.chars()) {
                let v = c.to_digit(16)? as u8;
                *slot = v * 17;
            }
            Some(rgb)
        }
        6 => {
            let mut rgb = [0u8; 3];
            for (i, slot) in rgb.iter_mut().enumerate() {
                *slot = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16).ok()?;
            }
            Some(rgb)
        }
        _ => None,
    }
}

/// Format channel bytes as lowercase `#rrggbb`
pub fn format_hex_color(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

/// Evaluate one path's keyframes at sequence-local time `time`.
///
/// `keyframes` must all target the same path. Before the first keyframe the
/// first value holds, after the last the last value holds. Keyframes sharing a
/// time collapse to the one declared last. Returns `None` only for an empty
/// slice.
pub fn evaluate_keyframes(keyframes: &[&Keyframe], time: f64) -> Option<ParamValue> {
    let ordered = ordered_keyframes(keyframes);
    let first = ordered.first()?;
    let last = ordered.last()?;

    if time <= first.time {
        return Some(first.value.clone());
    }
    if time >= last.time {
        return Some(last.value.clone());
    }

    // first.time < time < last.time, so a bracketing pair exists
    let next_idx = ordered.iter().position(|k| k.time >= time)?;
    let a = ordered[next_idx - 1];
    let b = ordered[next_idx];
    let span = b.time - a.time;
    let raw = if span > 0.0 { (time - a.time) / span } else { 0.0 };
    let eased = apply_easing(&a.easing, raw);
    Some(interpolate_value(&a.value, &b.value, eased))
}

/// Stable sort by time, then keep only the last-declared keyframe per time
fn ordered_keyframes<'a>(keyframes: &[&'a Keyframe]) -> Vec<&'a Keyframe> {
    let mut sorted: Vec<&Keyframe> = keyframes.to_vec();
    sorted.sort_by(|a, b| a.time.total_cmp(&b.time));

    let mut ordered: Vec<&Keyframe> = Vec::with_capacity(sorted.len());
    for keyframe in sorted {
        match ordered.last_mut() {
            Some(previous) if previous.time == keyframe.time => *previous = keyframe,
            _ => ordered.push(keyframe),
        }
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;

    fn kf(ids: &mut SequentialIds, time: f64, value: impl Into<ParamValue>) -> Keyframe {
        Keyframe::new(ids, time, "a.b", value)
    }

    #[test]
    fn test_number_lerp() {
        let v = interpolate_value(&2.0.into(), &4.0.into(), 0.25);
        assert_eq!(v, ParamValue::Number(2.5));
    }

    #[test]
    fn test_hex_color_interpolation() {
        let black = ParamValue::from("#000000");
        let white = ParamValue::from("#ffffff");
        assert_eq!(interpolate_value(&black, &white, 0.0), ParamValue::from("#000000"));
        assert_eq!(interpolate_value(&black, &white, 1.0), ParamValue::from("#ffffff"));
        assert_eq!(interpolate_value(&black, &white, 0.5), ParamValue::from("#808080"));
    }

    #[test]
    fn test_short_hex_colors_blend() {
        let v = interpolate_value(&"#f00".into(), &"#00F".into(), 0.5);
        assert_eq!(v, ParamValue::from("#800080"));
    }

    #[test]
    fn test_overshoot_is_clamped() {
        let v = interpolate_value(&"#000000".into(), &"#ffffff".into(), 1.5);
        assert_eq!(v, ParamValue::from("#ffffff"));
        let v = interpolate_value(&"#101010".into(), &"#ffffff".into(), -1.0);
        assert_eq!(v, ParamValue::from("#000000"));
    }

    #[test]
    fn test_discrete_snap() {
        let a = ParamValue::from("hello");
        let b = ParamValue::from("world");
        assert_eq!(interpolate_value(&a, &b, 0.49), a);
        assert_eq!(interpolate_value(&a, &b, 0.5), b);

        assert_eq!(interpolate_value(&true.into(), &false.into(), 0.2), ParamValue::Bool(true));
        // Mismatched kinds snap as well
        assert_eq!(interpolate_value(&1.0.into(), &"#ffffff".into(), 0.7), ParamValue::from("#ffffff"));
        assert_eq!(interpolate_value(&"#000000".into(), &"red".into(), 0.2), ParamValue::from("#000000"));
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#abc"), Some([0xaa, 0xbb, 0xcc]));
        assert_eq!(parse_hex_color("#A0B1C2"), Some([0xa0, 0xb1, 0xc2]));
        assert_eq!(parse_hex_color("abc"), None);
        assert_eq!(parse_hex_color("#abcd"), None);
        assert_eq!(parse_hex_color("#ggg"), None);
        assert_eq!(parse_hex_color("#+1+2+3"), None);
    }

    #[test]
    fn test_single_keyframe_holds_everywhere() {
        let mut ids = SequentialIds::new();
        let only = kf(&mut ids, 3.0, 7.0);
        for time in [-1000.0, -1.0, 0.0, 3.0, 5.0, 1e9] {
            assert_eq!(evaluate_keyframes(&[&only], time), Some(ParamValue::Number(7.0)));
        }
    }

    #[test]
    fn test_linear_midpoint() {
        let mut ids = SequentialIds::new();
        let a = kf(&mut ids, 0.0, 0.0);
        let b = kf(&mut ids, 10.0, 1.0);
        assert_eq!(evaluate_keyframes(&[&a, &b], 5.0), Some(ParamValue::Number(0.5)));
    }

    #[test]
    fn test_unsorted_input_and_clamping() {
        let mut ids = SequentialIds::new();
        let late = kf(&mut ids, 4.0, 40.0);
        let early = kf(&mut ids, 2.0, 20.0);
        assert_eq!(evaluate_keyframes(&[&late, &early], 3.0), Some(ParamValue::Number(30.0)));
        assert_eq!(evaluate_keyframes(&[&late, &early], 0.0), Some(ParamValue::Number(20.0)));
        assert_eq!(evaluate_keyframes(&[&late, &early], 9.0), Some(ParamValue::Number(40.0)));
    }

    #[test]
    fn test_easing_of_earlier_keyframe_shapes_segment() {
        let mut ids = SequentialIds::new();
        let a = kf(&mut ids, 0.0, 0.0).with_easing(Easing::EaseIn);
        let b = kf(&mut ids, 1.0, 1.0).with_easing(Easing::EaseOut);
        assert_eq!(evaluate_keyframes(&[&a, &b], 0.5), Some(ParamValue::Number(0.25)));
    }

    #[test]
    fn test_duplicate_times_last_declared_wins() {
        let mut ids = SequentialIds::new();
        let start = kf(&mut ids, 0.0, 0.0);
        let first = kf(&mut ids, 5.0, 100.0);
        let second = kf(&mut ids, 5.0, 10.0);
        let keys = [&start, &first, &second];
        assert_eq!(evaluate_keyframes(&keys, 5.0), Some(ParamValue::Number(10.0)));
        assert_eq!(evaluate_keyframes(&keys, 2.5), Some(ParamValue::Number(5.0)));
        assert_eq!(evaluate_keyframes(&keys, 8.0), Some(ParamValue::Number(10.0)));
    }

    #[test]
    fn test_empty_keyframes() {
        assert_eq!(evaluate_keyframes(&[], 1.0), None);
    }
}

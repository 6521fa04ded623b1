//! Formatting of layer parameters as Python keyword arguments.
//!
//! Three policies are available. `Legacy` reproduces the shape rules the
//! service has always used on string and number values: a comma makes a
//! tuple, any digit makes the value unquoted, anything else is quoted.
//! `Strict` applies the same rules but refuses values the digit rule would
//! misclassify, such as `relu6`. `Typed` ignores the text shape and formats
//! every value from the JSON kind recorded at parse time.
//!
//! Booleans, nulls and arrays never went through the text rules, so every
//! policy formats them from their kind: `False`, `None`, `(784,)`.

use serde::{Deserialize, Serialize};
use tracing::warn;

use kerasgen_core::{ConfigValue, ValueKind};

use crate::error::{GenerateError, GenerateResult};

/// How raw parameter literals are turned into Python expressions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiteralPolicy {
    /// Comma → tuple, digit → unquoted, otherwise quoted.
    #[default]
    Legacy,
    /// Like `Legacy`, but ambiguous values are an error.
    Strict,
    /// Format from the recorded value kind.
    Typed,
}

impl std::str::FromStr for LiteralPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "legacy" => Ok(Self::Legacy),
            "strict" => Ok(Self::Strict),
            "typed" => Ok(Self::Typed),
            _ => Err(format!("Unknown literal policy: {}", s)),
        }
    }
}

impl std::fmt::Display for LiteralPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Legacy => "legacy",
            Self::Strict => "strict",
            Self::Typed => "typed",
        };
        f.write_str(name)
    }
}

impl LiteralPolicy {
    /// Format one `param=value` argument of `layer`.
    pub fn format_argument(
        &self,
        layer: &str,
        param: &str,
        value: &ConfigValue,
    ) -> GenerateResult<String> {
        if matches!(value.kind, ValueKind::Keyword | ValueKind::Tuple(_)) {
            return Ok(format!("{}={}", param, typed_literal(value)));
        }

        match self {
            Self::Legacy => {
                if is_ambiguous(&value.raw) {
                    warn!(
                        layer,
                        param,
                        value = %value.raw,
                        "Literal contains a digit but is not a number; emitting unquoted"
                    );
                }
                Ok(format_by_shape(param, &value.raw))
            }
            Self::Strict => {
                if is_ambiguous(&value.raw) {
                    return Err(GenerateError::FormattingAmbiguity {
                        layer: layer.to_string(),
                        param: param.to_string(),
                        value: value.raw.clone(),
                    });
                }
                Ok(format_by_shape(param, &value.raw))
            }
            Self::Typed => Ok(format!("{}={}", param, typed_literal(value))),
        }
    }
}

/// Shape rules applied to the raw text.
fn format_by_shape(param: &str, raw: &str) -> String {
    if raw.contains(',') {
        format!("{}=({})", param, raw)
    } else if has_digit(raw) {
        format!("{}={}", param, raw)
    } else {
        format!("{}=\"{}\"", param, raw)
    }
}

fn has_digit(raw: &str) -> bool {
    raw.bytes().any(|b| b.is_ascii_digit())
}

/// True when the digit rule applies but the text is not a number.
pub fn is_ambiguous(raw: &str) -> bool {
    !raw.contains(',') && has_digit(raw) && raw.trim().parse::<f64>().is_err()
}

fn typed_literal(value: &ConfigValue) -> String {
    match &value.kind {
        ValueKind::Numeric | ValueKind::Keyword => value.raw.clone(),
        ValueKind::Text => python_string(&value.raw),
        ValueKind::Tuple(items) if items.len() == 1 => {
            format!("({},)", typed_literal(&items[0]))
        }
        ValueKind::Tuple(items) => {
            let inner = items
                .iter()
                .map(typed_literal)
                .collect::<Vec<_>>()
                .join(", ");
            format!("({})", inner)
        }
    }
}

/// Double-quoted Python string literal.
pub(crate) fn python_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy(param: &str, raw: &str) -> String {
        LiteralPolicy::Legacy
            .format_argument("l", param, &ConfigValue::text(raw))
            .unwrap()
    }

    #[test]
    fn test_legacy_quotes_plain_text() {
        assert_eq!(legacy("activation", "softmax"), r#"activation="softmax""#);
        assert_eq!(legacy("padding", ""), r#"padding="""#);
    }

    #[test]
    fn test_legacy_parenthesizes_commas() {
        assert_eq!(legacy("kernel_size", "3,3"), "kernel_size=(3,3)");
        assert_eq!(legacy("shape", "784,"), "shape=(784,)");
        assert_eq!(legacy("axes", "a,b"), "axes=(a,b)");
    }

    #[test]
    fn test_legacy_leaves_digits_unquoted() {
        assert_eq!(legacy("units", "64"), "units=64");
        assert_eq!(legacy("rate", "0.5"), "rate=0.5");
        assert_eq!(legacy("activation", "relu6"), "activation=relu6");
    }

    #[test]
    fn test_strict_rejects_ambiguous() {
        let err = LiteralPolicy::Strict
            .format_argument("h1", "activation", &ConfigValue::text("relu6"))
            .unwrap_err();
        assert_eq!(
            err,
            GenerateError::FormattingAmbiguity {
                layer: "h1".to_string(),
                param: "activation".to_string(),
                value: "relu6".to_string(),
            }
        );

        let ok = LiteralPolicy::Strict
            .format_argument("h1", "rate", &ConfigValue::text("1e-3"))
            .unwrap();
        assert_eq!(ok, "rate=1e-3");
    }

    #[test]
    fn test_legacy_formats_json_kinds() {
        let policy = LiteralPolicy::Legacy;
        let use_bias = ConfigValue::from_json(&serde_json::json!(false)).unwrap();
        assert_eq!(
            policy.format_argument("h", "use_bias", &use_bias).unwrap(),
            "use_bias=False"
        );

        let initializer = ConfigValue::from_json(&serde_json::json!(null)).unwrap();
        assert_eq!(
            policy.format_argument("h", "bias_initializer", &initializer).unwrap(),
            "bias_initializer=None"
        );

        let shape = ConfigValue::from_json(&serde_json::json!([784])).unwrap();
        assert_eq!(policy.format_argument("x", "shape", &shape).unwrap(), "shape=(784,)");

        let kernel = ConfigValue::from_json(&serde_json::json!([3, 3])).unwrap();
        assert_eq!(
            policy.format_argument("c", "kernel_size", &kernel).unwrap(),
            "kernel_size=(3, 3)"
        );

        let units = ConfigValue::from_json(&serde_json::json!(8)).unwrap();
        assert_eq!(policy.format_argument("h", "units", &units).unwrap(), "units=8");
    }

    #[test]
    fn test_strict_accepts_json_kinds() {
        let value = ConfigValue::from_json(&serde_json::json!(["same", 2])).unwrap();
        assert_eq!(
            LiteralPolicy::Strict
                .format_argument("c", "padding", &value)
                .unwrap(),
            r#"padding=("same", 2)"#
        );
    }

    #[test]
    fn test_is_ambiguous() {
        assert!(is_ambiguous("relu6"));
        assert!(is_ambiguous("2x"));
        assert!(!is_ambiguous("64"));
        assert!(!is_ambiguous(" -0.25 "));
        assert!(!is_ambiguous("3,3"));
        assert!(!is_ambiguous("same"));
    }

    #[test]
    fn test_typed_formats_from_kind() {
        let policy = LiteralPolicy::Typed;
        let text = ConfigValue::text("relu6");
        assert_eq!(
            policy.format_argument("l", "activation", &text).unwrap(),
            r#"activation="relu6""#
        );

        let number = ConfigValue::numeric("64");
        assert_eq!(policy.format_argument("l", "units", &number).unwrap(), "units=64");

        let kernel = ConfigValue::tuple(vec![ConfigValue::numeric("3"), ConfigValue::numeric("3")]);
        assert_eq!(
            policy.format_argument("l", "kernel_size", &kernel).unwrap(),
            "kernel_size=(3, 3)"
        );

        let shape = ConfigValue::tuple(vec![ConfigValue::numeric("784")]);
        assert_eq!(policy.format_argument("l", "shape", &shape).unwrap(), "shape=(784,)");
    }

    #[test]
    fn test_typed_escapes_strings() {
        let value = ConfigValue::text(r#"say "hi"\"#);
        assert_eq!(
            LiteralPolicy::Typed.format_argument("l", "name", &value).unwrap(),
            r#"name="say \"hi\"\\""#
        );
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("Legacy".parse::<LiteralPolicy>().unwrap(), LiteralPolicy::Legacy);
        assert_eq!("typed".parse::<LiteralPolicy>().unwrap(), LiteralPolicy::Typed);
        assert!("loose".parse::<LiteralPolicy>().is_err());
        assert_eq!(LiteralPolicy::Strict.to_string(), "strict");
    }
}

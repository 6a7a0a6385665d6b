use std::{collections::BTreeMap, fmt};

/// A value produced by the literal evaluator
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Self)>) -> Self {
        Self::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// String conversion as done by `+` concatenation and `Array.prototype.join`
    pub fn to_js_string(&self) -> String {
        match self {
            Self::Undefined => "undefined".to_string(),
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::String(s) => s.clone(),
            Self::Array(items) => items
                .iter()
                .map(|item| match item {
                    Self::Undefined | Self::Null => String::new(),
                    other => other.to_js_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            Self::Object(_) => "[object Object]".to_string(),
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            Self::Undefined | Self::Object(_) => f64::NAN,
            Self::Null => 0.0,
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Number(n) => *n,
            Self::String(s) => parse_numeric_string(s),
            Self::Array(_) => parse_numeric_string(&self.to_js_string()),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            Self::Array(_) | Self::Object(_) => true,
        }
    }

    /// Whether evaluation produced something worth printing
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Undefined) || matches!(self, Self::String(s) if s.is_empty())
    }

    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            Self::Array(items) if items.is_empty() => f.write_str("[]"),
            Self::Array(items) => {
                f.write_str("[ ")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.fmt_nested(f)?;
                }
                f.write_str(" ]")
            }
            Self::Object(entries) if entries.is_empty() => f.write_str("{}"),
            Self::Object(entries) => {
                f.write_str("{ ")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: ")?;
                    value.fmt_nested(f)?;
                }
                f.write_str(" }")
            }
            other => f.write_str(&other.to_js_string()),
        }
    }
}

/// Prints the value the way `console.log` would: top level strings bare, everything nested quoted
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            other => other.fmt_nested(f),
        }
    }
}

pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{sign}Infinity")
    } else if n == 0.0 {
        "0".to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        // JS always signs the exponent: `1e+21`, `1e-7`
        let exponential = format!("{n:e}");
        match exponential.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            }
            _ => exponential,
        }
    } else {
        n.to_string()
    }
}

fn parse_numeric_string(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }

    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        #[allow(clippy::cast_precision_loss)]
        return u64::from_str_radix(hex, 16).map_or(f64::NAN, |n| n as f64);
    }

    match s {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        // Rust accepts spellings like `inf` and `nan` that JS does not
        _ if s.chars().any(|c| c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E')) => f64::NAN,
        _ => s.parse().unwrap_or(f64::NAN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_log_formatting() {
        assert_eq!(Value::String("https://x.com/a.m3u8".into()).to_string(), "https://x.com/a.m3u8");
        assert_eq!(Value::Number(42.0).to_string(), "42");
        assert_eq!(Value::Number(0.5).to_string(), "0.5");
        assert_eq!(Value::Number(-0.0).to_string(), "0");
        assert_eq!(Value::Number(1e20).to_string(), "100000000000000000000");
        assert_eq!(Value::Number(1e21).to_string(), "1e+21");
        assert_eq!(Value::Number(-2.5e30).to_string(), "-2.5e+30");
        assert_eq!(Value::Number(0.000_001).to_string(), "0.000001");
        assert_eq!(Value::Number(1e-7).to_string(), "1e-7");
        assert_eq!(Value::Number(1.5e-7).to_string(), "1.5e-7");
        assert_eq!(Value::Array(vec![]).to_string(), "[]");
        assert_eq!(
            Value::Array(vec![
                Value::String("a".into()),
                Value::Number(1.0),
                Value::Array(vec![Value::Null]),
            ])
            .to_string(),
            "[ 'a', 1, [ null ] ]"
        );
        assert_eq!(
            Value::object([("href", Value::String(String::new()))]).to_string(),
            "{ href: '' }"
        );
    }

    #[test]
    fn string_conversion() {
        let array = Value::Array(vec![
            Value::Number(1.0),
            Value::Undefined,
            Value::String("b".into()),
        ]);
        assert_eq!(array.to_js_string(), "1,,b");
        assert_eq!(Value::object::<String>([]).to_js_string(), "[object Object]");
    }

    #[test]
    fn number_conversion() {
        assert_eq!(Value::String(" 12 ".into()).to_number(), 12.0);
        assert_eq!(Value::String("0x10".into()).to_number(), 16.0);
        assert_eq!(Value::String(String::new()).to_number(), 0.0);
        assert_eq!(Value::Bool(true).to_number(), 1.0);
        assert!(Value::String("inf".into()).to_number().is_nan());
        assert!(Value::Undefined.to_number().is_nan());
    }
}

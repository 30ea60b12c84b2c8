//! C++ literals found in field defaults

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    /// Wide enough for every `int64_t` and `uint64_t` value
    Int(i128),
    /// `text` is the literal without its suffix, e.g. `0.10` for `0.10f`
    Float { value: f64, text: String },
    Str(String),
    Null,
    /// A possibly qualified identifier, e.g. `BlendMode::ADD`
    Name(Vec<String>),
}

fn name_regex() -> &'static Regex {
    static NAME: OnceLock<Regex> = OnceLock::new();
    NAME.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(::[A-Za-z_][A-Za-z0-9_]*)*$").unwrap())
}

fn float_regex() -> &'static Regex {
    static FLOAT: OnceLock<Regex> = OnceLock::new();
    FLOAT.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?[fFlL]?$").unwrap()
    })
}

fn int_regex() -> &'static Regex {
    static INT: OnceLock<Regex> = OnceLock::new();
    INT.get_or_init(|| Regex::new(r"^([+-]?)(0[xX][0-9a-fA-F]+|\d+)[uUlL]*$").unwrap())
}

impl Literal {
    /// Classify literal text; `None` when it is an expression rather than a literal
    pub fn parse(text: &str) -> Option<Literal> {
        let text = text.trim();
        match text {
            "true" => return Some(Literal::Bool(true)),
            "false" => return Some(Literal::Bool(false)),
            "nullptr" | "NULL" => return Some(Literal::Null),
            _ => {}
        }

        if let Some(inner) = text.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
            if !inner.contains('"') {
                return Some(Literal::Str(inner.to_string()));
            }
            return None;
        }

        if let Some(captures) = int_regex().captures(text) {
            let digits = &captures[2];
            let magnitude = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
                Some(hex) => u64::from_str_radix(hex, 16).ok()?,
                None => digits.parse::<u64>().ok()?,
            };
            let magnitude = i128::from(magnitude);
            let value = if &captures[1] == "-" { -magnitude } else { magnitude };
            return Some(Literal::Int(value));
        }

        if float_regex().is_match(text) {
            let mut body = text.trim_end_matches(['f', 'F', 'l', 'L']).to_string();
            if let Some(rest) = body.strip_prefix('+') {
                body = rest.to_string();
            }
            let value = body.parse::<f64>().ok()?;
            return Some(Literal::Float { value, text: normalize_float(&body) });
        }

        if name_regex().is_match(text) {
            return Some(Literal::Name(text.split("::").map(str::to_string).collect()));
        }

        None
    }

    /// Last segment of a name, e.g. `ADD` for `BlendMode::ADD`
    pub fn simple_name(&self) -> Option<&str> {
        match self {
            Literal::Name(segments) => segments.last().map(String::as_str),
            _ => None,
        }
    }

    /// Numeric text without any C++ suffix
    pub fn number_text(&self) -> Option<String> {
        match self {
            Literal::Int(value) => Some(value.to_string()),
            Literal::Float { text, .. } => Some(text.clone()),
            _ => None,
        }
    }

    /// Numeric text as a floating point literal: `1` becomes `1.0`
    pub fn float_text(&self) -> Option<String> {
        match self {
            Literal::Int(value) => Some(format!("{}.0", value)),
            Literal::Float { text, .. } => Some(text.clone()),
            _ => None,
        }
    }
}

/// `.5` becomes `0.5`, `-.5` becomes `-0.5` and `1.` becomes `1.0`
fn normalize_float(body: &str) -> String {
    let (sign, digits) = match body.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", body),
    };
    let mut text = String::from(sign);
    if digits.starts_with('.') {
        text.push('0');
    }
    match digits.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => {
            text.push_str(mantissa);
            if mantissa.ends_with('.') {
                text.push('0');
            }
            text.push('e');
            text.push_str(exponent);
        }
        None => {
            text.push_str(digits);
            if digits.ends_with('.') {
                text.push('0');
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bools_and_null() {
        assert_eq!(Literal::parse("true"), Some(Literal::Bool(true)));
        assert_eq!(Literal::parse(" false "), Some(Literal::Bool(false)));
        assert_eq!(Literal::parse("nullptr"), Some(Literal::Null));
    }

    #[test]
    fn test_parse_integers() {
        assert_eq!(Literal::parse("384"), Some(Literal::Int(384)));
        assert_eq!(Literal::parse("-2"), Some(Literal::Int(-2)));
        assert_eq!(Literal::parse("16u"), Some(Literal::Int(16)));
        assert_eq!(Literal::parse("0xFF"), Some(Literal::Int(255)));
    }

    #[test]
    fn test_parse_integers_beyond_i64() {
        assert_eq!(Literal::parse("0xFFFFFFFFFFFFFFFF"), Some(Literal::Int(u64::MAX.into())));
        assert_eq!(Literal::parse("18446744073709551615ull"), Some(Literal::Int(u64::MAX.into())));
        assert_eq!(Literal::parse("-0x10"), Some(Literal::Int(-16)));
        assert_eq!(Literal::parse("-9223372036854775808"), Some(Literal::Int(i64::MIN.into())));
        assert_eq!(Literal::parse("0x1FFFFFFFFFFFFFFFF"), None);
    }

    #[test]
    fn test_parse_floats() {
        assert_eq!(
            Literal::parse("0.10f"),
            Some(Literal::Float { value: 0.1, text: "0.10".into() })
        );
        assert_eq!(Literal::parse(".5f"), Some(Literal::Float { value: 0.5, text: "0.5".into() }));
        assert_eq!(
            Literal::parse("-1.f"),
            Some(Literal::Float { value: -1.0, text: "-1.0".into() })
        );
        assert_eq!(
            Literal::parse("1e-3f"),
            Some(Literal::Float { value: 0.001, text: "1e-3".into() })
        );
    }

    #[test]
    fn test_parse_names() {
        let literal = Literal::parse("BlendMode::ADD").unwrap();
        assert_eq!(literal, Literal::Name(vec!["BlendMode".into(), "ADD".into()]));
        assert_eq!(literal.simple_name(), Some("ADD"));
    }

    #[test]
    fn test_parse_string() {
        assert_eq!(Literal::parse("\"default\""), Some(Literal::Str("default".into())));
    }

    #[test]
    fn test_expressions_are_not_literals() {
        assert_eq!(Literal::parse("1.0f / 60.0f"), None);
        assert_eq!(Literal::parse("float3{1, 2, 3}"), None);
        assert_eq!(Literal::parse("std::numeric_limits<float>::max()"), None);
    }

    #[test]
    fn test_float_text() {
        assert_eq!(Literal::Int(1).float_text().as_deref(), Some("1.0"));
        assert_eq!(Literal::parse("2.5f").unwrap().float_text().as_deref(), Some("2.5"));
        assert_eq!(Literal::Bool(true).float_text(), None);
    }
}

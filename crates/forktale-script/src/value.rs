//! Runtime values held by variables and produced by expressions.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

/// A tagged runtime value.
///
/// Variables only ever hold [`Value::Boolean`] or [`Value::Decimal`];
/// [`Value::Unknown`] is the sentinel an unregistered identifier resolves to
/// when the evaluator is configured to tolerate unknowns. In a boolean
/// context `Unknown` reads as `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A boolean.
    Boolean(bool),
    /// A 128-bit fixed-point decimal.
    Decimal(Decimal),
    /// Sentinel for an identifier with no registered value.
    Unknown,
}

impl Value {
    /// Coerce to a boolean, if this value has one.
    ///
    /// `Unknown` coerces to `false`; decimals do not coerce.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            Value::Decimal(_) => None,
            Value::Unknown => Some(false),
        }
    }

    /// The decimal payload, if this value is one.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Parse a canonical string form back into a value.
    ///
    /// `true`/`false` become booleans, anything `Decimal` accepts becomes a
    /// decimal, everything else is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "true" => Some(Value::Boolean(true)),
            "false" => Some(Value::Boolean(false)),
            other => Decimal::from_str(other).ok().map(Value::Decimal),
        }
    }
}

impl fmt::Display for Value {
    /// The canonical string form: `true`/`false`, or the decimal with
    /// trailing zeros stripped so `1.00` prints as `1`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Decimal(d) => write!(f, "{}", d.normalize()),
            Value::Unknown => write!(f, "unknown"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_booleans() {
        assert_eq!(Value::Boolean(true).to_string(), "true");
        assert_eq!(Value::Boolean(false).to_string(), "false");
    }

    #[test]
    fn display_normalizes_decimals() {
        let v = Value::Decimal(Decimal::from_str("2.00").unwrap());
        assert_eq!(v.to_string(), "2");

        let v = Value::Decimal(Decimal::from_str("2.50").unwrap());
        assert_eq!(v.to_string(), "2.5");
    }

    #[test]
    fn parse_round_trip() {
        assert_eq!(Value::parse("true"), Some(Value::Boolean(true)));
        assert_eq!(
            Value::parse(" 3.5 "),
            Some(Value::Decimal(Decimal::from_str("3.5").unwrap()))
        );
        assert_eq!(Value::parse("neither"), None);
    }

    #[test]
    fn unknown_reads_false() {
        assert_eq!(Value::Unknown.as_bool(), Some(false));
        assert_eq!(Value::Decimal(Decimal::ONE).as_bool(), None);
    }
}

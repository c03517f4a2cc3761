use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Width of `stock_data.symbol` (`VARCHAR(10)`).
pub const MAX_SYMBOL_LEN: usize = 10;

/// The equity ticker a run ingests, in the exact form it is keyed by in
/// `stock_data`.
///
/// Input from `STOCK_SYMBOL` or the command line is trimmed and uppercased,
/// so `" ibm "` and `"IBM"` address the same rows. A symbol that would not
/// fit the `VARCHAR(10)` key column is rejected here, before any request is
/// made, rather than failing at the database after a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Normalize `input` and check it can serve as a `stock_data` key.
    ///
    /// Accepted: an ASCII letter followed by letters, digits, `.` or `-`
    /// (share classes such as `BRK.B`), at most [`MAX_SYMBOL_LEN`] long.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let normalized = input.trim().to_ascii_uppercase();

        let mut chars = normalized.chars().enumerate();
        match chars.next() {
            None => return Err(ValidationError::EmptySymbol),
            Some((_, first)) if !first.is_ascii_alphabetic() => {
                return Err(ValidationError::SymbolInvalidStart { ch: first });
            }
            Some(_) => {}
        }
        if let Some((index, ch)) =
            chars.find(|&(_, ch)| !(ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-')))
        {
            return Err(ValidationError::SymbolInvalidChar { ch, index });
        }

        // Only ASCII remains, so bytes equal characters.
        if normalized.len() > MAX_SYMBOL_LEN {
            return Err(ValidationError::SymbolTooLong {
                len: normalized.len(),
                max: MAX_SYMBOL_LEN,
            });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_normalizes_symbol() {
        let parsed = Symbol::parse(" ibm ").expect("symbol should parse");
        assert_eq!(parsed.as_str(), "IBM");
    }

    #[test]
    fn accepts_share_class_suffixes() {
        let parsed = Symbol::parse("brk.b").expect("symbol should parse");
        assert_eq!(parsed.as_str(), "BRK.B");
    }

    #[test]
    fn rejects_symbols_wider_than_the_column() {
        let err = Symbol::parse("ABCDEFGHIJK").expect_err("must fail");
        assert_eq!(err, ValidationError::SymbolTooLong { len: 11, max: 10 });
        assert!(Symbol::parse("ABCDEFGHIJ").is_ok());
    }

    #[test]
    fn rejects_invalid_start() {
        let err = Symbol::parse("1IBM").expect_err("must fail");
        assert!(matches!(err, ValidationError::SymbolInvalidStart { .. }));
    }

    #[test]
    fn rejects_invalid_chars() {
        let err = Symbol::parse("IBM$").expect_err("must fail");
        assert!(matches!(err, ValidationError::SymbolInvalidChar { .. }));
    }

    #[test]
    fn rejects_blank_input() {
        assert_eq!(Symbol::parse("   "), Err(ValidationError::EmptySymbol));
    }

    #[test]
    fn differently_cased_input_addresses_the_same_key() {
        assert_eq!(Symbol::parse(" msft"), Symbol::parse("MSFT "));
    }

    #[test]
    fn deserializing_applies_the_same_rules() {
        let parsed: Symbol = serde_json::from_str(r#""brk-b""#).expect("deserialize");
        assert_eq!(parsed.as_str(), "BRK-B");
        assert!(serde_json::from_str::<Symbol>(r#""TOOLONGTICKER""#).is_err());
    }
}

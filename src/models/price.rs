use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use thiserror::Error;

/// A non-negative amount of money, kept in cents so sums stay exact.
///
/// Serializes as a decimal number (`7.5`) and deserializes from either a
/// number or a numeric string (`"7.50"`, `"7,50"`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price {
    cents: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PriceError {
    #[error("Price must be a number")]
    NotANumber,

    #[error("Price cannot be negative")]
    Negative,

    #[error("Price cannot have more than two decimals")]
    TooPrecise,
}

impl Price {
    pub const ZERO: Self = Self { cents: 0 };

    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        if cents < 0 {
            return Err(PriceError::Negative);
        }
        Ok(Self { cents })
    }

    #[must_use]
    pub const fn cents(self) -> i64 {
        self.cents
    }

    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn as_f64(self) -> f64 {
        self.cents as f64 / 100.0
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn from_f64(value: f64) -> Result<Self, PriceError> {
        if !value.is_finite() {
            return Err(PriceError::NotANumber);
        }
        if value < 0.0 {
            return Err(PriceError::Negative);
        }
        Self::from_cents((value * 100.0).round() as i64)
    }

    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let trimmed = input.trim();
        if trimmed.starts_with('-') {
            return Err(PriceError::Negative);
        }

        let normalized = trimmed.replace(',', ".");
        let (whole, fraction) = normalized
            .split_once('.')
            .unwrap_or((normalized.as_str(), ""));

        if whole.is_empty() && fraction.is_empty() {
            return Err(PriceError::NotANumber);
        }
        if fraction.len() > 2 {
            return Err(PriceError::TooPrecise);
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(PriceError::NotANumber);
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| PriceError::NotANumber)?
        };
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| PriceError::NotANumber)? * 10,
            _ => fraction.parse().map_err(|_| PriceError::NotANumber)?,
        };

        whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(fraction))
            .ok_or(PriceError::NotANumber)
            .and_then(Self::from_cents)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            cents: self.cents.saturating_add(rhs.cents),
        }
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Price {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.cents / 100, self.cents % 100)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Self::from_f64(n),
            Raw::Text(s) => Self::parse(&s),
        }
        .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal_strings() {
        assert_eq!(Price::parse("7.50").unwrap().cents(), 750);
        assert_eq!(Price::parse("7,5").unwrap().cents(), 750);
        assert_eq!(Price::parse("12").unwrap().cents(), 1200);
        assert_eq!(Price::parse(" 0.99 ").unwrap().cents(), 99);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Price::parse("-1"), Err(PriceError::Negative));
        assert_eq!(Price::parse("1.999"), Err(PriceError::TooPrecise));
        assert_eq!(Price::parse("abc"), Err(PriceError::NotANumber));
        assert_eq!(Price::parse(""), Err(PriceError::NotANumber));
    }

    #[test]
    fn test_sum_is_exact() {
        let total: Price = ["0.10", "0.20", "6.90"]
            .iter()
            .map(|s| Price::parse(s).unwrap())
            .sum();
        assert_eq!(total.cents(), 720);
        assert_eq!(total.to_string(), "7.20");
    }

    #[test]
    fn test_json_accepts_number_or_string() {
        let from_number: Price = serde_json::from_str("6.95").unwrap();
        let from_text: Price = serde_json::from_str("\"6.95\"").unwrap();
        assert_eq!(from_number, from_text);
        assert_eq!(serde_json::to_string(&from_number).unwrap(), "6.95");
        assert!(serde_json::from_str::<Price>("-2").is_err());
    }
}

use std::{
    fmt::{self, Display},
    iter::Sum,
    ops::{Add, AddAssign, Sub},
    str::FromStr,
};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const CURRENCY_CODE: &str = "INR";
/// Razorpay expects every amount in the minor unit of the currency.
pub const PAISE_PER_RUPEE: i64 = 100;

#[derive(Debug, Clone, Error)]
#[error("Amount cannot be represented: {0}")]
pub struct AmountConversionError(String);

//--------------------------------------       Rupees        ---------------------------------------------------------
/// A rupee amount, as shown on the price list and sent by the client. Fractional rupees are allowed down to the
/// paise, so the value is held (and stored) in paise.
///
/// In JSON, whole amounts are written as integers (`500`) and anything else as a decimal (`99.5`). Decimals with more
/// precision than a paisa are rejected.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd)]
#[sqlx(transparent)]
pub struct Rupees(i64);

op!(binary Rupees, Add, add);
op!(binary Rupees, Sub, sub);
op!(inplace Rupees, AddAssign, add_assign);

/// Whole rupees. Values too large to hold in paise saturate.
impl From<i64> for Rupees {
    fn from(rupees: i64) -> Self {
        Self(rupees.saturating_mul(PAISE_PER_RUPEE))
    }
}

impl Sum for Rupees {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl Display for Rupees {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % PAISE_PER_RUPEE == 0 {
            write!(f, "₹{}", self.0 / PAISE_PER_RUPEE)
        } else {
            write!(f, "{}", Paise(self.0))
        }
    }
}

impl Rupees {
    pub fn from_paise(paise: i64) -> Self {
        Self(paise)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Converts to the provider's minor unit.
    pub fn to_paise(&self) -> Paise {
        Paise(self.0)
    }
}

/// Parses a decimal rupee amount such as `499`, `99.5` or `199.00`.
impl FromStr for Rupees {
    type Err = AmountConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AmountConversionError(format!("{s} is not a valid rupee amount"));
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let significant = fraction.trim_end_matches('0');
        if significant.len() > 2 {
            return Err(AmountConversionError(format!("{s} is more precise than a paisa")));
        }
        let whole = if whole.is_empty() { 0 } else { whole.parse::<i64>().map_err(|_| invalid())? };
        let paise = format!("{significant:0<2}").parse::<i64>().map_err(|_| invalid())?;
        let total =
            whole.checked_mul(PAISE_PER_RUPEE).and_then(|p| p.checked_add(paise)).ok_or_else(|| invalid())?;
        Ok(Self(if negative { -total } else { total }))
    }
}

/// JSON numbers arrive as binary floats. The value is accepted if it is within rounding error of a whole number of
/// paise.
impl TryFrom<f64> for Rupees {
    type Error = AmountConversionError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        let scaled = value * PAISE_PER_RUPEE as f64;
        let paise = scaled.round();
        if !scaled.is_finite() || paise.abs() >= i64::MAX as f64 {
            return Err(AmountConversionError(format!("{value} is out of range")));
        }
        if (scaled - paise).abs() > 1e-6 {
            return Err(AmountConversionError(format!("{value} is more precise than a paisa")));
        }
        Ok(Self(paise as i64))
    }
}

impl Serialize for Rupees {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % PAISE_PER_RUPEE == 0 {
            serializer.serialize_i64(self.0 / PAISE_PER_RUPEE)
        } else {
            serializer.serialize_f64(self.0 as f64 / PAISE_PER_RUPEE as f64)
        }
    }
}

impl<'de> Deserialize<'de> for Rupees {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RupeesVisitor)
    }
}

struct RupeesVisitor;

impl<'de> de::Visitor<'de> for RupeesVisitor {
    type Value = Rupees;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a rupee amount with at most two decimal places")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Rupees, E> {
        v.checked_mul(PAISE_PER_RUPEE).map(Rupees).ok_or_else(|| E::custom(format!("{v} is out of range")))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Rupees, E> {
        let v = i64::try_from(v).map_err(|_| E::custom(format!("{v} is out of range")))?;
        self.visit_i64(v)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Rupees, E> {
        Rupees::try_from(v).map_err(E::custom)
    }

    // Postgres `numeric` columns can come back from PostgREST as strings
    fn visit_str<E: de::Error>(self, v: &str) -> Result<Rupees, E> {
        v.parse().map_err(E::custom)
    }
}

//--------------------------------------        Paise        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Paise(i64);

op!(binary Paise, Add, add);
op!(binary Paise, Sub, sub);

impl From<i64> for Paise {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for Paise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let rupees = (self.0 / PAISE_PER_RUPEE).abs();
        let paise = (self.0 % PAISE_PER_RUPEE).abs();
        write!(f, "{sign}₹{rupees}.{paise:02}")
    }
}

impl Paise {
    pub fn value(&self) -> i64 {
        self.0
    }
}

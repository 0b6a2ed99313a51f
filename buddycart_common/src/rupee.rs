use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::op;

pub const RUPEE_CURRENCY_CODE: &str = "INR";

//--------------------------------------        Rupee         --------------------------------------------------------
/// An amount of Indian rupees, held as an integer number of paise.
///
/// The storefront backend is loose about money on the wire: amounts arrive as JSON numbers or as decimal strings,
/// depending on the endpoint, and are always denominated in rupees. The serde implementations accept both forms and
/// always emit a fractional rupee number, which is what the backend expects on requests.
#[derive(Debug, Clone, Copy, Default, Ord, PartialOrd)]
pub struct Rupee(i64);

op!(binary Rupee, Add, add);
op!(binary Rupee, Sub, sub);
op!(inplace Rupee, AddAssign, add_assign);
op!(inplace Rupee, SubAssign, sub_assign);
op!(unary Rupee, Neg, neg);

impl Mul<i64> for Rupee {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Rupee {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in paise: {0}")]
pub struct RupeeConversionError(String);

impl From<i64> for Rupee {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Rupee {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Rupee {}

impl TryFrom<f64> for Rupee {
    type Error = RupeeConversionError;

    fn try_from(rupees: f64) -> Result<Self, Self::Error> {
        if !rupees.is_finite() {
            return Err(RupeeConversionError(format!("{rupees} is not a finite rupee amount")));
        }
        let paise = (rupees * 100.0).round();
        if paise.abs() >= i64::MAX as f64 {
            return Err(RupeeConversionError(format!("Value {rupees} is too large to convert to paise")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(paise as i64))
    }
}

/// Parses a decimal rupee string, e.g. `120`, `120.5` or `-40.25`.
impl FromStr for Rupee {
    type Err = RupeeConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (sign, digits) = match s.strip_prefix('-') {
            Some(rest) => (-1, rest),
            None => (1, s),
        };
        let mut parts = digits.split('.');
        let whole_units = parts
            .next()
            .ok_or_else(|| RupeeConversionError(s.to_string()))?
            .parse::<i64>()
            .map_err(|e| RupeeConversionError(format!("Invalid rupee value: {s}. {e}.")))?;
        let paise = match parts.next() {
            None | Some("") => 0,
            Some(frac) => {
                // Normalise the fractional part to exactly two digits, so "120.5" is 50 paise, not 5.
                let frac = format!("{frac:0<2}");
                frac[..2]
                    .parse::<i64>()
                    .map_err(|e| RupeeConversionError(format!("Invalid rupee value: {s}. {e}.")))?
            },
        };
        if parts.next().is_some() {
            return Err(RupeeConversionError(format!("Invalid rupee value: {s}")));
        }
        whole_units
            .checked_mul(100)
            .and_then(|w| w.checked_add(paise))
            .and_then(|v| v.checked_mul(sign))
            .map(Self)
            .ok_or_else(|| RupeeConversionError(format!("Value {s} is too large to convert to paise")))
    }
}

impl Display for Rupee {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rupees = self.0 as f64 / 100.0;
        write!(f, "₹{rupees:0.2}")
    }
}

impl Rupee {
    pub const fn value(&self) -> i64 {
        self.0
    }

    pub const fn from_paise(paise: i64) -> Self {
        Self(paise)
    }

    pub const fn from_rupees(rupees: i64) -> Self {
        Self(rupees * 100)
    }

    pub fn to_rupees(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Serialize for Rupee {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_rupees())
    }
}

struct RupeeVisitor;

impl de::Visitor<'_> for RupeeVisitor {
    type Value = Rupee;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a rupee amount as a number or decimal string")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Rupee::try_from(v).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        v.checked_mul(100)
            .map(Rupee::from)
            .ok_or_else(|| E::custom(format!("Value {v} is too large to convert to paise")))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        i64::try_from(v)
            .ok()
            .and_then(|v| v.checked_mul(100))
            .map(Rupee::from)
            .ok_or_else(|| E::custom(format!("Value {v} is too large to convert to paise")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse::<Rupee>().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Rupee {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RupeeVisitor)
    }
}

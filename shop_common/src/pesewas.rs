use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const GHS_CURRENCY_CODE: &str = "GHS";
pub const GHS_CURRENCY_SYMBOL: &str = "GH₵";

//--------------------------------------      Pesewas        ---------------------------------------------------------
/// An amount of Ghana cedis, held in pesewas (1 GH₵ = 100 pesewas).
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Pesewas(i64);

op!(binary Pesewas, Add, add);
op!(binary Pesewas, Sub, sub);
op!(inplace Pesewas, AddAssign, add_assign);
op!(inplace Pesewas, SubAssign, sub_assign);
op!(unary Pesewas, Neg, neg);

impl Mul<i64> for Pesewas {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Pesewas {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in pesewas: {0}")]
pub struct PesewasConversionError(String);

impl From<i64> for Pesewas {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Pesewas {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Pesewas {}

impl TryFrom<u64> for Pesewas {
    type Error = PesewasConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(PesewasConversionError(format!("Value {value} is too large to convert to Pesewas")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

/// Parses a cedi amount written as a decimal, e.g. `30`, `12.5` or `149.99`.
impl FromStr for Pesewas {
    type Err = PesewasConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() || frac.len() > 2 {
            return Err(PesewasConversionError(s.to_string()));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(PesewasConversionError(s.to_string()));
        }
        let cedis = whole.parse::<i64>().map_err(|e| PesewasConversionError(format!("{s}: {e}")))?;
        let frac = format!("{frac:0<2}").parse::<i64>().map_err(|e| PesewasConversionError(format!("{s}: {e}")))?;
        let value = cedis
            .checked_mul(100)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(|| PesewasConversionError(format!("{s} is out of range")))?;
        Ok(Self(if negative { -value } else { value }))
    }
}

impl Display for Pesewas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{GHS_CURRENCY_SYMBOL}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Pesewas {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_cedis(cedis: i64) -> Self {
        Self(cedis * 100)
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const INR_CURRENCY_CODE: &str = "INR";
pub const INR_CURRENCY_CODE_LOWER: &str = "inr";

//--------------------------------------       Paisa        ----------------------------------------------------------

/// An amount of Indian rupees, stored as whole paise. All ledger arithmetic is integral; fractions
/// only appear when formatting for display.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Paisa(i64);

op!(binary Paisa, Add, add);
op!(binary Paisa, Sub, sub);
op!(inplace Paisa, AddAssign, add_assign);
op!(inplace Paisa, SubAssign, sub_assign);
op!(unary Paisa, Neg, neg);

impl Mul<i64> for Paisa {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Paisa {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in paise: {0}")]
pub struct PaisaConversionError(String);

impl From<i64> for Paisa {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Paisa {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Paisa {}

impl TryFrom<u64> for Paisa {
    type Error = PaisaConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(PaisaConversionError(format!("Value {} is too large to convert to Paisa", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Paisa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.abs() < 100 {
            write!(f, "{}p", self.0)
        } else {
            let rupees = self.0 as f64 / 100.0;
            write!(f, "₹{rupees:0.2}")
        }
    }
}

impl Paisa {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_rupees(rupees: i64) -> Self {
        Self(rupees * 100)
    }

    /// Truncating integer percentage. `percent(40)` of ₹5.00 is ₹2.00.
    pub fn percent(&self, pct: i64) -> Self {
        Self(self.0 * pct / 100)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const SHOP_CURRENCY_CODE: &str = "EUR";

//--------------------------------------     MoneyCents       --------------------------------------------------------
/// An amount of money in euro cents. All prices and totals in the gateway are integer cents; fractional euros never
/// enter the system.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct MoneyCents(i64);

op!(binary MoneyCents, Add, add);
op!(binary MoneyCents, Sub, sub);
op!(inplace MoneyCents, SubAssign, sub_assign);
op!(unary MoneyCents, Neg, neg);

impl Mul<i64> for MoneyCents {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for MoneyCents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in euro cents: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for MoneyCents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for MoneyCents {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for MoneyCents {}

impl TryFrom<u64> for MoneyCents {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MoneyConversionError(format!("Value {value} is too large to convert to MoneyCents")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for MoneyCents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let euros = self.0 as f64 / 100.0;
        write!(f, "{euros:0.2}€")
    }
}

impl MoneyCents {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_euros(euros: i64) -> Self {
        Self(euros * 100)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arithmetic() {
        let a = MoneyCents::from(1250);
        let b = MoneyCents::from_euros(3);
        assert_eq!(a + b, MoneyCents::from(1550));
        assert_eq!(b - a, MoneyCents::from(-950));
        assert_eq!(a * 3, MoneyCents::from(3750));
        assert_eq!(-a, MoneyCents::from(-1250));
        let total: MoneyCents = [a, b].into_iter().sum();
        assert_eq!(total.value(), 1550);
    }

    #[test]
    fn display_as_euros() {
        assert_eq!(MoneyCents::from(1299).to_string(), "12.99€");
        assert_eq!(MoneyCents::from(5).to_string(), "0.05€");
    }
}

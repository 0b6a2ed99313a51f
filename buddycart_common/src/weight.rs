use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul},
};

use serde::{Deserialize, Serialize};

use crate::op;

//--------------------------------------        Grams         --------------------------------------------------------
/// A weight in whole grams. Products carry their weight in grams; the buddy queue wants cart totals in kilograms.
#[derive(Debug, Clone, Copy, Default, Ord, PartialOrd, Eq, PartialEq, Serialize, Deserialize)]
pub struct Grams(i64);

op!(binary Grams, Add, add);
op!(inplace Grams, AddAssign, add_assign);

impl Mul<i64> for Grams {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Grams {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl From<i64> for Grams {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for Grams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 < 1_000 {
            write!(f, "{}g", self.0)
        } else {
            let kg = self.0 as f64 / 1_000.0;
            write!(f, "{kg:0.2}kg")
        }
    }
}

impl Grams {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn to_kilograms(&self) -> f64 {
        self.0 as f64 / 1_000.0
    }
}

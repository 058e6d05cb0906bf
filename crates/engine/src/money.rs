use std::{
    fmt,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{Currency, EngineError};

const GROUP_SEPARATORS: [char; 4] = ['.', ',', ' ', '_'];

/// Signed money amount in whole colones.
///
/// CRC is handled with zero fraction digits, so the inner value is the number
/// of colones. Use this type for every monetary value in the engine (movement
/// amounts, KPI totals) to avoid floating-point drift.
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let amount = Money::new(45_000);
/// assert_eq!(amount.units(), 45000);
/// assert_eq!(amount.to_string(), "₡45 000");
/// ```
///
/// Parsing from user input accepts thousands separators (`.`, `,`, space or
/// `_`) as long as every group after the first has exactly three digits. A
/// fractional part is always rejected:
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!("45000".parse::<Money>().unwrap().units(), 45000);
/// assert_eq!("₡45.000".parse::<Money>().unwrap().units(), 45000);
/// assert!("10.5".parse::<Money>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a new amount from whole units.
    #[must_use]
    pub const fn new(units: i64) -> Self {
        Self(units)
    }

    /// Returns the raw value in whole units.
    #[must_use]
    pub const fn units(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Largest amount a single movement may carry (`2^53 - 1`).
    ///
    /// Every accepted amount is exact as a JSON number on any client.
    pub const MAX_MOVEMENT: Money = Money(9_007_199_254_740_991);

    /// Checks that `self` is a valid movement amount: `> 0` and at most
    /// [`Money::MAX_MOVEMENT`].
    pub fn ensure_movement_amount(self) -> Result<Money, EngineError> {
        if !self.is_positive() {
            return Err(EngineError::InvalidAmount("amount must be > 0".to_string()));
        }
        if self > Self::MAX_MOVEMENT {
            return Err(EngineError::InvalidAmount(format!(
                "amount must be <= {}",
                Self::MAX_MOVEMENT.0
            )));
        }
        Ok(self)
    }

    /// Builds a movement amount from a JSON number.
    ///
    /// Integers are taken as is. A float is accepted only when it is finite
    /// and integral. The result must pass [`Money::ensure_movement_amount`].
    pub fn positive_from_number(
        value: &serde_json::Number,
        currency: Currency,
    ) -> Result<Money, EngineError> {
        if let Some(units) = value.as_i64() {
            return Money(units).ensure_movement_amount();
        }
        if value.is_u64() {
            return Err(EngineError::InvalidAmount(format!(
                "amount must be <= {}",
                Self::MAX_MOVEMENT.0
            )));
        }

        let Some(float) = value.as_f64().filter(|f| f.is_finite()) else {
            return Err(EngineError::InvalidAmount(
                "amount must be a finite number".to_string(),
            ));
        };
        if float <= 0.0 {
            return Err(EngineError::InvalidAmount("amount must be > 0".to_string()));
        }
        if currency.minor_units() == 0 && float.fract() != 0.0 {
            return Err(EngineError::InvalidAmount(format!(
                "{} amounts have no fraction digits",
                currency.code()
            )));
        }
        if float > Self::MAX_MOVEMENT.0 as f64 {
            return Err(EngineError::InvalidAmount(format!(
                "amount must be <= {}",
                Self::MAX_MOVEMENT.0
            )));
        }
        Money(float as i64).ensure_movement_amount()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (idx, ch) in digits.chars().enumerate() {
            if idx > 0 && (digits.len() - idx) % 3 == 0 {
                grouped.push(' ');
            }
            grouped.push(ch);
        }
        write!(f, "{sign}{}{grouped}", Currency::Crc.symbol())
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses a whole-colón amount.
    ///
    /// Accepts an optional `₡` prefix, an optional leading `+`/`-` and
    /// thousands separators in three-digit groups. Rejects fractions,
    /// mixed separators and malformed groups.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let empty = || EngineError::InvalidAmount("empty amount".to_string());
        let invalid = || EngineError::InvalidAmount("invalid amount".to_string());
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let trimmed = s.trim();
        let trimmed = trimmed
            .strip_prefix(Currency::Crc.symbol())
            .unwrap_or(trimmed)
            .trim();
        if trimmed.is_empty() {
            return Err(empty());
        }

        let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (true, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (false, stripped)
        } else {
            (false, trimmed)
        };
        if rest.is_empty() {
            return Err(empty());
        }

        let mut separators = rest.chars().filter(|c| GROUP_SEPARATORS.contains(c));
        let digits: String = match separators.next() {
            None => rest.to_string(),
            Some(separator) => {
                if separators.any(|c| c != separator) {
                    return Err(invalid());
                }
                let mut groups = rest.split(separator);
                let head = groups.next().ok_or_else(invalid)?;
                if head.is_empty() || head.len() > 3 {
                    return Err(invalid());
                }
                let mut joined = head.to_string();
                for group in groups {
                    if group.len() != 3 {
                        return Err(EngineError::InvalidAmount(
                            "CRC amounts have no fraction digits".to_string(),
                        ));
                    }
                    joined.push_str(group);
                }
                joined
            }
        };

        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let value: i64 = digits.parse().map_err(|_| overflow())?;
        let signed = if negative {
            value.checked_neg().ok_or_else(overflow)?
        } else {
            value
        };

        Ok(Money(signed))
    }
}

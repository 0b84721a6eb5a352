//! Type-safe price representation using decimal arithmetic.
//!
//! Amounts are stored in the currency's standard unit (rupees, not paise).
//! Nothing here rounds implicitly: callers opt in with [`Price::rounded`] or
//! [`Price::percent`], which round half away from zero like the storefront
//! always has.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Sub};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A monetary amount.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero in any currency.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from whole currency units.
    #[must_use]
    pub fn from_units(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns `true` if the amount is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// This price multiplied by a line quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Round to whole currency units, half away from zero.
    #[must_use]
    pub fn rounded(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// `rate` percent of this price, rounded to whole units.
    ///
    /// ```
    /// use eshop_core::Price;
    /// use rust_decimal::Decimal;
    ///
    /// let subtotal = Price::from_units(2500);
    /// assert_eq!(subtotal.percent(Decimal::from(18)), Price::from_units(450));
    /// ```
    #[must_use]
    pub fn percent(self, rate: Decimal) -> Self {
        Self(self.0 * rate / Decimal::ONE_HUNDRED).rounded()
    }

    /// Format for display with no fraction digits (e.g. `₹1,04,998`).
    #[must_use]
    pub fn display(&self, currency: CurrencyCode) -> String {
        let whole = self.rounded().0;
        let digits = whole.abs().trunc().to_string();
        let grouped = group_digits(&digits, currency.uses_indian_grouping());
        let sign = if whole.is_sign_negative() && !whole.is_zero() {
            "-"
        } else {
            ""
        };
        format!("{sign}{}{grouped}", currency.symbol())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<i64> for Price {
    fn from(units: i64) -> Self {
        Self::from_units(units)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
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

/// Insert thousands separators into a run of ASCII digits.
///
/// Indian grouping keeps the last three digits together and then groups by
/// two (`1,04,998`); western grouping uses threes throughout.
fn group_digits(digits: &str, indian: bool) -> String {
    if digits.len() <= 3 {
        return digits.to_owned();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let step = if indian { 2 } else { 3 };

    let mut groups = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(step);
        groups.push(head.get(start..end).unwrap_or_default());
        end = start;
    }
    groups.reverse();

    format!("{},{tail}", groups.join(","))
}

/// ISO 4217 currency codes the storefront can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
    EUR,
    GBP,
    AED,
}

impl CurrencyCode {
    /// Display symbol, including any trailing space.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::INR => "₹",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
            Self::AED => "AED ",
        }
    }

    /// ISO code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::INR => "INR",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::AED => "AED",
        }
    }

    const fn uses_indian_grouping(self) -> bool {
        matches!(self, Self::INR)
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INR" => Ok(Self::INR),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "AED" => Ok(Self::AED),
            _ => Err(format!("unsupported currency: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_rounds_half_away_from_zero() {
        // 18% of 2500 is exact
        assert_eq!(
            Price::from_units(2500).percent(Decimal::from(18)),
            Price::from_units(450)
        );
        // 18% of 850 = 153.0, 18% of 1415 = 254.7 -> 255
        assert_eq!(
            Price::from_units(1415).percent(Decimal::from(18)),
            Price::from_units(255)
        );
        // 5% of 10 = 0.5 -> 1 (banker's rounding would give 0)
        assert_eq!(
            Price::from_units(10).percent(Decimal::from(5)),
            Price::from_units(1)
        );
    }

    #[test]
    fn test_times_and_sum() {
        let lines = [Price::from_units(1000).times(2), Price::from_units(500).times(1)];
        let total: Price = lines.iter().sum();
        assert_eq!(total, Price::from_units(2500));
    }

    #[test]
    fn test_display_indian_grouping() {
        assert_eq!(Price::from_units(99).display(CurrencyCode::INR), "₹99");
        assert_eq!(Price::from_units(1140).display(CurrencyCode::INR), "₹1,140");
        assert_eq!(
            Price::from_units(104_998).display(CurrencyCode::INR),
            "₹1,04,998"
        );
        assert_eq!(
            Price::from_units(12_345_678).display(CurrencyCode::INR),
            "₹1,23,45,678"
        );
    }

    #[test]
    fn test_display_western_grouping() {
        assert_eq!(
            Price::from_units(104_998).display(CurrencyCode::USD),
            "$104,998"
        );
        assert_eq!(
            Price::new(Decimal::new(-1_234_505, 2)).display(CurrencyCode::EUR),
            "-€12,345"
        );
    }

    #[test]
    fn test_serde_accepts_numbers_and_strings() {
        let from_number: Price = serde_json::from_str("1140").unwrap();
        let from_string: Price = serde_json::from_str("\"1140\"").unwrap();
        assert_eq!(from_number, from_string);
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("inr".parse::<CurrencyCode>().unwrap(), CurrencyCode::INR);
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }
}

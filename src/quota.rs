//! Quota quantity selection

use rust_decimal::Decimal;

/// Quantities offered as one-click choices
pub const PRESET_QUANTITIES: [u32; 5] = [5, 10, 20, 50, 100];

/// Maps a user-chosen quantity to a purchase amount.
///
/// The selector only keeps the quantity sane (at least one). The reward's
/// minimum is enforced by the purchase workflow when the user tries to
/// participate, so a selection below `min_quota` is representable here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaSelector {
    price: Decimal,
    min_quota: u32,
    quantity: u32,
}

impl QuotaSelector {
    /// Start at the reward's minimum quota
    pub fn new(price: Decimal, min_quota: u32) -> Self {
        let min_quota = min_quota.max(1);
        Self {
            price,
            min_quota,
            quantity: min_quota,
        }
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn min_quota(&self) -> u32 {
        self.min_quota
    }

    /// `quantity × price`, derived on every call
    pub fn total(&self) -> Decimal {
        Decimal::from(self.quantity) * self.price
    }

    /// Pick one of [`PRESET_QUANTITIES`]. Returns `false` and leaves the
    /// selection unchanged for any other value.
    pub fn select(&mut self, preset: u32) -> bool {
        if !PRESET_QUANTITIES.contains(&preset) {
            return false;
        }
        self.quantity = preset;
        true
    }

    /// Whether `preset` is the current selection
    pub fn is_selected(&self, preset: u32) -> bool {
        self.quantity == preset
    }

    /// Take free-form numeric input. Non-numeric input and anything below
    /// one become one; fractions are truncated.
    pub fn input(&mut self, raw: &str) -> u32 {
        self.quantity = parse_quantity(raw);
        self.quantity
    }
}

fn parse_quantity(raw: &str) -> u32 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 1.0 => {
            if value >= f64::from(u32::MAX) {
                u32::MAX
            } else {
                value.trunc() as u32
            }
        }
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn price(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn starts_at_min_quota() {
        let selector = QuotaSelector::new(price("10.00"), 5);
        assert_eq!(selector.quantity(), 5);
        assert_eq!(selector.total(), price("50.00"));

        let zero_min = QuotaSelector::new(price("1"), 0);
        assert_eq!(zero_min.quantity(), 1);
    }

    #[test]
    fn invalid_raw_input_clamps_to_one() {
        let mut selector = QuotaSelector::new(price("2.50"), 5);
        for raw in ["", "abc", "0", "-3", "0.5", "NaN", "inf", "-inf"] {
            assert_eq!(selector.input(raw), 1, "input {:?}", raw);
            assert_eq!(selector.total(), price("2.50"));
        }
    }

    #[test]
    fn raw_input_below_minimum_is_kept() {
        let mut selector = QuotaSelector::new(price("10"), 5);
        assert_eq!(selector.input("3"), 3);
        assert_eq!(selector.total(), price("30"));
        assert_eq!(selector.input(" 12.9 "), 12);
    }

    #[test]
    fn huge_input_saturates() {
        let mut selector = QuotaSelector::new(price("1"), 1);
        assert_eq!(selector.input("1e12"), u32::MAX);
    }

    #[test]
    fn presets_only() {
        let mut selector = QuotaSelector::new(price("0.10"), 1);
        assert!(selector.select(20));
        assert!(selector.is_selected(20));
        assert!(!selector.select(7));
        assert_eq!(selector.quantity(), 20);
    }

    #[test]
    fn total_is_exact_decimal() {
        let mut selector = QuotaSelector::new(price("0.10"), 1);
        selector.input("3");
        // 3 × 0.1 in binary floating point is 0.30000000000000004
        assert_eq!(selector.total(), price("0.30"));
    }
}

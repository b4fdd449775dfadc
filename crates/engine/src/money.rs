use std::fmt;

use crate::Currency;

/// Signed money amount represented as **integer minor units** (cents, paise).
///
/// Entry amounts and every book/counterparty aggregate use this representation
/// so repeated increments never accumulate rounding drift.
///
/// # Examples
///
/// ```rust
/// use engine::{Currency, MoneyCents};
///
/// let amount = MoneyCents::new(12_34);
/// assert_eq!(amount.to_string(), "12.34");
/// assert_eq!(amount.format_in(Currency::Inr), "₹12.34");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct MoneyCents(i64);

impl MoneyCents {
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Formats the amount prefixed with the currency symbol.
    #[must_use]
    pub fn format_in(self, currency: Currency) -> String {
        let plain = self.to_string();
        match plain.strip_prefix('-') {
            Some(abs) => format!("-{}{abs}", currency.symbol()),
            None => format!("{}{plain}", currency.symbol()),
        }
    }
}

impl fmt::Display for MoneyCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_pads_minor_units() {
        assert_eq!(MoneyCents::new(0).to_string(), "0.00");
        assert_eq!(MoneyCents::new(7).to_string(), "0.07");
        assert_eq!(MoneyCents::new(1050).to_string(), "10.50");
        assert_eq!(MoneyCents::new(-1050).to_string(), "-10.50");
    }

    #[test]
    fn format_in_prefixes_symbol() {
        assert_eq!(MoneyCents::new(-5).format_in(Currency::Usd), "-$0.05");
        assert_eq!(MoneyCents::new(50000).format_in(Currency::Eur), "€500.00");
        assert_eq!(MoneyCents::new(i64::MIN).format_in(Currency::Gbp), "-£92233720368547758.08");
    }
}

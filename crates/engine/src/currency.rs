use serde::{Deserialize, Serialize};

use crate::EngineError;

/// ISO currency code configured on a business.
///
/// Every amount recorded in a business is expressed in its currency; the
/// engine never converts between currencies. All supported currencies use
/// two fraction digits, so stored amounts are cents (see `MoneyCents`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Eur,
    Usd,
    Gbp,
    Inr,
}

impl Currency {
    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
            Currency::Inr => "INR",
        }
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Currency::Eur => "€",
            Currency::Usd => "$",
            Currency::Gbp => "£",
            Currency::Inr => "₹",
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "EUR" => Ok(Currency::Eur),
            "USD" => Ok(Currency::Usd),
            "GBP" => Ok(Currency::Gbp),
            "INR" => Ok(Currency::Inr),
            other => Err(EngineError::CurrencyMismatch(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Currency::try_from(" inr ").unwrap(), Currency::Inr);
        assert_eq!(Currency::try_from("usd").unwrap(), Currency::Usd);
    }

    #[test]
    fn parse_rejects_unknown_codes() {
        assert_eq!(
            Currency::try_from("XYZ").unwrap_err(),
            EngineError::CurrencyMismatch("unsupported currency: XYZ".to_string())
        );
    }
}

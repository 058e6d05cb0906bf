use serde::{Deserialize, Serialize};

use crate::EngineError;

/// ISO currency code used by movements.
///
/// SUMA is deployed for a single market and every movement is recorded in
/// Costa Rican colones. The engine still models currency explicitly so that the
/// stored rows are self-describing.
///
/// ## Minor units
///
/// Amounts are stored as an `i64` number of minor units (see [`Money`]).
/// For `CRC` the deployment uses no fraction digits, so one stored unit is one
/// colón.
///
/// [`Money`]: crate::Money
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Crc,
}

impl Currency {
    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Crc => "CRC",
        }
    }

    /// Number of fraction digits used when formatting/parsing amounts.
    #[must_use]
    pub const fn minor_units(self) -> u8 {
        match self {
            Currency::Crc => 0,
        }
    }

    /// Symbol used when rendering amounts for humans.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Currency::Crc => "₡",
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
            "CRC" => Ok(Currency::Crc),
            other => Err(EngineError::CurrencyMismatch(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}

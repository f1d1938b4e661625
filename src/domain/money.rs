use {
    super::error::SettlementError,
    serde::{Deserialize, Serialize},
    std::fmt,
    std::ops::{Add, Sub},
};

/// Amount in the currency's minor unit (tambala, cents, pence).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyAmount(i64);

impl MoneyAmount {
    pub fn new(minor: i64) -> Result<Self, SettlementError> {
        if minor < 0 {
            return Err(SettlementError::Validation(format!(
                "MoneyAmount cannot be negative, got: {minor}"
            )));
        }
        Ok(Self(minor))
    }

    pub fn minor_units(&self) -> i64 {
        self.0
    }

    pub fn checked_add(self, other: MoneyAmount) -> Option<MoneyAmount> {
        self.0.checked_add(other.0).map(MoneyAmount)
    }

    pub fn checked_sub(self, other: MoneyAmount) -> Option<MoneyAmount> {
        self.0
            .checked_sub(other.0)
            .filter(|&v| v >= 0)
            .map(MoneyAmount)
    }
}

impl Add for MoneyAmount {
    type Output = MoneyAmount;

    fn add(self, rhs: MoneyAmount) -> MoneyAmount {
        self.checked_add(rhs).expect("MoneyAmount overflow")
    }
}

impl Sub for MoneyAmount {
    type Output = MoneyAmount;

    fn sub(self, rhs: MoneyAmount) -> MoneyAmount {
        self.checked_sub(rhs).expect("MoneyAmount underflow")
    }
}

impl fmt::Display for MoneyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Mwk,
    Usd,
    Gbp,
    Zar,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mwk => "MWK",
            Self::Usd => "USD",
            Self::Gbp => "GBP",
            Self::Zar => "ZAR",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for Currency {
    type Error = SettlementError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "MWK" => Ok(Self::Mwk),
            "USD" => Ok(Self::Usd),
            "GBP" => Ok(Self::Gbp),
            "ZAR" => Ok(Self::Zar),
            other => Err(SettlementError::Validation(format!(
                "unknown currency: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: MoneyAmount,
    currency: Currency,
}

impl Money {
    pub fn new(amount: MoneyAmount, currency: Currency) -> Self {
        Self { amount, currency }
    }

    pub fn amount(&self) -> MoneyAmount {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }
}

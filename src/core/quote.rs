//! Quote abstractions and core types

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use super::amount::Amount;
use super::error::{FetchError, UnknownCurrency};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Mxn,
    Cop,
}

impl Currency {
    /// Currencies the user may receive.
    pub const QUOTE: [Currency; 2] = [Currency::Mxn, Currency::Cop];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Mxn => "MXN",
            Currency::Cop => "COP",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Currency::Usd => "Dolar Estadounidense",
            Currency::Mxn => "Peso Mexicano",
            Currency::Cop => "Peso Colombiano",
        }
    }

    pub fn is_quote_option(&self) -> bool {
        Self::QUOTE.contains(self)
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "MXN" => Ok(Currency::Mxn),
            "COP" => Ok(Currency::Cop),
            _ => Err(UnknownCurrency(s.to_string())),
        }
    }
}

/// A priced, time-limited conversion offer. Currency codes are kept as sent by
/// the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub quote_id: String,
    pub pct_fee: f64,
    pub fixed_fee: f64,
    pub quote_amount: f64,
    pub base_amount: f64,
    pub quote_currency: String,
    pub base_currency: String,
    pub expiration_ts: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteRequest {
    pub base_currency: Currency,
    pub quote_currency: Currency,
    pub amount: Amount,
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quote(&self, request: &QuoteRequest) -> Result<Quote, FetchError>;
}

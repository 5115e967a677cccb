//! Display values and submit gating derived from a form snapshot

use super::quote::Currency;
use super::session::FormState;

pub const CONFIRMATION: &str = "Tu envío de dinero ha sido procesado.";
pub const DELIVERY_NOTICE: &str = "Tu dinero llega en 15 minutos";

/// What the form shows for a given state. Quote-derived fields are masked
/// while an error is active.
#[derive(Debug, Clone, PartialEq)]
pub struct FormView {
    pub send_amount: String,
    pub base_currency: Currency,
    pub quote_currency: Currency,
    pub pct_fee: String,
    pub fixed_fee: String,
    pub rate: Option<String>,
    pub expiry: Option<String>,
    pub receive_amount: String,
    pub error: Option<String>,
    pub loading: bool,
    pub can_submit: bool,
}

impl FormView {
    /// Returns `None` until the first quote has arrived.
    pub fn from_state(state: &FormState) -> Option<Self> {
        let quote = state.quote.as_ref()?;
        let error = state.error.as_ref().map(ToString::to_string);
        let has_error = error.is_some();

        let (pct_fee, fixed_fee) = if has_error {
            ("0".to_string(), "0".to_string())
        } else {
            (quote.pct_fee.to_string(), quote.fixed_fee.to_string())
        };
        let rate = (!has_error).then(|| {
            format!(
                "{} {} = ${} {}",
                quote.quote_amount, quote.quote_currency, quote.base_amount, quote.base_currency
            )
        });
        let expiry = if has_error {
            None
        } else {
            state.expiry.map(|r| r.to_string())
        };
        let receive_amount = if has_error || state.loading {
            String::new()
        } else {
            quote.quote_amount.to_string()
        };

        Some(FormView {
            send_amount: state.amount.to_string(),
            base_currency: state.base_currency,
            quote_currency: state.quote_currency,
            pct_fee,
            fixed_fee,
            rate,
            expiry,
            receive_amount,
            error,
            loading: state.loading,
            can_submit: can_submit(state),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Confirmed(&'static str),
    Blocked,
}

pub fn can_submit(state: &FormState) -> bool {
    state.quote.is_some() && state.error.is_none()
}

/// Acknowledges a send. No state changes and no money moves.
pub fn submit(state: &FormState) -> Submission {
    if can_submit(state) {
        Submission::Confirmed(CONFIRMATION)
    } else {
        Submission::Blocked
    }
}

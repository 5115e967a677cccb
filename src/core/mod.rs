//! Core quote form logic

pub mod amount;
pub mod config;
pub mod countdown;
pub mod debounce;
pub mod error;
pub mod form;
pub mod log;
pub mod quote;
pub mod session;

// Re-export main types for cleaner imports
pub use amount::Amount;
pub use error::{FetchError, FormError, ValidationError};
pub use quote::{Currency, Quote, QuoteProvider, QuoteRequest};
pub use session::{FormState, QuoteSession, SessionOptions};

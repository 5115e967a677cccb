pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::quote::{Currency, QuoteProvider};
use crate::core::session::{QuoteSession, SessionOptions};
use crate::core::Amount;
use crate::providers::balam::BalamQuoteProvider;
use crate::store::{KeyValueStore, QUOTE_ID_KEY};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Quote {
        amount: Option<Amount>,
        currency: Option<Currency>,
    },
    Form,
    LastQuoteId,
}

pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?
            .with_api_url_override(std::env::var(crate::core::config::API_URL_ENV).ok()),
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Balam starting...");
    let config = load_config(config_path)?;

    match command {
        AppCommand::Quote { amount, currency } => {
            let form = quote_once(&config, amount, currency).await?;
            print!("{form}");
        }
        AppCommand::Form => {
            let session = start_session(&config, None, None)?;
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            cli::form::run(session, stdin, &mut console::Term::stdout()).await?;
        }
        AppCommand::LastQuoteId => match last_quote_id(&config).await? {
            Some(id) => println!("{id}"),
            None => println!("No quote has been fetched yet"),
        },
    }
    Ok(())
}

/// Fetches one quote with the given overrides and returns the rendered form.
pub async fn quote_once(
    config: &AppConfig,
    amount: Option<Amount>,
    currency: Option<Currency>,
) -> Result<String> {
    let session = start_session(config, amount, currency)?;
    cli::quote::run(session).await
}

/// Identifier of the last successful quote, as left in local storage.
pub async fn last_quote_id(config: &AppConfig) -> Result<Option<String>> {
    open_store(config)?.get(QUOTE_ID_KEY).await
}

fn open_store(config: &AppConfig) -> Result<Arc<dyn KeyValueStore>> {
    Ok(store::open(&config.default_data_path()?))
}

fn start_session(
    config: &AppConfig,
    amount: Option<Amount>,
    currency: Option<Currency>,
) -> Result<QuoteSession> {
    let quote_currency = match currency {
        Some(c) if !c.is_quote_option() => anyhow::bail!("{c} cannot be received"),
        Some(c) => c,
        None => config.initial_quote_currency()?,
    };
    let amount = match amount {
        Some(a) => a,
        None => config.initial_amount()?,
    };

    let provider: Arc<dyn QuoteProvider> = Arc::new(BalamQuoteProvider::new(
        &config.api.base_url,
        &config.api.token,
    )?);
    let options = SessionOptions {
        amount,
        quote_currency,
        ..Default::default()
    };
    Ok(QuoteSession::start(provider, open_store(config)?, options))
}

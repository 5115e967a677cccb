//! The quote form session: owns the form state and reacts to input, fetch
//! results and countdown ticks.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use super::amount::Amount;
use super::countdown::{Countdown, DEFAULT_TICK, Remaining, Tick};
use super::debounce::{DEFAULT_DEBOUNCE, Debouncer};
use super::error::{FetchError, FormError};
use super::quote::{Currency, Quote, QuoteProvider, QuoteRequest};
use crate::store::{KeyValueStore, QUOTE_ID_KEY};

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub amount: Amount,
    pub quote_currency: Currency,
    pub debounce: Duration,
    pub tick: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            amount: Amount::default(),
            quote_currency: Currency::Mxn,
            debounce: DEFAULT_DEBOUNCE,
            tick: DEFAULT_TICK,
        }
    }
}

/// Snapshot of the form as published to observers.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub amount: Amount,
    pub base_currency: Currency,
    pub quote_currency: Currency,
    pub quote: Option<Quote>,
    pub error: Option<FormError>,
    pub loading: bool,
    pub expiry: Option<Remaining>,
}

#[derive(Debug)]
enum FormEvent {
    AmountInput(String),
    SelectCurrency(Currency),
}

type FetchOutcome = (u64, Result<Quote, FetchError>);

/// Handle to a running form session.
///
/// The session task stops once this handle is dropped or closed, releasing the
/// debounce timer, the countdown and any request still in flight.
pub struct QuoteSession {
    events: mpsc::UnboundedSender<FormEvent>,
    state: watch::Receiver<FormState>,
    task: JoinHandle<()>,
}

impl QuoteSession {
    /// Starts the session and immediately fetches a quote for the initial
    /// amount and currency.
    pub fn start(
        provider: Arc<dyn QuoteProvider>,
        store: Arc<dyn KeyValueStore>,
        options: SessionOptions,
    ) -> Self {
        let initial = FormState {
            amount: options.amount,
            base_currency: Currency::Usd,
            quote_currency: options.quote_currency,
            quote: None,
            error: None,
            loading: false,
            expiry: None,
        };
        let (state_tx, state) = watch::channel(initial.clone());
        let (events, events_rx) = mpsc::unbounded_channel();
        let (ticks_tx, ticks_rx) = mpsc::unbounded_channel();

        let controller = Controller {
            provider,
            store,
            tick: options.tick,
            state: initial,
            state_tx,
            generation: 0,
            fetches: JoinSet::new(),
            countdown: None,
            ticks_tx,
        };
        let task = tokio::spawn(controller.run(options.debounce, events_rx, ticks_rx));

        Self {
            events,
            state,
            task,
        }
    }

    /// Feeds raw amount text, as typed. Only settled input is validated.
    pub fn input_amount(&self, raw: impl Into<String>) {
        let _ = self.events.send(FormEvent::AmountInput(raw.into()));
    }

    pub fn select_currency(&self, currency: Currency) {
        let _ = self.events.send(FormEvent::SelectCurrency(currency));
    }

    pub fn state(&self) -> FormState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FormState> {
        self.state.clone()
    }

    /// Stops the session and waits for it to release its resources.
    pub async fn close(self) {
        drop(self.events);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Quote session ended abnormally");
        }
    }
}

struct Controller {
    provider: Arc<dyn QuoteProvider>,
    store: Arc<dyn KeyValueStore>,
    tick: Duration,
    state: FormState,
    state_tx: watch::Sender<FormState>,
    generation: u64,
    fetches: JoinSet<FetchOutcome>,
    countdown: Option<Countdown>,
    ticks_tx: mpsc::UnboundedSender<Tick>,
}

impl Controller {
    async fn run(
        mut self,
        debounce: Duration,
        mut events: mpsc::UnboundedReceiver<FormEvent>,
        mut ticks: mpsc::UnboundedReceiver<Tick>,
    ) {
        info!("Quote session started");
        let (debouncer, mut settled) = Debouncer::spawn(debounce);

        self.trigger_fetch();
        self.publish();

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(FormEvent::AmountInput(raw)) => debouncer.push(raw),
                    Some(FormEvent::SelectCurrency(currency)) => self.select_currency(currency),
                    None => break,
                },
                Some(raw) = settled.recv() => self.commit_amount(&raw),
                Some(joined) = self.fetches.join_next() => self.complete_fetch(joined).await,
                Some(tick) = ticks.recv() => self.apply_tick(tick),
            }
            self.sync_countdown();
            self.publish();
        }

        info!("Quote session stopped");
    }

    fn commit_amount(&mut self, raw: &str) {
        match Amount::parse(raw) {
            Ok(amount) if amount != self.state.amount => {
                self.state.amount = amount;
                self.trigger_fetch();
            }
            Ok(_) => {
                // A fetch error stays until a new request replaces the quote.
                if matches!(self.state.error, Some(FormError::Validation(_))) {
                    self.state.error = None;
                }
            }
            Err(e) => {
                debug!(input = raw, "Rejected amount input");
                self.state.error = Some(e.into());
            }
        }
    }

    fn select_currency(&mut self, currency: Currency) {
        if !currency.is_quote_option() {
            warn!(%currency, "Ignoring selection of a non-quote currency");
            return;
        }
        if currency != self.state.quote_currency {
            self.state.quote_currency = currency;
            self.trigger_fetch();
        }
    }

    fn trigger_fetch(&mut self) {
        self.generation += 1;
        let generation = self.generation;
        let request = QuoteRequest {
            base_currency: self.state.base_currency,
            quote_currency: self.state.quote_currency,
            amount: self.state.amount,
        };
        info!(
            generation,
            "Fetching quote data for {} {} {}",
            request.base_currency,
            request.quote_currency,
            request.amount
        );

        self.state.loading = true;
        self.state.error = None;

        let provider = Arc::clone(&self.provider);
        self.fetches
            .spawn(async move { (generation, provider.fetch_quote(&request).await) });
    }

    async fn complete_fetch(&mut self, joined: Result<FetchOutcome, JoinError>) {
        let (generation, result) = match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Quote fetch task failed");
                return;
            }
        };
        if generation != self.generation {
            debug!(
                generation,
                latest = self.generation,
                "Discarding superseded quote response"
            );
            return;
        }

        self.state.loading = false;
        match result {
            Ok(quote) => {
                if let Err(e) = self.store.put(QUOTE_ID_KEY, &quote.quote_id).await {
                    warn!(error = %e, "Failed to persist quote id");
                }
                debug!(quote_id = %quote.quote_id, "Quote received");
                self.state.quote = Some(quote);
                self.state.error = None;
            }
            Err(e) => {
                warn!(error = %e, "Quote fetch failed");
                self.state.error = Some(e.into());
            }
        }
    }

    fn apply_tick(&mut self, tick: Tick) {
        let current = self.countdown.as_ref().map(Countdown::expiration);
        if current == Some(tick.expiration) {
            self.state.expiry = Some(tick.remaining);
        }
    }

    /// Keeps the countdown running exactly while an expiration is displayed.
    fn sync_countdown(&mut self) {
        let displayed: Option<DateTime<Utc>> = match self.state.error {
            Some(_) => None,
            None => self.state.quote.as_ref().map(|q| q.expiration_ts),
        };
        let running = self.countdown.as_ref().map(Countdown::expiration);
        if displayed == running {
            return;
        }

        self.countdown = None;
        self.state.expiry = None;
        if let Some(expiration) = displayed {
            let (countdown, initial) =
                Countdown::start(expiration, self.tick, self.ticks_tx.clone());
            self.countdown = Some(countdown);
            self.state.expiry = Some(initial);
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ValidationError;
    use crate::core::form::{Submission, submit};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use chrono::TimeDelta;
    use std::sync::Mutex;
    use tokio::time::timeout;

    /// Provider answering from the request itself, with a per-currency delay
    /// and optional forced failure.
    #[derive(Default)]
    struct FakeProvider {
        calls: Mutex<Vec<QuoteRequest>>,
        fail_with: Mutex<Option<FetchError>>,
        cop_delay: Duration,
        mxn_delay: Duration,
    }

    impl FakeProvider {
        fn calls(&self) -> Vec<QuoteRequest> {
            self.calls.lock().unwrap().clone()
        }

        fn fail_next(&self, error: FetchError) {
            *self.fail_with.lock().unwrap() = Some(error);
        }
    }

    #[async_trait]
    impl QuoteProvider for FakeProvider {
        async fn fetch_quote(&self, request: &QuoteRequest) -> Result<Quote, FetchError> {
            let call = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(*request);
                calls.len()
            };
            let delay = match request.quote_currency {
                Currency::Cop => self.cop_delay,
                _ => self.mxn_delay,
            };
            tokio::time::sleep(delay).await;
            if let Some(error) = self.fail_with.lock().unwrap().take() {
                return Err(error);
            }
            let amount = f64::from(request.amount.get());
            Ok(Quote {
                quote_id: format!("q-{call}"),
                pct_fee: 0.02,
                fixed_fee: 2.5,
                quote_amount: amount * 20.0,
                base_amount: amount,
                quote_currency: request.quote_currency.to_string(),
                base_currency: request.base_currency.to_string(),
                expiration_ts: Utc::now() + TimeDelta::minutes(5),
            })
        }
    }

    fn start(provider: &Arc<FakeProvider>, store: &Arc<MemoryStore>) -> QuoteSession {
        QuoteSession::start(
            Arc::clone(provider) as Arc<dyn QuoteProvider>,
            Arc::clone(store) as Arc<dyn KeyValueStore>,
            SessionOptions::default(),
        )
    }

    async fn wait_for(
        rx: &mut watch::Receiver<FormState>,
        pred: impl Fn(&FormState) -> bool,
    ) -> FormState {
        timeout(Duration::from_secs(3600), async {
            loop {
                {
                    let state = rx.borrow_and_update();
                    if pred(&state) {
                        return state.clone();
                    }
                }
                rx.changed().await.expect("session stopped");
            }
        })
        .await
        .expect("form never reached the expected state")
    }

    fn settled_quote(state: &FormState) -> bool {
        !state.loading && state.quote.is_some()
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_fetch_persists_quote_id() {
        let provider = Arc::new(FakeProvider::default());
        let store = Arc::new(MemoryStore::new());
        let session = start(&provider, &store);
        let mut rx = session.subscribe();

        let state = wait_for(&mut rx, settled_quote).await;

        assert_eq!(state.amount.get(), 10);
        assert!(state.error.is_none());
        assert_eq!(provider.calls().len(), 1);
        assert_eq!(provider.calls()[0].quote_currency, Currency::Mxn);
        assert_eq!(provider.calls()[0].base_currency, Currency::Usd);
        assert_eq!(
            store.get(QUOTE_ID_KEY).await.unwrap(),
            Some("q-1".to_string())
        );
        session.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_input_triggers_one_fetch() {
        let provider = Arc::new(FakeProvider::default());
        let store = Arc::new(MemoryStore::new());
        let session = start(&provider, &store);
        let mut rx = session.subscribe();
        wait_for(&mut rx, settled_quote).await;

        session.input_amount("1");
        session.input_amount("10");
        session.input_amount("100");

        let state = wait_for(&mut rx, |s| s.amount.get() == 100 && settled_quote(s)).await;

        let calls = provider.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].amount.get(), 100);
        assert_eq!(state.quote.unwrap().base_amount, 100.0);
        assert_eq!(
            store.get(QUOTE_ID_KEY).await.unwrap(),
            Some("q-2".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_boundary_amounts_are_accepted() {
        let provider = Arc::new(FakeProvider::default());
        let store = Arc::new(MemoryStore::new());
        let session = start(&provider, &store);
        let mut rx = session.subscribe();
        wait_for(&mut rx, settled_quote).await;

        session.input_amount("3");
        wait_for(&mut rx, |s| s.amount.get() == 3 && settled_quote(s)).await;
        session.input_amount("999");
        wait_for(&mut rx, |s| s.amount.get() == 999 && settled_quote(s)).await;

        assert_eq!(provider.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_range_keeps_committed_amount() {
        let provider = Arc::new(FakeProvider::default());
        let store = Arc::new(MemoryStore::new());
        let session = start(&provider, &store);
        let mut rx = session.subscribe();
        wait_for(&mut rx, settled_quote).await;

        for raw in ["2", "1000", "abc"] {
            session.input_amount(raw);
            let state = wait_for(&mut rx, |s| {
                matches!(s.error, Some(FormError::Validation(_)))
            })
            .await;
            assert_eq!(state.amount.get(), 10);
            assert!(state.expiry.is_none(), "countdown hidden while in error");

            // A valid value clears the error again
            session.input_amount("10");
            wait_for(&mut rx, |s| s.error.is_none()).await;
        }

        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_validation_error_message() {
        let provider = Arc::new(FakeProvider::default());
        let store = Arc::new(MemoryStore::new());
        let session = start(&provider, &store);
        let mut rx = session.subscribe();
        wait_for(&mut rx, settled_quote).await;

        session.input_amount("1000");
        let state = wait_for(&mut rx, |s| s.error.is_some()).await;

        assert_eq!(
            state.error,
            Some(FormError::Validation(ValidationError::OutOfRange(1000)))
        );
        assert_eq!(
            state.error.unwrap().to_string(),
            "El monto debe estar entre 3 y 999"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_currency_change_triggers_one_fetch() {
        let provider = Arc::new(FakeProvider::default());
        let store = Arc::new(MemoryStore::new());
        let session = start(&provider, &store);
        let mut rx = session.subscribe();
        wait_for(&mut rx, settled_quote).await;

        session.select_currency(Currency::Mxn);
        session.select_currency(Currency::Cop);
        let state = wait_for(&mut rx, |s| {
            settled_quote(s) && s.quote.as_ref().is_some_and(|q| q.quote_currency == "COP")
        })
        .await;

        let calls = provider.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].quote_currency, Currency::Cop);
        assert_eq!(state.quote_currency, Currency::Cop);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_sets_error_and_recovers() {
        let provider = Arc::new(FakeProvider::default());
        let store = Arc::new(MemoryStore::new());
        let session = start(&provider, &store);
        let mut rx = session.subscribe();
        wait_for(&mut rx, settled_quote).await;

        provider.fail_next(FetchError::Status(500));
        session.select_currency(Currency::Cop);
        let failed = wait_for(&mut rx, |s| !s.loading && s.error.is_some()).await;

        assert_eq!(
            failed.error,
            Some(FormError::Fetch(FetchError::Status(500)))
        );
        assert_eq!(failed.quote.as_ref().unwrap().quote_currency, "MXN");
        assert!(failed.expiry.is_none());
        assert_eq!(
            store.get(QUOTE_ID_KEY).await.unwrap(),
            Some("q-1".to_string())
        );

        session.input_amount("50");
        let recovered = wait_for(&mut rx, |s| s.amount.get() == 50 && settled_quote(s)).await;
        assert!(recovered.error.is_none());
        assert!(recovered.expiry.is_some());
        assert_eq!(provider.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_amount_keeps_fetch_error() {
        let provider = Arc::new(FakeProvider::default());
        let store = Arc::new(MemoryStore::new());
        let session = start(&provider, &store);
        let mut rx = session.subscribe();
        wait_for(&mut rx, settled_quote).await;

        provider.fail_next(FetchError::Status(500));
        session.select_currency(Currency::Cop);
        wait_for(&mut rx, |s| !s.loading && s.error.is_some()).await;

        session.input_amount("10");
        tokio::time::sleep(Duration::from_secs(2)).await;

        let state = session.state();
        assert_eq!(state.quote_currency, Currency::Cop);
        assert_eq!(
            state.error,
            Some(FormError::Fetch(FetchError::Status(500)))
        );
        assert!(state.expiry.is_none());
        assert_eq!(submit(&state), Submission::Blocked);
        assert_eq!(provider.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_response_is_discarded() {
        let provider = Arc::new(FakeProvider {
            mxn_delay: Duration::from_secs(10),
            cop_delay: Duration::from_secs(1),
            ..Default::default()
        });
        let store = Arc::new(MemoryStore::new());
        let session = start(&provider, &store);
        let mut rx = session.subscribe();

        session.select_currency(Currency::Cop);
        wait_for(&mut rx, settled_quote).await;

        // Let the slower MXN response arrive after the COP one.
        tokio::time::sleep(Duration::from_secs(20)).await;

        let state = session.state();
        assert_eq!(provider.calls().len(), 2);
        assert_eq!(state.quote.unwrap().quote_currency, "COP");
        assert!(!state.loading);
        assert_eq!(
            store.get(QUOTE_ID_KEY).await.unwrap(),
            Some("q-2".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_runs_to_expired() {
        let provider = Arc::new(FakeProvider::default());
        let store = Arc::new(MemoryStore::new());
        let session = start(&provider, &store);
        let mut rx = session.subscribe();

        let state = wait_for(&mut rx, settled_quote).await;
        assert_eq!(
            state.expiry.unwrap().to_string(),
            "Válido por 4 minutos y 59 segundos"
        );

        let state = wait_for(&mut rx, |s| s.expiry == Some(Remaining::Expired)).await;
        assert_eq!(state.expiry.unwrap().to_string(), "Expirado");
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_stops_session() {
        let provider = Arc::new(FakeProvider::default());
        let store = Arc::new(MemoryStore::new());
        let session = start(&provider, &store);
        let mut rx = session.subscribe();
        wait_for(&mut rx, settled_quote).await;

        session.input_amount("20");
        session.close().await;

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(provider.calls().len(), 1);
        rx.borrow_and_update();
        assert!(rx.changed().await.is_err());
    }
}

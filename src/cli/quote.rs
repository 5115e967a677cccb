use super::ui;
use crate::core::form::FormView;
use crate::core::session::{FormState, QuoteSession};
use anyhow::{Result, anyhow};
use tokio::sync::watch;

/// Waits for the first response of a fresh session, success or failure.
pub async fn first_response(session: &QuoteSession) -> Result<FormState> {
    let mut rx = session.subscribe();
    wait_settled(&mut rx).await
}

async fn wait_settled(rx: &mut watch::Receiver<FormState>) -> Result<FormState> {
    loop {
        {
            let state = rx.borrow_and_update();
            if !state.loading && (state.quote.is_some() || state.error.is_some()) {
                return Ok(state.clone());
            }
        }
        rx.changed()
            .await
            .map_err(|_| anyhow!("Quote session stopped before answering"))?;
    }
}

/// Fetches a single quote and renders the resulting form.
pub async fn run(session: QuoteSession) -> Result<String> {
    let spinner = ui::new_spinner("Fetching quote...");
    let state = first_response(&session).await;
    spinner.finish_and_clear();
    session.close().await;

    let state = state?;
    match (FormView::from_state(&state), state.error) {
        (Some(view), None) => Ok(ui::render_form(&view)),
        (_, Some(error)) => Err(error.into()),
        (None, None) => Err(anyhow!("No quote received")),
    }
}

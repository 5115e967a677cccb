use super::ui::{self, StyleType};
use crate::core::form::{FormView, Submission, submit};
use crate::core::quote::Currency;
use crate::core::session::{FormState, QuoteSession};
use anyhow::Result;
use console::Term;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

const HELP: &str =
    "Escribe un monto (3-999), /currency MXN|COP, /send para enviar, /quit para salir";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Amount(String),
    Currency(Currency),
    Send,
    Help,
    Quit,
    Invalid(String),
}

/// Interprets one line of input. Anything that is not a slash command is an
/// amount keystroke.
pub fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Command::Amount(trimmed.to_string());
    };
    let mut parts = rest.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("quit" | "q"), None) => Command::Quit,
        (Some("send"), None) => Command::Send,
        (Some("help"), None) => Command::Help,
        (Some("currency"), Some(code)) => match code.parse::<Currency>() {
            Ok(currency) if currency.is_quote_option() => Command::Currency(currency),
            Ok(currency) => Command::Invalid(format!("{currency} no se puede recibir")),
            Err(e) => Command::Invalid(e.to_string()),
        },
        _ => Command::Invalid(format!("Comando desconocido: {trimmed}")),
    }
}

/// Text shown for the current state, with an optional notice below the form.
pub fn screen(state: &FormState, notice: Option<&str>) -> String {
    let mut out = match FormView::from_state(state) {
        Some(view) => ui::render_form(&view),
        None => match &state.error {
            Some(error) => format!("{}\n", ui::style_text(&error.to_string(), StyleType::Error)),
            None => format!("{}\n", ui::style_text("Cargando cotización...", StyleType::Subtle)),
        },
    };
    if let Some(notice) = notice {
        out.push_str(notice);
        out.push('\n');
    }
    out.push_str(&ui::style_text(HELP, StyleType::Subtle));
    out.push('\n');
    out
}

/// Where the interactive form is drawn. Each call replaces the previous frame.
pub trait Screen {
    fn show(&mut self, text: &str) -> Result<()>;
}

impl Screen for Term {
    fn show(&mut self, text: &str) -> Result<()> {
        self.clear_screen()?;
        self.write_str(text)?;
        Ok(())
    }
}

/// Runs the interactive form until `/quit` or end of input.
pub async fn run<R, S>(session: QuoteSession, input: R, screen_out: &mut S) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    S: Screen,
{
    let mut lines = input.lines();
    let mut rx = session.subscribe();
    let mut notice: Option<String> = None;

    redraw(screen_out, &rx.borrow_and_update(), notice.as_deref())?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    Command::Amount(raw) => {
                        notice = None;
                        session.input_amount(raw);
                    }
                    Command::Currency(currency) => {
                        notice = None;
                        session.select_currency(currency);
                    }
                    Command::Send => {
                        notice = match submit(&session.state()) {
                            Submission::Confirmed(message) => {
                                Some(ui::style_text(message, StyleType::Success))
                            }
                            Submission::Blocked => {
                                debug!("Submit blocked");
                                None
                            }
                        };
                    }
                    Command::Help => notice = None,
                    Command::Quit => break,
                    Command::Invalid(message) => {
                        notice = Some(ui::style_text(&message, StyleType::Error));
                    }
                }
                let state = session.state();
                redraw(screen_out, &state, notice.as_deref())?;
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = rx.borrow_and_update().clone();
                redraw(screen_out, &state, notice.as_deref())?;
            }
        }
    }

    session.close().await;
    Ok(())
}

fn redraw<S: Screen>(out: &mut S, state: &FormState, notice: Option<&str>) -> Result<()> {
    out.show(&screen(state, notice))
}

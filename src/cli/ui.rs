use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::core::form::{DELIVERY_NOTICE, FormView};

/// Defines different styles for text elements.
pub enum StyleType {
    Value,
    Error,
    Subtle,
    Success,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Value => style(text).green().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
        StyleType::Success => style(text).green(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled label cell for the form.
pub fn label_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn value_cell(text: &str) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// Spinner shown while a quote request is in flight.
pub fn new_spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Renders the quote form as text.
pub fn render_form(view: &FormView) -> String {
    let mut table = new_styled_table();
    table.add_row(vec![
        label_cell("Tu envías exactamente"),
        value_cell(&format!("{} {}", view.send_amount, view.base_currency)),
        Cell::new(view.base_currency.label()).fg(Color::DarkGrey),
    ]);
    table.add_row(vec![
        label_cell("Percentage quotation fee"),
        value_cell(&view.pct_fee),
        Cell::new(""),
    ]);
    table.add_row(vec![
        label_cell("Fixed quotation fee"),
        value_cell(&view.fixed_fee),
        Cell::new(""),
    ]);
    if let Some(rate) = &view.rate {
        table.add_row(vec![
            label_cell("Balam Rate"),
            value_cell(rate),
            Cell::new(view.expiry.as_deref().unwrap_or("")).fg(Color::DarkGrey),
        ]);
    }
    table.add_row(vec![
        label_cell("Recibes exactamente"),
        value_cell(&format!("{} {}", view.receive_amount, view.quote_currency)),
        Cell::new(view.quote_currency.label()).fg(Color::DarkGrey),
    ]);

    let mut out = format!("{}\n", table);
    if let Some(error) = &view.error {
        out.push_str(&style_text(error, StyleType::Error));
        out.push('\n');
    }
    out.push_str(&style_text(DELIVERY_NOTICE, StyleType::Subtle));
    out.push('\n');
    let send = if view.can_submit {
        style_text("[Enviar ahora]", StyleType::Value)
    } else {
        style_text("[Enviar ahora]", StyleType::Subtle)
    };
    out.push_str(&send);
    out.push('\n');
    out
}

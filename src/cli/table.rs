//! Box-drawn tables for model and session listings.

use crate::history::SessionInfo;
use crate::types::{ChatOptions, ModelConfig};
use crate::utils::time;

/// Horizontal alignment of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// A column: header, width bounds and alignment.
#[derive(Debug, Clone)]
pub struct Column {
    pub header: String,
    pub min_width: usize,
    pub max_width: usize,
    pub align: Align,
}

impl Column {
    pub fn new(header: &str, min_width: usize, max_width: usize) -> Self {
        Self {
            header: header.to_string(),
            min_width,
            max_width,
            align: Align::Left,
        }
    }

    pub fn centered(mut self) -> Self {
        self.align = Align::Center;
        self
    }
}

/// A light box-drawn table with a separator between every row.
#[derive(Debug, Clone)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let widest = self
                    .rows
                    .iter()
                    .filter_map(|row| row.get(idx))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(column.header.chars().count()))
                    .max()
                    .unwrap_or(0);
                widest.clamp(column.min_width, column.max_width.max(column.min_width))
            })
            .collect()
    }

    fn rule(widths: &[usize], left: char, mid: char, right: char) -> String {
        let mut line = String::new();
        line.push(left);
        for (idx, width) in widths.iter().enumerate() {
            if idx > 0 {
                line.push(mid);
            }
            line.extend(std::iter::repeat_n('─', width + 2));
        }
        line.push(right);
        line
    }

    fn line(&self, widths: &[usize], cells: &[String]) -> String {
        let mut line = String::from("│");
        for (idx, (column, width)) in self.columns.iter().zip(widths).enumerate() {
            let cell = cells.get(idx).map(String::as_str).unwrap_or("");
            let cell = truncate(cell, *width);
            let pad = width - cell.chars().count();
            let (before, after) = match column.align {
                Align::Left => (0, pad),
                Align::Center => (pad / 2, pad - pad / 2),
            };
            line.push(' ');
            line.extend(std::iter::repeat_n(' ', before));
            line.push_str(&cell);
            line.extend(std::iter::repeat_n(' ', after));
            line.push_str(" │");
        }
        line
    }

    /// Render the table, one line per `\n`.
    pub fn render(&self) -> String {
        let widths = self.widths();
        let headers: Vec<String> = self.columns.iter().map(|c| c.header.clone()).collect();
        let mut out = Vec::new();
        out.push(Self::rule(&widths, '┌', '┬', '┐'));
        out.push(self.line(&widths, &headers));
        for row in &self.rows {
            out.push(Self::rule(&widths, '├', '┼', '┤'));
            out.push(self.line(&widths, row));
        }
        out.push(Self::rule(&widths, '└', '┴', '┘'));
        let mut rendered = out.join("\n");
        rendered.push('\n');
        rendered
    }
}

/// Shorten `text` to at most `max` characters, ending in `...` when cut.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max <= 3 {
        return text.chars().take(max).collect();
    }
    let mut out: String = text.chars().take(max - 3).collect();
    out.push_str("...");
    out
}

/// Hide all but the first and last four characters of an API key.
///
/// Keys of eight characters or fewer are hidden entirely.
pub fn mask_api_key(api_key: &str) -> String {
    let chars: Vec<char> = api_key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let prefix: String = chars[..4].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{prefix}{}{suffix}", "*".repeat(chars.len() - 8))
}

/// Shorten a long model name: keep the last path segment, or cut it.
fn short_model_name(name: &str) -> String {
    if name.chars().count() <= 25 {
        return name.to_string();
    }
    match name.rsplit_once('/') {
        Some((_, last)) => last.to_string(),
        None => truncate(name, 25),
    }
}

fn parameters(config: &ModelConfig) -> String {
    match &config.default_chat_options {
        Some(options) => format!(
            "Temp:{:.2} MaxTokens:{}",
            options.temperature, options.max_tokens
        ),
        None => {
            let defaults = ChatOptions::default();
            format!(
                "Global defaults(Temp:{:.2} MaxTokens:{})",
                defaults.temperature, defaults.max_tokens
            )
        }
    }
}

/// The `ai model list` table.
pub fn model_table(configs: &[ModelConfig], default_name: Option<&str>) -> String {
    let mut table = Table::new(vec![
        Column::new("Default", 7, 7).centered(),
        Column::new("Name", 10, 25),
        Column::new("URL", 10, 30),
        Column::new("API Key", 10, 20),
        Column::new("Parameters", 15, 45),
    ]);
    for config in configs {
        let mark = if Some(config.name.as_str()) == default_name {
            "✓"
        } else {
            ""
        };
        table.push_row(vec![
            mark.to_string(),
            short_model_name(&config.name),
            config.url.clone(),
            mask_api_key(&config.api_key),
            parameters(config),
        ]);
    }
    table.render()
}

/// The `ai session list` table.
pub fn session_table(sessions: &[SessionInfo], current_id: &str) -> String {
    let mut table = Table::new(vec![
        Column::new("Current", 7, 7).centered(),
        Column::new("No.", 4, 8).centered(),
        Column::new("ID", 22, 30),
        Column::new("Updated At", 19, 20),
        Column::new("Messages", 8, 10).centered(),
        Column::new("Preview", 20, 40),
    ]);
    for (idx, session) in sessions.iter().enumerate() {
        let mark = if session.id == current_id { "✓" } else { "" };
        table.push_row(vec![
            mark.to_string(),
            (idx + 1).to_string(),
            session.id.clone(),
            time::listing(session.updated_at),
            session.message_count.to_string(),
            session.preview.replace('\n', " "),
        ]);
    }
    table.render()
}

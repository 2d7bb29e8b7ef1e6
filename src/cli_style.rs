use crate::catalog_store::RowSet;
use clap::builder::styling::{AnsiColor, Color, Style};
use clap::builder::Styles;
use crossterm::style::{Attribute, Stylize};
use unicode_width::UnicodeWidthStr;

pub fn get_styles() -> Styles {
    clap::builder::Styles::styled()
        .usage(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .header(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .literal(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
        )
        .invalid(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .error(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .valid(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
        )
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))))
}

pub mod colors {
    use crossterm::style::Color;

    pub const GREEN: Color = Color::Rgb { r: 80, g: 220, b: 120 };
    pub const YELLOW: Color = Color::Rgb { r: 255, g: 210, b: 70 };
    pub const RED: Color = Color::Rgb { r: 255, g: 95, b: 95 };
    pub const CYAN: Color = Color::Rgb { r: 90, g: 200, b: 250 };
    pub const DIM: Color = Color::Rgb { r: 128, g: 128, b: 128 };
    pub const WHITE: Color = Color::Rgb { r: 235, g: 235, b: 235 };
}

pub fn print_success(message: &str) {
    println!("{} {}", "✔".with(colors::GREEN).bold(), message);
}

pub fn print_error(message: &str) {
    println!("{} {}", "✘".with(colors::RED).bold(), message.with(colors::RED));
}

pub fn print_warning(message: &str) {
    println!("{} {}", "!".with(colors::YELLOW).bold(), message.with(colors::YELLOW));
}

pub fn print_info(message: &str) {
    println!("{} {}", "·".with(colors::CYAN), message);
}

pub fn print_section_header(title: &str) {
    let line = "─".repeat(title.width() + 2);
    println!("{}", line.clone().with(colors::DIM));
    println!(" {}", title.with(colors::CYAN).bold());
    println!("{}", line.with(colors::DIM));
}

pub fn print_empty_list(message: &str) {
    println!("{}", message.with(colors::DIM).attribute(Attribute::Italic));
}

pub fn get_prompt() -> String {
    format!("{} ", "kiwi ❯".with(colors::GREEN).bold())
}

pub fn print_welcome(db_path: &str) {
    println!();
    println!("{}", "KIWI MUSIC CATALOG".with(colors::GREEN).bold());
    println!("{} {}", "database:".with(colors::DIM), db_path.with(colors::WHITE));
    println!(
        "{}",
        "Type 'help' for the command list, 'exit' to quit.".with(colors::DIM)
    );
    println!();
}

pub fn print_goodbye() {
    println!("{}", "Goodbye!".with(colors::GREEN).bold());
}

pub struct TableBuilder {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    col_widths: Vec<usize>,
}

impl TableBuilder {
    pub fn new<S: Into<String>>(headers: Vec<S>) -> Self {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let col_widths = headers.iter().map(|h| h.width()).collect();
        TableBuilder {
            headers,
            rows: Vec::new(),
            col_widths,
        }
    }

    pub fn add_row<S: Into<String>>(&mut self, row: Vec<S>) {
        let row: Vec<String> = row.into_iter().map(Into::into).collect();
        for (i, cell) in row.iter().enumerate() {
            if i < self.col_widths.len() {
                self.col_widths[i] = self.col_widths[i].max(cell.width());
            }
        }
        self.rows.push(row);
    }

    pub fn print(&self) {
        let mut header_line = String::new();
        let mut separator = String::new();
        for (i, header) in self.headers.iter().enumerate() {
            let width = self.col_widths[i];
            header_line.push_str(&format!("{:<width$}   ", header, width = width));
            separator.push_str(&format!("{}   ", "─".repeat(width)));
        }
        println!("{}", header_line.trim_end().with(colors::CYAN).bold());
        println!("{}", separator.trim_end().with(colors::DIM));

        for row in &self.rows {
            let mut line = String::new();
            for (i, cell) in row.iter().enumerate() {
                let width = self.col_widths.get(i).copied().unwrap_or(0);
                let padding = width.saturating_sub(cell.width());
                line.push_str(cell);
                line.push_str(&" ".repeat(padding + 3));
            }
            println!("{}", line.trim_end());
        }
        println!(
            "{}",
            format!("{} row(s)", self.rows.len())
                .with(colors::DIM)
                .attribute(Attribute::Italic)
        );
    }
}

/// Renders a query result the way every tabular screen of the app shows it.
pub fn print_row_set(row_set: &RowSet) {
    if row_set.is_empty() {
        print_empty_list("No records found.");
        return;
    }
    let mut table = TableBuilder::new(row_set.columns.iter().map(String::as_str).collect());
    for row in &row_set.rows {
        table.add_row(row.iter().map(|cell| cell.to_string()).collect());
    }
    table.print();
}

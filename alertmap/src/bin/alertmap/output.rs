use anyhow::Result;
use clap::ValueEnum;
use colored::{Color, Colorize};
use comfy_table::{Attribute, Cell, Color as TableColor, Table};
use serde::Serialize;

use alertmap::{Category, RecomputeSummary, UserProfile};

/// Icon and color for each kind of status line.
#[derive(Clone, Copy)]
enum Tone {
    Success,
    Error,
    Warning,
    Info,
    Detail,
}

impl Tone {
    fn icon(self) -> &'static str {
        match self {
            Tone::Success => "✓",
            Tone::Error => "✗",
            Tone::Warning => "⚠",
            Tone::Info => "ℹ",
            Tone::Detail => "→",
        }
    }

    fn color(self) -> Color {
        match self {
            Tone::Success => Color::Green,
            Tone::Error => Color::Red,
            Tone::Warning => Color::Yellow,
            Tone::Info => Color::Blue,
            Tone::Detail => Color::BrightBlack,
        }
    }
}

/// Output format options for CLI commands
#[derive(Clone, Debug, ValueEnum, Default, PartialEq)]
pub enum OutputFormat {
    /// Formatted table output (default)
    #[default]
    Table,
    /// JSON output for scripting
    Json,
    /// Compact single-line output
    Compact,
}

/// Global CLI options that affect output and behavior
#[derive(Clone, Debug, Default)]
pub struct GlobalOptions {
    pub output_format: OutputFormat,
    pub quiet: bool,
    pub verbose: bool,
    pub no_color: bool,
}

/// Trait for data that can be displayed as a table
pub trait TableDisplay {
    fn to_table(&self, options: &GlobalOptions) -> Table;
    fn to_compact(&self) -> String;
}

/// Output manager handles formatting and display
pub struct OutputManager {
    pub options: GlobalOptions,
}

impl OutputManager {
    pub fn new(options: GlobalOptions) -> Self {
        Self { options }
    }

    /// Display data according to the configured output format
    pub fn display<T>(&self, data: &T) -> Result<()>
    where
        T: Serialize + TableDisplay,
    {
        if self.options.quiet {
            return Ok(());
        }

        match self.options.output_format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(data)?;
                println!("{json}");
            }
            OutputFormat::Table => {
                let table = data.to_table(&self.options);
                println!("{table}");
            }
            OutputFormat::Compact => {
                println!("{}", data.to_compact());
            }
        }
        Ok(())
    }

    fn line(&self, tone: Tone, message: &str) -> String {
        if self.options.no_color {
            format!("{} {message}", tone.icon())
        } else {
            format!("{} {}", tone.icon().color(tone.color()), message.color(tone.color()))
        }
    }

    /// Display a success message with color and icon
    pub fn success(&self, message: &str) {
        if !self.options.quiet {
            println!("{}", self.line(Tone::Success, message));
        }
    }

    /// Display an error message with color and icon
    pub fn error(&self, message: &str) {
        eprintln!("{}", self.line(Tone::Error, message));
    }

    /// Display a warning message
    pub fn warning(&self, message: &str) {
        if !self.options.quiet {
            println!("{}", self.line(Tone::Warning, message));
        }
    }

    /// Display info message with color and icon
    pub fn info(&self, message: &str) {
        if !self.options.quiet {
            println!("{}", self.line(Tone::Info, message));
        }
    }

    /// Display verbose information (only if verbose mode is enabled)
    pub fn verbose(&self, message: &str) {
        if self.options.verbose && !self.options.quiet {
            eprintln!("{}", self.line(Tone::Detail, message));
        }
    }

    /// Display a heading
    pub fn heading(&self, text: &str) {
        if !self.options.quiet && self.options.output_format == OutputFormat::Table {
            let output = if self.options.no_color {
                format!("\n{text}\n{}", "=".repeat(text.chars().count()))
            } else {
                format!("\n{}", text.bright_blue().bold())
            };
            println!("{output}");
        }
    }
}

/// Create a themed table
pub fn create_table(options: &GlobalOptions) -> Table {
    let mut table = Table::new();

    if !options.no_color {
        table.load_preset(comfy_table::presets::UTF8_FULL_CONDENSED);
    } else {
        table.load_preset(comfy_table::presets::ASCII_FULL);
    }

    table
}

/// Add themed header to table
pub fn add_table_header(table: &mut Table, options: &GlobalOptions, headers: &[&str]) {
    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|h| {
            let cell = Cell::new(h).add_attribute(Attribute::Bold);
            if options.no_color { cell } else { cell.fg(TableColor::Cyan) }
        })
        .collect();
    table.set_header(header_cells);
}

fn key_value_table(options: &GlobalOptions, rows: Vec<(&str, String)>) -> Table {
    let mut table = create_table(options);
    add_table_header(&mut table, options, &["Field", "Value"]);
    for (key, value) in rows {
        table.add_row(vec![Cell::new(key).add_attribute(Attribute::Bold), Cell::new(value)]);
    }
    table
}

impl TableDisplay for Vec<Category> {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = create_table(options);
        add_table_header(&mut table, options, &["Key", "Name", "Icon", "Color", "Description"]);
        if self.is_empty() {
            table.add_row(vec![Cell::new("No categories configured")]);
        }
        for category in self {
            table.add_row(vec![
                Cell::new(&category.key),
                Cell::new(&category.name),
                Cell::new(&category.icon),
                Cell::new(&category.color),
                Cell::new(&category.description),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        self.iter().map(|category| category.key.as_str()).collect::<Vec<_>>().join(",")
    }
}

impl TableDisplay for UserProfile {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        key_value_table(
            options,
            vec![
                ("user_id", self.user_id.to_string()),
                ("phone", self.phone.clone()),
                ("avatar", self.avatar.clone().unwrap_or_default()),
                ("alerts_reported", self.alerts_reported.to_string()),
                ("alerts_resolved", self.alerts_resolved.to_string()),
                ("reputation_points", self.reputation_points.to_string()),
                ("updated_at", self.updated_at.to_rfc3339()),
            ],
        )
    }

    fn to_compact(&self) -> String {
        format!(
            "{} reported={} resolved={} reputation={}",
            self.user_id, self.alerts_reported, self.alerts_resolved, self.reputation_points
        )
    }
}

impl TableDisplay for RecomputeSummary {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        key_value_table(
            options,
            vec![("alerts", self.alerts.to_string()), ("users", self.users.to_string())],
        )
    }

    fn to_compact(&self) -> String {
        format!("alerts={} users={}", self.alerts, self.users)
    }
}

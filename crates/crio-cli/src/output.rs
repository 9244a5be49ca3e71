//! Output formatting for the crio CLI (table, json, csv)

use clap::ValueEnum;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// ASCII table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}

/// Context for output rendering
pub struct OutputContext {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool, quiet: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format, quiet }
    }

    /// Print a success message (unless in quiet mode)
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg.green());
        }
    }

    /// Print an info message (unless in quiet mode)
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg);
        }
    }

    /// Print an error message
    pub fn error(&self, msg: &str) {
        eprintln!("{}", msg.red());
    }

    /// Print a contract-violation banner followed by the detail
    pub fn violation(&self, msg: &str) {
        eprintln!("{}", "controller contract violation".red().bold().underline());
        eprintln!("{}", msg.red());
    }

    /// Print rows in the configured format
    pub fn print<T: Tabled + Serialize>(&self, data: &[T]) {
        match self.format {
            OutputFormat::Table => {
                if data.is_empty() {
                    if !self.quiet {
                        println!("No data");
                    }
                } else {
                    println!("{}", Table::new(data));
                }
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(data).unwrap_or_else(|_| "[]".to_string())
                );
            }
            OutputFormat::Csv => print_csv(data),
        }
    }

    /// Print a JSON object as key-value pairs
    pub fn print_object(&self, object: &serde_json::Map<String, Value>) {
        match self.format {
            OutputFormat::Table => {
                if object.is_empty() {
                    if !self.quiet {
                        println!("No data");
                    }
                    return;
                }
                for (key, value) in object {
                    println!("{}: {}", key.bold(), format_value(value));
                }
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(object).unwrap_or_else(|_| "{}".to_string())
                );
            }
            OutputFormat::Csv => {
                let keys: Vec<String> = object.keys().map(|k| escape_csv(k)).collect();
                println!("{}", keys.join(","));
                let values: Vec<String> = object
                    .values()
                    .map(|v| escape_csv(&format_value(v)))
                    .collect();
                println!("{}", values.join(","));
            }
        }
    }
}

/// Print data as CSV
fn print_csv<T: Serialize>(data: &[T]) {
    let Some(first) = data.first() else {
        return;
    };

    // Field names from the first item
    let Ok(Value::Object(map)) = serde_json::to_value(first) else {
        return;
    };
    let headers: Vec<&str> = map.keys().map(String::as_str).collect();
    println!("{}", headers.join(","));

    for item in data {
        if let Ok(Value::Object(row)) = serde_json::to_value(item) {
            let values: Vec<String> = headers
                .iter()
                .map(|h| {
                    row.get(*h)
                        .map(|v| escape_csv(&format_value(v)))
                        .unwrap_or_default()
                })
                .collect();
            println!("{}", values.join(","));
        }
    }
}

/// Escape a value for CSV output
fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Format a JSON value for display
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => value.to_string(),
    }
}

// =============================================================================
// Display types
// =============================================================================

/// One process tag for the current command
#[derive(Debug, Tabled, Serialize)]
pub struct TagRow {
    #[tabled(rename = "Tag")]
    pub tag: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Unit")]
    pub unit: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&Value::Null), "-");
        assert_eq!(format_value(&json!("open")), "open");
        assert_eq!(format_value(&json!(21.5)), "21.5");
        assert_eq!(format_value(&json!([1, "a"])), "1, a");
        assert_eq!(format_value(&json!({"k": 1})), r#"{"k":1}"#);
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("kg/h"), "kg/h");
        assert_eq!(escape_csv("a,b"), "\"a,b\"");
        assert_eq!(escape_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_output_format_from_config_string() {
        let format: OutputFormat = serde_json::from_value(json!("csv")).unwrap();
        assert_eq!(format, OutputFormat::Csv);
    }
}

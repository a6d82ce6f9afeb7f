// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (scripts), and JSON output modes.

use crate::types::{KeySet, User};
use serde::Serialize;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly labelled output
    Normal,
    /// Bare values only
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Print a single named value.
    pub fn value(&self, label: &str, value: &str) {
        match self.mode {
            OutputMode::Normal => println!("{label}: {value}"),
            OutputMode::Quiet => println!("{value}"),
            OutputMode::Json => print_json(&serde_json::json!({ label.to_lowercase(): value })),
        }
    }

    /// Print a raw block of text (e.g. a key listing) unchanged.
    pub fn text(&self, text: &str) {
        match self.mode {
            OutputMode::Json => print_json(&serde_json::json!({ "text": text })),
            _ => print!("{text}"),
        }
    }

    /// Print the user's profile.
    pub fn bio(&self, user: &User) {
        match self.mode {
            OutputMode::Json => print_json(user),
            _ => println!("{}", key_value_view(&bio_fields(user))),
        }
    }

    /// Print linked keys with metadata.
    pub fn keys(&self, keys: &KeySet) {
        match self.mode {
            OutputMode::Json => print_json(keys),
            OutputMode::Quiet => {
                for entry in &keys.keys {
                    println!("{}", entry.key);
                }
            }
            OutputMode::Normal => {
                for entry in &keys.keys {
                    let marker = if entry.id == keys.active_key { "*" } else { " " };
                    let added = entry
                        .created_at
                        .map(|t| t.format(DATE_FORMAT).to_string())
                        .unwrap_or_default();
                    println!("{marker} {}  {}", entry.key, added);
                }
            }
        }
    }

    /// Print a success message (suppressed in quiet mode).
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => println!("{message}"),
            OutputMode::Quiet => {}
            OutputMode::Json => print_json(&JsonEvent {
                event: "success",
                message,
            }),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "error",
                    message,
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    eprintln!("{json}");
                }
            }
        }
    }
}

const DATE_FORMAT: &str = "%d %b %Y";
const NO_NAME: &str = "(none set)";

/// Label/value pairs shown for a profile.
pub fn bio_fields(user: &User) -> Vec<(&'static str, String)> {
    let name = if user.has_name() {
        user.name.clone()
    } else {
        NO_NAME.to_string()
    };
    let joined = user
        .created_at
        .map(|t| t.format(DATE_FORMAT).to_string())
        .unwrap_or_default();
    vec![("Username", name), ("Joined", joined)]
}

/// Render pairs as right-aligned labels followed by values.
pub fn key_value_view(fields: &[(&str, String)]) -> String {
    let width = fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    fields
        .iter()
        .map(|(k, v)| format!("{k:>width$}  {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    if let Ok(json) = serde_json::to_string(value) {
        println!("{json}");
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
}

//! Terminal rendering of opaque deck payloads.
//!
//! Prompts and explanations are arbitrary mappings authored in the deck;
//! they are printed as indented `label: value` lines in authoring order.

use std::fmt::Write as _;

use serde_json::Value;

/// Renders a prompt or explanation payload as indented text.
#[must_use]
pub fn render_payload(value: &Value, indent: usize) -> String {
    let mut out = String::new();
    write_value(&mut out, value, indent);
    out
}

fn label(key: &str) -> String {
    key.replace('_', " ")
}

fn write_value(out: &mut String, value: &Value, indent: usize) {
    let pad = " ".repeat(indent);
    match value {
        Value::Object(map) => {
            for (key, item) in map {
                match item {
                    Value::String(s) if !s.trim_end().contains('\n') => {
                        let _ = writeln!(out, "{pad}{}: {}", label(key), s.trim_end());
                    }
                    Value::Null => {}
                    other => {
                        let _ = writeln!(out, "{pad}{}:", label(key));
                        write_value(out, other, indent + 2);
                    }
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::String(s) => {
                        let _ = writeln!(out, "{pad}- {s}");
                    }
                    other => {
                        let _ = writeln!(out, "{pad}-");
                        write_value(out, other, indent + 2);
                    }
                }
            }
        }
        Value::String(s) => {
            for line in s.trim_end().lines() {
                let _ = writeln!(out, "{pad}{line}");
            }
        }
        Value::Null => {}
        other => {
            let _ = writeln!(out, "{pad}{other}");
        }
    }
}

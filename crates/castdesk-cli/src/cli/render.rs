//! Terminal output for entities and notifications.

use anyhow::{Context, Result};
use castdesk_core::entities::{Admin, Broadcast, Customer, Template};
use castdesk_core::ui::{Severity, UiStore};
use serde::Serialize;
use serde_json::Value;

/// One-line summary used by `list`.
pub trait Row {
    fn row(&self) -> String;
}

fn cell(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or("-")
}

impl Row for Customer {
    fn row(&self) -> String {
        format!(
            "{}  {}  {}  {}",
            self.id,
            cell(self.name.as_deref()),
            cell(self.email.as_deref()),
            cell(self.level.as_deref())
        )
    }
}

impl Row for Broadcast {
    fn row(&self) -> String {
        format!(
            "{}  {}  [{}]  {}",
            self.id,
            cell(self.name.as_deref()),
            cell(self.status.as_deref()),
            cell(self.tag.as_deref())
        )
    }
}

impl Row for Template {
    fn row(&self) -> String {
        format!(
            "{}  {}  {}",
            self.id,
            cell(self.name.as_deref()),
            cell(self.subject.as_deref())
        )
    }
}

impl Row for Admin {
    fn row(&self) -> String {
        format!(
            "{}  {}  {}  {}",
            self.id,
            cell(self.username.as_deref()),
            cell(self.email.as_deref()),
            cell(self.role.as_deref())
        )
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{text}");
    Ok(())
}

/// Prints every field as `key: value`, in wire order.
pub fn print_detail<T: Serialize>(entity: &T) {
    match serde_json::to_value(entity) {
        Ok(Value::Object(map)) => {
            for (key, value) in map {
                match value {
                    Value::String(s) => println!("{key}: {s}"),
                    Value::Null => println!("{key}: -"),
                    other => println!("{key}: {other}"),
                }
            }
        }
        Ok(other) => println!("{other}"),
        Err(e) => eprintln!("Warning: cannot display record: {e}"),
    }
}

/// Prints and removes pending notifications.
pub fn flush(ui: &UiStore) {
    for notification in ui.drain_notifications() {
        match notification.severity {
            Severity::Info | Severity::Success => println!("{}", notification.message),
            Severity::Warning | Severity::Error => {
                eprintln!("{}: {}", notification.severity, notification.message);
            }
        }
    }
}

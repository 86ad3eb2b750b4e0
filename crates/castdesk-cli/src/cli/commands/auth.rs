//! Session command handlers.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Context, Result};
use castdesk_core::Console;
use castdesk_core::dates;
use castdesk_core::session::{Hydration, SESSION_EXPIRED};

pub async fn login(
    console: &Console,
    username: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let username = resolve_input("Username", username)?;
    let password = resolve_input("Password", password)?;
    // Keep a still-valid session if the new attempt is rejected.
    console.hydrate();

    let session = console.session.login(username.trim(), &password).await?;
    let name = session
        .claims
        .as_ref()
        .and_then(|c| c.display_name())
        .unwrap_or(username.trim());
    println!("Logged in as {name}");
    Ok(())
}

pub fn logout(console: &Console) {
    console.session.logout();
    println!("Logged out.");
}

pub async fn register(
    console: &Console,
    email: &str,
    username: &str,
    password: Option<String>,
) -> Result<()> {
    let password = resolve_input("Password", password)?;
    console
        .session
        .register(email.trim(), username.trim(), &password)
        .await?;
    println!("Account {} created. Run `castdesk login` to sign in.", username.trim());
    Ok(())
}

pub fn status(console: &Console) {
    println!("API: {}", console.api.base_url());
    match console.hydrate() {
        Hydration::Restored => {
            let session = console.session.snapshot();
            let claims = session.claims.as_ref();
            let name = claims.and_then(|c| c.display_name()).unwrap_or("unknown");
            match claims.and_then(|c| c.role.as_deref()) {
                Some(role) => println!("Logged in as {name} ({role})"),
                None => println!("Logged in as {name}"),
            }
            if let Some(expires) = claims
                .and_then(|c| c.exp)
                .and_then(dates::format_epoch_secs)
            {
                println!("Session expires {expires}");
            }
        }
        Hydration::Expired => println!("{SESSION_EXPIRED}. Run `castdesk login` to sign in again."),
        Hydration::Malformed | Hydration::Absent => println!("Not logged in."),
    }
}

/// Uses the given value, else reads one line from stdin.
fn resolve_input(label: &str, value: Option<String>) -> Result<String> {
    if let Some(value) = value {
        return Ok(value);
    }

    let stdin = io::stdin();
    if stdin.is_terminal() {
        eprint!("{label}: ");
        io::stderr().flush().context("flush prompt")?;
    }
    let mut line = String::new();
    stdin
        .lock()
        .read_line(&mut line)
        .with_context(|| format!("read {} from stdin", label.to_lowercase()))?;
    let value = line.trim_end_matches(['\r', '\n']).to_string();
    if value.is_empty() {
        anyhow::bail!("{label} is required");
    }
    Ok(value)
}

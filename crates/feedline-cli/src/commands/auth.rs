//! Authentication commands.

use super::{read_password, value_or_prompt, App};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use api_boundary::User;
use serde_json::json;
use session_store::RefreshOutcome;

fn print_signed_in(user: &User, verb: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => println!("{} as {} <{}>", verb, user.name, user.email),
        OutputFormat::Json => output::print_json(&json!({"status": "success", "user": user})),
    }
}

/// Login with email and password.
pub async fn login(app: &App, email: Option<String>, format: &OutputFormat) -> Result<()> {
    app.store.ready().await;
    if let Some(user) = app.store.user() {
        output::print_success(&format!("Already logged in as {}", user.email), format);
        return Ok(());
    }

    let email = value_or_prompt(email, "Email: ", "Email")?;
    let password = read_password()?;

    let user = app.store.login(&email, &password).await?;
    print_signed_in(&user, "Logged in", format);
    Ok(())
}

/// Create an account and sign in to it.
pub async fn register(
    app: &App,
    name: Option<String>,
    email: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let name = value_or_prompt(name, "Name: ", "Name")?;
    let email = value_or_prompt(email, "Email: ", "Email")?;
    let password = read_password()?;

    let user = app.store.register(&name, &email, &password).await?;
    print_signed_in(&user, "Registered and logged in", format);
    Ok(())
}

/// Logout and clear session.
pub async fn logout(app: &App, format: &OutputFormat) -> Result<()> {
    app.store.ready().await;
    app.store.logout();
    output::print_success("Logged out successfully", format);
    Ok(())
}

/// Show the restored session without contacting the provider again.
pub async fn status(app: &App, format: &OutputFormat) -> Result<()> {
    app.store.ready().await;
    let snapshot = app.store.snapshot();

    match format {
        OutputFormat::Text => match &snapshot.user {
            Some(user) => {
                println!("Auth:     logged in");
                println!("User:     {} <{}>", user.name, user.email);
                println!("User ID:  {}", user.id);
            }
            None => println!("Auth:     not logged in"),
        },
        OutputFormat::Json => output::print_json(&json!({
            "logged_in": snapshot.is_authenticated(),
            "phase": snapshot.phase,
            "user": snapshot.user,
        })),
    }
    Ok(())
}

/// Re-fetch the signed-in user and print it.
pub async fn whoami(app: &App, format: &OutputFormat) -> Result<()> {
    app.require_user().await?;

    let (user, stale) = match app.store.refresh_user().await {
        RefreshOutcome::Updated(user) => (user, false),
        RefreshOutcome::Skipped => anyhow::bail!("Not logged in. Run 'feedline login' first"),
        RefreshOutcome::Stale(e) => {
            output::print_error(&format!("Could not refresh profile: {}", e), format);
            match app.store.user() {
                Some(user) => (user, true),
                None => anyhow::bail!("Not logged in. Run 'feedline login' first"),
            }
        }
    };

    match format {
        OutputFormat::Text => {
            println!("{} <{}>", user.name, user.email);
            if stale {
                println!("(cached profile)");
            }
        }
        OutputFormat::Json => output::print_json(&json!({"user": user, "stale": stale})),
    }
    Ok(())
}

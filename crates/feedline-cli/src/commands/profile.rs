//! Profile commands.

use super::App;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use api_boundary::{UpdateProfile, User};

fn print_profile(user: &User, format: &OutputFormat) {
    match format {
        OutputFormat::Text => {
            output::print_heading("Profile");
            output::print_row("ID", &user.id);
            output::print_row("Name", &user.name);
            output::print_row("Email", &user.email);
            output::print_row("Bio", user.bio.as_deref().unwrap_or("-"));
            output::print_row("Avatar", user.avatar_url.as_deref().unwrap_or("-"));
        }
        OutputFormat::Json => output::print_json(user),
    }
}

/// Show the signed-in user's profile as held by the session.
pub async fn profile_show(app: &App, format: &OutputFormat) -> Result<()> {
    let user = app.require_user().await?;
    print_profile(&user, format);
    Ok(())
}

/// Update name and/or bio.
pub async fn profile_update(
    app: &App,
    name: Option<String>,
    bio: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let update = UpdateProfile { name, bio };
    if update.is_empty() {
        anyhow::bail!("Nothing to update. Pass --name and/or --bio");
    }

    app.require_user().await?;
    let user = app.store.update_profile(&update).await?;

    if *format == OutputFormat::Text {
        println!("Profile updated");
    }
    print_profile(&user, format);
    Ok(())
}

//! Feed commands.

use super::App;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use api_boundary::Post;

fn print_post(post: &Post) {
    println!("{}  {}", post.created_at, post.author_name);
    println!("  {}", post.content);
}

/// Print the feed. Works signed in or anonymously.
pub async fn feed(app: &App, format: &OutputFormat) -> Result<()> {
    app.store.ready().await;
    let token = app.store.token();

    let posts = app.posts.feed(token.as_deref()).await?;

    match format {
        OutputFormat::Text => {
            if posts.is_empty() {
                println!("No posts yet.");
                return Ok(());
            }
            output::print_heading(&format!("Feed ({} posts)", posts.len()));
            for post in &posts {
                print_post(post);
            }
        }
        OutputFormat::Json => output::print_json(&posts),
    }
    Ok(())
}

/// Publish a post as the signed-in user.
pub async fn post(app: &App, content: &str, format: &OutputFormat) -> Result<()> {
    let content = content.trim();
    if content.is_empty() {
        anyhow::bail!("Post content is required");
    }

    app.require_user().await?;
    let Some(token) = app.store.token() else {
        anyhow::bail!("Not logged in. Run 'feedline login' first");
    };

    let post = app.posts.create(&token, content).await?;

    match format {
        OutputFormat::Text => {
            println!("Posted");
            print_post(&post);
        }
        OutputFormat::Json => output::print_json(&post),
    }
    Ok(())
}

//! One-shot subcommands.

use anyhow::{Result, bail};
use atrium_core::auth::RegisterRequest;
use atrium_core::chat::MessageRole;
use atrium_core::storage::ACCESS_TOKEN_KEY;
use atrium_infrastructure::ConfigService;
use colored::Colorize;
use std::path::PathBuf;

use crate::context::ClientContext;

pub async fn personas(ctx: &ClientContext) -> Result<()> {
    let personas = ctx.persona_client().list().await?;
    if personas.is_empty() {
        println!("{}", "No personas available.".bright_black());
        return Ok(());
    }
    for persona in personas {
        println!(
            "{}  {} ({})",
            persona.id.bright_cyan(),
            persona.name.bold(),
            persona.role
        );
        println!("    {}", persona.background.bright_black());
    }
    Ok(())
}

pub async fn history(ctx: &ClientContext, persona_id: &str) -> Result<()> {
    let chat = ctx.chat_usecase().await?;
    let messages = chat.history(persona_id).await;
    if messages.is_empty() {
        println!("{}", format!("No conversation with '{}' yet.", persona_id).bright_black());
        return Ok(());
    }
    for message in messages {
        let label = match message.role {
            MessageRole::User => "you".green(),
            MessageRole::Assistant => persona_id.bright_magenta(),
            MessageRole::System => "system".bright_black(),
        };
        println!("{} {}", format!("[{}]", message.timestamp).bright_black(), label);
        for line in message.content.lines() {
            println!("  {}", line);
        }
    }
    Ok(())
}

pub async fn reset(ctx: &ClientContext, persona_id: &str) -> Result<()> {
    ctx.chat_usecase().await?.reset(persona_id).await?;
    println!("{}", format!("Conversation with '{}' cleared.", persona_id).green());
    Ok(())
}

pub async fn login(ctx: &ClientContext, email: &str, password: &str) -> Result<()> {
    let token = match ctx.auth_client().login(email, password).await {
        Ok(token) => token,
        Err(e) if e.is_unauthorized() => bail!("Invalid credentials"),
        Err(e) => return Err(e.into()),
    };
    ctx.store.set(ACCESS_TOKEN_KEY, &token.access_token).await?;
    println!("{}", format!("Logged in as {}.", email).green());
    Ok(())
}

pub async fn register(ctx: &ClientContext, request: RegisterRequest) -> Result<()> {
    let message = ctx.auth_client().register(&request).await?;
    println!("{}", message.green());
    Ok(())
}

pub async fn whoami(ctx: &ClientContext) -> Result<()> {
    let Some(token) = ctx.store.get(ACCESS_TOKEN_KEY).await? else {
        println!("{}", "Not logged in.".bright_black());
        return Ok(());
    };

    match ctx.auth_client().whoami(&token).await {
        Ok(identity) => {
            println!(
                "{} {} <{}> ({})",
                identity.first_name,
                identity.last_name,
                identity.email.bright_cyan(),
                identity.role
            );
            Ok(())
        }
        Err(e) if e.is_unauthorized() => {
            // Expired tokens are not refreshable; drop it
            ctx.store.remove(ACCESS_TOKEN_KEY).await?;
            println!("{}", "Session expired. Please log in again.".yellow());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn logout(ctx: &ClientContext) -> Result<()> {
    ctx.store.remove(ACCESS_TOKEN_KEY).await?;
    println!("{}", "Logged out.".green());
    Ok(())
}

pub fn init_config(path: Option<PathBuf>) -> Result<()> {
    let service = match path {
        Some(path) => ConfigService::new(path),
        None => ConfigService::from_default_location()?,
    };
    if service.ensure_config_file()? {
        println!("Wrote {}", service.path().display());
    } else {
        println!("{} already exists", service.path().display());
    }
    Ok(())
}

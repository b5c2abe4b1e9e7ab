//! Command handlers

pub mod auth;
pub mod ideas;

use crate::cli::commands::{Commands, ConfigAction, IdeasAction};
use crate::context::AppContext;
use crate::error::Result;
use crate::output::{json_output, print_success};
use dialoguer::Input;
use parkinglot_common::AppConfig;
use parkinglot_sdk::MessageResponse;

/// Route a parsed command to its handler
pub async fn dispatch(ctx: &AppContext, command: Commands) -> Result<()> {
    match command {
        Commands::Login { email, google } => auth::handle_login(ctx, email, google).await,
        Commands::Register { name, email } => auth::handle_register(ctx, name, email).await,
        Commands::Logout => auth::handle_logout(ctx).await,
        Commands::ResetPassword { email } => auth::handle_reset_password(ctx, email).await,
        Commands::Whoami => auth::handle_whoami(ctx).await,
        Commands::VerifyToken => auth::handle_verify_token(ctx).await,
        Commands::Categories => ideas::handle_categories(ctx).await,
        Commands::Config {
            action: ConfigAction::Example,
        } => {
            print!("{}", AppConfig::generate_example()?);
            Ok(())
        }
        Commands::Ideas { action } => match action {
            IdeasAction::Ls { filters } => ideas::handle_ls(ctx, filters).await,
            IdeasAction::Mine => ideas::handle_mine(ctx).await,
            IdeasAction::Show { id } => ideas::handle_show(ctx, &id).await,
            IdeasAction::Add { fields } => ideas::handle_add(ctx, fields).await,
            IdeasAction::Update { id, fields } => ideas::handle_update(ctx, &id, fields).await,
            IdeasAction::Rm { id, yes } => ideas::handle_rm(ctx, &id, yes).await,
        },
    }
}

/// Use the given value or ask for a non-blank one
pub(crate) fn value_or_prompt(value: Option<String>, prompt: &str) -> Result<String> {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        return Ok(value);
    }

    let value: String = Input::new()
        .with_prompt(prompt)
        .validate_with(|input: &String| -> std::result::Result<(), &str> {
            if input.trim().is_empty() {
                Err("A value is required")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    Ok(value)
}

/// Success line, or `{success, message}` in JSON mode
pub(crate) fn report_success(ctx: &AppContext, message: &str) -> Result<()> {
    if ctx.json {
        json_output(&MessageResponse {
            success: true,
            message: Some(message.to_string()),
        })
    } else {
        print_success(message);
        Ok(())
    }
}

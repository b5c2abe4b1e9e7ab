//! Account commands: login, register, logout, password reset and identity

use super::{report_success, value_or_prompt};
use crate::context::AppContext;
use crate::error::{CliError, Result};
use crate::output::table_output::display_profile;
use crate::output::{json_output, print_auth, print_info, print_success};
use crate::progress::{complete_spinner_and_clear, complete_spinner_error, create_spinner};
use dialoguer::Password;
use parkinglot_sdk::auth::{AuthError, SessionUser};
use parkinglot_sdk::{ApiError, MessageResponse, UserProfile};
use tracing::debug;

/// Sign in with email/password, or through the browser with `--google`
pub async fn handle_login(ctx: &AppContext, email: Option<String>, google: bool) -> Result<()> {
    if google {
        if !ctx.json {
            print_auth("Opening Google sign-in in your browser...");
        }
        let user = ctx.session.sign_in_with_provider().await?;
        return report_signed_in(ctx, &user);
    }

    let email = value_or_prompt(email, "Email")?;
    let password = Password::new().with_prompt("Password").interact()?;

    let spinner = create_spinner("Signing in...");
    match ctx.session.sign_in(&email, &password).await {
        Ok(user) => {
            complete_spinner_and_clear(spinner);
            report_signed_in(ctx, &user)
        }
        Err(e) => {
            complete_spinner_error(spinner, "Sign-in failed");
            Err(e.into())
        }
    }
}

/// Create an account and sign in
pub async fn handle_register(
    ctx: &AppContext,
    name: Option<String>,
    email: Option<String>,
) -> Result<()> {
    let name = value_or_prompt(name, "Name")?;
    let email = value_or_prompt(email, "Email")?;
    let password = Password::new()
        .with_prompt("Password")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()?;

    let spinner = create_spinner("Creating account...");
    match ctx.session.register(&name, &email, &password).await {
        Ok(user) => {
            complete_spinner_and_clear(spinner);
            report_signed_in(ctx, &user)
        }
        Err(e) => {
            complete_spinner_error(spinner, "Registration failed");
            Err(e.into())
        }
    }
}

pub async fn handle_logout(ctx: &AppContext) -> Result<()> {
    if !ctx.session.is_authenticated().await {
        if ctx.json {
            return json_output(&MessageResponse {
                success: true,
                message: Some("Not currently logged in".to_string()),
            });
        }
        print_info("You are not currently logged in");
        return Ok(());
    }

    ctx.session.sign_out().await?;
    report_success(ctx, "Signed out")
}

pub async fn handle_reset_password(ctx: &AppContext, email: Option<String>) -> Result<()> {
    let email = value_or_prompt(email, "Email")?;

    let spinner = create_spinner("Requesting password reset...");
    match ctx.session.send_password_reset(&email).await {
        Ok(()) => {
            complete_spinner_and_clear(spinner);
            report_success(ctx, &format!("Password reset email sent to {email}"))
        }
        Err(e) => {
            complete_spinner_error(spinner, "Password reset failed");
            Err(e.into())
        }
    }
}

/// Profile from the API, or from the local session when the API is unavailable
pub async fn handle_whoami(ctx: &AppContext) -> Result<()> {
    let user = ctx
        .session
        .current_user()
        .await
        .ok_or(AuthError::UserNotLoggedIn)?;

    let profile = match ctx.client.auth_me().await {
        Ok(response) => response.user,
        Err(e @ ApiError::Unauthorized { .. }) => return Err(e.into()),
        Err(e) => {
            debug!("Falling back to session profile: {}", e);
            UserProfile::from_session(&user)
        }
    };

    if ctx.json {
        json_output(&profile)
    } else {
        display_profile(&profile);
        Ok(())
    }
}

pub async fn handle_verify_token(ctx: &AppContext) -> Result<()> {
    let token = ctx
        .session
        .get_token()
        .await
        .ok_or(AuthError::UserNotLoggedIn)?;

    let response = ctx.client.verify_token(&token).await?;
    if ctx.json {
        return json_output(&response);
    }

    if response.success && response.valid != Some(false) {
        print_success("Token is valid");
        if let Some(profile) = &response.user {
            display_profile(profile);
        }
        Ok(())
    } else {
        Err(CliError::message(
            response
                .message
                .unwrap_or_else(|| "Token is not valid".to_string()),
        )
        .with_suggestion("Run 'parkinglot login' to sign in again"))
    }
}

fn report_signed_in(ctx: &AppContext, user: &SessionUser) -> Result<()> {
    if ctx.json {
        json_output(user)
    } else {
        print_success(&format!("Signed in as {}", user.preferred_name()));
        Ok(())
    }
}

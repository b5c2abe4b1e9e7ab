//! Idea commands and the category listing

use super::{report_success, value_or_prompt};
use crate::cli::commands::{IdeaFields, ListFilters};
use crate::context::AppContext;
use crate::error::{CliError, Result};
use crate::output::table_output::{display_categories, display_idea_details, display_ideas};
use crate::output::{json_output, print_info, print_warning};
use crate::progress::{complete_spinner_and_clear, complete_spinner_error, create_spinner};
use dialoguer::{Confirm, Select};
use parkinglot_sdk::auth::AuthError;
use parkinglot_sdk::{Idea, IdeaQuery, NewIdea, DEFAULT_CATEGORIES};

pub async fn handle_ls(ctx: &AppContext, filters: ListFilters) -> Result<()> {
    let mut query = IdeaQuery::default();
    if let Some(search) = filters.search {
        query = query.search(search);
    }
    if let Some(category) = filters.category {
        query = query.category(category);
    }

    let spinner = create_spinner("Fetching ideas...");
    let mut ideas = match ctx.client.list_ideas(&query).await {
        Ok(response) => {
            complete_spinner_and_clear(spinner);
            response.ideas
        }
        Err(e) => {
            complete_spinner_error(spinner, "Failed to fetch ideas");
            return Err(e.into());
        }
    };

    if let Some(limit) = filters.limit {
        ideas.truncate(limit);
    }
    show_ideas(ctx, &ideas, "No ideas found")
}

pub async fn handle_mine(ctx: &AppContext) -> Result<()> {
    require_session(ctx).await?;

    let spinner = create_spinner("Fetching your ideas...");
    let ideas = match ctx.client.my_ideas().await {
        Ok(response) => {
            complete_spinner_and_clear(spinner);
            response.ideas
        }
        Err(e) => {
            complete_spinner_error(spinner, "Failed to fetch your ideas");
            return Err(e.into());
        }
    };

    show_ideas(ctx, &ideas, "You have not parked any ideas yet")
}

pub async fn handle_show(ctx: &AppContext, id: &str) -> Result<()> {
    let idea = ctx.client.get_idea(id).await?.idea;

    if ctx.json {
        json_output(&idea)
    } else {
        display_idea_details(&idea);
        Ok(())
    }
}

/// Create an idea, prompting for required fields not given as flags
pub async fn handle_add(ctx: &AppContext, fields: IdeaFields) -> Result<()> {
    require_session(ctx).await?;

    let category = match fields.category.filter(|c| !c.trim().is_empty()) {
        Some(category) => category,
        None => prompt_category(ctx).await?,
    };
    let draft = NewIdea {
        title: value_or_prompt(fields.title, "Title")?,
        short_description: value_or_prompt(fields.short_description, "Short description")?,
        full_description: value_or_prompt(fields.full_description, "Full description")?,
        price: fields.price,
        category,
        priority: fields.priority.unwrap_or_default(),
        image_url: fields.image_url.filter(|u| !u.trim().is_empty()),
    };
    draft
        .validate()
        .map_err(|e| CliError::message(e.to_string()))?;

    let idea = ctx.client.create_idea(&draft).await?.idea;
    report_saved(ctx, &idea, "Idea parked")
}

/// Overlay the given fields on the stored idea and save it
pub async fn handle_update(ctx: &AppContext, id: &str, fields: IdeaFields) -> Result<()> {
    require_session(ctx).await?;
    if fields.is_empty() {
        return Err(CliError::message("Nothing to update").with_suggestion(
            "Pass at least one of --title, --short, --full, --category, --price, --priority, --image-url",
        ));
    }

    let current = ctx.client.get_idea(id).await?.idea;
    let draft = apply_fields(NewIdea::from(&current), fields);
    draft
        .validate()
        .map_err(|e| CliError::message(e.to_string()))?;

    let idea = ctx.client.update_idea(id, &draft).await?.idea;
    report_saved(ctx, &idea, "Idea updated")
}

pub async fn handle_rm(ctx: &AppContext, id: &str, yes: bool) -> Result<()> {
    require_session(ctx).await?;

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete idea {id}? This cannot be undone"))
            .default(false)
            .interact()?;
        if !confirmed {
            print_info("Cancelled");
            return Ok(());
        }
    }

    let response = ctx.client.delete_idea(id).await?;
    let message = response
        .message
        .unwrap_or_else(|| "Idea deleted".to_string());
    report_success(ctx, &message)
}

/// Categories never fail the command; a failed fetch prints an empty list
pub async fn handle_categories(ctx: &AppContext) -> Result<()> {
    let response = ctx.client.categories().await;
    if !response.success {
        print_warning(&format!(
            "Could not load categories: {}",
            response.error.as_deref().unwrap_or("unknown error")
        ));
    }

    if ctx.json {
        return json_output(&response);
    }
    if response.categories.is_empty() {
        print_info("No categories available");
    } else {
        display_categories(&response.categories);
    }
    Ok(())
}

async fn require_session(ctx: &AppContext) -> Result<()> {
    if ctx.session.is_authenticated().await {
        Ok(())
    } else {
        Err(AuthError::UserNotLoggedIn.into())
    }
}

async fn prompt_category(ctx: &AppContext) -> Result<String> {
    let response = ctx.client.categories().await;
    let mut choices = response.categories;
    if choices.is_empty() {
        choices = DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect();
    }

    let index = Select::new()
        .with_prompt("Category")
        .items(&choices)
        .default(0)
        .interact()?;
    Ok(choices.swap_remove(index))
}

fn apply_fields(mut draft: NewIdea, fields: IdeaFields) -> NewIdea {
    if let Some(title) = fields.title {
        draft.title = title;
    }
    if let Some(short) = fields.short_description {
        draft.short_description = short;
    }
    if let Some(full) = fields.full_description {
        draft.full_description = full;
    }
    if let Some(category) = fields.category {
        draft.category = category;
    }
    if fields.price.is_some() {
        draft.price = fields.price;
    }
    if let Some(priority) = fields.priority {
        draft.priority = priority;
    }
    if let Some(image_url) = fields.image_url {
        draft.image_url = Some(image_url).filter(|u| !u.trim().is_empty());
    }
    draft
}

fn show_ideas(ctx: &AppContext, ideas: &[Idea], empty_message: &str) -> Result<()> {
    if ctx.json {
        return json_output(&ideas);
    }
    if ideas.is_empty() {
        print_info(empty_message);
    } else {
        display_ideas(ideas);
    }
    Ok(())
}

fn report_saved(ctx: &AppContext, idea: &Idea, message: &str) -> Result<()> {
    if ctx.json {
        return json_output(idea);
    }
    report_success(ctx, &format!("{message}: {} ({})", idea.title, idea.id))
}

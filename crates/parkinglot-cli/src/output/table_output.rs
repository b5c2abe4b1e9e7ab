//! Table output for ideas and categories

use crate::output::truncate;
use console::style;
use parkinglot_sdk::{Idea, UserProfile};
use tabled::{settings::Style, Table, Tabled};

const SUMMARY_WIDTH: usize = 48;

#[derive(Tabled)]
struct IdeaRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Summary")]
    summary: String,
}

impl From<&Idea> for IdeaRow {
    fn from(idea: &Idea) -> Self {
        Self {
            id: idea.id.clone(),
            title: idea.title.clone(),
            category: idea.category.clone(),
            priority: idea.priority.to_string(),
            price: format_price(idea),
            summary: truncate(&idea.short_description, SUMMARY_WIDTH),
        }
    }
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn format_price(idea: &Idea) -> String {
    match idea.price {
        Some(price) => format!("${:.2}", price.round_dp(2)),
        None => "-".to_string(),
    }
}

/// Display ideas in a table
pub fn display_ideas(ideas: &[Idea]) {
    let rows: Vec<IdeaRow> = ideas.iter().map(IdeaRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{table}");
    println!("\n{} idea(s)", ideas.len());
}

/// Display every field of a single idea
pub fn display_idea_details(idea: &Idea) {
    let author = idea
        .user
        .as_ref()
        .and_then(|u| u.name.clone().or_else(|| u.email.clone()))
        .unwrap_or_else(|| "-".to_string());

    let mut rows = vec![
        FieldRow {
            field: "ID",
            value: idea.id.clone(),
        },
        FieldRow {
            field: "Title",
            value: idea.title.clone(),
        },
        FieldRow {
            field: "Category",
            value: idea.category.clone(),
        },
        FieldRow {
            field: "Priority",
            value: idea.priority.to_string(),
        },
        FieldRow {
            field: "Price",
            value: format_price(idea),
        },
        FieldRow {
            field: "Author",
            value: author,
        },
    ];
    if let Some(created_at) = idea.created_at {
        rows.push(FieldRow {
            field: "Created",
            value: created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        });
    }
    if let Some(image_url) = idea.image_url.as_deref().filter(|u| !u.is_empty()) {
        rows.push(FieldRow {
            field: "Image",
            value: image_url.to_string(),
        });
    }

    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{table}");

    println!("\n{}", style(&idea.short_description).bold());
    println!("\n{}", idea.full_description);
}

/// Display categories as a single-column table
pub fn display_categories(categories: &[String]) {
    #[derive(Tabled)]
    struct CategoryRow {
        #[tabled(rename = "Category")]
        name: String,
    }

    let rows: Vec<CategoryRow> = categories
        .iter()
        .map(|name| CategoryRow { name: name.clone() })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{table}");
}

/// Display the signed-in user's profile
pub fn display_profile(profile: &UserProfile) {
    let rows = vec![
        FieldRow {
            field: "ID",
            value: profile.id.clone(),
        },
        FieldRow {
            field: "Name",
            value: profile.name.clone().unwrap_or_else(|| "-".to_string()),
        },
        FieldRow {
            field: "Email",
            value: profile.email.clone().unwrap_or_else(|| "-".to_string()),
        },
    ];
    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{table}");
}

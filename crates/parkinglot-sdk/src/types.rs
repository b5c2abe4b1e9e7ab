//! Request and response types for the Ideas Parking Lot API

use crate::auth::SessionUser;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Categories offered when the server list is unavailable
pub const DEFAULT_CATEGORIES: [&str; 7] = [
    "Technology",
    "Business",
    "Creative",
    "Education",
    "Health",
    "Lifestyle",
    "Other",
];

// ===== Ideas =====

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        };
        f.write_str(s)
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!(
                "Invalid priority '{other}'. Expected one of: low, medium, high"
            )),
        }
    }
}

/// Author embedded in an idea
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaOwner {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// An idea record as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub full_description: String,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<IdeaOwner>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Create/update payload
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIdea {
    pub title: String,
    pub short_description: String,
    pub full_description: String,
    /// Sent as `0` when unset
    #[serde(serialize_with = "price_or_zero")]
    pub price: Option<Decimal>,
    pub category: String,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

fn price_or_zero<S: Serializer>(price: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error> {
    rust_decimal::serde::float::serialize(&price.unwrap_or_default(), serializer)
}

impl NewIdea {
    /// Check required fields and the price range
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if self.title.trim().is_empty() {
            errors.push("title", "Title is required");
        }
        if self.short_description.trim().is_empty() {
            errors.push("shortDescription", "Short description is required");
        }
        if self.full_description.trim().is_empty() {
            errors.push("fullDescription", "Full description is required");
        }
        if self.price.is_some_and(|p| p < Decimal::ZERO) {
            errors.push("price", "Price must be a non-negative number");
        }
        if self.category.trim().is_empty() {
            errors.push("category", "Category is required");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl From<&Idea> for NewIdea {
    fn from(idea: &Idea) -> Self {
        Self {
            title: idea.title.clone(),
            short_description: idea.short_description.clone(),
            full_description: idea.full_description.clone(),
            price: idea.price,
            category: idea.category.clone(),
            priority: idea.priority,
            image_url: idea.image_url.clone().filter(|u| !u.trim().is_empty()),
        }
    }
}

/// One rejected draft field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Wire name of the field
    pub field: &'static str,
    pub message: &'static str,
}

/// Draft validation failures, in field order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: &'static str) {
        self.violations.push(FieldViolation { field, message });
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Message for a field, if it was rejected
    pub fn message_for(&self, field: &str) -> Option<&'static str> {
        self.violations
            .iter()
            .find(|v| v.field == field)
            .map(|v| v.message)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.violations.iter().map(|v| v.message).collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Filters for listing ideas
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdeaQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl IdeaQuery {
    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into()).filter(|s: &String| !s.trim().is_empty());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into()).filter(|c: &String| !c.trim().is_empty());
        self
    }
}

// ===== Responses =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdeasResponse {
    pub success: bool,
    #[serde(default)]
    pub ideas: Vec<Idea>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdeaResponse {
    pub success: bool,
    pub idea: Idea,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Categories listing. Failures are reported in-band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoriesResponse {
    pub success: bool,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CategoriesResponse {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            categories: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// User as known to the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl UserProfile {
    /// Fallback profile derived from the identity provider session
    pub fn from_session(user: &SessionUser) -> Self {
        Self {
            id: user.uid.clone(),
            name: Some(user.preferred_name()),
            email: user.email.clone(),
            image: user.photo_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub success: bool,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyTokenResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct VerifyTokenRequest<'a> {
    pub token: &'a str,
}

use clap::{Args, Subcommand};
use parkinglot_sdk::Priority;
use rust_decimal::Decimal;

/// Main CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in with email and password, or with Google
    Login {
        /// Account email (prompted if omitted)
        #[arg(long)]
        email: Option<String>,

        /// Sign in through the browser with Google
        #[arg(long, conflicts_with = "email")]
        google: bool,
    },

    /// Create a new account
    Register {
        /// Display name (prompted if omitted)
        #[arg(long)]
        name: Option<String>,

        /// Account email (prompted if omitted)
        #[arg(long)]
        email: Option<String>,
    },

    /// Sign out and remove the stored session
    Logout,

    /// Send a password reset email
    ResetPassword {
        /// Account email (prompted if omitted)
        #[arg(long)]
        email: Option<String>,
    },

    /// Show the signed-in user
    Whoami,

    /// Check the current token against the API
    VerifyToken,

    /// List idea categories
    Categories,

    /// Manage ideas
    Ideas {
        #[command(subcommand)]
        action: IdeasAction,
    },

    /// Configuration helpers
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print a starter parkinglot.toml
    Example,
}

/// Idea subcommands
#[derive(Subcommand, Debug)]
pub enum IdeasAction {
    /// List ideas
    Ls {
        #[command(flatten)]
        filters: ListFilters,
    },

    /// List your own ideas
    Mine,

    /// Show a single idea
    Show {
        /// Idea identifier
        id: String,
    },

    /// Create an idea, prompting for missing fields
    Add {
        #[command(flatten)]
        fields: IdeaFields,
    },

    /// Change fields of an existing idea
    Update {
        /// Idea identifier
        id: String,

        #[command(flatten)]
        fields: IdeaFields,
    },

    /// Delete an idea
    Rm {
        /// Idea identifier
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Filters for `ideas ls`
#[derive(Args, Debug, Clone, Default)]
pub struct ListFilters {
    /// Free-text search
    #[arg(long)]
    pub search: Option<String>,

    /// Only ideas in this category
    #[arg(long)]
    pub category: Option<String>,

    /// Show at most this many ideas
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Idea fields accepted by `add` and `update`
#[derive(Args, Debug, Clone, Default)]
pub struct IdeaFields {
    #[arg(long)]
    pub title: Option<String>,

    /// One-line summary
    #[arg(long = "short")]
    pub short_description: Option<String>,

    /// Full description
    #[arg(long = "full")]
    pub full_description: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    /// Non-negative price
    #[arg(long, allow_hyphen_values = true)]
    pub price: Option<Decimal>,

    /// low, medium or high
    #[arg(long)]
    pub priority: Option<Priority>,

    #[arg(long)]
    pub image_url: Option<String>,
}

impl IdeaFields {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.short_description.is_none()
            && self.full_description.is_none()
            && self.category.is_none()
            && self.price.is_none()
            && self.priority.is_none()
            && self.image_url.is_none()
    }
}

//! Ideas Parking Lot SDK
//!
//! Session management against Firebase Authentication and a typed client for
//! the Ideas Parking Lot REST API.
//!
//! - [`auth::SessionManager`]: sign-in, sign-up, Google sign-in, sign-out,
//!   token refresh and auth-state subscriptions
//! - [`ParkingLotClient`]: authenticated API calls with exactly-once session
//!   invalidation on 401
//! - [`PublicClient`]: unauthenticated endpoints

pub mod auth;
pub mod client;
pub mod error;
pub mod public;
pub mod redirect;
pub mod types;

pub use client::{ClientBuilder, ParkingLotClient, DEFAULT_LOGIN_PATH, DEFAULT_TIMEOUT_SECS};
pub use error::{ApiError, ErrorBody, Result};
pub use public::PublicClient;
pub use redirect::{LogRedirect, LoginRedirect};
pub use types::{
    CategoriesResponse, Idea, IdeaOwner, IdeaQuery, IdeaResponse, IdeasResponse, MeResponse,
    MessageResponse, NewIdea, Priority, UserProfile, ValidationErrors, VerifyTokenResponse,
    DEFAULT_CATEGORIES,
};

//! Request boundary and provider gateways for the Feedline client.
//!
//! This crate provides:
//! - `ApiClient`, the single chokepoint for provider HTTP calls
//! - typed failures (`ApiError`, `HttpError`)
//! - the identity, profile, and posts gateways layered on the client

mod error;
mod http;
mod identity;
mod posts;
mod profile;
mod types;

pub use error::{ApiError, ApiResult, HttpError};
pub use http::{resolve_url, ApiClient, RequestBody, RequestOptions};
pub use identity::IdentityGateway;
pub use posts::PostsGateway;
pub use profile::ProfileGateway;
pub use reqwest::StatusCode;
pub use types::{AuthResponse, CreatePost, LoginRequest, Post, RegisterRequest, UpdateProfile, User};

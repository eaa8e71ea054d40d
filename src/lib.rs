//! Staycache core - the client-side data access layer for the
//! Staycache rental listing application.
//!
//! This crate owns everything between the presentation layer and the
//! remote API:
//!
//! - [`api`]: retry-capable HTTP client with per-request timeouts and
//!   bounded exponential backoff
//! - [`cache`]: in-memory place collection with single-flight fetches
//!   and static-metadata enrichment
//! - [`auth`]: token-based session lifecycle persisted across restarts
//! - [`app`]: the owned context wiring the pieces together
//! - [`config`]: environment-driven configuration
//!
//! Pages and components stay out of this crate: they hold an [`App`]
//! and render what it returns. Data operations (`fetch_places`,
//! `fetch_place_by_id`) raise [`ApiError`] for error boundaries to
//! catch; identity operations (`login`, `register`) return an
//! [`AuthOutcome`] value so form call sites never unwind.

pub mod api;
pub mod app;
pub mod auth;
pub mod cache;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError};
pub use app::App;
pub use auth::{AuthOutcome, SessionManager, SessionStore};
pub use cache::PlaceCache;
pub use config::Config;
pub use models::{Place, UserProfile};

//! Business-flow services behind the handlers.

pub mod auth;

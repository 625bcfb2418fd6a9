//! Core types and pipeline for tierline.
//!
//! Raw provider webhooks are routed to a provider adapter, normalised into a
//! [`event::SubscriptionEvent`], and reconciled against an
//! [`store::AccountStore`]. This crate is free of HTTP and database
//! dependencies; the API and storage crates depend on it.

pub mod account;
pub mod catalog;
pub mod error;
pub mod event;
pub mod provider;
pub mod reconcile;
pub mod router;
pub mod store;

pub use error::{Error, ErrorClass, Result};

//! CLI operation mode handlers.
//!
//! This module contains the implementations for the operation modes:
//! - [`summary`]: Activity across providers for a time window
//! - [`todo`]: Outstanding work across providers
//! - [`reviews`]: Review requests enriched with CI and diff details
//!
//! Output formatting utilities are in [`output`]; provider construction is
//! in [`providers`].

pub mod output;
pub mod providers;
pub mod reviews;
pub mod summary;
pub mod todo;

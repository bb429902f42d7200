//! dbchat: ask questions of a local SQLite database in plain language.
//!
//! A tool-calling language model inspects the schema, runs SQL through a
//! fixed tool catalog, and answers in Markdown.

pub mod agent;
pub mod config;
pub mod error;
pub mod inference;
pub mod logging;
pub mod retrieval;
pub mod setup;
pub mod state;
pub mod tools;
pub mod types;
pub mod ui;

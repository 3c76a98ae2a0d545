//! Compilation of classification rules files into immutable matcher tables.
//!
//! A rules file is a line-oriented `key: value` text. This crate turns it into
//! a [`RuleSet`]: clock-pin classifiers, clock-cell type rules, hold/check
//! descriptions, path and cell classification tables, driving-cell overrides,
//! bar-dataset groups and seventeen boolean [`Toggles`]. Every pattern is
//! compiled once here and matched as a full match everywhere else.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod pattern;
pub mod toggles;
pub mod types;

pub use error::ConfigError;
pub use loader::{compile_rules, compile_rules_str, load_rules};
pub use pattern::Pattern;
pub use toggles::{Toggle, Toggles};
pub use types::*;

//! Terminal surfaces of the `lambda` binary.
//!
//! The API client and the capacity acquisition engine live in the `lambda`
//! crate; this crate adds the console concerns on top: subcommands, the
//! interactive session menu, selection prompts, and `~/.ssh/config`
//! management.

pub mod commands;
pub mod menu;
pub mod select;
pub mod ssh_config;
pub mod ui;

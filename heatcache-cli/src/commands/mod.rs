//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`cache`] - Cache inspection (stats)
//! - [`init`] - Configuration initialization
//! - [`serve`] - Tile server
//! - [`tile`] - Position to tile lookup
//! - [`warm`] - Cache warm-up for an area

pub mod cache;
pub mod init;
pub mod serve;
pub mod tile;
pub mod warm;

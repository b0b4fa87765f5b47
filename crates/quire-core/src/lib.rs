//! Quire Core Library
//!
//! Core types, configuration, and error handling for the Quire site assembler.

pub mod config;
pub mod content;
pub mod error;

pub use self::config::Config;
pub use content::{ContentFragment, ContentMetadata, IndexEntry, Page, SideTable, TableEntry};
pub use error::{CoreError, Result};

//! URL handling module for web-grabber
//!
//! This module provides URL normalization, crawl scope checks and
//! resource-kind classification.

mod kind;
mod normalize;
mod scope;

// Re-export main functions
pub use kind::{extension_of, ResourceKind};
pub use normalize::{normalize, normalize_absolute};
pub use scope::{in_scope, Scope, ScopePolicy};

//! Type definitions for agora storage.

mod comments;
mod grants;
mod ids;
mod memberships;
mod ratings;

// Re-export all types from submodules
pub use comments::*;
pub use grants::*;
pub use ids::*;
pub use memberships::*;
pub use ratings::*;

//! agora-access - Group permission resolution for agora
//!
//! This crate answers "may this principal do X?" from the group permission matrix:
//! - [`PermissionResolver`] walks an ordered group set with a caller-owned
//!   [`PermissionCache`] and short-circuits as soon as the answer is known
//! - [`PermissionAdmin`] sets and clears individual group grants
//! - [`Authorizer`] derives the group set from a user's memberships
//!
//! # Semantics
//!
//! Each (group, permission) pair is granted, denied or unset. An explicit denial by
//! a group that is reached during resolution vetoes the whole request; unset means
//! "no opinion" and falls through to the next group; nothing granted means no
//! access.

mod admin;
mod authorizer;
mod cache;
mod error;
mod resolver;


pub use admin::{PermissionAdmin, SetOutcome};
pub use authorizer::Authorizer;
pub use cache::PermissionCache;
pub use error::AccessError;
pub use resolver::{PermissionResolver, ResolutionResult};

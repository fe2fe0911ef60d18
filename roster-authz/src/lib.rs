//! Roster Authz - bitmask authorization for user capabilities
//!
//! Two pieces compose this crate: a fixed [`catalog`] of named permissions and
//! groups, and a pure [`engine`] that resolves name lists to masks and applies
//! grant/revoke/set updates. The engine is stateless and total: unknown names
//! are silently dropped, never reported as an error, so resolution can sit on
//! every authorization check without introducing a failure path.

pub mod catalog;
pub mod engine;

pub use catalog::{Group, Mask, Permission};
pub use engine::{apply_update, canonicalize, grant, has_all, resolve, revoke, MaskUpdate};

//! Authorization Engine
//!
//! Pure functions over the catalog: resolve name lists to masks, test masks
//! against requirements, apply grant/revoke/set updates, and render masks back
//! to canonical permission names. Every function here is total over its input
//! domain; unrecognized names contribute nothing.

use crate::catalog::{Group, Mask, Permission};
use serde::{Deserialize, Serialize};

/// Resolve a list of permission and group names (mixed) to a mask.
///
/// Each name is trimmed, then tried against the permission table first and the
/// group table second. Names found in neither table are skipped. An empty
/// input yields mask 0. Input order is irrelevant.
pub fn resolve<S: AsRef<str>>(names: &[S]) -> Mask {
    names.iter().fold(0, |mask, name| {
        let name = name.as_ref().trim();
        if let Some(permission) = Permission::from_name(name) {
            mask | permission.bit()
        } else if let Some(group) = Group::from_name(name) {
            mask | group.mask()
        } else {
            mask
        }
    })
}

/// Test whether `mask` holds every bit required by `required`.
///
/// Vacuously true when `required` resolves to 0 (empty list or all names
/// unrecognized). Callers that need "at least one real requirement" must
/// enforce that themselves.
pub fn has_all<S: AsRef<str>>(mask: Mask, required: &[S]) -> bool {
    let required = resolve(required);
    mask & required == required
}

/// OR the resolved bits into the mask. Granting an already-held permission is
/// a no-op.
pub fn grant<S: AsRef<str>>(mask: Mask, names: &[S]) -> Mask {
    mask | resolve(names)
}

/// Clear the resolved bits from the mask. Revoking an absent permission is a
/// no-op.
pub fn revoke<S: AsRef<str>>(mask: Mask, names: &[S]) -> Mask {
    mask & !resolve(names)
}

/// A mask mutation at the directory boundary.
///
/// The tagged union removes any ambiguity about which branch fires: a `Set`
/// replaces the mask entirely, while `AddRemove` grants first and then
/// revokes against the post-grant mask, so removing a name that was just
/// added in the same call leaves it absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaskUpdate {
    Set(Vec<String>),
    AddRemove {
        add: Vec<String>,
        remove: Vec<String>,
    },
}

impl MaskUpdate {
    /// Fold a caller-supplied `{set, add, remove}` triple into an update.
    ///
    /// A non-empty `set` takes exclusive precedence; the add/remove lists are
    /// ignored in that case.
    pub fn from_parts(set: Vec<String>, add: Vec<String>, remove: Vec<String>) -> Self {
        if !set.is_empty() {
            MaskUpdate::Set(set)
        } else {
            MaskUpdate::AddRemove { add, remove }
        }
    }
}

/// Apply an update to a mask, returning the new mask.
pub fn apply_update(mask: Mask, update: &MaskUpdate) -> Mask {
    match update {
        MaskUpdate::Set(names) => resolve(names),
        MaskUpdate::AddRemove { add, remove } => revoke(grant(mask, add), remove),
    }
}

/// Render a mask back to its canonical set of atomic permission names.
///
/// Walks the permission table only; groups never appear. Order follows
/// catalog enumeration order regardless of how the mask was built up, so the
/// output is suitable for equality comparison.
pub fn canonicalize(mask: Mask) -> Vec<&'static str> {
    Permission::ALL
        .iter()
        .filter(|p| mask & p.bit() != 0)
        .map(|p| p.name())
        .collect()
}

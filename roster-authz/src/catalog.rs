//! Permission Catalog
//!
//! Fixed tables mapping permission names to bit positions and group names to
//! the union of bits they grant. The tables are build-time constants; bit
//! assignments are never reused or reassigned because masks are persisted.

use serde::{Deserialize, Serialize};

/// A capability mask: each set bit denotes one granted permission.
///
/// Stored as a single signed 64-bit integer column, so the catalog can grow
/// to 64 atomic permissions without a storage migration.
pub type Mask = i64;

/// An atomic, named capability with a fixed bit position
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "users.read")]
    UsersRead,
    #[serde(rename = "users.write")]
    UsersWrite,
    #[serde(rename = "users.delete")]
    UsersDelete,
    #[serde(rename = "users.readone")]
    UsersReadOne,
}

impl Permission {
    /// Catalog enumeration order, used for canonical output
    pub const ALL: [Permission; 4] = [
        Permission::UsersRead,
        Permission::UsersWrite,
        Permission::UsersDelete,
        Permission::UsersReadOne,
    ];

    /// Bit position of this permission in a mask
    pub const fn bit(self) -> Mask {
        match self {
            Permission::UsersRead => 1 << 0,
            Permission::UsersWrite => 1 << 1,
            Permission::UsersDelete => 1 << 2,
            Permission::UsersReadOne => 1 << 3,
        }
    }

    /// The permission's unique string key
    pub const fn name(self) -> &'static str {
        match self {
            Permission::UsersRead => "users.read",
            Permission::UsersWrite => "users.write",
            Permission::UsersDelete => "users.delete",
            Permission::UsersReadOne => "users.readone",
        }
    }

    /// Look up a permission by name. Absence is an expected outcome.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "users.read" => Some(Permission::UsersRead),
            "users.write" => Some(Permission::UsersWrite),
            "users.delete" => Some(Permission::UsersDelete),
            "users.readone" => Some(Permission::UsersReadOne),
            _ => None,
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::from_name(s).ok_or_else(|| format!("Unknown permission: {}", s))
    }
}

/// A named alias for a union of permission bits.
///
/// Groups are resolved purely by expansion: granting a group ORs in its
/// constituent permission bits. A group is never itself a bit in a mask and
/// never appears in canonical output.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum Group {
    Admin,
    Moderator,
    Default,
}

impl Group {
    pub const ALL: [Group; 3] = [Group::Admin, Group::Moderator, Group::Default];

    /// Union of the permission bits this group grants
    pub const fn mask(self) -> Mask {
        match self {
            Group::Admin => {
                Permission::UsersRead.bit()
                    | Permission::UsersWrite.bit()
                    | Permission::UsersDelete.bit()
                    | Permission::UsersReadOne.bit()
            }
            Group::Moderator => {
                Permission::UsersRead.bit()
                    | Permission::UsersWrite.bit()
                    | Permission::UsersReadOne.bit()
            }
            Group::Default => Permission::UsersReadOne.bit(),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Group::Admin => "Admin",
            Group::Moderator => "Moderator",
            Group::Default => "Default",
        }
    }

    /// Look up a group by name. Matching is exact-case.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Admin" => Some(Group::Admin),
            "Moderator" => Some(Group::Moderator),
            "Default" => Some(Group::Default),
            _ => None,
        }
    }
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Group {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Group::from_name(s).ok_or_else(|| format!("Unknown group: {}", s))
    }
}

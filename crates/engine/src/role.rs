//! Membership roles and the permission gate.

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Role of a user inside a business.
///
/// Roles are totally ordered by rank: `Owner (3) > Partner (2) > Viewer (1)`.
/// A role satisfies a requirement when its rank is greater than or equal to
/// the required one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Partner,
    Viewer,
}

impl Role {
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Owner => 3,
            Self::Partner => 2,
            Self::Viewer => 1,
        }
    }

    #[must_use]
    pub const fn has_permission(self, required: Role) -> bool {
        self.rank() >= required.rank()
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Partner => "partner",
            Self::Viewer => "viewer",
        }
    }

    /// Fails with `PermissionDenied` unless `self` satisfies `required`.
    pub(crate) fn ensure(self, required: Role, action: &str) -> Result<(), EngineError> {
        if self.has_permission(required) {
            return Ok(());
        }
        Err(EngineError::PermissionDenied(format!(
            "{action} requires {} role, caller is {}",
            required.as_str(),
            self.as_str()
        )))
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Role {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "owner" => Ok(Self::Owner),
            "partner" => Ok(Self::Partner),
            "viewer" => Ok(Self::Viewer),
            other => Err(EngineError::InvalidRole(format!(
                "invalid membership role: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Role; 3] = [Role::Owner, Role::Partner, Role::Viewer];

    #[test]
    fn permission_follows_rank() {
        for caller in ALL {
            for required in ALL {
                assert_eq!(
                    caller.has_permission(required),
                    caller.rank() >= required.rank(),
                    "{caller} vs {required}"
                );
            }
        }
        assert!(Role::Owner.has_permission(Role::Partner));
        assert!(!Role::Viewer.has_permission(Role::Partner));
    }

    #[test]
    fn ensure_reports_both_roles() {
        let err = Role::Viewer.ensure(Role::Partner, "add entry").unwrap_err();
        assert_eq!(
            err,
            EngineError::PermissionDenied(
                "add entry requires partner role, caller is viewer".to_string()
            )
        );
        assert!(Role::Partner.ensure(Role::Partner, "add entry").is_ok());
    }

    #[test]
    fn roundtrips_storage_strings() {
        for role in ALL {
            assert_eq!(Role::try_from(role.as_str()).unwrap(), role);
        }
        assert!(Role::try_from("editor").is_err());
    }
}

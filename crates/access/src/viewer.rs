//! The authenticated principal and its authorization checks.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::error::{AccessError, AccessResult};
use crate::hierarchy::{is_super_admin, role_level, same_role, KOORDINATOR_WILAYAH};
use crate::key::{parse_permission_key, WILDCARD};

const PENGURUS_LEVEL: u8 = 60;

/// Which member profiles a viewer may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "province_id")]
pub enum MemberScope {
    All,
    Province(i64),
    OwnOnly,
}

#[derive(Debug, Clone, Serialize)]
pub struct Viewer {
    pub user_id: i64,
    pub roles: Vec<String>,
    pub permissions: BTreeSet<String>,
    /// Province of the viewer's own member profile, if any.
    pub province_id: Option<i64>,
}

impl Viewer {
    pub fn new(
        user_id: i64,
        roles: Vec<String>,
        permissions: impl IntoIterator<Item = String>,
        province_id: Option<i64>,
    ) -> Self {
        Self {
            user_id,
            roles,
            permissions: permissions.into_iter().collect(),
            province_id,
        }
    }

    pub fn is_super_admin(&self) -> bool {
        self.roles.iter().any(|role| is_super_admin(role))
    }

    pub fn in_group(&self, title: &str) -> bool {
        self.roles.iter().any(|role| same_role(role, title))
    }

    /// Highest level among the viewer's roles, 0 without roles.
    pub fn highest_level(&self) -> u8 {
        self.roles.iter().map(|role| role_level(role)).max().unwrap_or(0)
    }

    /// Whether the viewer holds `key`.
    ///
    /// Super Admin holds everything. Otherwise the exact key, a `module.*`
    /// grant or the global `*` grant match. A module-only key matches any
    /// grant within that module.
    pub fn can(&self, key: &str) -> bool {
        if self.is_super_admin() || self.permissions.contains(WILDCARD) {
            return true;
        }

        let Ok(parsed) = parse_permission_key(key) else {
            return false;
        };

        match parsed.action {
            Some(_) => {
                self.permissions.contains(&parsed.to_string())
                    || self.permissions.contains(&format!("{}.{}", parsed.module, WILDCARD))
            }
            None => {
                let prefix = format!("{}.", parsed.module);
                self.permissions.contains(&parsed.module)
                    || self.permissions.iter().any(|granted| granted.starts_with(&prefix))
            }
        }
    }

    pub fn require(&self, key: &str) -> AccessResult<()> {
        if self.can(key) {
            Ok(())
        } else {
            Err(AccessError::MissingPermission(key.to_string()))
        }
    }

    /// Super Admin manages every role; anyone else only roles strictly below
    /// their own highest level.
    pub fn can_manage_role(&self, title: &str) -> bool {
        self.is_super_admin() || self.highest_level() > role_level(title)
    }

    pub fn member_scope(&self) -> MemberScope {
        if self.is_super_admin() || self.highest_level() >= PENGURUS_LEVEL {
            return MemberScope::All;
        }
        match (self.in_group(KOORDINATOR_WILAYAH), self.province_id) {
            (true, Some(province_id)) => MemberScope::Province(province_id),
            _ => MemberScope::OwnOnly,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewer(roles: &[&str], keys: &[&str], province_id: Option<i64>) -> Viewer {
        Viewer::new(
            42,
            roles.iter().map(|r| r.to_string()).collect(),
            keys.iter().map(|k| k.to_string()),
            province_id,
        )
    }

    #[test]
    fn super_admin_bypasses_every_check() {
        let root = viewer(&["super admin"], &[], None);
        assert!(root.can("member.delete"));
        assert!(root.can("anything.else"));
        assert!(root.can_manage_role("Super Admin"));
        assert_eq!(root.member_scope(), MemberScope::All);
    }

    #[test]
    fn exact_and_wildcard_grants() {
        let staff = viewer(&["Bendahara"], &["member.view", "blog.*"], None);
        assert!(staff.can("member.view"));
        assert!(!staff.can("member.edit"));
        assert!(staff.can("blog.publish"));
        assert!(staff.can("member"), "module-only check matches any grant in the module");
        assert!(!staff.can("ticket"));
        assert!(!staff.can(""));

        let global = viewer(&["Bendahara"], &["*"], None);
        assert!(global.can("ticket.manage"));
    }

    #[test]
    fn require_reports_the_missing_key() {
        let member = viewer(&["Anggota"], &["ticket.create"], None);
        assert!(member.require("ticket.create").is_ok());
        let err = member.require("ticket.manage").unwrap_err();
        assert!(matches!(err, AccessError::MissingPermission(key) if key == "ticket.manage"));
    }

    #[test]
    fn hierarchy_requires_strictly_higher_level() {
        let admin = viewer(&["Admin", "Anggota"], &[], None);
        assert_eq!(admin.highest_level(), 80);
        assert!(admin.can_manage_role("Pengurus"));
        assert!(admin.can_manage_role("Bendahara"));
        assert!(!admin.can_manage_role("Admin"));
        assert!(!admin.can_manage_role("Super Admin"));

        let nobody = viewer(&[], &[], None);
        assert_eq!(nobody.highest_level(), 0);
        assert!(!nobody.can_manage_role("Anggota"));
    }

    #[test]
    fn member_scope_by_role() {
        assert_eq!(viewer(&["Pengurus"], &[], Some(3)).member_scope(), MemberScope::All);
        assert_eq!(
            viewer(&["Koordinator Wilayah"], &[], Some(3)).member_scope(),
            MemberScope::Province(3)
        );
        assert_eq!(
            viewer(&["Koordinator Wilayah"], &[], None).member_scope(),
            MemberScope::OwnOnly
        );
        assert_eq!(viewer(&["Anggota"], &[], Some(3)).member_scope(), MemberScope::OwnOnly);
        assert!(viewer(&["anggota"], &[], None).in_group("Anggota"));
    }
}

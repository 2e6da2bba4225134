//! Permission keys and the lookup tables derived from them.
//!
//! A key is a dotted `module.action` string such as `member.verify`. The
//! action token decides the severity level; the module token decides how the
//! permission is grouped and labelled.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::AccessError;

/// Action token granting every action of a module.
pub const WILDCARD: &str = "*";

/// A parsed permission key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PermissionKey {
    pub module: String,
    pub action: Option<String>,
}

impl PermissionKey {
    pub fn is_wildcard(&self) -> bool {
        self.action.as_deref() == Some(WILDCARD)
    }

    /// Level of the action; module-only keys are treated as read access.
    pub fn level(&self) -> PermissionLevel {
        match self.action.as_deref() {
            Some(action) => level_for_action(action),
            None => PermissionLevel::Read,
        }
    }

    pub fn module_label(&self) -> String {
        module_label(&self.module)
    }

    pub fn module_icon(&self) -> &'static str {
        module_icon(&self.module)
    }

    pub fn action_icon(&self) -> &'static str {
        self.action.as_deref().map(action_icon).unwrap_or("fa-circle")
    }
}

impl fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.action {
            Some(action) => write!(f, "{}.{}", self.module, action),
            None => f.write_str(&self.module),
        }
    }
}

impl FromStr for PermissionKey {
    type Err = AccessError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_permission_key(value)
    }
}

/// Splits `module.action` on the first dot.
///
/// Keys without a dot are module-only. Empty keys, empty modules and a
/// trailing dot with no action are rejected. The global wildcard `*` parses
/// as module `*` without an action.
pub fn parse_permission_key(value: &str) -> Result<PermissionKey, AccessError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AccessError::InvalidKey("permission key is empty".into()));
    }

    let (module, action) = match value.split_once('.') {
        Some((module, action)) => (module.trim(), Some(action.trim())),
        None => (value, None),
    };

    if module.is_empty() {
        return Err(AccessError::InvalidKey(format!("'{value}' has no module")));
    }
    if action == Some("") {
        return Err(AccessError::InvalidKey(format!("'{value}' has an empty action")));
    }
    if module.chars().any(char::is_whitespace) || action.is_some_and(|a| a.chars().any(char::is_whitespace)) {
        return Err(AccessError::InvalidKey(format!("'{value}' contains whitespace")));
    }

    Ok(PermissionKey {
        module: module.to_ascii_lowercase(),
        action: action.map(str::to_ascii_lowercase),
    })
}

/// Severity of a permission, ordered from least to most powerful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    Read = 1,
    Write = 2,
    Modify = 3,
    Delete = 4,
    Full = 5,
}

impl PermissionLevel {
    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            PermissionLevel::Read => "Baca",
            PermissionLevel::Write => "Tulis",
            PermissionLevel::Modify => "Ubah",
            PermissionLevel::Delete => "Hapus",
            PermissionLevel::Full => "Penuh",
        }
    }

    pub fn badge(self) -> &'static str {
        match self {
            PermissionLevel::Read => "success",
            PermissionLevel::Write => "info",
            PermissionLevel::Modify => "warning",
            PermissionLevel::Delete => "danger",
            PermissionLevel::Full => "dark",
        }
    }
}

/// Unknown actions are treated as [`PermissionLevel::Write`].
pub fn level_for_action(action: &str) -> PermissionLevel {
    match action.trim().to_ascii_lowercase().as_str() {
        "view" | "list" | "read" | "respond" | "results" => PermissionLevel::Read,
        "create" | "reply" | "export" => PermissionLevel::Write,
        "edit" | "update" | "assign" | "publish" | "import" | "verify" => PermissionLevel::Modify,
        "delete" | "destroy" => PermissionLevel::Delete,
        "manage" | "admin" | WILDCARD => PermissionLevel::Full,
        _ => PermissionLevel::Write,
    }
}

pub fn action_icon(action: &str) -> &'static str {
    match action {
        "view" | "read" => "fa-eye",
        "list" => "fa-list",
        "create" => "fa-plus",
        "edit" | "update" => "fa-edit",
        "delete" | "destroy" => "fa-trash",
        "publish" => "fa-upload",
        "export" => "fa-file-export",
        "import" => "fa-file-import",
        "verify" => "fa-check-circle",
        "assign" => "fa-user-tag",
        "reply" => "fa-reply",
        "respond" => "fa-pen",
        "results" => "fa-chart-pie",
        "manage" | "admin" => "fa-cogs",
        WILDCARD => "fa-asterisk",
        _ => "fa-circle",
    }
}

/// Human label of a module; unknown modules are title-cased.
pub fn module_label(module: &str) -> String {
    let known = match module {
        "member" => Some("Anggota"),
        "role" => Some("Role"),
        "permission" => Some("Hak Akses"),
        "ticket" => Some("Pengaduan"),
        "blog" => Some("Blog"),
        "survey" => Some("Survei"),
        "org" => Some("Struktur Organisasi"),
        "stats" => Some("Statistik"),
        WILDCARD => Some("Semua Modul"),
        _ => None,
    };

    match known {
        Some(label) => label.to_string(),
        None => {
            let mut chars = module.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

pub fn module_icon(module: &str) -> &'static str {
    match module {
        "member" => "fa-users",
        "role" => "fa-user-shield",
        "permission" => "fa-key",
        "ticket" => "fa-ticket-alt",
        "blog" => "fa-newspaper",
        "survey" => "fa-poll",
        "org" => "fa-sitemap",
        "stats" => "fa-chart-bar",
        _ => "fa-cube",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_first_dot() {
        let key = parse_permission_key("member.export.csv").unwrap();
        assert_eq!(key.module, "member");
        assert_eq!(key.action.as_deref(), Some("export.csv"));
        assert_eq!(key.to_string(), "member.export.csv");
    }

    #[test]
    fn module_only_and_wildcards() {
        let key = parse_permission_key("blog").unwrap();
        assert_eq!(key.action, None);
        assert_eq!(key.level(), PermissionLevel::Read);

        let key: PermissionKey = "ticket.*".parse().unwrap();
        assert!(key.is_wildcard());
        assert_eq!(key.level(), PermissionLevel::Full);

        let global = parse_permission_key("*").unwrap();
        assert_eq!(global.module, "*");
        assert_eq!(global.action, None);
    }

    #[test]
    fn rejects_malformed_keys() {
        for bad in ["", "   ", ".view", "member.", "mem ber.view"] {
            assert!(parse_permission_key(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn normalises_case_and_whitespace() {
        let key = parse_permission_key("  Member.View ").unwrap();
        assert_eq!(key.to_string(), "member.view");
    }

    #[test]
    fn action_levels() {
        assert_eq!(level_for_action("view"), PermissionLevel::Read);
        assert_eq!(level_for_action("respond"), PermissionLevel::Read);
        assert_eq!(level_for_action("create"), PermissionLevel::Write);
        assert_eq!(level_for_action("verify"), PermissionLevel::Modify);
        assert_eq!(level_for_action("publish"), PermissionLevel::Modify);
        assert_eq!(level_for_action("DELETE"), PermissionLevel::Delete);
        assert_eq!(level_for_action("manage"), PermissionLevel::Full);
        assert_eq!(level_for_action("frobnicate"), PermissionLevel::Write);
    }

    #[test]
    fn level_badges_and_ordering() {
        assert_eq!(PermissionLevel::Read.badge(), "success");
        assert_eq!(PermissionLevel::Write.badge(), "info");
        assert_eq!(PermissionLevel::Modify.badge(), "warning");
        assert_eq!(PermissionLevel::Delete.badge(), "danger");
        assert_eq!(PermissionLevel::Full.badge(), "dark");
        assert!(PermissionLevel::Read < PermissionLevel::Full);
        assert_eq!(PermissionLevel::Delete.value(), 4);
    }

    #[test]
    fn module_labels_fall_back_to_title_case() {
        assert_eq!(module_label("member"), "Anggota");
        assert_eq!(module_label("permission"), "Hak Akses");
        assert_eq!(module_label("finance"), "Finance");
        assert_eq!(module_icon("finance"), "fa-cube");
        assert_eq!(action_icon("verify"), "fa-check-circle");
    }
}

//! Static role hierarchy.

pub const SUPER_ADMIN: &str = "Super Admin";
pub const ADMIN: &str = "Admin";
pub const PENGURUS: &str = "Pengurus";
pub const KOORDINATOR_WILAYAH: &str = "Koordinator Wilayah";
pub const ANGGOTA: &str = "Anggota";

/// Level of any role created at runtime.
pub const CUSTOM_ROLE_LEVEL: u8 = 20;

/// Built-in roles with their levels, highest first. These cannot be renamed or deleted.
pub const SYSTEM_ROLES: [(&str, u8); 5] = [
    (SUPER_ADMIN, 100),
    (ADMIN, 80),
    (PENGURUS, 60),
    (KOORDINATOR_WILAYAH, 40),
    (ANGGOTA, 10),
];

fn system_role(title: &str) -> Option<(&'static str, u8)> {
    let title = title.trim();
    SYSTEM_ROLES
        .iter()
        .copied()
        .find(|(name, _)| name.eq_ignore_ascii_case(title))
}

pub fn role_level(title: &str) -> u8 {
    system_role(title).map_or(CUSTOM_ROLE_LEVEL, |(_, level)| level)
}

pub fn is_system_role(title: &str) -> bool {
    system_role(title).is_some()
}

pub fn is_super_admin(title: &str) -> bool {
    title.trim().eq_ignore_ascii_case(SUPER_ADMIN)
}

pub fn same_role(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

pub fn role_badge(title: &str) -> &'static str {
    match system_role(title).map(|(name, _)| name) {
        Some(SUPER_ADMIN) => "danger",
        Some(ADMIN) => "warning",
        Some(PENGURUS) => "primary",
        Some(KOORDINATOR_WILAYAH) => "info",
        Some(_) => "success",
        None => "secondary",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_case_and_whitespace_insensitive() {
        assert_eq!(role_level("Super Admin"), 100);
        assert_eq!(role_level("  super admin "), 100);
        assert_eq!(role_level("KOORDINATOR WILAYAH"), 40);
        assert_eq!(role_level("Anggota"), 10);
        assert_eq!(role_level("Bendahara"), CUSTOM_ROLE_LEVEL);
    }

    #[test]
    fn system_roles_and_badges() {
        assert!(is_system_role("admin"));
        assert!(!is_system_role("Bendahara"));
        assert!(is_super_admin(" SUPER ADMIN"));
        assert_eq!(role_badge("Super Admin"), "danger");
        assert_eq!(role_badge("anggota"), "success");
        assert_eq!(role_badge("Bendahara"), "secondary");
    }
}

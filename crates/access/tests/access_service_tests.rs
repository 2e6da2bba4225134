use chrono::Utc;
use spk_access::{AccessError, AccessService, MemberScope};
use spk_config::DatabaseConfig;
use spk_database::{initialize_database, CreateRoleRequest, MemberFields, MemberRepository};
use sqlx::SqlitePool;
use tempfile::TempDir;

type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

struct TestContext {
    pool: SqlitePool,
    access: AccessService<spk_access::SqlRoleStore>,
    _temp_dir: TempDir,
}

impl TestContext {
    async fn new() -> TestResult<Self> {
        let temp_dir = TempDir::new()?;
        let config = DatabaseConfig {
            url: format!("sqlite://{}", temp_dir.path().join("access.db").display()),
            max_connections: 2,
        };
        let pool = initialize_database(&config).await?;
        Ok(Self {
            access: AccessService::new(pool.clone()),
            pool,
            _temp_dir: temp_dir,
        })
    }

    async fn user(&self, email: &str, role: &str) -> TestResult<i64> {
        let now = Utc::now().to_rfc3339();
        let id = sqlx::query(
            "INSERT INTO users (public_id, email, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(format!("pub-{email}"))
        .bind(email)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();
        self.access.grant_system_role(id, role).await?;
        Ok(id)
    }
}

#[tokio::test]
async fn seeded_admin_viewer_holds_catalogue() -> TestResult {
    let ctx = TestContext::new().await?;
    let admin = ctx.user("admin@example.com", "Admin").await?;

    let viewer = ctx.access.viewer(admin).await?;
    assert!(viewer.can("member.verify"));
    assert!(viewer.can("stats.view"));
    assert!(!viewer.is_super_admin());
    assert_eq!(viewer.member_scope(), MemberScope::All);

    let roles = ctx.access.list_roles(&viewer).await?;
    assert_eq!(roles.len(), 5);
    let admin_role = roles.iter().find(|r| r.title() == "Admin").expect("admin role");
    assert_eq!(admin_role.user_count(), 1);
    assert!(admin_role.permission_score() > 0);
    Ok(())
}

#[tokio::test]
async fn coordinator_scope_follows_member_province() -> TestResult {
    let ctx = TestContext::new().await?;
    let coordinator = ctx.user("korwil@example.com", "Koordinator Wilayah").await?;

    let members = MemberRepository::new(ctx.pool.clone());
    members
        .create(
            Some(coordinator),
            &MemberFields {
                full_name: "Korwil Jabar".into(),
                province_id: Some(12),
                ..MemberFields::default()
            },
        )
        .await?;

    let viewer = ctx.access.viewer(coordinator).await?;
    assert_eq!(viewer.member_scope(), MemberScope::Province(12));
    Ok(())
}

#[tokio::test]
async fn custom_role_lifecycle() -> TestResult {
    let ctx = TestContext::new().await?;
    let admin = ctx.user("admin@example.com", "Admin").await?;
    let member = ctx.user("anggota@example.com", "Anggota").await?;
    let viewer = ctx.access.viewer(admin).await?;

    let role = ctx
        .access
        .create_role(
            &viewer,
            CreateRoleRequest {
                title: "Bendahara".into(),
                description: Some("Keuangan".into()),
            },
        )
        .await?;
    assert_eq!(role.level(), 20);

    let role = ctx
        .access
        .set_role_permissions(&viewer, role.id(), &["stats.view".to_string(), "member.view".to_string()])
        .await?;
    assert_eq!(role.permissions().len(), 2);

    assert!(ctx.access.assign_role(&viewer, member, role.id()).await?);
    let member_viewer = ctx.access.viewer(member).await?;
    assert!(member_viewer.can("stats.view"));

    let detail = ctx.access.permission(&viewer, role.permissions()[0].id).await?;
    let view = detail.view();
    assert!(view.roles.unwrap_or_default().contains(&"Bendahara".to_string()));

    ctx.access.revoke_role(&viewer, member, role.id()).await?;
    ctx.access.delete_role(&viewer, role.id()).await?;

    let err = ctx
        .access
        .get_role(&viewer, role.id())
        .await
        .expect_err("deleted role is gone");
    assert!(matches!(err, AccessError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn duplicate_role_title_is_rejected() -> TestResult {
    let ctx = TestContext::new().await?;
    let admin = ctx.user("admin@example.com", "Admin").await?;
    let viewer = ctx.access.viewer(admin).await?;

    let request = CreateRoleRequest {
        title: "Humas".into(),
        description: None,
    };
    ctx.access.create_role(&viewer, request.clone()).await?;
    let err = ctx
        .access
        .create_role(&viewer, request)
        .await
        .expect_err("title is unique");
    assert!(matches!(err, AccessError::Duplicate(_)));
    Ok(())
}

#[tokio::test]
async fn last_super_admin_is_protected() -> TestResult {
    let ctx = TestContext::new().await?;
    let root = ctx.user("root@example.com", "Super Admin").await?;
    let viewer = ctx.access.viewer(root).await?;
    let super_admin = ctx
        .access
        .list_roles(&viewer)
        .await?
        .into_iter()
        .find(|role| role.is_super_admin())
        .expect("seeded super admin role");

    let err = ctx
        .access
        .revoke_role(&viewer, root, super_admin.id())
        .await
        .expect_err("cannot remove the last super admin");
    assert!(matches!(err, AccessError::LastSuperAdmin));
    Ok(())
}

use chrono::Utc;
use spk_access::{AccessService, Viewer};
use spk_blog::{BlogError, BlogService, BulkAction, BulkRequest, PostInput, PostQuery};
use spk_config::DatabaseConfig;
use spk_database::{initialize_database, Page, PostStatus};
use sqlx::SqlitePool;
use tempfile::TempDir;

type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

struct TestContext {
    pool: SqlitePool,
    blog: BlogService,
    _temp_dir: TempDir,
}

impl TestContext {
    async fn new() -> TestResult<Self> {
        let temp_dir = TempDir::new()?;
        let config = DatabaseConfig {
            url: format!("sqlite://{}", temp_dir.path().join("blog.db").display()),
            max_connections: 2,
        };
        let pool = initialize_database(&config).await?;
        Ok(Self {
            blog: BlogService::new(pool.clone()),
            pool,
            _temp_dir: temp_dir,
        })
    }

    async fn viewer(&self, email: &str, role: &str) -> TestResult<Viewer> {
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
        let access = AccessService::new(self.pool.clone());
        access.grant_system_role(id, role).await?;
        Ok(access.viewer(id).await?)
    }
}

fn input(title: &str, publish: bool) -> PostInput {
    PostInput {
        title: title.to_string(),
        excerpt: None,
        body: "<p>Serikat pekerja kampus menggelar rapat akbar.</p>".to_string(),
        category_id: None,
        publish,
    }
}

#[tokio::test]
async fn duplicate_titles_get_suffixed_slugs() -> TestResult {
    let ctx = TestContext::new().await?;
    let editor = ctx.viewer("pengurus@example.com", "Pengurus").await?;

    let first = ctx.blog.create(&editor, input("Rapat Akbar 2026", true)).await?;
    let second = ctx.blog.create(&editor, input("Rapat Akbar 2026", false)).await?;
    let third = ctx.blog.create(&editor, input("Rapat akbar 2026!", false)).await?;
    assert_eq!(first.post.slug, "rapat-akbar-2026");
    assert_eq!(second.post.slug, "rapat-akbar-2026-2");
    assert_eq!(third.post.slug, "rapat-akbar-2026-3");
    assert_eq!(first.summary, "Serikat pekerja kampus menggelar rapat akbar.");
    assert_eq!(first.reading_minutes, 1);
    assert!(first.post.published_at.is_some());
    assert_eq!(second.post.status, PostStatus::Draft);

    let kept = ctx.blog.update(&editor, second.post.id, input("Rapat Akbar 2026", false)).await?;
    assert_eq!(kept.post.slug, "rapat-akbar-2026-2");
    let renamed = ctx.blog.update(&editor, second.post.id, input("Hasil Rapat", true)).await?;
    assert_eq!(renamed.post.slug, "hasil-rapat");
    assert_eq!(renamed.post.status, PostStatus::Published);
    Ok(())
}

#[tokio::test]
async fn public_reads_only_see_published_posts() -> TestResult {
    let ctx = TestContext::new().await?;
    let editor = ctx.viewer("pengurus@example.com", "Pengurus").await?;
    let published = ctx.blog.create(&editor, input("Kabar Terbaru", true)).await?;
    let draft = ctx.blog.create(&editor, input("Masih Draf", false)).await?;

    let listing = ctx.blog.public_list(&PostQuery::default(), Page::default()).await?;
    assert_eq!(listing.total, 1);

    let read = ctx.blog.read(&published.post.slug).await?;
    assert_eq!(read.post.view_count, 1);
    let read = ctx.blog.read(&published.post.slug).await?;
    assert_eq!(read.post.view_count, 2);

    let err = ctx.blog.read(&draft.post.slug).await.unwrap_err();
    assert!(matches!(err, BlogError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn bulk_actions_report_affected_rows() -> TestResult {
    let ctx = TestContext::new().await?;
    let admin = ctx.viewer("admin@example.com", "Admin").await?;
    let board = ctx.viewer("pengurus@example.com", "Pengurus").await?;

    let a = ctx.blog.create(&admin, input("Satu", false)).await?.post.id;
    let b = ctx.blog.create(&admin, input("Dua", false)).await?.post.id;
    let c = ctx.blog.create(&admin, input("Tiga", true)).await?.post.id;

    let publish = BulkRequest { action: BulkAction::Publish, ids: vec![a, b, c, b, 999] };
    assert_eq!(ctx.blog.bulk(&admin, &publish).await?.affected, 2);

    let unpublish = BulkRequest { action: BulkAction::Unpublish, ids: vec![a] };
    assert_eq!(ctx.blog.bulk(&board, &unpublish).await?.affected, 1);

    let delete = BulkRequest { action: BulkAction::Delete, ids: vec![a, c] };
    let err = ctx.blog.bulk(&board, &delete).await.unwrap_err();
    assert!(matches!(err, BlogError::Access(_)));
    assert_eq!(ctx.blog.bulk(&admin, &delete).await?.affected, 2);

    let remaining = ctx.blog.admin_list(&admin, &PostQuery::default(), Page::default()).await?;
    assert_eq!(remaining.total, 1);
    assert_eq!(remaining.items[0].post.id, b);
    Ok(())
}

#[tokio::test]
async fn members_cannot_write_posts() -> TestResult {
    let ctx = TestContext::new().await?;
    let member = ctx.viewer("anggota@example.com", "Anggota").await?;
    let err = ctx.blog.create(&member, input("Coba", false)).await.unwrap_err();
    assert!(matches!(err, BlogError::Access(_)));
    Ok(())
}

#[tokio::test]
async fn categories_are_validated() -> TestResult {
    let ctx = TestContext::new().await?;
    let editor = ctx.viewer("pengurus@example.com", "Pengurus").await?;

    let category = ctx.blog.create_category(&editor, "Advokasi Pekerja").await?;
    assert_eq!(category.slug, "advokasi-pekerja");
    let err = ctx.blog.create_category(&editor, "Advokasi pekerja").await.unwrap_err();
    assert!(matches!(err, BlogError::Duplicate(_)));

    let mut bad = input("Dengan Kategori", false);
    bad.category_id = Some(404);
    let err = ctx.blog.create(&editor, bad).await.unwrap_err();
    let BlogError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(errors.get("category_id"), Some("Kategori tidak ditemukan"));

    let mut good = input("Dengan Kategori", false);
    good.category_id = Some(category.id);
    let post = ctx.blog.create(&editor, good).await?;
    assert_eq!(post.post.category_name.as_deref(), Some("Advokasi Pekerja"));
    assert_eq!(ctx.blog.categories().await?.len(), 1);
    Ok(())
}

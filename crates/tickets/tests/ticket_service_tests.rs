use chrono::Utc;
use spk_access::{AccessService, SqlRoleStore, Viewer};
use spk_config::DatabaseConfig;
use spk_database::{
    initialize_database, CreateTicketRequest, Page, TicketCategory, TicketPriority, TicketRepository,
    TicketStatus,
};
use spk_tickets::{ReplyRequest, TicketError, TicketQuery, TicketService};
use sqlx::SqlitePool;
use tempfile::TempDir;

type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

struct TestContext {
    pool: SqlitePool,
    access: AccessService<SqlRoleStore>,
    tickets: TicketService,
    _temp_dir: TempDir,
}

impl TestContext {
    async fn new() -> TestResult<Self> {
        let temp_dir = TempDir::new()?;
        let config = DatabaseConfig {
            url: format!("sqlite://{}", temp_dir.path().join("tickets.db").display()),
            max_connections: 2,
        };
        let pool = initialize_database(&config).await?;
        Ok(Self {
            access: AccessService::new(pool.clone()),
            tickets: TicketService::new(pool.clone()),
            pool,
            _temp_dir: temp_dir,
        })
    }

    async fn viewer(&self, email: &str, role: &str) -> TestResult<Viewer> {
        let now = Utc::now().to_rfc3339();
        let id = sqlx::query(
            "INSERT INTO users (public_id, email, display_name, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(format!("pub-{email}"))
        .bind(email)
        .bind(email.split('@').next())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();
        self.access.grant_system_role(id, role).await?;
        Ok(self.access.viewer(id).await?)
    }
}

fn complaint(subject: &str) -> CreateTicketRequest {
    CreateTicketRequest {
        subject: subject.to_string(),
        description: "Gaji bulan ini belum dibayarkan".to_string(),
        category: TicketCategory::Wages,
        priority: TicketPriority::High,
    }
}

fn reply(body: &str, is_internal: bool) -> ReplyRequest {
    ReplyRequest {
        body: body.to_string(),
        is_internal,
    }
}

#[tokio::test]
async fn numbers_increase_within_a_day() -> TestResult {
    let ctx = TestContext::new().await?;
    let member = ctx.viewer("anggota@example.com", "Anggota").await?;

    let first = ctx.tickets.create(&member, complaint("Gaji terlambat")).await?;
    let second = ctx.tickets.create(&member, complaint("Lembur tidak dibayar")).await?;
    let prefix = format!("TKT-{}-", Utc::now().format("%Y%m%d"));
    assert_eq!(first.ticket.ticket_number, format!("{prefix}0001"));
    assert_eq!(second.ticket.ticket_number, format!("{prefix}0002"));
    assert_eq!(first.status_label, "Baru");
    assert_eq!(first.category_label, TicketCategory::Wages.label());

    let err = ctx.tickets.create(&member, complaint("  ")).await.unwrap_err();
    assert!(matches!(err, TicketError::Validation(_)));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_complaints_get_distinct_numbers() -> TestResult {
    let ctx = TestContext::new().await?;
    let member = ctx.viewer("ramai@example.com", "Anggota").await?;

    let mut tasks = Vec::new();
    for index in 0..6 {
        let tickets = ctx.tickets.clone();
        let member = member.clone();
        tasks.push(tokio::spawn(async move {
            tickets.create(&member, complaint(&format!("Pengaduan {index}"))).await
        }));
    }

    let mut numbers = Vec::new();
    for task in tasks {
        numbers.push(task.await??.ticket.ticket_number);
    }
    numbers.sort();
    let prefix = format!("TKT-{}-", Utc::now().format("%Y%m%d"));
    let expected: Vec<String> = (1..=6).map(|n| format!("{prefix}{n:04}")).collect();
    assert_eq!(numbers, expected);
    Ok(())
}

#[tokio::test]
async fn numbering_continues_after_the_highest_issued_number() -> TestResult {
    let ctx = TestContext::new().await?;
    let member = ctx.viewer("celah@example.com", "Anggota").await?;
    let prefix = format!("TKT-{}-", Utc::now().format("%Y%m%d"));

    TicketRepository::new(ctx.pool.clone())
        .create(&format!("{prefix}0004"), member.user_id, &complaint("Impor lama"))
        .await?;

    let next = ctx.tickets.create(&member, complaint("Gaji terlambat")).await?;
    assert_eq!(next.ticket.ticket_number, format!("{prefix}0005"));
    Ok(())
}

#[tokio::test]
async fn reporters_only_see_their_own_tickets() -> TestResult {
    let ctx = TestContext::new().await?;
    let alice = ctx.viewer("alice@example.com", "Anggota").await?;
    let bob = ctx.viewer("bob@example.com", "Anggota").await?;
    let board = ctx.viewer("pengurus@example.com", "Pengurus").await?;

    let ticket = ctx.tickets.create(&alice, complaint("Gaji terlambat")).await?;
    ctx.tickets.create(&bob, complaint("Kontrak tidak diperpanjang")).await?;

    let mine = ctx.tickets.list(&alice, &TicketQuery::default(), Page::default()).await?;
    assert_eq!(mine.total, 1);
    let all = ctx.tickets.list(&board, &TicketQuery::default(), Page::default()).await?;
    assert_eq!(all.total, 2);

    let err = ctx.tickets.get(&bob, ticket.ticket.id).await.unwrap_err();
    assert!(matches!(err, TicketError::Forbidden(_)));
    Ok(())
}

#[tokio::test]
async fn replies_drive_the_workflow() -> TestResult {
    let ctx = TestContext::new().await?;
    let reporter = ctx.viewer("anggota@example.com", "Anggota").await?;
    let staff = ctx.viewer("pengurus@example.com", "Pengurus").await?;

    let ticket = ctx.tickets.create(&reporter, complaint("Gaji terlambat")).await?;
    let id = ticket.ticket.id;

    let err = ctx
        .tickets
        .reply(&reporter, id, reply("catatan", true))
        .await
        .unwrap_err();
    assert!(matches!(err, TicketError::Forbidden(_)));

    ctx.tickets.reply(&staff, id, reply("Sedang kami cek", false)).await?;
    ctx.tickets.reply(&staff, id, reply("Hubungi bagian keuangan", true)).await?;

    let seen_by_reporter = ctx.tickets.get(&reporter, id).await?;
    assert_eq!(seen_by_reporter.ticket.ticket.status, TicketStatus::InProgress);
    assert_eq!(seen_by_reporter.replies.len(), 1);
    assert_eq!(seen_by_reporter.transitions, vec![TicketStatus::Closed]);

    let seen_by_staff = ctx.tickets.get(&staff, id).await?;
    assert_eq!(seen_by_staff.replies.len(), 2);
    assert_eq!(seen_by_staff.transitions.len(), 3);

    ctx.tickets.change_status(&staff, id, TicketStatus::Resolved).await?;
    ctx.tickets.reply(&reporter, id, reply("Belum beres", false)).await?;
    let reopened = ctx.tickets.get(&reporter, id).await?;
    assert_eq!(reopened.ticket.ticket.status, TicketStatus::Open);
    assert!(reopened.ticket.ticket.resolved_at.is_none());

    let closed = ctx.tickets.change_status(&reporter, id, TicketStatus::Closed).await?;
    assert!(closed.ticket.closed_at.is_some());
    let err = ctx
        .tickets
        .reply(&reporter, id, reply("halo?", false))
        .await
        .unwrap_err();
    assert!(matches!(err, TicketError::Closed));
    Ok(())
}

#[tokio::test]
async fn status_changes_follow_the_transition_table() -> TestResult {
    let ctx = TestContext::new().await?;
    let reporter = ctx.viewer("anggota@example.com", "Anggota").await?;
    let staff = ctx.viewer("pengurus@example.com", "Pengurus").await?;
    let id = ctx.tickets.create(&reporter, complaint("Gaji terlambat")).await?.ticket.id;

    let err = ctx
        .tickets
        .change_status(&reporter, id, TicketStatus::Resolved)
        .await
        .unwrap_err();
    assert!(matches!(err, TicketError::Access(_)));

    ctx.tickets.change_status(&staff, id, TicketStatus::Closed).await?;
    let err = ctx
        .tickets
        .change_status(&staff, id, TicketStatus::Resolved)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TicketError::InvalidTransition { from: TicketStatus::Closed, to: TicketStatus::Resolved }
    ));
    let reopened = ctx.tickets.change_status(&staff, id, TicketStatus::Open).await?;
    assert!(reopened.ticket.closed_at.is_none());
    Ok(())
}

#[tokio::test]
async fn assignment_requires_a_handler() -> TestResult {
    let ctx = TestContext::new().await?;
    let reporter = ctx.viewer("anggota@example.com", "Anggota").await?;
    let other_member = ctx.viewer("lain@example.com", "Anggota").await?;
    let board = ctx.viewer("pengurus@example.com", "Pengurus").await?;
    let coordinator = ctx.viewer("korwil@example.com", "Koordinator Wilayah").await?;
    let id = ctx.tickets.create(&reporter, complaint("Gaji terlambat")).await?.ticket.id;

    let err = ctx.tickets.assign(&coordinator, id, coordinator.user_id).await.unwrap_err();
    assert!(matches!(err, TicketError::Access(_)));

    let err = ctx.tickets.assign(&board, id, other_member.user_id).await.unwrap_err();
    let TicketError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert!(errors.get("assignee_id").is_some());

    let assigned = ctx.tickets.assign(&board, id, coordinator.user_id).await?;
    assert_eq!(assigned.ticket.assignee_id, Some(coordinator.user_id));
    assert_eq!(assigned.ticket.assignee_name.as_deref(), Some("korwil"));
    assert_eq!(assigned.ticket.status, TicketStatus::InProgress);

    let query = TicketQuery { assigned_to_me: true, ..TicketQuery::default() };
    let queue = ctx.tickets.list(&coordinator, &query, Page::default()).await?;
    assert_eq!(queue.total, 1);
    Ok(())
}

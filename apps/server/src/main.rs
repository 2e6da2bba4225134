use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use spk_access::{hierarchy::SUPER_ADMIN, AccessService, MemberScope};
use spk_auth::{AuthError, Registration};
use spk_config::load as load_config;
use spk_database::{MemberStatsFilter, UserRepository};
use spk_gateway::create_router;
use spk_runtime::{telemetry, BackendServices};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser)]
#[command(name = "spk-server")]
#[command(about = "SPK membership platform backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve,
    /// Create a login, or reuse an existing one, and grant it Super Admin
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Print the dashboard aggregates as JSON
    Stats {
        /// Restrict member figures to one province id
        #[arg(long)]
        province: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing().context("failed to initialise tracing")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server().await,
        Commands::CreateAdmin { email, password, name } => create_admin(email, password, name).await,
        Commands::Stats { province } => print_stats(province).await,
    }
}

async fn initialise() -> anyhow::Result<(spk_config::AppConfig, BackendServices)> {
    let config = load_config().context("failed to load configuration")?;
    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;
    Ok((config, services))
}

async fn run_server() -> anyhow::Result<()> {
    info!("starting SPK backend");
    let (config, services) = initialise().await?;

    let app = create_router(services.state);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(spk_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}

async fn create_admin(email: String, password: String, name: Option<String>) -> anyhow::Result<()> {
    let (_, services) = initialise().await?;
    let authenticator = services.state.authenticator();

    let registration = Registration {
        email: email.trim().to_lowercase(),
        password,
        username: None,
        display_name: name,
    };
    let user_id = match authenticator.register_with_password(&registration).await {
        Ok(user) => {
            info!(email = %registration.email, "admin login created");
            user.id
        }
        Err(AuthError::UserExists) => {
            let user = UserRepository::new(services.db_pool.clone())
                .find_by_email(&registration.email)
                .await
                .context("failed to look up existing user")?
                .with_context(|| format!("no login registered for {}", registration.email))?;
            info!(email = %registration.email, "reusing existing login");
            user.id
        }
        Err(error) => return Err(error).context("failed to create admin login"),
    };

    AccessService::new(services.db_pool.clone())
        .grant_system_role(user_id, SUPER_ADMIN)
        .await
        .context("failed to grant Super Admin")?;

    println!("{} is now a {SUPER_ADMIN} (user id {user_id})", registration.email);
    Ok(())
}

async fn print_stats(province: Option<i64>) -> anyhow::Result<()> {
    let (_, services) = initialise().await?;

    let scope = province.map_or(MemberScope::All, MemberScope::Province);
    let filter = MemberStatsFilter {
        province_id: province,
        user_id: None,
    };
    let dashboard = services
        .state
        .statistics()
        .summary(scope, filter, Utc::now())
        .await
        .context("failed to compute statistics")?;

    println!("{}", serde_json::to_string_pretty(&dashboard)?);
    Ok(())
}

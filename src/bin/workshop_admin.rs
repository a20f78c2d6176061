use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use workshop_api::{
    auth::{AuthConfig, AuthService, CreateUserRequest},
    config, db,
    models::UserRole,
};

#[derive(Parser)]
#[command(name = "workshop-admin", about = "Administrative tasks for the workshop API", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Create a user account
    CreateUser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        full_name: String,
        /// ADMIN, MANAGER or STAFF
        #[arg(long, default_value = "STAFF")]
        role: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(&cfg.log_level, cfg.log_json);

    let pool = db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to database")?;

    match cli.command {
        Commands::Migrate => {
            db::run_migrations(&pool).await.context("migration failed")?;
            println!("Migrations applied");
        }
        Commands::CreateUser {
            email,
            password,
            full_name,
            role,
        } => {
            let role: UserRole = role
                .parse()
                .with_context(|| format!("unknown role '{}'", role))?;
            // Make sure the users table exists before inserting.
            db::run_migrations(&pool).await.context("migration failed")?;

            let auth = AuthService::new(AuthConfig::from(&cfg), Arc::new(pool.clone()));
            let user = auth
                .create_user(CreateUserRequest {
                    email,
                    password,
                    full_name,
                    role,
                })
                .await?;
            println!("Created {} user {} ({})", user.role, user.email, user.id);
        }
    }

    db::close_pool(pool).await?;
    Ok(())
}

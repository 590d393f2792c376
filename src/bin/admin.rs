//! CLI administration tool for shunt.
//!
//! Provides commands for provisioning tenants, managing urls, seeding a
//! development database and checking connectivity without HTTP access.
//!
//! # Usage
//!
//! ```bash
//! # Provision a tenant and print its admin token
//! cargo run --bin admin -- domain create shunt.to --title Shunt
//!
//! # Rotate a tenant's admin token
//! cargo run --bin admin -- domain token shunt.to
//!
//! # Manage urls
//! cargo run --bin admin -- url add --domain shunt.to docs https://docs.example.com
//! cargo run --bin admin -- url toggle --domain shunt.to docs --disable
//! cargo run --bin admin -- url list --domain shunt.to
//!
//! # Development data
//! cargo run --bin admin -- seed
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Same as the server (see `shunt::config`). With Redis configured, url
//! changes evict the affected cache entries just like the HTTP admin API.

use shunt::application::services::{CacheInvalidator, DomainService, UrlService};
use shunt::config::{self, Config};
use shunt::domain::entities::{Domain, NewUrl, NewVisit};
use shunt::domain::repositories::{DomainRepository, UrlRepository, VisitRepository};
use shunt::infrastructure::cache::{CacheService, NullCache, RedisCache};
use shunt::infrastructure::persistence::{
    PgDomainRepository, PgUrlRepository, PgVisitRepository,
};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input};
use rand::Rng;
use rand::seq::IndexedRandom;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing shunt.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage tenants
    Domain {
        #[command(subcommand)]
        action: DomainAction,
    },

    /// Manage a tenant's urls
    Url {
        #[command(subcommand)]
        action: UrlAction,
    },

    /// Insert development data for the shunt.to tenant
    Seed,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Tenant subcommands.
#[derive(Subcommand)]
enum DomainAction {
    /// Provision a tenant and print its admin token
    Create {
        /// Host the tenant is served on (e.g. "shunt.to")
        host: String,

        /// Display title (defaults to the host)
        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Replace a tenant's admin token
    Token { host: String },

    /// List all tenants
    List,
}

/// Url subcommands. All of them are scoped to `--domain`.
#[derive(Subcommand)]
enum UrlAction {
    /// Create a slug mapping
    Add {
        #[arg(short, long)]
        domain: String,

        slug: String,

        target: String,

        /// Create the url disabled
        #[arg(long)]
        disabled: bool,

        /// End of the availability window (RFC 3339)
        #[arg(long)]
        end_at: Option<DateTime<Utc>>,
    },

    /// Enable or disable a slug
    Toggle {
        #[arg(short, long)]
        domain: String,

        slug: String,

        /// Disable instead of enable
        #[arg(long)]
        disable: bool,
    },

    /// Delete a slug
    Remove {
        #[arg(short, long)]
        domain: String,

        slug: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List a tenant's urls
    List {
        #[arg(short, long)]
        domain: String,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,
}

/// Services the commands operate through.
struct Admin {
    domains: DomainService,
    urls: UrlService,
    visit_repository: Arc<dyn VisitRepository>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env()?;

    let pool = PgPool::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::Domain { action } => {
            handle_domain_action(action, &build_admin(&config, pool).await).await?
        }
        Commands::Url { action } => {
            handle_url_action(action, &build_admin(&config, pool).await).await?
        }
        Commands::Seed => seed(&build_admin(&config, pool).await).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

async fn build_admin(config: &Config, pool: PgPool) -> Admin {
    let pool = Arc::new(pool);
    let domain_repository: Arc<dyn DomainRepository> =
        Arc::new(PgDomainRepository::new(pool.clone()));
    let url_repository: Arc<dyn UrlRepository> = Arc::new(PgUrlRepository::new(pool.clone()));

    let cache: Arc<dyn CacheService> = match &config.redis_url {
        Some(redis_url) => match RedisCache::connect(redis_url).await {
            Ok(redis) => Arc::new(redis),
            Err(e) => {
                println!(
                    "{}",
                    format!("⚠️  Redis unavailable ({}), cache will not be invalidated", e)
                        .yellow()
                );
                Arc::new(NullCache::new())
            }
        },
        None => Arc::new(NullCache::new()),
    };

    Admin {
        domains: DomainService::new(domain_repository, config.token_signing_secret.clone()),
        urls: UrlService::new(url_repository, CacheInvalidator::new(cache)),
        visit_repository: Arc::new(PgVisitRepository::new(pool)),
    }
}

/// Dispatches tenant commands.
async fn handle_domain_action(action: DomainAction, admin: &Admin) -> Result<()> {
    match action {
        DomainAction::Create {
            host,
            title,
            description,
            yes,
        } => create_domain(admin, host, title, description, yes).await,
        DomainAction::Token { host } => rotate_token(admin, &host).await,
        DomainAction::List => list_domains(admin).await,
    }
}

/// Provisions a tenant with interactive prompts.
///
/// # Flow
///
/// 1. Prompt for a title (unless provided or `--yes`)
/// 2. Confirm creation (unless `--yes`)
/// 3. Store the tenant with the HMAC of a freshly generated token
/// 4. Display the token once
async fn create_domain(
    admin: &Admin,
    host: String,
    title: Option<String>,
    description: Option<String>,
    skip_confirm: bool,
) -> Result<()> {
    println!("{}", "🌐 Create Domain".bright_blue().bold());
    println!();

    let title = match title {
        Some(t) => Some(t),
        None if skip_confirm => None,
        None => Some(
            Input::new()
                .with_prompt("Title")
                .with_initial_text(host.clone())
                .interact_text()?,
        ),
    };

    println!("  Host:  {}", host.cyan());
    if let Some(ref t) = title {
        println!("  Title: {}", t.cyan());
    }
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Create this domain?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let (domain, token) = admin
        .domains
        .provision(&host, title, description)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create domain: {}", e))?;

    println!("{}", "✅ Domain created successfully!".green().bold());
    print_token(&domain.host, &token);

    Ok(())
}

async fn rotate_token(admin: &Admin, host: &str) -> Result<()> {
    println!("{}", "🔑 Rotate Admin Token".bright_blue().bold());
    println!();

    let confirmed = Confirm::new()
        .with_prompt(format!("Invalidate the current token of {}?", host))
        .default(false)
        .interact()?;

    if !confirmed {
        println!("{}", "❌ Cancelled".red());
        return Ok(());
    }

    let token = admin
        .domains
        .rotate_token(host)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to rotate token: {}", e))?;

    println!("{}", "✅ Token rotated".green().bold());
    print_token(host, &token);

    Ok(())
}

fn print_token(host: &str, token: &str) {
    println!();
    println!("  Token: {}", token.bright_yellow().bold());
    println!();
    println!(
        "{}",
        "⚠️  IMPORTANT: Save this token now! You won't be able to see it again."
            .red()
            .bold()
    );
    println!();
    println!("{}", "Example:".bright_white());
    println!(
        "  curl -H \"Host: {}\" -H \"Authorization: Bearer {}\" http://localhost:3000/-/api/urls",
        host,
        token.bright_yellow()
    );
    println!();
}

/// Lists all tenants.
///
/// # Output Format
///
/// ```text
/// 📋 Domains
///
///   ID  Host                           Title                Token
///   ───────────────────────────────────────────────────────────────────────────
///   1   shunt.to                       Shunt                SET
/// ```
async fn list_domains(admin: &Admin) -> Result<()> {
    println!("{}", "📋 Domains".bright_blue().bold());
    println!();

    let domains = admin
        .domains
        .list()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list domains: {}", e))?;

    if domains.is_empty() {
        println!("{}", "  No domains found".yellow());
        println!();
        println!(
            "  Create one with: {} admin domain create <host>",
            "cargo run --bin".bright_cyan()
        );
        return Ok(());
    }

    println!(
        "  {:<3} {:<30} {:<20} {:<10}",
        "ID".bright_white().bold(),
        "Host".bright_white().bold(),
        "Title".bright_white().bold(),
        "Token".bright_white().bold()
    );
    println!("  {}", "─".repeat(75).bright_black());

    for domain in &domains {
        let token = if domain.has_admin_credential() {
            "SET".green()
        } else {
            "NONE".red()
        };

        println!(
            "  {:<3} {:<30} {:<20} {}",
            domain.id.to_string().bright_black(),
            domain.host.cyan(),
            domain.title,
            token
        );
    }

    println!();
    println!(
        "  Total: {}",
        domains.len().to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

/// Dispatches url commands.
async fn handle_url_action(action: UrlAction, admin: &Admin) -> Result<()> {
    match action {
        UrlAction::Add {
            domain,
            slug,
            target,
            disabled,
            end_at,
        } => {
            let domain = load_domain(admin, &domain).await?;
            let url = admin
                .urls
                .add(
                    &domain,
                    NewUrl {
                        domain_id: domain.id,
                        slug,
                        target,
                        enabled: !disabled,
                        start_at: None,
                        end_at,
                    },
                )
                .await
                .map_err(|e| anyhow::anyhow!("Failed to add url: {}", e))?;

            println!(
                "{} {} → {}",
                "✅ Added".green().bold(),
                format!("https://{}/{}", url.domain, url.slug).cyan(),
                url.target
            );
        }
        UrlAction::Toggle {
            domain,
            slug,
            disable,
        } => {
            let domain = load_domain(admin, &domain).await?;
            let url = admin
                .urls
                .toggle(&domain, &slug, !disable)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to toggle url: {}", e))?;

            let state = if url.enabled {
                "ENABLED".green()
            } else {
                "DISABLED".red()
            };
            println!("{} {} is now {}", "✅".green(), url.slug.cyan(), state);
        }
        UrlAction::Remove { domain, slug, yes } => {
            let domain = load_domain(admin, &domain).await?;

            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Delete {}/{}?", domain.host, slug))
                    .default(false)
                    .interact()?;

                if !confirmed {
                    println!("{}", "❌ Cancelled".red());
                    return Ok(());
                }
            }

            admin
                .urls
                .remove(&domain, &slug)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to remove url: {}", e))?;

            println!("{} {}", "✅ Removed".green().bold(), slug.cyan());
        }
        UrlAction::List { domain } => {
            let domain = load_domain(admin, &domain).await?;
            list_urls(admin, &domain).await?;
        }
    }

    Ok(())
}

async fn load_domain(admin: &Admin, host: &str) -> Result<Domain> {
    admin
        .domains
        .get_by_host(&host.trim().to_ascii_lowercase())
        .await
        .map_err(|e| anyhow::anyhow!("{}: {}", host, e))
}

async fn list_urls(admin: &Admin, domain: &Domain) -> Result<()> {
    println!("{} {}", "📋 Urls of".bright_blue().bold(), domain.host.cyan());
    println!();

    let urls = admin
        .urls
        .list(domain)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list urls: {}", e))?;

    if urls.is_empty() {
        println!("{}", "  No urls found".yellow());
        return Ok(());
    }

    let now = Utc::now();
    for url in &urls {
        let status = if url.is_available_at(now) {
            "LIVE".green()
        } else if url.enabled {
            "OUT OF WINDOW".yellow()
        } else {
            "DISABLED".red()
        };

        println!(
            "  {:<20} {:<10} {}",
            url.slug.cyan(),
            status,
            url.target.bright_black()
        );
    }

    println!();
    println!("  Total: {}", urls.len().to_string().bright_white().bold());
    println!();

    Ok(())
}

const SEED_HOST: &str = "shunt.to";

const SEED_TARGETS: &[&str] = &[
    "https://www.nytimes.com",
    "https://vercel.com",
    "https://github.com",
    "https://www.wikipedia.org",
    "https://www.youtube.com",
    "https://openai.com",
    "https://nextjs.org",
    "https://www.apple.com",
    "https://www.reddit.com",
    "https://developer.mozilla.org",
];

const SEED_REFERRERS: &[Option<&str>] = &[
    None,
    Some("https://google.com"),
    Some("https://twitter.com"),
    Some("https://github.com"),
    Some("https://newsletter.site"),
];

const SEED_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (iPhone; CPU iPhone OS 15_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.2 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 10; SM-G970F) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/88.0.4324.93 Mobile Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_2) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

/// Visits generated for the `metrics` slug; the first few land today.
const SEED_METRICS_VISITS: usize = 1000;
const SEED_METRICS_VISITS_TODAY: usize = 75;

/// Inserts the development dataset.
///
/// - Tenant `shunt.to` (created if missing, token printed once)
/// - `metrics → https://shunt.to/metrics` with 1000 visits over 90 days
/// - `slug0..slug11` starting yesterday, every fifth one disabled, with 1-10 visits each
///
/// Existing slugs are left untouched.
async fn seed(admin: &Admin) -> Result<()> {
    println!("{}", "🌱 Seeding development data".bright_blue().bold());
    println!();

    let domain = match admin.domains.get_by_host(SEED_HOST).await {
        Ok(domain) => {
            println!("  Domain {} already exists", SEED_HOST.cyan());
            domain
        }
        Err(_) => {
            let (domain, token) = admin
                .domains
                .provision(
                    SEED_HOST,
                    Some("Shunt".to_string()),
                    Some("A URL shortener".to_string()),
                )
                .await
                .map_err(|e| anyhow::anyhow!("Failed to create domain: {}", e))?;
            println!("  Domain {} created", SEED_HOST.cyan());
            print_token(SEED_HOST, &token);
            domain
        }
    };

    let now = Utc::now();
    let yesterday = now - Duration::days(1);

    let metrics_visits: Vec<DateTime<Utc>> = {
        let mut rng = rand::rng();
        (0..SEED_METRICS_VISITS)
            .map(|i| {
                if i < SEED_METRICS_VISITS_TODAY {
                    now
                } else {
                    now - Duration::minutes(rng.random_range(0..90 * 24 * 60))
                }
            })
            .collect()
    };
    seed_url(
        admin,
        &domain,
        "metrics",
        "https://shunt.to/metrics",
        true,
        now,
        metrics_visits,
    )
    .await?;

    for i in 0..12 {
        let (target, visits) = {
            let mut rng = rand::rng();
            let target = *SEED_TARGETS.choose(&mut rng).unwrap_or(&SEED_TARGETS[0]);
            let count = rng.random_range(1..=10);
            let visits: Vec<DateTime<Utc>> = (0..count)
                .map(|_| yesterday + Duration::seconds(rng.random_range(0..24 * 60 * 60)))
                .collect();
            (target, visits)
        };

        seed_url(
            admin,
            &domain,
            &format!("slug{i}"),
            target,
            i % 5 != 0,
            yesterday,
            visits,
        )
        .await?;
    }

    println!();
    println!("{}", "✅ Seed complete".green().bold());
    println!();

    Ok(())
}

async fn seed_url(
    admin: &Admin,
    domain: &Domain,
    slug: &str,
    target: &str,
    enabled: bool,
    start_at: DateTime<Utc>,
    visits: Vec<DateTime<Utc>>,
) -> Result<()> {
    let existing = admin
        .urls
        .list(domain)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list urls: {}", e))?
        .into_iter()
        .any(|u| u.slug == slug);
    if existing {
        println!("  {} {}", "skip".bright_black(), slug);
        return Ok(());
    }

    let url = admin
        .urls
        .add(
            domain,
            NewUrl {
                domain_id: domain.id,
                slug: slug.to_string(),
                target: target.to_string(),
                enabled,
                start_at: Some(start_at),
                end_at: None,
            },
        )
        .await
        .map_err(|e| anyhow::anyhow!("Failed to add {}: {}", slug, e))?;

    let rows: Vec<NewVisit> = {
        let mut rng = rand::rng();
        visits
            .into_iter()
            .map(|visited_at| NewVisit {
                visited_at,
                referrer: SEED_REFERRERS
                    .choose(&mut rng)
                    .copied()
                    .flatten()
                    .map(str::to_string),
                user_agent: SEED_USER_AGENTS.choose(&mut rng).map(|ua| ua.to_string()),
                ip: Some(format!(
                    "{}.{}.{}.{}",
                    rng.random_range(1..=223),
                    rng.random::<u8>(),
                    rng.random::<u8>(),
                    rng.random_range(1..=254)
                )),
                domain_id: domain.id,
                url_id: url.id,
            })
            .collect()
    };

    let count = rows.len();
    for row in rows {
        admin
            .visit_repository
            .insert(row)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to insert visit: {}", e))?;
    }

    let state = if enabled { "".normal() } else { " (disabled)".red() };
    println!(
        "  {} {} → {}{}, {} visits",
        "add".green(),
        slug.cyan(),
        target,
        state,
        count
    );

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            let domains: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM domains")
                .fetch_one(pool)
                .await?;
            let urls: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM urls")
                .fetch_one(pool)
                .await?;

            println!("{}", "✅ Database connection OK".green().bold());
            println!(
                "  Domains: {}  Urls: {}",
                domains.to_string().bright_green().bold(),
                urls.to_string().bright_green().bold()
            );
        }
    }

    Ok(())
}

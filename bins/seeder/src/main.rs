//! Database seeder for Docket development and testing.
//!
//! Seeds a demo user (`demo` / `demo123`) and a handful of sample targets
//! assigned to it. Safe to run repeatedly.
//!
//! Usage: cargo run --bin seeder

use anyhow::{Context, bail};
use chrono::{DateTime, TimeZone, Utc};
use tracing::info;
use uuid::Uuid;

use docket_core::auth::hash_password;
use docket_core::target::{NewTarget, TargetRepository as _, TargetStatus, UpdateTargetRequest};
use docket_db::{CreateUserInput, TargetRepository, UserRepository};

const DEMO_USERNAME: &str = "demo";
const DEMO_PASSWORD: &str = "demo123";

struct SampleTarget {
    title: &'static str,
    description: &'static str,
    tags: &'static [&'static str],
    assigned: (i32, u32, u32),
    due: (i32, u32, u32),
    document_count: u32,
    completed_with_score: Option<i32>,
}

const SAMPLE_TARGETS: &[SampleTarget] = &[
    SampleTarget {
        title: "Website Redesign",
        description: "Redesign the company website with modern UI/UX principles and responsive design.",
        tags: &["Design", "Frontend", "UI/UX"],
        assigned: (2024, 1, 15),
        due: (2024, 2, 15),
        document_count: 5,
        completed_with_score: None,
    },
    SampleTarget {
        title: "Database Migration",
        description: "Migrate the legacy database to new cloud infrastructure with zero downtime.",
        tags: &["Backend", "Database", "DevOps"],
        assigned: (2024, 1, 10),
        due: (2024, 1, 25),
        document_count: 8,
        completed_with_score: Some(95),
    },
    SampleTarget {
        title: "API Documentation",
        description: "Write API documentation for external developers, with request and response examples.",
        tags: &["Documentation", "API", "Technical"],
        assigned: (2024, 1, 12),
        due: (2024, 1, 30),
        document_count: 3,
        completed_with_score: None,
    },
    SampleTarget {
        title: "Mobile App Testing",
        description: "Test the mobile app across devices and OS versions before release.",
        tags: &["Testing", "Mobile", "QA"],
        assigned: (2024, 1, 8),
        due: (2024, 2, 5),
        document_count: 12,
        completed_with_score: None,
    },
    SampleTarget {
        title: "Security Audit",
        description: "Audit authentication, data handling and third-party dependencies.",
        tags: &["Security", "Audit", "Compliance"],
        assigned: (2024, 1, 5),
        due: (2024, 2, 10),
        document_count: 15,
        completed_with_score: None,
    },
    SampleTarget {
        title: "Performance Optimization",
        description: "Cut page load times by optimizing assets, queries and caching.",
        tags: &["Performance", "Optimization", "Frontend"],
        assigned: (2024, 1, 20),
        due: (2024, 2, 20),
        document_count: 6,
        completed_with_score: None,
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

    info!("Connecting to database...");
    let db = docket_db::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    let user_id = seed_demo_user(&UserRepository::new(db.clone())).await?;
    seed_sample_targets(&TargetRepository::new(db), user_id).await?;

    info!("Seeding complete");
    Ok(())
}

/// Creates the demo user unless it already exists.
async fn seed_demo_user(users: &UserRepository) -> anyhow::Result<Uuid> {
    if let Some(existing) = users.find_by_username(DEMO_USERNAME).await? {
        info!(user_id = %existing.id, "Demo user already exists, skipping");
        return Ok(existing.id);
    }

    let user = users
        .create(CreateUserInput {
            username: DEMO_USERNAME.to_string(),
            password_hash: hash_password(DEMO_PASSWORD)?,
            name: "Demo User".to_string(),
            phone: "+1234567890".to_string(),
        })
        .await?;

    info!(user_id = %user.id, username = %user.username, "Demo user created");
    Ok(user.id)
}

async fn seed_sample_targets(targets: &TargetRepository, owner: Uuid) -> anyhow::Result<()> {
    if !targets.list_owned(owner, None).await?.is_empty() {
        info!("Demo user already has targets, skipping");
        return Ok(());
    }

    for sample in SAMPLE_TARGETS {
        let target = targets
            .create(NewTarget {
                title: sample.title.to_string(),
                description: sample.description.to_string(),
                tags: sample.tags.iter().map(ToString::to_string).collect(),
                assigned_date: date(sample.assigned)?,
                target_date: date(sample.due)?,
                document_count: sample.document_count,
                assigned_to: owner,
            })
            .await?;

        let status = match sample.completed_with_score {
            Some(score) => {
                let patch = UpdateTargetRequest {
                    status: Some(TargetStatus::Completed),
                    score: Some(score),
                    ..UpdateTargetRequest::default()
                };
                targets
                    .update(target.id, owner, patch)
                    .await?
                    .map_or(target.status, |t| t.status)
            }
            None => target.status,
        };

        info!(target_id = %target.id, title = sample.title, %status, "Sample target created");
    }

    Ok(())
}

fn date((year, month, day): (i32, u32, u32)) -> anyhow::Result<DateTime<Utc>> {
    match Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).single() {
        Some(date) => Ok(date),
        None => bail!("invalid sample date {year}-{month}-{day}"),
    }
}

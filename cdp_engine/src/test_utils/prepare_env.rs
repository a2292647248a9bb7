use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::{db_types::Plan, SqliteDatabase};

pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    db.migrate().await.expect("Error running DB migrations");
    info!("🚀️ Migrations complete");
    db
}

pub fn random_db_path() -> String {
    let dir = std::env::temp_dir();
    format!("sqlite://{}/cdp_test_store_{}.db", dir.display(), rand::random::<u64>())
}

pub async fn create_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        trace!("Nothing to drop at {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("Created Sqlite database {url}");
}

/// The plan list from the Coder Duo pricing page, for seeding test and development databases.
pub fn sample_plans() -> Vec<Plan> {
    serde_json::from_str(include_str!("./test_assets/plans.json")).expect("plans.json is not valid")
}

pub async fn seed_plans(db: &SqliteDatabase) {
    for plan in sample_plans() {
        db.upsert_plan(&plan).await.expect("Error seeding plan");
    }
}

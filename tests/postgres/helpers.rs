//! Shared test helpers for `PostgreSQL` integration tests.

use std::sync::Arc;

use diesel::prelude::*;
use eyre::{Result, WrapErr};
use tasktracker::config::TaskStoreConfig;
use tasktracker::task::adapters::postgres::{ConstraintMap, PostgresTaskRepository, TaskPgPool};
use uuid::Uuid;

use super::cluster::{TemporaryDatabase, shared_cluster};

/// A repository bound to a throwaway database.
///
/// Fields drop in declaration order, so the pool closes before the database
/// is removed.
pub struct PreparedRepo {
    /// Repository under test.
    pub repository: Arc<PostgresTaskRepository>,
    /// The pool the repository draws from.
    pub pool: TaskPgPool,
    /// Connection URL of the throwaway database.
    pub url: String,
    _database: TemporaryDatabase,
}

/// Prepares a repository with the default constraint names.
///
/// # Errors
///
/// Returns an error if the template or the per-test database cannot be set up.
pub fn prepared_repo() -> Result<PreparedRepo> {
    prepared_repo_with(ConstraintMap::default())
}

/// Prepares a repository that classifies violations with `constraints`.
///
/// # Errors
///
/// Returns an error if the template or the per-test database cannot be set up.
pub fn prepared_repo_with(constraints: ConstraintMap) -> Result<PreparedRepo> {
    prepared_repo_sized(constraints, 4)
}

/// Prepares a repository whose pool holds at most `max_pool_size`
/// connections.
///
/// # Errors
///
/// Returns an error if the template or the per-test database cannot be set up.
pub fn prepared_repo_sized(
    constraints: ConstraintMap,
    max_pool_size: u32,
) -> Result<PreparedRepo> {
    let cluster = shared_cluster();
    cluster.ensure_template()?;
    let database = cluster.temporary_database(&format!("task_{}", Uuid::new_v4().simple()))?;
    let url = database.url().to_owned();

    let mut config = TaskStoreConfig::new(url.clone());
    config.max_pool_size = max_pool_size;
    let pool = config.build_pool().wrap_err("build test pool")?;
    Ok(PreparedRepo {
        repository: Arc::new(PostgresTaskRepository::with_constraints(pool.clone(), constraints)),
        pool,
        url,
        _database: database,
    })
}

/// Runs raw SQL against `url`, bypassing the repository.
///
/// # Errors
///
/// Returns an error if the connection or the statement fails.
pub async fn run_sql(database_url: &str, sql: &'static str) -> Result<usize> {
    let url = database_url.to_owned();
    tokio::task::spawn_blocking(move || {
        let mut connection = PgConnection::establish(&url).wrap_err("connect")?;
        diesel::sql_query(sql)
            .execute(&mut connection)
            .wrap_err_with(|| format!("execute {sql}"))
    })
    .await?
}

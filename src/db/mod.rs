mod postgres;
mod sqlite;

use anyhow::{Context, Result};
use log::debug;
use rusqlite::Connection;
use sqlx::PgConnection;

use crate::config::DatabaseTarget;
use crate::model::{Course, Program};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CourseLoad {
    pub inserted: usize,
    pub skipped: usize,
}

/// One open database connection, SQLite or PostgreSQL.
pub enum Store {
    Sqlite(Connection),
    Postgres(PgConnection),
}

impl Store {
    pub async fn open(target: &DatabaseTarget) -> Result<Self> {
        match target {
            DatabaseTarget::Sqlite(path) => {
                debug!("Opening SQLite database {:?}", path);
                let conn = Connection::open(path)
                    .with_context(|| format!("Failed to open SQLite database: {:?}", path))?;
                sqlite::init(&conn)?;
                Ok(Store::Sqlite(conn))
            }
            DatabaseTarget::Postgres(url) => {
                debug!("Connecting to PostgreSQL");
                let conn = <PgConnection as sqlx::Connection>::connect(url)
                    .await
                    .context("Failed to connect to PostgreSQL")?;
                Ok(Store::Postgres(conn))
            }
        }
    }

    pub async fn replace_programs(&mut self, programs: &[Program]) -> Result<usize> {
        match self {
            Store::Sqlite(conn) => sqlite::replace_programs(conn, programs),
            Store::Postgres(conn) => postgres::replace_programs(conn, programs).await,
        }
    }

    pub async fn load_courses(&mut self, courses: &[Course], keep_existing: bool) -> Result<CourseLoad> {
        match self {
            Store::Sqlite(conn) => sqlite::load_courses(conn, courses, keep_existing),
            Store::Postgres(conn) => postgres::load_courses(conn, courses, keep_existing).await,
        }
    }

    pub async fn close(self) -> Result<()> {
        match self {
            Store::Sqlite(conn) => conn.close().map_err(|(_, e)| e)?,
            Store::Postgres(conn) => sqlx::Connection::close(conn).await?,
        }
        Ok(())
    }
}

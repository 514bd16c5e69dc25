use crate::Database;
use crate::error::WriteError;
use crate::models::{ArticleRow, UserRow};
use anyhow::Result;
use rusqlite::{Connection, ErrorCode, OptionalExtension};

impl Database {
    // -- Users --

    pub fn get_user_by_login(&self, login: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_login(conn, login))
    }

    // -- Articles --

    pub fn get_article(&self, id: i64) -> Result<Option<ArticleRow>> {
        self.with_conn(|conn| query_article(conn, id))
    }

    pub fn get_all_articles(&self) -> Result<Vec<ArticleRow>> {
        self.with_conn(query_all_articles)
    }

    /// True iff article `id` exists and belongs to `login`. A missing article
    /// and someone else's article both answer false.
    pub fn owns_article(&self, id: i64, login: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM articles a
                     JOIN users u ON a.user_id = u.id
                     WHERE a.id = ?1 AND u.login = ?2",
                    rusqlite::params![id, login],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }
}

fn query_user_by_login(conn: &Connection, login: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, login, password_hash, created_at FROM users WHERE login = ?1")?;

    let row = stmt
        .query_row([login], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                login: row.get(1)?,
                password_hash: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_article(conn: &Connection, id: i64) -> Result<Option<ArticleRow>> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.user_id, u.login, a.text
         FROM articles a
         JOIN users u ON a.user_id = u.id
         WHERE a.id = ?1",
    )?;

    let row = stmt
        .query_row([id], |row| {
            Ok(ArticleRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                author: row.get(2)?,
                text: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_all_articles(conn: &Connection) -> Result<Vec<ArticleRow>> {
    // JOIN users to fetch the author login in a single query
    let mut stmt = conn.prepare(
        "SELECT a.id, a.user_id, u.login, a.text
         FROM articles a
         JOIN users u ON a.user_id = u.id
         ORDER BY a.id",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(ArticleRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                author: row.get(2)?,
                text: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

// -- Write statements --
//
// Only the mutation worker calls these, always on the writer connection.

pub(crate) fn insert_user(
    conn: &Connection,
    login: &str,
    password_hash: &str,
) -> Result<i64, WriteError> {
    let taken = conn
        .query_row("SELECT 1 FROM users WHERE login = ?1", [login], |_| Ok(()))
        .optional()?
        .is_some();
    if taken {
        return Err(WriteError::Conflict);
    }

    match conn.execute(
        "INSERT INTO users (login, password_hash) VALUES (?1, ?2)",
        (login, password_hash),
    ) {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
            Err(WriteError::Conflict)
        }
        Err(e) => Err(e.into()),
    }
}

/// Resolves `owner_login` and inserts in one statement.
pub(crate) fn insert_article(
    conn: &Connection,
    owner_login: &str,
    text: &str,
) -> Result<i64, WriteError> {
    let inserted = conn.execute(
        "INSERT INTO articles (user_id, text) SELECT id, ?2 FROM users WHERE login = ?1",
        (owner_login, text),
    )?;
    if inserted == 0 {
        return Err(WriteError::NotFound("user"));
    }
    Ok(conn.last_insert_rowid())
}

pub(crate) fn update_article(conn: &Connection, id: i64, text: &str) -> Result<(), WriteError> {
    let updated = conn.execute(
        "UPDATE articles SET text = ?1 WHERE id = ?2",
        rusqlite::params![text, id],
    )?;
    if updated == 0 {
        return Err(WriteError::NotFound("article"));
    }
    Ok(())
}

pub(crate) fn delete_article(conn: &Connection, id: i64) -> Result<(), WriteError> {
    let deleted = conn.execute("DELETE FROM articles WHERE id = ?1", [id])?;
    if deleted == 0 {
        return Err(WriteError::NotFound("article"));
    }
    Ok(())
}

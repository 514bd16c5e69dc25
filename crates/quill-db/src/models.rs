/// Database row types. Distinct from quill-types models so the wire format
/// can change without touching SQL.

pub struct UserRow {
    pub id: i64,
    pub login: String,
    pub password_hash: String,
    pub created_at: String,
}

pub struct ArticleRow {
    pub id: i64,
    pub user_id: i64,
    pub author: String,
    pub text: String,
}

impl From<ArticleRow> for quill_types::models::Article {
    fn from(row: ArticleRow) -> Self {
        Self {
            id: row.id,
            author: row.author,
            user_id: row.user_id,
            text: row.text,
        }
    }
}

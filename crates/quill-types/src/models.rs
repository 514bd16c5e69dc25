use serde::{Deserialize, Serialize};

/// A published article as clients see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub author: String,
    pub user_id: i64,
    pub text: String,
}

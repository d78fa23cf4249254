use super::UserId;
use serde::{Deserialize, Serialize};

/// Profile returned by the credential exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(alias = "_id")]
    pub id: UserId,
    pub username: String,
    pub email: String,
}

/// Populated author reference embedded in problems, solutions and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    #[serde(rename = "_id", alias = "id")]
    pub id: UserId,
    #[serde(default)]
    pub username: String,
}

/// `postedBy` as the service sends it: either populated or a bare id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AuthorRef {
    Populated(UserRef),
    Unresolved(UserId),
}

impl AuthorRef {
    pub fn resolved(&self) -> Option<&UserRef> {
        match self {
            Self::Populated(user) => Some(user),
            Self::Unresolved(_) => None,
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.resolved().map(|u| u.username.as_str())
    }
}

impl From<&User> for AuthorRef {
    fn from(user: &User) -> Self {
        Self::Populated(UserRef {
            id: user.id.clone(),
            username: user.username.clone(),
        })
    }
}

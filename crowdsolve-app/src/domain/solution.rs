use super::{AuthorRef, SolutionId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    #[serde(rename = "_id", alias = "id")]
    pub id: SolutionId,
    pub description: String,
    #[serde(default)]
    pub posted_by: Option<AuthorRef>,
    /// Each user appears at most once; membership decides toggle direction.
    #[serde(default)]
    pub upvotes: BTreeSet<UserId>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Solution {
    pub fn upvoted_by(&self, user: &UserId) -> bool {
        self.upvotes.contains(user)
    }
}

use serde::{Deserialize, Serialize};

/// Authoritative answer to an upvote toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpvoteTally {
    pub upvotes: usize,
    pub has_upvoted: bool,
}

use super::{AuthorRef, ProblemId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemStatus {
    #[default]
    Open,
    Resolved,
}

impl ProblemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Resolved => "resolved",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    #[serde(rename = "_id", alias = "id")]
    pub id: ProblemId,
    pub title: String,
    pub description: String,
    pub location: String,
    /// URL of the stored image, if one was uploaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub status: ProblemStatus,
    #[serde(default)]
    pub posted_by: Option<AuthorRef>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;

    #[test]
    fn test_decodes_service_document() {
        let json = r#"{
            "_id": "p1",
            "title": "Pothole on 5th Ave",
            "description": "Deep hole",
            "location": "5th Ave",
            "status": "open",
            "postedBy": {"_id": "u1", "username": "ana"},
            "createdAt": "2024-03-01T10:00:00.000Z"
        }"#;
        let problem: Problem = serde_json::from_str(json).unwrap();

        assert_eq!(problem.id.as_str(), "p1");
        assert_eq!(problem.image, None);
        assert_eq!(problem.status, ProblemStatus::Open);
        assert_eq!(problem.posted_by.as_ref().and_then(|a| a.username()), Some("ana"));
        assert!(problem.created_at.is_some());
    }

    #[test]
    fn test_unpopulated_author_is_unresolved() {
        let json = r#"{"_id":"p2","title":"t","description":"d","location":"l","postedBy":"u9"}"#;
        let problem: Problem = serde_json::from_str(json).unwrap();

        assert_eq!(
            problem.posted_by,
            Some(AuthorRef::Unresolved(UserId::new("u9")))
        );
        assert!(problem.posted_by.unwrap().resolved().is_none());
    }
}

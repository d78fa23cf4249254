use crate::domain::ImageUpload;
use serde::{Deserialize, Serialize};

/// Text fields plus optional attachment for problem create/edit.
#[derive(Debug, Clone, Copy)]
pub struct ProblemPayload<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub location: &'a str,
    pub image: Option<&'a ImageUpload>,
}

#[derive(Debug, Serialize)]
pub struct SolutionPayload<'a> {
    pub description: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CommentPayload<'a> {
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Error payload the service attaches to non-success answers.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

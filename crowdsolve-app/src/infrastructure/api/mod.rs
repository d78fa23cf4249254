mod client;
mod types;

pub use client::ApiClient;
pub use types::{CommentPayload, LoginRequest, ProblemPayload, RegisterRequest, SolutionPayload};

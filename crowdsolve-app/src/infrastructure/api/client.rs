use super::types::{
    CommentPayload, ErrorBody, LoginRequest, ProblemPayload, RegisterRequest, SolutionPayload,
};
use crate::domain::{
    Comment, Problem, ProblemId, Session, Solution, SolutionId, UpvoteTally,
};
use crowdsolve_errors::AppError;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Client for the external problem/solution service. Never retries.
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, AppError> {
        if base_url.cannot_be_a_base() {
            return Err(AppError::Config(format!("{base_url} cannot be used as a base URL")));
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn list_problems(&self) -> Result<Vec<Problem>, AppError> {
        const FALLBACK: &str = "Failed to load problems";
        let request = self.http_client.get(self.endpoint(&["problems"])?);
        decode(self.send(request, FALLBACK).await?, FALLBACK).await
    }

    pub async fn create_problem(
        &self,
        session: &Session,
        payload: ProblemPayload<'_>,
    ) -> Result<Problem, AppError> {
        const FALLBACK: &str = "Failed to create problem";
        let request = self
            .http_client
            .post(self.endpoint(&["problems"])?)
            .bearer_auth(&session.token)
            .multipart(problem_form(payload)?);
        decode(self.send(request, FALLBACK).await?, FALLBACK).await
    }

    pub async fn update_problem(
        &self,
        session: &Session,
        id: &ProblemId,
        payload: ProblemPayload<'_>,
    ) -> Result<Problem, AppError> {
        const FALLBACK: &str = "Failed to update problem";
        let request = self
            .http_client
            .put(self.endpoint(&["problems", id.as_str()])?)
            .bearer_auth(&session.token)
            .multipart(problem_form(payload)?);
        decode(self.send(request, FALLBACK).await?, FALLBACK).await
    }

    pub async fn delete_problem(&self, session: &Session, id: &ProblemId) -> Result<(), AppError> {
        const FALLBACK: &str = "Failed to delete problem";
        let request = self
            .http_client
            .delete(self.endpoint(&["problems", id.as_str()])?)
            .bearer_auth(&session.token);
        self.send(request, FALLBACK).await?;
        Ok(())
    }

    pub async fn list_solutions(&self, problem_id: &ProblemId) -> Result<Vec<Solution>, AppError> {
        const FALLBACK: &str = "Failed to load solutions";
        let request = self
            .http_client
            .get(self.endpoint(&["problems", problem_id.as_str(), "solutions"])?);
        decode(self.send(request, FALLBACK).await?, FALLBACK).await
    }

    pub async fn create_solution(
        &self,
        session: &Session,
        problem_id: &ProblemId,
        description: &str,
    ) -> Result<Solution, AppError> {
        const FALLBACK: &str = "Failed to create solution";
        let request = self
            .http_client
            .post(self.endpoint(&["problems", problem_id.as_str(), "solutions"])?)
            .bearer_auth(&session.token)
            .json(&SolutionPayload { description });
        decode(self.send(request, FALLBACK).await?, FALLBACK).await
    }

    /// Flips the caller's membership in the solution's upvote set.
    pub async fn toggle_upvote(
        &self,
        session: &Session,
        solution_id: &SolutionId,
    ) -> Result<UpvoteTally, AppError> {
        const FALLBACK: &str = "Failed to update upvote";
        let request = self
            .http_client
            .post(self.endpoint(&["solutions", solution_id.as_str(), "upvote"])?)
            .bearer_auth(&session.token)
            .json(&serde_json::json!({}));
        decode(self.send(request, FALLBACK).await?, FALLBACK).await
    }

    pub async fn list_comments(&self, solution_id: &SolutionId) -> Result<Vec<Comment>, AppError> {
        const FALLBACK: &str = "Failed to load comments";
        let request = self
            .http_client
            .get(self.endpoint(&["solutions", solution_id.as_str(), "comments"])?);
        decode(self.send(request, FALLBACK).await?, FALLBACK).await
    }

    pub async fn create_comment(
        &self,
        session: &Session,
        solution_id: &SolutionId,
        text: &str,
    ) -> Result<Comment, AppError> {
        const FALLBACK: &str = "Failed to create comment";
        let request = self
            .http_client
            .post(self.endpoint(&["solutions", solution_id.as_str(), "comments"])?)
            .bearer_auth(&session.token)
            .json(&CommentPayload { text });
        decode(self.send(request, FALLBACK).await?, FALLBACK).await
    }

    pub async fn login(&self, request: &LoginRequest<'_>) -> Result<Session, AppError> {
        const FALLBACK: &str = "Login failed";
        let request = self
            .http_client
            .post(self.endpoint(&["auth", "login"])?)
            .json(request);
        decode(self.send(request, FALLBACK).await?, FALLBACK).await
    }

    pub async fn register(&self, request: &RegisterRequest<'_>) -> Result<Session, AppError> {
        const FALLBACK: &str = "Signup failed";
        let request = self
            .http_client
            .post(self.endpoint(&["auth", "register"])?)
            .json(request);
        decode(self.send(request, FALLBACK).await?, FALLBACK).await
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Config(format!("{} cannot be used as a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends the request and turns any non-success answer into an [`AppError`].
    async fn send(&self, request: RequestBuilder, fallback: &str) -> Result<Response, AppError> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!("Transport failure ({}): {}", fallback, e);
            AppError::Network(fallback.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| fallback.to_string());
        tracing::warn!("Service rejected request: {} - {}", status, message);
        Err(AppError::from_status(status.as_u16(), message))
    }
}

async fn decode<T: DeserializeOwned>(response: Response, fallback: &str) -> Result<T, AppError> {
    response.json().await.map_err(|e| {
        tracing::warn!("Malformed service payload ({}): {}", fallback, e);
        AppError::Rejected(fallback.to_string())
    })
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
}

/// The image part is omitted entirely when there is no attachment.
fn problem_form(payload: ProblemPayload<'_>) -> Result<Form, AppError> {
    let form = Form::new()
        .text("title", payload.title.to_string())
        .text("description", payload.description.to_string())
        .text("location", payload.location.to_string());

    let Some(image) = payload.image else {
        return Ok(form);
    };

    let part = Part::bytes(image.bytes.clone())
        .file_name(image.file_name.clone())
        .mime_str(&image.content_type)
        .map_err(|_| AppError::Validation(format!("unsupported image type: {}", image.content_type)))?;

    Ok(form.part("image", part))
}

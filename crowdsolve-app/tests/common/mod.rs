//! In-process stand-in for the problem/solution REST service.

#![allow(dead_code)]

use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use crowdsolve_app::application::{auth, MutationForm, SignupDraft};
use crowdsolve_app::domain::{
    AuthorRef, Comment, CommentId, Problem, ProblemId, ProblemStatus, Solution, SolutionId, User,
    UserId,
};
use crowdsolve_app::{AppContext, Config};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

type Reject = (StatusCode, Json<Value>);
type Shared = Arc<Mutex<FakeState>>;

/// What the fake saw on a multipart problem write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRecord {
    pub fields: Vec<String>,
    pub image_file: Option<String>,
}

#[derive(Default)]
pub struct FakeState {
    users: Vec<(User, String)>,
    tokens: HashMap<String, UserId>,
    problems: Vec<Problem>,
    solutions: HashMap<ProblemId, Vec<Solution>>,
    comments: HashMap<SolutionId, Vec<Comment>>,
    next_id: HashMap<&'static str, u64>,
    pub uploads: Vec<UploadRecord>,
    /// Applied before answering solution listings, upvotes, deletes and new comments.
    pub delay: Option<Duration>,
    /// The next mutating request is rejected with this status and body.
    pub fail_next: Option<(StatusCode, Value)>,
    pub solution_fetches: usize,
    pub comment_fetches: usize,
}

impl FakeState {
    fn assign(&mut self, prefix: &'static str) -> String {
        let n = self.next_id.entry(prefix).or_insert(0);
        *n += 1;
        format!("{prefix}{n}")
    }

    fn caller(&self, headers: &HeaderMap) -> Result<User, Reject> {
        let token = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "No token provided"))?;
        let id = self
            .tokens
            .get(token)
            .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Invalid token"))?;
        self.users
            .iter()
            .find(|(u, _)| &u.id == id)
            .map(|(u, _)| u.clone())
            .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Invalid token"))
    }

    fn take_failure(&mut self) -> Result<(), Reject> {
        match self.fail_next.take() {
            Some((status, body)) => Err((status, Json(body))),
            None => Ok(()),
        }
    }

    fn issue_session(&mut self, user: &User) -> Value {
        let token = format!("token-{}-{}", user.id, self.tokens.len());
        self.tokens.insert(token.clone(), user.id.clone());
        json!({ "token": token, "user": user })
    }
}

fn reject(status: StatusCode, message: &str) -> Reject {
    (status, Json(json!({ "message": message })))
}

pub struct FakeService {
    pub state: Shared,
    pub base_url: String,
}

/// A client with its own session directory and entity store.
pub struct TestClient {
    pub ctx: AppContext,
    _session_dir: TempDir,
}

impl FakeService {
    pub async fn spawn() -> Self {
        let state: Shared = Arc::new(Mutex::new(FakeState::default()));
        let app = Router::new()
            .route("/api/auth/register", post(register))
            .route("/api/auth/login", post(login))
            .route("/api/problems", get(list_problems).post(create_problem))
            .route("/api/problems/{id}", put(update_problem).delete(delete_problem))
            .route(
                "/api/problems/{id}/solutions",
                get(list_solutions).post(create_solution),
            )
            .route("/api/solutions/{id}/upvote", post(toggle_upvote))
            .route(
                "/api/solutions/{id}/comments",
                get(list_comments).post(create_comment),
            )
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            state,
            base_url: format!("http://{addr}/api"),
        }
    }

    pub fn client(&self) -> TestClient {
        let dir = tempfile::tempdir().unwrap();
        let base_url = self.base_url.clone();
        let session_dir = dir.path().to_string_lossy().into_owned();
        let config = Config::from_lookup(|key| match key {
            "CROWDSOLVE_BASE_URL" => Some(base_url.clone()),
            "CROWDSOLVE_SESSION_DIR" => Some(session_dir.clone()),
            "CROWDSOLVE_TIMEOUT_SECS" => Some("5".to_string()),
            _ => None,
        })
        .unwrap();

        TestClient {
            ctx: AppContext::from_config(&config).unwrap(),
            _session_dir: dir,
        }
    }

    /// A client already signed up and logged in as `username`.
    pub async fn signed_in(&self, username: &str) -> TestClient {
        let client = self.client();
        let form = MutationForm::<SignupDraft>::new();
        form.update(|d| {
            d.username = username.to_string();
            d.email = format!("{username}@example.com");
            d.password = "hunter22".to_string();
            d.confirm_password = "hunter22".to_string();
        });
        let user = auth::register(&client.ctx, &form).await.delivered();
        assert!(user.is_some(), "registration of {username} failed");
        client
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn set_delay(&self, delay: Duration) {
        self.with_state(|s| s.delay = Some(delay));
    }

    pub fn fail_next(&self, status: StatusCode, body: Value) {
        self.with_state(|s| s.fail_next = Some((status, body)));
    }

    pub fn uploads(&self) -> Vec<UploadRecord> {
        self.with_state(|s| s.uploads.clone())
    }

    pub fn problem_ids(&self) -> Vec<String> {
        self.with_state(|s| s.problems.iter().map(|p| p.id.to_string()).collect())
    }

    pub fn upvotes(&self, solution: &str) -> usize {
        self.with_state(|s| {
            s.solutions
                .values()
                .flatten()
                .find(|x| x.id.as_str() == solution)
                .map(|x| x.upvotes.len())
                .unwrap_or(0)
        })
    }

    pub fn solution_fetches(&self) -> usize {
        self.with_state(|s| s.solution_fetches)
    }

    pub fn comment_fetches(&self) -> usize {
        self.with_state(|s| s.comment_fetches)
    }
}

async fn pause(state: &Shared) {
    let delay = state.lock().unwrap().delay;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}

#[derive(Deserialize)]
struct RegisterBody {
    username: String,
    email: String,
    password: String,
}

async fn register(
    State(state): State<Shared>,
    Json(body): Json<RegisterBody>,
) -> Result<Json<Value>, Reject> {
    let mut s = state.lock().unwrap();
    if s.users.iter().any(|(u, _)| u.email == body.email) {
        return Err(reject(StatusCode::BAD_REQUEST, "User already exists"));
    }
    let user = User {
        id: UserId::new(s.assign("u")),
        username: body.username,
        email: body.email,
    };
    s.users.push((user.clone(), body.password));
    Ok(Json(s.issue_session(&user)))
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(
    State(state): State<Shared>,
    Json(body): Json<LoginBody>,
) -> Result<Json<Value>, Reject> {
    let mut s = state.lock().unwrap();
    let user = s
        .users
        .iter()
        .find(|(u, p)| u.email == body.email && p == &body.password)
        .map(|(u, _)| u.clone())
        .ok_or_else(|| reject(StatusCode::BAD_REQUEST, "Invalid credentials"))?;
    Ok(Json(s.issue_session(&user)))
}

async fn list_problems(State(state): State<Shared>) -> Json<Vec<Problem>> {
    Json(state.lock().unwrap().problems.clone())
}

struct ProblemFields {
    text: HashMap<String, String>,
    record: UploadRecord,
}

async fn read_problem_form(mut multipart: Multipart) -> Result<ProblemFields, Reject> {
    let mut text = HashMap::new();
    let mut record = UploadRecord {
        fields: Vec::new(),
        image_file: None,
    };
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| reject(StatusCode::BAD_REQUEST, "Malformed form"))?
    {
        let name = field.name().unwrap_or_default().to_string();
        record.fields.push(name.clone());
        if name == "image" {
            record.image_file = field.file_name().map(str::to_string);
            let _ = field.bytes().await;
        } else {
            let value = field.text().await.unwrap_or_default();
            text.insert(name, value);
        }
    }
    Ok(ProblemFields { text, record })
}

fn required(fields: &HashMap<String, String>, name: &str) -> Result<String, Reject> {
    fields
        .get(name)
        .filter(|v| !v.trim().is_empty())
        .cloned()
        .ok_or_else(|| reject(StatusCode::BAD_REQUEST, &format!("{name} is required")))
}

async fn create_problem(
    State(state): State<Shared>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<Problem>, Reject> {
    let form = read_problem_form(multipart).await?;
    let mut s = state.lock().unwrap();
    let user = s.caller(&headers)?;
    s.take_failure()?;

    let problem = Problem {
        id: ProblemId::new(s.assign("p")),
        title: required(&form.text, "title")?,
        description: required(&form.text, "description")?,
        location: required(&form.text, "location")?,
        image: form.record.image_file.as_ref().map(|f| format!("/uploads/{f}")),
        status: ProblemStatus::Open,
        posted_by: Some(AuthorRef::from(&user)),
        created_at: Some(chrono::Utc::now()),
    };
    s.uploads.push(form.record);
    s.problems.insert(0, problem.clone());
    Ok(Json(problem))
}

async fn update_problem(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<Problem>, Reject> {
    let form = read_problem_form(multipart).await?;
    let mut s = state.lock().unwrap();
    let user = s.caller(&headers)?;
    s.take_failure()?;

    let problem = s
        .problems
        .iter_mut()
        .find(|p| p.id.as_str() == id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Problem not found"))?;
    let owner = problem
        .posted_by
        .as_ref()
        .and_then(|a| a.resolved())
        .is_some_and(|a| a.id == user.id);
    if !owner {
        return Err(reject(StatusCode::FORBIDDEN, "Not authorized"));
    }

    problem.title = required(&form.text, "title")?;
    problem.description = required(&form.text, "description")?;
    problem.location = required(&form.text, "location")?;
    if let Some(file) = &form.record.image_file {
        problem.image = Some(format!("/uploads/{file}"));
    }
    let updated = problem.clone();
    s.uploads.push(form.record);
    Ok(Json(updated))
}

async fn delete_problem(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, Reject> {
    pause(&state).await;
    let mut s = state.lock().unwrap();
    let user = s.caller(&headers)?;
    s.take_failure()?;

    let index = s
        .problems
        .iter()
        .position(|p| p.id.as_str() == id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Problem not found"))?;
    let owner = s.problems[index]
        .posted_by
        .as_ref()
        .and_then(|a| a.resolved())
        .is_some_and(|a| a.id == user.id);
    if !owner {
        return Err(reject(StatusCode::FORBIDDEN, "Not authorized"));
    }
    let removed = s.problems.remove(index);
    s.solutions.remove(&removed.id);
    Ok(Json(json!({ "message": "Problem deleted" })))
}

async fn list_solutions(
    State(state): State<Shared>,
    Path(id): Path<String>,
) -> Json<Vec<Solution>> {
    state.lock().unwrap().solution_fetches += 1;
    pause(&state).await;
    let s = state.lock().unwrap();
    Json(
        s.solutions
            .get(&ProblemId::new(id))
            .cloned()
            .unwrap_or_default(),
    )
}

#[derive(Deserialize)]
struct SolutionBody {
    description: String,
}

async fn create_solution(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<SolutionBody>,
) -> Result<Json<Solution>, Reject> {
    let mut s = state.lock().unwrap();
    let user = s.caller(&headers)?;
    s.take_failure()?;

    let problem_id = ProblemId::new(id);
    if !s.problems.iter().any(|p| p.id == problem_id) {
        return Err(reject(StatusCode::NOT_FOUND, "Problem not found"));
    }
    let solution = Solution {
        id: SolutionId::new(s.assign("s")),
        description: body.description,
        posted_by: Some(AuthorRef::from(&user)),
        upvotes: Default::default(),
        created_at: Some(chrono::Utc::now()),
    };
    s.solutions
        .entry(problem_id)
        .or_default()
        .insert(0, solution.clone());
    Ok(Json(solution))
}

async fn toggle_upvote(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, Reject> {
    let user = state.lock().unwrap().caller(&headers)?;
    pause(&state).await;

    let mut s = state.lock().unwrap();
    s.take_failure()?;
    let solution = s
        .solutions
        .values_mut()
        .flatten()
        .find(|x| x.id.as_str() == id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Solution not found"))?;

    let has_upvoted = if solution.upvotes.remove(&user.id) {
        false
    } else {
        solution.upvotes.insert(user.id.clone());
        true
    };
    Ok(Json(json!({
        "upvotes": solution.upvotes.len(),
        "hasUpvoted": has_upvoted,
    })))
}

async fn list_comments(
    State(state): State<Shared>,
    Path(id): Path<String>,
) -> Json<Vec<Comment>> {
    let mut s = state.lock().unwrap();
    s.comment_fetches += 1;
    Json(
        s.comments
            .get(&SolutionId::new(id))
            .cloned()
            .unwrap_or_default(),
    )
}

#[derive(Deserialize)]
struct CommentBody {
    text: String,
}

async fn create_comment(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<CommentBody>,
) -> Result<Json<Comment>, Reject> {
    pause(&state).await;
    let mut s = state.lock().unwrap();
    let user = s.caller(&headers)?;
    s.take_failure()?;

    let comment = Comment {
        id: CommentId::new(s.assign("c")),
        text: body.text,
        posted_by: Some(AuthorRef::from(&user)),
        created_at: Some(chrono::Utc::now()),
    };
    s.comments
        .entry(SolutionId::new(id))
        .or_default()
        .insert(0, comment.clone());
    Ok(Json(comment))
}

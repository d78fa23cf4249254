use crate::command::{self, Command, ProblemFields};
use crate::render;
use crowdsolve_app::application::{
    auth, DeleteOutcome, Layout, ListView, LoginDraft, MutationForm, ProblemCard, ProblemDraft,
    SignupDraft, SolutionPresentation, StoreEvent, SubmitOutcome, VoteOutcome,
};
use crowdsolve_app::domain::{ImageUpload, User};
use crowdsolve_app::AppContext;
use crowdsolve_errors::AppError;
use std::num::NonZeroUsize;
use std::path::Path;
use tokio::sync::broadcast::{self, error::TryRecvError};

pub enum Flow {
    Continue,
    Quit,
}

/// Terminal front end over one list view and whatever it has open.
pub struct Shell {
    ctx: AppContext,
    list: ListView,
    login_form: MutationForm<LoginDraft>,
    signup_form: MutationForm<SignupDraft>,
    events: broadcast::Receiver<StoreEvent>,
}

impl Shell {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            list: ListView::new(ctx.clone()),
            events: ctx.store.subscribe(),
            ctx,
            login_form: MutationForm::new(),
            signup_form: MutationForm::new(),
        }
    }

    pub async fn start(&self) {
        match self.ctx.current_user() {
            Some(user) => println!("Signed in as {}.", user.username),
            None => println!("Browsing as guest. `login` or `register` to take part."),
        }
        if let Err(err) = self.list.mount().await {
            println!("{}", render::error(err.user_message()));
        }
        self.print_problems_loaded().await;
    }

    pub async fn run(&mut self, input: Command) -> Flow {
        let flow = self.execute(input).await;
        for notice in self.store_notices() {
            println!("{notice}");
        }
        flow
    }

    async fn execute(&mut self, input: Command) -> Flow {
        match input {
            Command::Register { fields } => match command::exactly::<4>(&fields, "register") {
                Ok([username, email, password, confirm_password]) => {
                    self.signup_form.open_with(SignupDraft {
                        username,
                        email,
                        password,
                        confirm_password,
                    });
                    let outcome = auth::register(&self.ctx, &self.signup_form).await;
                    self.report_auth(outcome);
                }
                Err(message) => println!("{}", render::error(&message)),
            },
            Command::Login { fields } => match command::exactly::<2>(&fields, "login") {
                Ok([email, password]) => {
                    self.login_form.open_with(LoginDraft { email, password });
                    let outcome = auth::login(&self.ctx, &self.login_form).await;
                    self.report_auth(outcome);
                }
                Err(message) => println!("{}", render::error(&message)),
            },
            Command::Logout => match auth::logout(&self.ctx) {
                Ok(()) => println!("Signed out."),
                Err(err) => println!("{}", render::error(err.user_message())),
            },
            Command::WhoAmI => match self.ctx.current_user() {
                Some(user) => println!("{} <{}>", user.username, user.email),
                None => println!("Not signed in."),
            },
            Command::Problems => {
                if let Err(err) = self.list.refresh().await {
                    println!("{}", render::error(err.user_message()));
                }
                self.print_problems_loaded().await;
            }
            Command::Grid => self.switch_layout(Layout::Grid).await,
            Command::List => self.switch_layout(Layout::List).await,
            Command::Open { n } => self.open(n).await,
            Command::Close => {
                self.list.close_detail();
                self.print_problems();
            }
            Command::Post { fields } => match command::problem_fields(&fields) {
                Ok(fields) => self.post(fields).await,
                Err(message) => println!("{}", render::error(&message)),
            },
            Command::Edit { n, fields } => match command::problem_fields(&fields) {
                Ok(fields) => self.edit(n, fields).await,
                Err(message) => println!("{}", render::error(&message)),
            },
            Command::Delete { n } => self.request_delete(n),
            Command::Confirm => self.confirm_delete().await,
            Command::Cancel => {
                if self.list.cancel_delete() {
                    println!("Kept.");
                }
            }
            Command::Solve { n, text } => self.solve(n, command::text(&text)).await,
            Command::Upvote { n } => self.upvote(n).await,
            Command::Comments { n } => self.show_comments(n).await,
            Command::Comment { n, text } => self.comment(n, command::text(&text)).await,
            Command::Help => println!("{}", command::help()),
            Command::Quit => {
                self.list.unmount();
                return Flow::Quit;
            }
        }
        Flow::Continue
    }

    /// Things other views changed that the user should hear about.
    fn store_notices(&mut self) -> Vec<String> {
        let mut notices = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(StoreEvent::ProblemRemoved(id)) => {
                    let open = self.list.detail().filter(|overlay| overlay.id() == &id);
                    if let Some(overlay) = open {
                        notices.push(format!(
                            "\"{}\" was deleted; `close` the detail view.",
                            overlay.problem().title
                        ));
                    }
                }
                Ok(_) => {}
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::debug!("Skipped {} store events", skipped);
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        notices
    }

    fn report_auth(&self, outcome: SubmitOutcome<User>) {
        match outcome {
            SubmitOutcome::Delivered(user) => println!("Welcome, {}.", user.username),
            SubmitOutcome::Busy => {}
            SubmitOutcome::Invalid(err) | SubmitOutcome::Failed(err) => {
                println!("{}", render::error(err.user_message()))
            }
        }
    }

    async fn switch_layout(&self, layout: Layout) {
        self.list.set_layout(layout);
        self.print_problems_loaded().await;
    }

    fn card_at(&self, n: NonZeroUsize) -> Option<ProblemCard> {
        let card = self.list.cards().into_iter().nth(n.get() - 1);
        if card.is_none() {
            println!("{}", render::error(&format!("There is no problem {n}")));
        }
        card
    }

    fn print_problems(&self) {
        let cards = self.list.cards();
        if cards.is_empty() {
            println!("No problems posted yet.");
            return;
        }
        let layout = self.list.layout();
        for (i, card) in cards.iter().enumerate() {
            println!(
                "{}",
                render::card(i + 1, &card.problem(), card.solution_count(), card.is_owner(), layout)
            );
            for (j, view) in card.solution_views().iter().enumerate() {
                println!("{}", render::solution(j + 1, &view.solution(), view.vote().display()));
            }
        }
    }

    /// Mounts every card first so the counts are filled in.
    async fn print_problems_loaded(&self) {
        for card in self.list.cards() {
            if let Err(err) = card.mount().await {
                println!("{}", render::error(err.user_message()));
            }
        }
        self.print_problems();
    }

    async fn open(&self, n: NonZeroUsize) {
        let Some(card) = self.card_at(n) else {
            return;
        };
        let Some(overlay) = self.list.open_detail(card.id()) else {
            return;
        };
        if let Err(err) = overlay.mount().await {
            println!("{}", render::error(err.user_message()));
        }
        self.print_detail();
    }

    fn print_detail(&self) {
        let Some(overlay) = self.list.detail() else {
            println!("No problem is open.");
            return;
        };
        println!(
            "{}",
            render::detail(&overlay.problem(), overlay.is_owner(), overlay.is_orphaned())
        );
        let views = overlay.solutions().presentations();
        println!("\nSolutions ({}):", views.len());
        for (i, view) in views.iter().enumerate() {
            println!("{}", render::solution(i + 1, &view.solution(), view.vote().display()));
        }
    }

    async fn problem_draft(fields: ProblemFields) -> Result<ProblemDraft, AppError> {
        let image = match fields.image {
            Some(path) => Some(read_image(&path).await?),
            None => None,
        };
        Ok(ProblemDraft {
            title: fields.title,
            description: fields.description,
            location: fields.location,
            image,
        })
    }

    async fn post(&self, fields: ProblemFields) {
        let draft = match Self::problem_draft(fields).await {
            Ok(draft) => draft,
            Err(err) => {
                println!("{}", render::error(err.user_message()));
                return;
            }
        };
        match self.list.create_problem(draft).await {
            SubmitOutcome::Delivered(problem) => {
                println!("Posted \"{}\".", problem.title);
                self.print_problems();
            }
            outcome => report_failure(&outcome),
        }
    }

    async fn edit(&self, n: NonZeroUsize, fields: ProblemFields) {
        let Some(card) = self.card_at(n) else {
            return;
        };
        if !card.actions().begin_edit() {
            println!("{}", render::error("Only the author can edit this problem"));
            return;
        }
        let draft = match Self::problem_draft(fields).await {
            Ok(draft) => draft,
            Err(err) => {
                println!("{}", render::error(err.user_message()));
                return;
            }
        };
        card.actions().edit_form().update(|d| *d = draft);
        match card.actions().submit_edit().await {
            SubmitOutcome::Delivered(problem) => println!("Updated \"{}\".", problem.title),
            outcome => report_failure(&outcome),
        }
    }

    fn request_delete(&self, n: NonZeroUsize) {
        let Some(card) = self.card_at(n) else {
            return;
        };
        if !self.list.request_delete(card.id()) {
            println!("{}", render::error("Only the author can delete this problem"));
            return;
        }
        println!(
            "Delete \"{}\"? Type `confirm` or `cancel`.",
            card.problem().title
        );
    }

    async fn confirm_delete(&self) {
        match self.list.confirm_delete().await {
            DeleteOutcome::Deleted => {
                println!("Deleted.");
                self.print_problems();
            }
            DeleteOutcome::NotConfirmed => println!("Nothing to confirm."),
            DeleteOutcome::Failed(err) => println!("{}", render::error(err.user_message())),
            DeleteOutcome::Busy | DeleteOutcome::Discarded => {}
        }
    }

    async fn solve(&self, n: NonZeroUsize, description: String) {
        let Some(card) = self.card_at(n) else {
            return;
        };
        match card.solutions().create_solution(description).await {
            SubmitOutcome::Delivered(_) => {
                println!("Thanks! {} now has {}.", card.problem().title, card.solution_count())
            }
            outcome => report_failure(&outcome),
        }
    }

    fn open_solution(&self, n: NonZeroUsize) -> Option<SolutionPresentation> {
        let Some(overlay) = self.list.detail() else {
            println!("{}", render::error("Open a problem first"));
            return None;
        };
        let view = overlay.solutions().presentations().into_iter().nth(n.get() - 1);
        if view.is_none() {
            println!("{}", render::error(&format!("There is no solution {n}")));
        }
        view
    }

    async fn upvote(&self, n: NonZeroUsize) {
        let Some(view) = self.open_solution(n) else {
            return;
        };
        match view.vote().toggle_upvote().await {
            VoteOutcome::Applied(_) => {
                println!("{}", render::solution(n.get(), &view.solution(), view.vote().display()))
            }
            VoteOutcome::Inert => println!("{}", render::error("Log in to upvote")),
            VoteOutcome::Failed(err) => println!("{}", render::error(err.user_message())),
            VoteOutcome::Busy | VoteOutcome::Discarded => {}
        }
    }

    async fn show_comments(&self, n: NonZeroUsize) {
        let Some(view) = self.open_solution(n) else {
            return;
        };
        if let Err(err) = view.present().await {
            println!("{}", render::error(err.user_message()));
        }
        print_comments(&view);
    }

    async fn comment(&self, n: NonZeroUsize, text: String) {
        let Some(view) = self.open_solution(n) else {
            return;
        };
        if let Err(err) = view.present().await {
            println!("{}", render::error(err.user_message()));
        }
        match view.comments().create_comment(text).await {
            SubmitOutcome::Delivered(_) => print_comments(&view),
            outcome => report_failure(&outcome),
        }
    }
}

fn print_comments(view: &SolutionPresentation) {
    let comments = view.comments().comments();
    println!("Comments ({}):", comments.len());
    for comment in &comments {
        println!("{}", render::comment(comment));
    }
}

fn report_failure<T>(outcome: &SubmitOutcome<T>) {
    match outcome {
        SubmitOutcome::Busy => println!("{}", render::error("Still submitting, please wait")),
        other => {
            if let Some(err) = other.error() {
                println!("{}", render::error(err.user_message()));
            }
        }
    }
}

async fn read_image(path: &Path) -> Result<ImageUpload, AppError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| AppError::Validation(format!("Cannot read image {}: {e}", path.display())))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    Ok(ImageUpload::new(file_name, bytes))
}

mod common;

use axum::http::StatusCode;
use common::{FakeService, UploadRecord};
use crowdsolve_app::application::{
    auth, FormState, ListView, LoginDraft, MutationForm, ProblemDraft, SignupDraft, SubmitOutcome,
};
use crowdsolve_app::domain::ImageUpload;
use crowdsolve_errors::AppError;
use serde_json::json;

fn draft(title: &str) -> ProblemDraft {
    ProblemDraft {
        title: title.to_string(),
        description: "Deep hole".to_string(),
        location: "5th Ave".to_string(),
        image: None,
    }
}

#[tokio::test]
async fn test_image_part_only_sent_when_attached() {
    let fake = FakeService::spawn().await;
    let ana = fake.signed_in("ana").await;
    let list = ListView::new(ana.ctx.clone());

    let plain = list.create_problem(draft("No photo")).await.delivered().unwrap();
    assert_eq!(plain.image, None);

    let mut with_photo = draft("With photo");
    with_photo.image = Some(ImageUpload::new("pothole.jpg", vec![0xff, 0xd8, 0xff]));
    let pictured = list.create_problem(with_photo).await.delivered().unwrap();
    assert_eq!(pictured.image.as_deref(), Some("/uploads/pothole.jpg"));

    assert_eq!(
        fake.uploads(),
        vec![
            UploadRecord {
                fields: vec!["title".into(), "description".into(), "location".into()],
                image_file: None,
            },
            UploadRecord {
                fields: vec![
                    "title".into(),
                    "description".into(),
                    "location".into(),
                    "image".into()
                ],
                image_file: Some("pothole.jpg".to_string()),
            },
        ]
    );

    // Editing without choosing a new image keeps the stored one.
    let card = list.card(&pictured.id).unwrap();
    assert!(card.actions().begin_edit());
    assert_eq!(card.actions().edit_form().draft().image, None);
    let edited = card.actions().submit_edit().await.delivered().unwrap();
    assert_eq!(edited.image.as_deref(), Some("/uploads/pothole.jpg"));
    assert_eq!(fake.uploads()[2].image_file, None);
}

#[tokio::test]
async fn test_missing_field_blocks_request() {
    let fake = FakeService::spawn().await;
    let ana = fake.signed_in("ana").await;
    let list = ListView::new(ana.ctx.clone());

    let mut incomplete = draft("Pothole");
    incomplete.location = "   ".to_string();
    match list.create_problem(incomplete).await {
        SubmitOutcome::Invalid(AppError::Validation(message)) => {
            assert_eq!(message, "location is required")
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(list.create_form().is_open());
    assert_eq!(list.create_form().error().as_deref(), Some("location is required"));
    assert!(fake.uploads().is_empty());
}

#[tokio::test]
async fn test_failed_comment_keeps_text_for_resubmission() {
    let fake = FakeService::spawn().await;
    let ana = fake.signed_in("ana").await;
    let list = ListView::new(ana.ctx.clone());
    let problem = list.create_problem(draft("Pothole")).await.delivered().unwrap();
    let card = list.card(&problem.id).unwrap();
    let solution = card
        .solutions()
        .create_solution("Fill with asphalt")
        .await
        .delivered()
        .unwrap();
    let thread = card.solutions().presentation(&solution.id).unwrap().comments().clone();

    fake.fail_next(StatusCode::UNAUTHORIZED, json!({ "message": "Token expired" }));
    match thread.create_comment("Great idea").await {
        SubmitOutcome::Failed(AppError::Auth(message)) => assert_eq!(message, "Token expired"),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(thread.form().draft().text, "Great idea");
    assert_eq!(thread.form().error().as_deref(), Some("Token expired"));
    assert_eq!(thread.form().state(), FormState::Idle);
    assert_eq!(thread.count(), 0);

    let comment = thread.submit().await.delivered().unwrap();
    assert_eq!(comment.text, "Great idea");
    assert_eq!(thread.count(), 1);
    assert!(thread.form().draft().text.is_empty());
    assert!(thread.form().error().is_none());
}

#[tokio::test]
async fn test_error_without_message_uses_fallback() {
    let fake = FakeService::spawn().await;
    let ana = fake.signed_in("ana").await;
    let list = ListView::new(ana.ctx.clone());
    let problem = list.create_problem(draft("Pothole")).await.delivered().unwrap();
    let card = list.card(&problem.id).unwrap();

    fake.fail_next(StatusCode::BAD_GATEWAY, json!({}));
    match card.solutions().create_solution("Fill it").await {
        SubmitOutcome::Failed(err) => {
            assert_eq!(err, AppError::Rejected("Failed to create solution".to_string()))
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(card.solution_count(), 0);
}

#[tokio::test]
async fn test_logged_out_submit_fails_without_request() {
    let fake = FakeService::spawn().await;
    let guest = fake.client();
    let list = ListView::new(guest.ctx.clone());

    match list.create_problem(draft("Pothole")).await {
        SubmitOutcome::Failed(err) => assert!(err.is_auth()),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(fake.uploads().is_empty());
    assert_eq!(list.create_form().draft().title, "Pothole");
}

#[tokio::test]
async fn test_login_logout_cycle() {
    let fake = FakeService::spawn().await;
    let registered = fake.signed_in("ana").await;
    auth::logout(&registered.ctx).unwrap();
    assert!(registered.ctx.current_session().is_none());
    auth::logout(&registered.ctx).unwrap();

    let client = fake.client();
    let form = MutationForm::<LoginDraft>::new();
    form.update(|d| {
        d.email = "ana@example.com".to_string();
        d.password = "wrong".to_string();
    });
    match auth::login(&client.ctx, &form).await {
        SubmitOutcome::Failed(AppError::Rejected(message)) => {
            assert_eq!(message, "Invalid credentials")
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(client.ctx.current_user().is_none());

    form.update(|d| d.password = "hunter22".to_string());
    let user = auth::login(&client.ctx, &form).await.delivered().unwrap();
    assert_eq!(user.username, "ana");
    assert_eq!(client.ctx.current_user(), Some(user));
}

#[tokio::test]
async fn test_signup_password_mismatch_is_local() {
    let fake = FakeService::spawn().await;
    let client = fake.client();
    let form = MutationForm::<SignupDraft>::new();
    form.update(|d| {
        d.username = "ana".to_string();
        d.email = "ana@example.com".to_string();
        d.password = "hunter22".to_string();
        d.confirm_password = "hunter23".to_string();
    });

    match auth::register(&client.ctx, &form).await {
        SubmitOutcome::Invalid(err) => assert_eq!(err.user_message(), "Passwords do not match"),
        other => panic!("unexpected outcome: {other:?}"),
    }

    // The address is still free, so nothing reached the service.
    form.update(|d| d.confirm_password = "hunter22".to_string());
    assert!(auth::register(&client.ctx, &form).await.is_delivered());
}

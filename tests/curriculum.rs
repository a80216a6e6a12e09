mod common;

use axum::http::StatusCode;
use coursecraft::model::entity::{Course, Lesson};
use serde_json::json;

use crate::common::{
    Action, Flow, course_create_action, setup_server, setup_test_db, signin_action, signup_action,
};

/// The whole authoring workflow over the wire: create the course, append
/// lessons, drag "Setup" above "Welcome", persist the order in one bulk
/// call.
#[tokio::test]
async fn route_curriculum_builder_flow_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("teach", "secret", "instructor"))
        .step(course_create_action("Intro to X", "desc", "marketing").with_save_as("course"))
        .step(
            Action::new("lessons_empty", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    let course = ctx.get_json::<Course>("course");
                    format!("/api/v1/courses/{}/lessons", course.id())
                })
                .assert_body(|body| {
                    assert_eq!(body, "[]");
                }),
        )
        .step(
            Action::new("lesson_add_welcome", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    let course = ctx.get_json::<Course>("course");
                    format!("/api/v1/courses/{}/lessons", course.id())
                })
                .with_body(json!({"title": "Welcome"}))
                .with_expect(StatusCode::CREATED)
                .with_save_as("welcome")
                .assert_body(|body| {
                    assert!(body.contains(r#""position":1"#));
                }),
        )
        .step(
            Action::new("lesson_add_setup", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    let course = ctx.get_json::<Course>("course");
                    format!("/api/v1/courses/{}/lessons", course.id())
                })
                .with_body(json!({"title": "Setup", "video_url": "https://cdn.example/setup.mp4"}))
                .with_expect(StatusCode::CREATED)
                .with_save_as("setup")
                .assert_body(|body| {
                    assert!(body.contains(r#""position":2"#));
                    assert!(body.contains("video"));
                }),
        )
        // the drag happened client-side; the save ships the final order
        .step(
            Action::new("reorder_save", "POST", "/api/v1/lessons/reorder")
                .with_dyn_body(|ctx| {
                    let course = ctx.get_json::<Course>("course");
                    let welcome = ctx.get_json::<Lesson>("welcome");
                    let setup = ctx.get_json::<Lesson>("setup");
                    json!({
                        "course_id": course.id(),
                        "positions": [
                            {"id": setup.id(), "position": 1},
                            {"id": welcome.id(), "position": 2}
                        ]
                    })
                })
                .assert_body(|body| {
                    assert!(body.contains(r#""updated":2"#));
                }),
        )
        .step(
            Action::new("lessons_reordered", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    let course = ctx.get_json::<Course>("course");
                    format!("/api/v1/courses/{}/lessons", course.id())
                })
                .assert_body(|body| {
                    let setup = body.find("Setup").unwrap();
                    let welcome = body.find("Welcome").unwrap();
                    assert!(setup < welcome, "Setup must come first after the reorder");
                }),
        )
        // local guards mirrored server-side
        .step(
            Action::new("lesson_add_blank", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    let course = ctx.get_json::<Course>("course");
                    format!("/api/v1/courses/{}/lessons", course.id())
                })
                .with_body(json!({"title": "   "}))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("reorder_empty", "POST", "/api/v1/lessons/reorder")
                .with_dyn_body(|ctx| {
                    let course = ctx.get_json::<Course>("course");
                    json!({"course_id": course.id(), "positions": []})
                })
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| {
                    assert!(body.contains("Nothing to reorder"));
                }),
        )
        // module-scoped creation against the default module works too
        .step(
            Action::new("curriculum_get", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    let course = ctx.get_json::<Course>("course");
                    format!("/api/v1/courses/{}/curriculum", course.id())
                })
                .with_save_as("curriculum"),
        )
        .step(
            Action::new("lesson_add_module_scoped", "POST", "/api/v1/lessons/")
                .with_dyn_body(|ctx| {
                    let curriculum = ctx.get("curriculum");
                    json!({
                        "module_id": curriculum[0]["id"],
                        "title": "Wrap up",
                        "content_type": "text"
                    })
                })
                .with_expect(StatusCode::CREATED)
                .assert_body(|body| {
                    assert!(body.contains(r#""position":3"#));
                }),
        )
        .run(&mut server, pool)
        .await;
}

/// A reorder call only ever touches the named course's lessons, and the
/// course itself stays hidden from non-owners.
#[tokio::test]
async fn route_reorder_scoping_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("owner", "secret", "instructor"))
        .step(course_create_action("Owned", "desc", "dev").with_save_as("course_a"))
        .step(
            Action::new("lesson_add", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    let course = ctx.get_json::<Course>("course_a");
                    format!("/api/v1/courses/{}/lessons", course.id())
                })
                .with_body(json!({"title": "Only lesson"}))
                .with_expect(StatusCode::CREATED)
                .with_save_as("lesson_a"),
        )
        .step(signup_action("intruder", "secret", "instructor").with_clear_cookies(true))
        // someone else's course id answers 404 on reorder too
        .step(
            Action::new("reorder_foreign_course", "POST", "/api/v1/lessons/reorder")
                .with_dyn_body(|ctx| {
                    let course = ctx.get_json::<Course>("course_a");
                    let lesson = ctx.get_json::<Lesson>("lesson_a");
                    json!({
                        "course_id": course.id(),
                        "positions": [{"id": lesson.id(), "position": 5}]
                    })
                })
                .with_expect(StatusCode::NOT_FOUND),
        )
        // smuggling a foreign lesson id into your own course changes nothing
        .step(course_create_action("Mine", "desc", "dev").with_save_as("course_b"))
        .step(
            Action::new("reorder_smuggled_lesson", "POST", "/api/v1/lessons/reorder")
                .with_dyn_body(|ctx| {
                    let course = ctx.get_json::<Course>("course_b");
                    let lesson = ctx.get_json::<Lesson>("lesson_a");
                    json!({
                        "course_id": course.id(),
                        "positions": [{"id": lesson.id(), "position": 5}]
                    })
                })
                .assert_body(|body| {
                    assert!(body.contains(r#""updated":0"#));
                }),
        )
        // the foreign lesson kept its position
        .step(signin_action("owner", "secret").with_clear_cookies(true))
        .step(
            Action::new("lessons_untouched", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    let course = ctx.get_json::<Course>("course_a");
                    format!("/api/v1/courses/{}/lessons", course.id())
                })
                .assert_body(|body| {
                    assert!(body.contains(r#""position":1"#));
                }),
        )
        .run(&mut server, pool)
        .await;
}

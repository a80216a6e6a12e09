mod common;

use axum::http::StatusCode;
use coursecraft::model::entity::Course;
use coursecraft::web::middlewares::AUTH_TOKEN;
use serde_json::json;
use tower_cookies::cookie::SameSite;

use crate::common::{
    Action, Flow, course_body, course_create_action, seed_admin, setup_server, setup_test_db,
    signin_action, signup_action,
};

#[tokio::test]
async fn route_course_create_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(
            signup_action("teach", "secret", "instructor").assert_cookie(AUTH_TOKEN, |cookie| {
                assert_eq!(cookie.same_site(), Some(SameSite::Lax));
                assert_eq!(cookie.path(), Some("/"));
                assert_eq!(cookie.http_only(), Some(true));
            }),
        )
        // server-side validation: empty description never creates anything
        .step(
            Action::new("course_create_invalid", "POST", "/api/v1/courses/")
                .with_body(course_body("Intro to X", "   ", "marketing"))
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| {
                    assert!(body.contains("description"));
                }),
        )
        .step(
            course_create_action("Intro to X", "desc", "marketing")
                .with_save_as("course")
                .assert_body(|body| {
                    assert!(body.contains("Intro to X"));
                    assert!(body.contains("draft"));
                }),
        )
        // fresh course: all derived metrics default to zero
        .step(
            Action::new("course_detail", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    let course = ctx.get_json::<Course>("course");
                    format!("/api/v1/courses/{}", course.id())
                })
                .assert_body(|body| {
                    assert!(body.contains(r#""enrollment_count":0"#));
                    assert!(body.contains(r#""average_rating":0"#));
                    assert!(body.contains(r#""completion_rate":0"#));
                }),
        )
        // students have no authoring surface
        .step(signup_action("learner", "secret", "student").with_clear_cookies(true))
        .step(
            Action::new("course_create_student", "POST", "/api/v1/courses/")
                .with_body(course_body("Nope", "nope", "nope"))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_course_detail_hiding_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("owner", "secret", "instructor"))
        .step(course_create_action("Private course", "desc", "dev").with_save_as("course"))
        // another instructor gets 404, never 403: existence stays hidden
        .step(signup_action("other", "secret", "instructor").with_clear_cookies(true))
        .step(
            Action::new("course_detail_foreign", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    let course = ctx.get_json::<Course>("course");
                    format!("/api/v1/courses/{}", course.id())
                })
                .with_expect(StatusCode::NOT_FOUND)
                .assert_body(|body| {
                    assert!(!body.contains("forbidden"));
                }),
        )
        // a random id answers exactly the same
        .step(
            Action::new(
                "course_detail_missing",
                "GET",
                "/api/v1/courses/00000000-0000-0000-0000-000000000000",
            )
            .with_expect(StatusCode::NOT_FOUND),
        )
        // no session at all
        .step(
            Action::new("course_detail_anon", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    let course = ctx.get_json::<Course>("course");
                    format!("/api/v1/courses/{}", course.id())
                })
                .with_clear_cookies(true)
                .with_save_cookies(false)
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_course_update_reapproval_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("teach", "secret", "instructor"))
        .step(course_create_action("Intro to X", "desc", "marketing").with_save_as("course"))
        // identical patch: no reapproval, status untouched
        .step(
            Action::new("course_update_same", "PUT", "dynamic")
                .with_dyn_path(|ctx| {
                    let course = ctx.get_json::<Course>("course");
                    format!("/api/v1/courses/{}", course.id())
                })
                .with_body(course_body("Intro to X", "desc", "marketing"))
                .assert_body(|body| {
                    assert!(body.contains(r#""requires_reapproval":false"#));
                }),
        )
        .step(
            Action::new("course_detail_still_draft", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    let course = ctx.get_json::<Course>("course");
                    format!("/api/v1/courses/{}", course.id())
                })
                .assert_body(|body| {
                    assert!(body.contains("draft"));
                }),
        )
        // price is a major field even on its own
        .step(
            Action::new("course_update_price", "PUT", "dynamic")
                .with_dyn_path(|ctx| {
                    let course = ctx.get_json::<Course>("course");
                    format!("/api/v1/courses/{}", course.id())
                })
                .with_body(json!({
                    "title": "Intro to X",
                    "description": "desc",
                    "category": "marketing",
                    "level": "beginner",
                    "price": 59.0,
                }))
                .assert_body(|body| {
                    assert!(body.contains(r#""requires_reapproval":true"#));
                }),
        )
        .step(
            Action::new("course_detail_pending", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    let course = ctx.get_json::<Course>("course");
                    format!("/api/v1/courses/{}", course.id())
                })
                .assert_body(|body| {
                    assert!(body.contains("pending_review"));
                }),
        )
        // updates by a non-owner are a plain 403: the id was already known
        .step(signup_action("other", "secret", "instructor").with_clear_cookies(true))
        .step(
            Action::new("course_update_foreign", "PUT", "dynamic")
                .with_dyn_path(|ctx| {
                    let course = ctx.get_json::<Course>("course");
                    format!("/api/v1/courses/{}", course.id())
                })
                .with_body(course_body("Hijack", "desc", "marketing"))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_curriculum_replace_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("teach", "secret", "instructor"))
        .step(course_create_action("Full course", "desc", "dev").with_save_as("course"))
        .step(
            Action::new("curriculum_replace", "PUT", "dynamic")
                .with_dyn_path(|ctx| {
                    let course = ctx.get_json::<Course>("course");
                    format!("/api/v1/courses/{}/curriculum", course.id())
                })
                .with_body(json!({
                    "modules": [
                        {
                            "title": "Basics",
                            "lessons": [
                                {"title": "Welcome", "content_type": "video"},
                                {"title": "Funnels", "content_type": "text"}
                            ]
                        },
                        {
                            "title": "Advanced",
                            "lessons": [
                                {"title": "Scaling", "content_type": "quiz"}
                            ]
                        }
                    ]
                })),
        )
        .step(
            Action::new("curriculum_get", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    let course = ctx.get_json::<Course>("course");
                    format!("/api/v1/courses/{}/curriculum", course.id())
                })
                .assert_body(|body| {
                    let basics = body.find("Basics").unwrap();
                    let advanced = body.find("Advanced").unwrap();
                    assert!(basics < advanced, "submitted module order must win");
                    assert!(body.contains("Welcome"));
                    assert!(body.contains("Scaling"));
                })
                .with_save_as("curriculum"),
        )
        // replacing again swaps the whole set, nothing lingers
        .step(
            Action::new("curriculum_replace_again", "PUT", "dynamic")
                .with_dyn_path(|ctx| {
                    let course = ctx.get_json::<Course>("course");
                    format!("/api/v1/courses/{}/curriculum", course.id())
                })
                .with_body(json!({
                    "modules": [
                        {"title": "Rebooted", "lessons": [{"title": "Fresh start", "content_type": "text"}]}
                    ]
                })),
        )
        .step(
            Action::new("curriculum_get_again", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    let course = ctx.get_json::<Course>("course");
                    format!("/api/v1/courses/{}/curriculum", course.id())
                })
                .assert_body(|body| {
                    assert!(body.contains("Rebooted"));
                    assert!(!body.contains("Welcome"));
                    assert!(!body.contains("Basics"));
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_review_and_enroll_test() {
    let pool = setup_test_db().await;
    seed_admin(&pool, "root", "rootpw").await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("teach", "secret", "instructor"))
        .step(course_create_action("Sellable", "desc", "dev").with_save_as("course"))
        // draft courses are not enrollable, and instructors cannot review
        .step(
            Action::new("enroll_draft", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    let course = ctx.get_json::<Course>("course");
                    format!("/api/v1/courses/{}/enroll", course.id())
                })
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("review_as_instructor", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    let course = ctx.get_json::<Course>("course");
                    format!("/api/v1/courses/{}/review", course.id())
                })
                .with_body(json!({"verdict": "approved"}))
                .with_expect(StatusCode::FORBIDDEN),
        )
        // push it into the queue via a major-field edit
        .step(
            Action::new("course_update_price", "PUT", "dynamic")
                .with_dyn_path(|ctx| {
                    let course = ctx.get_json::<Course>("course");
                    format!("/api/v1/courses/{}", course.id())
                })
                .with_body(json!({
                    "title": "Sellable",
                    "description": "desc",
                    "category": "dev",
                    "level": "beginner",
                    "price": 19.0,
                })),
        )
        // the admin sees it queued and publishes it
        .step(signin_action("root", "rootpw").with_clear_cookies(true))
        .step(
            Action::new("admin_dashboard", "GET", "/api/v1/dashboard/admin").assert_body(|body| {
                assert!(body.contains("approval_queue"));
                assert!(body.contains("Sellable"));
                assert!(body.contains(r#""database":"ok""#));
            }),
        )
        .step(
            Action::new("review_approve", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    let course = ctx.get_json::<Course>("course");
                    format!("/api/v1/courses/{}/review", course.id())
                })
                .with_body(json!({"verdict": "approved"}))
                .assert_body(|body| {
                    assert!(body.contains("published"));
                }),
        )
        // students can enroll exactly once
        .step(signup_action("learner", "secret", "student").with_clear_cookies(true))
        .step(
            Action::new("enroll", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    let course = ctx.get_json::<Course>("course");
                    format!("/api/v1/courses/{}/enroll", course.id())
                })
                .with_expect(StatusCode::CREATED),
        )
        .step(
            Action::new("enroll_again", "POST", "dynamic")
                .with_dyn_path(|ctx| {
                    let course = ctx.get_json::<Course>("course");
                    format!("/api/v1/courses/{}/enroll", course.id())
                })
                .with_expect(StatusCode::CONFLICT),
        )
        .step(
            Action::new("admin_dashboard_as_student", "GET", "/api/v1/dashboard/admin")
                .with_expect(StatusCode::FORBIDDEN),
        )
        // the owner sees the enrollment land in the metrics
        .step(signin_action("teach", "secret").with_clear_cookies(true))
        .step(
            Action::new("course_detail_enrolled", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    let course = ctx.get_json::<Course>("course");
                    format!("/api/v1/courses/{}", course.id())
                })
                .assert_body(|body| {
                    assert!(body.contains(r#""enrollment_count":1"#));
                }),
        )
        .step(
            Action::new("instructor_dashboard", "GET", "/api/v1/dashboard/instructor").assert_body(
                |body| {
                    assert!(body.contains("Sellable"));
                    assert!(body.contains(r#""total_students":1"#));
                },
            ),
        )
        .run(&mut server, pool)
        .await;
}

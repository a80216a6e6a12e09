use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::post,
};

use crate::{
    model::{
        CrudRepository, DatabaseError, ResourceTyped, check_access,
        entity::{Course, Lesson, LessonCreate, Module},
    },
    web::{
        AppState, RequestContext, WebError, WebResult,
        dto::lessons::{ReorderBody, ReorderResponse},
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(lesson_create_handler))
        .route("/reorder", post(lessons_reorder_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/lessons/",
    description = "Create a lesson inside a module. Without an explicit position the lesson is appended.",
    request_body = LessonCreate,
    responses(
        (status = 201, description = "Lesson created", body = Lesson),
        (status = 400, description = "Empty lesson title", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You don't own the parent course", body = ErrorResponse),
        (status = 404, description = "Module not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "lessons"
)]
pub(crate) async fn lesson_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<LessonCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    if payload.title.trim().is_empty() {
        return Err(WebError::resource_validation(
            Lesson::get_resource_type(),
            "Lesson title is required.",
        ));
    }

    let module = Module::find_by_id(state.pool(), user, payload.module_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Module::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Module::get_resource_type()))?;

    check_access(state.pool(), user, &module, user.user_id())
        .await
        .map_err(|e| {
            if let DatabaseError::Forbidden = e {
                WebError::resource_forbidden(Lesson::get_resource_type())
            } else {
                WebError::resource_fetch_error(Lesson::get_resource_type(), e)
            }
        })?;

    let created = Lesson::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    post,
    path = "/api/v1/lessons/reorder",
    description = "Persist a new lesson order for a course as one bulk call",
    request_body = ReorderBody,
    responses(
        (status = 200, description = "Order saved", body = ReorderResponse),
        (status = 400, description = "Empty position list", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 404, description = "No owned course with this id", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "lessons"
)]
pub(crate) async fn lessons_reorder_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<ReorderBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    if payload.positions.is_empty() {
        return Err(WebError::resource_validation(
            Lesson::get_resource_type(),
            "Nothing to reorder.",
        ));
    }

    let course = Course::find_owned(state.pool(), user, payload.course_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))?;

    let updated = Lesson::apply_positions(state.pool(), user, course.id(), &payload.positions)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    Ok((
        StatusCode::OK,
        Json(ReorderResponse {
            message: String::from("Curriculum order saved."),
            updated,
        }),
    ))
}

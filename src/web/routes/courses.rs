use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    Config,
    error::log_error,
    model::{
        CrudRepository, DatabaseError, ResourceTyped, check_access,
        entity::{
            Course, CourseCreate, CourseStatus, Enrollment, EnrollmentCreate, Lesson,
            LessonCreate, Module, ModuleWithLessonsRow,
        },
    },
    services::outline::OutlineClient,
    web::{
        AppState, RequestContext, UserRole, WebError, WebResult,
        dto::courses::{
            CourseDetailResponse, CourseReviewBody, CourseUpdateResponse, CurriculumReplaceBody,
            OutlineImportBody,
        },
        dto::lessons::LessonAddBody,
        dto::modules::ModuleWithLessons,
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(course_create_handler))
        .route("/import", post(course_import_outline_handler))
        .route(
            "/{id}",
            get(course_detail_handler).put(course_update_handler),
        )
        .route(
            "/{id}/curriculum",
            get(course_curriculum_handler).put(course_curriculum_replace_handler),
        )
        .route(
            "/{id}/lessons",
            get(course_lessons_handler).post(course_lesson_add_handler),
        )
        .route("/{id}/enroll", post(course_enroll_handler))
        .route("/{id}/review", post(course_review_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

/// Server-side schema check. The builder runs the same guards locally, but
/// the server stays the authority.
fn validate_course(data: &CourseCreate) -> WebResult<()> {
    if data.title.trim().is_empty() {
        return Err(WebError::resource_validation(
            Course::get_resource_type(),
            "Course title is required.",
        ));
    }
    if data.description.trim().is_empty() {
        return Err(WebError::resource_validation(
            Course::get_resource_type(),
            "Course description is required.",
        ));
    }
    if data.category.trim().is_empty() {
        return Err(WebError::resource_validation(
            Course::get_resource_type(),
            "Course category is required.",
        ));
    }
    if data.level.trim().is_empty() {
        return Err(WebError::resource_validation(
            Course::get_resource_type(),
            "Course level is required.",
        ));
    }
    if data.price < 0.0 {
        return Err(WebError::resource_validation(
            Course::get_resource_type(),
            "Course price cannot be negative.",
        ));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/",
    description = "Create a new course owned by the calling instructor",
    request_body = CourseCreate,
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 400, description = "Payload failed validation", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Students cannot create courses", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub(crate) async fn course_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<CourseCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if user.user_role() == UserRole::Student {
        return Err(WebError::resource_forbidden(Course::get_resource_type()));
    }

    validate_course(&payload)?;

    let created = Course::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}",
    description = "Fetch an owned course together with its derived metrics",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course to get")
    ),
    responses(
        (status = 200, description = "Course found", body = CourseDetailResponse),
        (status = 404, description = "No owned course with this id", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub(crate) async fn course_detail_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    // Ownership-scoped: someone else's course id answers 404, same as a
    // missing one.
    let course = Course::find_owned(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))?;

    // Metrics are fetched and defaulted independently; one failing query
    // must not take the whole request down.
    let enrollment_count = match Enrollment::count_by_course(state.pool(), course.id()).await {
        Ok(count) => count,
        Err(e) => {
            log_error(&e);
            0
        }
    };
    let average_rating = match Enrollment::average_rating(state.pool(), course.id()).await {
        Ok(avg) => avg,
        Err(e) => {
            log_error(&e);
            0.0
        }
    };
    let completion_rate = match Enrollment::completion_rate(state.pool(), course.id()).await {
        Ok(rate) => rate,
        Err(e) => {
            log_error(&e);
            0.0
        }
    };

    let detail = CourseDetailResponse::from_course(
        course,
        enrollment_count,
        average_rating,
        completion_rate,
    );

    Ok((StatusCode::OK, Json(detail)))
}

#[utoipa::path(
    put,
    path = "/api/v1/courses/{course_id}",
    description = "Update course metadata. Changing a major field (title, description, category, level, price) sends the course back to review.",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course to update")
    ),
    request_body = CourseCreate,
    responses(
        (status = 200, description = "Course updated", body = CourseUpdateResponse),
        (status = 400, description = "Payload failed validation", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You don't own this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub(crate) async fn course_update_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Json(payload): Json<CourseCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    validate_course(&payload)?;

    let course = Course::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))?;

    check_access(state.pool(), user, &course, user.user_id())
        .await
        .map_err(|e| {
            if let DatabaseError::Forbidden = e {
                WebError::resource_forbidden(Course::get_resource_type())
            } else {
                WebError::resource_fetch_error(Course::get_resource_type(), e)
            }
        })?;

    let requires_reapproval = course.requires_reapproval(&payload);

    course
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok((
        StatusCode::OK,
        Json(CourseUpdateResponse {
            message: String::from("Course updated."),
            requires_reapproval,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/courses/{course_id}/curriculum",
    description = "Replace the course's whole module/lesson set in one transaction",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course")
    ),
    request_body = CurriculumReplaceBody,
    responses(
        (status = 200, description = "Curriculum replaced"),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You don't own this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub(crate) async fn course_curriculum_replace_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Json(payload): Json<CurriculumReplaceBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let course = Course::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))?;

    check_access(state.pool(), user, &course, user.user_id())
        .await
        .map_err(|e| {
            if let DatabaseError::Forbidden = e {
                WebError::resource_forbidden(Course::get_resource_type())
            } else {
                WebError::resource_fetch_error(Course::get_resource_type(), e)
            }
        })?;

    Module::replace_curriculum(state.pool(), user, course.id(), payload.modules)
        .await
        .map_err(|e| WebError::resource_fetch_error(Module::get_resource_type(), e))?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}/lessons",
    description = "Flat lesson list of an owned course, ordered by position",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Lessons collected", body = Vec<Lesson>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 404, description = "No owned course with this id", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub(crate) async fn course_lessons_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let course = Course::find_owned(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))?;

    let lessons = Lesson::all_by_course(state.pool(), user, course.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(lessons)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{course_id}/enroll",
    description = "Enroll the calling user into a published course",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 201, description = "Enrolled", body = Enrollment),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 404, description = "No published course with this id", body = ErrorResponse),
        (status = 409, description = "Already enrolled", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub(crate) async fn course_enroll_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let course = Course::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .filter(|course| course.status() == CourseStatus::Published)
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))?;

    let existing =
        Enrollment::find_by_user_course(state.pool(), user, user.user_id(), course.id())
            .await
            .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?;
    if existing.is_some() {
        return Err(WebError::resource_conflict(Enrollment::get_resource_type()));
    }

    let enrollment = Enrollment::create(
        state.pool(),
        user,
        EnrollmentCreate {
            user_id: user.user_id(),
            course_id: course.id(),
        },
    )
    .await
    .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(enrollment)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{course_id}/review",
    description = "Resolve a pending review (admin only)",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course")
    ),
    request_body = CourseReviewBody,
    responses(
        (status = 200, description = "Review resolved", body = Course),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub(crate) async fn course_review_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Json(payload): Json<CourseReviewBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if user.user_role() != UserRole::Admin {
        return Err(WebError::resource_forbidden(Course::get_resource_type()));
    }

    let course = Course::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))?;

    let reviewed = course
        .review(state.pool(), user, payload.verdict, payload.reason)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(reviewed)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/import",
    description = "Generate a course outline from source material and materialize it as a draft course with its curriculum",
    request_body = OutlineImportBody,
    responses(
        (status = 201, description = "Course imported", body = Course),
        (status = 400, description = "Payload failed validation", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Students cannot create courses", body = ErrorResponse),
        (status = 502, description = "Outline endpoint failed", body = ErrorResponse),
        (status = 503, description = "Outline endpoint is not configured", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub(crate) async fn course_import_outline_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<OutlineImportBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if user.user_role() == UserRole::Student {
        return Err(WebError::resource_forbidden(Course::get_resource_type()));
    }

    if payload.source.trim().is_empty() {
        return Err(WebError::resource_validation(
            Course::get_resource_type(),
            "Source material is required.",
        ));
    }

    let config = Config::get_or_init(false).await;
    let outline_config = config.outline().ok_or_else(WebError::outline_not_configured)?;

    let client = OutlineClient::new(outline_config.endpoint(), outline_config.api_key());
    let outline = client
        .generate(&payload.source, &payload.instructions)
        .await
        .map_err(WebError::outline_error)?;

    let (course_data, modules) =
        outline.into_curriculum(payload.category, payload.level, payload.price);
    validate_course(&course_data)?;

    let created = Course::create(state.pool(), user, course_data)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Module::replace_curriculum(state.pool(), user, created.id(), modules)
        .await
        .map_err(|e| WebError::resource_fetch_error(Module::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{course_id}/lessons",
    description = "Append a lesson to the course's flat list; the next position is max(existing) + 1",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course")
    ),
    request_body = LessonAddBody,
    responses(
        (status = 201, description = "Lesson appended", body = Lesson),
        (status = 400, description = "Empty lesson title", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 404, description = "No owned course with this id", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub(crate) async fn course_lesson_add_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
    Json(payload): Json<LessonAddBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    if payload.title.trim().is_empty() {
        return Err(WebError::resource_validation(
            Lesson::get_resource_type(),
            "Lesson title is required.",
        ));
    }

    let course = Course::find_owned(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))?;

    let module = Module::ensure_default(state.pool(), user, course.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Module::get_resource_type(), e))?;

    let content_type = if payload.video_url.is_some() {
        String::from("video")
    } else {
        String::from("text")
    };

    let created = Lesson::create(
        state.pool(),
        user,
        LessonCreate {
            module_id: module.id(),
            title: payload.title,
            content_type,
            content: String::new(),
            video_url: payload.video_url,
            is_published: false,
            position: None,
        },
    )
    .await
    .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}/curriculum",
    description = "The course's module tree with nested lessons, the shape the course editor loads",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Curriculum collected", body = Vec<ModuleWithLessons>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 404, description = "No owned course with this id", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub(crate) async fn course_curriculum_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let course = Course::find_owned(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))?;

    let modules = ModuleWithLessonsRow::fetch_by_course(state.pool(), user, course.id())
        .await
        .and_then(ModuleWithLessons::from_rows)
        .map_err(|e| WebError::resource_fetch_error(Module::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(modules)))
}

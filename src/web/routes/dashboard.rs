use std::time::Instant;

use axum::{
    Json, Router, extract::State, http::StatusCode, middleware, response::IntoResponse,
    routing::get,
};

use crate::{
    error::log_error,
    model::{
        CrudRepository, ResourceTyped,
        entity::{Course, Enrollment, RecentEnrollmentRow, UserEntity},
    },
    web::{
        AppState, RequestContext, UserRole, WebError, WebResult,
        dto::dashboard::{
            AdminDashboardResponse, InstructorCourseRow, InstructorDashboardResponse,
            PlatformMetrics, SystemHealth,
        },
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/admin", get(admin_dashboard_handler))
        .route("/instructor", get(instructor_dashboard_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/admin",
    description = "Platform metrics, the approval queue, system health and recent activity in one composed read",
    responses(
        (status = 200, description = "Dashboard collected", body = AdminDashboardResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Admins only", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "dashboard"
)]
pub(crate) async fn admin_dashboard_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if user.user_role() != UserRole::Admin {
        return Err(WebError::resource_forbidden(UserEntity::get_resource_type()));
    }

    let (total_users, total_courses, published_courses, total_enrollments) = tokio::try_join!(
        UserEntity::count(state.pool(), user),
        Course::count(state.pool(), user),
        Course::count_published(state.pool(), user),
        Enrollment::count(state.pool(), user),
    )
    .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    let approval_queue = Course::pending_review(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    let recent_activity = RecentEnrollmentRow::fetch_recent(state.pool(), user, 10)
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?;

    // Health is a cheap roundtrip; a failing ping degrades the card instead
    // of failing the dashboard.
    let started = Instant::now();
    let health = match sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(state.pool().executor())
        .await
    {
        Ok(_) => SystemHealth {
            database: String::from("ok"),
            latency_ms: started.elapsed().as_millis() as i64,
        },
        Err(e) => {
            log_error(&e);
            SystemHealth {
                database: String::from("degraded"),
                latency_ms: started.elapsed().as_millis() as i64,
            }
        }
    };

    let response = AdminDashboardResponse {
        metrics: PlatformMetrics {
            total_users,
            total_courses,
            published_courses,
            total_enrollments,
        },
        approval_queue,
        health,
        recent_activity,
    };

    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/instructor",
    description = "The calling instructor's courses with per-course enrollment and rating aggregates",
    responses(
        (status = 200, description = "Dashboard collected", body = InstructorDashboardResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Instructors only", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "dashboard"
)]
pub(crate) async fn instructor_dashboard_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    if user.user_role() == UserRole::Student {
        return Err(WebError::resource_forbidden(Course::get_resource_type()));
    }

    let courses = Course::all_by_instructor(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    let mut rows = Vec::with_capacity(courses.len());
    let mut total_students = 0;
    for course in &courses {
        let (enrollment_count, average_rating) = tokio::try_join!(
            Enrollment::count_by_course(state.pool(), course.id()),
            Enrollment::average_rating(state.pool(), course.id()),
        )
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?;

        total_students += enrollment_count;
        rows.push(InstructorCourseRow::from_course(
            course,
            enrollment_count,
            average_rating,
        ));
    }

    let rated: Vec<f64> = rows
        .iter()
        .map(|row| row.average_rating)
        .filter(|avg| *avg > 0.0)
        .collect();
    let average_rating = if rated.is_empty() {
        0.0
    } else {
        rated.iter().sum::<f64>() / rated.len() as f64
    };

    let response = InstructorDashboardResponse {
        courses: rows,
        total_students,
        average_rating,
    };

    Ok((StatusCode::OK, Json(response)))
}

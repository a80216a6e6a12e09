use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::{Course, CourseStatus, RecentEnrollmentRow};

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PlatformMetrics {
    pub total_users: i64,
    pub total_courses: i64,
    pub published_courses: i64,
    pub total_enrollments: i64,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SystemHealth {
    pub database: String,
    pub latency_ms: i64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AdminDashboardResponse {
    pub metrics: PlatformMetrics,
    pub approval_queue: Vec<Course>,
    pub health: SystemHealth,
    pub recent_activity: Vec<RecentEnrollmentRow>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct InstructorCourseRow {
    pub id: Uuid,
    pub title: String,
    pub status: CourseStatus,
    pub enrollment_count: i64,
    pub average_rating: f64,
}

impl InstructorCourseRow {
    pub fn from_course(course: &Course, enrollment_count: i64, average_rating: f64) -> Self {
        Self {
            id: course.id(),
            title: course.title().to_string(),
            status: course.status(),
            enrollment_count,
            average_rating,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct InstructorDashboardResponse {
    pub courses: Vec<InstructorCourseRow>,
    pub total_students: i64,
    pub average_rating: f64,
}

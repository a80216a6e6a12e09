use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::{Course, CourseStatus, CurriculumModuleInput, ReviewVerdict};

/// Course row merged with its derived metrics. Each metric comes from an
/// independent query and independently falls back to 0 on failure.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CourseDetailResponse {
    pub id: Uuid,
    pub instructor_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub level: String,
    pub tags: Vec<String>,
    pub price: f64,
    pub thumbnail_url: Option<String>,
    pub promo_video_url: Option<String>,
    pub status: CourseStatus,
    pub rejection_reason: Option<String>,
    pub enrollment_count: i64,
    pub average_rating: f64,
    pub completion_rate: f64,
}

impl CourseDetailResponse {
    pub fn from_course(
        course: Course,
        enrollment_count: i64,
        average_rating: f64,
        completion_rate: f64,
    ) -> Self {
        Self {
            id: course.id(),
            instructor_id: course.instructor_id(),
            title: course.title().to_string(),
            description: course.description().to_string(),
            category: course.category().to_string(),
            level: course.level().to_string(),
            tags: course.tags().to_vec(),
            price: course.price(),
            thumbnail_url: course.thumbnail_url().map(String::from),
            promo_video_url: course.promo_video_url().map(String::from),
            status: course.status(),
            rejection_reason: course.rejection_reason().map(String::from),
            enrollment_count,
            average_rating,
            completion_rate,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CourseUpdateResponse {
    pub message: String,
    pub requires_reapproval: bool,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CurriculumReplaceBody {
    pub modules: Vec<CurriculumModuleInput>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CourseReviewBody {
    pub verdict: ReviewVerdict,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct OutlineImportBody {
    /// Raw source material the outline is generated from.
    pub source: String,
    #[serde(default)]
    pub instructions: String,
    pub category: String,
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub price: f64,
}

fn default_level() -> String {
    String::from("beginner")
}

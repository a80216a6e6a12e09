use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::LessonPosition;

/// The organizer's "add lesson" form: a title and an optional video. The
/// server picks the position and the default module.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LessonAddBody {
    pub title: String,
    pub video_url: Option<String>,
}

/// The bulk save of the organizer: the full `{id, position}` list for the
/// course, applied as a set.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ReorderBody {
    pub course_id: Uuid,
    pub positions: Vec<LessonPosition>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ReorderResponse {
    pub message: String,
    pub updated: u64,
}

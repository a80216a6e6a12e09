use async_trait::async_trait;
use uuid::Uuid;

use crate::model::entity::{Course, CourseCreate, Lesson, LessonCreate, LessonPosition, Module};
use crate::model::{CrudRepository, ModelManager};
use crate::web::AuthenticatedUser;

use super::reorder::LessonSlot;
use super::workflow::{BuilderBackend, FoundationDraft};
use super::{CurriculumError, CurriculumResult};

/// `BuilderBackend` straight over the model layer, for callers which sit on
/// the server side of the API (the scaffolding CLI, mainly). Lessons land
/// in the course's default module.
pub struct ModelBackend<'a> {
    mm: &'a ModelManager,
    actor: &'a AuthenticatedUser,
}

impl<'a> ModelBackend<'a> {
    pub fn new(mm: &'a ModelManager, actor: &'a AuthenticatedUser) -> Self {
        Self { mm, actor }
    }
}

#[async_trait]
impl BuilderBackend for ModelBackend<'_> {
    async fn create_course(&self, draft: &FoundationDraft) -> CurriculumResult<Uuid> {
        let data = CourseCreate {
            title: draft.title.clone(),
            description: draft.description.clone(),
            category: draft.category.clone(),
            level: if draft.level.is_empty() {
                String::from("beginner")
            } else {
                draft.level.clone()
            },
            tags: draft.tags.clone(),
            price: draft.price,
            thumbnail_url: draft.thumbnail_url.clone(),
            promo_video_url: draft.promo_video_url.clone(),
        };

        let course = Course::create(self.mm, self.actor, data)
            .await
            .map_err(|e| CurriculumError::Backend(e.to_string()))?;
        Ok(course.id())
    }

    async fn load_lessons(&self, course_id: Uuid) -> CurriculumResult<Vec<LessonSlot>> {
        let lessons = Lesson::all_by_course(self.mm, self.actor, course_id)
            .await
            .map_err(|e| CurriculumError::Backend(e.to_string()))?;

        Ok(lessons
            .into_iter()
            .map(|lesson| LessonSlot::new(lesson.id(), lesson.title(), lesson.position()))
            .collect())
    }

    async fn create_lesson(
        &self,
        course_id: Uuid,
        title: &str,
        video_url: Option<&str>,
        position: i32,
    ) -> CurriculumResult<Uuid> {
        let module = Module::ensure_default(self.mm, self.actor, course_id)
            .await
            .map_err(|e| CurriculumError::Backend(e.to_string()))?;

        let data = LessonCreate {
            module_id: module.id(),
            title: String::from(title),
            content_type: if video_url.is_some() {
                String::from("video")
            } else {
                String::from("text")
            },
            content: String::new(),
            video_url: video_url.map(String::from),
            is_published: false,
            position: Some(position),
        };

        let lesson = Lesson::create(self.mm, self.actor, data)
            .await
            .map_err(|e| CurriculumError::Backend(e.to_string()))?;
        Ok(lesson.id())
    }

    async fn save_order(&self, course_id: Uuid, order: &[LessonPosition]) -> CurriculumResult<()> {
        Lesson::apply_positions(self.mm, self.actor, course_id, order)
            .await
            .map_err(|e| CurriculumError::Backend(e.to_string()))?;
        Ok(())
    }
}

//! The course builder state machine. Three steps, forward only:
//!
//! `CollectingFoundation` -> `OrganizingCurriculum` -> `Saved`
//!
//! The foundation step owns a draft of the descriptive fields; submitting it
//! creates the course and enters the organizer with the (initially empty)
//! lesson list loaded from the backend. Local validation rejects bad input
//! before any backend call; the backend re-validates and stays the
//! authority.

use async_trait::async_trait;
use uuid::Uuid;

use crate::model::entity::LessonPosition;

use super::reorder::{self, LessonSlot};
use super::{CurriculumError, CurriculumResult};

#[derive(Debug, Clone, Default)]
pub struct FoundationDraft {
    pub title: String,
    pub description: String,
    pub category: String,
    pub level: String,
    pub tags: Vec<String>,
    pub price: f64,
    pub thumbnail_url: Option<String>,
    pub promo_video_url: Option<String>,
}

impl FoundationDraft {
    /// The fast local guard mirrored by the server-side schema check.
    fn validate(&self) -> CurriculumResult<()> {
        if self.title.trim().is_empty() {
            return Err(CurriculumError::validation("Course title is required"));
        }
        if self.description.trim().is_empty() {
            return Err(CurriculumError::validation("Course description is required"));
        }
        if self.category.trim().is_empty() {
            return Err(CurriculumError::validation("Pick a category first"));
        }
        Ok(())
    }
}

/// Everything the builder needs from the outside world. The server
/// implements this over the model layer; tests plug in a recorder.
#[async_trait]
pub trait BuilderBackend {
    async fn create_course(&self, draft: &FoundationDraft) -> CurriculumResult<Uuid>;
    async fn load_lessons(&self, course_id: Uuid) -> CurriculumResult<Vec<LessonSlot>>;
    async fn create_lesson(
        &self,
        course_id: Uuid,
        title: &str,
        video_url: Option<&str>,
        position: i32,
    ) -> CurriculumResult<Uuid>;
    async fn save_order(&self, course_id: Uuid, order: &[LessonPosition]) -> CurriculumResult<()>;
}

#[derive(Debug)]
enum BuilderStep {
    CollectingFoundation { draft: FoundationDraft },
    OrganizingCurriculum { course_id: Uuid, lessons: Vec<LessonSlot> },
    Saved { course_id: Uuid },
}

impl BuilderStep {
    fn name(&self) -> &'static str {
        match self {
            Self::CollectingFoundation { .. } => "collecting_foundation",
            Self::OrganizingCurriculum { .. } => "organizing_curriculum",
            Self::Saved { .. } => "saved",
        }
    }
}

pub struct CourseBuilder<B: BuilderBackend> {
    backend: B,
    step: BuilderStep,
}

impl<B: BuilderBackend> CourseBuilder<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            step: BuilderStep::CollectingFoundation {
                draft: FoundationDraft::default(),
            },
        }
    }

    pub fn step_name(&self) -> &'static str {
        self.step.name()
    }

    /// The created course id, available from the organizer step on.
    pub fn course_id(&self) -> Option<Uuid> {
        match &self.step {
            BuilderStep::CollectingFoundation { .. } => None,
            BuilderStep::OrganizingCurriculum { course_id, .. }
            | BuilderStep::Saved { course_id } => Some(*course_id),
        }
    }

    /// Mutable access to the foundation form. Gone once submitted — the
    /// machine cannot re-run the foundation step for the same course.
    pub fn draft_mut(&mut self) -> CurriculumResult<&mut FoundationDraft> {
        match &mut self.step {
            BuilderStep::CollectingFoundation { draft } => Ok(draft),
            other => Err(CurriculumError::WrongStep(other.name())),
        }
    }

    pub fn lessons(&self) -> &[LessonSlot] {
        match &self.step {
            BuilderStep::OrganizingCurriculum { lessons, .. } => lessons,
            _ => &[],
        }
    }

    /// Submit the foundation form. Local validation failures never reach
    /// the backend; backend failures keep the machine in the foundation
    /// step with the message passed through verbatim.
    pub async fn submit_foundation(&mut self) -> CurriculumResult<Uuid> {
        let draft = match &self.step {
            BuilderStep::CollectingFoundation { draft } => draft,
            other => return Err(CurriculumError::WrongStep(other.name())),
        };

        draft.validate()?;

        let course_id = self.backend.create_course(draft).await?;
        let lessons = self.backend.load_lessons(course_id).await?;

        self.step = BuilderStep::OrganizingCurriculum { course_id, lessons };
        Ok(course_id)
    }

    /// Add a lesson at the end of the list. The next position is
    /// `max(existing) + 1`, or 1 for an empty list.
    pub async fn add_lesson(
        &mut self,
        title: &str,
        video_url: Option<&str>,
    ) -> CurriculumResult<Uuid> {
        let (course_id, lessons) = match &mut self.step {
            BuilderStep::OrganizingCurriculum { course_id, lessons } => (*course_id, lessons),
            other => return Err(CurriculumError::WrongStep(other.name())),
        };

        if title.trim().is_empty() {
            return Err(CurriculumError::validation("Lesson title is required"));
        }

        let position = lessons.iter().map(|slot| slot.position).max().unwrap_or(0) + 1;
        let id = self
            .backend
            .create_lesson(course_id, title, video_url, position)
            .await?;

        lessons.push(LessonSlot::new(id, title, position));
        Ok(id)
    }

    /// Drag-end: relocate a lesson in memory. No backend call fires here.
    pub fn move_lesson(&mut self, source: usize, target: usize) -> CurriculumResult<()> {
        match &mut self.step {
            BuilderStep::OrganizingCurriculum { lessons, .. } => {
                reorder::move_slot(lessons, source, target)
            }
            other => Err(CurriculumError::WrongStep(other.name())),
        }
    }

    /// Persist the current order in one bulk call and finish. A failed
    /// save keeps the organizer state (and its order) so the caller can
    /// retry; nothing is rolled back locally.
    pub async fn save(&mut self) -> CurriculumResult<Uuid> {
        let (course_id, lessons) = match &self.step {
            BuilderStep::OrganizingCurriculum { course_id, lessons } => (*course_id, lessons),
            other => return Err(CurriculumError::WrongStep(other.name())),
        };

        if lessons.is_empty() {
            return Err(CurriculumError::validation("Add at least one lesson before saving"));
        }

        let order = reorder::as_positions(lessons);
        self.backend.save_order(course_id, &order).await?;

        self.step = BuilderStep::Saved { course_id };
        Ok(course_id)
    }
}

#[cfg(test)]
mod test {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingBackend {
        calls: Mutex<Vec<String>>,
        saved_order: Mutex<Option<Vec<LessonPosition>>>,
        fail_create_course: bool,
        fail_save: bool,
    }

    impl RecordingBackend {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BuilderBackend for RecordingBackend {
        async fn create_course(&self, draft: &FoundationDraft) -> CurriculumResult<Uuid> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("create_course:{}", draft.title));
            if self.fail_create_course {
                return Err(CurriculumError::Backend(String::from(
                    "category does not exist",
                )));
            }
            Ok(Uuid::new_v4())
        }

        async fn load_lessons(&self, _course_id: Uuid) -> CurriculumResult<Vec<LessonSlot>> {
            self.calls.lock().unwrap().push(String::from("load_lessons"));
            Ok(vec![])
        }

        async fn create_lesson(
            &self,
            _course_id: Uuid,
            title: &str,
            _video_url: Option<&str>,
            position: i32,
        ) -> CurriculumResult<Uuid> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("create_lesson:{title}:{position}"));
            Ok(Uuid::new_v4())
        }

        async fn save_order(
            &self,
            _course_id: Uuid,
            order: &[LessonPosition],
        ) -> CurriculumResult<()> {
            self.calls.lock().unwrap().push(String::from("save_order"));
            if self.fail_save {
                return Err(CurriculumError::Backend(String::from("connection reset")));
            }
            *self.saved_order.lock().unwrap() = Some(order.to_vec());
            Ok(())
        }
    }

    fn filled_builder(backend: RecordingBackend) -> CourseBuilder<RecordingBackend> {
        let mut builder = CourseBuilder::new(backend);
        let draft = builder.draft_mut().unwrap();
        draft.title = String::from("Intro to X");
        draft.description = String::from("desc");
        draft.category = String::from("marketing");
        builder
    }

    #[tokio::test]
    async fn empty_description_never_reaches_backend() {
        let mut builder = CourseBuilder::new(RecordingBackend::default());
        let draft = builder.draft_mut().unwrap();
        draft.title = String::from("Intro to X");
        draft.category = String::from("marketing");

        let err = builder.submit_foundation().await.unwrap_err();
        assert!(matches!(err, CurriculumError::Validation(_)));
        assert_eq!(builder.step_name(), "collecting_foundation");
        assert!(builder.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn backend_failure_keeps_foundation_step() {
        let mut builder = filled_builder(RecordingBackend {
            fail_create_course: true,
            ..Default::default()
        });

        let err = builder.submit_foundation().await.unwrap_err();
        assert_eq!(err.to_string(), "category does not exist");
        assert_eq!(builder.step_name(), "collecting_foundation");
        assert!(builder.course_id().is_none());
    }

    #[tokio::test]
    async fn submit_enters_organizer_with_loaded_lessons() {
        let mut builder = filled_builder(RecordingBackend::default());
        let course_id = builder.submit_foundation().await.unwrap();

        assert_eq!(builder.step_name(), "organizing_curriculum");
        assert_eq!(builder.course_id(), Some(course_id));
        assert!(builder.lessons().is_empty());
        assert_eq!(
            builder.backend.calls(),
            ["create_course:Intro to X", "load_lessons"]
        );
    }

    #[tokio::test]
    async fn empty_lesson_title_never_reaches_backend() {
        let mut builder = filled_builder(RecordingBackend::default());
        builder.submit_foundation().await.unwrap();
        let calls_before = builder.backend.calls().len();

        let err = builder.add_lesson("   ", None).await.unwrap_err();
        assert!(matches!(err, CurriculumError::Validation(_)));
        assert_eq!(builder.backend.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn positions_append_densely() {
        let mut builder = filled_builder(RecordingBackend::default());
        builder.submit_foundation().await.unwrap();

        builder.add_lesson("Welcome", None).await.unwrap();
        builder.add_lesson("Setup", Some("https://cdn/v.mp4")).await.unwrap();

        let positions: Vec<_> = builder.lessons().iter().map(|s| s.position).collect();
        assert_eq!(positions, [1, 2]);
        assert!(builder
            .backend
            .calls()
            .contains(&String::from("create_lesson:Setup:2")));
    }

    #[tokio::test]
    async fn save_on_empty_list_is_local() {
        let mut builder = filled_builder(RecordingBackend::default());
        builder.submit_foundation().await.unwrap();
        let calls_before = builder.backend.calls().len();

        let err = builder.save().await.unwrap_err();
        assert!(matches!(err, CurriculumError::Validation(_)));
        assert_eq!(builder.backend.calls().len(), calls_before);
        assert_eq!(builder.step_name(), "organizing_curriculum");
    }

    #[tokio::test]
    async fn failed_save_keeps_order_for_retry() {
        let mut builder = filled_builder(RecordingBackend {
            fail_save: true,
            ..Default::default()
        });
        builder.submit_foundation().await.unwrap();
        builder.add_lesson("Welcome", None).await.unwrap();
        builder.add_lesson("Setup", None).await.unwrap();
        builder.move_lesson(1, 0).unwrap();

        let err = builder.save().await.unwrap_err();
        assert_eq!(err.to_string(), "connection reset");
        assert_eq!(builder.step_name(), "organizing_curriculum");
        // in-memory order survives the failure
        assert_eq!(builder.lessons()[0].title, "Setup");
    }

    #[tokio::test]
    async fn full_flow_reorders_and_saves() {
        let mut builder = filled_builder(RecordingBackend::default());
        builder.submit_foundation().await.unwrap();

        let welcome = builder.add_lesson("Welcome", None).await.unwrap();
        let setup = builder.add_lesson("Setup", None).await.unwrap();

        // drag "Setup" above "Welcome"
        builder.move_lesson(1, 0).unwrap();
        let course_id = builder.save().await.unwrap();

        assert_eq!(builder.step_name(), "saved");
        assert_eq!(builder.course_id(), Some(course_id));

        let saved = builder.backend.saved_order.lock().unwrap().clone().unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!((saved[0].id, saved[0].position), (setup, 1));
        assert_eq!((saved[1].id, saved[1].position), (welcome, 2));

        // no backward transition out of `saved`
        assert!(matches!(
            builder.add_lesson("Late", None).await,
            Err(CurriculumError::WrongStep("saved"))
        ));
        assert!(matches!(
            builder.draft_mut(),
            Err(CurriculumError::WrongStep("saved"))
        ));
    }
}

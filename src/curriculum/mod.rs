//! The multi-step course authoring workflow: collect the course foundation,
//! organize the lesson list (add, drag-reorder), persist the final order.
//! Pure logic lives here; the web/CLI layers only drive it.

mod error;
pub use error::{CurriculumError, CurriculumResult};

pub mod reorder;
pub use reorder::{LessonSlot, move_slot, renumber};

mod workflow;
pub use workflow::{BuilderBackend, CourseBuilder, FoundationDraft};

mod backend;
pub use backend::ModelBackend;

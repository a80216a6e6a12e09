mod user;
pub use user::{UserEntity, UserEntityCreateUpdate};

mod course;
pub use course::{Course, CourseCreate, CourseStatus, ReviewVerdict};

mod module;
pub use module::{
    CurriculumLessonInput, CurriculumModuleInput, Module, ModuleCreate, ModuleWithLessonsRow,
};

mod lesson;
pub use lesson::{Lesson, LessonCreate, LessonPosition};

mod enrollment;
pub use enrollment::{Enrollment, EnrollmentCreate, RecentEnrollmentRow};

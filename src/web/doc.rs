use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

pub struct CookieAuthModifier;

impl Modify for CookieAuthModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(schema) = openapi.components.as_mut() {
            schema.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "SID",
                    "JWT token for current user",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::routes::user::user_signup_handler,
        crate::web::routes::user::user_signin_handler,
        crate::web::routes::user::user_list_handler,
        crate::web::routes::user::user_update_handler,
        crate::web::routes::user::user_delete_handler,
        crate::web::routes::courses::course_create_handler,
        crate::web::routes::courses::course_detail_handler,
        crate::web::routes::courses::course_update_handler,
        crate::web::routes::courses::course_curriculum_handler,
        crate::web::routes::courses::course_curriculum_replace_handler,
        crate::web::routes::courses::course_lessons_handler,
        crate::web::routes::courses::course_lesson_add_handler,
        crate::web::routes::courses::course_enroll_handler,
        crate::web::routes::courses::course_review_handler,
        crate::web::routes::courses::course_import_outline_handler,
        crate::web::routes::lessons::lesson_create_handler,
        crate::web::routes::lessons::lessons_reorder_handler,
        crate::web::routes::dashboard::admin_dashboard_handler,
        crate::web::routes::dashboard::instructor_dashboard_handler,
    ),
    modifiers(&CookieAuthModifier),
)]
pub struct ApiDoc;

//! Client for the AI outline-generation collaborator. The endpoint is an
//! opaque function: content blob + instructions in, structured course
//! outline out. No latency or determinism guarantees, no retries.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::entity::{CourseCreate, CurriculumLessonInput, CurriculumModuleInput};

pub type OutlineResult<T> = std::result::Result<T, OutlineError>;

#[derive(Debug, Error)]
pub enum OutlineError {
    #[error("request error: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("malformed outline: {0}")]
    MalformedOutline(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct OutlineRequest<'a> {
    input: &'a str,
    instructions: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct OutlineLesson {
    pub title: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default)]
    pub content: String,
}

fn default_content_type() -> String {
    String::from("text")
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct OutlineModule {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub lessons: Vec<OutlineLesson>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CourseOutline {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub modules: Vec<OutlineModule>,
}

impl CourseOutline {
    /// Split the outline into the course record and the curriculum tree the
    /// model layer persists. Objectives and prerequisites become tags so
    /// they survive without a dedicated column.
    pub fn into_curriculum(
        self,
        category: String,
        level: String,
        price: f64,
    ) -> (CourseCreate, Vec<CurriculumModuleInput>) {
        let tags = self
            .objectives
            .into_iter()
            .chain(self.prerequisites)
            .collect();

        let course = CourseCreate {
            title: self.title,
            description: self.description,
            category,
            level,
            tags,
            price,
            thumbnail_url: None,
            promo_video_url: None,
        };

        let modules = self
            .modules
            .into_iter()
            .map(|module| CurriculumModuleInput {
                title: module.title,
                description: module.description,
                lessons: module
                    .lessons
                    .into_iter()
                    .map(|lesson| CurriculumLessonInput {
                        title: lesson.title,
                        content_type: lesson.content_type,
                        content: lesson.content,
                        video_url: None,
                        is_published: false,
                    })
                    .collect(),
            })
            .collect();

        (course, modules)
    }
}

#[derive(Debug, Clone)]
pub struct OutlineClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl OutlineClient {
    pub fn new(endpoint: &str, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: String::from(endpoint),
            api_key: String::from(api_key),
        }
    }

    #[tracing::instrument(skip(self, input, instructions))]
    pub async fn generate(&self, input: &str, instructions: &str) -> OutlineResult<CourseOutline> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&OutlineRequest { input, instructions })
            .send()
            .await?
            .error_for_status()?;

        let outline = response.json::<CourseOutline>().await?;
        tracing::debug!(modules = outline.modules.len(), "outline generated");
        Ok(outline)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_generated_outline() {
        let raw = serde_json::json!({
            "title": "Intro to Marketing",
            "description": "From zero to first campaign",
            "objectives": ["understand funnels"],
            "prerequisites": ["none"],
            "modules": [{
                "title": "Basics",
                "description": null,
                "lessons": [
                    {"title": "Welcome"},
                    {"title": "Funnels", "content_type": "video"}
                ]
            }]
        });

        let outline: CourseOutline = serde_json::from_value(raw).unwrap();
        assert_eq!(outline.modules.len(), 1);
        assert_eq!(outline.modules[0].lessons[0].content_type, "text");

        let (course, modules) =
            outline.into_curriculum(String::from("marketing"), String::from("beginner"), 0.0);
        assert_eq!(course.title, "Intro to Marketing");
        assert_eq!(course.tags, ["understand funnels", "none"]);
        assert_eq!(modules[0].lessons[1].content_type, "video");
    }
}

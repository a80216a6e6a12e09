use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::{AuthenticatedUser, UserRole};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use sqlx::prelude::Row;
use uuid::Uuid;

/// Course lifecycle. Stored as text; editing a major field of a course
/// which already left `Draft` forces it back to `PendingReview`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    Draft,
    PendingReview,
    Published,
    NeedsChanges,
}

impl From<&str> for CourseStatus {
    fn from(value: &str) -> Self {
        match value {
            "pending_review" => Self::PendingReview,
            "published" => Self::Published,
            "needs_changes" => Self::NeedsChanges,
            _ => Self::Draft,
        }
    }
}

impl std::fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::PendingReview => write!(f, "pending_review"),
            Self::Published => write!(f, "published"),
            Self::NeedsChanges => write!(f, "needs_changes"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReviewVerdict {
    Approved,
    Rejected,
}

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Course {
    id: Uuid,
    instructor_id: Uuid,
    title: String,
    description: String,
    category: String,
    level: String,
    tags: Vec<String>,
    price: f64,
    thumbnail_url: Option<String>,
    promo_video_url: Option<String>,
    status: String,
    rejection_reason: Option<String>,
    reviewed_by: Option<Uuid>,
    reviewed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CourseCreate {
    pub title: String,
    pub description: String,
    pub category: String,
    pub level: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub price: f64,
    pub thumbnail_url: Option<String>,
    pub promo_video_url: Option<String>,
}

impl ResourceTyped for Course {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Course
    }
}

impl Course {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn instructor_id(&self) -> Uuid {
        self.instructor_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn level(&self) -> &str {
        &self.level
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn thumbnail_url(&self) -> Option<&str> {
        self.thumbnail_url.as_deref()
    }

    pub fn promo_video_url(&self) -> Option<&str> {
        self.promo_video_url.as_deref()
    }

    pub fn status(&self) -> CourseStatus {
        CourseStatus::from(self.status.as_str())
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    /// True when `data` changes any of the major fields (title, description,
    /// category, level, price). A positive answer forces the persisted status
    /// back to `pending_review` on update.
    pub fn requires_reapproval(&self, data: &CourseCreate) -> bool {
        self.title != data.title
            || self.description != data.description
            || self.category != data.category
            || self.level != data.level
            || self.price != data.price
    }
}

#[async_trait]
impl CrudRepository<Course, CourseCreate, Uuid> for Course {
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: CourseCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            r#"
            INSERT INTO courses
                (id, instructor_id, title, description, category, level, tags,
                 price, thumbnail_url, promo_video_url, status)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id())
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.category)
        .bind(&data.level)
        .bind(&data.tags)
        .bind(data.price)
        .bind(&data.thumbnail_url)
        .bind(&data.promo_video_url)
        .bind(CourseStatus::Draft.to_string())
        .fetch_one(mm.executor())
        .await?;

        Ok(result)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CourseCreate,
    ) -> DatabaseResult<Self> {
        // Major-field edits always go back through review; otherwise the
        // stored status is preserved as-is.
        let status = if self.requires_reapproval(&data) {
            CourseStatus::PendingReview.to_string()
        } else {
            self.status.clone()
        };

        let updated = sqlx::query_as(
            r#"
            UPDATE courses
            SET title = $1, description = $2, category = $3, level = $4,
                tags = $5, price = $6, thumbnail_url = $7, promo_video_url = $8,
                status = $9, updated_at = now()
            WHERE id = $10
            RETURNING *
            "#,
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.category)
        .bind(&data.level)
        .bind(&data.tags)
        .bind(data.price)
        .bind(&data.thumbnail_url)
        .bind(&data.promo_video_url)
        .bind(&status)
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;

        Ok(updated)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_one(mm.executor())
            .await;
        if let Err(sqlx::Error::RowNotFound) = result {
            return Ok(None);
        }

        Ok(Some(result?))
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM courses ORDER BY created_at DESC LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Course, CourseCreate, Uuid);

#[async_trait]
impl HasOwner for Course {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.instructor_id)
    }
}

impl Course {
    /// Ownership-scoped lookup. A course owned by somebody else comes back
    /// as `None`, indistinguishable from a missing id. Admins see everything.
    pub async fn find_owned(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        if actor.user_role() == UserRole::Admin {
            return Self::find_by_id(mm, actor, id).await;
        }

        let result = sqlx::query_as("SELECT * FROM courses WHERE id = $1 AND instructor_id = $2")
            .bind(id)
            .bind(actor.user_id())
            .fetch_one(mm.executor())
            .await;
        if let Err(sqlx::Error::RowNotFound) = result {
            return Ok(None);
        }

        Ok(Some(result?))
    }

    pub async fn all_by_instructor(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM courses WHERE instructor_id = $1 ORDER BY created_at DESC",
        )
        .bind(actor.user_id())
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    /// The admin approval queue, oldest submission first.
    pub async fn pending_review(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            "SELECT * FROM courses WHERE status = $1 ORDER BY updated_at ASC",
        )
        .bind(CourseStatus::PendingReview.to_string())
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn count_published(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses WHERE status = $1")
            .bind(CourseStatus::Published.to_string())
            .fetch_one(mm.executor())
            .await?;
        Ok(result)
    }

    /// Resolve a review: `Approved` publishes, `Rejected` sends the course
    /// back to the instructor with the reviewer's reason attached.
    pub async fn review(
        mut self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        verdict: ReviewVerdict,
        reason: Option<String>,
    ) -> DatabaseResult<Self> {
        let status = match verdict {
            ReviewVerdict::Approved => CourseStatus::Published,
            ReviewVerdict::Rejected => CourseStatus::NeedsChanges,
        };

        let row = sqlx::query(
            r#"
            UPDATE courses
            SET status = $1, rejection_reason = $2, reviewed_by = $3,
                reviewed_at = now(), updated_at = now()
            WHERE id = $4
            RETURNING reviewed_at
            "#,
        )
        .bind(status.to_string())
        .bind(&reason)
        .bind(actor.user_id())
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;

        self.status = status.to_string();
        self.rejection_reason = reason;
        self.reviewed_by = Some(actor.user_id());
        self.reviewed_at = row.try_get("reviewed_at")?;
        Ok(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn course() -> Course {
        Course {
            id: Uuid::new_v4(),
            instructor_id: Uuid::new_v4(),
            title: String::from("Intro to X"),
            description: String::from("desc"),
            category: String::from("marketing"),
            level: String::from("beginner"),
            tags: vec![],
            price: 49.0,
            thumbnail_url: None,
            promo_video_url: None,
            status: CourseStatus::Published.to_string(),
            rejection_reason: None,
            reviewed_by: None,
            reviewed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn identical_patch(course: &Course) -> CourseCreate {
        CourseCreate {
            title: course.title.clone(),
            description: course.description.clone(),
            category: course.category.clone(),
            level: course.level.clone(),
            tags: course.tags.clone(),
            price: course.price,
            thumbnail_url: course.thumbnail_url.clone(),
            promo_video_url: course.promo_video_url.clone(),
        }
    }

    #[test]
    fn price_only_change_requires_reapproval() {
        let course = course();
        let mut patch = identical_patch(&course);
        patch.price = 59.0;
        assert!(course.requires_reapproval(&patch));
    }

    #[test]
    fn identical_patch_keeps_status() {
        let course = course();
        let patch = identical_patch(&course);
        assert!(!course.requires_reapproval(&patch));
    }

    #[test]
    fn minor_field_change_is_not_major() {
        let course = course();
        let mut patch = identical_patch(&course);
        patch.tags = vec![String::from("sales")];
        patch.thumbnail_url = Some(String::from("/api/v1/static/thumb.png"));
        assert!(!course.requires_reapproval(&patch));
    }

    #[test]
    fn status_roundtrip() {
        for status in [
            CourseStatus::Draft,
            CourseStatus::PendingReview,
            CourseStatus::Published,
            CourseStatus::NeedsChanges,
        ] {
            assert_eq!(CourseStatus::from(status.to_string().as_str()), status);
        }
    }
}

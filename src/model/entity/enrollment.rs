use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use sqlx::prelude::Row;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Enrollment {
    id: Uuid,
    user_id: Uuid,
    course_id: Uuid,
    progress: f64,
    completed: bool,
    rating: Option<i32>,
    enrolled_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct EnrollmentCreate {
    pub user_id: Uuid,
    pub course_id: Uuid,
}

impl ResourceTyped for Enrollment {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Enrollment
    }
}

impl Enrollment {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn rating(&self) -> Option<i32> {
        self.rating
    }
}

#[async_trait]
impl CrudRepository<Enrollment, EnrollmentCreate, Uuid> for Enrollment {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: EnrollmentCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            "INSERT INTO enrollments (id, user_id, course_id) VALUES ($1,$2,$3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(data.course_id)
        .fetch_one(mm.executor())
        .await?;

        Ok(result)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: EnrollmentCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE enrollments SET user_id = $1, course_id = $2 WHERE id = $3")
            .bind(data.user_id)
            .bind(data.course_id)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.user_id = data.user_id;
        self.course_id = data.course_id;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM enrollments WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM enrollments WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM enrollments LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM enrollments")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Enrollment, EnrollmentCreate, Uuid);

#[async_trait]
impl HasOwner for Enrollment {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.user_id)
    }
}

// Derived course metrics. Each aggregate is its own query so a failing one
// can be defaulted without dragging the others down.

impl Enrollment {
    pub async fn find_by_user_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        user_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM enrollments WHERE user_id = $1 AND course_id = $2")
            .bind(user_id)
            .bind(course_id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn count_by_course(mm: &ModelManager, course_id: Uuid) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM enrollments WHERE course_id = $1")
            .bind(course_id)
            .fetch_one(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn average_rating(mm: &ModelManager, course_id: Uuid) -> DatabaseResult<f64> {
        // AVG yields NUMERIC, cast so it decodes straight into f64
        let result: f64 = sqlx::query_scalar(
            "SELECT COALESCE(AVG(rating), 0)::DOUBLE PRECISION FROM enrollments WHERE course_id = $1",
        )
        .bind(course_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }

    /// Share of enrolled students who finished the course, in percent.
    pub async fn completion_rate(mm: &ModelManager, course_id: Uuid) -> DatabaseResult<f64> {
        let result: f64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(AVG(CASE WHEN completed THEN 100.0 ELSE 0.0 END), 0)::DOUBLE PRECISION
            FROM enrollments
            WHERE course_id = $1
            "#,
        )
        .bind(course_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }
}

// Utils

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct RecentEnrollmentRow {
    pub username: String,
    pub course_title: String,
    pub enrolled_at: DateTime<Utc>,
}

impl RecentEnrollmentRow {
    pub async fn fetch_recent(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let rows: Vec<RecentEnrollmentRow> = sqlx::query_as(
            r#"
            SELECT
                u.username,
                c.title AS course_title,
                e.enrolled_at
            FROM enrollments e
            JOIN users u ON u.id = e.user_id
            JOIN courses c ON c.id = e.course_id
            ORDER BY e.enrolled_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}

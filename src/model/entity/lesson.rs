use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use sqlx::prelude::Row;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Lesson {
    id: Uuid,
    module_id: Uuid,
    title: String,
    content_type: String,
    content: String,
    video_url: Option<String>,
    is_published: bool,
    position: i32,
}

impl ResourceTyped for Lesson {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Lesson
    }
}

impl Lesson {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn module_id(&self) -> Uuid {
        self.module_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn video_url(&self) -> Option<&str> {
        self.video_url.as_deref()
    }

    pub fn is_published(&self) -> bool {
        self.is_published
    }

    pub fn position(&self) -> i32 {
        self.position
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LessonCreate {
    pub module_id: Uuid,
    pub title: String,
    pub content_type: String,
    #[serde(default)]
    pub content: String,
    pub video_url: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    pub position: Option<i32>,
}

/// One entry of a bulk reorder: the lesson and its new 1-based position.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LessonPosition {
    pub id: Uuid,
    pub position: i32,
}

#[async_trait]
impl CrudRepository<Lesson, LessonCreate, Uuid> for Lesson {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: LessonCreate,
    ) -> DatabaseResult<Self> {
        // Append when the caller did not pick a slot.
        let position = match data.position {
            Some(pos) => pos,
            None => Self::max_position(mm, data.module_id).await? + 1,
        };

        let result = sqlx::query(
            r#"
            INSERT INTO lessons
                (id, module_id, title, content_type, content, video_url, is_published, position)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.module_id)
        .bind(&data.title)
        .bind(&data.content_type)
        .bind(&data.content)
        .bind(&data.video_url)
        .bind(data.is_published)
        .bind(position)
        .fetch_one(mm.executor())
        .await?;

        let id = result.try_get("id")?;
        Ok(Lesson {
            id,
            module_id: data.module_id,
            title: data.title,
            content_type: data.content_type,
            content: data.content,
            video_url: data.video_url,
            is_published: data.is_published,
            position,
        })
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: LessonCreate,
    ) -> DatabaseResult<Self> {
        let position = data.position.unwrap_or(self.position);
        sqlx::query(
            r#"
            UPDATE lessons
            SET module_id = $1, title = $2, content_type = $3, content = $4,
                video_url = $5, is_published = $6, position = $7
            WHERE id = $8
            "#,
        )
        .bind(data.module_id)
        .bind(&data.title)
        .bind(&data.content_type)
        .bind(&data.content)
        .bind(&data.video_url)
        .bind(data.is_published)
        .bind(position)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.module_id = data.module_id;
        self.title = data.title;
        self.content_type = data.content_type;
        self.content = data.content;
        self.video_url = data.video_url;
        self.is_published = data.is_published;
        self.position = position;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM lessons WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM lessons WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM lessons LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lessons")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Lesson, LessonCreate, Uuid);

#[async_trait]
impl HasOwner for Lesson {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        let instructor_id: Uuid = sqlx::query_scalar(
            r#"
            SELECT c.instructor_id
            FROM modules m
            JOIN courses c ON c.id = m.course_id
            WHERE m.id = $1
            "#,
        )
        .bind(self.module_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(instructor_id)
    }
}

impl Lesson {
    pub async fn max_position(mm: &ModelManager, module_id: Uuid) -> DatabaseResult<i32> {
        let max: i32 =
            sqlx::query_scalar("SELECT COALESCE(MAX(position), 0) FROM lessons WHERE module_id = $1")
                .bind(module_id)
                .fetch_one(mm.executor())
                .await?;
        Ok(max)
    }

    /// Flat lesson list of a course, the order the curriculum organizer
    /// shows it in.
    pub async fn all_by_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT l.*
            FROM lessons l
            JOIN modules m ON m.id = l.module_id
            WHERE m.course_id = $1
            ORDER BY m.order_index, l.position
            "#,
        )
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    /// Apply a bulk reorder as one transaction. Only lessons belonging to
    /// `course_id` are touched, so a stale id list cannot renumber somebody
    /// else's curriculum. Returns how many rows changed.
    pub async fn apply_positions(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
        positions: &[LessonPosition],
    ) -> DatabaseResult<u64> {
        let mut tx = mm.executor().begin().await?;
        let mut changed = 0;

        for entry in positions {
            let result = sqlx::query(
                r#"
                UPDATE lessons
                SET position = $1
                WHERE id = $2
                  AND module_id IN (SELECT id FROM modules WHERE course_id = $3)
                "#,
            )
            .bind(entry.position)
            .bind(entry.id)
            .bind(course_id)
            .execute(&mut *tx)
            .await?;
            changed += result.rows_affected();
        }

        tx.commit().await?;
        Ok(changed)
    }
}

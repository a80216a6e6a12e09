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
pub struct Module {
    id: Uuid,
    course_id: Uuid,
    title: String,
    description: Option<String>,
    order_index: i32,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ModuleCreate {
    pub course_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub order_index: Option<i32>,
}

impl ResourceTyped for Module {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Module
    }
}

impl Module {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn order_index(&self) -> i32 {
        self.order_index
    }
}

#[async_trait]
impl CrudRepository<Module, ModuleCreate, Uuid> for Module {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ModuleCreate,
    ) -> DatabaseResult<Self> {
        let order_index = match data.order_index {
            Some(idx) => idx,
            None => {
                let max: i32 = sqlx::query_scalar(
                    "SELECT COALESCE(MAX(order_index), 0) FROM modules WHERE course_id = $1",
                )
                .bind(data.course_id)
                .fetch_one(mm.executor())
                .await?;
                max + 1
            }
        };

        let result = sqlx::query(
            "INSERT INTO modules (id, course_id, title, description, order_index) VALUES ($1,$2,$3,$4,$5) RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(data.course_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(order_index)
        .fetch_one(mm.executor())
        .await?;

        let id = result.try_get("id")?;
        Ok(Module {
            id,
            course_id: data.course_id,
            title: data.title,
            description: data.description,
            order_index,
        })
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ModuleCreate,
    ) -> DatabaseResult<Self> {
        let order_index = data.order_index.unwrap_or(self.order_index);
        sqlx::query(
            "UPDATE modules SET title = $1, description = $2, order_index = $3 WHERE id = $4",
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(order_index)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.title = data.title;
        self.description = data.description;
        self.order_index = order_index;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM modules WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM modules WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM modules LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM modules")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Module, ModuleCreate, Uuid);

#[async_trait]
impl HasOwner for Module {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        let instructor_id: Uuid =
            sqlx::query_scalar("SELECT instructor_id FROM courses WHERE id = $1")
                .bind(self.course_id)
                .fetch_one(mm.executor())
                .await?;
        Ok(instructor_id)
    }
}

// Curriculum replacement

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CurriculumLessonInput {
    pub title: String,
    pub content_type: String,
    #[serde(default)]
    pub content: String,
    pub video_url: Option<String>,
    #[serde(default)]
    pub is_published: bool,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CurriculumModuleInput {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub lessons: Vec<CurriculumLessonInput>,
}

impl Module {
    pub async fn all_by_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result =
            sqlx::query_as("SELECT * FROM modules WHERE course_id = $1 ORDER BY order_index")
                .bind(course_id)
                .fetch_all(mm.executor())
                .await?;
        Ok(result)
    }

    /// The module new lessons land in when the author works with the flat
    /// course-level lesson list. Created on first use.
    pub async fn ensure_default(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Self> {
        let existing = sqlx::query_as(
            "SELECT * FROM modules WHERE course_id = $1 ORDER BY order_index LIMIT 1",
        )
        .bind(course_id)
        .fetch_optional(mm.executor())
        .await?;

        if let Some(module) = existing {
            return Ok(module);
        }

        Self::create(
            mm,
            actor,
            ModuleCreate {
                course_id,
                title: String::from("Curriculum"),
                description: None,
                order_index: Some(1),
            },
        )
        .await
    }

    /// Replace the whole module/lesson set of a course in one transaction.
    /// Submitted order wins: order_index and position are renumbered 1..N.
    /// Either everything commits or the old curriculum stays intact.
    pub async fn replace_curriculum(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
        modules: Vec<CurriculumModuleInput>,
    ) -> DatabaseResult<()> {
        let mut tx = mm.executor().begin().await?;

        sqlx::query("DELETE FROM modules WHERE course_id = $1")
            .bind(course_id)
            .execute(&mut *tx)
            .await?;

        for (module_idx, module) in modules.iter().enumerate() {
            let module_id = Uuid::new_v4();
            sqlx::query(
                "INSERT INTO modules (id, course_id, title, description, order_index) VALUES ($1,$2,$3,$4,$5)",
            )
            .bind(module_id)
            .bind(course_id)
            .bind(&module.title)
            .bind(&module.description)
            .bind(module_idx as i32 + 1)
            .execute(&mut *tx)
            .await?;

            for (lesson_idx, lesson) in module.lessons.iter().enumerate() {
                sqlx::query(
                    r#"
                    INSERT INTO lessons
                        (id, module_id, title, content_type, content, video_url, is_published, position)
                    VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(module_id)
                .bind(&lesson.title)
                .bind(&lesson.content_type)
                .bind(&lesson.content)
                .bind(&lesson.video_url)
                .bind(lesson.is_published)
                .bind(lesson_idx as i32 + 1)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

// Utils

#[derive(sqlx::FromRow)]
pub struct ModuleWithLessonsRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub order_index: i32,
    pub lessons: serde_json::Value,
}

impl ModuleWithLessonsRow {
    pub async fn fetch_by_course(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        course_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let rows: Vec<ModuleWithLessonsRow> = sqlx::query_as(
            r#"
            SELECT
            m.id,
            m.title,
            m.description,
            m.order_index,
            COALESCE(
                json_agg(
                    json_build_object(
                        'id', l.id,
                        'title', l.title,
                        'content_type', l.content_type,
                        'is_published', l.is_published,
                        'position', l.position
                    )
                    ORDER BY l.position
                ) FILTER (WHERE l.id IS NOT NULL),
                '[]'
            ) AS lessons
            FROM modules m
            LEFT JOIN lessons l ON l.module_id = m.id
            WHERE m.course_id = $1
            GROUP BY m.id
            ORDER BY m.order_index;
        "#,
        )
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}

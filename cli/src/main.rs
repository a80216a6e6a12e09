use clap::{Parser, Subcommand};
use coursecraft::auth::hash_password;
use coursecraft::curriculum::{CourseBuilder, ModelBackend};
use coursecraft::model::entity::{ReviewVerdict, UserEntity, UserEntityCreateUpdate};
use coursecraft::model::{CrudRepository, DatabaseError, DbConnection, ModelManager};
use coursecraft::web::AuthenticatedUser;

#[derive(Parser, Debug)]
#[command(about = "CLI tool for seeding and scaffolding the course marketplace DB", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Manage courses
    Course {
        #[command(subcommand)]
        action: CourseCommands,
    },
}

/// User management
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "student")]
        role: String,
    },
}

/// Course management
#[derive(Subcommand, Debug)]
pub enum CourseCommands {
    /// Run the whole authoring workflow: create the course, append the
    /// given lessons, persist the order.
    Scaffold {
        /// Username of the owning instructor
        #[arg(long)]
        instructor: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        category: String,
        #[arg(long, default_value = "beginner")]
        level: String,
        #[arg(long, default_value_t = 0.0)]
        price: f64,
        /// Lesson title, repeatable; order of flags is the curriculum order
        #[arg(long = "lesson", required = true)]
        lessons: Vec<String>,
    },

    /// Resolve a pending review
    Review {
        /// Title of the course to review
        #[arg(long)]
        title: String,
        #[arg(long, default_value_t = false)]
        reject: bool,
        #[arg(long)]
        reason: Option<String>,
    },
}

async fn find_actor(mm: &ModelManager, username: &str) -> AuthenticatedUser {
    let admin = AuthenticatedUser::admin();
    let user = UserEntity::find_by_username(mm, &admin, username)
        .await
        .expect("Unable to query users")
        .unwrap_or_else(|| panic!("No user named `{username}`"));
    AuthenticatedUser::new(user.id(), user.role())
}

#[tokio::main]
async fn main() -> coursecraft::error::AppResult<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    let db_con = DbConnection::connect(&std::env::var("DATABASE_URL").expect("DATABASE_URL is not set"))?;
    let mm = ModelManager::new(db_con);
    let admin = AuthenticatedUser::admin();

    match args.command {
        Commands::User { action } => match action {
            UserCommands::Add { username, password, role } => {
                let user = UserEntity::create(
                    &mm,
                    &admin,
                    UserEntityCreateUpdate {
                        username,
                        password_hash: hash_password(&password).expect("Unable to hash password"),
                        role,
                    },
                )
                .await?;
                println!("User created: {:?}", user);
            }
        },

        Commands::Course { action } => match action {
            CourseCommands::Scaffold {
                instructor,
                title,
                description,
                category,
                level,
                price,
                lessons,
            } => {
                let actor = find_actor(&mm, &instructor).await;
                let backend = ModelBackend::new(&mm, &actor);
                let mut builder = CourseBuilder::new(backend);

                {
                    let draft = builder.draft_mut().expect("Builder starts at the foundation step");
                    draft.title = title;
                    draft.description = description;
                    draft.category = category;
                    draft.level = level;
                    draft.price = price;
                }

                let course_id = match builder.submit_foundation().await {
                    Ok(id) => id,
                    Err(e) => {
                        eprintln!("Foundation step rejected: {e}");
                        std::process::exit(1);
                    }
                };

                for lesson in lessons {
                    if let Err(e) = builder.add_lesson(&lesson, None).await {
                        eprintln!("Unable to add lesson `{lesson}`: {e}");
                        std::process::exit(1);
                    }
                }

                if let Err(e) = builder.save().await {
                    eprintln!("Unable to save the curriculum: {e}");
                    std::process::exit(1);
                }

                println!("Course scaffolded: {course_id}");
            }

            CourseCommands::Review { title, reject, reason } => {
                let course_id: uuid::Uuid =
                    sqlx::query_scalar("SELECT id FROM courses WHERE title = $1")
                        .bind(&title)
                        .fetch_one(mm.executor())
                        .await
                        .map_err(DatabaseError::SqlxError)?;

                let course = coursecraft::model::entity::Course::find_by_id(&mm, &admin, course_id)
                    .await?
                    .expect("Course disappeared mid-review");

                let verdict = if reject {
                    ReviewVerdict::Rejected
                } else {
                    ReviewVerdict::Approved
                };

                let reviewed = course.review(&mm, &admin, verdict, reason).await?;
                println!("Course reviewed: {:?}", reviewed);
            }
        },
    }

    Ok(())
}

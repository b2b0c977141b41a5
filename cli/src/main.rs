use std::path::PathBuf;
use std::sync::Arc;

use campus_client::config::normalize_base_url;
use campus_client::net::types::{CourseInput, DepartmentInput, GradeInput};
use campus_client::{ClientConfig, ClientError, Credentials, Router, Store};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Client(#[from] ClientError),
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "campus-cli", about = "Campus academic-management client")]
struct Cli {
    /// Overrides `CAMPUS_API_BASE_URL`.
    #[arg(long)]
    base_url: Option<String>,

    /// Overrides `CAMPUS_SESSION_FILE`.
    #[arg(long)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "CAMPUS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    /// Verify the stored session and print the current user.
    Whoami,
    /// Run a navigation through the guard and print where it settled.
    Navigate {
        path: String,
    },
    /// List the menu routes the current role may open.
    Routes,
    Department(DepartmentCommand),
    Course(CourseCommand),
    Grade(GradeCommand),
}

#[derive(Args, Debug)]
struct DepartmentCommand {
    #[command(subcommand)]
    command: DepartmentSubcommand,
}

#[derive(Subcommand, Debug)]
enum DepartmentSubcommand {
    List,
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        code: String,
    },
    Update {
        id: u64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        code: String,
    },
    Delete {
        id: u64,
    },
}

#[derive(Args, Debug)]
struct CourseCommand {
    #[command(subcommand)]
    command: CourseSubcommand,
}

#[derive(Subcommand, Debug)]
enum CourseSubcommand {
    List,
    Get { id: u64 },
    Create(CourseArgs),
    Update {
        id: u64,
        #[command(flatten)]
        course: CourseArgs,
    },
    Delete { id: u64 },
}

#[derive(Args, Debug)]
struct CourseArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    code: String,
    #[arg(long, default_value_t = 0.0)]
    credits: f64,
    #[arg(long, default_value_t = 0)]
    hours: u32,
    #[arg(long = "type", default_value = "required")]
    kind: String,
    #[arg(long)]
    department_id: u64,
    #[arg(long, default_value = "")]
    description: String,
}

impl From<CourseArgs> for CourseInput {
    fn from(args: CourseArgs) -> Self {
        Self {
            name: args.name,
            code: args.code,
            credits: args.credits,
            hours: args.hours,
            kind: args.kind,
            department_id: args.department_id,
            description: args.description,
        }
    }
}

#[derive(Args, Debug)]
struct GradeCommand {
    #[command(subcommand)]
    command: GradeSubcommand,
}

#[derive(Subcommand, Debug)]
enum GradeSubcommand {
    /// Grades of one student; the backend defaults to the caller.
    Student {
        #[arg(long)]
        student_id: Option<u64>,
    },
    Course {
        course_offering_id: u64,
    },
    Update {
        id: u64,
        #[arg(long)]
        grade: f64,
    },
    Create {
        #[arg(long)]
        student_id: u64,
        #[arg(long)]
        course_offering_id: u64,
        #[arg(long)]
        grade: f64,
        #[arg(long, default_value = "")]
        status: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = resolve_config(cli.base_url, cli.session_file)?;
    tracing::debug!(base_url = %config.api_base_url, session_file = %config.session_file.display(), "config loaded");
    let store = Arc::new(Store::from_config(&config)?);

    match cli.command {
        Command::Login { username, password } => {
            let user = store.login(&Credentials { username, password }).await?;
            print_json(&user)
        }
        Command::Logout => {
            store.logout().await;
            print_json(&json!({ "message": "logged out" }))
        }
        Command::Whoami => {
            let user = store.check_auth().await?;
            print_json(&user)
        }
        Command::Navigate { path } => {
            let router = Router::new(Arc::clone(&store));
            let location = router.navigate(&path).await?;
            print_json(&json!({ "requested": path, "settled": location.full_path() }))
        }
        Command::Routes => {
            let router = Router::new(Arc::clone(&store));
            let routes: Vec<_> = router
                .accessible_routes()
                .await
                .into_iter()
                .map(|route| json!({ "path": route.path, "name": route.name, "title": route.title }))
                .collect();
            print_json(&routes)
        }
        Command::Department(department) => run_department(&store, department).await,
        Command::Course(course) => run_course(&store, course).await,
        Command::Grade(grade) => run_grade(&store, grade).await,
    }
}

fn resolve_config(base_url: Option<String>, session_file: Option<PathBuf>) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(raw) = base_url {
        config.api_base_url = normalize_base_url(&raw)?;
    }
    if let Some(path) = session_file {
        config.session_file = path;
    }
    Ok(config)
}

async fn run_department(store: &Store, department: DepartmentCommand) -> Result<(), CliError> {
    match department.command {
        DepartmentSubcommand::List => print_json(&store.fetch_departments().await?),
        DepartmentSubcommand::Create { name, code } => {
            print_json(&store.create_department(&DepartmentInput { name, code }).await?)
        }
        DepartmentSubcommand::Update { id, name, code } => {
            print_json(&store.update_department(id, &DepartmentInput { name, code }).await?)
        }
        DepartmentSubcommand::Delete { id } => {
            store.delete_department(id).await?;
            print_json(&json!({ "deleted": id }))
        }
    }
}

async fn run_course(store: &Store, course: CourseCommand) -> Result<(), CliError> {
    match course.command {
        CourseSubcommand::List => print_json(&store.fetch_courses().await?),
        CourseSubcommand::Get { id } => print_json(&store.fetch_course(id).await?),
        CourseSubcommand::Create(args) => print_json(&store.create_course(&args.into()).await?),
        CourseSubcommand::Update { id, course } => print_json(&store.update_course(id, &course.into()).await?),
        CourseSubcommand::Delete { id } => {
            store.delete_course(id).await?;
            print_json(&json!({ "deleted": id }))
        }
    }
}

async fn run_grade(store: &Store, grade: GradeCommand) -> Result<(), CliError> {
    match grade.command {
        GradeSubcommand::Student { student_id } => print_json(&store.fetch_student_grades(student_id).await?),
        GradeSubcommand::Course { course_offering_id } => {
            print_json(&store.fetch_course_grades(course_offering_id).await?)
        }
        GradeSubcommand::Update { id, grade } => {
            store.update_grade(id, grade).await?;
            print_json(&json!({ "updated": id, "grade": grade }))
        }
        GradeSubcommand::Create { student_id, course_offering_id, grade, status } => {
            let input = GradeInput { student_id, course_offering_id, grade, status };
            print_json(&store.create_grade(&input).await?)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

//! `taskboard` binary: runs the API server or drives the board as a client.
//!
//! # Responsibility
//! - Load `.env`, initialize logging and dispatch one subcommand.
//! - Exit non-zero when the server cannot start or a client action fails.

use clap::{Args, Parser, Subcommand};
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;
use taskboard_cli::{CreateTaskInput, ListOptions, TaskBoard, TaskClient, ViewFilter};
use taskboard_core::{init_logging, Priority, ServerConfig, TaskId};

const CLIENT_LOG_LEVEL: &str = "warn";

#[derive(Parser)]
#[command(name = "taskboard", version, about = "Task board API server and client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API server
    Serve(ServeArgs),
    /// List tasks
    List {
        #[command(flatten)]
        api: ApiArgs,
        /// Which tasks to show
        #[arg(long, value_enum, default_value_t = ViewFilter::All)]
        filter: ViewFilter,
        /// Case-insensitive title substring
        #[arg(long)]
        search: Option<String>,
        /// createdAt, updatedAt, title, priority or dueDate
        #[arg(long)]
        sort: Option<String>,
        /// asc or desc
        #[arg(long)]
        order: Option<String>,
    },
    /// Add a task
    Add {
        #[command(flatten)]
        api: ApiArgs,
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// low, medium or high
        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,
        /// RFC 3339 timestamp or YYYY-MM-DD
        #[arg(long)]
        due: Option<String>,
    },
    /// Flip a task between open and completed
    Toggle {
        #[command(flatten)]
        api: ApiArgs,
        id: TaskId,
    },
    /// Delete a task
    Delete {
        #[command(flatten)]
        api: ApiArgs,
        id: TaskId,
    },
    /// Check that the API is up
    Health {
        #[command(flatten)]
        api: ApiArgs,
    },
}

#[derive(Args)]
struct ServeArgs {
    /// Overrides HOST
    #[arg(long)]
    host: Option<String>,
    /// Overrides PORT
    #[arg(long)]
    port: Option<u16>,
    /// Overrides DATABASE_PATH; `:memory:` keeps everything in memory
    #[arg(long)]
    db: Option<PathBuf>,
}

#[derive(Args)]
struct ApiArgs {
    /// API base URL; defaults to TASKBOARD_API_URL or the local server
    #[arg(long)]
    api_url: Option<String>,
}

impl ApiArgs {
    fn client(&self) -> Result<TaskClient, String> {
        let client = match &self.api_url {
            Some(url) => TaskClient::new(url.as_str()),
            None => TaskClient::from_env(),
        };
        client.map_err(|err| err.to_string())
    }
}

fn parse_priority(raw: &str) -> Result<Priority, String> {
    Priority::parse(raw).ok_or_else(|| format!("priority must be {}", Priority::EXPECTED))
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Serve(args) => serve(args).await,
        command => {
            let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| CLIENT_LOG_LEVEL.into());
            match init_logging(&level, None) {
                Ok(()) => run_client(command).await,
                Err(err) => Err(err),
            }
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

async fn serve(args: ServeArgs) -> Result<(), String> {
    let mut config = ServerConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(db) = args.db {
        config.database_path = db;
    }

    init_logging(config.log_level, config.log_dir.as_deref())?;
    taskboard_api::run(&config).await.map_err(|err| {
        error!("event=server_start module=cli status=error error={err}");
        err.to_string()
    })
}

async fn run_client(command: Command) -> Result<(), String> {
    match command {
        Command::Serve(_) => Ok(()),
        Command::List {
            api,
            filter,
            search,
            sort,
            order,
        } => {
            let mut board = TaskBoard::new(api.client()?);
            let options = ListOptions {
                completed: None,
                search,
                sort,
                order,
            };
            board.load(&options).await;
            board.set_filter(filter);
            finish(&board)
        }
        Command::Add {
            api,
            title,
            description,
            priority,
            due,
        } => {
            let mut board = loaded_board(&api).await?;
            board
                .add_task(CreateTaskInput {
                    description,
                    priority,
                    due_date: due,
                    ..CreateTaskInput::titled(title)
                })
                .await;
            finish(&board)
        }
        Command::Toggle { api, id } => {
            let mut board = loaded_board(&api).await?;
            if !board.tasks().iter().any(|task| task.id == id) {
                return Err(format!("task {id} not found"));
            }
            board.toggle_complete(id).await;
            finish(&board)
        }
        Command::Delete { api, id } => {
            let mut board = loaded_board(&api).await?;
            board.delete_task(id).await;
            finish(&board)
        }
        Command::Health { api } => {
            let health = api.client()?.health().await.map_err(|err| err.to_string())?;
            println!("{}: {}", health.status, health.message);
            Ok(())
        }
    }
}

async fn loaded_board(api: &ApiArgs) -> Result<TaskBoard<TaskClient>, String> {
    let mut board = TaskBoard::new(api.client()?);
    board.load(&ListOptions::default()).await;
    match board.error() {
        Some(message) => Err(message.to_string()),
        None => Ok(board),
    }
}

fn finish(board: &TaskBoard<TaskClient>) -> Result<(), String> {
    print!("{}", board.render());
    match board.error() {
        Some(message) => Err(message.to_string()),
        None => Ok(()),
    }
}

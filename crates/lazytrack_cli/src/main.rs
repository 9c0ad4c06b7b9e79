//! Command-line entry point.
//!
//! # Responsibility
//! - Resolve configuration, start logging and open the tracker database.
//! - Run one endpoint per invocation and print its JSON response.

use clap::{Parser, Subcommand};
use lazytrack_api::{ApiResponse, TrackerApi};
use lazytrack_core::{init_logging, TrackerConfig};
use log::info;
use serde_json::{json, Value};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "lazytrack",
    version,
    about = "Project/task tracker with weighted completion progress"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
enum Command {
    /// Check the binary without touching the database
    Ping,
    /// Create a project from a JSON body
    ProjectCreate {
        #[arg(value_parser = parse_json_body)]
        body: Value,
    },
    /// List projects with their tasks
    ProjectList,
    /// Show one project
    ProjectGet { id: String },
    /// Update name, status or completion_progress of a project
    ProjectUpdate {
        id: String,
        #[arg(value_parser = parse_json_body)]
        body: Value,
    },
    /// Delete a project and all of its tasks
    ProjectDelete { id: String },
    /// Create a task from a JSON body
    TaskCreate {
        #[arg(value_parser = parse_json_body)]
        body: Value,
    },
    /// List tasks, optionally of one project
    TaskList { project: Option<String> },
    /// Show one task
    TaskGet { id: String },
    /// Update a task; `project` moves it to another project
    TaskUpdate {
        id: String,
        #[arg(value_parser = parse_json_body)]
        body: Value,
    },
    /// Delete one task
    TaskDelete { id: String },
}

impl Command {
    fn needs_database(&self) -> bool {
        !matches!(self, Self::Ping)
    }

    fn run(&self, api: &TrackerApi) -> ApiResponse {
        match self {
            Self::Ping => ping_response(),
            Self::ProjectCreate { body } => api.create_project(body),
            Self::ProjectList => api.list_projects(),
            Self::ProjectGet { id } => api.get_project(id),
            Self::ProjectUpdate { id, body } => api.update_project(id, body),
            Self::ProjectDelete { id } => api.delete_project(id),
            Self::TaskCreate { body } => api.create_task(body),
            Self::TaskList { project } => api.list_tasks(project.as_deref()),
            Self::TaskGet { id } => api.get_task(id),
            Self::TaskUpdate { id, body } => api.update_task(id, body),
            Self::TaskDelete { id } => api.delete_task(id),
        }
    }
}

fn parse_json_body(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|err| format!("invalid JSON body: {err}"))
}

fn ping_response() -> ApiResponse {
    ApiResponse::ok(json!({ "ping": lazytrack_core::ping() }))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match TrackerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };
    if let Some(log_dir) = &config.log_dir {
        if let Err(err) = init_logging(config.log_level, log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let response = if cli.command.needs_database() {
        match TrackerApi::open(&config) {
            Ok(api) => {
                info!(
                    "event=cli_run module=cli status=start db_path={}",
                    config.db_path.display()
                );
                cli.command.run(&api)
            }
            Err(err) => {
                eprintln!("failed to open {}: {err}", config.db_path.display());
                return ExitCode::FAILURE;
            }
        }
    } else {
        ping_response()
    };

    print_response(&response);
    if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_response(response: &ApiResponse) {
    let rendered = serde_json::to_string_pretty(&response.body)
        .unwrap_or_else(|_| response.body.to_string());
    if response.is_success() {
        println!("{rendered}");
    } else {
        eprintln!("HTTP {}\n{rendered}", response.status);
    }
}

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use crate::types::SortOrder;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Compact,
}

#[derive(Parser)]
#[command(name = "todo")]
#[command(about = "A CLI for users and their to-do tasks on a json-server backend", version)]
#[command(after_help = "EXAMPLES:
    todo users list                   List users
    todo users add me@mail.com        Create a user
    todo tasks list u1 --page 2       Second page of u1's tasks
    todo tasks add u1 \"Buy milk\"      Create a task
    todo browse /u1/tasks             Browse u1's tasks interactively")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (table, json, compact)
    #[arg(long, short = 'o', global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Output as JSON (alias for --format json)
    #[arg(long, global = true, hide = true)]
    pub json: bool,

    /// Suppress success messages
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Show debug logs and detailed error information
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Backend URL (overrides TODO_API_URL and the config file)
    #[arg(long, global = true)]
    pub base_url: Option<String>,
}

impl Cli {
    /// Get the effective output format, considering --json flag
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage users
    #[command(
        alias = "u",
        after_help = "EXAMPLES:
    todo users list
    todo users add me@mail.com
    todo users rm 3f2a"
    )]
    Users {
        #[command(subcommand)]
        action: UserCommands,
    },
    /// Manage tasks
    #[command(
        alias = "t",
        after_help = "EXAMPLES:
    todo tasks list u1 --search milk --sort desc
    todo tasks add u1 \"Buy milk\"
    todo tasks done 9c1e
    todo tasks rm 9c1e"
    )]
    Tasks {
        #[command(subcommand)]
        action: TaskCommands,
    },
    /// Browse users and tasks interactively
    #[command(after_help = "EXAMPLES:
    todo browse
    todo browse /u1/tasks")]
    Browse {
        /// Route to open: \"/\" or \"/<user-id>/tasks\"
        #[arg(default_value = "/")]
        route: String,
    },
    /// Generate shell completions
    #[command(after_help = "EXAMPLES:
    todo completions bash > ~/.bash_completion.d/todo
    todo completions zsh > ~/.zfunc/_todo
    todo completions fish > ~/.config/fish/completions/todo.fish")]
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
    /// Initialize configuration file interactively
    #[command(after_help = "EXAMPLES:
    todo init")]
    Init,
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// List users
    #[command(alias = "ls")]
    List,
    /// Create a user
    Add {
        /// Email address
        email: String,
    },
    /// Delete a user
    #[command(alias = "delete")]
    Rm {
        /// User ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// List a user's tasks
    #[command(alias = "ls")]
    List(TaskListArgs),
    /// Create a task
    Add {
        /// Owner's user ID
        user_id: String,
        /// Task title
        title: String,
    },
    /// Mark a task as done
    Done {
        /// Task ID
        id: String,
        /// Mark as not done instead
        #[arg(long)]
        undo: bool,
    },
    /// Delete a task
    #[command(alias = "delete")]
    Rm {
        /// Task ID
        id: String,
    },
}

#[derive(Args, Clone)]
pub struct TaskListArgs {
    /// Owner's user ID
    pub user_id: String,

    /// Page number
    #[arg(long, short, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,

    /// Tasks per page (defaults to per_page from config)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub per_page: Option<u32>,

    /// Only tasks whose title contains this text
    #[arg(long, short)]
    pub search: Option<String>,

    /// Sort by creation time
    #[arg(long, value_enum, default_value = "asc")]
    pub sort: SortOrder,
}

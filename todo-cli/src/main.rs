mod client;
mod models;
mod token;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};

use crate::client::ApiClient;
use crate::models::{Category, Todo};
use crate::token::MintOptions;

/// Command-line client for the to-do API.
#[derive(Parser, Debug)]
#[command(name = "todo-cli", version, about)]
struct Cli {
    /// API base URL
    #[arg(long, env = "TODO_API_URL", default_value = "http://localhost:3000", global = true)]
    base_url: String,

    /// Bearer token sent with every API call
    #[arg(long, env = "TODO_API_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage to-do items
    #[command(subcommand)]
    Todos(TodosCommand),
    /// Manage categories
    #[command(subcommand)]
    Categories(CategoriesCommand),
    /// Development tokens
    #[command(subcommand)]
    Token(TokenCommand),
}

#[derive(Subcommand, Debug)]
enum TodosCommand {
    /// List items, newest first (incomplete ones unless --done)
    List {
        #[arg(long, default_value_t = false)]
        done: bool,
        /// Only items in this category (by name)
        #[arg(long)]
        category: Option<String>,
    },
    /// Add an incomplete item
    Add {
        content: String,
        #[arg(long)]
        category: Option<String>,
    },
    Show {
        id: String,
    },
    /// Change the content or category of an item
    Edit(EditArgs),
    Complete {
        id: String,
    },
    Uncomplete {
        id: String,
    },
    Delete {
        id: String,
    },
}

#[derive(Args, Debug)]
struct EditArgs {
    id: String,
    #[arg(long)]
    content: Option<String>,
    #[arg(long, conflicts_with = "no_category")]
    category: Option<String>,
    /// Remove the item from its category
    #[arg(long, default_value_t = false)]
    no_category: bool,
}

#[derive(Subcommand, Debug)]
enum CategoriesCommand {
    List,
    Add { name: String },
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    /// Sign an HS256 token for a local server
    Mint {
        #[arg(long)]
        sub: String,
        #[arg(long, env = "AUTH_JWT_SECRET", hide_env_values = true)]
        secret: String,
        #[arg(long, default_value_t = 3600)]
        ttl_seconds: i64,
        #[arg(long)]
        issuer: Option<String>,
        #[arg(long)]
        audience: Option<String>,
    },
    /// Print a token's header and claims (no signature check)
    Inspect { token: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Token(cmd) => run_token(cmd),
        Command::Todos(cmd) => run_todos(&api(&cli.base_url, cli.token)?, cmd).await,
        Command::Categories(cmd) => run_categories(&api(&cli.base_url, cli.token)?, cmd).await,
    }
}

fn api(base_url: &str, token: Option<String>) -> Result<ApiClient> {
    let token = token.context("a token is required (--token or TODO_API_TOKEN)")?;
    ApiClient::new(base_url, token)
}

async fn run_todos(api: &ApiClient, cmd: TodosCommand) -> Result<()> {
    match cmd {
        TodosCommand::List { done, category } => {
            let category_id = match category {
                Some(name) => Some(api.category_id(&name).await?),
                None => None,
            };
            for todo in api.list_todos(Some(done), category_id.as_deref()).await? {
                println!("{}", todo_line(&todo));
            }
        }
        TodosCommand::Add { content, category } => {
            let category_id = match category {
                Some(name) => Some(api.category_id(&name).await?),
                None => None,
            };
            let todo = api.add_todo(&content, category_id.as_deref()).await?;
            println!("{}", todo_line(&todo));
        }
        TodosCommand::Show { id } => {
            let todo = api.get_todo(&id).await?;
            println!("{}", serde_json::to_string_pretty(&todo)?);
        }
        TodosCommand::Edit(args) => {
            let mut changes = Map::new();
            if let Some(content) = args.content {
                changes.insert("content".to_string(), Value::String(content));
            }
            if let Some(name) = args.category {
                let category_id = api.category_id(&name).await?;
                changes.insert("categoryID".to_string(), Value::String(category_id));
            } else if args.no_category {
                changes.insert("categoryID".to_string(), Value::Null);
            }
            if changes.is_empty() {
                bail!("nothing to change (use --content, --category or --no-category)");
            }

            let todo = api.update_todo(&args.id, &Value::Object(changes)).await?;
            println!("{}", todo_line(&todo));
        }
        TodosCommand::Complete { id } => {
            let todo = api.get_todo(&id).await?;
            println!("{}", todo_line(&api.set_completeness(todo, true).await?));
        }
        TodosCommand::Uncomplete { id } => {
            let todo = api.get_todo(&id).await?;
            println!("{}", todo_line(&api.set_completeness(todo, false).await?));
        }
        TodosCommand::Delete { id } => {
            api.delete_todo(&id).await?;
            println!("deleted {}", id);
        }
    }

    Ok(())
}

async fn run_categories(api: &ApiClient, cmd: CategoriesCommand) -> Result<()> {
    match cmd {
        CategoriesCommand::List => {
            for category in api.list_categories(None).await? {
                println!("{}", category_line(&category));
            }
        }
        CategoriesCommand::Add { name } => {
            println!("{}", category_line(&api.add_category(&name).await?));
        }
        CategoriesCommand::Delete { id } => {
            api.delete_category(&id).await?;
            println!("deleted {}", id);
        }
    }

    Ok(())
}

fn run_token(cmd: TokenCommand) -> Result<()> {
    match cmd {
        TokenCommand::Mint {
            sub,
            secret,
            ttl_seconds,
            issuer,
            audience,
        } => {
            let opts = MintOptions {
                sub: &sub,
                secret: &secret,
                ttl_seconds,
                issuer: issuer.as_deref(),
                audience: audience.as_deref(),
            };
            println!("{}", token::mint(&opts, chrono::Utc::now().timestamp())?);
        }
        TokenCommand::Inspect { token } => {
            println!("{}", serde_json::to_string_pretty(&token::inspect(&token)?)?);
        }
    }

    Ok(())
}

fn todo_line(todo: &Todo) -> String {
    let mark = if todo.is_done { "x" } else { " " };
    let line = format!("[{}] {}  {} ({})", mark, todo.id, todo.content, todo.created_at);
    match &todo.category_id {
        Some(category) => format!("{}  #{}", line, category),
        None => line,
    }
}

fn category_line(category: &Category) -> String {
    format!("{}  {} ({})", category.id, category.name, category.created_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn edit_category_flags_conflict() {
        let parsed = Cli::try_parse_from([
            "todo-cli", "todos", "edit", "abc", "--category", "Work", "--no-category",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn todo_lines_show_completion() {
        let todo = Todo {
            id: "86Rf07xd4z".into(),
            creator_id: "user_1".into(),
            content: "Buy milk".into(),
            is_done: true,
            created_at: "2024-05-01T12:00:00.000Z".into(),
            category_id: None,
        };
        assert_eq!(
            todo_line(&todo),
            "[x] 86Rf07xd4z  Buy milk (2024-05-01T12:00:00.000Z)"
        );
    }

    #[test]
    fn category_lines_show_creation_time() {
        let category = Category {
            id: "Uk3pQ0a9Zb".into(),
            name: "Work".into(),
            created_at: "2024-05-01T12:00:00.000Z".into(),
        };
        assert_eq!(
            category_line(&category),
            "Uk3pQ0a9Zb  Work (2024-05-01T12:00:00.000Z)"
        );
    }
}

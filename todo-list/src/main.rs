use clap::{Parser, Subcommand};
use todo_list::config::ClientConfig;
use todo_list::notify::TracingNotifier;
use todo_list::{HttpTodoRepository, NewTodo, TodoListPipeline, TodoRecord, TodoRepository};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Browse and create todos")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
enum Commands {
    /// List todos, optionally narrowed by owner and category
    List {
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Show a single todo
    Show { id: String },
    /// Create a todo
    Add {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        body: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        status: Option<bool>,
    },
}

fn print_todo(todo: &TodoRecord) {
    let mark = if todo.status { "x" } else { " " };
    println!(
        "[{}] {} ({}, {}): {}",
        mark, todo.id, todo.owner, todo.category, todo.body
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("todo_list=info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Cli::parse();
    let config = ClientConfig::load()?;
    let repository = HttpTodoRepository::from_config(&config)?;
    info!("Using todos at {}", repository.todos_url());

    match args.command {
        Commands::List { owner, category } => {
            let pipeline = TodoListPipeline::new(
                repository,
                TracingNotifier,
                config.notification.clone(),
            )?;
            pipeline.set_owner_filter(owner);
            pipeline.set_category_filter(category);
            if pipeline.criteria().is_unset() {
                pipeline.refresh();
            }
            let view = pipeline.settled().await;
            view.todos.iter().for_each(print_todo);
            info!("{} todos shown", view.todos.len());
        }
        Commands::Show { id } => match repository.get_by_id(&id).await? {
            Some(todo) => print_todo(&todo),
            None => println!("No todo with id {}", id),
        },
        Commands::Add {
            owner,
            body,
            category,
            status,
        } => {
            let mut todo = NewTodo::new(owner, body, category);
            todo.status = status;
            let id = repository.create(&todo).await?;
            println!("Todo added with ID {}", id);
        }
    }

    Ok(())
}

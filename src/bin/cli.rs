//! SelfHub CLI
//!
//! Command-line interface for memory management.

use clap::{Parser, Subcommand};

use selfhub::error::{HubError, Result};
use selfhub::query::Page;
use selfhub::seed::seed_sample_data;
use selfhub::types::*;
use selfhub::MemoryHub;

#[derive(Parser)]
#[command(name = "selfhub")]
#[command(about = "Personal memory hub CLI")]
#[command(version)]
struct Cli {
    /// Database path
    #[arg(
        long,
        env = "SELFHUB_DB_PATH",
        default_value = "~/.local/share/selfhub/selfhub.db"
    )]
    db_path: String,

    /// Storage mode (local or cloud-safe)
    #[arg(long, env = "SELFHUB_STORAGE_MODE", default_value = "local")]
    storage_mode: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a new memory
    Store {
        /// Content to remember
        content: String,
        /// Memory type (short-term, long-term, contextual)
        #[arg(short, long)]
        r#type: Option<String>,
        /// Category
        #[arg(short, long)]
        category: Option<String>,
        /// Title
        #[arg(long)]
        title: Option<String>,
        /// Tags (comma-separated)
        #[arg(short = 'T', long)]
        tags: Option<String>,
        /// Importance (1-5)
        #[arg(short, long)]
        importance: Option<i64>,
        /// Context to link into
        #[arg(long)]
        context: Option<String>,
    },
    /// Get a memory by ID
    Get {
        /// Memory ID
        id: String,
    },
    /// List memories
    List {
        /// Maximum number to return
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Filter by tags (comma-separated, any match)
        #[arg(short = 'T', long)]
        tags: Option<String>,
        /// Filter by type
        #[arg(short, long)]
        r#type: Option<String>,
        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,
        /// Filter by context ID
        #[arg(long)]
        context: Option<String>,
    },
    /// Search memories
    Search {
        /// Search query
        query: String,
        /// Maximum results
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
    /// Delete a memory
    Delete {
        /// Memory ID
        id: String,
    },
    /// Create a context
    ContextCreate {
        /// Context name
        name: String,
        /// Context type (project, conversation, topic, temporal)
        #[arg(short, long, default_value = "project")]
        r#type: String,
        /// Description
        #[arg(short, long)]
        description: Option<String>,
        /// Tags (comma-separated)
        #[arg(short = 'T', long)]
        tags: Option<String>,
    },
    /// List contexts
    ContextList {
        /// Only show the active context
        #[arg(long)]
        active: bool,
    },
    /// Activate a context
    ContextActivate {
        /// Context ID
        id: String,
    },
    /// Link a memory into a context
    Link {
        /// Context ID
        context_id: String,
        /// Memory ID
        memory_id: String,
    },
    /// Show statistics
    Stats,
    /// Insert the sample data set
    Seed,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Expand ~ in path
    let db_path = shellexpand::tilde(&cli.db_path).to_string();
    let storage_mode: StorageMode = cli.storage_mode.parse().map_err(HubError::Config)?;

    let config = StorageConfig {
        backend: BackendKind::Sqlite,
        db_path,
        storage_mode,
    };
    let hub = MemoryHub::open(&config)?;

    match cli.command {
        Commands::Store {
            content,
            r#type,
            category,
            title,
            tags,
            importance,
            context,
        } => {
            let input = CreateMemoryInput {
                content,
                memory_type: parse_opt(r#type)?,
                category: parse_opt(category)?,
                metadata: MetadataPatch {
                    title,
                    tags: split_tags(tags),
                    importance,
                    ..Default::default()
                },
                context_id: context,
                encrypt: false,
            };

            let memory = hub.store_memory(input)?;
            println!("Stored memory {}", memory.id);
            println!("{}", serde_json::to_string_pretty(&memory)?);
        }

        Commands::Get { id } => {
            let memory = hub.retrieve_memory(&id)?;
            println!("{}", serde_json::to_string_pretty(&memory)?);
        }

        Commands::List {
            limit,
            tags,
            r#type,
            category,
            context,
        } => {
            let input = ListMemoriesInput {
                memory_type: parse_opt(r#type)?,
                category: parse_opt(category)?,
                tags: split_tags(tags),
                context_id: context,
                limit: Some(limit),
                ..Default::default()
            };

            let page = hub.list_memories(input)?;
            for memory in &page.items {
                println!(
                    "{} [{}/{}] {} - {}",
                    memory.id,
                    memory.memory_type,
                    memory.category,
                    memory.metadata.tags.join(", "),
                    truncate(&memory.content, 60)
                );
            }
            print_footer(&page);
        }

        Commands::Search { query, limit } => {
            let page = hub.search_memories(SearchMemoriesInput {
                query,
                limit: Some(limit),
                ..Default::default()
            })?;

            for hit in &page.items {
                println!(
                    "{} ({}) - {}",
                    hit.memory.id,
                    hit.relevance.as_str(),
                    truncate(&hit.memory.content, 60)
                );
            }
            print_footer(&page);
        }

        Commands::Delete { id } => {
            if hub.delete_memory(&id)? {
                println!("Deleted memory {}", id);
            } else {
                println!("Memory not found: {}", id);
            }
        }

        Commands::ContextCreate {
            name,
            r#type,
            description,
            tags,
        } => {
            let context_type: ContextType = r#type.parse().map_err(HubError::Validation)?;
            let context = hub.create_context(CreateContextInput {
                name,
                context_type,
                description,
                tags: split_tags(tags),
                memory_ids: None,
            })?;
            println!("Created context {} ({})", context.id, context.name);
        }

        Commands::ContextList { active } => {
            let filter = ContextFilter {
                active: active.then_some(true),
                ..Default::default()
            };
            for context in hub.list_contexts(&filter)? {
                println!(
                    "{}{} [{}] {} ({} memories)",
                    if context.is_active() { "* " } else { "  " },
                    context.id,
                    context.context_type,
                    context.name,
                    context.memory_ids.len()
                );
            }
        }

        Commands::ContextActivate { id } => {
            let context = hub.activate_context(&id)?;
            println!("Activated context {} ({})", context.id, context.name);
            for memory in hub.get_context_memories(&context.id)? {
                println!("  {} - {}", memory.id, truncate(&memory.content, 60));
            }
        }

        Commands::Link {
            context_id,
            memory_id,
        } => {
            let context = hub.add_memory_to_context(&context_id, &memory_id)?;
            println!(
                "Linked {} -> {} ({} memories)",
                memory_id,
                context.id,
                context.memory_ids.len()
            );
        }

        Commands::Stats => {
            let stats = hub.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }

        Commands::Seed => {
            let summary = seed_sample_data(&hub)?;
            println!(
                "Seeded {} memories and {} contexts ({} already present)",
                summary.memories_created,
                summary.contexts_created,
                summary.memories_skipped + summary.contexts_skipped
            );
        }
    }

    Ok(())
}

fn parse_opt<T>(value: Option<String>) -> Result<Option<T>>
where
    T: std::str::FromStr<Err = String>,
{
    value
        .map(|v| v.parse().map_err(HubError::Validation))
        .transpose()
}

fn split_tags(tags: Option<String>) -> Option<Vec<String>> {
    tags.map(|t| {
        t.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}

fn print_footer<T>(page: &Page<T>) {
    println!("-- showing {} of {}", page.len(), page.total);
}

fn truncate(s: &str, max: usize) -> String {
    let first_line = s.lines().next().unwrap_or(s);
    if first_line.chars().count() <= max {
        first_line.to_string()
    } else {
        let cut: String = first_line.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

//! Taskdeck CLI - Command-line interface for the search server

use anyhow::{Context, Result};
use taskdeck_client::TaskdeckClient;
use taskdeck_core::{WorkspaceId, WorkspaceSnapshot};
use taskdeck_search::SearchQuery;
use taskdeck_session::{IndexStatus, ReindexOutcome, SearchResponse};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("taskdeck=info".parse()?))
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    let command = &args[1];

    match command.as_str() {
        "help" | "--help" | "-h" => print_help(),
        "server" => run_server().await?,
        "index" => {
            if args.len() < 3 {
                eprintln!("Usage: taskdeck-cli index <snapshot.json>");
                return Ok(());
            }
            index(&args[2]).await?;
        }
        "search" => {
            if args.len() < 3 {
                eprintln!("Usage: taskdeck-cli search <query> [workspace-id...]");
                return Ok(());
            }
            search(&args[2], &args[3..]).await?;
        }
        "quick" => {
            if args.len() < 3 {
                eprintln!("Usage: taskdeck-cli quick <text>");
                return Ok(());
            }
            quick(&args[2]).await?;
        }
        "remove-workspace" => {
            if args.len() < 3 {
                eprintln!("Usage: taskdeck-cli remove-workspace <workspace-id>");
                return Ok(());
            }
            remove_workspace(&args[2]).await?;
        }
        "recent" => recent().await?,
        "clear-recent" => clear_recent().await?,
        "reindex" => reindex().await?,
        "stats" => stats().await?,
        "clear" => clear().await?,
        _ => {
            eprintln!("Unknown command: {}", command);
            print_help();
        }
    }

    Ok(())
}

fn print_help() {
    println!(
        r#"Taskdeck CLI - Workspace search

USAGE:
    taskdeck-cli <COMMAND> [OPTIONS]

COMMANDS:
    help              Show this help message
    server            Start the Taskdeck search server
    index             Index a workspace snapshot (JSON file)
    search            Search, optionally within some workspaces
    quick             Title-only autocomplete
    remove-workspace  Drop a workspace from the index
    recent            List recent searches
    clear-recent      Forget recent searches
    reindex           Rebuild the index from the last pushed snapshots
    stats             Show what the index holds
    clear             Empty the index

ENVIRONMENT:
    TASKDECK_SERVER   Server URL for client commands (default http://127.0.0.1:9877)
    TASKDECK_ADDR     Bind address for `server` (default 127.0.0.1:9877)
    TASKDECK_DATA_DIR Directory for persisted recent searches (`server`)

EXAMPLES:
    taskdeck-cli server
    taskdeck-cli index ./team-workspace.json
    taskdeck-cli search "release plan" team-ws
    taskdeck-cli quick rel
"#
    );
}

async fn run_server() -> Result<()> {
    use taskdeck_server::{run_server, ServerConfig};

    let config = ServerConfig::from_env()?;
    println!("Starting Taskdeck server on {}...", config.addr);
    run_server(config).await?;
    Ok(())
}

async fn index(path: &str) -> Result<()> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path))?;
    let snapshot = WorkspaceSnapshot::from_json(&json)?;
    let workspace = snapshot.workspace.clone();

    let client = connect().await?;
    match client.index_workspace(snapshot).await? {
        ReindexOutcome::Applied { records } => {
            println!("Indexed {} records for {} ({})", records, workspace.name, workspace.id);
        }
        ReindexOutcome::Discarded => {
            println!("Snapshot for {} was superseded by a newer update", workspace.id);
        }
    }
    Ok(())
}

async fn search(text: &str, workspaces: &[String]) -> Result<()> {
    let client = connect().await?;
    let query = SearchQuery::new(text)
        .with_workspaces(workspaces.iter().map(|w| WorkspaceId::from(w.as_str())).collect());
    let response = client.search(query).await?;
    print_results(&response);
    Ok(())
}

async fn quick(text: &str) -> Result<()> {
    let client = connect().await?;
    let response = client.quick_search(text).await?;
    print_results(&response);
    Ok(())
}

fn print_results(response: &SearchResponse) {
    if response.results.is_empty() {
        println!("No results");
        return;
    }

    println!("{} of {} results:", response.results.len(), response.total);
    for result in &response.results {
        println!(
            "  [{}] {} ({}, score {:.1})",
            result.kind, result.title, result.workspace_name, result.score
        );
        if let Some(ref snippet) = result.snippet {
            println!("      {}", snippet);
        }
    }
}

async fn remove_workspace(workspace_id: &str) -> Result<()> {
    let client = connect().await?;
    let removed = client.remove_workspace(workspace_id.into()).await?;
    println!("Removed {} records", removed);
    Ok(())
}

async fn recent() -> Result<()> {
    let client = connect().await?;
    let searches = client.recent_searches().await?;

    if searches.is_empty() {
        println!("No recent searches");
    } else {
        for search in searches {
            println!("  {}", search);
        }
    }
    Ok(())
}

async fn clear_recent() -> Result<()> {
    let client = connect().await?;
    client.clear_recent_searches().await?;
    println!("Cleared recent searches");
    Ok(())
}

async fn reindex() -> Result<()> {
    let client = connect().await?;
    let report = client.reindex_all().await?;

    println!(
        "Reindexed {} workspaces ({} records)",
        report.indexed.len(),
        report.records
    );
    for failure in &report.failures {
        println!("  failed: {} - {}", failure.workspace_id, failure.message);
    }
    for workspace_id in &report.discarded {
        println!("  superseded: {}", workspace_id);
    }
    Ok(())
}

async fn stats() -> Result<()> {
    let client = connect().await?;
    let response = client.index_stats().await?;

    println!("Records: {}", response.stats.total);
    for (kind, count) in &response.stats.by_kind {
        println!("  {}: {}", kind, count);
    }

    if response.workspaces.is_empty() {
        println!("No workspaces");
        return Ok(());
    }
    println!("Workspaces:");
    for info in &response.workspaces {
        let status = match &info.status {
            IndexStatus::Pending => "pending".to_string(),
            IndexStatus::Indexed { records } => format!("{} records", records),
            IndexStatus::Failed { message } => format!("failed: {}", message),
        };
        println!("  {} - {} ({})", info.workspace.id, info.workspace.name, status);
    }
    Ok(())
}

async fn clear() -> Result<()> {
    let client = connect().await?;
    client.clear_index().await?;
    println!("Cleared search index");
    Ok(())
}

async fn connect() -> Result<TaskdeckClient> {
    let url = std::env::var("TASKDECK_SERVER").unwrap_or_else(|_| "http://127.0.0.1:9877".to_string());
    let client = TaskdeckClient::connect(&url).await?;
    Ok(client)
}

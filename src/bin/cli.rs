use anyhow::{Context, Result};
use ccpm_timeline::persistence::{load_graph_config, load_project_from_json, load_tasks_from_csv};
use ccpm_timeline::{GraphConfig, TaskGraph, render_table};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Parser)]
#[command(name = "ccpm-timeline")]
#[command(version, about = "Resolve a CCPM project file into a dated task graph")]
struct Cli {
    /// Project JSON file with `project_info` and `tasks`
    project: PathBuf,

    /// Read tasks from this CSV table instead of the project file
    #[arg(long)]
    tasks_csv: Option<PathBuf>,

    /// JSON file with critical chain labels and palette
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, short = 'f', default_value = "table")]
    format: OutputFormat,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let mut input = load_project_from_json(&cli.project)
        .with_context(|| format!("failed to load project {}", cli.project.display()))?;
    if let Some(path) = &cli.tasks_csv {
        input.tasks = load_tasks_from_csv(path)
            .with_context(|| format!("failed to load tasks {}", path.display()))?;
    }
    let config = match &cli.config {
        Some(path) => load_graph_config(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => GraphConfig::default(),
    };
    log::info!(
        "loaded {} tasks for {}",
        input.tasks.len(),
        input.info.display_name()
    );

    let graph = input
        .build_with(&config)
        .context("failed to build task graph")?;

    match cli.format {
        OutputFormat::Table => print_table(&graph)?,
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&graph.export())?;
            println!("{json}");
        }
    }
    Ok(())
}

fn print_table(graph: &TaskGraph) -> Result<()> {
    println!("{}", graph.chart_title());
    let start = graph.start_sentinel();
    let end = graph.end_sentinel();
    println!(
        "Calendar: {} | START {} ({}) | END {} ({})",
        graph.calendar().mode(),
        start.id,
        start.marker.format("%Y-%m-%d %H:%M"),
        end.id,
        end.marker.format("%Y-%m-%d %H:%M"),
    );

    let df = graph.to_dataframe()?;
    print!("{}", render_table(&df));

    println!("Chains:");
    for (lane, group) in graph.chain_groups().iter().enumerate() {
        let ids: Vec<String> = group.tasks.iter().map(|id| id.to_string()).collect();
        let marker = if group.is_critical { " [critical]" } else { "" };
        println!("  {lane}: {}{marker} -> {}", group.label, ids.join(", "));
    }
    Ok(())
}

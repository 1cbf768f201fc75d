use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use serde_json::{json, Value};
use stow_engine::{GraphStore, IdPattern, ObjectId, Registry, Serializable, Store};
use stow_family::{Model, Person};
use stow_store::FileStore;

use crate::cli::*;
use crate::config::StowConfig;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = StowConfig::resolve(cli.config.as_deref(), cli.root.as_deref())?;
    let graph = open(&config)?;
    let format = cli.format;
    match cli.command {
        Command::Ids(args) => cmd_ids(&graph, &config, args, format).await,
        Command::Show(args) => cmd_show(&graph, args, format).await,
        Command::Demo => cmd_demo(&graph, format).await,
        Command::Tree(args) => cmd_tree(&graph, args, format).await,
    }
}

fn open(config: &StowConfig) -> anyhow::Result<GraphStore<FileStore>> {
    let store = FileStore::open(config.store.clone())
        .with_context(|| format!("opening store at {}", config.store.root.display()))?;
    let registry = Registry::new();
    stow_family::register(&registry)?;
    Ok(GraphStore::new(store, registry))
}

async fn cmd_ids(
    graph: &GraphStore<FileStore>,
    config: &StowConfig,
    args: IdsArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let pattern = args
        .pattern
        .or_else(|| config.root_pattern.clone())
        .map(|p| IdPattern::new(&p))
        .transpose()?;
    let ids = graph.get_ids(pattern.as_ref()).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&ids)?),
        OutputFormat::Text if ids.is_empty() => println!("No records."),
        OutputFormat::Text => {
            for id in &ids {
                println!("{}", id.as_str().yellow());
            }
        }
    }
    Ok(())
}

async fn cmd_show(
    graph: &GraphStore<FileStore>,
    args: ShowArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let id = ObjectId::new(args.id)?;
    let stowed = graph.store().get(&id).await?;
    let record = stowed.record;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
        OutputFormat::Text => {
            println!("{} {}", record.type_tag.bold(), record.id.as_str().yellow());
            println!("  schema: {}", record.schema.cyan());
            println!("  stow: {}", stowed.stow.to_string().dimmed());
            for (name, value) in &record.fields {
                println!("  {name}: {value}");
            }
        }
    }
    Ok(())
}

async fn cmd_demo(graph: &GraphStore<FileStore>, format: OutputFormat) -> anyhow::Result<()> {
    let model = stow_family::targaryen_model()?;
    let saved = graph.save(model.clone()).await?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "model": model.id(),
                "written": saved.written(),
            }))?
        ),
        OutputFormat::Text => {
            println!("{} Saved {} objects", "✓".green().bold(), saved.written());
            println!("  Model: {}", model.id().as_str().yellow());
        }
    }
    Ok(())
}

async fn cmd_tree(
    graph: &GraphStore<FileStore>,
    args: TreeArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let id = ObjectId::new(args.id)?;
    let loaded = graph.load(&id).await?;
    let model = loaded
        .root_as::<Model>()
        .with_context(|| format!("{id} is not a model"))?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&model_json(&model))?),
        OutputFormat::Text => {
            for line in tree_lines(&model) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

/// Indented ancestry, father before mother. A person already on the
/// current path is printed once more and not expanded.
fn tree_lines(model: &Model) -> Vec<String> {
    let mut lines = vec![format!("{} ({})", model.name().bold(), model.id())];
    if let Some(root) = model.root_person() {
        let mut path = Vec::new();
        push_person(&mut lines, root, "", 1, &mut path);
    }
    lines
}

fn push_person(
    lines: &mut Vec<String>,
    person: &Arc<Person>,
    role: &str,
    depth: usize,
    path: &mut Vec<ObjectId>,
) {
    let indent = "  ".repeat(depth);
    lines.push(format!("{indent}{role}{}", person.full_name()));
    if path.contains(person.id()) {
        return;
    }
    path.push(person.id().clone());
    if let Some(father) = person.father() {
        push_person(lines, &father, "father: ", depth + 1, path);
    }
    if let Some(mother) = person.mother() {
        push_person(lines, &mother, "mother: ", depth + 1, path);
    }
    path.pop();
}

fn model_json(model: &Model) -> Value {
    let mut path = Vec::new();
    json!({
        "id": model.id(),
        "name": model.name(),
        "rootPerson": model.root_person().map(|p| person_json(p, &mut path)),
    })
}

fn person_json(person: &Arc<Person>, path: &mut Vec<ObjectId>) -> Value {
    if path.contains(person.id()) {
        return json!({ "id": person.id() });
    }
    path.push(person.id().clone());
    let value = json!({
        "id": person.id(),
        "name": person.full_name(),
        "father": person.father().map(|p| person_json(&p, path)),
        "mother": person.mother().map(|p| person_json(&p, path)),
    });
    path.pop();
    value
}

/// CLI argument parsing and command handling.
use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};

use crate::projection;
use crate::store::Store;
use crate::suggest::{self, SuggestionRequest, SuggestionSource};
use crate::types::{
    BlockCategory, BlockId, BlockStatus, NewTimeBlock, Priority, PriorityDomain, PriorityId,
    TimeBlock, TimeBlockPatch, format_clock, parse_clock,
};

#[derive(Parser)]
#[command(
    name = "dayplan",
    version,
    about = "Dayplan - A terminal day planner built around weighted priorities"
)]
pub struct Cli {
    /// Path to config.toml (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Path to the database file
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage the day's time blocks
    Block {
        #[command(subcommand)]
        command: BlockCommand,
    },
    /// Print the hour-by-hour timeline
    Day,
    /// Finish onboarding with an initial set of priorities
    Onboard {
        #[arg(
            short = 'p',
            long = "priority",
            value_name = "DOMAIN:NAME[:WEIGHT]",
            required = true
        )]
        priorities: Vec<String>,
    },
    /// Manage weighted priorities
    Priority {
        #[command(subcommand)]
        command: PriorityCommand,
    },
    /// Ask the suggestion service for a day plan
    Suggest {
        /// Free-text hint passed along with the priorities
        #[arg(long)]
        hint: Option<String>,
        /// Add the suggested blocks to the day
        #[arg(long)]
        apply: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum BlockCommand {
    Add {
        title: String,
        #[arg(short = 's', long = "start", value_parser = clock_arg)]
        start: String,
        #[arg(short = 'e', long = "end", value_parser = clock_arg)]
        end: String,
        #[arg(short = 'c', long = "category", default_value = "focus")]
        category: BlockCategory,
        #[arg(long)]
        status: Option<BlockStatus>,
    },
    List,
    /// Mark a block as completed
    Done { id: String },
    /// Mark a block as distracted
    Distracted { id: String },
    /// Reset a block to planned
    Plan { id: String },
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(short = 'c', long = "category")]
        category: Option<BlockCategory>,
        #[arg(short = 's', long = "start", value_parser = clock_arg)]
        start: Option<String>,
        #[arg(short = 'e', long = "end", value_parser = clock_arg)]
        end: Option<String>,
    },
    Delete { id: String },
    /// Remove every block
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum PriorityCommand {
    List,
    Add {
        domain: PriorityDomain,
        name: String,
        #[arg(short = 'w', long = "weight")]
        weight: Option<i64>,
    },
    Weight { id: String, weight: i64 },
    Remove { id: String },
}

/// Execute a CLI command against the store.
pub fn run(command: Command, store: &mut Store, source: &dyn SuggestionSource) -> Result<()> {
    match command {
        Command::Block { command } => run_block(command, store),
        Command::Day => print_day(store),
        Command::Onboard { priorities } => handle_onboard(priorities, store)?,
        Command::Priority { command } => run_priority(command, store),
        Command::Suggest { hint, apply } => handle_suggest(hint, apply, store, source),
    }
    Ok(())
}

fn run_block(command: BlockCommand, store: &mut Store) {
    match command {
        BlockCommand::Add {
            title,
            start,
            end,
            category,
            status,
        } => handle_block_add(title, start, end, category, status, store),
        BlockCommand::List => print_blocks(store),
        BlockCommand::Done { id } => handle_status(&id, BlockStatus::Completed, store),
        BlockCommand::Distracted { id } => handle_status(&id, BlockStatus::Distracted, store),
        BlockCommand::Plan { id } => handle_status(&id, BlockStatus::Planned, store),
        BlockCommand::Edit {
            id,
            title,
            category,
            start,
            end,
        } => handle_block_edit(
            &id,
            TimeBlockPatch {
                title,
                category,
                start_time: start,
                end_time: end,
                status: None,
            },
            store,
        ),
        BlockCommand::Delete { id } => {
            if let Some(id) = resolve_block(store, &id) {
                store.delete_time_block(id);
                println!("Deleted block {}", short_id(id));
            }
        }
        BlockCommand::Clear => {
            let count = store.blocks().len();
            store.clear_time_blocks();
            println!("Removed {count} block(s).");
        }
    }
}

fn handle_block_add(
    title: String,
    start: String,
    end: String,
    category: BlockCategory,
    status: Option<BlockStatus>,
    store: &mut Store,
) {
    let title = title.trim().to_string();
    if title.is_empty() {
        println!("Title cannot be empty.");
        return;
    }
    if !starts_before(&start, &end) {
        println!("Start time must be before end time.");
        return;
    }
    let id = store.add_time_block(NewTimeBlock {
        title,
        category,
        start_time: start,
        end_time: end,
        status,
    });
    println!("Added block {}", short_id(id));
}

fn handle_status(id: &str, status: BlockStatus, store: &mut Store) {
    if let Some(id) = resolve_block(store, id) {
        store.update_time_block(id, TimeBlockPatch::status(status));
        println!("Block {} is now {status}", short_id(id));
    }
}

fn handle_block_edit(id: &str, mut patch: TimeBlockPatch, store: &mut Store) {
    let Some(id) = resolve_block(store, id) else {
        return;
    };
    if patch.is_empty() {
        println!("Nothing to change.");
        return;
    }
    if let Some(title) = patch.title.take() {
        let title = title.trim().to_string();
        if title.is_empty() {
            println!("Title cannot be empty.");
            return;
        }
        patch.title = Some(title);
    }
    if let Some(current) = store.block(id) {
        let start = patch.start_time.as_deref().unwrap_or(&current.start_time);
        let end = patch.end_time.as_deref().unwrap_or(&current.end_time);
        if !starts_before(start, end) {
            println!("Start time must be before end time.");
            return;
        }
    }
    store.update_time_block(id, patch);
    println!("Updated block {}", short_id(id));
}

fn print_blocks(store: &Store) {
    if store.blocks().is_empty() {
        println!("No blocks planned.");
        return;
    }
    for block in store.blocks() {
        println!("{}", block_line(block));
    }
}

fn print_day(store: &Store) {
    for slot in projection::day_slots(store.blocks()) {
        let label = format!("{:02}:00", slot.hour);
        match slot.block {
            Some(block) if slot.is_block_start => {
                let span = projection::span_height(block).unwrap_or(1);
                println!(
                    "{label}  {} [{}] ({}) {span}h",
                    block.title,
                    block.category.label(),
                    block.status
                );
            }
            Some(_) => println!("{label}    |"),
            None => println!("{label}  ."),
        }
    }
}

fn handle_onboard(raw: Vec<String>, store: &mut Store) -> Result<()> {
    if store.profile().has_completed_onboarding {
        println!("Onboarding is already complete. Use `dayplan priority` to edit priorities.");
        return Ok(());
    }
    let priorities = raw
        .iter()
        .map(|value| parse_priority_arg(value))
        .collect::<Result<Vec<_>, _>>()
        .map_err(anyhow::Error::msg)?;
    let count = priorities.len();
    store.complete_onboarding(priorities);
    println!("Onboarding complete with {count} priorities.");
    Ok(())
}

fn run_priority(command: PriorityCommand, store: &mut Store) {
    match command {
        PriorityCommand::List => {
            if store.profile().priorities.is_empty() {
                println!("No priorities yet.");
            }
            for priority in &store.profile().priorities {
                println!(
                    "{}  {:<13} {} (weight {})",
                    short_id(priority.id),
                    priority.domain.label(),
                    priority.name,
                    priority.weight
                );
            }
        }
        PriorityCommand::Add {
            domain,
            name,
            weight,
        } => {
            let name = name.trim().to_string();
            if name.is_empty() {
                println!("Priority name cannot be empty.");
                return;
            }
            let id = store.add_priority(domain, name);
            if let Some(weight) = weight {
                store.set_priority_weight(id, weight);
            }
            println!("Added priority {}", short_id(id));
        }
        PriorityCommand::Weight { id, weight } => {
            if let Some(id) = resolve_priority(store, &id) {
                store.set_priority_weight(id, weight);
                println!("Updated priority {}", short_id(id));
            }
        }
        PriorityCommand::Remove { id } => {
            if let Some(id) = resolve_priority(store, &id) {
                store.remove_priority(id);
                println!("Removed priority {}", short_id(id));
            }
        }
    }
}

fn handle_suggest(
    hint: Option<String>,
    apply: bool,
    store: &mut Store,
    source: &dyn SuggestionSource,
) {
    let request = SuggestionRequest {
        priorities: store.profile().priorities.clone(),
        voice_input: hint.filter(|h| !h.trim().is_empty()),
        current_time: Some(Local::now().format("%H:%M").to_string()),
    };
    let outcome = suggest::fetch_or_fallback(source, &request);
    if let Some(notice) = &outcome.notice {
        println!("{notice}");
    }
    if !outcome.used_fallback {
        println!("Suggested plan:");
    }
    for block in &outcome.blocks {
        println!(
            "{}-{}  {} [{}]",
            block.start_time,
            block.end_time,
            block.title,
            block.category.label()
        );
    }
    if apply {
        let count = outcome.blocks.len();
        for block in outcome.blocks {
            store.add_time_block(block);
        }
        println!("Added {count} block(s).");
    }
}

fn resolve_block(store: &Store, prefix: &str) -> Option<BlockId> {
    let ids = store.blocks().iter().map(|block| block.id);
    resolve_prefix(ids, prefix, "Block")
}

fn resolve_priority(store: &Store, prefix: &str) -> Option<PriorityId> {
    let ids = store.profile().priorities.iter().map(|p| p.id);
    resolve_prefix(ids, prefix, "Priority")
}

fn resolve_prefix(
    ids: impl Iterator<Item = uuid::Uuid>,
    prefix: &str,
    kind: &str,
) -> Option<uuid::Uuid> {
    let prefix = prefix.trim().to_ascii_lowercase();
    let matches = ids
        .filter(|id| !prefix.is_empty() && id.to_string().starts_with(&prefix))
        .collect::<Vec<_>>();
    match matches.as_slice() {
        [id] => Some(*id),
        [] => {
            println!("{kind} '{prefix}' not found");
            None
        }
        _ => {
            println!("Multiple entries match '{prefix}', use a longer id");
            None
        }
    }
}

fn block_line(block: &TimeBlock) -> String {
    format!(
        "{}  {}-{}  {:<28} {:<12} {}",
        short_id(block.id),
        block.start_time,
        block.end_time,
        block.title,
        block.category.label(),
        block.status
    )
}

fn short_id(id: uuid::Uuid) -> String {
    id.to_string().chars().take(8).collect()
}

fn starts_before(start: &str, end: &str) -> bool {
    match (parse_clock(start), parse_clock(end)) {
        (Some(start), Some(end)) => start < end,
        _ => false,
    }
}

fn clock_arg(value: &str) -> Result<String, String> {
    parse_clock(value)
        .map(format_clock)
        .ok_or_else(|| format!("`{value}` is not a HH:mm time"))
}

fn parse_priority_arg(value: &str) -> Result<Priority, String> {
    let (domain, rest) = value
        .split_once(':')
        .ok_or_else(|| format!("`{value}` should look like DOMAIN:NAME[:WEIGHT]"))?;
    let domain = domain.parse::<PriorityDomain>()?;
    let (name, weight) = match rest.rsplit_once(':') {
        Some((name, weight)) => match weight.trim().parse::<i64>() {
            Ok(weight) => (name, Some(weight)),
            Err(_) => (rest, None),
        },
        None => (rest, None),
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("`{value}` has an empty priority name"));
    }
    let priority = Priority::new(domain, name);
    Ok(match weight {
        Some(weight) => priority.with_weight(weight),
        None => priority,
    })
}

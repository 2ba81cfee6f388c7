// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! CLI entry point for event-selector
//!
//! Provides command-line access for checking definitions, listing their
//! register/group/field tree, exporting selections and importing mask
//! files.

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use colored::*;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

use event_mask_selector::config::{write_atomic, EngineConfig};
use event_mask_selector::core::{
    BitState, Command, DiagnosticsReport, FieldIdx, MaskMode, NodeRef, SchemaModel,
    SelectionState, Severity,
};
use event_mask_selector::facade::{Facade, Session};
use event_mask_selector::logging::{self, LogLevel};

#[derive(Parser)]
#[command(name = "event-selector")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level
    #[arg(long = "debug", value_name = "LEVEL", global = true, default_value = "WARNING")]
    log_level: LogLevel,

    /// Engine settings file (YAML)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a definition and print its diagnostics
    Check {
        /// mk1 or mk2 definition file
        file: PathBuf,
    },

    /// Print the register/group/field tree
    List {
        /// mk1 or mk2 definition file
        file: PathBuf,

        /// Only show fields whose id or label matches this regex
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Select events and export the result
    Export {
        /// mk1 or mk2 definition file
        file: PathBuf,

        /// Field, group or register to select (repeatable)
        #[arg(short, long = "set", value_name = "ID")]
        set: Vec<String>,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Emit register mask words instead of the YAML document
        #[arg(short, long)]
        masks: bool,

        /// Select into this mask instead of the configured one
        #[arg(long, value_name = "MODE")]
        mode: Option<ModeArg>,
    },

    /// Load a mask file into a definition and export the result
    Import {
        /// mk1 or mk2 definition file
        file: PathBuf,

        /// Mask file (`<ID2> <VALUE8>` or `<ADDR8> <VALUE8>` lines)
        masks: PathBuf,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ModeArg {
    Event,
    Capture,
}

impl From<ModeArg> for MaskMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Event => MaskMode::EventMask,
            ModeArg::Capture => MaskMode::CaptureMask,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(cli.log_level).map_err(|e| anyhow!("Failed to initialise logging: {}", e))?;

    let config = match &cli.config {
        Some(path) => EngineConfig::load(&expand(path)?)?,
        None => EngineConfig::default(),
    };
    let facade = Facade::new(config);

    match cli.command {
        Commands::Check { file } => check_definition(&facade, &file)?,
        Commands::List { file, filter } => list_definition(&facade, &file, filter.as_deref())?,
        Commands::Export {
            file,
            set,
            output,
            masks,
            mode,
        } => export_selection(
            &facade,
            &file,
            &set,
            output.as_deref(),
            masks,
            mode.map(MaskMode::from),
        )?,
        Commands::Import {
            file,
            masks,
            output,
        } => import_masks(&facade, &file, &masks, output.as_deref())?,
    }

    Ok(())
}

/// Expands `~` in a user-supplied path
fn expand(path: &Path) -> anyhow::Result<PathBuf> {
    let expanded = shellexpand::tilde(
        path.to_str()
            .ok_or_else(|| anyhow!("Invalid path encoding"))?,
    );
    Ok(PathBuf::from(expanded.as_ref()))
}

fn load_session(facade: &Facade, file: &Path) -> anyhow::Result<(PathBuf, Session)> {
    let path = expand(file)?;
    let bytes = fs::read(&path).map_err(|e| anyhow!("Failed to read file: {}", e))?;
    let session = facade
        .load(&bytes)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    Ok((path, session))
}

/// Validate a definition file
fn check_definition(facade: &Facade, file: &Path) -> anyhow::Result<()> {
    let (path, session) = load_session(facade, file)?;
    let model = session.model();

    println!("{} Checking definition: {}", "→".cyan(), path.display());
    println!(
        "{} {} definition with {} register{}, {} field{}, {} group{}\n",
        "✓".green(),
        model.format(),
        model.list_registers().len(),
        plural(model.list_registers().len()),
        model.fields().len(),
        plural(model.fields().len()),
        model.groups().len(),
        plural(model.groups().len()),
    );

    let report = session.diagnostics();
    if report.is_empty() {
        println!("{} {}", "✓".green().bold(), "No problems found!".bold());
        return Ok(());
    }

    print_diagnostics(report);

    if report.has_errors() {
        println!(
            "\n{}",
            format!("✗ {} error(s) will block export", report.error_count()).red()
        );
        std::process::exit(1);
    }

    Ok(())
}

fn print_diagnostics(report: &DiagnosticsReport) {
    for diagnostic in report {
        let severity = match diagnostic.severity {
            Severity::Error => diagnostic.severity.to_string().red().bold(),
            Severity::Warning => diagnostic.severity.to_string().yellow().bold(),
            Severity::Info => diagnostic.severity.to_string().blue(),
        };
        let location = diagnostic.location.as_deref().unwrap_or("-");
        println!(
            "{} {} {} {}",
            severity,
            diagnostic.code.to_string().dimmed(),
            location.cyan(),
            diagnostic.message
        );
    }
}

/// Print the definition tree
fn list_definition(facade: &Facade, file: &Path, filter: Option<&str>) -> anyhow::Result<()> {
    let (path, session) = load_session(facade, file)?;
    let filter = filter
        .map(Regex::new)
        .transpose()
        .context("Invalid filter pattern")?;

    println!("{}", format!("Definition: {}\n", path.display()).bold());

    let model = session.model();
    for (i, register) in model.list_registers().iter().enumerate() {
        println!(
            "{} {} ({} bits)",
            format!("{:02X}", i).dimmed(),
            register.id.cyan().bold(),
            register.width
        );
        for node in model.top_level(model.register_idx(&register.id)?) {
            print_node(model, session.selection(), node, 1, filter.as_ref());
        }
    }

    Ok(())
}

fn print_node(
    model: &SchemaModel,
    selection: &SelectionState,
    node: NodeRef,
    depth: usize,
    filter: Option<&Regex>,
) {
    if filter.is_some_and(|filter| !node_matches(model, node, filter)) {
        return;
    }

    let indent = "  ".repeat(depth);
    let state = selection.node_state(node);
    match node {
        NodeRef::Group(idx) => {
            let group = model.group(idx);
            let exclusive = if group.exclusive { " (exclusive)" } else { "" };
            println!(
                "{}{} {} [{}] {}{}",
                indent,
                state,
                group.id.magenta().bold(),
                group.span,
                group.label,
                exclusive.dimmed()
            );
            for child in &group.children {
                print_node(model, selection, *child, depth + 1, filter);
            }
        }
        NodeRef::Field(idx) => {
            let field = model.field(idx);
            let deprecated = if field.attrs.deprecated { " (deprecated)" } else { "" };
            println!(
                "{}{} {} [{}] {}{}",
                indent,
                state,
                field.id.green(),
                field.range,
                field.label,
                deprecated.yellow()
            );
        }
    }
}

/// A field matches on id or label; a group matches through any descendant field
fn node_matches(model: &SchemaModel, node: NodeRef, filter: &Regex) -> bool {
    let field_matches = |idx: FieldIdx| {
        let field = model.field(idx);
        filter.is_match(&field.id) || filter.is_match(&field.label)
    };
    match node {
        NodeRef::Field(idx) => field_matches(idx),
        NodeRef::Group(idx) => model.group_leaves(idx).into_iter().any(field_matches),
    }
}

/// Apply selections and export
fn export_selection(
    facade: &Facade,
    file: &Path,
    ids: &[String],
    output: Option<&Path>,
    masks: bool,
    mode: Option<MaskMode>,
) -> anyhow::Result<()> {
    let (_, mut session) = load_session(facade, file)?;
    if let Some(mode) = mode {
        session.set_mode(mode);
    }

    for id in ids {
        let command = command_for(session.model(), id);
        facade.select(&mut session, &command)?;
    }

    let content = if masks {
        facade.export_masks(&session)?.into_bytes()
    } else {
        facade.export_selection(&session)?
    };

    write_output(&session, output, &content)
}

/// Load a mask file and export the resulting selection
fn import_masks(
    facade: &Facade,
    file: &Path,
    masks: &Path,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let (_, mut session) = load_session(facade, file)?;
    let masks = expand(masks)?;
    let bytes = fs::read(&masks).map_err(|e| anyhow!("Failed to read mask file: {}", e))?;

    let report = facade
        .import_masks(&mut session, &bytes)
        .with_context(|| format!("Failed to import {}", masks.display()))?;
    eprintln!(
        "{} Imported {} into the {}",
        "→".cyan(),
        masks.display(),
        session.mode()
    );
    for diagnostic in &report {
        eprintln!("{} {}", "!".yellow(), diagnostic);
    }

    let content = facade.export_selection(&session)?;
    write_output(&session, output, &content)
}

fn write_output(session: &Session, output: Option<&Path>, content: &[u8]) -> anyhow::Result<()> {
    match output {
        Some(output) => {
            let path = expand(output)?;
            write_atomic(&path, content)?;
            eprintln!(
                "{} Exported {} selected field{} to {}",
                "✓".green(),
                session.selection().selected_count(),
                plural(session.selection().selected_count()),
                path.display()
            );
        }
        None => print!("{}", String::from_utf8_lossy(content)),
    }

    Ok(())
}

/// Groups and registers select everything below them
fn command_for(model: &SchemaModel, id: &str) -> Command {
    if model.find_group(id).is_ok() {
        Command::set_group(id, BitState::Set)
    } else if model.find_register(id).is_ok() {
        Command::set_register(id, BitState::Set)
    } else {
        Command::set_leaf(id, BitState::Set)
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const GROUPED: &[u8] = br#"
format: mk2
registers:
  - id: ctrl
    groups:
      - { id: dma, span: "0-7" }
      - { id: dma.rx, span: "0-1", parent: dma }
    fields:
      - { id: rx_done, bits: 0, group: dma.rx }
      - { id: tx, bits: "4-7", label: Transmit, group: dma }
      - { id: irq, bits: 8 }
"#;

    fn group(model: &SchemaModel, id: &str) -> NodeRef {
        NodeRef::Group(model.group_idx(id).unwrap())
    }

    #[test]
    fn test_filter_skips_groups_without_matching_fields() {
        let session = Facade::default().load(GROUPED).unwrap();
        let model = session.model();
        let filter = Regex::new("^Transmit$").unwrap();

        assert!(node_matches(model, group(model, "dma"), &filter));
        assert!(!node_matches(model, group(model, "dma.rx"), &filter));
    }

    #[test]
    fn test_filter_matches_nested_fields_through_ancestors() {
        let session = Facade::default().load(GROUPED).unwrap();
        let model = session.model();
        let filter = Regex::new("rx_").unwrap();

        assert!(node_matches(model, group(model, "dma"), &filter));
        assert!(node_matches(model, group(model, "dma.rx"), &filter));
    }
}

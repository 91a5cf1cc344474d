// File: ./src/cli.rs
//! Command-line front end: argument parsing, command execution and the plain
//! text board layout. `src/bin/kanblock.rs` only wires logging and exit codes.
use crate::config::Config;
use crate::context::{AppContext, StandardContext};
use crate::controller::{BoardController, SyncStatus};
use crate::document::{DocumentHost, FileDocument};
use crate::model::{IgnoredLine, Item, ItemId, Stage};
use crate::render::{PlainRenderer, RenderedColumn};
use crate::suggest::{VaultIndex, suggestions};
use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const COLUMN_WIDTH: usize = 28;
const COLUMN_GAP: &str = " | ";
const DEFAULT_TERM_WIDTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Show { file: PathBuf },
    Check { file: PathBuf },
    Export { file: PathBuf },
    Add { file: PathBuf, stage: Stage, text: String },
    Move {
        file: PathBuf,
        index: usize,
        stage: Stage,
        before: Option<usize>,
    },
    Edit { file: PathBuf, index: usize, text: String },
    Delete { file: PathBuf, index: usize },
    Drop { file: PathBuf, stage: Stage },
    Complete { vault: PathBuf, text: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub verbose: bool,
    pub root: Option<PathBuf>,
    /// Which board block of the note (0-based).
    pub block: usize,
    pub command: Command,
}

fn parse_index(raw: &str) -> Result<usize> {
    let n: usize = raw
        .parse()
        .with_context(|| format!("'{}' is not an item number", raw))?;
    if n == 0 {
        bail!("Item numbers start at 1");
    }
    Ok(n)
}

fn parse_stage(raw: &str) -> Result<Stage> {
    raw.parse::<Stage>().map_err(|e| anyhow::anyhow!(e))
}

fn positional_arg<'a>(positional: &[&'a str], idx: usize, what: &str) -> Result<&'a str> {
    positional
        .get(idx)
        .copied()
        .with_context(|| format!("Missing {}", what))
}

/// Parses everything after the binary name.
pub fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut verbose = false;
    let mut root = None;
    let mut block = 0;
    let mut before = None;
    let mut positional: Vec<&str> = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-v" | "--verbose" => verbose = true,
            "-h" | "--help" => positional.insert(0, "help"),
            "-r" | "--root" => {
                let v = iter.next().context("--root needs a path")?;
                root = Some(PathBuf::from(v));
            }
            "--block" => {
                let v = iter.next().context("--block needs a number")?;
                block = v
                    .parse()
                    .with_context(|| format!("'{}' is not a block number", v))?;
            }
            "--before" => {
                let v = iter.next().context("--before needs an item number")?;
                before = Some(parse_index(v)?);
            }
            other => positional.push(other),
        }
    }

    let rest_text = |from: usize| positional.get(from..).unwrap_or_default().join(" ");

    let command = match positional.first().copied() {
        None | Some("help") => Command::Help,
        Some("show") => Command::Show {
            file: positional_arg(&positional, 1, "<file.md>")?.into(),
        },
        Some("check") => Command::Check {
            file: positional_arg(&positional, 1, "<file.md>")?.into(),
        },
        Some("export") => Command::Export {
            file: positional_arg(&positional, 1, "<file.md>")?.into(),
        },
        Some("add") => Command::Add {
            file: positional_arg(&positional, 1, "<file.md>")?.into(),
            stage: parse_stage(positional_arg(&positional, 2, "<stage>")?)?,
            text: {
                let t = rest_text(3);
                if t.trim().is_empty() {
                    bail!("Missing <text>");
                }
                t
            },
        },
        Some("move") => Command::Move {
            file: positional_arg(&positional, 1, "<file.md>")?.into(),
            index: parse_index(positional_arg(&positional, 2, "<item number>")?)?,
            stage: parse_stage(positional_arg(&positional, 3, "<stage>")?)?,
            before,
        },
        Some("edit") => Command::Edit {
            file: positional_arg(&positional, 1, "<file.md>")?.into(),
            index: parse_index(positional_arg(&positional, 2, "<item number>")?)?,
            text: rest_text(3),
        },
        Some("delete") => Command::Delete {
            file: positional_arg(&positional, 1, "<file.md>")?.into(),
            index: parse_index(positional_arg(&positional, 2, "<item number>")?)?,
        },
        Some("drop") => Command::Drop {
            file: positional_arg(&positional, 1, "<file.md>")?.into(),
            stage: parse_stage(positional_arg(&positional, 2, "<stage>")?)?,
        },
        Some("complete") => Command::Complete {
            vault: positional_arg(&positional, 1, "<vault dir>")?.into(),
            text: rest_text(2),
        },
        Some(other) => bail!("Unknown command '{}'. Try 'kanblock help'.", other),
    };

    Ok(CliArgs {
        verbose,
        root,
        block,
        command,
    })
}

// --- Layout ---

fn fit(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    if text.width() <= width {
        out.push_str(text);
        used = text.width();
    } else {
        for c in text.chars() {
            let w = c.width().unwrap_or(0);
            if used + w + 1 > width {
                break;
            }
            out.push(c);
            used += w;
        }
        out.push('…');
        used += 1;
    }
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

/// Three columns side by side. Cards are labelled with their position in the
/// underlying text (what `move`/`edit`/`delete` take).
pub fn format_board(
    columns: &[RenderedColumn<String>],
    numbering: &HashMap<ItemId, usize>,
    center: bool,
    term_width: usize,
) -> String {
    let total = columns.len() * COLUMN_WIDTH + columns.len().saturating_sub(1) * COLUMN_GAP.len();
    let margin = if center {
        " ".repeat(term_width.saturating_sub(total) / 2)
    } else {
        String::new()
    };

    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .map(|c| fit(&format!("{} ({})", c.title, c.cards.len()), COLUMN_WIDTH))
        .collect();
    out.push_str(&margin);
    out.push_str(header.join(COLUMN_GAP).trim_end());
    out.push('\n');
    out.push_str(&margin);
    out.push_str(&vec!["-".repeat(COLUMN_WIDTH); columns.len()].join(COLUMN_GAP));
    out.push('\n');

    let rows = columns.iter().map(|c| c.cards.len()).max().unwrap_or(0);
    for row in 0..rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|c| match c.cards.get(row) {
                Some(card) => {
                    let mut label = format!(
                        "{:>2}. {}",
                        numbering.get(&card.id).copied().unwrap_or(0),
                        card.surface
                    );
                    if card.extra_lines > 0 {
                        label.push_str(&format!(" +{}", card.extra_lines));
                    }
                    fit(&label, COLUMN_WIDTH)
                }
                None => fit("", COLUMN_WIDTH),
            })
            .collect();
        out.push_str(&margin);
        out.push_str(cells.join(COLUMN_GAP).trim_end());
        out.push('\n');
    }
    out
}

fn term_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_TERM_WIDTH)
}

// --- Execution ---

#[derive(Serialize)]
struct BoardExport<'a> {
    items: &'a [Item],
    ignored: &'a [IgnoredLine],
}

fn item_at<H: DocumentHost>(board: &BoardController<H>, index: usize) -> Result<ItemId> {
    board
        .store()
        .items()
        .get(index - 1)
        .map(|i| i.id.clone())
        .with_context(|| {
            format!(
                "No item #{} (the board has {})",
                index,
                board.store().len()
            )
        })
}

fn report_sync<H: DocumentHost>(board: &BoardController<H>, out: &mut dyn Write) -> Result<i32> {
    match board.last_sync() {
        Some(SyncStatus::Written) | None => Ok(0),
        Some(SyncStatus::NotFound) => {
            writeln!(out, "error: could not find the board block to update")?;
            Ok(1)
        }
        Some(SyncStatus::Failed(msg)) => {
            writeln!(out, "error: failed to write note: {}", msg)?;
            Ok(1)
        }
    }
}

fn open_board(args: &CliArgs, file: &Path) -> Result<BoardController<FileDocument>> {
    let ctx = StandardContext::new(args.root.clone());
    let config = Config::load_or_default(&ctx)?;
    let doc = FileDocument::new(file, config.block_language.clone(), args.block)
        .with_lock_dir(ctx.get_cache_dir()?.join("locks"));
    BoardController::load(doc, config)
}

/// Runs one command. Returns the process exit code.
pub fn run(args: &CliArgs, input: &mut dyn Read, out: &mut dyn Write) -> Result<i32> {
    match &args.command {
        Command::Help => {
            print_help("kanblock", out)?;
            Ok(0)
        }
        Command::Show { file } => {
            let board = open_board(args, file)?;
            for w in board.warnings() {
                writeln!(out, "warning: {}", w)?;
            }
            if board.is_empty() {
                writeln!(out, "No todo items found")?;
                return Ok(0);
            }
            let numbering: HashMap<ItemId, usize> = board
                .store()
                .items()
                .iter()
                .enumerate()
                .map(|(i, item)| (item.id.clone(), i + 1))
                .collect();
            let columns = board.render(&mut PlainRenderer);
            write!(
                out,
                "{}",
                format_board(&columns, &numbering, board.config().center_board, term_width())
            )?;
            Ok(0)
        }
        Command::Check { file } => {
            let board = open_board(args, file)?;
            let ignored = board.ignored_lines();
            if ignored.is_empty() {
                writeln!(out, "ok: {} item(s), nothing would be lost", board.store().len())?;
                return Ok(0);
            }
            for line in ignored {
                writeln!(out, "line {}: {}", line.line_number, line.content)?;
            }
            writeln!(
                out,
                "{} line(s) would be lost on the next edit",
                ignored.len()
            )?;
            Ok(1)
        }
        Command::Export { file } => {
            let board = open_board(args, file)?;
            let export = BoardExport {
                items: board.store().items(),
                ignored: board.ignored_lines(),
            };
            writeln!(out, "{}", serde_json::to_string_pretty(&export)?)?;
            Ok(0)
        }
        Command::Add { file, stage, text } => {
            let mut board = open_board(args, file)?;
            let id = board.add_item(*stage);
            board.save_text(&id, text);
            report_sync(&board, out)
        }
        Command::Move {
            file,
            index,
            stage,
            before,
        } => {
            let mut board = open_board(args, file)?;
            let id = item_at(&board, *index)?;
            let before_id = before.map(|b| item_at(&board, b)).transpose()?;
            board.move_item(&id, *stage, before_id.as_ref());
            report_sync(&board, out)
        }
        Command::Edit { file, index, text } => {
            let mut board = open_board(args, file)?;
            let id = item_at(&board, *index)?;
            board.save_text(&id, text);
            report_sync(&board, out)
        }
        Command::Delete { file, index } => {
            let mut board = open_board(args, file)?;
            let id = item_at(&board, *index)?;
            board.delete_item(&id);
            report_sync(&board, out)
        }
        Command::Drop { file, stage } => {
            let mut payload = String::new();
            input.read_to_string(&mut payload)?;
            let mut board = open_board(args, file)?;
            let created = board.drop_external(&payload, *stage, None);
            writeln!(out, "{} item(s) added to {}", created.len(), stage)?;
            report_sync(&board, out)
        }
        Command::Complete { vault, text } => {
            let index = VaultIndex::scan(vault)?;
            for s in suggestions(text, &index) {
                writeln!(out, "{}", s.label())?;
            }
            Ok(0)
        }
    }
}

pub fn print_help(binary_name: &str, out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        out,
        "Kanblock v{} - kanban boards over Markdown checklist blocks",
        env!("CARGO_PKG_VERSION")
    )?;
    writeln!(out)?;
    writeln!(out, "USAGE:")?;
    writeln!(out, "    {} [OPTIONS] <command> ...", binary_name)?;
    writeln!(out)?;
    writeln!(out, "COMMANDS:")?;
    writeln!(out, "    show <file.md>                         Print the board")?;
    writeln!(out, "    check <file.md>                        List lines an edit would drop")?;
    writeln!(out, "    export <file.md>                       Print items as JSON")?;
    writeln!(out, "    add <file.md> <stage> <text>           Add an item")?;
    writeln!(out, "    move <file.md> <n> <stage> [--before <m>]")?;
    writeln!(out, "                                           Move item n (optionally before item m)")?;
    writeln!(out, "    edit <file.md> <n> <text>              Replace item text (empty deletes)")?;
    writeln!(out, "    delete <file.md> <n>                   Delete item n")?;
    writeln!(out, "    drop <file.md> <stage>                 Add one item per stdin line")?;
    writeln!(out, "    complete <vault dir> <text>            Suggest tags / note links")?;
    writeln!(out)?;
    writeln!(out, "OPTIONS:")?;
    writeln!(out, "    --block <n>           Use the n-th board block of the note (default 0)")?;
    writeln!(out, "    -r, --root <path>     Use a different directory for config")?;
    writeln!(out, "    -v, --verbose         Debug logging on stderr")?;
    writeln!(out, "    -h, --help            Show this help message")?;
    writeln!(out)?;
    writeln!(out, "STAGES:")?;
    writeln!(out, "    todo, in-progress, done")?;
    Ok(())
}

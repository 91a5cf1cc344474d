// End-to-end tests for the command-line front end.
use kanblock::cli::{CliArgs, Command, parse_args, run};
use kanblock::config::Config;
use kanblock::context::{StandardContext, TestContext};
use kanblock::model::Stage;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::PathBuf;

const NOTE: &str = "# Week\n\n```todo\n- [ ] a\n- [/] b\n- [x] c\n```\n";

fn setup(note: &str) -> (TestContext, PathBuf) {
    let ctx = TestContext::new();
    let file = ctx.root.join("week.md");
    fs::write(&file, note).unwrap();
    (ctx, file)
}

fn exec(ctx: &TestContext, command: Command, input: &str) -> (i32, String) {
    let args = CliArgs {
        verbose: false,
        root: Some(ctx.root.clone()),
        block: 0,
        command,
    };
    let mut out = Vec::new();
    let code = run(&args, &mut input.as_bytes(), &mut out).unwrap();
    (code, String::from_utf8(out).unwrap())
}

fn block_of(file: &PathBuf) -> String {
    let content = fs::read_to_string(file).unwrap();
    content
        .split("```todo\n")
        .nth(1)
        .and_then(|rest| rest.split("\n```").next())
        .unwrap_or_default()
        .to_string()
}

#[test]
fn test_show_prints_columns_with_numbers() {
    let (ctx, file) = setup(NOTE);
    let (code, out) = exec(&ctx, Command::Show { file }, "");
    assert_eq!(code, 0);

    let header = out.lines().next().unwrap();
    assert!(header.starts_with("To do (1)"));
    assert!(header.contains("In progress (1)"));
    assert!(header.contains("Done (1)"));
    assert!(out.contains(" 1. a"));
    assert!(out.contains(" 3. c"));
}

#[test]
fn test_show_empty_board() {
    let (ctx, file) = setup("```todo\n```\n");
    let (code, out) = exec(&ctx, Command::Show { file }, "");
    assert_eq!(code, 0);
    assert!(out.contains("No todo items found"));
}

#[test]
#[serial]
fn test_show_centers_board_when_configured() {
    let (ctx, file) = setup(NOTE);
    let config = Config {
        center_board: true,
        ..Config::default()
    };
    config
        .save(&StandardContext::new(Some(ctx.root.clone())))
        .unwrap();

    unsafe {
        env::set_var("COLUMNS", "120");
    }
    let (_, out) = exec(&ctx, Command::Show { file }, "");
    unsafe {
        env::remove_var("COLUMNS");
    }

    // Three 28-wide columns and two 3-wide gaps leave 30 spaces to split
    let header = out.lines().next().unwrap();
    assert!(header.starts_with(&format!("{}To do", " ".repeat(15))));
}

#[test]
fn test_check_reports_lost_lines() {
    let (ctx, file) = setup("```todo\nintro\n- [ ] a\n```\n");
    let (code, out) = exec(&ctx, Command::Check { file }, "");
    assert_eq!(code, 1);
    assert!(out.contains("line 1: intro"));

    let (ctx, file) = setup(NOTE);
    let (code, out) = exec(&ctx, Command::Check { file }, "");
    assert_eq!(code, 0);
    assert!(out.starts_with("ok: 3 item(s)"));
}

#[test]
fn test_add_move_edit_delete() {
    let (ctx, file) = setup(NOTE);

    let add = Command::Add {
        file: file.clone(),
        stage: Stage::InProgress,
        text: "d".into(),
    };
    assert_eq!(exec(&ctx, add, "").0, 0);
    assert_eq!(block_of(&file), "- [ ] a\n- [/] b\n- [/] d\n- [x] c");

    let mv = Command::Move {
        file: file.clone(),
        index: 4,
        stage: Stage::Todo,
        before: Some(1),
    };
    assert_eq!(exec(&ctx, mv, "").0, 0);
    assert_eq!(block_of(&file), "- [ ] c\n- [ ] a\n- [/] b\n- [/] d");

    let edit = Command::Edit {
        file: file.clone(),
        index: 2,
        text: "a, reworded".into(),
    };
    exec(&ctx, edit, "");
    let delete = Command::Delete {
        file: file.clone(),
        index: 3,
    };
    exec(&ctx, delete, "");
    assert_eq!(block_of(&file), "- [ ] c\n- [ ] a, reworded\n- [/] d");

    // Text outside the block is untouched
    assert!(fs::read_to_string(&file).unwrap().starts_with("# Week\n\n"));
}

#[test]
fn test_out_of_range_item_is_an_error() {
    let (ctx, file) = setup(NOTE);
    let args = CliArgs {
        verbose: false,
        root: Some(ctx.root.clone()),
        block: 0,
        command: Command::Delete { file, index: 9 },
    };
    let mut out = Vec::new();
    let err = run(&args, &mut "".as_bytes(), &mut out).unwrap_err();
    assert!(err.to_string().contains("No item #9"));
}

#[test]
fn test_drop_reads_stdin() {
    let (ctx, file) = setup(NOTE);
    let payload = "Meeting Notes\nobsidian://open?vault=V&file=Plans%2FQ3.md\n";
    let (code, out) = exec(
        &ctx,
        Command::Drop {
            file: file.clone(),
            stage: Stage::Done,
        },
        payload,
    );
    assert_eq!(code, 0);
    assert!(out.contains("2 item(s) added to done"));
    assert_eq!(
        block_of(&file),
        "- [ ] a\n- [/] b\n- [x] c\n- [x] [[Meeting Notes]]\n- [x] [[Q3]]"
    );
}

#[test]
fn test_export_is_json() {
    let (ctx, file) = setup("```todo\n- [/] b\nloose\n```\n");
    let (code, out) = exec(&ctx, Command::Export { file }, "");
    assert_eq!(code, 0);

    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["items"][0]["text"], "b");
    assert_eq!(value["items"][0]["stage"], "in-progress");
    assert_eq!(value["ignored"][0]["line_number"], 2);
}

#[test]
fn test_complete_lists_notes() {
    let (ctx, _) = setup(NOTE);
    let vault = ctx.root.clone();
    let (code, out) = exec(
        &ctx,
        Command::Complete {
            vault,
            text: "see [[we".into(),
        },
        "",
    );
    assert_eq!(code, 0);
    assert_eq!(out, "week\n");
}

#[test]
fn test_parse_args_defaults_to_help() {
    let parsed = parse_args(&[]).unwrap();
    assert_eq!(parsed.command, Command::Help);

    let (ctx, _) = setup(NOTE);
    let (code, out) = exec(&ctx, Command::Help, "");
    assert_eq!(code, 0);
    assert!(out.contains("USAGE:"));
}

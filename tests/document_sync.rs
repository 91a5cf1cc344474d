// Tests for writing the board back into its note.
use anyhow::bail;
use kanblock::config::Config;
use kanblock::context::{AppContext, TestContext};
use kanblock::controller::{BoardController, SyncStatus};
use kanblock::document::{DocumentHost, FileDocument, NoteDocument, ReplaceOutcome};
use kanblock::model::Stage;
use std::fs;

const NOTE: &str = "# Plan\n\n```todo\n- [ ] a\n- [x] b\n```\n\nafter\n";

/// Host that can be told to fail or to lose track of the block.
#[derive(Debug)]
struct FlakyHost {
    text: String,
    fail: bool,
    lost: bool,
}

impl FlakyHost {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            fail: false,
            lost: false,
        }
    }
}

impl DocumentHost for FlakyHost {
    fn get_text(&self) -> anyhow::Result<String> {
        Ok(self.text.clone())
    }

    fn replace_text(&mut self, previous: &str, new_text: &str) -> anyhow::Result<ReplaceOutcome> {
        if self.fail {
            bail!("disk full");
        }
        if self.lost || previous != self.text {
            return Ok(ReplaceOutcome::NotFound);
        }
        self.text = new_text.to_string();
        Ok(ReplaceOutcome::Replaced)
    }
}

#[test]
fn test_note_edit_keeps_surrounding_text() {
    let doc = NoteDocument::new(NOTE, "todo", 0);
    let mut board = BoardController::load(doc, Config::default()).unwrap();
    let a = board.store().items()[0].id.clone();

    assert!(board.move_item(&a, Stage::Done, None));
    assert_eq!(board.last_sync(), Some(&SyncStatus::Written));
    assert_eq!(
        board.host().content(),
        "# Plan\n\n```todo\n- [x] b\n- [x] a\n```\n\nafter\n"
    );
}

#[test]
fn test_second_block_of_note() {
    let note = "```todo\n- [ ] first\n```\ntext\n```todo\n- [ ] second\n```\n";
    let doc = NoteDocument::new(note, "todo", 1);
    let mut board = BoardController::load(doc, Config::default()).unwrap();
    let id = board.store().items()[0].id.clone();

    board.move_item(&id, Stage::InProgress, None);
    assert_eq!(
        board.host().content(),
        "```todo\n- [ ] first\n```\ntext\n```todo\n- [/] second\n```\n"
    );
}

#[test]
fn test_missing_block_is_a_load_error() {
    let doc = NoteDocument::new("no board here", "todo", 0);
    assert!(BoardController::load(doc, Config::default()).is_err());
}

#[test]
fn test_not_found_leaves_board_usable() {
    let mut host = FlakyHost::new("- [ ] a\n- [ ] b");
    host.lost = true;
    let mut board = BoardController::load(host, Config::default()).unwrap();
    let a = board.store().items()[0].id.clone();

    assert!(board.move_item(&a, Stage::Done, None));
    assert_eq!(board.last_sync(), Some(&SyncStatus::NotFound));
    assert!(board.last_sync_error().is_some());
    assert_eq!(board.host().text, "- [ ] a\n- [ ] b");
    assert_eq!(board.text(), "- [ ] b\n- [x] a");
}

#[test]
fn test_host_failure_is_recorded_not_raised() {
    let mut host = FlakyHost::new("- [ ] a");
    host.fail = true;
    let mut board = BoardController::load(host, Config::default()).unwrap();
    let a = board.store().items()[0].id.clone();

    assert!(board.move_item(&a, Stage::InProgress, None));
    assert!(matches!(board.last_sync(), Some(SyncStatus::Failed(msg)) if msg.contains("disk full")));

    // Still editable, and a later write succeeds once the host recovers
    board.host_mut().fail = false;
    assert!(board.move_item(&a, Stage::Done, None));
    assert_eq!(board.last_sync(), Some(&SyncStatus::Written));
    assert_eq!(board.host().text, "- [x] a");
}

#[test]
fn test_refresh_picks_up_outside_edits() {
    let doc = NoteDocument::new(NOTE, "todo", 0);
    let mut board = BoardController::load(doc, Config::default()).unwrap();
    assert!(!board.refresh().unwrap());

    board
        .host_mut()
        .set_content("```todo\n- [/] changed elsewhere\n```\n");
    assert!(board.refresh().unwrap());
    assert_eq!(board.store().len(), 1);
    assert_eq!(board.store().items()[0].stage, Stage::InProgress);
}

#[test]
fn test_file_document_roundtrip() {
    let ctx = TestContext::new();
    let notes = ctx.root.join("notes");
    fs::create_dir_all(&notes).unwrap();
    let path = notes.join("board.md");
    fs::write(&path, NOTE).unwrap();
    let locks = ctx.get_cache_dir().unwrap().join("locks");

    let doc = FileDocument::new(&path, "todo", 0).with_lock_dir(&locks);
    let mut board = BoardController::load(doc, Config::default()).unwrap();
    let b = board.store().items()[1].id.clone();
    board.delete_item(&b);

    assert_eq!(board.last_sync(), Some(&SyncStatus::Written));
    let on_disk = fs::read_to_string(&path).unwrap();
    assert_eq!(on_disk, "# Plan\n\n```todo\n- [ ] a\n```\n\nafter\n");

    // Nothing but the note itself is left in the notes folder
    let names: Vec<String> = fs::read_dir(&notes)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["board.md"]);
    assert!(board.host().lock_path().starts_with(&locks));
    assert!(board.host().lock_path().exists());
}

#[test]
fn test_file_edited_between_load_and_write_is_not_clobbered() {
    let ctx = TestContext::new();
    let path = ctx.root.join("board.md");
    fs::write(&path, NOTE).unwrap();

    let doc = FileDocument::new(&path, "todo", 0);
    let mut board = BoardController::load(doc, Config::default()).unwrap();
    let a = board.store().items()[0].id.clone();

    let edited = "```todo\n- [ ] someone else\n```\n";
    fs::write(&path, edited).unwrap();
    board.move_item(&a, Stage::Done, None);

    assert_eq!(board.last_sync(), Some(&SyncStatus::NotFound));
    assert_eq!(fs::read_to_string(&path).unwrap(), edited);
}

use mdcraft::editor::structure::{
    handle_backspace_key, handle_carriage_return, indent, toggle_task_complete, unindent,
};
use mdcraft::editor::{
    Command, Cursor, EditorBuffer, EditorSession, FocusMode, Key, KeyOutcome, PairedDelimiters,
    Position, StructuralKind, TextBuffer, classify, resolve_block_range,
};
use mdcraft::prelude::EditorConfig;

fn run(text: &str, at: (usize, usize), commands: &[&str]) -> EditorSession {
    let mut session = EditorSession::new(text);
    session.set_cursor(Cursor::at(at.0, at.1));
    for command in commands {
        let command: Command = command.parse().unwrap();
        session.execute(&command);
    }
    session
}

#[test]
fn test_writing_a_numbered_list() {
    let session = run(
        "",
        (0, 0),
        &["type:1. milk", "enter", "type:eggs", "enter", "enter", "type:done"],
    );
    assert_eq!(session.text(), "1. milk\n2. eggs\n\ndone");
}

#[test]
fn test_nesting_and_unnesting_a_bullet() {
    let mut config = EditorConfig::default();
    config.set_insert_spaces_for_tabs(true);
    let mut session = EditorSession::new("* top").with_config(config);
    session.set_cursor(Cursor::at(0, 5));
    session.handle_key(Key::Enter {
        shift: false,
        ctrl: false,
    });
    session.handle_key(Key::Tab);
    session.execute(&Command::Type("child".to_string()));
    assert_eq!(session.text(), "* top\n    - child");

    session.handle_key(Key::BackTab);
    assert_eq!(session.text(), "* top\n* child");
}

#[test]
fn test_task_list_round_trip() {
    let session = run("- [x] done", (0, 10), &["enter", "type:next", "toggle-task"]);
    assert_eq!(session.text(), "- [x] done\n- [x] next");
    assert_eq!(
        classify("- [x] next"),
        StructuralKind::TaskListItem {
            marker: '-',
            indent: 0,
            checked: true,
        }
    );
}

#[test]
fn test_quote_continues_and_backspace_clears_marker() {
    let session = run("> > deep", (0, 8), &["enter", "backspace"]);
    assert_eq!(session.text(), "> > deep\n");
    assert_eq!(session.cursor(), Cursor::at(1, 0));
}

#[test]
fn test_wrapping_selection_with_quotes_and_bold() {
    let mut session = EditorSession::new("say hello there");
    session.set_cursor(Cursor::selecting(Position::new(0, 4), Position::new(0, 9)));
    session.handle_key(Key::Char('"'));
    assert_eq!(session.text(), "say \"hello\" there");
    session.execute(&Command::Bold);
    assert_eq!(session.text(), "say \"**hello**\" there");
    let selection = session.cursor().selection_range().unwrap();
    assert_eq!(session.buffer().text_range(selection.0, selection.1), "hello");
}

#[test]
fn test_every_command_undoes_in_one_step() {
    for command in [
        "bold", "italic", "strikethrough", "comment", "bullet", "numbered", "task", "quote",
        "indent", "unindent", "toggle-task", "enter", "shift-enter", "tab", "backtab",
    ] {
        let text = "- [ ] one\n    two\n> three";
        let mut session = EditorSession::new(text);
        session.set_cursor(Cursor::selecting(Position::new(0, 6), Position::new(2, 3)));
        session.execute(&command.parse().unwrap());
        session.execute(&Command::Undo);
        assert_eq!(session.text(), text, "undo after {command}");
        assert_eq!(session.buffer().edit_group_depth(), 0);
    }
}

#[test]
fn test_engines_work_on_any_text_buffer() {
    let mut buffer = EditorBuffer::from_text("7) seven");
    let cursor = handle_carriage_return(&mut buffer, Cursor::at(0, 8));
    assert_eq!(buffer.line_at(1), Some("8) ".to_string()));

    let config = EditorConfig::default();
    let cursor = indent(&mut buffer, cursor, &config);
    assert_eq!(buffer.line_at(1), Some("\t1) ".to_string()));
    let cursor = unindent(&mut buffer, cursor, &config);
    assert_eq!(buffer.line_at(1), Some("1) ".to_string()));

    let outcome = handle_backspace_key(&mut buffer, cursor, &PairedDelimiters::default());
    assert_eq!(outcome, KeyOutcome::Handled(Cursor::at(1, 0)));
    assert_eq!(buffer.line_at(1), Some(String::new()));
    toggle_task_complete(&mut buffer, Cursor::at(0, 0));
    assert_eq!(buffer.line_at(0), Some("7) seven".to_string()));
}

#[test]
fn test_block_range_for_selection() {
    let buffer = EditorBuffer::from_text("0\n1\n2\n3\n4\n5\n6");
    let selection = Cursor::selecting(Position::new(2, 0), Position::new(5, 0));
    assert_eq!(resolve_block_range(&selection, &buffer), 2..=5);
    assert_eq!(resolve_block_range(&Cursor::at(3, 0), &buffer), 3..=3);
}

#[test]
fn test_focus_follows_cursor() {
    let mut session = run("First. Second one.\n\nNext para.", (0, 9), &[]);
    session.config_mut().set_focus_mode(FocusMode::Sentence);
    let focus = session.focus_ranges();
    assert_eq!(focus.before, Some(Position::new(0, 0)..Position::new(0, 7)));
    assert_eq!(focus.after, Some(Position::new(0, 18)..Position::new(2, 10)));

    session.config_mut().set_focus_mode(FocusMode::Paragraph);
    let focus = session.focus_ranges();
    assert_eq!(focus.before, None);
    assert_eq!(focus.after, Some(Position::new(0, 18)..Position::new(2, 10)));
}

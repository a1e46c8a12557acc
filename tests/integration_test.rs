use std::env;
use std::io::Write;
use std::process::{Command, Stdio};
use std::str;

use tempfile::NamedTempFile;

fn run(db_path: &str, input: Vec<String>) -> Vec<String> {
    let mut process = kvtree_exe(db_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("unable to start the process");

    let stdin = process.stdin.as_mut().expect("unable to pipe stdin");
    for line in input {
        stdin
            .write_all(format!("{}\n", line).as_bytes())
            .unwrap_or_else(|_| panic!("unable to write command `{}`", line));
    }

    let output = process
        .wait_with_output()
        .expect("unable to get output from the process");

    str::from_utf8(&output.stdout)
        .expect("could not decode process output")
        .lines()
        .map(str::to_owned)
        .collect()
}

fn kvtree_exe(db_path: &str) -> Command {
    let target_dir = env::current_exe()
        .ok()
        .map(|mut path| {
            path.pop();
            if path.ends_with("deps") {
                path.pop();
            }
            path
        })
        .expect("this should only be used where a `current_exe` can be set");
    let exe = target_dir.join(format!("kvtree{}", env::consts::EXE_SUFFIX));
    let mut cmd = Command::new(exe);
    cmd.arg(db_path);
    cmd
}

fn temp_db_path() -> (NamedTempFile, String) {
    let file = NamedTempFile::new().unwrap();
    let path = file.path().to_str().unwrap().to_string();
    (file, path)
}

#[test]
fn insert_and_retrieve_row() {
    let (_guard, db_path) = temp_db_path();
    let output = run(
        &db_path,
        vec![
            "insert 1 user1 person1@example.com".to_owned(),
            "select".to_owned(),
            ".exit".to_owned(),
        ],
    );

    assert_eq!(
        output,
        vec![
            "db > Executed.".to_owned(),
            "db > (1, user1, person1@example.com)".to_owned(),
            "Executed.".to_owned(),
            "db > ".to_owned(),
        ]
    );
}

#[test]
fn prints_error_message_on_duplicate_key() {
    let (_guard, db_path) = temp_db_path();
    let output = run(
        &db_path,
        vec![
            "insert 1 user1 person1@example.com".to_owned(),
            "insert 1 user2 person2@example.com".to_owned(),
            "select".to_owned(),
            ".exit".to_owned(),
        ],
    );

    assert_eq!(
        output,
        vec![
            "db > Executed.".to_owned(),
            "db > Error: Duplicate key.".to_owned(),
            "db > (1, user1, person1@example.com)".to_owned(),
            "Executed.".to_owned(),
            "db > ".to_owned(),
        ]
    );
}

#[test]
fn allows_inserting_strings_at_maximum_length() {
    let (_guard, db_path) = temp_db_path();
    let username = "a".repeat(32);
    let email = "a".repeat(255);
    let output = run(
        &db_path,
        vec![
            format!("insert 1 {username} {email}"),
            "select".to_owned(),
            ".exit".to_owned(),
        ],
    );

    assert_eq!(
        output,
        vec![
            "db > Executed.".to_owned(),
            format!("db > (1, {username}, {email})"),
            "Executed.".to_owned(),
            "db > ".to_owned(),
        ]
    );
}

#[test]
fn prints_error_message_if_strings_are_too_long() {
    let (_guard, db_path) = temp_db_path();
    let username = "a".repeat(33);
    let email = "a".repeat(255);
    let output = run(
        &db_path,
        vec![
            format!("insert 1 {username} {email}"),
            ".exit".to_owned(),
        ],
    );

    assert_eq!(
        output,
        vec!["db > String is too long.".to_owned(), "db > ".to_owned()]
    );
}

#[test]
fn prints_error_message_if_id_is_negative() {
    let (_guard, db_path) = temp_db_path();
    let output = run(
        &db_path,
        vec![
            "insert -1 foo bar@email.com".to_owned(),
            ".exit".to_owned(),
        ],
    );

    assert_eq!(
        output,
        vec!["db > ID must be positive.".to_owned(), "db > ".to_owned()]
    );
}

#[test]
fn prints_syntax_error_for_incomplete_insert() {
    let (_guard, db_path) = temp_db_path();
    let output = run(&db_path, vec!["insert 1 foo".to_owned(), ".exit".to_owned()]);

    assert_eq!(
        output,
        vec![
            "db > Syntax error. Could not parse statement.".to_owned(),
            "db > ".to_owned(),
        ]
    );
}

#[test]
fn prints_unrecognized_keyword_message() {
    let (_guard, db_path) = temp_db_path();
    let output = run(&db_path, vec!["delete 1".to_owned(), ".exit".to_owned()]);

    assert_eq!(
        output,
        vec![
            "db > Unrecognized keyword at start of 'delete 1'.".to_owned(),
            "db > ".to_owned(),
        ]
    );
}

#[test]
fn leaf_splits_at_fourteen_rows_into_internal_root_with_two_leaves_of_seven() {
    let (_guard, db_path) = temp_db_path();
    let mut commands: Vec<String> = (1..=14)
        .map(|i| format!("insert {i} user{i} person{i}@example.com"))
        .collect();
    commands.push(".btree".to_owned());
    commands.push(".exit".to_owned());

    let output = run(&db_path, commands);
    let tree: Vec<&str> = output
        .iter()
        .skip_while(|line| !line.ends_with("Tree:"))
        .map(|line| line.trim())
        .collect();

    assert!(tree.contains(&"- internal (size 1)"));
    assert_eq!(tree.iter().filter(|l| **l == "- leaf (size 7)").count(), 2);
    assert!(tree.contains(&"- key 7"));
}

#[test]
fn persists_rows_across_close_and_reopen() {
    let (_guard, db_path) = temp_db_path();
    run(
        &db_path,
        vec![
            "insert 1 user1 person1@example.com".to_owned(),
            "insert 2 user2 person2@example.com".to_owned(),
            "insert 3 user3 person3@example.com".to_owned(),
            ".exit".to_owned(),
        ],
    );

    let output = run(&db_path, vec!["select".to_owned(), ".exit".to_owned()]);

    assert_eq!(
        output,
        vec![
            "db > (1, user1, person1@example.com)".to_owned(),
            "(2, user2, person2@example.com)".to_owned(),
            "(3, user3, person3@example.com)".to_owned(),
            "Executed.".to_owned(),
            "db > ".to_owned(),
        ]
    );
}

#[test]
fn non_contiguous_insert_order_still_selects_in_ascending_order() {
    let (_guard, db_path) = temp_db_path();
    let ids = [50, 10, 90, 30, 70, 20, 80, 40, 60];
    let mut commands: Vec<String> = ids
        .iter()
        .map(|i| format!("insert {i} user{i} person{i}@example.com"))
        .collect();
    commands.push("select".to_owned());
    commands.push(".exit".to_owned());

    let output = run(&db_path, commands);

    let mut sorted = ids.to_vec();
    sorted.sort_unstable();
    let mut expected_rows: Vec<String> = sorted
        .iter()
        .map(|i| format!("({i}, user{i}, person{i}@example.com)"))
        .collect();
    expected_rows[0] = format!("db > {}", expected_rows[0]);

    let mut expected = vec!["db > Executed.".to_owned(); ids.len()];
    expected.extend(expected_rows);
    expected.push("Executed.".to_owned());
    expected.push("db > ".to_owned());

    assert_eq!(output, expected);
}

#[test]
fn prints_constants() {
    let (_guard, db_path) = temp_db_path();
    let output = run(&db_path, vec![".constants".to_owned(), ".exit".to_owned()]);

    assert_eq!(
        output,
        vec![
            "db > ROW_SIZE: 293".to_owned(),
            "COMMON_NODE_HEADER_SIZE: 6".to_owned(),
            "LEAF_NODE_HEADER_SIZE: 14".to_owned(),
            "LEAF_NODE_CELL_SIZE: 297".to_owned(),
            "LEAF_NODE_SPACE_FOR_CELLS: 4082".to_owned(),
            "LEAF_NODE_MAX_CELLS: 13".to_owned(),
            "db > ".to_owned(),
        ]
    );
}

#[test]
fn missing_filename_argument_prints_usage() {
    let target_dir = env::current_exe()
        .ok()
        .map(|mut path| {
            path.pop();
            if path.ends_with("deps") {
                path.pop();
            }
            path
        })
        .unwrap();
    let exe = target_dir.join(format!("kvtree{}", env::consts::EXE_SUFFIX));
    let output = Command::new(exe).output().expect("failed to run kvtree");
    assert_eq!(
        str::from_utf8(&output.stdout).unwrap().trim(),
        "Must supply a database filename."
    );
    assert!(!output.status.success());
}

#[test]
fn eof_on_stdin_fails_instead_of_closing_cleanly() {
    let (_guard, db_path) = temp_db_path();
    let mut process = kvtree_exe(&db_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("unable to start the process");
    // Dropping stdin without writing anything delivers immediate EOF.
    drop(process.stdin.take());

    let output = process
        .wait_with_output()
        .expect("unable to get output from the process");
    let lines: Vec<String> = str::from_utf8(&output.stdout)
        .expect("could not decode process output")
        .lines()
        .map(str::to_owned)
        .collect();

    assert_eq!(lines, vec!["db > Error reading input".to_owned()]);
    assert!(!output.status.success());
}

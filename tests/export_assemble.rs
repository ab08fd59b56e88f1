use std::fs;

use gmail_export::error::AppError;
use gmail_export::export::Statement;
use gmail_export::export::assemble::assemble;

fn statement(output: &str, split: bool, format: &str) -> Statement {
    Statement {
        output: output.to_string(),
        split,
        format: format.to_string(),
        area: "all".to_string(),
    }
}

fn json_blocks(count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|index| format!(r#"{{"id":"m{index}"}}"#).into_bytes())
        .collect()
}

#[test]
fn single_json_output_is_a_valid_array() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("out.json");

    assemble(
        &json_blocks(3),
        &statement(path.to_str().expect("utf8 path"), false, "json"),
    )
    .expect("assemble should succeed");

    let payload = fs::read_to_string(&path).expect("output should exist");
    let value: serde_json::Value = serde_json::from_str(&payload).expect("valid json array");
    let items = value.as_array().expect("array");
    assert_eq!(items.len(), 3);
    assert_eq!(items[1]["id"], "m1");
}

#[test]
fn single_txt_output_has_exactly_one_begin_and_end_marker_for_one_block() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("out.txt");

    assemble(
        &[b"ID: m0\r\n".to_vec()],
        &statement(path.to_str().expect("utf8 path"), false, "txt"),
    )
    .expect("assemble should succeed");

    let payload = fs::read_to_string(&path).expect("output should exist");
    assert!(payload.starts_with("=== Begin Message ===\r\n"));
    assert!(payload.ends_with("=== End Message ===\r\n"));
    assert_eq!(payload.matches("=== Begin Message ===").count(), 1);
    assert_eq!(payload.matches("=== End Message ===").count(), 1);
}

#[test]
fn single_txt_output_delimits_interior_blocks() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("out.txt");

    assemble(
        &[b"ID: m0\r\n".to_vec(), b"ID: m1\r\n".to_vec()],
        &statement(path.to_str().expect("utf8 path"), false, "txt"),
    )
    .expect("assemble should succeed");

    let payload = fs::read_to_string(&path).expect("output should exist");
    assert_eq!(
        payload,
        "=== Begin Message ===\r\nID: m0\r\n\
         === End Message ===\r\n\r\n\r\n=== Begin Message ===\r\nID: m1\r\n\
         === End Message ===\r\n"
    );
}

#[test]
fn split_mode_writes_indexed_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base = dir.path().join("out.json");

    assemble(
        &json_blocks(3),
        &statement(base.to_str().expect("utf8 path"), true, "json"),
    )
    .expect("assemble should succeed");

    for index in 0..3 {
        let path = dir.path().join(format!("out_{index}.json"));
        assert!(path.exists(), "missing {}", path.display());
    }
    assert!(!dir.path().join("out_3.json").exists());
}

#[test]
fn existing_target_file_aborts_without_overwrite() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("out.json");
    fs::write(&path, "already here").expect("seed file");

    let err = assemble(
        &json_blocks(1),
        &statement(path.to_str().expect("utf8 path"), false, "json"),
    )
    .expect_err("collision should fail");

    assert!(matches!(err, AppError::Io(_)));
    assert_eq!(fs::read_to_string(&path).expect("read"), "already here");
}

#[test]
fn split_collision_leaves_earlier_files_in_place() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base = dir.path().join("out.json");
    fs::write(dir.path().join("out_1.json"), "occupied").expect("seed file");

    let err = assemble(
        &json_blocks(3),
        &statement(base.to_str().expect("utf8 path"), true, "json"),
    )
    .expect_err("collision should fail");

    assert!(matches!(err, AppError::Io(_)));
    // No rollback: the file written before the collision stays.
    assert!(dir.path().join("out_0.json").exists());
    assert_eq!(
        fs::read_to_string(dir.path().join("out_1.json")).expect("read"),
        "occupied"
    );
    assert!(!dir.path().join("out_2.json").exists());
}

#[test]
fn empty_batch_is_nothing_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("out.json");

    let err = assemble(&[], &statement(path.to_str().expect("utf8 path"), false, "json"))
        .expect_err("empty batch should fail");

    assert!(matches!(err, AppError::NothingFound));
    assert!(!path.exists());
}

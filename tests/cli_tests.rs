// Command-line behavior of the heapscope binary

use std::io::Write;
use std::process::Command;

use serde_json::Value;
use tempfile::NamedTempFile;

fn heapscope() -> Command {
    Command::new(env!("CARGO_BIN_EXE_heapscope"))
}

fn program(source: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(source.as_bytes()).unwrap();
    file
}

fn report(command: &mut Command) -> Value {
    let output = command.output().unwrap();
    assert!(output.status.success(), "exit status {:?}", output.status);
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_missing_argument_reports_usage() {
    let value = report(&mut heapscope());
    assert_eq!(value["success"], false);
    assert_eq!(
        value["error"],
        "Expected a single argument with the path to the code file."
    );
}

#[test]
fn test_extra_arguments_report_usage() {
    let value = report(heapscope().args(["a.py", "b.py"]));
    assert_eq!(value["success"], false);
    assert!(value["error"].is_string());
}

#[test]
fn test_unknown_flag_reports_usage() {
    let file = program("x = 1\n");
    let value = report(heapscope().arg(file.path()).arg("--bogus"));
    assert_eq!(value["success"], false);
    assert_eq!(
        value["error"],
        "Expected a single argument with the path to the code file."
    );
}

#[test]
fn test_invalid_option_value_reports_usage() {
    let file = program("x = 1\n");
    let value = report(heapscope().args(["--max-depth", "x"]).arg(file.path()));
    assert_eq!(value["success"], false);
    assert!(value["error"].is_string());
}

#[test]
fn test_help_is_plain_text() {
    let output = heapscope().arg("--help").output().unwrap();
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("--max-items"), "{}", text);
}

#[test]
fn test_traces_file() {
    let file = program("x = 1\nprint(x + 1)\n");
    let value = report(heapscope().arg(file.path()));
    assert_eq!(value["success"], true);
    assert_eq!(value["stdout"], "2\n");
    assert_eq!(value["stderr"], "");
    assert!(value.get("error").is_none());

    let events = value["events"].as_array().unwrap();
    assert_eq!(events[0]["event"], "call");
    assert_eq!(events[0]["function"], "<module>");
    assert_eq!(events.last().unwrap()["event"], "return");
}

#[test]
fn test_missing_file_is_reported_as_json() {
    let value = report(heapscope().arg("/nonexistent/heapscope/prog.py"));
    assert_eq!(value["success"], false);
    assert_eq!(value["events"].as_array().map(Vec::len), Some(0));
    let traceback = value["error"]["traceback"].as_str().unwrap();
    assert!(traceback.contains("FileNotFoundError"), "{}", traceback);
}

#[test]
fn test_max_items_flag() {
    let file = program("xs = [1, 2, 3, 4]\n");
    let value = report(heapscope().arg("--max-items").arg("1").arg(file.path()));
    let last = value["events"].as_array().unwrap().last().unwrap().clone();
    let list_id = last["memory"]["frames"][0]["locals"]["xs"]["objectId"]
        .as_str()
        .unwrap()
        .to_string();
    let list = last["memory"]["objects"]
        .as_array()
        .unwrap()
        .iter()
        .find(|node| node["id"] == list_id.as_str())
        .unwrap()
        .clone();
    assert_eq!(list["elements"].as_array().unwrap().len(), 1);
    assert_eq!(list["truncated"], true);
}

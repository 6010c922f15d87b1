use std::io::Write;
use std::process::{Command, Output, Stdio};

fn validator() -> Command {
    Command::new(env!("CARGO_BIN_EXE_webcl-validator"))
}

fn write_kernel(dir: &tempfile::TempDir, name: &str, source: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, source).unwrap();
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn accepted_kernel_is_printed_with_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_kernel(&dir, "ok.cl", "kernel void k(global int* a, uint i) { a[i] = 0; }\n");
    let output = validator().arg(&path).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.starts_with("/* WebCL Validator JSON header"));
    assert!(text.contains("kernel void k(global int* a, ulong _wcl_a_size, uint i) { a[i % _wcl_a_size] = 0; }"));
}

#[test]
fn illegal_kernel_fails_with_diagnostics_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_kernel(&dir, "bad.cl", "struct S { int x; };\nkernel void k(struct S s) { }\n");
    let output = validator().arg(&path).output().unwrap();
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(stderr(&output).contains("structure or union"));
}

#[test]
fn standard_input_is_read_for_dash() {
    let mut child = validator()
        .arg("-")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"kernel void k(global float* p) { *p = 1.0f; }")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("p[0 % _wcl_p_size] = 1.0f;"));
}

#[test]
fn werror_turns_warnings_into_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_kernel(&dir, "warn.cl", "kernel void k(global int* a) { a[0]; }\n");

    let output = validator().arg(&path).output().unwrap();
    assert!(output.status.success());
    assert!(stderr(&output).contains("expression result unused"));

    let output = validator().arg(&path).arg("-Werror").output().unwrap();
    assert!(!output.status.success());

    let output = validator().arg(&path).arg("-w").output().unwrap();
    assert!(output.status.success());
    assert!(!stderr(&output).contains("expression result unused"));
}

#[test]
fn help_and_missing_arguments_print_usage() {
    for args in [vec![], vec!["-help"], vec!["-h"], vec!["--help"]] {
        let output = validator().args(&args).output().unwrap();
        assert!(!output.status.success(), "args: {:?}", args);
        assert!(output.stdout.is_empty());
        assert!(stderr(&output).contains("Usage"), "args: {:?}", args);
    }
}

#[test]
fn descriptors_are_written_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_kernel(&dir, "k.cl", "kernel void k(global int* a, float s) { a[0] = 1; }\n");
    let json_path = dir.path().join("kernels.json");
    let output = validator()
        .arg("--descriptors")
        .arg(&json_path)
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    let params = json[0]["parameters"].as_array().unwrap();
    assert_eq!(json[0]["name"], "k");
    assert_eq!(params.len(), 3);
    assert_eq!(params[0]["kind"], "pointer");
    assert_eq!(params[0]["size-parameter"], "_wcl_a_size");
    assert_eq!(params[1]["kind"], "size-companion");
    assert_eq!(params[1]["owner"], "a");
    assert_eq!(params[2]["type"], "float");
}

#[test]
fn config_file_changes_synthesized_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_kernel(&dir, "k.cl", "kernel void k(global int* a) { a[0] = 1; }\n");
    let config = write_kernel(&dir, "validator.toml", "variable_prefix = \"_sbx\"\n");
    let output = validator()
        .arg("--config")
        .arg(&config)
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("ulong _sbx_a_size"));
}

#[test]
fn missing_input_file_is_an_error() {
    let output = validator().arg("/nonexistent/kernel.cl").output().unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("error: cannot read"));
}

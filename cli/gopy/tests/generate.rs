//! End-to-end tests for the `gopy` binary.

use std::path::Path;
use std::process::{Command, Output};

const HEADER: &str = "\
/* Code generated by cmd/cgo; DO NOT EDIT. */
extern size_t _GoStringLen(_GoString_ s);

#ifdef __cplusplus
extern \"C\" {
#endif

// adds two numbers
extern GoInt64 add(GoInt64 a, GoInt64 b);

// Repeats s n times.
extern GoString repeat(GoString s, GoInt64 n);

#ifdef __cplusplus
}
#endif
";

const SIGNATURES: &str = r#"
[signatures]
add = "func add(a, b int64) int64"
repeat = "func repeat(s string, n int64) string"
"#;

fn gopy(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gopy"))
        .args(args)
        .current_dir(dir)
        .env_remove("GOPY_LOG")
        .output()
        .expect("failed to run gopy")
}

fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("demo.h"), HEADER).unwrap();
    std::fs::write(dir.path().join("sigs.toml"), SIGNATURES).unwrap();
    dir
}

#[test]
fn generate_writes_module() {
    let dir = project();
    let out = gopy(
        dir.path(),
        &[
            "generate",
            "--header",
            "demo.h",
            "--library",
            "./demo.so",
            "--signatures",
            "sigs.toml",
            "--output",
            "py/demo.py",
        ],
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let module = std::fs::read_to_string(dir.path().join("py/demo.py")).unwrap();
    assert!(module.starts_with("# Code generated by gopy. DO NOT EDIT."));
    assert!(module.contains("_lib = ctypes.CDLL('./demo.so')"));
    assert!(module.contains("def add(a: int, b: int) -> int:\n    \"\"\"adds two numbers\"\"\""));
    assert!(module.contains("return from_go_string(_lib.repeat(go_string(s), n))"));
    assert!(String::from_utf8_lossy(&out.stdout).contains("2 functions"));
}

#[test]
fn generate_to_stdout_is_stable() {
    let dir = project();
    let args = [
        "generate",
        "--header",
        "demo.h",
        "--library",
        "./demo.so",
        "--signatures",
        "sigs.toml",
    ];
    let first = gopy(dir.path(), &args);
    let second = gopy(dir.path(), &args);
    assert!(first.status.success());
    assert!(!first.stdout.is_empty());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn failure_writes_nothing() {
    let dir = project();
    std::fs::write(
        dir.path().join("sigs.toml"),
        "[signatures]\nadd = \"func add(a, b complex128) complex128\"\nrepeat = \"func repeat(s string, n int64) string\"\n",
    )
    .unwrap();
    let out = gopy(
        dir.path(),
        &[
            "generate",
            "--header",
            "demo.h",
            "--library",
            "./demo.so",
            "--signatures",
            "sigs.toml",
            "--output",
            "demo.py",
        ],
    );
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("complex128"));
    assert!(!dir.path().join("demo.py").exists());
}

#[test]
fn manifest_with_command_oracle() {
    let dir = project();
    std::fs::write(
        dir.path().join("gopy.toml"),
        r#"
[package]
import-path = "example.com/demo"
header = "demo.h"
library = "./demo.so"
output = "demo.py"

[oracle]
command = ["sh", "-c", "echo \"func $2(a, b int64) int64\"", "oracle"]

[generation]
load-mode = "deferred"
"#,
    )
    .unwrap();

    // `repeat` gets an int64 signature from the fake oracle.
    let out = gopy(dir.path(), &["generate"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let module = std::fs::read_to_string(dir.path().join("demo.py")).unwrap();
    assert!(module.contains("def init(dll_path: str = './demo.so') -> None:"));
    assert!(module.contains("    _lib.repeat.argtypes = [ctypes.c_longlong, ctypes.c_longlong]"));
    assert!(module.contains("def repeat(a: int, b: int) -> int:"));
}

#[test]
fn inspect_json() {
    let dir = project();
    let out = gopy(
        dir.path(),
        &["inspect", "--header", "demo.h", "--header-only", "--export", "json"],
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let funcs: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(funcs[0]["name"], "add");
    assert_eq!(funcs[0]["native_return_type"], "int64");
    assert_eq!(funcs[0]["doc_comment"], "adds two numbers");
    assert_eq!(funcs[1]["parameters"][0]["native_type"], "string");
}

#[test]
fn missing_library_is_usage_error() {
    let dir = project();
    let out = gopy(dir.path(), &["generate", "--header", "demo.h", "--header-only"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("no library given"));
}

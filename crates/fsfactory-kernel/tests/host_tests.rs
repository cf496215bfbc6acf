//! End-to-end tests: config file on disk, bootstrapped host, calls by name.

use std::io;
use std::sync::Arc;

use fsfactory_kernel::{AppConfig, ComponentFactory, ComponentHost, Error, Value};
use rstest::rstest;
use serde_json::json;
use tempfile::TempDir;

const APP_TOML: &str = r##"
[components.scratch]
root_type = "MemoryAdapter"
plugins = ["ListPaths", "EmptyDir", "ForcedCopy"]

[components.docs]
adapter = "ReadOnlyAdapter"
adapter_params = [{ type = "MemoryAdapter", params = [{ "guide/intro.md" = "# Intro", "index.md" = "home" }] }]
plugins = ["ListFiles"]
"##;

/// Write `contents` to `name` in a fresh temp dir and bootstrap from it.
fn host_from_file(name: &str, contents: &str) -> (TempDir, ComponentHost) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();

    let config = AppConfig::load(&path).unwrap();
    let host = ComponentHost::bootstrap(&ComponentFactory::with_builtins(), &config).unwrap();
    (dir, host)
}

#[tokio::test]
async fn test_write_then_read() {
    let (_dir, host) = host_from_file("app.toml", APP_TOML);
    assert_eq!(host.names(), vec!["docs", "scratch"]);

    let out = host
        .invoke("scratch", "write", vec![json!("file.txt"), json!("hello")])
        .await
        .unwrap();
    assert_eq!(out, json!(true));

    let out = host
        .invoke("scratch", "read", vec![json!("file.txt")])
        .await
        .unwrap();
    assert_eq!(out, json!("hello"));
}

#[tokio::test]
async fn test_seeded_read_only_component() {
    let (_dir, host) = host_from_file("app.toml", APP_TOML);

    let out = host
        .invoke("docs", "read", vec![json!("guide/intro.md")])
        .await
        .unwrap();
    assert_eq!(out, json!("# Intro"));

    let err = host
        .invoke("docs", "write", vec![json!("new.md"), json!("x")])
        .await
        .unwrap_err();
    match err {
        Error::Io(e) => assert_eq!(e.kind(), io::ErrorKind::PermissionDenied),
        other => panic!("expected io error, got {other:?}"),
    }

    let files = host
        .invoke("docs", "list_files", vec![json!(""), json!(true)])
        .await
        .unwrap();
    let paths: Vec<_> = files
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, vec!["guide/intro.md", "index.md"]);
}

#[tokio::test]
async fn test_full_lifecycle() {
    let (_dir, host) = host_from_file("app.toml", APP_TOML);
    let host = &host;
    let call = move |op: &'static str, args: Vec<Value>| host.invoke("scratch", op, args);

    call("create_dir", vec![json!("a/b")]).await.unwrap();
    call("write", vec![json!("a/b/one.txt"), json!("1")]).await.unwrap();
    call("put", vec![json!("a/two.txt"), json!("2")]).await.unwrap();
    call("put", vec![json!("a/two.txt"), json!("22")]).await.unwrap();
    call("copy", vec![json!("a/two.txt"), json!("three.txt")]).await.unwrap();
    call("rename", vec![json!("three.txt"), json!("a/three.txt")]).await.unwrap();

    let paths = call("list_paths", vec![json!("a"), json!(true)]).await.unwrap();
    assert_eq!(
        paths,
        json!(["a/b", "a/b/one.txt", "a/three.txt", "a/two.txt"])
    );

    let size = call("get_size", vec![json!("a/two.txt")]).await.unwrap();
    assert_eq!(size, json!(2));

    let meta = call("get_metadata", vec![json!("a/b")]).await.unwrap();
    assert_eq!(meta["type"], json!("dir"));

    let out = call("read_and_delete", vec![json!("a/three.txt")]).await.unwrap();
    assert_eq!(out, json!("22"));
    assert_eq!(call("has", vec![json!("a/three.txt")]).await.unwrap(), json!(false));

    call("empty_dir", vec![json!("a")]).await.unwrap();
    assert_eq!(call("list_contents", vec![json!("a")]).await.unwrap(), json!([]));

    call("delete_dir", vec![json!("a")]).await.unwrap();
    assert_eq!(call("has", vec![json!("a")]).await.unwrap(), json!(false));
}

#[tokio::test]
async fn test_operation_failures_pass_through() {
    let (_dir, host) = host_from_file("app.toml", APP_TOML);

    let err = host
        .invoke("scratch", "read", vec![json!("missing.txt")])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::NotFound));

    let err = host
        .invoke("scratch", "frobnicate", vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedOperation(ref op) if op == "frobnicate"));

    let err = host.invoke("nope", "has", vec![json!("x")]).await.unwrap_err();
    assert!(matches!(err, Error::UnknownComponent(ref name) if name == "nope"));
}

#[tokio::test]
async fn test_json_config() {
    let json_config = r#"{
        "components": {
            "main": {
                "root_type": "MemoryAdapter",
                "root_args": [{ "hello.txt": "hi" }],
                "extra_options": { "disable_asserts": true }
            }
        }
    }"#;
    let (_dir, host) = host_from_file("app.json", json_config);

    // Asserts are off, so write over an existing file succeeds
    host.invoke("main", "write", vec![json!("hello.txt"), json!("bye")])
        .await
        .unwrap();
    let out = host.invoke("main", "read", vec![json!("hello.txt")]).await.unwrap();
    assert_eq!(out, json!("bye"));
}

#[tokio::test]
async fn test_visibility_and_mimetype_from_config() {
    let config = r#"
        [components.private]
        root_type = "MemoryAdapter"
        extra_options = { visibility = "private" }
    "#;
    let (_dir, host) = host_from_file("app.toml", config);
    let host = &host;
    let call = move |op: &'static str, args: Vec<Value>| host.invoke("private", op, args);

    call("write", vec![json!("report.pdf"), json!("%PDF")]).await.unwrap();
    call("write", vec![json!("shared.txt"), json!("hi"), json!({"visibility": "public"})])
        .await
        .unwrap();

    assert_eq!(call("get_visibility", vec![json!("report.pdf")]).await.unwrap(), json!("private"));
    assert_eq!(call("get_visibility", vec![json!("shared.txt")]).await.unwrap(), json!("public"));
    assert_eq!(
        call("get_mimetype", vec![json!("report.pdf")]).await.unwrap(),
        json!("application/pdf")
    );

    call("set_visibility", vec![json!("report.pdf"), json!("public")]).await.unwrap();
    assert_eq!(call("get_visibility", vec![json!("report.pdf")]).await.unwrap(), json!("public"));
}

#[tokio::test]
async fn test_read_only_component_refuses_visibility_changes() {
    let (_dir, host) = host_from_file("app.toml", APP_TOML);

    let out = host.invoke("docs", "get_visibility", vec![json!("index.md")]).await.unwrap();
    assert_eq!(out, json!("public"));

    let err = host
        .invoke("docs", "set_visibility", vec![json!("index.md"), json!("private")])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::PermissionDenied));
}

#[test]
fn test_bootstrap_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(
        &path,
        r#"
        [components.good]
        root_type = "MemoryAdapter"

        [components.broken]
        root_type = "NoSuchAdapter"
        "#,
    )
    .unwrap();

    let config = AppConfig::load(&path).unwrap();
    let err = ComponentHost::bootstrap(&ComponentFactory::with_builtins(), &config).unwrap_err();
    assert!(
        matches!(err, Error::Construction { ref type_name, .. } if type_name == "NoSuchAdapter")
    );
}

#[rstest]
#[case::json(
    "app.json",
    r#"{"components": {"main": {"root_type": "MemoryAdapter", "plugins": [{"params": []}]}}}"#
)]
#[case::toml(
    "app.toml",
    "[components.main]\nroot_type = \"MemoryAdapter\"\nplugins = [{ params = [] }]\n"
)]
fn test_malformed_plugin_spec_is_invalid_spec(#[case] name: &str, #[case] contents: &str) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();

    let err: Error = AppConfig::load(&path).unwrap_err().into();
    assert!(
        matches!(err, Error::InvalidSpec(ref msg) if msg.contains("components.main.plugins[0]")),
        "got {err:?}"
    );

    let err = ComponentHost::load(&ComponentFactory::with_builtins(), &path).unwrap_err();
    assert!(matches!(err, Error::InvalidSpec(_)), "got {err:?}");
}

#[test]
fn test_load_then_bootstrap() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.toml");
    std::fs::write(&path, APP_TOML).unwrap();

    let host = ComponentHost::load(&ComponentFactory::with_builtins(), &path).unwrap();
    assert_eq!(host.names(), vec!["docs", "scratch"]);
}

#[test]
fn test_config_errors() {
    let dir = tempfile::tempdir().unwrap();

    let err = AppConfig::load(dir.path().join("missing.toml")).unwrap_err();
    assert!(err.to_string().contains("missing.toml"), "got: {err}");

    let yaml = dir.path().join("app.yaml");
    std::fs::write(&yaml, "components: {}").unwrap();
    let err: Error = AppConfig::load(&yaml).unwrap_err().into();
    assert!(matches!(err, Error::Config(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_invokes() {
    let (_dir, host) = host_from_file("app.toml", APP_TOML);
    let host = Arc::new(host);

    let mut handles = Vec::new();
    for i in 0..32 {
        let host = Arc::clone(&host);
        handles.push(tokio::spawn(async move {
            let path = format!("jobs/{i}.txt");
            host.invoke("scratch", "write", vec![json!(&path), json!(format!("job {i}"))])
                .await?;
            host.invoke("scratch", "read", vec![json!(path)]).await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let out = handle.await.unwrap().unwrap();
        assert_eq!(out, json!(format!("job {i}")));
    }

    let paths = host
        .invoke("scratch", "list_paths", vec![json!("jobs")])
        .await
        .unwrap();
    assert_eq!(paths.as_array().unwrap().len(), 32);
}

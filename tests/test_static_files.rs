use std::fs;
use std::sync::Arc;

use handspun::config::{Config, StaticFilesConfig};
use handspun::http::connection::Connection;
use handspun::router::static_files::sanitize;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

fn site() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("hello.txt"), "hello from disk\n").unwrap();
    fs::write(dir.path().join(".secret"), "hidden").unwrap();
    fs::create_dir(dir.path().join("docs")).unwrap();
    fs::write(dir.path().join("docs").join("a b.txt"), vec![b'x'; 2048]).unwrap();
    fs::create_dir(dir.path().join("blog")).unwrap();
    fs::write(dir.path().join("blog").join("index.html"), "<h1>blog</h1>").unwrap();
    dir
}

async fn get(root: &TempDir, uri: &str) -> String {
    let cfg = Config {
        static_files: StaticFilesConfig {
            root: root.path().to_path_buf(),
            ..StaticFilesConfig::default()
        },
        ..Config::default()
    };

    let (mut client, server) = tokio::io::duplex(64 * 1024);
    let conn = Connection::new(server, Arc::new(handspun::router::Router::new(&cfg)), cfg.max_head_size);
    let task = tokio::spawn(conn.run());

    client
        .write_all(format!("GET {uri} HTTP/1.1\r\n\r\n").as_bytes())
        .await
        .unwrap();
    client.shutdown().await.unwrap();

    let mut raw = Vec::new();
    client.read_to_end(&mut raw).await.unwrap();
    task.await.unwrap().unwrap();
    String::from_utf8(raw).unwrap()
}

#[tokio::test]
async fn test_serves_file_with_declared_length() {
    let root = site();
    let raw = get(&root, "/files/hello.txt").await;

    assert_eq!(
        raw,
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 16\r\n\r\nhello from disk\n"
    );
}

#[tokio::test]
async fn test_query_string_is_ignored() {
    let root = site();
    let raw = get(&root, "/files/hello.txt?download=1").await;
    assert!(raw.ends_with("\r\n\r\nhello from disk\n"));
}

#[tokio::test]
async fn test_percent_encoded_names() {
    let root = site();
    let raw = get(&root, "/files/docs/a%20b.txt").await;
    assert!(raw.contains("Content-Length: 2048\r\n"));
}

#[tokio::test]
async fn test_directory_serves_index_file() {
    let root = site();
    let raw = get(&root, "/files/blog").await;
    assert!(raw.contains("Content-Type: text/html\r\n"));
    assert!(raw.ends_with("<h1>blog</h1>"));
}

#[tokio::test]
async fn test_directory_without_index_is_listed() {
    let root = site();
    let raw = get(&root, "/files/").await;

    assert!(raw.starts_with("HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\n"));
    assert!(raw.contains("<a href=\"blog/\">blog/</a>"));
    assert!(raw.contains("<a href=\"docs/\">docs/</a>"));
    assert!(raw.contains("<a href=\"hello.txt\">hello.txt</a>"));
    assert!(!raw.contains(".secret"));

    let listing = get(&root, "/files/docs").await;
    assert!(listing.contains("a b.txt"));
    assert!(listing.contains("2.00"));
}

#[tokio::test]
async fn test_missing_and_forbidden_paths_are_404() {
    let root = site();
    for uri in ["/files/nope.txt", "/files/.secret", "/files/docs/..%2f.secret"] {
        let raw = get(&root, uri).await;
        assert_eq!(
            raw,
            "HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\n\r\nNot Found",
            "uri {uri}"
        );
    }
}

#[test]
fn test_sanitize_components() {
    assert_eq!(sanitize("a/b.txt").unwrap(), vec!["a", "b.txt"]);
    assert_eq!(sanitize("a//b?x=1#frag").unwrap(), vec!["a", "b"]);
    assert_eq!(sanitize("a%20b").unwrap(), vec!["a b"]);
    assert!(sanitize("").unwrap().is_empty());
}

#[test]
fn test_sanitize_never_escapes_root() {
    assert!(sanitize("../../etc/passwd").is_err());
    assert!(sanitize("../hello.txt").is_err());
    assert!(sanitize("docs/./a").is_err());
    assert!(sanitize("%2e%2e/x").is_err());
    assert!(sanitize(".%2E/x").is_err());
    assert!(sanitize("a\\..\\b").is_err());
    assert!(sanitize("a/..%2fb").is_err());
    assert!(sanitize("a%5cb").is_err());
    assert!(sanitize("a%00b").is_err());
    assert!(sanitize(".git/config").is_err());
}

#[test]
fn test_sanitize_keeps_url_lookalikes_relative() {
    assert_eq!(sanitize("notes:v1.txt").unwrap(), vec!["notes:v1.txt"]);
    assert_eq!(sanitize("//evil/hello.txt").unwrap(), vec!["evil", "hello.txt"]);
    assert_eq!(sanitize("http://evil/x").unwrap(), vec!["http:", "evil", "x"]);
    assert_eq!(sanitize("docs?a=../b").unwrap(), vec!["docs"]);
}

#[tokio::test]
async fn test_colon_in_name_serves_that_file() {
    let root = site();
    fs::write(root.path().join("v1.txt"), "wrong\n").unwrap();
    fs::write(root.path().join("notes:v1.txt"), "right\n").unwrap();

    let raw = get(&root, "/files/notes:v1.txt").await;
    assert!(raw.ends_with("\r\n\r\nright\n"), "{raw}");

    let raw = get(&root, "/files/../hello.txt").await;
    assert!(raw.starts_with("HTTP/1.1 404 Not Found\r\n"));
}

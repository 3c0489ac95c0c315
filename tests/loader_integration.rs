//! Loader scenarios against a canned catalog server.
//!
//! Artifact installation itself needs a compiled cdylib, so these tests
//! exercise everything up to the dynamic-library boundary: catalog fetch,
//! batch loading, failure isolation, revocation bookkeeping, and the event
//! stream. The declaration/registrar layer is covered by unit tests in
//! ostinato-loader and the class-replacement semantics by host integration.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::Arc;

use ostinato::{derived_class_name, LoaderEvent, PluginLoader, PluginRegistry};

/// Serve canned responses: the catalog body on `/api/plugins/list`, 404 for
/// everything else. Handles up to `max_requests` connections.
fn serve_catalog(catalog_body: &'static str, max_requests: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        for _ in 0..max_requests {
            let Ok((mut stream, _)) = listener.accept() else {
                break;
            };
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            let _ = reader.read_line(&mut request_line);

            let (status, body) = if request_line.contains("/api/plugins/list") {
                ("200 OK", catalog_body)
            } else {
                ("404 Not Found", "not here")
            };
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    format!("http://{addr}")
}

fn loader_for(base_url: String) -> (Arc<PluginLoader>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let loader = Arc::new(
        PluginLoader::new(
            Arc::new(PluginRegistry::empty()),
            base_url,
            dir.path().join("artifacts"),
        )
        .unwrap(),
    );
    (loader, dir)
}

#[test]
fn test_load_all_returns_catalog_and_isolates_failures() {
    let base = serve_catalog(
        r#"{ "plugins": [
            { "id": "foo", "name": "Foo", "filename": "foo.so", "enabled": true },
            { "id": "bar", "name": "Bar", "filename": "bar.so", "enabled": false }
        ] }"#,
        4,
    );
    let (loader, _dir) = loader_for(base);
    let events = loader.subscribe();

    let entries = loader.load_all().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, "foo");

    // foo's artifact 404s; the failure is reported, not raised, and the
    // disabled bar entry is never attempted.
    match events.try_recv() {
        Ok(LoaderEvent::LoadFailed { id, .. }) => assert_eq!(id, "foo"),
        other => panic!("expected LoadFailed for foo, got {other:?}"),
    }
    assert!(events.try_recv().is_err(), "no event expected for bar");
    assert!(!loader.is_loaded("foo"));
    assert!(!loader.registry().contains("foo"));
}

#[test]
fn test_check_for_updates_attempts_only_enabled_entries() {
    let base = serve_catalog(
        r#"{ "plugins": [
            { "id": "foo", "name": "Foo", "filename": "foo.so", "enabled": false }
        ] }"#,
        2,
    );
    let (loader, _dir) = loader_for(base);
    let events = loader.subscribe();

    loader.check_for_updates();
    assert!(loader.loaded_ids().is_empty());
    assert!(events.try_recv().is_err());
}

#[test]
fn test_reload_unknown_entry_is_false() {
    let base = serve_catalog(r#"{ "plugins": [] }"#, 2);
    let (loader, _dir) = loader_for(base);
    assert!(!loader.reload("ghost"));
}

#[test]
fn test_derived_class_name_convention() {
    // The advisory naming rule artifacts are documented against.
    assert_eq!(derived_class_name("my-plugin"), "MyPluginPlugin");
    assert_eq!(derived_class_name("amapiano-bass"), "AmapianoBassPlugin");
}

#[test]
fn test_catalog_url_normalised() {
    let dir = tempfile::tempdir().unwrap();
    let loader = PluginLoader::new(
        Arc::new(PluginRegistry::empty()),
        "http://localhost:9000/",
        dir.path(),
    )
    .unwrap();
    assert_eq!(loader.catalog_url(), "http://localhost:9000");
}

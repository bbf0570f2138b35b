use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tempfile::TempDir;
use tokio::sync::mpsc;
use wren_cache::{CacheKey, Transform, TransformCache, TransformError, TransformOutput};
use wren_importmap::{GenerateOptions, ImportMap};
use wren_reload::{
    ClientHub, EntryPoint, Manifest, ManifestSource, Orchestrator, ReloadMessage,
    ScannedEntryPoints, SharedImportMap,
};
use wren_watch::{FileEvent, IgnoreMatcher};

struct Project {
    dir: TempDir,
    cache: Arc<TransformCache>,
    hub: Arc<ClientHub>,
    import_map: SharedImportMap,
}

impl Project {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            cache: Arc::new(TransformCache::new(1024 * 1024)),
            hub: Arc::new(ClientHub::new(8)),
            import_map: Arc::new(RwLock::new(ImportMap::new())),
        }
    }

    fn root(&self) -> PathBuf {
        self.dir.path().canonicalize().unwrap()
    }

    fn write(&self, file: &str, contents: &str) {
        let path = self.root().join(file);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn cache_module(&self, path: &str, dependencies: &[&str]) {
        self.cache.set(
            CacheKey::new(path, SystemTime::UNIX_EPOCH, 1),
            b"compiled".to_vec(),
            dependencies.iter().map(|d| d.to_string()).collect(),
        );
    }

    fn orchestrator(&self) -> Orchestrator {
        let ignore = IgnoreMatcher::new(&["node_modules"]).unwrap();
        Orchestrator::new(
            self.root(),
            Arc::clone(&self.cache),
            Arc::clone(&self.hub),
            Arc::clone(&self.import_map),
            ScannedEntryPoints::new(self.root(), ignore),
        )
    }

    fn event(&self, files: &[&str]) -> FileEvent {
        FileEvent {
            paths: files.iter().map(|f| self.root().join(f)).collect(),
            has_creates: false,
            has_deletes: false,
            has_package_metadata_change: false,
            timestamp: SystemTime::now(),
        }
    }
}

fn received(rx: &mut mpsc::Receiver<String>) -> Option<ReloadMessage> {
    rx.try_recv()
        .ok()
        .map(|json| serde_json::from_str(&json).unwrap())
}

#[tokio::test]
async fn only_the_importing_page_is_reloaded() {
    let project = Project::new();
    project.write(
        "a/index.html",
        r#"<script type="module" src="./a.js"></script>"#,
    );
    project.write(
        "b/index.html",
        r#"<script type="module">import 'lit';</script>"#,
    );
    project.write("a/a.js", "import '../shared/util.js';");
    project.write("shared/util.js", "export const x = 1;");
    project.cache_module("a/a.js", &["shared/util.js"]);
    project.cache_module("shared/util.js", &[]);

    let (_, mut rx_a) = project.hub.register("/a/");
    let (_, mut rx_b) = project.hub.register("http://localhost:8000/b/index.html");

    let mut orchestrator = project.orchestrator();
    let report = orchestrator.process_batch(project.event(&["shared/util.js"]));

    assert_eq!(report.changed, vec!["shared/util.js"]);
    assert_eq!(report.invalidated, vec!["a/a.js", "shared/util.js"]);
    assert_eq!(report.affected_pages, vec!["/a/"]);
    assert_eq!(report.delivered, 1);

    assert_eq!(
        received(&mut rx_a),
        Some(ReloadMessage::file_change(vec!["shared/util.js".into()]))
    );
    assert_eq!(received(&mut rx_b), None);
    assert!(!project.cache.contains_path("a/a.js"));
}

#[tokio::test]
async fn bare_specifiers_resolve_through_the_import_map() {
    let project = Project::new();
    project.write(
        "demo/index.html",
        r#"<script type="module">import '@org/ui/button.js';</script>"#,
    );
    project.write("other/index.html", r#"<script type="module" src="/other.js"></script>"#);
    project
        .import_map
        .write()
        .insert("@org/ui/", "/packages/ui/src/");

    let (_, mut rx_demo) = project.hub.register("/demo/");
    let (_, mut rx_other) = project.hub.register("/other/");

    let mut orchestrator = project.orchestrator();
    let report = orchestrator.process_batch(project.event(&["packages/ui/src/button.ts"]));

    assert_eq!(report.affected_pages, vec!["/demo/"]);
    assert!(matches!(received(&mut rx_demo), Some(ReloadMessage::Reload { .. })));
    assert_eq!(received(&mut rx_other), None);
}

#[tokio::test]
async fn unaffected_batches_send_nothing() {
    let project = Project::new();
    project.write("index.html", r#"<script type="module" src="./main.js"></script>"#);
    let (_, mut rx) = project.hub.register("/");

    let mut orchestrator = project.orchestrator();
    let report = orchestrator.process_batch(project.event(&["unrelated.js"]));
    assert!(report.affected_pages.is_empty());
    assert_eq!(report.delivered, 0);

    let report = orchestrator.process_batch(project.event(&["notes.txt"]));
    assert!(report.invalidated.is_empty());
    assert_eq!(received(&mut rx), None);
}

#[tokio::test]
async fn editing_the_page_itself_reloads_it() {
    let project = Project::new();
    project.write("index.html", "<html></html>");
    let (_, mut rx) = project.hub.register("/index.html");

    let report = project
        .orchestrator()
        .process_batch(project.event(&["index.html"]));
    assert_eq!(report.affected_pages, vec!["/"]);
    assert!(received(&mut rx).is_some());
}

#[tokio::test]
async fn unreadable_entry_points_are_excluded() {
    let project = Project::new();
    project.write("good/index.html", r#"<script type="module" src="./app.js"></script>"#);
    let bad = project.root().join("bad/index.html");
    std::fs::create_dir_all(bad.parent().unwrap()).unwrap();
    std::fs::write(&bad, [0xff, 0xfe, 0x00, 0x41]).unwrap();

    let report = project
        .orchestrator()
        .process_batch(project.event(&["good/app.js"]));
    assert_eq!(report.affected_pages, vec!["/good/"]);
}

/// Fails for any file containing `syntax error`.
struct StrictTransform;

impl Transform for StrictTransform {
    fn handles(&self, path: &str) -> bool {
        path.ends_with(".ts")
    }

    fn transform(&self, path: &str, source: &[u8]) -> Result<TransformOutput, TransformError> {
        if String::from_utf8_lossy(source).contains("syntax error") {
            return Err(TransformError::Compile {
                path: path.to_string(),
                message: "unexpected token".to_string(),
            });
        }
        Ok(TransformOutput {
            code: source.to_vec(),
            dependencies: Vec::new(),
        })
    }
}

#[tokio::test]
async fn compile_failures_are_reported_instead_of_reloading() {
    let project = Project::new();
    project.write("index.html", r#"<script type="module" src="./card.js"></script>"#);
    project.write("card.ts", "syntax error");
    let (_, mut rx) = project.hub.register("/");

    let mut orchestrator = project.orchestrator().with_transform(Arc::new(StrictTransform));
    let report = orchestrator.process_batch(project.event(&["card.ts"]));
    assert_eq!(report.failed, vec!["card.ts"]);
    match received(&mut rx) {
        Some(ReloadMessage::Error { file, .. }) => assert_eq!(file, "card.ts"),
        other => panic!("expected error message, got {other:?}"),
    }
    assert_eq!(received(&mut rx), None);

    project.write("card.ts", "export const ok = true;");
    let report = orchestrator.process_batch(project.event(&["card.ts"]));
    assert!(report.failed.is_empty());
    assert!(matches!(received(&mut rx), Some(ReloadMessage::Reload { .. })));
    assert!(project.cache.contains_path("card.ts"));
}

#[tokio::test]
async fn package_changes_regenerate_the_import_map() {
    let project = Project::new();
    project.write(
        "package.json",
        r#"{"name":"app","dependencies":{"lit":"^3"}}"#,
    );
    project.write(
        "node_modules/lit/package.json",
        r#"{"name":"lit","exports":"./index.js"}"#,
    );

    let mut orchestrator = project
        .orchestrator()
        .with_import_map_generation(GenerateOptions::default());
    let mut event = project.event(&["package.json"]);
    event.has_package_metadata_change = true;
    let report = orchestrator.process_batch(event);

    assert!(report.import_map_regenerated);
    assert_eq!(
        project.import_map.read().imports["lit"],
        "/node_modules/lit/index.js"
    );
}

struct StubManifest;

impl ManifestSource for StubManifest {
    fn manifest(&self) -> Option<Manifest> {
        Some(Manifest {
            bytes: b"{}".to_vec(),
            touched: vec!["/elements/card/card.template".to_string()],
        })
    }
}

#[tokio::test]
async fn manifest_paths_count_as_source_files() {
    let project = Project::new();
    project.cache_module("elements/card/card.js", &["elements/card/card.template"]);

    let mut orchestrator = project.orchestrator().with_manifest(Arc::new(StubManifest));
    let report = orchestrator.process_batch(project.event(&["elements/card/card.template"]));
    assert_eq!(
        report.invalidated,
        vec!["elements/card/card.js", "elements/card/card.template"]
    );
}

#[tokio::test]
async fn spawned_loop_stops_when_events_close() {
    let project = Project::new();
    project.write("index.html", r#"<script type="module" src="./main.js"></script>"#);
    let (_, mut rx) = project.hub.register("/");

    let (tx, events) = mpsc::channel(4);
    let handle = project.orchestrator().spawn(events);
    tx.send(project.event(&["main.js"])).await.unwrap();
    drop(tx);
    handle.await.unwrap();

    assert!(matches!(received(&mut rx), Some(ReloadMessage::Reload { .. })));
}

#[test]
fn static_entry_lists_work_as_sources() {
    let dir = TempDir::new().unwrap();
    let root: &Path = dir.path();
    std::fs::write(root.join("page.html"), r#"<script type="module" src="./x.js"></script>"#)
        .unwrap();

    let mut orchestrator = Orchestrator::new(
        root,
        Arc::new(TransformCache::new(1024)),
        Arc::new(ClientHub::new(1)),
        Arc::new(RwLock::new(ImportMap::new())),
        vec![EntryPoint::from_file("page.html")],
    );
    let event = FileEvent {
        paths: vec![orchestrator.root().join("x.ts")],
        has_creates: false,
        has_deletes: false,
        has_package_metadata_change: false,
        timestamp: SystemTime::now(),
    };
    let report = orchestrator.process_batch(event);
    assert_eq!(report.affected_pages, vec!["/page.html"]);
}

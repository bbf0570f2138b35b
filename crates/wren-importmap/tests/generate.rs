use std::path::Path;
use tempfile::TempDir;
use wren_importmap::{GenerateOptions, ImportMap, generate};

fn write(path: &Path, contents: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn generate_default(root: &Path) -> ImportMap {
    generate(root, &GenerateOptions::default()).unwrap()
}

#[test]
fn no_package_json_gives_empty_map() {
    let dir = TempDir::new().unwrap();
    let map = generate_default(dir.path());
    assert!(map.is_empty());
}

#[test]
fn invalid_root_package_json_is_an_error() {
    let dir = TempDir::new().unwrap();
    write(&dir.path().join("package.json"), "{");
    assert!(generate(dir.path(), &GenerateOptions::default()).is_err());
}

#[test]
fn single_package_registers_own_exports_from_root() {
    let dir = TempDir::new().unwrap();
    write(
        &dir.path().join("package.json"),
        r#"{
            "name": "my-components",
            "exports": {
                ".": "./index.js",
                "./lib/*": "./lib/*",
                "./components/*": "./components/*"
            }
        }"#,
    );

    let map = generate_default(dir.path());
    assert_eq!(map.imports["my-components"], "/index.js");
    assert_eq!(map.imports["my-components/lib/"], "/lib/");
    assert_eq!(map.imports["my-components/components/"], "/components/");
    assert!(!map.imports.contains_key("my-components/"));
    assert_eq!(map.imports.len(), 3);
}

#[test]
fn installed_dependencies_resolve_under_node_modules() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        &root.join("package.json"),
        r#"{"name":"app","dependencies":{"wildcard-lib":"^1","legacy":"^1","missing":"^1"}}"#,
    );
    write(
        &root.join("node_modules/wildcard-lib/package.json"),
        r#"{"name":"wildcard-lib","exports":{".":"./index.js","./*":"./src/*"}}"#,
    );
    write(
        &root.join("node_modules/legacy/package.json"),
        r#"{"name":"legacy","main":"dist/legacy.js"}"#,
    );

    let map = generate_default(root);
    assert_eq!(map.imports["wildcard-lib"], "/node_modules/wildcard-lib/index.js");
    assert_eq!(map.imports["wildcard-lib/"], "/node_modules/wildcard-lib/src/");
    assert_eq!(map.imports["legacy"], "/node_modules/legacy/dist/legacy.js");
    assert_eq!(map.imports["legacy/"], "/node_modules/legacy/");
    assert!(!map.imports.contains_key("missing"));
    // The app has no exports or main of its own.
    assert!(!map.imports.contains_key("app"));
}

#[test]
fn transitive_dependencies_live_in_scopes() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        &root.join("package.json"),
        r#"{"name":"my-app","dependencies":{"lit":"^3.0.0"}}"#,
    );
    write(
        &root.join("node_modules/lit/package.json"),
        r#"{
            "name": "lit",
            "dependencies": {"@lit/reactive-element": "^2.0.0"},
            "exports": {".": "./index.js", "./decorators.js": "./decorators.js"}
        }"#,
    );
    write(
        &root.join("node_modules/@lit/reactive-element/package.json"),
        r#"{
            "name": "@lit/reactive-element",
            "exports": {".": "./reactive-element.js", "./decorators/*": "./decorators/*.js"}
        }"#,
    );

    let map = generate_default(root);
    assert_eq!(map.imports["lit"], "/node_modules/lit/index.js");
    assert_eq!(map.imports["lit/decorators.js"], "/node_modules/lit/decorators.js");
    assert!(!map.imports.contains_key("@lit/reactive-element"));

    let lit_scope = &map.scopes["/node_modules/lit/"];
    assert_eq!(
        lit_scope["@lit/reactive-element"],
        "/node_modules/@lit/reactive-element/reactive-element.js"
    );
    assert_eq!(
        lit_scope["@lit/reactive-element/decorators/"],
        "/node_modules/@lit/reactive-element/decorators/"
    );
}

#[test]
fn only_the_dependency_tree_gets_scopes() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        &root.join("package.json"),
        r#"{"name":"app","dependencies":{"pkg-a":"^1"}}"#,
    );
    write(
        &root.join("node_modules/pkg-a/package.json"),
        r#"{"name":"pkg-a","dependencies":{"pkg-b":"^1"},"exports":"./index.js"}"#,
    );
    write(
        &root.join("node_modules/pkg-b/package.json"),
        r#"{"name":"pkg-b","exports":"./index.js"}"#,
    );
    write(
        &root.join("node_modules/pkg-unused/package.json"),
        r#"{"name":"pkg-unused","dependencies":{"pkg-b":"^1"},"exports":"./index.js"}"#,
    );

    let map = generate_default(root);
    assert_eq!(
        map.scopes["/node_modules/pkg-a/"]["pkg-b"],
        "/node_modules/pkg-b/index.js"
    );
    assert!(!map.scopes.contains_key("/node_modules/pkg-unused/"));
    assert!(!map.scopes.contains_key("/node_modules/pkg-b/"));
}

#[test]
fn nested_versions_are_scoped_to_their_parent() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        &root.join("package.json"),
        r#"{"name":"app","dependencies":{"dep":"^2","old":"^1"}}"#,
    );
    write(
        &root.join("node_modules/dep/package.json"),
        r#"{"name":"dep","exports":"./v2.js"}"#,
    );
    write(
        &root.join("node_modules/old/package.json"),
        r#"{"name":"old","dependencies":{"dep":"^1"},"exports":"./index.js"}"#,
    );
    write(
        &root.join("node_modules/old/node_modules/dep/package.json"),
        r#"{"name":"dep","exports":"./v1.js"}"#,
    );

    let map = generate_default(root);
    assert_eq!(map.imports["dep"], "/node_modules/dep/v2.js");
    assert_eq!(
        map.scopes["/node_modules/old/"]["dep"],
        "/node_modules/old/node_modules/dep/v1.js"
    );
    assert_eq!(
        map.resolve("dep", Some("/node_modules/old/index.js")).as_deref(),
        Some("/node_modules/old/node_modules/dep/v1.js")
    );
}

#[test]
fn cyclic_dependencies_terminate() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        &root.join("package.json"),
        r#"{"name":"app","dependencies":{"a":"^1"}}"#,
    );
    write(
        &root.join("node_modules/a/package.json"),
        r#"{"name":"a","dependencies":{"b":"^1"},"exports":"./a.js"}"#,
    );
    write(
        &root.join("node_modules/b/package.json"),
        r#"{"name":"b","dependencies":{"a":"^1"},"exports":"./b.js"}"#,
    );

    let map = generate_default(root);
    assert_eq!(map.scopes["/node_modules/a/"]["b"], "/node_modules/b/b.js");
    assert_eq!(map.scopes["/node_modules/b/"]["a"], "/node_modules/a/a.js");
}

#[test]
fn workspace_members_take_priority_over_installed_copies() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        &root.join("package.json"),
        r#"{"name":"monorepo","workspaces":["packages/*"]}"#,
    );
    write(
        &root.join("packages/ui/package.json"),
        r#"{
            "name": "@myorg/ui",
            "exports": {".": "./index.js", "./button": "./button.js"},
            "dependencies": {"@myorg/icons": "*", "lit": "^3"}
        }"#,
    );
    write(
        &root.join("packages/icons/package.json"),
        r#"{"name":"@myorg/icons","exports":{".":"./icons.js","./check":"./svg/check.js"}}"#,
    );
    write(
        &root.join("node_modules/@myorg/icons/package.json"),
        r#"{"name":"@myorg/icons","exports":"./stale.js"}"#,
    );
    write(
        &root.join("node_modules/lit/package.json"),
        r#"{"name":"lit","exports":"./index.js"}"#,
    );

    let map = generate_default(root);
    assert_eq!(map.imports["@myorg/ui"], "/packages/ui/index.js");
    assert_eq!(map.imports["@myorg/ui/button"], "/packages/ui/button.js");
    assert_eq!(map.imports["@myorg/icons"], "/packages/icons/icons.js");
    assert_eq!(map.imports["@myorg/icons/check"], "/packages/icons/svg/check.js");
    assert_eq!(map.imports["lit"], "/node_modules/lit/index.js");
    // A workspace root does not export itself.
    assert!(!map.imports.contains_key("monorepo"));

    let ui_scope = &map.scopes["/packages/ui/"];
    assert_eq!(ui_scope["@myorg/icons"], "/packages/icons/icons.js");
    assert_eq!(ui_scope["lit"], "/node_modules/lit/index.js");
}

#[test]
fn workspace_subdirectory_resolves_from_workspace_root() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        &root.join("package.json"),
        r#"{"name":"monorepo","workspaces":["elements/*"]}"#,
    );
    let kitchen_sink = root.join("elements/kitchen-sink");
    write(
        &kitchen_sink.join("package.json"),
        r#"{"name":"kitchen-sink","dependencies":{"lit":"^3","@lit/reactive-element":"^2"}}"#,
    );
    write(
        &root.join("node_modules/lit/package.json"),
        r#"{
            "name": "lit",
            "dependencies": {"@lit/reactive-element": "^2"},
            "exports": {".": "./index.js"}
        }"#,
    );
    write(
        &root.join("node_modules/@lit/reactive-element/package.json"),
        r#"{"name":"@lit/reactive-element","exports":{".":"./reactive-element.js"}}"#,
    );

    let map = generate_default(&kitchen_sink);
    assert_eq!(map.imports["lit"], "/node_modules/lit/index.js");
    assert_eq!(
        map.imports["@lit/reactive-element"],
        "/node_modules/@lit/reactive-element/reactive-element.js"
    );
    for scope in map.scopes.values() {
        for path in scope.values() {
            assert!(path.starts_with("/node_modules/"), "{path}");
            assert!(!path.contains("/../"), "{path}");
        }
    }
}

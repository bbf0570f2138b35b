//! Import map generation for the wren dev server.
//!
//! [`generate`] reads the root package.json, its workspace members and the installed
//! dependencies under `node_modules`, and produces an [`ImportMap`] that lets the
//! browser resolve bare specifiers (`import { html } from "lit"`) without a bundler.
//! Transitive dependencies get per-package scopes so each package sees the versions
//! it actually depends on.

mod error;
mod exports;
mod generate;
mod html;
mod map;
mod package_json;
mod workspace;

pub use error::{ImportMapError, Result};
pub use exports::package_entries;
pub use generate::{GenerateOptions, generate};
pub use map::{ImportMap, SpecifierMap};
pub use package_json::{PackageJson, Workspaces};
pub use workspace::{WorkspacePackage, discover_workspace_packages, find_workspace_root};

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    models: HashMap<String, String>,
    motions: HashMap<String, String>,
    expressions: HashMap<String, String>,
    poses: HashMap<String, String>,
    physics: HashMap<String, String>,
}

impl Manifest {
    fn sections(&self) -> [&HashMap<String, String>; 5] {
        [
            &self.models,
            &self.motions,
            &self.expressions,
            &self.poses,
            &self.physics,
        ]
    }
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_bytes(rel: &str) -> Result<Vec<u8>> {
    let path = resolve_path(rel);
    fs::read(&path).with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a>(map: &'a HashMap<String, String>, kind: &str, name: &str) -> Result<&'a str> {
    map.get(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

/// Every fixture file as `(relative path, bytes)`, for seeding an in-memory platform.
/// Assets reference each other by these relative paths.
pub fn all_files() -> Result<Vec<(String, Vec<u8>)>> {
    let mut out = Vec::new();
    for section in MANIFEST.sections() {
        for rel in section.values() {
            out.push((rel.clone(), read_bytes(rel)?));
        }
    }
    Ok(out)
}

macro_rules! fixture_section {
    ($module:ident, $field:ident, $kind:literal) => {
        pub mod $module {
            use super::*;

            pub fn keys() -> Vec<String> {
                MANIFEST.$field.keys().cloned().collect()
            }

            /// Path relative to the fixtures root, as used by `all_files`.
            pub fn rel(name: &str) -> Result<String> {
                lookup(&MANIFEST.$field, $kind, name).map(str::to_string)
            }

            pub fn json(name: &str) -> Result<String> {
                read_to_string(lookup(&MANIFEST.$field, $kind, name)?)
            }

            pub fn bytes(name: &str) -> Result<Vec<u8>> {
                read_bytes(lookup(&MANIFEST.$field, $kind, name)?)
            }

            pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
                super::load_json(lookup(&MANIFEST.$field, $kind, name)?)
            }

            pub fn path(name: &str) -> Result<PathBuf> {
                Ok(resolve_path(lookup(&MANIFEST.$field, $kind, name)?))
            }
        }
    };
}

fixture_section!(models, models, "model");
fixture_section!(motions, motions, "motion");
fixture_section!(expressions, expressions, "expression");
fixture_section!(poses, poses, "pose");
fixture_section!(physics, physics, "physics");

//! Build script for storefront crate.
//!
//! Fingerprints the static assets so templates can link them as
//! `main.css?v=<hash>` and browsers keep them until they change.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Asset path relative to the crate root, and the env var carrying its hash.
const ASSETS: [(&str, &str); 2] = [
    ("static/css/main.css", "CSS_HASH"),
    ("static/js/app.js", "JS_HASH"),
];

fn main() {
    let manifest_dir = PathBuf::from(
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo"),
    );

    for (relative, var) in ASSETS {
        let path = manifest_dir.join(relative);
        println!("cargo:rerun-if-changed={}", path.display());
        println!("cargo:rustc-env={var}={}", fingerprint(&path));
    }
}

/// First 8 hex chars of the file's SHA-256, or `dev` when it can't be read.
fn fingerprint(path: &Path) -> String {
    match fs::read(path) {
        Ok(content) => {
            let digest = format!("{:x}", Sha256::digest(&content));
            digest.chars().take(8).collect()
        }
        Err(e) => {
            println!("cargo:warning=Could not read {}: {e}", path.display());
            "dev".to_string()
        }
    }
}

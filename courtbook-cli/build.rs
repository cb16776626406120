//! Stamps the binary with `COURTBOOK_BUILD_SHA`: `git describe` of the
//! checkout, or the package version outside a git tree.

use std::path::Path;
use std::process::Command;

fn describe(workspace: &Path) -> Option<String> {
    let out = Command::new("git")
        .arg("-C")
        .arg(workspace)
        .args(["describe", "--always", "--dirty", "--abbrev=10"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let text = String::from_utf8(out.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn main() {
    let manifest = std::env::var_os("CARGO_MANIFEST_DIR").unwrap_or_default();
    let workspace = Path::new(&manifest).join("..");

    let version = describe(&workspace)
        .unwrap_or_else(|| format!("v{}", std::env::var("CARGO_PKG_VERSION").unwrap_or_default()));

    println!("cargo:rustc-env=COURTBOOK_BUILD_SHA={version}");
    for watched in [".git/HEAD", ".git/index"] {
        println!("cargo:rerun-if-changed={}", workspace.join(watched).display());
    }
}

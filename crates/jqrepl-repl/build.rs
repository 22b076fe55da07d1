//! Build metadata for `jqrepl --version`.

use std::path::Path;
use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn main() {
    // Source tarballs have no .git to watch
    if Path::new("../../.git").exists() {
        println!("cargo::rerun-if-changed=../../.git/HEAD");
        println!("cargo::rerun-if-changed=../../.git/index");
    }

    let revision = git(&["describe", "--always", "--dirty"]).unwrap_or_else(|| "unknown".into());
    let built = chrono::Utc::now().format("%Y-%m-%d");
    let profile = std::env::var("PROFILE").unwrap_or_default();

    println!("cargo:rustc-env=JQREPL_GIT_HASH={revision}");
    println!("cargo:rustc-env=JQREPL_BUILD_DATE={built}");
    println!("cargo:rustc-env=JQREPL_BUILD_PROFILE={profile}");
}

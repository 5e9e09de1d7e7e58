//! Build script to inject the behaviors version at compile time.
//!
//! Environment variables (set by CI or fall back to defaults):
//! - LAYOUT_BEHAVIORS_VERSION: Version string (defaults to CARGO_PKG_VERSION)
//! - GITHUB_SHA: appended as a short commit suffix when present

fn main() {
    let version = std::env::var("LAYOUT_BEHAVIORS_VERSION").unwrap_or_else(|_| {
        std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "unknown".into())
    });

    let version = match std::env::var("GITHUB_SHA") {
        Ok(sha) if sha.len() >= 7 => format!("{}+{}", version, &sha[..7]),
        _ => version,
    };
    println!("cargo:rustc-env=LAYOUT_BEHAVIORS_VERSION={}", version);

    println!("cargo:rerun-if-env-changed=LAYOUT_BEHAVIORS_VERSION");
    println!("cargo:rerun-if-env-changed=GITHUB_SHA");
}

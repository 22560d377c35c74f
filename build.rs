use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Short commit hash for the --version string ("dev" outside a git checkout)
    let build_version = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .filter(|hash| !hash.is_empty())
        .unwrap_or_else(|| "dev".to_string());

    println!("cargo:rustc-env=BUILD_VERSION={}", build_version);
}

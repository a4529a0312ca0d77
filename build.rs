fn main() {
    println!("cargo:rerun-if-env-changed=PMCONSOLE_BUILD_VERSION");

    let version = std::env::var("PMCONSOLE_BUILD_VERSION")
        .ok()
        .map(|value| value.trim().trim_start_matches('v').to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());
    let target = std::env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=PMCONSOLE_BUILD_VERSION={version}");
    println!("cargo:rustc-env=PMCONSOLE_BUILD_LONG_VERSION={version} ({target})");
}

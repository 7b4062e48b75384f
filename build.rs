/// Set the environment variables `GIT_HASH` AND `CARGO_PKG_VERSION` to include
/// the current git revision, or "unknown" outside a git checkout.
fn git_hash() -> Result<(), Box<(dyn std::error::Error)>> {
    let git_hash = match std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
    {
        Ok(output) if output.status.success() => {
            String::from_utf8(output.stdout)?.trim().to_string()
        }
        _ => "unknown".to_string(),
    };
    println!("cargo:rustc-env=GIT_HASH={git_hash}");
    let orig_version = env!("CARGO_PKG_VERSION");
    let version = format!("{orig_version}+{git_hash}");
    println!("cargo:rustc-env=CARGO_PKG_VERSION={version}"); // override default
    println!("cargo:rerun-if-changed=.git/HEAD");
    Ok(())
}

fn main() -> Result<(), Box<(dyn std::error::Error)>> {
    git_hash()?;
    Ok(())
}

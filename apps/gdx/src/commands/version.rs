//! Version command for the gdx CLI.
//!
//! With the global `-v` flag, also shows the commit and platform the
//! binary was built for.

use anyhow::Result;

/// Executes the version command.
#[allow(clippy::unnecessary_wraps)]
pub fn execute(verbose: bool) -> Result<()> {
    println!("{}", version_line());
    if verbose {
        println!();
        println!("Build Information:");
        println!("  Commit:   {}", git_commit());
        println!("  Platform: {}", platform_string());
    }
    Ok(())
}

fn version_line() -> String {
    format!("gdx {}", env!("CARGO_PKG_VERSION"))
}

/// Commit stamped by the build script, if git was available.
fn git_commit() -> &'static str {
    option_env!("GDX_GIT_COMMIT").unwrap_or("unknown")
}

fn platform_string() -> String {
    format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH)
}

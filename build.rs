use std::process::Command;

fn main() {
    let describe = Command::new("git")
        .args(["describe", "--tags"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|version| version.trim().to_owned())
        .unwrap_or_else(|| std::env::var("CARGO_PKG_VERSION").unwrap_or_default());

    println!("cargo:rustc-env=LUMOS_VERSION_ID=lumos {}", describe);
    println!("cargo:rerun-if-changed=.git/HEAD");
}

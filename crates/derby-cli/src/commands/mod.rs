pub mod metadata;
pub mod rollout;

use derby_core::BuildInfo;

pub fn print_version(build: &BuildInfo) {
    println!("version: {}", build.version);
    println!("source: {}", build.source);
}

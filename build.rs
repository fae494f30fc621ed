//! Build script - adds the cortex-m-rt and defmt linker scripts for the
//! firmware binary. Host builds (tests) link normally.

use std::env;

fn main() {
    // Only the embedded binary needs the target linker scripts.
    if env::var_os("CARGO_FEATURE_EMBEDDED").is_some() {
        println!("cargo:rustc-link-arg-bins=--nmagic");
        println!("cargo:rustc-link-arg-bins=-Tlink.x");
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }

    println!("cargo:rerun-if-changed=build.rs");
}

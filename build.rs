//! Build script to generate the C header with cbindgen.

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src/");
    println!("cargo:rerun-if-changed=cbindgen.toml");

    let Ok(crate_dir) = env::var("CARGO_MANIFEST_DIR") else {
        return;
    };
    let output_dir = PathBuf::from(&crate_dir).join("include");
    if let Err(e) = std::fs::create_dir_all(&output_dir) {
        println!("cargo:warning=cannot create include/: {e}");
        return;
    }

    let config = cbindgen::Config::from_file("cbindgen.toml").unwrap_or_default();

    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .with_language(cbindgen::Language::C)
        .generate()
    {
        Ok(bindings) => {
            bindings.write_to_file(output_dir.join("gisasrs.h"));
        }
        Err(e) => println!("cargo:warning=cannot generate C bindings: {e}"),
    }
}

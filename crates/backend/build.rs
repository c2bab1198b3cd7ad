use std::env;
use std::fs;
use std::path::Path;

/// Файлы рядом с бинарником: config.toml и prompts.toml ищутся сначала там
const SIDECAR_FILES: [&str; 2] = ["config.toml", "prompts.toml"];

fn main() {
    for name in SIDECAR_FILES {
        println!("cargo:rerun-if-changed=../../{}", name);
    }

    let out_dir = env::var("OUT_DIR").unwrap();
    let profile = env::var("PROFILE").unwrap(); // "debug" or "release"

    // OUT_DIR is typically: target/debug/build/listing-extractor-xxx/out
    let out_path = Path::new(&out_dir);
    let target_dir = out_path
        .ancestors()
        .find(|p| p.ends_with(&profile))
        .expect("Could not find target profile directory");

    let workspace_root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("Could not find workspace root");

    for name in SIDECAR_FILES {
        let source = workspace_root.join(name);
        let dest = target_dir.join(name);

        if source.exists() {
            fs::copy(&source, &dest).unwrap_or_else(|e| panic!("Failed to copy {}: {}", name, e));
            println!("cargo:warning=Copied {} to {:?}", name, dest);
        } else {
            println!("cargo:warning={} not found at {:?}, using built-in defaults", name, source);
        }
    }
}

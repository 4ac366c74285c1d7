// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

fn flag(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).action(ArgAction::SetTrue).help(help)
}

fn patch_cli() -> Command {
    Command::new("patch-conanfile")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Conanpatch Contributors")
        .about("Patch a CuraEngine conanfile.py to build without the internal package remote")
        .arg(
            Arg::new("recipe")
                .required(true)
                .help("Path to the conanfile.py to patch in place"),
        )
}

fn resolve_cli() -> Command {
    Command::new("resolve-requirements")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Conanpatch Contributors")
        .about("Resolve a CuraEngine conandata.yml into public-source requirements")
        .arg(Arg::new("conandata").required(true).help("Path to conandata.yml"))
        .arg(flag("no-arcus", "Build without protocol (arcus) support"))
        .arg(flag("no-plugins", "Build without plugin support"))
        .arg(flag("remote-plugins", "Allow remote plugins (ignored without plugin support)"))
        .arg(flag("cura-resources", "Bundle the cura resource packs"))
        .arg(flag("benchmarks", "Build the benchmarks"))
        .arg(flag("extensive-warnings", "Enable extensive compiler warnings"))
        .arg(Arg::new("arch").long("arch").default_value("x86_64").help("Target architecture"))
        .arg(Arg::new("os").long("os").default_value("Linux").help("Target operating system"))
        .arg(
            Arg::new("policy")
                .long("policy")
                .value_name("FILE")
                .help("TOML file overriding the restricted-origin fallback policy"),
        )
        .arg(
            Arg::new("compiler")
                .long("compiler")
                .help("Compiler to check against the minimum supported versions"),
        )
        .arg(Arg::new("compiler-version").long("compiler-version").help("Version of --compiler"))
        .arg(flag("json", "Print JSON instead of text"))
}

fn render(cmd: Command, man_dir: &Path) {
    let path = man_dir.join(format!("{}.1", cmd.get_name()));
    let mut buffer = Vec::new();

    if let Err(e) = Man::new(cmd).render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }
    if let Err(e) = fs::write(&path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    render(patch_cli(), &man_dir);
    render(resolve_cli(), &man_dir);
}

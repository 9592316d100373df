// build.rs

//! Generates man/multibin.1 from a builder copy of the CLI definition

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("multibin")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Fold standalone Rust programs into one multi-call binary")
        .arg(
            Arg::new("dirs")
                .value_name("DIR")
                .required(true)
                .num_args(1..)
                .help("Program directories, each holding one entry file"),
        )
        .arg(
            Arg::new("to")
                .long("to")
                .value_name("DIR")
                .help("Directory that receives the aggregator main.rs"),
        )
        .arg(
            Arg::new("apply")
                .long("apply")
                .action(ArgAction::SetTrue)
                .help("Write the changes instead of printing them"),
        )
        .arg(
            Arg::new("restore")
                .long("restore")
                .action(ArgAction::SetTrue)
                .help("Undo a previous generate run"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .value_parser(["text", "json"])
                .default_value("text")
                .help("Preview format"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("Generator configuration file (TOML)"),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src/cli.rs");

    let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR").map(PathBuf::from) else {
        println!("cargo:warning=CARGO_MANIFEST_DIR not set, skipping man page");
        return;
    };
    let man_path = manifest_dir.join("man").join("multibin.1");

    let mut buffer = Vec::new();
    if let Err(e) = Man::new(build_cli()).render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let written = man_path
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|()| fs::write(&man_path, buffer));
    if let Err(e) = written {
        println!("cargo:warning=Failed to write {}: {}", man_path.display(), e);
    }
}

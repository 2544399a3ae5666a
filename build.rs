// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("ditto")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Ditto Contributors")
        .about("Declarative package sync tool for Arch-based systems")
        .subcommand_required(false)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("PATH")
                .help("Config file path"),
        )
        .arg(
            Arg::new("db_path")
                .long("db-path")
                .global(true)
                .value_name("PATH")
                .help("Managed-state database path"),
        )
        .subcommand(
            Command::new("sync")
                .visible_alias("s")
                .about("Synchronize installed packages with your desired package list")
                .long_about(
                    "Synchronize installed packages with your desired package list\n\n\
                     Extra pacman arguments go after `--`; use `::` to separate install \
                     arguments from remove arguments.\n\n\
                     The confirmation prompt needs an interactive terminal. Without one the \
                     answer counts as \"no\" and nothing is changed.",
                )
                .arg(
                    Arg::new("dry_run")
                        .short('n')
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Show what would change without changing anything"),
                )
                .arg(
                    Arg::new("strict")
                        .short('x')
                        .long("strict")
                        .action(ArgAction::SetTrue)
                        .help("Remove every installed package that is not in the definitions"),
                )
                .arg(
                    Arg::new("args")
                        .last(true)
                        .num_args(0..)
                        .help("[install args...] :: [remove args...]"),
                ),
        )
        .subcommand(
            Command::new("managed")
                .about("List packages ditto manages for a host (including global records)")
                .arg(Arg::new("host").long("host").help("Host to list (default: this machine)"))
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print JSON instead of plain text"),
                ),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "elvish", "fish", "powershell", "zsh"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Generate the man page into OUT_DIR
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("Failed to create man directory");

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    man.render(&mut buffer).expect("Failed to render man page");

    fs::write(man_dir.join("ditto.1"), buffer).expect("Failed to write man page");
}

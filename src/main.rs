mod checker;
mod cli;
mod config;
mod config_json;
mod constants;
mod convert;
mod entity;
mod errors;
mod model;
mod product;
mod run;
mod solver;
mod system;

use clap::Parser;
use colored::Colorize;
use pretty_env_logger::formatted_builder;

use crate::constants::defaults;

fn main() {
    formatted_builder()
        .parse_filters(defaults::LOG_LEVEL)
        .parse_env(constants::ENV_LOG)
        .init();

    let args = cli::Cli::parse();
    if let Err(err) = run::run(args) {
        eprintln!("{}", format!("error: {err}").red());
        std::process::exit(1);
    }
}

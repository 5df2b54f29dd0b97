pub mod edit;
pub mod from_model;
pub mod model;
pub mod solve;
pub mod validate;

use std::env;

use crate::cli;
use crate::config_json::ConfigJson;
use crate::constants;
use crate::errors::StorageError;
use crate::product::Product;
use crate::system::System;

pub fn run(cli_args: cli::Cli) -> Result<(), StorageError> {
    match &cli_args.commands {
        // Default is to validate
        None | Some(cli::Commands::Validate) => validate::run(&Inputs::load(&cli_args)?),
        Some(cli::Commands::Solve) => solve::run(&Inputs::load(&cli_args)?),
        Some(cli::Commands::Model(args_model)) => {
            model::run(&Inputs::load(&cli_args)?, args_model)
        }
        Some(cli::Commands::Edit(cmd)) => edit::run(&cli_args.file, cmd.clone()),
        Some(cli::Commands::FromModel) => {
            from_model::run(&cli_args.file, &load_product(&cli_args)?)
        }
    }
}

/// Storage config with the product and system it is solved against
pub(super) struct Inputs {
    pub config: ConfigJson,
    pub product: Product,
    pub system: System,
}

impl Inputs {
    fn load(cli_args: &cli::Cli) -> Result<Self, StorageError> {
        let config = ConfigJson::from_json(&read_file(&cli_args.file)?)?;
        let product = load_product(cli_args)?;

        let system = match &cli_args.system {
            Some(file) => System::from_yaml(&read_file(file)?)?,
            None => {
                log::warn!("no system given, assuming a system without devices");
                System::default()
            }
        };

        Ok(Self {
            config,
            product,
            system,
        })
    }
}

fn load_product(cli_args: &cli::Cli) -> Result<Product, StorageError> {
    match product_file(cli_args) {
        Some(file) => Product::from_yaml(&read_file(&file)?),
        None => {
            log::info!("no product given, using built-in defaults");
            Ok(Product::default())
        }
    }
}

pub(super) fn read_file(file: &str) -> Result<String, StorageError> {
    std::fs::read_to_string(file).map_err(|err| StorageError::NoSuchFile(err, file.to_string()))
}

fn product_file(cli_args: &cli::Cli) -> Option<String> {
    cli_args
        .product
        .clone()
        .or_else(|| env::var(constants::ENV_PRODUCT_FILE).ok())
}

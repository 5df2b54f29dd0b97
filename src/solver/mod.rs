//! Solvers complete a storage config with the product defaults and the
//! devices of the probed system.

pub mod boot;
pub mod encryption;
pub mod filesystem;
pub mod generate;
pub mod search;
pub mod size;

use crate::config::Config;
use crate::config_json::ConfigJson;
use crate::convert::from_json;
use crate::errors::StorageError;
use crate::product::Product;
use crate::system::System;

/// Expands `generate` entries, converts the JSON config and solves it
pub fn solve_json(
    json: &ConfigJson,
    product: &Product,
    system: &System,
) -> Result<Config, StorageError> {
    let mut json = json.clone();
    generate::solve(&mut json, product);

    let mut config = from_json::convert(&json)?;
    solve(&mut config, product, system);

    Ok(config)
}

/// Runs the config solvers. The search solver must run before the boot
/// and size solvers, which look at the found devices.
pub fn solve(config: &mut Config, product: &Product, system: &System) {
    encryption::solve(config, product);
    filesystem::solve(config, product);
    search::solve(config, system);
    boot::solve(config, system);
    size::solve(config, product, system);
}

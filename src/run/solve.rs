use super::Inputs;
use crate::checker::ConfigChecker;
use crate::convert::to_json;
use crate::errors::StorageError;
use crate::solver;

pub(super) fn run(inputs: &Inputs) -> Result<(), StorageError> {
    let config = solver::solve_json(&inputs.config, &inputs.product, &inputs.system)?;

    let issues = ConfigChecker::new(&config, &inputs.product, &inputs.system).issues();
    if !issues.is_empty() {
        log::warn!("solved config has {} issue(s), see `validate`", issues.len());
    }

    println!("{}", to_json::convert(&config).to_json_string());
    Ok(())
}

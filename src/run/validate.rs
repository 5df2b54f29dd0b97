use colored::Colorize;

use super::Inputs;
use crate::checker::ConfigChecker;
use crate::entity::issue::Severity;
use crate::errors::StorageError;
use crate::solver;

pub(super) fn run(inputs: &Inputs) -> Result<(), StorageError> {
    let start = std::time::Instant::now();

    let config = solver::solve_json(&inputs.config, &inputs.product, &inputs.system)?;
    let issues = ConfigChecker::new(&config, &inputs.product, &inputs.system).issues();

    for issue in &issues {
        match issue.severity {
            Severity::Error => println!("{}", issue.to_string().red()),
            Severity::Warning => println!("{}", issue.to_string().yellow()),
        }
    }

    log::info!("validation done in {:?}", start.elapsed());

    let errors = issues.iter().filter(|issue| issue.is_error()).count();
    if errors > 0 {
        return Err(StorageError::ValidationFailed(errors));
    }

    println!("{}", "storage config is valid".green());
    Ok(())
}

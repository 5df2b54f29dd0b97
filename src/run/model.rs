use super::Inputs;
use crate::cli;
use crate::errors::StorageError;
use crate::model;
use crate::model::support;
use crate::solver;

pub(super) fn run(inputs: &Inputs, args: &cli::ArgsModel) -> Result<(), StorageError> {
    let config = solver::solve_json(&inputs.config, &inputs.product, &inputs.system)?;
    if let Some(reason) = support::unsupported_reason(&config) {
        return Err(StorageError::BadModel(format!(
            "{reason} not supported by the config model"
        )));
    }

    let model = model::from_config(&config);

    println!("{}", model.to_json_string());

    if args.summary {
        print_summary(&model, inputs);
    }

    Ok(())
}

fn print_summary(model: &model::Config, inputs: &Inputs) {
    println!("used mount paths: {:?}", model.used_mount_paths());
    println!(
        "unused mount paths: {:?}",
        model.unused_mount_paths(&inputs.product)
    );

    for drive in model.drives.iter().chain(model.md_raids.iter()) {
        println!(
            "{}: paths {:?}, boot {}, explicit boot {}, physical volumes {}, configured partitions {}",
            drive.name,
            drive.all_mount_paths(),
            model.is_boot(&drive.name),
            model.is_explicit_boot(&drive.name),
            model.drive_has_pv(&drive.name),
            drive.configured_existing_partitions().len(),
        );
    }
}

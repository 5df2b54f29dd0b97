use super::read_file;
use crate::convert::{
    from_model,
    to_json,
};
use crate::errors::StorageError;
use crate::model::Config;
use crate::product::Product;

pub(super) fn run(model_file: &str, product: &Product) -> Result<(), StorageError> {
    let model = Config::from_json(&read_file(model_file)?)?;
    let config = from_model::convert(&model, product)?;

    println!("{}", to_json::convert(&config).to_json_string());

    Ok(())
}

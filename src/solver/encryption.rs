use crate::config::{
    Config,
    Encryption,
};
use crate::entity::device::EncryptionMethod;
use crate::product::Product;

/// Completes encryption settings with the product defaults
pub fn solve(config: &mut Config, product: &Product) {
    config.each_block_device_mut(|device| {
        if let Some(encryption) = device.encryption_mut() {
            solve_encryption(encryption, product);
        }
    });

    for vg in &mut config.volume_groups {
        if let Some(encryption) = vg.physical_volumes_encryption.as_mut() {
            solve_encryption(encryption, product);
        }
    }
}

fn solve_encryption(encryption: &mut Encryption, product: &Product) {
    if encryption.method.is_none() {
        encryption.method = product.encryption_method();
        log::debug!("using product encryption method {:?}", encryption.method);
    }

    if encryption.method == Some(EncryptionMethod::Luks2) && encryption.pbkd_function.is_none() {
        encryption.pbkd_function = product.pbkd_function();
    }
}

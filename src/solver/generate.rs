use crate::config_json::*;
use crate::product::Product;

/// Expands the first `generate` entry of each partitions and logical
/// volumes list into one entry per product path still missing from the
/// config. Any other `generate` entry of the list is dropped.
pub fn solve(json: &mut ConfigJson, product: &Product) {
    for i in 0..json.drives.as_ref().map_or(0, Vec::len) {
        let partitions = json.drives.as_ref().and_then(|d| d[i].partitions.clone());

        if let Some(partitions) = partitions {
            let solved = solve_entries(
                partitions,
                |mode| missing_paths(json, product, mode),
                new_partition,
            );

            if let Some(drives) = json.drives.as_mut() {
                drives[i].partitions = Some(solved);
            }
        }
    }

    for i in 0..json.md_raids.as_ref().map_or(0, Vec::len) {
        let partitions = json.md_raids.as_ref().and_then(|md| md[i].partitions.clone());

        if let Some(partitions) = partitions {
            let solved = solve_entries(
                partitions,
                |mode| missing_paths(json, product, mode),
                new_partition,
            );

            if let Some(md_raids) = json.md_raids.as_mut() {
                md_raids[i].partitions = Some(solved);
            }
        }
    }

    for i in 0..json.volume_groups.as_ref().map_or(0, Vec::len) {
        let lvs = json
            .volume_groups
            .as_ref()
            .and_then(|vg| vg[i].logical_volumes.clone());

        if let Some(lvs) = lvs {
            let solved = solve_entries(
                lvs,
                |mode| missing_paths(json, product, mode),
                new_logical_volume,
            );

            if let Some(vgs) = json.volume_groups.as_mut() {
                vgs[i].logical_volumes = Some(solved);
            }
        }
    }
}

fn solve_entries<T, M, N>(entries: Vec<Entry<T>>, missing: M, new: N) -> Vec<Entry<T>>
where
    M: Fn(GenerateMode) -> Vec<String>,
    N: Fn(String, &GenerateValueJson) -> T,
{
    let mut solved = Vec::with_capacity(entries.len());
    let mut expanded = false;

    for entry in entries {
        let generate = match entry {
            Entry::Item(item) => {
                solved.push(Entry::Item(item));
                continue;
            }
            Entry::Generate(GenerateJson { generate }) => generate,
        };

        if expanded {
            log::warn!("ignoring extra generate entry {generate:?}");
            continue;
        }

        expanded = true;
        let mode = generate.mode().unwrap_or(GenerateMode::Default);
        let paths = missing(mode);

        log::debug!("generating {} volume(s) for {mode:?} paths: {paths:?}", paths.len());
        solved.extend(
            paths
                .into_iter()
                .map(|path| Entry::Item(new(path, &generate))),
        );
    }

    solved
}

fn new_filesystem(path: String) -> Option<FilesystemJson> {
    Some(FilesystemJson {
        path: Some(path),
        ..Default::default()
    })
}

fn new_partition(path: String, generate: &GenerateValueJson) -> PartitionJson {
    PartitionJson {
        filesystem: new_filesystem(path),
        encryption: generate.section().and_then(|s| s.encryption.clone()),
        ..Default::default()
    }
}

fn new_logical_volume(path: String, generate: &GenerateValueJson) -> LogicalVolumeJson {
    let section = generate.section();

    LogicalVolumeJson {
        filesystem: new_filesystem(path),
        encryption: section.and_then(|s| s.encryption.clone()),
        stripes: section.and_then(|s| s.stripes),
        stripe_size: section.and_then(|s| s.stripe_size.clone()),
        ..Default::default()
    }
}

/// Product paths of the mode which no entry of the config mounts yet
fn missing_paths(json: &ConfigJson, product: &Product, mode: GenerateMode) -> Vec<String> {
    let mut paths = product.mandatory_paths();
    if mode == GenerateMode::Default {
        for path in product.default_paths() {
            if !paths.contains(&path) {
                paths.push(path);
            }
        }

        // Keep the product order
        let defaults = product.default_paths();
        paths.sort_by_key(|p| defaults.iter().position(|d| d == p).unwrap_or(usize::MAX));
    }

    let used = json_paths(json);
    paths.retain(|p| !used.contains(p));
    paths
}

fn json_paths(json: &ConfigJson) -> Vec<String> {
    let path = |fs: &Option<FilesystemJson>| fs.as_ref().and_then(|fs| fs.path.clone());
    let partition_paths = |partitions: &Option<Vec<Entry<PartitionJson>>>| {
        partitions
            .iter()
            .flatten()
            .filter_map(Entry::item)
            .filter_map(|p| path(&p.filesystem))
            .collect::<Vec<_>>()
    };

    let mut paths = Vec::new();
    for drive in json.drives.iter().flatten() {
        paths.extend(path(&drive.filesystem));
        paths.extend(partition_paths(&drive.partitions));
    }

    for md in json.md_raids.iter().flatten() {
        paths.extend(path(&md.filesystem));
        paths.extend(partition_paths(&md.partitions));
    }

    for vg in json.volume_groups.iter().flatten() {
        for lv in vg.logical_volumes.iter().flatten().filter_map(Entry::item) {
            paths.extend(path(&lv.filesystem));
        }
    }

    paths
}

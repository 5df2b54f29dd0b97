use serde::{
    Deserialize,
    Serialize,
};

use crate::entity::size::DiskSize;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IfNotFound {
    #[default]
    Error,
    Skip,
    Create,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Size,
    /// Partition number, only meaningful for partition searches
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortCriterion {
    pub key: SortKey,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeOperator {
    Equal,
    Greater,
    Less,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeCondition {
    pub value: DiskSize,
    pub operator: SizeOperator,
}

impl SizeCondition {
    pub fn matches(&self, size: DiskSize) -> bool {
        match self.operator {
            SizeOperator::Equal => size == self.value,
            SizeOperator::Greater => size > self.value,
            SizeOperator::Less => size < self.value,
        }
    }
}

/// System device assigned to a config by the search solver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundDevice {
    pub sid: u32,
    pub name: String,
    pub size: DiskSize,
}

/// Search for a system device matching some conditions
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Search {
    pub name: Option<String>,
    pub size: Option<SizeCondition>,
    pub partition_number: Option<u32>,
    pub sort: Vec<SortCriterion>,
    pub max: Option<usize>,
    pub if_not_found: IfNotFound,
    pub(crate) solved: bool,
    pub(crate) device: Option<FoundDevice>,
}

impl Search {
    /// Search matching any device, used by drives without explicit search
    pub fn first_device() -> Self {
        Self {
            max: Some(1),
            ..Default::default()
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Whether every device matches
    pub fn always_match(&self) -> bool {
        self.name.is_none() && self.size.is_none() && self.partition_number.is_none()
    }

    pub fn solve(&mut self, device: Option<FoundDevice>) {
        self.solved = true;
        self.device = device;
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    pub fn device(&self) -> Option<&FoundDevice> {
        self.device.as_ref()
    }

    /// Solved without device and the device can be ignored
    pub fn skip_device(&self) -> bool {
        self.solved && self.device.is_none() && self.if_not_found == IfNotFound::Skip
    }

    /// Solved without device and the device must be created
    pub fn create_device(&self) -> bool {
        self.solved && self.device.is_none() && self.if_not_found == IfNotFound::Create
    }

    /// Solved without device, ignoring nor creating the device is allowed
    pub fn missing_device(&self) -> bool {
        self.solved && self.device.is_none() && self.if_not_found == IfNotFound::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_solve() {
        let device = FoundDevice {
            sid: 1,
            name: "/dev/vda".into(),
            size: DiskSize::gib(10),
        };

        let mut search = Search::first_device();
        assert!(search.always_match());
        assert!(!search.is_solved());
        assert!(!search.missing_device());

        search.solve(Some(device.clone()));
        assert!(search.is_solved());
        assert_eq!(search.device(), Some(&device));
        assert!(!search.missing_device());

        let tests = vec![
            (IfNotFound::Error, (true, false, false)),
            (IfNotFound::Skip, (false, true, false)),
            (IfNotFound::Create, (false, false, true)),
        ];

        for (if_not_found, (missing, skip, create)) in tests {
            let mut search = Search {
                if_not_found,
                ..Search::by_name("/dev/vdz")
            };

            assert!(!search.always_match());

            search.solve(None);
            assert_eq!(search.missing_device(), missing);
            assert_eq!(search.skip_device(), skip);
            assert_eq!(search.create_device(), create);
        }
    }

    #[test]
    fn test_size_condition() {
        let cond = |operator| SizeCondition {
            value: DiskSize::gib(2),
            operator,
        };

        assert!(cond(SizeOperator::Equal).matches(DiskSize::gib(2)));
        assert!(!cond(SizeOperator::Equal).matches(DiskSize::gib(3)));
        assert!(cond(SizeOperator::Greater).matches(DiskSize::gib(3)));
        assert!(!cond(SizeOperator::Greater).matches(DiskSize::gib(2)));
        assert!(cond(SizeOperator::Less).matches(DiskSize::gib(1)));
    }
}

use std::collections::HashMap;

/// A set of logger ids rendered into the same pipeline column.
pub struct Group {
    id: usize,
    logger_ids: Vec<usize>,
}

impl Group {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn logger_ids(&self) -> &[usize] {
        &self.logger_ids
    }
}

/// An arena of groups keyed by logger id. Modeled as a dense lookup table
/// rather than groups holding back-references to a parent container, which
/// would otherwise require an ownership cycle between group and container.
#[derive(Default)]
pub struct GroupContainer {
    groups: Vec<Group>,
    logger_to_group: HashMap<usize, usize>,
}

impl GroupContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new group containing `logger_ids`, returning its id.
    pub fn new_group(&mut self, logger_ids: impl IntoIterator<Item = usize>) -> usize {
        let group_id = self.groups.len();
        let logger_ids: Vec<usize> = logger_ids.into_iter().collect();
        for &logger_id in &logger_ids {
            self.logger_to_group.insert(logger_id, group_id);
        }
        self.groups.push(Group {
            id: group_id,
            logger_ids,
        });
        group_id
    }

    pub fn group_of(&self, logger_id: usize) -> Option<usize> {
        self.logger_to_group.get(&logger_id).copied()
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Builds the dense `logger_id -> group_id` table the split pipeline
    /// indexes directly, sized to the highest registered logger id.
    pub fn logger_group_table(&self) -> Vec<usize> {
        let max_id = self.logger_to_group.keys().max().copied().unwrap_or(0);
        let mut table = vec![0; max_id + 1];
        for (&logger_id, &group_id) in &self.logger_to_group {
            table[logger_id] = group_id;
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_are_looked_up_by_logger_id() {
        let mut container = GroupContainer::new();
        let g0 = container.new_group([0, 2]);
        let g1 = container.new_group([1]);
        assert_eq!(container.group_of(0), Some(g0));
        assert_eq!(container.group_of(1), Some(g1));
        assert_eq!(container.group_of(2), Some(g0));
        assert_eq!(container.group_count(), 2);
    }

    #[test]
    fn logger_group_table_is_dense() {
        let mut container = GroupContainer::new();
        container.new_group([0]);
        container.new_group([2, 1]);
        let table = container.logger_group_table();
        assert_eq!(table, vec![0, 1, 1]);
    }
}

// [libs/infra/mimosa-firewall/src/diff.rs]
use std::collections::HashSet;
use std::net::IpAddr;

/// The minimal add/remove set that turns `current` into `desired`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasDiff {
    pub to_add: Vec<IpAddr>,
    pub to_remove: Vec<IpAddr>,
}

impl AliasDiff {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Computes the diff between a firewall alias's current members and
/// the desired set (the active, `sync_with_firewall` blocks). Pure
/// set difference; order of the input slices does not matter and is
/// not preserved in the output.
pub fn diff_alias(current: &[IpAddr], desired: &[IpAddr]) -> AliasDiff {
    let current_set: HashSet<IpAddr> = current.iter().copied().collect();
    let desired_set: HashSet<IpAddr> = desired.iter().copied().collect();

    AliasDiff {
        to_add: desired_set.difference(&current_set).copied().collect(),
        to_remove: current_set.difference(&desired_set).copied().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ips(addrs: &[&str]) -> Vec<IpAddr> {
        addrs.iter().map(|a| a.parse().unwrap()).collect()
    }

    #[test]
    fn identical_sets_produce_empty_diff() {
        let current = ips(&["203.0.113.1", "203.0.113.2"]);
        let desired = ips(&["203.0.113.2", "203.0.113.1"]);
        assert!(diff_alias(&current, &desired).is_empty());
    }

    #[test]
    fn new_members_are_additions_and_missing_members_are_removals() {
        let current = ips(&["203.0.113.1", "203.0.113.2"]);
        let desired = ips(&["203.0.113.2", "203.0.113.3"]);
        let diff = diff_alias(&current, &desired);

        assert_eq!(diff.to_add, ips(&["203.0.113.3"]));
        assert_eq!(diff.to_remove, ips(&["203.0.113.1"]));
    }

    #[test]
    fn empty_desired_removes_everything() {
        let current = ips(&["203.0.113.1", "203.0.113.2"]);
        let diff = diff_alias(&current, &[]);
        assert!(diff.to_add.is_empty());
        assert_eq!(diff.to_remove.len(), 2);
    }
}

//! [libs/domain/mimosa-rules/src/lib.rs]
//! The escalation rule engine (§4.5). Pure and synchronous: it takes
//! the offense being evaluated plus the rolling counts already read
//! from the store, and returns at most one block decision. It never
//! touches the store, the clock, or the network itself.

use mimosa_models::{wildcard, Rule};

/// The slice of an offense the engine matches rules against.
#[derive(Debug, Clone)]
pub struct OffenseContext<'a> {
    pub plugin: &'a str,
    pub event_id: &'a str,
    pub description: &'a str,
}

/// Rolling counts for the offending IP, read by the caller before
/// invoking `evaluate`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountContext {
    pub offenses_last_hour: u32,
    pub offenses_total: u32,
    pub blocks_total: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDecision {
    pub matched_rule_id: u64,
    pub block_minutes: Option<u32>,
}

/// Evaluates rules in ascending `id` order and returns the first one
/// whose wildcard patterns (`plugin`, `event_id`, `description`) all
/// match and whose rolling counts clear every configured threshold.
/// Rule order is the only priority mechanism: there is no notion of
/// one matching rule being "more escalated" than another, so the
/// caller is responsible for ordering rules by id if `rules` isn't
/// already sorted.
pub fn evaluate(rules: &[Rule], offense: &OffenseContext, counts: &CountContext) -> Option<BlockDecision> {
    let mut candidates: Vec<&Rule> = rules.iter().filter(|rule| rule.enabled).collect();
    candidates.sort_by_key(|rule| rule.id);

    candidates
        .into_iter()
        .find(|rule| patterns_match(rule, offense) && counts_clear_thresholds(rule, counts))
        .map(|rule| BlockDecision {
            matched_rule_id: rule.id,
            block_minutes: rule.block_minutes,
        })
}

fn patterns_match(rule: &Rule, offense: &OffenseContext) -> bool {
    wildcard::matches(&rule.plugin, offense.plugin)
        && wildcard::matches(&rule.event_id, offense.event_id)
        && wildcard::matches(&rule.description, offense.description)
}

fn counts_clear_thresholds(rule: &Rule, counts: &CountContext) -> bool {
    counts.offenses_last_hour >= rule.min_last_hour
        && counts.offenses_total >= rule.min_total
        && counts.blocks_total >= rule.min_blocks_total
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimosa_models::Severity;

    fn rule(id: u64, min_last_hour: u32, min_total: u32, min_blocks_total: u32, block_minutes: Option<u32>) -> Rule {
        Rule {
            id,
            plugin: "proxy_trap".into(),
            event_id: "*".into(),
            severity: Some(Severity::Alto),
            description: "brute*force".into(),
            min_last_hour,
            min_total,
            min_blocks_total,
            block_minutes,
            enabled: true,
        }
    }

    fn offense<'a>() -> OffenseContext<'a> {
        OffenseContext {
            plugin: "proxy_trap",
            event_id: "ssh_login",
            description: "brute force login attempt",
        }
    }

    #[test]
    fn no_rules_match_returns_none() {
        let rules = vec![rule(1, 100, 100, 0, Some(60))];
        let counts = CountContext { offenses_last_hour: 1, offenses_total: 1, blocks_total: 0 };
        assert!(evaluate(&rules, &offense(), &counts).is_none());
    }

    #[test]
    fn pattern_mismatch_excludes_rule_even_if_counts_clear() {
        let mut mismatched = rule(1, 0, 0, 0, Some(60));
        mismatched.description = "port*scan".into();
        let rules = vec![mismatched];
        let counts = CountContext { offenses_last_hour: 999, offenses_total: 999, blocks_total: 999 };
        assert!(evaluate(&rules, &offense(), &counts).is_none());
    }

    #[test]
    fn first_matching_rule_by_id_wins_even_if_a_later_rule_is_more_escalated() {
        let rules = vec![
            rule(1, 1, 1, 0, Some(15)),
            rule(2, 1, 1, 2, Some(1440)),
            rule(3, 1, 1, 1, Some(60)),
        ];
        let counts = CountContext { offenses_last_hour: 5, offenses_total: 5, blocks_total: 2 };
        let decision = evaluate(&rules, &offense(), &counts).expect("a rule should match");
        assert_eq!(decision.matched_rule_id, 1);
        assert_eq!(decision.block_minutes, Some(15));
    }

    #[test]
    fn rule_order_is_independent_of_input_slice_order() {
        let rules = vec![rule(3, 1, 1, 1, Some(60)), rule(1, 1, 1, 0, Some(15)), rule(2, 1, 1, 2, Some(1440))];
        let counts = CountContext { offenses_last_hour: 5, offenses_total: 5, blocks_total: 2 };
        let decision = evaluate(&rules, &offense(), &counts).expect("a rule should match");
        assert_eq!(decision.matched_rule_id, 1);
    }

    #[test]
    fn unmet_threshold_on_the_first_rule_falls_through_to_the_next_matching_id() {
        let rules = vec![
            rule(1, 1, 1, 5, Some(15)),
            rule(2, 1, 1, 0, Some(1440)),
        ];
        let counts = CountContext { offenses_last_hour: 5, offenses_total: 5, blocks_total: 0 };
        let decision = evaluate(&rules, &offense(), &counts).expect("second rule should still match");
        assert_eq!(decision.matched_rule_id, 2);
    }

    #[test]
    fn disabled_rule_never_matches() {
        let mut disabled = rule(1, 0, 0, 0, Some(60));
        disabled.enabled = false;
        let rules = vec![disabled];
        let counts = CountContext::default();
        assert!(evaluate(&rules, &offense(), &counts).is_none());
    }
}

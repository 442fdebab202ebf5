//! The recommendation engine: evaluates the rule table against a profile.

use tracing::{debug, trace};

use healthdigest_shared::{Goal, Profile, Recommendations};

use crate::rules::{Rule, Trigger, rules};

/// Build categorized recommendations for a profile and the requested goals.
///
/// Categories with no entries are omitted. Goal rows fire once per goal, in
/// the caller's order, so a kind requested twice contributes its rows twice.
pub fn recommend(profile: &Profile, goals: &[Goal]) -> Recommendations {
    let mut recs = Recommendations::new();

    for block in rules().chunk_by(|a, b| a.is_goal() && b.is_goal()) {
        if block[0].is_goal() {
            for goal in goals {
                for rule in block.iter().filter(|r| matches!(r.trigger, Trigger::Goal(k) if k == goal.kind)) {
                    fire(rule, &mut recs);
                }
            }
            continue;
        }

        for rule in block {
            let applies = match rule.trigger {
                Trigger::Profile(predicate) => predicate(profile),
                Trigger::Always => true,
                Trigger::Goal(_) => false,
            };
            if applies {
                fire(rule, &mut recs);
            }
        }
    }

    recs.prune_empty();

    debug!(
        categories = recs.len(),
        entries = recs.total_entries(),
        "recommendations built"
    );

    recs
}

fn fire(rule: &Rule, recs: &mut Recommendations) {
    trace!(rule = rule.name, "rule fired");
    for advice in rule.advice {
        recs.push(advice.category, advice.text);
    }
}

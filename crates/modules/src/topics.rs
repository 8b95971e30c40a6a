//! Topic universe of the bundled modules

use regulus_core::Topic;

/// Sender holds a soulbound attestation
pub fn has_soul_sender() -> Topic {
    Topic::named("HAS_SOUL_SENDER")
}

/// Recipient holds a soulbound attestation
pub fn has_soul_recipient() -> Topic {
    Topic::named("HAS_SOUL_RECIPIENT")
}

/// Operator holds a soulbound attestation
pub fn has_soul_operator() -> Topic {
    Topic::named("HAS_SOUL_OPERATOR")
}

/// Amount is at least the configured minimum
pub fn min_transfer_limit() -> Topic {
    Topic::named("MIN_TRANSFER_LIMIT")
}

/// Amount is at most the configured maximum
pub fn max_transfer_limit() -> Topic {
    Topic::named("MAX_TRANSFER_LIMIT")
}

/// Subject stays under its per-period transfer allowance
pub fn max_transfers_per_period() -> Topic {
    Topic::named("MAX_TRANSFERS_PER_PERIOD")
}

/// Every topic with its name, for listings
pub fn all() -> Vec<(&'static str, Topic)> {
    vec![
        ("HAS_SOUL_SENDER", has_soul_sender()),
        ("HAS_SOUL_RECIPIENT", has_soul_recipient()),
        ("HAS_SOUL_OPERATOR", has_soul_operator()),
        ("MIN_TRANSFER_LIMIT", min_transfer_limit()),
        ("MAX_TRANSFER_LIMIT", max_transfer_limit()),
        ("MAX_TRANSFERS_PER_PERIOD", max_transfers_per_period()),
    ]
}

/// Look up a topic by name
pub fn by_name(name: &str) -> Option<Topic> {
    all()
        .into_iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, topic)| topic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_topics_are_distinct() {
        let topics: HashSet<Topic> = all().into_iter().map(|(_, t)| t).collect();
        assert_eq!(topics.len(), all().len());
    }

    #[test]
    fn test_by_name() {
        assert_eq!(by_name("min_transfer_limit"), Some(min_transfer_limit()));
        assert_eq!(by_name("UNKNOWN"), None);
    }
}

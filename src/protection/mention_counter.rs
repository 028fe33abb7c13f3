// Mention-flood counting.

use std::collections::HashSet;

/// Count the distinct users mentioned in a message, from the platform's
/// mention list. Mentioning the same user five times counts once; the raid
/// signal is how many people get pinged, not how loudly.
pub fn count_distinct(mention_ids: &[u64]) -> u32 {
    mention_ids.iter().collect::<HashSet<_>>().len() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_distinct_users() {
        assert_eq!(count_distinct(&[1, 2, 3, 4, 5, 6, 7]), 7);
    }

    #[test]
    fn duplicate_mentions_collapse() {
        assert_eq!(count_distinct(&[42, 42, 42, 7]), 2);
        assert_eq!(count_distinct(&[]), 0);
    }
}

use std::collections::HashSet;

use crate::models::{profile_url, AccountCandidate, AccountToFollow};
use crate::scoring::matched_topics;

const MAX_REASON_TOPICS: usize = 3;

/// Single pass over suggested accounts: keep the first `limit` whose name or
/// bio touches the topic vocabulary.
pub fn discover_accounts(candidates: Vec<AccountCandidate>, limit: usize) -> Vec<AccountToFollow> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut picked = Vec::new();

    for candidate in candidates {
        if picked.len() >= limit {
            break;
        }
        if candidate.handle.is_empty() || !seen.insert(candidate.handle.to_lowercase()) {
            continue;
        }

        let topics = matched_topics(&format!("{} {}", candidate.name, candidate.bio));
        if topics.is_empty() {
            continue;
        }

        let why_follow = format!(
            "Posts about {}",
            topics
                .iter()
                .take(MAX_REASON_TOPICS)
                .copied()
                .collect::<Vec<_>>()
                .join(", ")
        );

        picked.push(AccountToFollow {
            url: profile_url(&candidate.handle),
            handle: candidate.handle,
            name: candidate.name,
            bio: candidate.bio,
            followers: candidate.followers,
            following: candidate.following,
            why_follow,
        });
    }

    picked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_filters_irrelevant() {
        let accounts = discover_accounts(
            vec![
                AccountCandidate::new("chef", "Chef", "Recipes and knives"),
                AccountCandidate::new("dbdev", "Db Dev", "Database internals, open source"),
            ],
            2,
        );
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].handle, "dbdev");
        assert_eq!(accounts[0].why_follow, "Posts about open source, database");
        assert_eq!(accounts[0].url, "https://x.com/dbdev");
    }

    #[test]
    fn test_discover_respects_limit() {
        let candidates = (0..5)
            .map(|i| AccountCandidate::new(format!("f{}", i), "Founder", "startup founder"))
            .collect();
        assert_eq!(discover_accounts(candidates, 2).len(), 2);
    }

    #[test]
    fn test_discover_skips_duplicate_and_empty_handles() {
        let accounts = discover_accounts(
            vec![
                AccountCandidate::new("", "Anon", "bitcoin"),
                AccountCandidate::new("Alice", "Alice", "bitcoin"),
                AccountCandidate::new("alice", "Alice again", "ethereum"),
                AccountCandidate::new("bob", "Bob", "solana"),
            ],
            3,
        );
        let handles: Vec<&str> = accounts.iter().map(|a| a.handle.as_str()).collect();
        assert_eq!(handles, vec!["Alice", "bob"]);
    }

    #[test]
    fn test_discover_reason_caps_topics() {
        let accounts = discover_accounts(
            vec![AccountCandidate::new(
                "many",
                "Many",
                "crypto bitcoin ethereum solana defi",
            )],
            1,
        );
        assert_eq!(accounts[0].why_follow, "Posts about crypto, bitcoin, ethereum");
    }
}

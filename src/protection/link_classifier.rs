// Link policy classifier.
//
// Extracts URLs and Discord invite links from message text and classifies
// them against the guild's link policy: `invites` mode only bans invite
// links, `all` mode additionally requires every URL host to be on the
// guild's domain allowlist.

use super::protection_models::{AllowedDomainSet, LinksMode, ProtectionError};
use once_cell::sync::Lazy;
use regex::Regex;

// Invite links are matched on the hostnames the platform actually serves
// invites from, with or without a scheme.
static INVITE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:https?://)?(?:www\.)?(?:discord\.gg|discord(?:app)?\.com/invite)/[a-z0-9-]+",
    )
    .expect("invite pattern is valid")
});

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)https?://[^\s<>()]+").expect("url pattern is valid"));

/// Outcome of classifying one message's links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkVerdict {
    /// No link policy violation.
    Clean,
    /// The message carries a platform invite link.
    Invite,
    /// `all` mode: a URL host (normalized) missing from the allowlist.
    DisallowedDomain(String),
}

/// Classify the links in `text` under the given mode.
///
/// In `all` mode the first non-allowlisted host wins; invite links are
/// violations in both modes. Domains compare as exact lowercase strings,
/// no subdomain wildcarding, the same normalization the store applies when
/// an admin adds an allowlist entry.
pub fn classify(
    text: &str,
    mode: LinksMode,
    allowed_domains: &AllowedDomainSet,
) -> Result<LinkVerdict, ProtectionError> {
    if INVITE_RE.is_match(text) {
        return Ok(LinkVerdict::Invite);
    }

    if mode == LinksMode::Invites {
        // Plain URLs are fine on the free policy.
        return Ok(LinkVerdict::Clean);
    }

    for url in URL_RE.find_iter(text) {
        let host = match normalize_host(url.as_str()) {
            Ok(host) => host,
            Err(err) => {
                // One mangled URL must not shield the rest of the message;
                // skip it and keep classifying the others.
                tracing::debug!(error = %err, "skipping unparseable url");
                continue;
            }
        };
        if !allowed_domains.contains(&host) {
            return Ok(LinkVerdict::DisallowedDomain(host));
        }
    }

    Ok(LinkVerdict::Clean)
}

/// Reduce a matched URL to its normalized host: scheme and path stripped,
/// one leading `www.` removed, port removed, lowercased.
fn normalize_host(url: &str) -> Result<String, ProtectionError> {
    // The URL regex can drag trailing sentence punctuation along.
    let url = url.trim_end_matches(['.', ',', ';', ':', '!', '?']);

    let rest = match url.split_once("://") {
        Some((_, rest)) => rest,
        None => url,
    };
    let host = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .split(':')
        .next()
        .unwrap_or_default()
        .to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();

    if host.is_empty() {
        return Err(ProtectionError::MalformedInput(format!(
            "url without a host: {url:?}"
        )));
    }
    Ok(host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn domains(entries: &[&str]) -> AllowedDomainSet {
        entries.iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn invite_detected_in_invites_mode() {
        let verdict = classify("check https://discord.gg/abc", LinksMode::Invites, &BTreeSet::new());
        assert_eq!(verdict.unwrap(), LinkVerdict::Invite);
    }

    #[test]
    fn plain_url_allowed_in_invites_mode() {
        let verdict = classify("see https://example.com/x", LinksMode::Invites, &BTreeSet::new());
        assert_eq!(verdict.unwrap(), LinkVerdict::Clean);
    }

    #[test]
    fn schemeless_invite_still_detected() {
        let verdict = classify("join discord.gg/xyz now", LinksMode::Invites, &BTreeSet::new());
        assert_eq!(verdict.unwrap(), LinkVerdict::Invite);

        let verdict = classify(
            "or discordapp.com/invite/xyz",
            LinksMode::Invites,
            &BTreeSet::new(),
        );
        assert_eq!(verdict.unwrap(), LinkVerdict::Invite);
    }

    #[test]
    fn allowlisted_domain_is_clean_in_all_mode() {
        let verdict = classify(
            "see https://example.com/x",
            LinksMode::All,
            &domains(&["example.com"]),
        );
        assert_eq!(verdict.unwrap(), LinkVerdict::Clean);
    }

    #[test]
    fn unlisted_domain_is_flagged_in_all_mode() {
        let verdict = classify("see https://example.com/x", LinksMode::All, &BTreeSet::new());
        assert_eq!(
            verdict.unwrap(),
            LinkVerdict::DisallowedDomain("example.com".to_string())
        );
    }

    #[test]
    fn invite_beats_allowlist_in_all_mode() {
        // Even allowlisting discord.gg does not let invites through.
        let verdict = classify(
            "https://discord.gg/abc",
            LinksMode::All,
            &domains(&["discord.gg"]),
        );
        assert_eq!(verdict.unwrap(), LinkVerdict::Invite);
    }

    #[test]
    fn host_normalization_strips_www_case_and_punctuation() {
        let verdict = classify(
            "read HTTPS://WWW.Example.COM/Page.",
            LinksMode::All,
            &domains(&["example.com"]),
        );
        assert_eq!(verdict.unwrap(), LinkVerdict::Clean);
    }

    #[test]
    fn subdomains_do_not_wildcard() {
        let verdict = classify(
            "https://cdn.example.com/a",
            LinksMode::All,
            &domains(&["example.com"]),
        );
        assert_eq!(
            verdict.unwrap(),
            LinkVerdict::DisallowedDomain("cdn.example.com".to_string())
        );
    }

    #[test]
    fn hostless_url_is_skipped_without_shielding_others() {
        // The mangled URL is ignored, the real one is still classified.
        let verdict = classify(
            "https:/// https://evil.com",
            LinksMode::All,
            &BTreeSet::new(),
        );
        assert_eq!(
            verdict.unwrap(),
            LinkVerdict::DisallowedDomain("evil.com".to_string())
        );

        // A message with only the mangled URL stays clean.
        let verdict = classify("https:/// nothing", LinksMode::All, &BTreeSet::new());
        assert_eq!(verdict.unwrap(), LinkVerdict::Clean);
    }

    #[test]
    fn no_links_is_clean() {
        let verdict = classify("just chatting", LinksMode::All, &BTreeSet::new());
        assert_eq!(verdict.unwrap(), LinkVerdict::Clean);
    }

    #[test]
    fn lookalike_host_is_not_an_invite() {
        let verdict = classify("notdiscord.gg/abc", LinksMode::Invites, &BTreeSet::new());
        assert_eq!(verdict.unwrap(), LinkVerdict::Clean);
    }
}

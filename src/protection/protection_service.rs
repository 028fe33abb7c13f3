// Moderation pipeline - composes the detectors into one verdict per event.
//
// NO Discord dependencies here - just pure domain logic. The surrounding
// bot supplies immutable config snapshots per event and translates the
// returned `Verdict` into platform calls.
//
// Message precedence is fixed: links -> words -> mentions -> spam. Every
// enabled detector runs even when an earlier one already flagged the
// message, so one verdict can carry several log lines, but delete and
// timeout merge idempotently (boolean OR, max duration).

use super::link_classifier::{self, LinkVerdict};
use super::mention_counter;
use super::protection_models::{
    AllowedDomainSet, BannedWordSet, BypassRoleSet, DangerousMarker, GuildProtectionConfig,
    MemberUpdateEvent, MessageEvent, Verdict,
};
use super::rate_window::SpamStateTable;
use super::role_guard;
use super::word_matcher;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// The long-lived moderation pipeline.
///
/// One instance is created at process start and owns all mutable detector
/// state (the partitioned spam table). Everything else it reads is handed
/// in per event. Evaluation is synchronous and cheap; events for different
/// authors and guilds may run through it concurrently.
pub struct ProtectionService {
    spam_state: SpamStateTable,
    dangerous_markers: Vec<DangerousMarker>,
}

impl Default for ProtectionService {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtectionService {
    /// Pipeline watching the full dangerous-marker set.
    pub fn new() -> Self {
        Self::with_dangerous_markers(DangerousMarker::all())
    }

    /// Pipeline with a custom dangerous-marker watch list.
    pub fn with_dangerous_markers(dangerous_markers: Vec<DangerousMarker>) -> Self {
        Self {
            spam_state: SpamStateTable::new(),
            dangerous_markers,
        }
    }

    /// Evaluate one inbound message against the guild's policy.
    pub fn check_message(
        &self,
        event: &MessageEvent,
        config: &GuildProtectionConfig,
        banned_words: &BannedWordSet,
        allowed_domains: &AllowedDomainSet,
    ) -> Verdict {
        let mut verdict = Verdict::default();

        // 1. Link policy. Soft violation: delete + log, no timeout.
        if config.links_enabled {
            match link_classifier::classify(&event.text, config.links_mode, allowed_domains) {
                Ok(LinkVerdict::Clean) => {}
                Ok(LinkVerdict::Invite) => {
                    verdict.flag_delete();
                    verdict.log(format!(
                        "Link filter: deleted message from <@{}> (invite link)",
                        event.author_id
                    ));
                    verdict.reply("Invite links are not allowed here.".to_string());
                }
                Ok(LinkVerdict::DisallowedDomain(host)) => {
                    verdict.flag_delete();
                    verdict.log(format!(
                        "Link filter: deleted message from <@{}> (domain {} not allowlisted)",
                        event.author_id, host
                    ));
                    verdict.reply(format!("Links to {host} are not allowed here."));
                }
                Err(err) => {
                    // Fail open: a detector that cannot evaluate finds nothing.
                    tracing::warn!(
                        guild_id = event.guild_id,
                        error = %err,
                        "link classifier failed, treating message as clean"
                    );
                }
            }
        }

        // 2. Banned words. Soft violation as well.
        if config.words_enabled {
            if let Some(word) = word_matcher::first_match(&event.text, banned_words) {
                verdict.flag_delete();
                verdict.log(format!(
                    "Word filter: deleted message from <@{}> (matched banned word \"{}\")",
                    event.author_id, word
                ));
                verdict.reply("That language is not allowed here.".to_string());
            }
        }

        // 3. Mention flood. Treated as a raid signal: delete + timeout.
        if config.mention_enabled {
            let count = mention_counter::count_distinct(&event.mention_ids);
            if count > config.mention_limit {
                verdict.flag_delete();
                verdict.raise_timeout(Duration::from_secs(config.timeout_secs));
                verdict.log(format!(
                    "Mention filter: deleted message from <@{}> ({} mentions, limit {}), timed out {}s",
                    event.author_id, count, config.mention_limit, config.timeout_secs
                ));
                verdict.reply("Too many mentions in one message.".to_string());
            }
        }

        // 4. Message flood. Only the triggering message is deleted, not the
        //    backlog, and the author's window is cleared after punishing so
        //    the next message starts fresh instead of re-triggering.
        if config.spam_enabled {
            let count = self.spam_state.record(
                event.guild_id,
                event.author_id,
                event.timestamp,
                config.spam_window_secs,
                config.spam_max,
            );
            if count as u32 > config.spam_max {
                verdict.flag_delete();
                verdict.raise_timeout(Duration::from_secs(config.timeout_secs));
                verdict.log(format!(
                    "Spam filter: deleted message from <@{}> ({} messages in {}s, max {}), timed out {}s",
                    event.author_id,
                    count,
                    config.spam_window_secs,
                    config.spam_max,
                    config.timeout_secs
                ));
                verdict.reply("Slow down, you are sending messages too quickly.".to_string());
                self.spam_state.reset(event.guild_id, event.author_id);
            }
        }

        if !verdict.is_clean() {
            tracing::debug!(
                guild_id = event.guild_id,
                author_id = event.author_id,
                delete = verdict.delete,
                violations = verdict.log_lines.len(),
                "message flagged"
            );
        }

        verdict
    }

    /// Evaluate a member role update.
    ///
    /// Premium guilds get every added dangerous role reverted; Free guilds
    /// get a log line only. Failing open on the side of not breaking
    /// legitimate admin workflows when enforcement is not purchased.
    pub fn check_member_update(
        &self,
        event: &MemberUpdateEvent,
        config: &GuildProtectionConfig,
        bypass_roles: &BypassRoleSet,
        is_premium: bool,
    ) -> Verdict {
        let mut verdict = Verdict::default();
        if !config.roles_enabled {
            return verdict;
        }

        let added = role_guard::added_dangerous_roles(
            &event.before_roles,
            &event.after_roles,
            &self.dangerous_markers,
            bypass_roles,
        );
        if added.is_empty() {
            return verdict;
        }

        for role_id in &added {
            if is_premium {
                verdict.log(format!(
                    "Role guard: reverting dangerous role {} granted to <@{}> at {}",
                    role_id, event.member_id, event.timestamp
                ));
            } else {
                verdict.log(format!(
                    "Role guard: dangerous role {} granted to <@{}> at {} (log only on free plan)",
                    role_id, event.member_id, event.timestamp
                ));
            }
        }
        if is_premium {
            verdict.revert_roles = added;
        }

        verdict
    }

    /// Sweep spam partitions idle for longer than `idle_secs`. Intended for
    /// a periodic background task in the host, with a horizon well above any
    /// guild's spam window (idle partitions are harmless, just memory).
    pub fn purge_idle_spam_state(&self, now: DateTime<Utc>, idle_secs: u64) -> usize {
        self.spam_state.purge_idle(now, idle_secs)
    }

    /// Live (guild, author) spam partitions, for host metrics.
    pub fn spam_partitions(&self) -> usize {
        self.spam_state.partitions()
    }
}

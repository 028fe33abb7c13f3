// Protection domain models - data structures for the moderation pipeline.
//
// These are pure domain types with no Discord dependencies.
// The surrounding bot converts events into these and a `Verdict` back into
// platform calls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use thiserror::Error;

/// Banned words for a guild, lowercase. `BTreeSet` keeps scan order stable
/// so the reported match is deterministic.
pub type BannedWordSet = BTreeSet<String>;

/// Normalized allowed domains for a guild (no scheme, no `www.`, no path).
pub type AllowedDomainSet = BTreeSet<String>;

/// Role ids whose holders skip role-guard enforcement.
pub type BypassRoleSet = BTreeSet<u64>;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ProtectionError {
    /// The guild has no protection row in the external store. Callers should
    /// fall back to `GuildProtectionConfig::default()`, which mirrors the
    /// row the original store would have materialized.
    #[error("Guild {0} has no protection config")]
    ConfigMissing(u64),

    /// A detector could not make sense of its input. The pipeline logs this
    /// and treats the detector as having found no violation.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// A downstream platform call (delete/timeout/log/revert) failed.
    /// Surfaced to the caller, never retried by this crate.
    #[error("Executor failure: {0}")]
    Executor(String),
}

// ============================================================================
// CONFIGURATION SNAPSHOT
// ============================================================================

/// How the link filter treats URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinksMode {
    /// Only invite links are violations; plain URLs pass.
    Invites,
    /// Every URL host must be on the guild's allowlist; invites never pass.
    All,
}

/// Per-guild protection configuration, read fresh from the external store
/// for every event and treated as immutable for one pipeline evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildProtectionConfig {
    /// Whether the link filter runs.
    pub links_enabled: bool,
    pub links_mode: LinksMode,
    /// Whether the flood detector runs.
    pub spam_enabled: bool,
    /// Messages allowed inside the window before the next one is a flood.
    pub spam_max: u32,
    /// Sliding window length in seconds.
    pub spam_window_secs: u64,
    /// Whether banned-word matching runs.
    pub words_enabled: bool,
    /// Whether the mention-flood detector runs.
    pub mention_enabled: bool,
    /// Distinct mentions allowed in a single message.
    pub mention_limit: u32,
    /// Timeout applied for mention floods and message floods, in seconds.
    pub timeout_secs: u64,
    /// Whether dangerous role grants are watched.
    pub roles_enabled: bool,
    /// Channel violations are reported to. `None` drops the log lines only;
    /// enforcement still happens.
    pub log_channel_id: Option<u64>,
}

impl Default for GuildProtectionConfig {
    fn default() -> Self {
        // Same defaults the external store seeds a fresh guild row with.
        Self {
            links_enabled: true,
            links_mode: LinksMode::Invites,
            spam_enabled: true,
            spam_max: 6,          // 6 messages...
            spam_window_secs: 10, // ...in 10 seconds
            words_enabled: true,
            mention_enabled: true,
            mention_limit: 6,
            timeout_secs: 60,
            roles_enabled: false, // opt-in, Premium enforces
            log_channel_id: None,
        }
    }
}

// ============================================================================
// EVENTS
// ============================================================================

/// An inbound guild message, as handed over by the dispatch layer.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub guild_id: u64,
    pub channel_id: u64,
    pub message_id: u64,
    pub author_id: u64,
    /// Role ids the author holds, as reported by the platform.
    pub author_roles: Vec<u64>,
    pub text: String,
    /// User ids mentioned in the message (platform mention list, raw order,
    /// may contain duplicates).
    pub mention_ids: Vec<u64>,
    pub timestamp: DateTime<Utc>,
}

/// A member role update (before/after), as handed over by the dispatch layer.
#[derive(Debug, Clone)]
pub struct MemberUpdateEvent {
    pub guild_id: u64,
    pub member_id: u64,
    pub before_roles: Vec<RoleSnapshot>,
    pub after_roles: Vec<RoleSnapshot>,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// ROLES
// ============================================================================

/// Capability flags of a role, as carried by the platform's role object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermissions {
    pub administrator: bool,
    pub manage_guild: bool,
    pub manage_roles: bool,
}

/// A role as seen on a member at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSnapshot {
    pub id: u64,
    pub permissions: RolePermissions,
}

/// Capability markers that make a role "dangerous" when granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DangerousMarker {
    Administrator,
    ManageGuild,
    ManageRoles,
}

impl DangerousMarker {
    /// The full marker set; the default watch list.
    pub fn all() -> Vec<DangerousMarker> {
        vec![
            DangerousMarker::Administrator,
            DangerousMarker::ManageGuild,
            DangerousMarker::ManageRoles,
        ]
    }
}

impl RolePermissions {
    /// Whether any of the given markers is set on this role.
    pub fn hits_any(&self, markers: &[DangerousMarker]) -> bool {
        markers.iter().any(|m| match m {
            DangerousMarker::Administrator => self.administrator,
            DangerousMarker::ManageGuild => self.manage_guild,
            DangerousMarker::ManageRoles => self.manage_roles,
        })
    }
}

// ============================================================================
// VERDICT
// ============================================================================

/// The single decision produced for one evaluated event.
///
/// Detectors merge into it idempotently: delete is boolean-OR, timeout is
/// max(), log lines append in detector order, the ephemeral reply is
/// first-wins. The surrounding bot applies each action at most once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Verdict {
    pub delete: bool,
    pub timeout: Option<Duration>,
    pub log_lines: Vec<String>,
    pub revert_roles: BTreeSet<u64>,
    pub reply_ephemeral: Option<String>,
}

impl Verdict {
    /// No violations found, nothing to do.
    pub fn is_clean(&self) -> bool {
        !self.delete
            && self.timeout.is_none()
            && self.log_lines.is_empty()
            && self.revert_roles.is_empty()
    }

    pub fn flag_delete(&mut self) {
        self.delete = true;
    }

    /// Raise the timeout to at least `duration`. Two detectors asking for a
    /// timeout yield one timeout of the larger duration.
    pub fn raise_timeout(&mut self, duration: Duration) {
        self.timeout = Some(match self.timeout {
            Some(current) => current.max(duration),
            None => duration,
        });
    }

    pub fn log(&mut self, line: String) {
        self.log_lines.push(line);
    }

    /// Set the user-facing notice unless an earlier detector already did.
    pub fn reply(&mut self, text: String) {
        if self.reply_ephemeral.is_none() {
            self.reply_ephemeral = Some(text);
        }
    }
}

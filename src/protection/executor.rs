// ActionExecutor port - how verdicts become platform calls.
//
// The surrounding bot implements this against its Discord client; tests use
// a recording fake. The apply functions issue each intent at most once and
// never retry: a repeated delete or timeout risks double punishment, so a
// failed call is logged, collected, and surfaced to the caller instead.

use super::protection_models::{
    GuildProtectionConfig, MemberUpdateEvent, MessageEvent, ProtectionError, Verdict,
};
use async_trait::async_trait;
use std::time::Duration;

/// Platform side effects the pipeline can request.
///
/// Every method is a single intent; callers may time out or cancel the
/// underlying platform call, in which case the action counts as attempted.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn delete_message(
        &self,
        guild_id: u64,
        channel_id: u64,
        message_id: u64,
    ) -> Result<(), ProtectionError>;

    async fn timeout_member(
        &self,
        guild_id: u64,
        user_id: u64,
        duration: Duration,
    ) -> Result<(), ProtectionError>;

    /// Post a moderation log line to the guild's configured log channel.
    async fn send_log(
        &self,
        guild_id: u64,
        log_channel_id: u64,
        line: &str,
    ) -> Result<(), ProtectionError>;

    /// Post a short user-facing notice in the channel the violation
    /// happened in.
    async fn notify_channel(
        &self,
        guild_id: u64,
        channel_id: u64,
        text: &str,
    ) -> Result<(), ProtectionError>;

    async fn remove_role(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
    ) -> Result<(), ProtectionError>;
}

/// Apply a message verdict through the executor.
///
/// Returns the failures encountered; an empty vec means every intent went
/// through. Log lines are dropped silently when the guild has no log
/// channel configured, enforcement actions still run.
pub async fn apply_message_verdict<E: ActionExecutor + ?Sized>(
    executor: &E,
    event: &MessageEvent,
    config: &GuildProtectionConfig,
    verdict: &Verdict,
) -> Vec<ProtectionError> {
    let mut failures = Vec::new();

    if verdict.delete {
        if let Err(err) = executor
            .delete_message(event.guild_id, event.channel_id, event.message_id)
            .await
        {
            tracing::warn!(guild_id = event.guild_id, error = %err, "failed to delete message");
            failures.push(err);
        }
    }

    if let Some(duration) = verdict.timeout {
        if let Err(err) = executor
            .timeout_member(event.guild_id, event.author_id, duration)
            .await
        {
            tracing::warn!(guild_id = event.guild_id, error = %err, "failed to timeout member");
            failures.push(err);
        }
    }

    if let Some(text) = &verdict.reply_ephemeral {
        if let Err(err) = executor
            .notify_channel(event.guild_id, event.channel_id, text)
            .await
        {
            tracing::warn!(guild_id = event.guild_id, error = %err, "failed to send notice");
            failures.push(err);
        }
    }

    send_log_lines(executor, event.guild_id, config, verdict, &mut failures).await;

    failures
}

/// Apply a member-update verdict (role reverts plus log lines).
pub async fn apply_member_verdict<E: ActionExecutor + ?Sized>(
    executor: &E,
    event: &MemberUpdateEvent,
    config: &GuildProtectionConfig,
    verdict: &Verdict,
) -> Vec<ProtectionError> {
    let mut failures = Vec::new();

    for role_id in &verdict.revert_roles {
        if let Err(err) = executor
            .remove_role(event.guild_id, event.member_id, *role_id)
            .await
        {
            tracing::warn!(
                guild_id = event.guild_id,
                role_id,
                error = %err,
                "failed to revert role grant"
            );
            failures.push(err);
        }
    }

    send_log_lines(executor, event.guild_id, config, verdict, &mut failures).await;

    failures
}

async fn send_log_lines<E: ActionExecutor + ?Sized>(
    executor: &E,
    guild_id: u64,
    config: &GuildProtectionConfig,
    verdict: &Verdict,
    failures: &mut Vec<ProtectionError>,
) {
    let Some(log_channel_id) = config.log_channel_id else {
        return;
    };
    for line in &verdict.log_lines {
        if let Err(err) = executor.send_log(guild_id, log_channel_id, line).await {
            tracing::warn!(guild_id, error = %err, "failed to send log line");
            failures.push(err);
        }
    }
}

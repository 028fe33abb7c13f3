// Moderation decision engine ("protection") for a Discord community bot.
//
// **Architecture Overview:**
// - `protection/` = The decision pipeline and its detectors (pure domain logic)
// - `ActionExecutor` = Port the surrounding bot implements against the platform
//
// The surrounding bot owns the gateway connection, slash commands, and the
// configuration store. Per event it hands this crate an immutable config
// snapshot plus the guild's word/domain/bypass lists, gets back a `Verdict`,
// and translates that into platform calls through its `ActionExecutor`.

pub mod protection;

pub use protection::executor::{apply_member_verdict, apply_message_verdict, ActionExecutor};
pub use protection::protection_models::{
    AllowedDomainSet, BannedWordSet, BypassRoleSet, DangerousMarker, GuildProtectionConfig,
    LinksMode, MemberUpdateEvent, MessageEvent, ProtectionError, RolePermissions, RoleSnapshot,
    Verdict,
};
pub use protection::protection_service::ProtectionService;

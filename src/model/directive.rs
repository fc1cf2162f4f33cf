use serde::{Deserialize, Serialize};

use crate::model::calendar::{CalendarValue, TimeDelta};
use crate::model::game_state::{
    CharacterStat, Companion, DiscoveredEntity, EntityKind, Faction, GameItem, Npc, Quest,
    QuestStatus, Skill, StatusEffect, Suggestion,
};
use crate::model::value::FieldMap;

/// One `[NAME: body]` block as lexed, before any validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDirective {
    /// Tag name, uppercased.
    pub name: String,
    pub fields: FieldMap,
}

/// Every tag name the narrator is allowed to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DirectiveKind {
    Suggestion,
    TimePassed,
    ReputationChanged,
    MemoryAdd,
    SummaryAdd,
    PlayerStatsUpdate,
    PlayerStatsInit,
    ItemAdd,
    ItemRemove,
    StatusAcquired,
    StatusRemoved,
    SkillLearned,
    SkillDefined,
    QuestNew,
    QuestUpdate,
    CompanionNew,
    CompanionRemove,
    NpcNew,
    NpcUpdate,
    FactionUpdate,
    ItemDefined,
    LocationDiscovered,
    LoreDiscovered,
    WorldTimeSet,
    ReputationTiersSet,
}

impl DirectiveKind {
    pub const ALL: [DirectiveKind; 25] = [
        DirectiveKind::Suggestion,
        DirectiveKind::TimePassed,
        DirectiveKind::ReputationChanged,
        DirectiveKind::MemoryAdd,
        DirectiveKind::SummaryAdd,
        DirectiveKind::PlayerStatsUpdate,
        DirectiveKind::PlayerStatsInit,
        DirectiveKind::ItemAdd,
        DirectiveKind::ItemRemove,
        DirectiveKind::StatusAcquired,
        DirectiveKind::StatusRemoved,
        DirectiveKind::SkillLearned,
        DirectiveKind::SkillDefined,
        DirectiveKind::QuestNew,
        DirectiveKind::QuestUpdate,
        DirectiveKind::CompanionNew,
        DirectiveKind::CompanionRemove,
        DirectiveKind::NpcNew,
        DirectiveKind::NpcUpdate,
        DirectiveKind::FactionUpdate,
        DirectiveKind::ItemDefined,
        DirectiveKind::LocationDiscovered,
        DirectiveKind::LoreDiscovered,
        DirectiveKind::WorldTimeSet,
        DirectiveKind::ReputationTiersSet,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            DirectiveKind::Suggestion => "SUGGESTION",
            DirectiveKind::TimePassed => "TIME_PASSED",
            DirectiveKind::ReputationChanged => "REPUTATION_CHANGED",
            DirectiveKind::MemoryAdd => "MEMORY_ADD",
            DirectiveKind::SummaryAdd => "SUMMARY_ADD",
            DirectiveKind::PlayerStatsUpdate => "PLAYER_STATS_UPDATE",
            DirectiveKind::PlayerStatsInit => "PLAYER_STATS_INIT",
            DirectiveKind::ItemAdd => "ITEM_ADD",
            DirectiveKind::ItemRemove => "ITEM_REMOVE",
            DirectiveKind::StatusAcquired => "STATUS_ACQUIRED",
            DirectiveKind::StatusRemoved => "STATUS_REMOVED",
            DirectiveKind::SkillLearned => "SKILL_LEARNED",
            DirectiveKind::SkillDefined => "SKILL_DEFINED",
            DirectiveKind::QuestNew => "QUEST_NEW",
            DirectiveKind::QuestUpdate => "QUEST_UPDATE",
            DirectiveKind::CompanionNew => "COMPANION_NEW",
            DirectiveKind::CompanionRemove => "COMPANION_REMOVE",
            DirectiveKind::NpcNew => "NPC_NEW",
            DirectiveKind::NpcUpdate => "NPC_UPDATE",
            DirectiveKind::FactionUpdate => "FACTION_UPDATE",
            DirectiveKind::ItemDefined => "ITEM_DEFINED",
            DirectiveKind::LocationDiscovered => "LOCATION_DISCOVERED",
            DirectiveKind::LoreDiscovered => "LORE_DISCOVERED",
            DirectiveKind::WorldTimeSet => "WORLD_TIME_SET",
            DirectiveKind::ReputationTiersSet => "REPUTATION_TIERS_SET",
        }
    }

    /// Case-insensitive lookup; `None` for tags this engine does not know.
    pub fn from_tag(name: &str) -> Option<Self> {
        let upper = name.trim().to_uppercase();
        Self::ALL.iter().copied().find(|k| k.tag() == upper)
    }
}

/// A validated, typed game-state change.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Suggestion(Suggestion),
    TimePassed(TimeDelta),
    ReputationChanged { score: i64, reason: String },
    MemoryAdd { content: String },
    SummaryAdd { content: String },
    PlayerStatsUpdate(CharacterStat),
    PlayerStatsInit(CharacterStat),
    ItemAdd(GameItem),
    ItemRemove { name: String, quantity: i64 },
    StatusAcquired(StatusEffect),
    StatusRemoved { name: String },
    SkillLearned(Skill),
    SkillDefined(Skill),
    QuestNew(Quest),
    QuestUpdate {
        name: String,
        status: QuestStatus,
        description: Option<String>,
    },
    CompanionNew(Companion),
    CompanionRemove { name: String },
    NpcNew(Npc),
    NpcUpdate { name: String, thoughts_on_player: String },
    FactionUpdate(Faction),
    EntityDiscovered(DiscoveredEntity),
    WorldTimeSet(CalendarValue),
    ReputationTiersSet(Vec<String>),
}

impl Directive {
    pub fn kind(&self) -> DirectiveKind {
        match self {
            Directive::Suggestion(_) => DirectiveKind::Suggestion,
            Directive::TimePassed(_) => DirectiveKind::TimePassed,
            Directive::ReputationChanged { .. } => DirectiveKind::ReputationChanged,
            Directive::MemoryAdd { .. } => DirectiveKind::MemoryAdd,
            Directive::SummaryAdd { .. } => DirectiveKind::SummaryAdd,
            Directive::PlayerStatsUpdate(_) => DirectiveKind::PlayerStatsUpdate,
            Directive::PlayerStatsInit(_) => DirectiveKind::PlayerStatsInit,
            Directive::ItemAdd(_) => DirectiveKind::ItemAdd,
            Directive::ItemRemove { .. } => DirectiveKind::ItemRemove,
            Directive::StatusAcquired(_) => DirectiveKind::StatusAcquired,
            Directive::StatusRemoved { .. } => DirectiveKind::StatusRemoved,
            Directive::SkillLearned(_) => DirectiveKind::SkillLearned,
            Directive::SkillDefined(_) => DirectiveKind::SkillDefined,
            Directive::QuestNew(_) => DirectiveKind::QuestNew,
            Directive::QuestUpdate { .. } => DirectiveKind::QuestUpdate,
            Directive::CompanionNew(_) => DirectiveKind::CompanionNew,
            Directive::CompanionRemove { .. } => DirectiveKind::CompanionRemove,
            Directive::NpcNew(_) => DirectiveKind::NpcNew,
            Directive::NpcUpdate { .. } => DirectiveKind::NpcUpdate,
            Directive::FactionUpdate(_) => DirectiveKind::FactionUpdate,
            Directive::EntityDiscovered(entity) => match entity.kind {
                EntityKind::Item => DirectiveKind::ItemDefined,
                EntityKind::Location => DirectiveKind::LocationDiscovered,
                _ => DirectiveKind::LoreDiscovered,
            },
            Directive::WorldTimeSet(_) => DirectiveKind::WorldTimeSet,
            Directive::ReputationTiersSet(_) => DirectiveKind::ReputationTiersSet,
        }
    }
}

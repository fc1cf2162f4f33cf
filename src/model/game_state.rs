use serde::{Deserialize, Serialize};

use crate::model::calendar::CalendarValue;

/// Reputation tiers used until the model supplies its own, lowest score first.
pub const DEFAULT_REPUTATION_TIERS: [&str; 5] =
    ["Tai Tiếng", "Bị Ghét", "Vô Danh", "Được Mến", "Nổi Vọng"];

pub const REPUTATION_MIN: i64 = -100;
pub const REPUTATION_MAX: i64 = 100;

/// A full snapshot of the game state.
/// Every named collection holds at most one entry per lowercased name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameStateSnapshot {
    pub version: u32,

    /// Dynamic, world-defined stats (e.g. "Sinh Lực", "Linh Lực")
    pub stats: Vec<CharacterStat>,
    /// Stats announced by the opening turn; folded into `stats` once the start batch ends.
    pub initial_stats: Vec<CharacterStat>,

    pub inventory: Vec<GameItem>,
    pub status_effects: Vec<StatusEffect>,
    pub skills: Vec<Skill>,
    pub quests: Vec<Quest>,
    pub companions: Vec<Companion>,
    pub npcs: Vec<Npc>,
    pub factions: Vec<Faction>,
    pub discovered_entities: Vec<DiscoveredEntity>,

    pub memories: Vec<String>,
    pub summaries: Vec<String>,
    pub suggestions: Vec<Suggestion>,

    pub calendar: CalendarValue,
    pub reputation: Reputation,
    pub reputation_tiers: Vec<String>,
}

impl Default for GameStateSnapshot {
    fn default() -> Self {
        let reputation_tiers: Vec<String> =
            DEFAULT_REPUTATION_TIERS.iter().map(|t| t.to_string()).collect();

        Self {
            version: 1,
            stats: Vec::new(),
            initial_stats: Vec::new(),
            inventory: Vec::new(),
            status_effects: Vec::new(),
            skills: Vec::new(),
            quests: Vec::new(),
            companions: Vec::new(),
            npcs: Vec::new(),
            factions: Vec::new(),
            discovered_entities: Vec::new(),
            memories: Vec::new(),
            summaries: Vec::new(),
            suggestions: Vec::new(),
            calendar: CalendarValue::default(),
            reputation: Reputation {
                score: 0,
                tier: tier_for_score(0, &reputation_tiers),
                last_reason: None,
            },
            reputation_tiers,
        }
    }
}

impl GameStateSnapshot {
    /// Adds `delta` to the reputation score (clamped) and refreshes the tier.
    pub fn change_reputation(&mut self, delta: i64, reason: &str) {
        let score = self
            .reputation
            .score
            .saturating_add(delta)
            .clamp(REPUTATION_MIN, REPUTATION_MAX);
        self.reputation.score = score;
        self.reputation.last_reason = Some(reason.to_string());
        self.refresh_reputation_tier();
    }

    pub fn refresh_reputation_tier(&mut self) {
        self.reputation.tier = tier_for_score(self.reputation.score, &self.reputation_tiers);
    }
}

/// Maps a score onto equal-width bands over `[REPUTATION_MIN, REPUTATION_MAX]`.
pub fn tier_for_score(score: i64, tiers: &[String]) -> String {
    if tiers.is_empty() {
        return String::new();
    }
    let span = REPUTATION_MAX - REPUTATION_MIN + 1;
    let offset = score.clamp(REPUTATION_MIN, REPUTATION_MAX) - REPUTATION_MIN;
    let index = (offset * tiers.len() as i64 / span) as usize;
    tiers[index.min(tiers.len() - 1)].clone()
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterStat {
    pub name: String,
    pub value: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<i64>,
    #[serde(default)]
    pub is_percentage: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_limit: Option<bool>,
}

/// Inventory entry. Also used as a signed quantity delta when merging.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameItem {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl GameItem {
    pub fn new(name: impl Into<String>, quantity: i64, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            quantity,
            tags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Buff,
    Debuff,
}

impl StatusKind {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "buff" => Some(StatusKind::Buff),
            "debuff" => Some(StatusKind::Debuff),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: StatusKind,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    #[default]
    InProgress,
    Completed,
    Failed,
}

impl QuestStatus {
    /// Reads the free-form status label the model writes ("hoàn thành", "completed", ...).
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        if label.is_empty() {
            return None;
        }
        if label.contains("thất bại") || label.contains("fail") {
            return Some(QuestStatus::Failed);
        }
        if label.contains("chưa hoàn thành") || label.contains("incomplete") {
            return Some(QuestStatus::InProgress);
        }
        if label.contains("hoàn thành") || label.contains("complete") || label == "done" {
            return Some(QuestStatus::Completed);
        }
        if label.contains("tiến hành")
            || label.contains("progress")
            || label.contains("active")
        {
            return Some(QuestStatus::InProgress);
        }
        None
    }

    pub fn label(&self) -> &'static str {
        match self {
            QuestStatus::InProgress => "in progress",
            QuestStatus::Completed => "completed",
            QuestStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Quest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: QuestStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Companion {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Npc {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub personality: String,
    #[serde(default)]
    pub thoughts_on_player: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Faction {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Encyclopedia category of a discovered entity. Serialised as its display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityKind {
    Npc,
    Item,
    Faction,
    Location,
    Skill,
    #[default]
    Lore,
}

impl EntityKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Npc => "NPC",
            EntityKind::Item => "Vật phẩm",
            EntityKind::Faction => "Phe phái/Thế lực",
            EntityKind::Location => "Địa điểm",
            EntityKind::Skill => "Công pháp / Kỹ năng",
            EntityKind::Lore => "Hệ thống sức mạnh / Lore",
        }
    }
}

impl From<String> for EntityKind {
    fn from(label: String) -> Self {
        match label.as_str() {
            "NPC" => EntityKind::Npc,
            "Vật phẩm" => EntityKind::Item,
            "Phe phái/Thế lực" => EntityKind::Faction,
            "Địa điểm" => EntityKind::Location,
            "Công pháp / Kỹ năng" => EntityKind::Skill,
            _ => EntityKind::Lore,
        }
    }
}

impl From<EntityKind> for String {
    fn from(kind: EntityKind) -> Self {
        kind.label().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiscoveredEntity {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub description: String,
    #[serde(default)]
    pub personality: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<EntityDetails>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub description: String,
    pub success_rate: i64,
    pub risk: String,
    pub reward: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reputation {
    pub score: i64,
    pub tier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiers() -> Vec<String> {
        DEFAULT_REPUTATION_TIERS.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn default_snapshot_starts_in_middle_tier() {
        let state = GameStateSnapshot::default();
        assert_eq!(state.reputation.score, 0);
        assert_eq!(state.reputation.tier, "Vô Danh");
        assert_eq!(state.calendar, CalendarValue::new(1, 1, 1, 8));
    }

    #[test]
    fn tier_bands_cover_the_whole_range() {
        let tiers = tiers();
        assert_eq!(tier_for_score(-100, &tiers), "Tai Tiếng");
        assert_eq!(tier_for_score(-50, &tiers), "Bị Ghét");
        assert_eq!(tier_for_score(100, &tiers), "Nổi Vọng");
        assert_eq!(tier_for_score(500, &tiers), "Nổi Vọng");
        assert_eq!(tier_for_score(0, &[]), "");
    }

    #[test]
    fn reputation_change_clamps_and_records_reason() {
        let mut state = GameStateSnapshot::default();
        state.change_reputation(-250, "Ăn trộm");
        assert_eq!(state.reputation.score, -100);
        assert_eq!(state.reputation.tier, "Tai Tiếng");
        assert_eq!(state.reputation.last_reason.as_deref(), Some("Ăn trộm"));
    }

    #[test]
    fn quest_status_labels() {
        assert_eq!(QuestStatus::from_label("hoàn thành"), Some(QuestStatus::Completed));
        assert_eq!(QuestStatus::from_label("Đang tiến hành"), Some(QuestStatus::InProgress));
        assert_eq!(QuestStatus::from_label("Failed"), Some(QuestStatus::Failed));
        assert_eq!(QuestStatus::from_label("???"), None);
    }

    #[test]
    fn entity_kind_round_trips_through_label() {
        let entity = DiscoveredEntity {
            name: "Hang Sói".into(),
            kind: EntityKind::Location,
            description: "Một hang động tối tăm.".into(),
            ..DiscoveredEntity::default()
        };
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["type"], "Địa điểm");
        let back: DiscoveredEntity = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind, EntityKind::Location);
    }
}

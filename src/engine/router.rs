use thiserror::Error;

use crate::model::calendar::{CalendarValue, TimeDelta};
use crate::model::directive::{Directive, DirectiveKind, RawDirective};
use crate::model::game_state::{
    CharacterStat, Companion, DiscoveredEntity, EntityDetails, EntityKind, Faction, GameItem,
    Npc, Quest, QuestStatus, Skill, StatusEffect, StatusKind, Suggestion,
};
use crate::model::value::{FieldMap, Value};

/// Where a directive lands in the game state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Suggestions,
    Calendar,
    Reputation,
    ReputationTiers,
    Memories,
    Summaries,
    Stats,
    InitialStats,
    Inventory,
    StatusEffects,
    Skills,
    Quests,
    Companions,
    Npcs,
    Factions,
    DiscoveredEntities,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Appended; the whole batch replaces the previous batch's list.
    ReplaceList,
    Append,
    /// Only the last occurrence in a batch counts.
    LastWins,
    UpsertByName,
    PatchByName,
    RemoveByName,
    /// Signed quantity delta.
    Delta,
    /// Additive numeric change.
    Additive,
    Replace,
}

#[derive(Debug, Clone, Copy)]
pub struct RouteSpec {
    pub required: &'static [&'static str],
    pub target: Collection,
    pub policy: MergePolicy,
    /// Only meaningful in the opening batch.
    pub start_only: bool,
}

const fn route(
    required: &'static [&'static str],
    target: Collection,
    policy: MergePolicy,
) -> RouteSpec {
    RouteSpec {
        required,
        target,
        policy,
        start_only: false,
    }
}

const fn start_route(
    required: &'static [&'static str],
    target: Collection,
    policy: MergePolicy,
) -> RouteSpec {
    RouteSpec {
        required,
        target,
        policy,
        start_only: true,
    }
}

impl DirectiveKind {
    pub fn route(&self) -> RouteSpec {
        use Collection as C;
        use MergePolicy as P;

        match self {
            DirectiveKind::Suggestion => route(
                &["description", "successRate", "risk", "reward"],
                C::Suggestions,
                P::ReplaceList,
            ),
            DirectiveKind::TimePassed => route(&[], C::Calendar, P::Delta),
            DirectiveKind::ReputationChanged => {
                route(&["score", "reason"], C::Reputation, P::Additive)
            }
            DirectiveKind::MemoryAdd => route(&["content"], C::Memories, P::Append),
            DirectiveKind::SummaryAdd => route(&["content"], C::Summaries, P::LastWins),
            DirectiveKind::PlayerStatsUpdate => route(&["name", "value"], C::Stats, P::UpsertByName),
            DirectiveKind::PlayerStatsInit => {
                start_route(&["name", "value"], C::InitialStats, P::UpsertByName)
            }
            DirectiveKind::ItemAdd | DirectiveKind::ItemRemove => {
                route(&["name", "quantity"], C::Inventory, P::Delta)
            }
            DirectiveKind::StatusAcquired => route(
                &["name", "description", "type"],
                C::StatusEffects,
                P::UpsertByName,
            ),
            DirectiveKind::StatusRemoved => route(&["name"], C::StatusEffects, P::RemoveByName),
            DirectiveKind::SkillLearned | DirectiveKind::SkillDefined => {
                route(&["name", "description"], C::Skills, P::UpsertByName)
            }
            DirectiveKind::QuestNew => route(&["name", "description"], C::Quests, P::UpsertByName),
            DirectiveKind::QuestUpdate => route(&["name", "status"], C::Quests, P::PatchByName),
            DirectiveKind::CompanionNew => {
                route(&["name", "description"], C::Companions, P::UpsertByName)
            }
            DirectiveKind::CompanionRemove => route(&["name"], C::Companions, P::RemoveByName),
            DirectiveKind::NpcNew => route(&["name", "description"], C::Npcs, P::UpsertByName),
            DirectiveKind::NpcUpdate => {
                route(&["name", "thoughtsOnPlayer"], C::Npcs, P::PatchByName)
            }
            DirectiveKind::FactionUpdate => {
                route(&["name", "description"], C::Factions, P::UpsertByName)
            }
            DirectiveKind::ItemDefined
            | DirectiveKind::LocationDiscovered
            | DirectiveKind::LoreDiscovered => route(
                &["name", "description"],
                C::DiscoveredEntities,
                P::UpsertByName,
            ),
            DirectiveKind::WorldTimeSet => start_route(
                &["year", "month", "day", "hour"],
                C::Calendar,
                P::Replace,
            ),
            DirectiveKind::ReputationTiersSet => {
                start_route(&["tiers"], C::ReputationTiers, P::LastWins)
            }
        }
    }
}

/// Why a lexed block did not become a [`Directive`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("unknown directive '{0}'")]
    UnknownDirective(String),

    #[error("[{directive}] is missing required field '{field}'")]
    MissingField {
        directive: &'static str,
        field: &'static str,
    },

    #[error("[{directive}] field '{field}' is invalid: {reason}")]
    InvalidField {
        directive: &'static str,
        field: &'static str,
        reason: String,
    },
}

/// Validates a lexed block against the route table and builds its typed variant.
/// Either every required field is present and well-typed, or nothing is produced.
pub fn decode(raw: &RawDirective) -> Result<Directive, DecodeError> {
    let kind = DirectiveKind::from_tag(&raw.name)
        .ok_or_else(|| DecodeError::UnknownDirective(raw.name.clone()))?;
    let spec = kind.route();

    for &field in spec.required {
        match raw.fields.get(field) {
            None => {
                return Err(DecodeError::MissingField {
                    directive: kind.tag(),
                    field,
                })
            }
            Some(Value::Text(s)) if s.trim().is_empty() => {
                return Err(DecodeError::MissingField {
                    directive: kind.tag(),
                    field,
                })
            }
            Some(_) => {}
        }
    }

    let f = Fields {
        kind,
        map: &raw.fields,
    };

    let directive = match kind {
        DirectiveKind::Suggestion => Directive::Suggestion(Suggestion {
            description: f.text("description")?,
            success_rate: f.integer("successRate")?,
            risk: f.text("risk")?,
            reward: f.text("reward")?,
        }),

        DirectiveKind::TimePassed => Directive::TimePassed(TimeDelta {
            years: f.opt_integer("years")?,
            months: f.opt_integer("months")?,
            days: f.opt_integer("days")?,
            hours: f.opt_integer("hours")?,
            minutes: f.opt_integer("minutes")?,
        }),

        DirectiveKind::ReputationChanged => Directive::ReputationChanged {
            score: f.integer("score")?,
            reason: f.text("reason")?,
        },

        DirectiveKind::MemoryAdd => Directive::MemoryAdd {
            content: f.text("content")?,
        },
        DirectiveKind::SummaryAdd => Directive::SummaryAdd {
            content: f.text("content")?,
        },

        DirectiveKind::PlayerStatsUpdate => Directive::PlayerStatsUpdate(f.stat()?),
        DirectiveKind::PlayerStatsInit => Directive::PlayerStatsInit(f.stat()?),

        DirectiveKind::ItemAdd => {
            let quantity = f.quantity()?;
            Directive::ItemAdd(GameItem::new(
                f.text("name")?,
                quantity,
                f.opt_text("description").unwrap_or_default(),
            ))
        }
        DirectiveKind::ItemRemove => Directive::ItemRemove {
            name: f.text("name")?,
            quantity: f.quantity()?,
        },

        DirectiveKind::StatusAcquired => {
            let label = f.text("type")?;
            let kind = StatusKind::from_label(&label).ok_or_else(|| {
                f.invalid("type", format!("'{label}' is neither buff nor debuff"))
            })?;
            Directive::StatusAcquired(StatusEffect {
                name: f.text("name")?,
                description: f.text("description")?,
                kind,
            })
        }
        DirectiveKind::StatusRemoved => Directive::StatusRemoved {
            name: f.text("name")?,
        },

        DirectiveKind::SkillLearned => Directive::SkillLearned(f.skill()?),
        DirectiveKind::SkillDefined => Directive::SkillDefined(f.skill()?),

        DirectiveKind::QuestNew => Directive::QuestNew(Quest {
            name: f.text("name")?,
            description: f.text("description")?,
            status: QuestStatus::InProgress,
            tags: Vec::new(),
        }),
        DirectiveKind::QuestUpdate => {
            let label = f.text("status")?;
            let status = QuestStatus::from_label(&label)
                .ok_or_else(|| f.invalid("status", format!("unknown quest status '{label}'")))?;
            Directive::QuestUpdate {
                name: f.text("name")?,
                status,
                description: f.opt_text("description"),
            }
        }

        DirectiveKind::CompanionNew => Directive::CompanionNew(Companion {
            name: f.text("name")?,
            description: f.text("description")?,
            personality: f.opt_text("personality"),
            tags: Vec::new(),
        }),
        DirectiveKind::CompanionRemove => Directive::CompanionRemove {
            name: f.text("name")?,
        },

        DirectiveKind::NpcNew => Directive::NpcNew(Npc {
            name: f.text("name")?,
            description: f.text("description")?,
            personality: f.opt_text("personality").unwrap_or_default(),
            thoughts_on_player: f.opt_text("thoughtsOnPlayer").unwrap_or_default(),
            tags: Vec::new(),
        }),
        DirectiveKind::NpcUpdate => Directive::NpcUpdate {
            name: f.text("name")?,
            thoughts_on_player: f.text("thoughtsOnPlayer")?,
        },

        DirectiveKind::FactionUpdate => Directive::FactionUpdate(Faction {
            name: f.text("name")?,
            description: f.text("description")?,
            tags: Vec::new(),
        }),

        DirectiveKind::ItemDefined => Directive::EntityDiscovered(f.entity(EntityKind::Item)?),
        DirectiveKind::LocationDiscovered => {
            Directive::EntityDiscovered(f.entity(EntityKind::Location)?)
        }
        DirectiveKind::LoreDiscovered => Directive::EntityDiscovered(f.entity(EntityKind::Lore)?),

        DirectiveKind::WorldTimeSet => Directive::WorldTimeSet(CalendarValue {
            year: f.ranged("year", i64::from(i32::MIN), i64::from(i32::MAX))? as i32,
            month: f.ranged("month", 0, i64::from(u32::MAX))? as u32,
            day: f.ranged("day", 0, i64::from(u32::MAX))? as u32,
            hour: f.ranged("hour", 0, i64::from(u32::MAX))? as u32,
        }),

        DirectiveKind::ReputationTiersSet => {
            let tiers: Vec<String> = f
                .text("tiers")?
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
            if tiers.is_empty() {
                return Err(f.invalid("tiers", "no tier names".to_string()));
            }
            Directive::ReputationTiersSet(tiers)
        }
    };

    Ok(directive)
}

/// Typed accessors over one block's fields, reporting errors against its tag.
struct Fields<'a> {
    kind: DirectiveKind,
    map: &'a FieldMap,
}

impl Fields<'_> {
    fn missing(&self, field: &'static str) -> DecodeError {
        DecodeError::MissingField {
            directive: self.kind.tag(),
            field,
        }
    }

    fn invalid(&self, field: &'static str, reason: String) -> DecodeError {
        DecodeError::InvalidField {
            directive: self.kind.tag(),
            field,
            reason,
        }
    }

    fn text(&self, field: &'static str) -> Result<String, DecodeError> {
        self.opt_text(field).ok_or_else(|| self.missing(field))
    }

    fn opt_text(&self, field: &'static str) -> Option<String> {
        self.map
            .get(field)
            .map(Value::as_text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn opt_integer(&self, field: &'static str) -> Result<Option<i64>, DecodeError> {
        match self.map.get(field) {
            None => Ok(None),
            Some(value) => value
                .as_integer()
                .map(Some)
                .ok_or_else(|| self.invalid(field, format!("'{value}' is not a number"))),
        }
    }

    fn integer(&self, field: &'static str) -> Result<i64, DecodeError> {
        self.opt_integer(field)?.ok_or_else(|| self.missing(field))
    }

    /// Item counts are unsigned on the wire: the sign is dropped and zero
    /// counts as missing.
    fn quantity(&self) -> Result<i64, DecodeError> {
        match self.integer("quantity")? {
            0 => Err(self.missing("quantity")),
            n => n
                .checked_abs()
                .ok_or_else(|| self.invalid("quantity", format!("{n} is out of range"))),
        }
    }

    fn ranged(&self, field: &'static str, min: i64, max: i64) -> Result<i64, DecodeError> {
        let n = self.integer(field)?;
        if n < min || n > max {
            return Err(self.invalid(field, format!("{n} is out of range")));
        }
        Ok(n)
    }

    fn opt_bool(&self, field: &'static str) -> Result<Option<bool>, DecodeError> {
        match self.map.get(field) {
            None => Ok(None),
            Some(value) => value
                .as_bool()
                .map(Some)
                .ok_or_else(|| self.invalid(field, format!("'{value}' is not a boolean"))),
        }
    }

    fn stat(&self) -> Result<CharacterStat, DecodeError> {
        Ok(CharacterStat {
            name: self.text("name")?,
            value: self.integer("value")?,
            max_value: self.opt_integer("maxValue")?,
            is_percentage: self.opt_bool("isPercentage")?.unwrap_or(false),
            description: self.opt_text("description"),
            has_limit: self.opt_bool("hasLimit")?,
        })
    }

    fn skill(&self) -> Result<Skill, DecodeError> {
        Ok(Skill {
            name: self.text("name")?,
            description: self.text("description")?,
        })
    }

    fn entity(&self, kind: EntityKind) -> Result<DiscoveredEntity, DecodeError> {
        let sub_type = self.opt_text("type");
        let rarity = self.opt_text("rarity");
        let details = (sub_type.is_some() || rarity.is_some())
            .then_some(EntityDetails { sub_type, rarity });

        Ok(DiscoveredEntity {
            name: self.text("name")?,
            kind,
            description: self.text("description")?,
            personality: self.opt_text("personality").unwrap_or_default(),
            details,
            tags: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::lexer;

    fn raw(name: &str, body: &str) -> RawDirective {
        RawDirective {
            name: name.to_string(),
            fields: lexer::decode(body),
        }
    }

    #[test]
    fn every_kind_has_a_route() {
        for kind in DirectiveKind::ALL {
            let spec = kind.route();
            if kind != DirectiveKind::TimePassed {
                assert!(!spec.required.is_empty(), "{kind:?} has no required fields");
            }
        }
    }

    #[test]
    fn item_add_decodes_with_description() {
        let d = decode(&raw(
            "ITEM_ADD",
            r#"name="Kiếm Sắt", quantity=1, description="Một thanh kiếm.""#,
        ))
        .unwrap();
        assert_eq!(d, Directive::ItemAdd(GameItem::new("Kiếm Sắt", 1, "Một thanh kiếm.")));
    }

    #[test]
    fn item_remove_is_always_positive_magnitude() {
        let d = decode(&raw("ITEM_REMOVE", r#"name="Bánh Mì", quantity=-2"#)).unwrap();
        assert_eq!(
            d,
            Directive::ItemRemove {
                name: "Bánh Mì".into(),
                quantity: 2
            }
        );
    }

    #[test]
    fn missing_required_field_drops_the_directive() {
        let err = decode(&raw("ITEM_ADD", r#"name="Kiếm""#)).unwrap_err();
        assert_eq!(
            err,
            DecodeError::MissingField {
                directive: "ITEM_ADD",
                field: "quantity"
            }
        );

        let err = decode(&raw("NPC_NEW", r#"name="", description="x""#)).unwrap_err();
        assert!(matches!(err, DecodeError::MissingField { field: "name", .. }));
    }

    #[test]
    fn zero_quantity_counts_as_missing() {
        assert!(decode(&raw("ITEM_ADD", r#"name="Kiếm", quantity=0"#)).is_err());
    }

    #[test]
    fn huge_negative_quantity_is_invalid() {
        for tag in ["ITEM_ADD", "ITEM_REMOVE"] {
            let err = decode(&raw(tag, r#"name="Kiếm", quantity=-99999999999999999999"#))
                .unwrap_err();
            assert!(matches!(
                err,
                DecodeError::InvalidField {
                    field: "quantity",
                    ..
                }
            ));
        }

        let ok = decode(&raw("ITEM_REMOVE", r#"name="Kiếm", quantity=-3"#)).unwrap();
        assert!(matches!(ok, Directive::ItemRemove { quantity: 3, .. }));
    }

    #[test]
    fn suggestion_requires_numeric_success_rate() {
        let ok = decode(&raw(
            "SUGGESTION",
            r#"description="Chạy", successRate=80, risk="Ngã", reward="Thoát""#,
        ))
        .unwrap();
        assert!(matches!(ok, Directive::Suggestion(Suggestion { success_rate: 80, .. })));

        let err = decode(&raw(
            "SUGGESTION",
            r#"description="Chạy", successRate="cao", risk="Ngã", reward="Thoát""#,
        ))
        .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidField { field: "successRate", .. }));
    }

    #[test]
    fn time_passed_fields_are_all_optional() {
        let d = decode(&raw("TIME_PASSED", "")).unwrap();
        assert_eq!(d, Directive::TimePassed(TimeDelta::default()));

        let d = decode(&raw("TIME_PASSED", "hours=1, minutes=30")).unwrap();
        assert_eq!(
            d,
            Directive::TimePassed(TimeDelta {
                hours: Some(1),
                minutes: Some(30),
                ..TimeDelta::default()
            })
        );
    }

    #[test]
    fn status_type_must_be_buff_or_debuff() {
        assert!(decode(&raw(
            "STATUS_ACQUIRED",
            r#"name="Trúng Độc", description="Mất máu", type="debuff""#
        ))
        .is_ok());
        assert!(decode(&raw(
            "STATUS_ACQUIRED",
            r#"name="Trúng Độc", description="Mất máu", type="curse""#
        ))
        .is_err());
    }

    #[test]
    fn tiers_split_on_commas_and_drop_empties() {
        let d = decode(&raw(
            "REPUTATION_TIERS_SET",
            r#"tiers="Ma Đầu,,Kẻ Bị Truy Nã,Vô Danh,Thiện Nhân,Anh Hùng,""#,
        ))
        .unwrap();
        assert_eq!(
            d,
            Directive::ReputationTiersSet(vec![
                "Ma Đầu".into(),
                "Kẻ Bị Truy Nã".into(),
                "Vô Danh".into(),
                "Thiện Nhân".into(),
                "Anh Hùng".into(),
            ])
        );
    }

    #[test]
    fn item_defined_infers_entity_kind() {
        let d = decode(&raw(
            "ITEM_DEFINED",
            r#"name="Lá Bùa", description="Mang lại may mắn.", type="Phụ kiện", rarity="Hiếm""#,
        ))
        .unwrap();
        let Directive::EntityDiscovered(entity) = d else {
            panic!("expected an entity");
        };
        assert_eq!(entity.kind, EntityKind::Item);
        assert_eq!(
            entity.details,
            Some(EntityDetails {
                sub_type: Some("Phụ kiện".into()),
                rarity: Some("Hiếm".into()),
            })
        );
    }

    #[test]
    fn unknown_tags_are_reported() {
        assert_eq!(
            decode(&raw("WEATHER", "rain=true")).unwrap_err(),
            DecodeError::UnknownDirective("WEATHER".into())
        );
    }

    #[test]
    fn stats_carry_optional_fields() {
        let d = decode(&raw(
            "PLAYER_STATS_INIT",
            r#"name="Sinh Lực", value=100, maxValue=100, isPercentage=true, hasLimit=true"#,
        ))
        .unwrap();
        let Directive::PlayerStatsInit(stat) = d else {
            panic!("expected a stat");
        };
        assert_eq!(stat.max_value, Some(100));
        assert!(stat.is_percentage);
        assert_eq!(stat.has_limit, Some(true));
    }
}

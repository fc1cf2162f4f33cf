//! Exporting, importing and cleaning up the player's encyclopedia.

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::engine::llm_client::{structured, CompletionService, KeyRing, LlmError};
use crate::engine::merge::merge_incoming_first;
use crate::engine::prompt_builder::PromptBuilder;
use crate::model::game_state::{
    Companion, DiscoveredEntity, Faction, GameItem, GameStateSnapshot, Npc, Quest, Skill,
};

/// The knowledge-base slice of a game state, as exchanged in files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncyclopediaData {
    #[serde(rename = "encounteredNPCs")]
    pub npcs: Vec<Npc>,
    #[serde(rename = "encounteredFactions")]
    pub factions: Vec<Faction>,
    #[serde(rename = "discoveredEntities")]
    pub discovered_entities: Vec<DiscoveredEntity>,
    pub inventory: Vec<GameItem>,
    pub companions: Vec<Companion>,
    pub quests: Vec<Quest>,
    pub skills: Vec<Skill>,
}

/// Cleaned collections returned by the model. A missing list keeps the current one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OptimizedEncyclopedia {
    #[serde(rename = "optimizedNPCs")]
    pub npcs: Option<Vec<Npc>>,
    #[serde(rename = "optimizedFactions")]
    pub factions: Option<Vec<Faction>>,
    #[serde(rename = "optimizedDiscoveredEntities")]
    pub discovered_entities: Option<Vec<DiscoveredEntity>>,
    #[serde(rename = "optimizedInventory")]
    pub inventory: Option<Vec<GameItem>>,
    #[serde(rename = "optimizedCompanions")]
    pub companions: Option<Vec<Companion>>,
    #[serde(rename = "optimizedQuests")]
    pub quests: Option<Vec<Quest>>,
    #[serde(rename = "optimizedSkills")]
    pub skills: Option<Vec<Skill>>,
}

pub fn export(state: &GameStateSnapshot) -> EncyclopediaData {
    EncyclopediaData {
        npcs: state.npcs.clone(),
        factions: state.factions.clone(),
        discovered_entities: state.discovered_entities.clone(),
        inventory: state.inventory.clone(),
        companions: state.companions.clone(),
        quests: state.quests.clone(),
        skills: state.skills.clone(),
    }
}

/// Merges `incoming` into a copy of `state`. Incoming entries replace
/// existing ones with the same name; nameless entries are dropped.
pub fn import_into(state: &GameStateSnapshot, incoming: &EncyclopediaData) -> GameStateSnapshot {
    let mut next = state.clone();
    next.npcs = merge_incoming_first(&state.npcs, &incoming.npcs);
    next.factions = merge_incoming_first(&state.factions, &incoming.factions);
    next.discovered_entities =
        merge_incoming_first(&state.discovered_entities, &incoming.discovered_entities);
    next.inventory = merge_incoming_first(&state.inventory, &incoming.inventory);
    next.companions = merge_incoming_first(&state.companions, &incoming.companions);
    next.quests = merge_incoming_first(&state.quests, &incoming.quests);
    next.skills = merge_incoming_first(&state.skills, &incoming.skills);

    info!(
        "Imported encyclopedia: {} NPCs, {} factions, {} entities, {} items",
        incoming.npcs.len(),
        incoming.factions.len(),
        incoming.discovered_entities.len(),
        incoming.inventory.len()
    );
    next
}

/// Asks the model to deduplicate and clean the encyclopedia, then swaps in
/// whatever lists it returned.
pub fn optimize(
    service: &dyn CompletionService,
    keys: &mut KeyRing,
    state: &GameStateSnapshot,
) -> Result<GameStateSnapshot, LlmError> {
    let data = export(state);
    let prompt = PromptBuilder::optimize_encyclopedia(&data);
    let cleaned: OptimizedEncyclopedia =
        structured(service, keys, &prompt, None, &optimization_schema())?;

    // Replacement lists still obey per-collection name uniqueness.
    let mut next = state.clone();
    if let Some(npcs) = cleaned.npcs {
        next.npcs = merge_incoming_first(&[], &npcs);
    }
    if let Some(factions) = cleaned.factions {
        next.factions = merge_incoming_first(&[], &factions);
    }
    if let Some(entities) = cleaned.discovered_entities {
        next.discovered_entities = merge_incoming_first(&[], &entities);
    }
    if let Some(inventory) = cleaned.inventory {
        next.inventory = merge_incoming_first(&[], &inventory);
    }
    if let Some(companions) = cleaned.companions {
        next.companions = merge_incoming_first(&[], &companions);
    }
    if let Some(quests) = cleaned.quests {
        next.quests = merge_incoming_first(&[], &quests);
    }
    if let Some(skills) = cleaned.skills {
        next.skills = merge_incoming_first(&[], &skills);
    }
    Ok(next)
}

fn optimization_schema() -> serde_json::Value {
    let tags = json!({ "type": "array", "items": { "type": "string" } });
    let object = |properties: serde_json::Value, required: &[&str]| {
        json!({ "type": "object", "properties": properties, "required": required })
    };
    let list = |item: serde_json::Value| json!({ "type": "array", "items": item });

    let npc = object(
        json!({
            "name": { "type": "string" },
            "description": { "type": "string" },
            "personality": { "type": "string" },
            "thoughtsOnPlayer": { "type": "string" },
            "tags": tags,
        }),
        &["name", "description", "personality", "thoughtsOnPlayer"],
    );
    let faction = object(
        json!({ "name": { "type": "string" }, "description": { "type": "string" }, "tags": tags }),
        &["name", "description"],
    );
    let entity = object(
        json!({
            "name": { "type": "string" },
            "type": { "type": "string" },
            "personality": { "type": "string" },
            "description": { "type": "string" },
            "tags": tags,
        }),
        &["name", "type", "description"],
    );
    let item = object(
        json!({
            "name": { "type": "string" },
            "description": { "type": "string" },
            "quantity": { "type": "integer" },
            "tags": tags,
        }),
        &["name", "description", "quantity"],
    );
    let companion = object(
        json!({
            "name": { "type": "string" },
            "description": { "type": "string" },
            "personality": { "type": "string" },
            "tags": tags,
        }),
        &["name", "description"],
    );
    let quest = object(
        json!({
            "name": { "type": "string" },
            "description": { "type": "string" },
            "status": { "type": "string", "enum": ["in_progress", "completed", "failed"] },
            "tags": tags,
        }),
        &["name", "description", "status"],
    );
    let skill = object(
        json!({ "name": { "type": "string" }, "description": { "type": "string" } }),
        &["name", "description"],
    );

    json!({
        "type": "object",
        "properties": {
            "optimizedNPCs": list(npc),
            "optimizedFactions": list(faction),
            "optimizedDiscoveredEntities": list(entity),
            "optimizedInventory": list(item),
            "optimizedCompanions": list(companion),
            "optimizedQuests": list(quest),
            "optimizedSkills": list(skill),
        },
        "required": [
            "optimizedNPCs", "optimizedFactions", "optimizedDiscoveredEntities",
            "optimizedInventory", "optimizedCompanions", "optimizedQuests", "optimizedSkills",
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn npc(name: &str, description: &str) -> Npc {
        Npc {
            name: name.into(),
            description: description.into(),
            ..Npc::default()
        }
    }

    #[test]
    fn export_uses_file_field_names() {
        let mut state = GameStateSnapshot::default();
        state.npcs.push(npc("Lão Ăn Mày", "Bí ẩn"));
        let json = serde_json::to_value(export(&state)).unwrap();
        assert_eq!(json["encounteredNPCs"][0]["name"], "Lão Ăn Mày");
        assert!(json["encounteredFactions"].as_array().unwrap().is_empty());
    }

    #[test]
    fn import_prefers_incoming_and_drops_nameless() {
        let mut state = GameStateSnapshot::default();
        state.npcs = vec![npc("Guard", "old"), npc("Smith", "old")];
        let incoming = EncyclopediaData {
            npcs: vec![npc("GUARD", "new"), npc("  ", "junk")],
            ..EncyclopediaData::default()
        };
        let next = import_into(&state, &incoming);
        assert_eq!(next.npcs, vec![npc("GUARD", "new"), npc("Smith", "old")]);
        assert_eq!(state.npcs.len(), 2);
    }

    #[test]
    fn partial_file_still_parses() {
        let data: EncyclopediaData =
            serde_json::from_str(r#"{"skills": [{"name": "Kiếm Pháp", "description": "x"}]}"#)
                .unwrap();
        assert_eq!(data.skills.len(), 1);
        assert!(data.npcs.is_empty());
    }

    struct Canned(&'static str);

    impl CompletionService for Canned {
        fn complete_text(&self, _: &mut KeyRing, _: &str, _: Option<&str>) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }

        fn complete_json(
            &self,
            _: &mut KeyRing,
            prompt: &str,
            _: Option<&str>,
            schema: &serde_json::Value,
        ) -> Result<String, LlmError> {
            assert!(prompt.contains("Lộ Na"));
            assert!(schema["properties"]["optimizedNPCs"].is_object());
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn optimize_replaces_returned_lists_only() {
        let mut state = GameStateSnapshot::default();
        state.npcs = vec![npc("Lộ Na", "a"), npc("Huấn luyện viên Lộ Na", "b")];
        state.skills = vec![Skill {
            name: "Kiếm Pháp".into(),
            description: "x".into(),
        }];
        let service = Canned(
            r#"{"optimizedNPCs": [{"name": "Huấn luyện viên Lộ Na", "description": "a b"}]}"#,
        );

        let next = optimize(&service, &mut KeyRing::default(), &state).unwrap();
        assert_eq!(next.npcs, vec![npc("Huấn luyện viên Lộ Na", "a b")]);
        assert_eq!(next.skills, state.skills);
    }

    #[test]
    fn optimize_keeps_names_unique() {
        let mut state = GameStateSnapshot::default();
        state.npcs = vec![npc("Lộ Na", "a"), npc("Guard", "b")];
        let service = Canned(
            r#"{"optimizedNPCs": [
                {"name": "Guard", "description": "first"},
                {"name": " guard ", "description": "second"},
                {"name": "", "description": "nameless"}
            ]}"#,
        );

        let next = optimize(&service, &mut KeyRing::default(), &state).unwrap();
        assert_eq!(next.npcs, vec![npc("Guard", "first")]);
    }

    #[test]
    fn optimize_surfaces_bad_json() {
        let mut state = GameStateSnapshot::default();
        state.npcs.push(npc("Lộ Na", "a"));
        let err = optimize(&Canned("{oops"), &mut KeyRing::default(), &state).unwrap_err();
        assert!(matches!(err, LlmError::MalformedJson(_)));
    }
}

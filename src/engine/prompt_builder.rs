use crate::engine::apply_event::start_only_tags;
use crate::engine::calendar::time_of_day;
use crate::engine::encyclopedia::EncyclopediaData;
use crate::engine::sanitizer::obfuscate;
use crate::model::directive::DirectiveKind;
use crate::model::game_state::GameStateSnapshot;
use crate::model::message::GameTurn;
use crate::model::world::WorldSetup;

/// How many past turns are replayed into a prompt.
pub const HISTORY_WINDOW: usize = 12;

/// Builds the prompts sent to the model.
/// Only formats text: no parsing, no networking, no state changes.
pub struct PromptBuilder;

impl PromptBuilder {
    /// System instruction shared by every narrative turn.
    pub fn system_instruction(world: &WorldSetup) -> String {
        let mut prompt = String::new();
        push_narrator_rules(&mut prompt, world);
        push_output_format(&mut prompt);
        push_tag_grammar(&mut prompt);
        prompt
    }

    pub fn start_game(world: &WorldSetup) -> String {
        let mut prompt = String::new();

        push_world_definition(&mut prompt, world);
        prompt.push_str("OPENING TURN:\n");
        prompt.push_str(
            "Write the opening scene. In the tag block you MUST also emit:\n\
- one PLAYER_STATS_INIT per stat (only if the stats system is enabled),\n\
- exactly one WORLD_TIME_SET,\n\
- exactly one REPUTATION_TIERS_SET with 5 tiers, lowest first.\n\n",
        );
        push_reminder(&mut prompt);

        prompt
    }

    pub fn next_turn(
        world: &WorldSetup,
        state: &GameStateSnapshot,
        history: &[GameTurn],
        player_action: &str,
    ) -> String {
        let mut prompt = String::new();

        push_world_definition(&mut prompt, world);
        push_state_section(&mut prompt, state);
        push_history_section(&mut prompt, history);
        push_player_action(&mut prompt, player_action);
        push_reminder(&mut prompt);

        prompt
    }

    pub fn optimize_encyclopedia(data: &EncyclopediaData) -> String {
        let json = serde_json::to_string_pretty(data).unwrap_or_default();
        format!(
            "You are a data editor for a roleplaying game's encyclopedia.\n\n\
INPUT (may contain duplicates and junk):\n{json}\n\n\
TASKS:\n\
1. Merge entries that describe the same thing under different names \
(e.g. \"Lộ Na\" and \"Huấn luyện viên Lộ Na\"). Keep the most complete name \
and combine their descriptions.\n\
2. Remove entries that are not real game entities (verbs, feelings, body parts, \
generic nouns).\n\
3. Tidy descriptions without inventing new facts.\n\n\
Return every list, even if unchanged.\n"
        )
    }
}

/* =========================
   Sections
   ========================= */

fn push_narrator_rules(prompt: &mut String, world: &WorldSetup) {
    prompt.push_str(
        "You are the narrator and every non-player character of a text roleplaying game.\n\n\
Rules:\n\
- Never decide actions, words or thoughts for the player character.\n\
- Never change game state in prose; every change is a tag in the tag block.\n\
- Words written as [x-y-z] are encoded; read them as the joined word.\n",
    );
    for rule in &world.core_rules {
        prompt.push_str("- ");
        prompt.push_str(rule);
        prompt.push('\n');
    }
    prompt.push('\n');
}

fn push_output_format(prompt: &mut String) {
    prompt.push_str(
        "Output Format:\n\
<narration>\n\
[NARRATION_END]\n\
<one tag per line>\n\n\
Tag syntax: [TAG_NAME: key=\"text\", key=123, key=true]\n\
- Text values use double quotes. No trailing commas.\n\
- Markup allowed in narration: <entity>, <important>, <status>, <exp>, <thought>.\n\
- Do not use markup inside dialogue quotes.\n\n",
    );
}

fn push_tag_grammar(prompt: &mut String) {
    prompt.push_str("Tags:\n");
    for (kind, example) in TAG_EXAMPLES {
        prompt.push_str(example);
        if kind.route().start_only {
            prompt.push_str("  (opening turn only)");
        }
        prompt.push('\n');
    }
    prompt.push_str(&format!(
        "\nNever send {} after the opening turn; they are ignored.\n",
        start_only_tags().join(", ")
    ));
    prompt.push_str(
        "Every turn MUST include TIME_PASSED and 4 SUGGESTION tags.\n\
Use NPC_UPDATE only for thoughtsOnPlayer.\n\n",
    );
}

fn push_world_definition(prompt: &mut String, world: &WorldSetup) {
    let character = &world.character;

    prompt.push_str("WORLD:\n");
    prompt.push_str(&format!("Name: {}\n", world.world_name));
    prompt.push_str(&format!("Genre: {}\n", world.genre));
    if !world.setting.trim().is_empty() {
        prompt.push_str(&format!("Setting: {}\n", world.setting));
    }
    prompt.push_str(&format!(
        "Stats system: {}\n\n",
        if world.enable_stats_system { "enabled" } else { "disabled" }
    ));

    prompt.push_str("PLAYER CHARACTER:\n");
    prompt.push_str(&format!("Name: {}\n", character.name));
    if !character.gender.is_empty() {
        prompt.push_str(&format!("Gender: {}\n", character.gender));
    }
    if !character.personality.is_empty() {
        prompt.push_str(&format!("Personality: {}\n", character.personality));
    }
    prompt.push_str(&format!("Bio: {}\n", character.bio));
    if !character.motivation.is_empty() {
        prompt.push_str(&format!("Motivation: {}\n", character.motivation));
    }
    prompt.push('\n');
}

fn push_state_section(prompt: &mut String, state: &GameStateSnapshot) {
    let cal = &state.calendar;
    prompt.push_str("CURRENT STATE:\n");
    prompt.push_str(&format!(
        "Time: year {}, month {}, day {}, {}:00 ({})\n",
        cal.year,
        cal.month,
        cal.day,
        cal.hour,
        time_of_day(cal.hour)
    ));
    prompt.push_str(&format!(
        "Reputation: {} ({})\n",
        state.reputation.score, state.reputation.tier
    ));

    push_list(
        prompt,
        "Stats",
        state.stats.iter().map(|s| match s.max_value {
            Some(max) => format!("{}: {}/{}", s.name, s.value, max),
            None => format!("{}: {}", s.name, s.value),
        }),
    );
    push_list(
        prompt,
        "Inventory",
        state
            .inventory
            .iter()
            .map(|i| format!("{} x{}", i.name, i.quantity)),
    );
    push_list(
        prompt,
        "Status effects",
        state.status_effects.iter().map(|s| s.name.clone()),
    );
    push_list(prompt, "Skills", state.skills.iter().map(|s| s.name.clone()));
    push_list(
        prompt,
        "Quests",
        state
            .quests
            .iter()
            .map(|q| format!("{} ({})", q.name, q.status.label())),
    );
    push_list(
        prompt,
        "Companions",
        state.companions.iter().map(|c| c.name.clone()),
    );
    push_list(
        prompt,
        "Known NPCs",
        state
            .npcs
            .iter()
            .map(|n| format!("{}: {}", n.name, n.thoughts_on_player)),
    );
    push_list(prompt, "Memories", state.memories.iter().cloned());
    if let Some(summary) = state.summaries.last() {
        prompt.push_str(&format!("Story so far: {}\n", summary));
    }
    prompt.push('\n');
}

fn push_list(prompt: &mut String, title: &str, items: impl Iterator<Item = String>) {
    let items: Vec<String> = items.collect();
    if items.is_empty() {
        return;
    }
    prompt.push_str(title);
    prompt.push_str(": ");
    prompt.push_str(&items.join("; "));
    prompt.push('\n');
}

fn push_history_section(prompt: &mut String, history: &[GameTurn]) {
    if history.is_empty() {
        return;
    }
    prompt.push_str("RECENT HISTORY:\n");
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    for turn in &history[start..] {
        match turn {
            GameTurn::Action(text) => prompt.push_str(&format!("[PLAYER] {}\n", text)),
            GameTurn::Narration(text) => prompt.push_str(&format!("[NARRATOR] {}\n", text)),
        }
    }
    prompt.push('\n');
}

fn push_player_action(prompt: &mut String, player_action: &str) {
    prompt.push_str("PLAYER ACTION:\n");
    prompt.push_str(&obfuscate(player_action));
    prompt.push_str("\n\n");
}

fn push_reminder(prompt: &mut String) {
    prompt.push_str(
        "Reminder: narration first, then [NARRATION_END], then the tags. \
Nothing after the last tag.\n",
    );
}

const TAG_EXAMPLES: [(DirectiveKind, &str); 25] = [
    (
        DirectiveKind::Suggestion,
        "[SUGGESTION: description=\"Một hành động gợi ý\", successRate=80, risk=\"Rủi ro\", reward=\"Phần thưởng\"]",
    ),
    (
        DirectiveKind::TimePassed,
        "[TIME_PASSED: years=0, months=0, days=0, hours=1, minutes=30]",
    ),
    (
        DirectiveKind::ReputationChanged,
        "[REPUTATION_CHANGED: score=-10, reason=\"Ăn trộm\"]",
    ),
    (
        DirectiveKind::MemoryAdd,
        "[MEMORY_ADD: content=\"Một ký ức cốt lõi mới.\"]",
    ),
    (
        DirectiveKind::SummaryAdd,
        "[SUMMARY_ADD: content=\"Tóm tắt các sự kiện vừa qua.\"]",
    ),
    (
        DirectiveKind::PlayerStatsUpdate,
        "[PLAYER_STATS_UPDATE: name=\"Sinh Lực\", value=80, maxValue=100]",
    ),
    (
        DirectiveKind::PlayerStatsInit,
        "[PLAYER_STATS_INIT: name=\"Sinh Lực\", value=100, maxValue=100, isPercentage=true, description=\"Sức sống\", hasLimit=true]",
    ),
    (
        DirectiveKind::ItemAdd,
        "[ITEM_ADD: name=\"Thanh Kiếm Gỉ Sét\", quantity=1, description=\"Một thanh kiếm cũ.\"]",
    ),
    (
        DirectiveKind::ItemRemove,
        "[ITEM_REMOVE: name=\"Bánh Mì\", quantity=1]",
    ),
    (
        DirectiveKind::StatusAcquired,
        "[STATUS_ACQUIRED: name=\"Trúng Độc\", description=\"Mất máu mỗi lượt\", type=\"debuff\"]",
    ),
    (
        DirectiveKind::StatusRemoved,
        "[STATUS_REMOVED: name=\"Phấn Chấn\"]",
    ),
    (
        DirectiveKind::SkillLearned,
        "[SKILL_LEARNED: name=\"Hỏa Cầu Thuật\", description=\"Tạo ra một quả cầu lửa nhỏ.\"]",
    ),
    (
        DirectiveKind::SkillDefined,
        "[SKILL_DEFINED: name=\"Hỏa Cầu Thuật\", description=\"Tạo ra một quả cầu lửa nhỏ.\", type=\"Phép thuật\"]",
    ),
    (
        DirectiveKind::QuestNew,
        "[QUEST_NEW: name=\"Tìm kho báu\", description=\"Tìm kho báu trong Hang Sói.\"]",
    ),
    (
        DirectiveKind::QuestUpdate,
        "[QUEST_UPDATE: name=\"Tìm kho báu\", status=\"hoàn thành\"]",
    ),
    (
        DirectiveKind::CompanionNew,
        "[COMPANION_NEW: name=\"Sói Con\", description=\"Một con sói nhỏ.\", personality=\"Trung thành\"]",
    ),
    (
        DirectiveKind::CompanionRemove,
        "[COMPANION_REMOVE: name=\"Sói Con\"]",
    ),
    (
        DirectiveKind::NpcNew,
        "[NPC_NEW: name=\"Lão Ăn Mày\", description=\"Một ông lão bí ẩn.\", personality=\"Khôn ngoan\", thoughtsOnPlayer=\"Tò mò\"]",
    ),
    (
        DirectiveKind::NpcUpdate,
        "[NPC_UPDATE: name=\"Lão Ăn Mày\", thoughtsOnPlayer=\"Bắt đầu nghi ngờ bạn.\"]",
    ),
    (
        DirectiveKind::FactionUpdate,
        "[FACTION_UPDATE: name=\"Thiên Kiếm Môn\", description=\"Một môn phái kiếm tu.\"]",
    ),
    (
        DirectiveKind::ItemDefined,
        "[ITEM_DEFINED: name=\"Lá Bùa May Mắn\", description=\"Một lá bùa cũ.\", type=\"Phụ kiện\", rarity=\"Hiếm\"]",
    ),
    (
        DirectiveKind::LocationDiscovered,
        "[LOCATION_DISCOVERED: name=\"Hang Sói\", description=\"Một hang động tối tăm.\"]",
    ),
    (
        DirectiveKind::LoreDiscovered,
        "[LORE_DISCOVERED: name=\"Lời Tiên Tri Cổ\", description=\"Lời tiên tri về người anh hùng.\"]",
    ),
    (
        DirectiveKind::WorldTimeSet,
        "[WORLD_TIME_SET: year=1, month=1, day=1, hour=8]",
    ),
    (
        DirectiveKind::ReputationTiersSet,
        "[REPUTATION_TIERS_SET: tiers=\"Ma Đầu,Kẻ Bị Truy Nã,Vô Danh,Thiện Nhân,Anh Hùng\"]",
    ),
];

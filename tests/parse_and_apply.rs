use ai_roleplay_engine::engine::calendar::advance;
use ai_roleplay_engine::engine::lexer;
use ai_roleplay_engine::engine::merge::{merge_inventory, upsert_by_name};
use ai_roleplay_engine::engine::sanitizer::{deobfuscate, obfuscate, OBFUSCATION_MAP};
use ai_roleplay_engine::model::calendar::{CalendarValue, TimeDelta};
use ai_roleplay_engine::model::game_state::{GameItem, Npc};
use ai_roleplay_engine::model::value::Value;
use ai_roleplay_engine::{
    apply_directives, parse_response, ApplyOutcome, BatchKind, Directive, GameStateSnapshot,
};
use pretty_assertions::assert_eq;

const SWORD_TURN: &str = "Bạn thấy một thanh kiếm.\n[NARRATION_END]\n\
[ITEM_ADD: name=\"Kiếm Sắt\", quantity=1, description=\"Một thanh kiếm.\"]\n\
[TIME_PASSED: hours=1]";

#[test]
fn sword_turn_end_to_end() {
    let parsed = parse_response(SWORD_TURN);
    assert_eq!(parsed.narration, "Bạn thấy một thanh kiếm.");
    assert_eq!(
        parsed.directives,
        vec![
            Directive::ItemAdd(GameItem::new("Kiếm Sắt", 1, "Một thanh kiếm.")),
            Directive::TimePassed(TimeDelta::hours(1)),
        ]
    );

    let state = GameStateSnapshot::default();
    let (next, report) = apply_directives(&state, &parsed.directives, BatchKind::NextTurn);
    assert_eq!(report.applied(), 2);
    assert_eq!(
        next.inventory,
        vec![GameItem::new("Kiếm Sắt", 1, "Một thanh kiếm.")]
    );
    assert_eq!(next.calendar, CalendarValue::new(1, 1, 1, 9));
}

#[test]
fn plain_prose_is_all_narration() {
    let raw = "Gió thổi qua cánh đồng.\nMọi thứ yên tĩnh.";
    let parsed = parse_response(raw);
    assert_eq!(parsed.narration, raw);
    assert!(parsed.directives.is_empty());
}

#[test]
fn missing_required_field_drops_only_that_directive() {
    let raw = "x\n[NARRATION_END]\n\
[NPC_NEW: name=\"Lão Ăn Mày\"]\n\
[QUEST_NEW: description=\"Không tên\"]\n\
[SUGGESTION: description=\"Chạy\", successRate=\"cao\", risk=\"a\", reward=\"b\"]\n\
[STATUS_REMOVED: name=\"Phấn Chấn\"]";
    let parsed = parse_response(raw);
    assert_eq!(
        parsed.directives,
        vec![Directive::StatusRemoved {
            name: "Phấn Chấn".into()
        }]
    );
}

#[test]
fn out_of_range_quantities_are_dropped() {
    let raw = "x\n[NARRATION_END]\n\
[ITEM_REMOVE: name=\"Kiếm\", quantity=-99999999999999999999]\n\
[ITEM_ADD: name=\"Khiên\", quantity=-99999999999999999999]\n\
[MEMORY_ADD: content=\"còn lại\"]";
    let parsed = parse_response(raw);
    assert_eq!(
        parsed.directives,
        vec![Directive::MemoryAdd {
            content: "còn lại".into()
        }]
    );
}

#[test]
fn trailing_comma_does_not_break_the_scan() {
    let fields = lexer::decode("name=\"Kiếm\", quantity=1,");
    assert_eq!(fields.len(), 2);
    assert_eq!(fields["name"], Value::Text("Kiếm".into()));
    assert_eq!(fields["quantity"], Value::Number(1.0));
}

#[test]
fn deobfuscate_is_idempotent() {
    for sample in [
        "plain text",
        "[b-ú] và [â-m đ-ạ-o]",
        "[[b-ú]-x]",
        "[a-b] [NARRATION_END] [ITEM_ADD: name=\"x\"]",
    ] {
        let once = deobfuscate(sample);
        assert_eq!(deobfuscate(&once), once, "{sample}");
    }
}

#[test]
fn obfuscation_round_trips_every_table_word() {
    for (word, _) in OBFUSCATION_MAP {
        assert_eq!(deobfuscate(&obfuscate(word)), word.to_lowercase());
    }
}

#[test]
fn calendar_properties() {
    let now = CalendarValue::new(7, 6, 15, 12);
    assert_eq!(advance(&now, &TimeDelta::default()), now);
    assert_eq!(
        advance(&CalendarValue::new(1, 12, 31, 23), &TimeDelta::hours(2)),
        CalendarValue::new(2, 1, 1, 1)
    );
}

#[test]
fn inventory_properties() {
    assert!(merge_inventory(
        &[GameItem::new("Sword", 1, "")],
        &[GameItem::new("Sword", -1, "")]
    )
    .is_empty());
    assert_eq!(
        merge_inventory(&[], &[GameItem::new("Potion", 2, "Heals")]),
        vec![GameItem::new("Potion", 2, "Heals")]
    );
}

#[test]
fn upsert_never_duplicates_by_case() {
    let mut npcs = vec![Npc {
        name: "Guard".into(),
        ..Npc::default()
    }];
    upsert_by_name(
        &mut npcs,
        Npc {
            name: "guard".into(),
            ..Npc::default()
        },
    );
    assert_eq!(npcs.len(), 1);
    assert_eq!(npcs[0].name, "guard");
}

#[test]
fn opening_tags_are_refused_mid_game() {
    let raw = "x\n[NARRATION_END]\n[REPUTATION_TIERS_SET: tiers=\"A,B,C\"]";
    let parsed = parse_response(raw);
    assert_eq!(parsed.directives.len(), 1);

    let state = GameStateSnapshot::default();
    let (next, report) = apply_directives(&state, &parsed.directives, BatchKind::NextTurn);
    assert_eq!(next.reputation_tiers, state.reputation_tiers);
    assert!(matches!(
        report.results[0].outcome,
        ApplyOutcome::Rejected { .. }
    ));

    let (opened, _) = apply_directives(&state, &parsed.directives, BatchKind::StartGame);
    assert_eq!(opened.reputation_tiers, vec!["A", "B", "C"]);
}

#[test]
fn snapshot_round_trips_through_json() {
    let (state, _) = apply_directives(
        &GameStateSnapshot::default(),
        &parse_response(SWORD_TURN).directives,
        BatchKind::NextTurn,
    );
    let json = serde_json::to_string(&state).unwrap();
    assert!(json.contains("\"discoveredEntities\""));
    let back: GameStateSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back, state);
}

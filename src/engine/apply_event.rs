use log::{debug, info};

use crate::engine::calendar;
use crate::engine::merge::{merge_inventory, patch_by_name, remove_by_name, upsert_by_name};
use crate::engine::sanitizer::strip_all_tags;
use crate::model::directive::{Directive, DirectiveKind};
use crate::model::event_result::{ApplyOutcome, ApplyReport};
use crate::model::game_state::{GameItem, GameStateSnapshot, Suggestion};

/// Which kind of model turn produced a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    /// Opening turn: may set the calendar, tier names and initial stats.
    StartGame,
    NextTurn,
}

/// Changes that only land once the whole batch has been walked.
#[derive(Default)]
struct Pending {
    inventory: Vec<GameItem>,
    suggestions: Vec<Suggestion>,
    summary: Option<String>,
    tiers: Option<Vec<String>>,
}

/// Applies one response's directives to a copy of `state`, in text order.
///
/// Inventory deltas are merged in one pass at the end, the batch's suggestions
/// replace the previous list, and for the summary and tier list only the last
/// occurrence counts.
pub fn apply_directives(
    state: &GameStateSnapshot,
    directives: &[Directive],
    batch: BatchKind,
) -> (GameStateSnapshot, ApplyReport) {
    let mut next = state.clone();
    let mut pending = Pending::default();
    let mut report = ApplyReport::default();

    for directive in directives {
        let kind = directive.kind();
        let outcome = if kind.route().start_only && batch != BatchKind::StartGame {
            ApplyOutcome::Rejected {
                reason: format!("[{}] is only valid in the opening turn", kind.tag()),
            }
        } else {
            apply_directive(&mut next, directive, &mut pending)
        };

        if outcome != ApplyOutcome::Applied {
            debug!("[{}] -> {:?}", kind.tag(), outcome);
        }
        report.push(kind, outcome);
    }

    finish_batch(&mut next, pending, batch);

    info!(
        "Applied {} of {} directives ({:?})",
        report.applied(),
        report.results.len(),
        batch
    );

    (next, report)
}

fn apply_directive(
    state: &mut GameStateSnapshot,
    directive: &Directive,
    pending: &mut Pending,
) -> ApplyOutcome {
    match directive {
        Directive::Suggestion(suggestion) => {
            pending.suggestions.push(suggestion.clone());
            ApplyOutcome::Applied
        }

        Directive::TimePassed(delta) => {
            state.calendar = calendar::advance(&state.calendar, delta);
            ApplyOutcome::Applied
        }

        Directive::ReputationChanged { score, reason } => {
            state.change_reputation(*score, reason);
            ApplyOutcome::Applied
        }

        Directive::MemoryAdd { content } => {
            state.memories.push(strip_all_tags(content));
            ApplyOutcome::Applied
        }

        Directive::SummaryAdd { content } => {
            pending.summary = Some(strip_all_tags(content));
            ApplyOutcome::Applied
        }

        Directive::PlayerStatsUpdate(stat) => {
            upsert_by_name(&mut state.stats, stat.clone());
            ApplyOutcome::Applied
        }

        Directive::PlayerStatsInit(stat) => {
            upsert_by_name(&mut state.initial_stats, stat.clone());
            ApplyOutcome::Applied
        }

        Directive::ItemAdd(item) => {
            pending.inventory.push(item.clone());
            ApplyOutcome::Applied
        }

        Directive::ItemRemove { name, quantity } => {
            let delta = quantity.saturating_abs().saturating_neg();
            pending.inventory.push(GameItem::new(name.clone(), delta, ""));
            ApplyOutcome::Applied
        }

        Directive::StatusAcquired(status) => {
            upsert_by_name(&mut state.status_effects, status.clone());
            ApplyOutcome::Applied
        }

        Directive::StatusRemoved { name } => {
            if remove_by_name(&mut state.status_effects, name) {
                ApplyOutcome::Applied
            } else {
                ApplyOutcome::Deferred {
                    reason: format!("Status '{}' not found", name),
                }
            }
        }

        Directive::SkillLearned(skill) | Directive::SkillDefined(skill) => {
            upsert_by_name(&mut state.skills, skill.clone());
            ApplyOutcome::Applied
        }

        Directive::QuestNew(quest) => {
            upsert_by_name(&mut state.quests, quest.clone());
            ApplyOutcome::Applied
        }

        Directive::QuestUpdate {
            name,
            status,
            description,
        } => {
            let found = patch_by_name(&mut state.quests, name, |quest| {
                quest.status = *status;
                if let Some(description) = description {
                    quest.description = description.clone();
                }
            });
            if found {
                ApplyOutcome::Applied
            } else {
                ApplyOutcome::Deferred {
                    reason: format!("Quest '{}' not found", name),
                }
            }
        }

        Directive::CompanionNew(companion) => {
            upsert_by_name(&mut state.companions, companion.clone());
            ApplyOutcome::Applied
        }

        Directive::CompanionRemove { name } => {
            if remove_by_name(&mut state.companions, name) {
                ApplyOutcome::Applied
            } else {
                ApplyOutcome::Deferred {
                    reason: format!("Companion '{}' not found", name),
                }
            }
        }

        Directive::NpcNew(npc) => {
            upsert_by_name(&mut state.npcs, npc.clone());
            ApplyOutcome::Applied
        }

        Directive::NpcUpdate {
            name,
            thoughts_on_player,
        } => {
            let found = patch_by_name(&mut state.npcs, name, |npc| {
                npc.thoughts_on_player = thoughts_on_player.clone();
            });
            if found {
                ApplyOutcome::Applied
            } else {
                ApplyOutcome::Deferred {
                    reason: format!("NPC '{}' not found", name),
                }
            }
        }

        Directive::FactionUpdate(faction) => {
            upsert_by_name(&mut state.factions, faction.clone());
            ApplyOutcome::Applied
        }

        Directive::EntityDiscovered(entity) => {
            upsert_by_name(&mut state.discovered_entities, entity.clone());
            ApplyOutcome::Applied
        }

        Directive::WorldTimeSet(value) => {
            state.calendar = calendar::normalize(value);
            ApplyOutcome::Applied
        }

        Directive::ReputationTiersSet(tiers) => {
            pending.tiers = Some(tiers.clone());
            ApplyOutcome::Applied
        }
    }
}

fn finish_batch(state: &mut GameStateSnapshot, pending: Pending, batch: BatchKind) {
    state.inventory = merge_inventory(&state.inventory, &pending.inventory);

    // Suggestions belong to a single turn.
    state.suggestions = pending.suggestions;

    if let Some(summary) = pending.summary {
        state.summaries.push(summary);
    }

    if let Some(tiers) = pending.tiers {
        state.reputation_tiers = tiers;
        state.refresh_reputation_tier();
    }

    if batch == BatchKind::StartGame {
        for stat in state.initial_stats.clone() {
            upsert_by_name(&mut state.stats, stat);
        }
    }
}

/// Tags that only make sense in the opening batch.
pub fn start_only_tags() -> Vec<&'static str> {
    DirectiveKind::ALL
        .iter()
        .filter(|k| k.route().start_only)
        .map(|k| k.tag())
        .collect()
}

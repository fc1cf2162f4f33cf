use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};
use log::info;

use ai_roleplay_engine::engine::encyclopedia::{self, EncyclopediaData};
use ai_roleplay_engine::engine::engine::Engine;
use ai_roleplay_engine::engine::protocol::{EngineCommand, EngineResponse};
use ai_roleplay_engine::model::game_state::GameStateSnapshot;
use ai_roleplay_engine::model::world::WorldSetup;
use ai_roleplay_engine::settings::Settings;
use ai_roleplay_engine::settings_io::{load_settings, save_settings, settings_path};

fn load_world() -> Result<WorldSetup> {
    match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading world file {path}"))?;
            serde_json::from_str(&text).with_context(|| format!("parsing world file {path}"))
        }
        None => Ok(WorldSetup::default()),
    }
}

fn read_encyclopedia(path: &str) -> Result<EncyclopediaData> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading encyclopedia {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing encyclopedia {path}"))
}

fn write_encyclopedia(path: &str, state: &GameStateSnapshot) -> Result<()> {
    let json = serde_json::to_string_pretty(&encyclopedia::export(state))?;
    std::fs::write(path, json).with_context(|| format!("writing {path}"))
}

fn print_response(response: EngineResponse, state: &mut GameStateSnapshot) {
    match response {
        EngineResponse::TurnApplied {
            narration,
            report,
            state: next,
        } => {
            println!("\n{narration}\n");
            for (i, s) in next.suggestions.iter().enumerate() {
                println!("  {}. {} ({}%)", i + 1, s.description, s.success_rate);
            }
            info!("{} applied, {} skipped", report.applied(), report.skipped());
            *state = *next;
        }
        EngineResponse::EncyclopediaImported { state: next } => {
            println!("Encyclopedia imported.");
            *state = *next;
        }
        EngineResponse::EncyclopediaOptimized { state: next } => {
            println!(
                "Encyclopedia cleaned: {} NPCs, {} factions, {} entities.",
                next.npcs.len(),
                next.factions.len(),
                next.discovered_entities.len()
            );
            *state = *next;
        }
        EngineResponse::Error(message) => eprintln!("Error: {message}"),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let path = settings_path();
    if !path.exists() {
        save_settings(&Settings::default())?;
        info!("Wrote default settings to {}", path.display());
    }
    let settings = load_settings();
    let world = load_world()?;

    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();

    let probe = settings.client();
    let mut engine = Engine::new(Box::new(settings.client()), settings.key_ring(), world);
    let worker = thread::spawn(move || engine.run(cmd_rx, resp_tx));

    let mut state = GameStateSnapshot::default();

    cmd_tx.send(EngineCommand::StartGame)?;
    if let Ok(response) = resp_rx.recv() {
        print_response(response, &mut state);
    }

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        let command = match line.split_once(' ') {
            _ if line.is_empty() => continue,
            _ if line == "/quit" => break,
            _ if line == "/optimize" => EngineCommand::OptimizeEncyclopedia,
            _ if line == "/ping" => {
                match probe.test_connection() {
                    Ok(status) => println!("{status}"),
                    Err(err) => eprintln!("Error: {err}"),
                }
                continue;
            }
            Some(("/import", path)) => match read_encyclopedia(path) {
                Ok(data) => EngineCommand::ImportEncyclopedia(data),
                Err(err) => {
                    eprintln!("Error: {err:#}");
                    continue;
                }
            },
            Some(("/export", path)) => {
                match write_encyclopedia(path, &state) {
                    Ok(()) => println!("Encyclopedia written to {path}"),
                    Err(err) => eprintln!("Error: {err:#}"),
                }
                continue;
            }
            _ => EngineCommand::PlayerAction(line.to_string()),
        };

        cmd_tx.send(command)?;
        match resp_rx.recv() {
            Ok(response) => print_response(response, &mut state),
            Err(_) => break,
        }
    }

    let _ = cmd_tx.send(EngineCommand::Shutdown);
    let _ = worker.join();
    Ok(())
}

//! Interactive chat session
//!
//! Wires the bond, its store, the self-update scheduler and a
//! readline-backed interaction loop together.

use anyhow::{Context, Result};
use bond_core::{
    Bond, BondConfig, BondError, BondStore, Input, InteractionLoop, LineSource, LoadOutcome,
    LookupResponder, Scheduler, SessionEnd, Shutdown,
};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;
use tracing::{debug, warn};

/// Exit status after Ctrl-C outside the line editor
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Terminal input with line editing and in-session history
struct EditorInput {
    editor: DefaultEditor,
}

impl EditorInput {
    fn new() -> Result<Self> {
        let editor = DefaultEditor::new().context("Failed to initialise line editor")?;
        Ok(Self { editor })
    }
}

impl LineSource for EditorInput {
    fn read_line(&mut self, prompt: &str) -> bond_core::Result<Input> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(Input::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
            Err(ReadlineError::Eof) => Ok(Input::Eof),
            Err(e) => Err(BondError::Turn(format!("failed to read input: {}", e))),
        }
    }
}

/// Run the interactive session until the user leaves
pub async fn run(config: BondConfig) -> Result<()> {
    let store = Arc::new(BondStore::new(config.memory_path()));

    let (document, outcome) = store.load_or_default();
    match outcome {
        LoadOutcome::Loaded => println!("[Lucy] Memory loaded from persistent storage."),
        LoadOutcome::Fresh => println!("[Lucy] No memory file found. Starting fresh."),
        LoadOutcome::Recovered => println!("[Lucy] Memory could not be loaded. Starting fresh."),
    }

    let bond = Bond::new(document);
    let shutdown = Shutdown::new();
    println!(
        "[Lucy] Initialized for {} (version {}).",
        config.user_name,
        bond.self_version()
    );

    let scheduler = Scheduler::new(bond.clone(), Arc::clone(&store), shutdown.clone())
        .with_interval(config.update_interval())
        .spawn();

    let session = InteractionLoop::new(
        bond.clone(),
        Arc::clone(&store),
        shutdown.clone(),
        LookupResponder,
        config.user_name.clone(),
    )
    .with_abort_on_turn_failure(config.abort_on_turn_failure);

    // The editor blocks on stdin, so the loop gets its own thread
    let interaction = tokio::task::spawn_blocking(move || -> Result<SessionEnd> {
        let mut input = EditorInput::new()?;
        Ok(session.run(&mut input, &mut std::io::stdout()))
    });

    tokio::select! {
        joined = interaction => {
            let end = joined.context("Interaction loop panicked")??;
            debug!(?end, "Session ended");
        }
        _ = tokio::signal::ctrl_c() => {
            shutdown.trigger();
            println!("\n[Lucy] Interrupted. Shutting down...");
            if let Err(e) = store.save_with(|| bond.snapshot()) {
                warn!(error = %e, "Final save failed");
            }
            // The input thread may still be blocked on stdin
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    }

    shutdown.trigger();
    let cycles = scheduler.await.context("Scheduler task panicked")?;
    debug!(cycles, "Scheduler finished");
    Ok(())
}

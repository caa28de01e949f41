// Terminal surfaces: the interactive prompt and the one-shot run.
use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::agent_engine::handle::AgentHandle;
use crate::agent_engine::history::HistoryEntry;
use crate::agent_engine::state::{AgentSnapshot, LoopStatus};
use crate::errors::PhoneClawResult;

const QUIT_WORDS: &[&str] = &["quit", "exit", "q"];

pub fn is_quit(line: &str) -> bool {
    QUIT_WORDS.contains(&line.trim().to_lowercase().as_str())
}

/// Read tasks line by line until EOF or a quit word.
pub async fn run_interactive(agent: &AgentHandle) -> PhoneClawResult<()> {
    println!("PhoneClaw ready. Type a task, or 'quit' to leave. Ctrl-C stops a running task.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("task> ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };
        let Some(line) = line else {
            break;
        };
        let task = line.trim();
        if task.is_empty() {
            continue;
        }
        if is_quit(task) {
            break;
        }

        if let Err(e) = run_once(agent, task).await {
            println!("could not start: {e}");
        }
    }
    println!("bye");
    Ok(())
}

/// Start `task` and follow it to a terminal status, printing each step.
pub async fn run_once(agent: &AgentHandle, task: &str) -> PhoneClawResult<LoopStatus> {
    let started_at = chrono::Utc::now().timestamp_millis();
    agent.start(task).await?;
    println!("task started: {task}");
    Ok(follow(agent, started_at).await)
}

async fn follow(agent: &AgentHandle, started_at: i64) -> LoopStatus {
    let mut rx = agent.subscribe();
    let mut printer = StepPrinter::new(started_at);
    let finished = agent.wait_finished();
    tokio::pin!(finished);

    loop {
        tokio::select! {
            status = &mut finished => {
                let snapshot = agent.state();
                printer.print_new(&snapshot);
                let outcome = snapshot.state.outcome.unwrap_or_default();
                println!("finished: {status:?} {outcome}");
                return status;
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    continue;
                }
                let snapshot = rx.borrow_and_update().clone();
                printer.print_new(&snapshot);
            }
            _ = tokio::signal::ctrl_c() => {
                if agent.stop() {
                    println!("stopping after the current step...");
                }
            }
        }
    }
}

/// Prints history entries of the current run exactly once.
struct StepPrinter {
    started_at: i64,
    last_step: u32,
}

impl StepPrinter {
    fn new(started_at: i64) -> Self {
        Self {
            started_at,
            last_step: 0,
        }
    }

    fn pending<'a>(&mut self, snapshot: &'a AgentSnapshot) -> Vec<&'a HistoryEntry> {
        let fresh: Vec<_> = snapshot
            .history
            .iter()
            .filter(|e| e.ts >= self.started_at && e.step > self.last_step)
            .collect();
        if let Some(last) = fresh.last() {
            self.last_step = last.step;
        }
        fresh
    }

    fn print_new(&mut self, snapshot: &AgentSnapshot) {
        for entry in self.pending(snapshot) {
            println!(
                "[step {}/{}] {} | {}",
                entry.step, snapshot.state.max_steps, entry.action_summary, entry.rationale
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quit_words() {
        assert!(is_quit("quit"));
        assert!(is_quit(" Q "));
        assert!(is_quit("EXIT"));
        assert!(!is_quit("quit the app"));
    }

    #[test]
    fn printer_skips_stale_and_already_printed_entries() {
        let mut stale = HistoryEntry::new(1, "home", "old run");
        stale.ts = 10;
        let mut snapshot = AgentSnapshot {
            history: vec![stale],
            ..AgentSnapshot::default()
        };

        let now = chrono::Utc::now().timestamp_millis();
        let mut printer = StepPrinter::new(now);
        assert!(printer.pending(&snapshot).is_empty());

        snapshot.history = vec![HistoryEntry::new(1, "back", "a"), HistoryEntry::new(2, "home", "b")];
        let steps: Vec<u32> = printer.pending(&snapshot).iter().map(|e| e.step).collect();
        assert_eq!(steps, vec![1, 2]);
        assert!(printer.pending(&snapshot).is_empty());

        snapshot.history.push(HistoryEntry::new(3, "done", "c"));
        assert_eq!(printer.pending(&snapshot).len(), 1);
    }
}

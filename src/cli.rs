use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Override the step budget for this session
    #[arg(long, global = true)]
    pub max_steps: Option<u32>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one task and exit; the exit code is 0 only if the task succeeded
    Run {
        /// Natural-language goal, e.g. "open Settings and turn on Wi-Fi"
        #[arg(required = true, num_args = 1..)]
        task: Vec<String>,
    },
    /// Serve the web dashboard
    Web {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Read tasks from the terminal, one per line (the default)
    Interactive,
}

impl Cli {
    pub fn command(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Interactive)
    }
}

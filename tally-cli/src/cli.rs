use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "tally")]
#[command(about = "Harvest timer from the terminal", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Authenticate with a Harvest personal access token
    Login {
        /// Account subdomain, e.g. "acme" for acme.harvestapp.com
        #[arg(long)]
        subdomain: String,
        /// Personal access token; prompted for when omitted
        #[arg(long)]
        token: Option<String>,
    },
    /// Remove saved credentials and local timer state
    Logout,
    /// Show the running timer
    Status,
    /// Start a timer, resuming today's matching entry when possible
    Start {
        #[arg(long)]
        project: u64,
        #[arg(long)]
        task: u64,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Stop the running timer
    Stop,
    /// Replace the notes on the running timer
    Notes { text: String },
    /// List today's entries and the daily total
    Today,
    /// List the tasks assigned to a project
    Tasks { project: u64 },
    /// List active projects
    Projects,
    /// Keep the timer in sync and show it live until Ctrl-C
    Watch,
    /// Print config path and create default file if missing
    ConfigPath,
}

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tally_core::domain::{
    models::{ProjectId, RunningTimerView, StartTimerRequest},
    ports::{inbound::TimerService, outbound::TimeTrackingClient},
    services::{
        elapsed::{format_compact, format_hms, hours_to_seconds},
        ProjectSelection, SyncWorker, TaskAssignmentLoader,
    },
};
use time::OffsetDateTime;

use crate::bootstrap::start_session;
use crate::config::TallyConfig;
use crate::session_store;

pub async fn login(config: &TallyConfig, subdomain: &str, token: Option<String>) -> Result<()> {
    let token = match token {
        Some(token) => token,
        None => rpassword::prompt_password("Harvest personal access token: ")
            .context("Failed to read token")?,
    };

    let credentials = harvest::Credentials::authenticate(subdomain, &token)
        .await
        .context("Login failed")?;
    session_store::save_credentials(&credentials)?;
    // A different account may have been used before.
    session_store::clear_file(&TallyConfig::state_path()?)?;

    let session = start_session(config).await?;
    match session.identity.user() {
        Some(user) => println!(
            "Logged in as {} ({}).",
            user.name,
            credentials.account_name.as_deref().unwrap_or(&credentials.subdomain)
        ),
        None => println!("Credentials saved, but the user could not be verified yet."),
    }
    session.finish().await;
    Ok(())
}

pub fn logout() -> Result<()> {
    session_store::clear_credentials()?;
    session_store::clear_file(&TallyConfig::state_path()?)?;
    session_store::clear_file(&TallyConfig::status_path()?)?;
    println!("Logged out.");
    Ok(())
}

fn print_view(view: &RunningTimerView, now: OffsetDateTime) {
    match view.entry() {
        Some(entry) => {
            println!("Running: {}", entry.label());
            if !entry.notes.is_empty() {
                println!("  Notes: {}", entry.notes);
            }
            println!("  Elapsed: {}", format_hms(view.display_seconds(now)));
        }
        None if view.last_stopped_seconds() > 0 => {
            println!("No timer running (last: {}).", format_hms(view.last_stopped_seconds()));
        }
        None => println!("No timer running."),
    }
}

pub async fn status(config: &TallyConfig) -> Result<()> {
    let session = start_session(config).await?;
    print_view(&session.reconciler.status().await, OffsetDateTime::now_utc());
    session.finish().await;
    Ok(())
}

pub async fn start(config: &TallyConfig, project: u64, task: u64, notes: String) -> Result<()> {
    let session = start_session(config).await?;
    let request = StartTimerRequest::new(project, task).with_notes(notes);
    let entry = session
        .reconciler
        .start(&request)
        .await
        .context("Failed to start timer")?;
    println!("Started {} (entry {}).", entry.label(), entry.id);
    session.finish().await;
    Ok(())
}

pub async fn stop(config: &TallyConfig) -> Result<()> {
    let session = start_session(config).await?;
    match session.reconciler.stop().await.context("Failed to stop timer")? {
        Some(_) => {
            let view = session.reconciler.status().await;
            println!("Stopped at {}.", format_hms(view.last_stopped_seconds()));
        }
        None => println!("No timer running."),
    }
    session.finish().await;
    Ok(())
}

pub async fn notes(config: &TallyConfig, text: &str) -> Result<()> {
    let session = start_session(config).await?;
    match session
        .reconciler
        .update_notes(text)
        .await
        .context("Failed to update notes")?
    {
        Some(entry) => println!("Notes updated on entry {}.", entry.id),
        None => println!("No timer running."),
    }
    session.finish().await;
    Ok(())
}

pub async fn today(config: &TallyConfig) -> Result<()> {
    let session = start_session(config).await?;
    let entries = session.reconciler.today_entries().await?;
    let totals = session.reconciler.daily_totals().await?;

    if entries.is_empty() {
        println!("Nothing logged today.");
    }
    for entry in &entries {
        let marker = if entry.is_running { "●" } else { " " };
        println!(
            "{} {:>8}  {}  {}",
            marker,
            format_hms(hours_to_seconds(entry.hours)),
            entry.label(),
            entry.notes
        );
    }
    println!("Total: {}", format_hms(totals.total_seconds));
    session.finish().await;
    Ok(())
}

pub async fn projects(config: &TallyConfig) -> Result<()> {
    let session = start_session(config).await?;
    let mut projects = session.client.get_projects().await?;
    projects.sort_by(|a, b| a.name.cmp(&b.name));
    for project in projects {
        match &project.code {
            Some(code) => println!("{:>10}  {} [{}]", project.id, project.name, code),
            None => println!("{:>10}  {}", project.id, project.name),
        }
    }
    session.finish().await;
    Ok(())
}

pub async fn tasks(config: &TallyConfig, project: u64) -> Result<()> {
    let session = start_session(config).await?;
    let loader = TaskAssignmentLoader::new(session.client.clone());
    match loader.select_project(ProjectId::new(project)).await {
        ProjectSelection::Loaded(tasks) if tasks.is_empty() => {
            println!("No active tasks for project {}.", project)
        }
        ProjectSelection::Loaded(tasks) => {
            for task in tasks {
                println!("{:>10}  {}", task.id, task.name);
            }
        }
        ProjectSelection::Ignored => {}
    }
    session.finish().await;
    Ok(())
}

pub async fn watch(config: &TallyConfig) -> Result<()> {
    let session = start_session(config).await?;
    let service: Arc<dyn TimerService> = session.reconciler.clone();
    let mut worker = SyncWorker::new(service, &config.sync);
    worker.spawn();

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let seconds = session.reconciler.tick().await;
                let view = session.reconciler.status().await;
                let label = view.entry().map(|e| e.label()).unwrap_or_else(|| "idle".to_string());
                print!("\r\x1b[2K{}  {}", format_compact(seconds), label);
                std::io::stdout().flush().ok();
            }
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for Ctrl-C")?;
                println!();
                break;
            }
        }
    }

    worker.stop();
    drop(worker);
    session.finish().await;
    Ok(())
}

pub fn config_path() -> Result<()> {
    let path = TallyConfig::ensure_default_file()?;
    println!("{}", path.display());
    Ok(())
}

use std::fmt::Write as _;
use std::sync::Arc;

use crate::cli::{Args, Command};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::template::{Template, TemplateRegistry};
use crate::tmux::{Session, SessionOrchestrator, TmuxManager};
use crate::ui::App;

pub async fn run_cli(args: Args) -> Result<()> {
    match args.command {
        Some(Command::List { json }) => {
            ensure_tmux()?;
            handle_list(json)
        }

        Some(Command::Templates { name }) => {
            let config = Config::load(args.config.as_deref()).await?;
            handle_templates(&config, name.as_deref())
        }

        None => {
            // Everything fatal happens before the terminal is touched
            ensure_tmux()?;
            let config = Config::load(args.config.as_deref()).await?;
            let orchestrator = SessionOrchestrator::from_env(Arc::new(TmuxManager::new()));
            let mut app = App::new(&config, orchestrator);
            app.run().await
        }
    }
}

fn ensure_tmux() -> Result<()> {
    if TmuxManager::is_available() {
        Ok(())
    } else {
        Err(Error::tmux("tmux not found on PATH"))
    }
}

fn handle_list(json: bool) -> Result<()> {
    let sessions = SessionOrchestrator::from_env(Arc::new(TmuxManager::new())).list()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    print!("{}", format_session_table(&sessions));
    Ok(())
}

fn format_session_table(sessions: &[Session]) -> String {
    if sessions.is_empty() {
        return "No tmux sessions.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "{:<30} {:<8} {}", "NAME", "WINDOWS", "STATUS");
    let _ = writeln!(out, "{}", "-".repeat(50));
    for s in sessions {
        let _ = writeln!(
            out,
            "{:<30} {:<8} {}",
            truncate(&s.name, 30),
            s.windows,
            s.status_label()
        );
    }
    let _ = writeln!(out, "\nTotal: {} sessions", sessions.len());
    out
}

fn handle_templates(config: &Config, name: Option<&str>) -> Result<()> {
    let registry = TemplateRegistry::new(config.templates.clone());

    if let Some(name) = name {
        print!("{}", format_template(registry.find(name)?));
        return Ok(());
    }

    if registry.is_empty() {
        println!("No templates configured.");
        return Ok(());
    }
    for template in registry.all() {
        println!("{}", format_template(template));
    }
    Ok(())
}

fn format_template(t: &Template) -> String {
    let mut out = String::new();
    if t.description.is_empty() {
        let _ = writeln!(out, "{}", t.name);
    } else {
        let _ = writeln!(out, "{} - {}", t.name, t.description);
    }

    for (i, window) in t.windows.iter().enumerate() {
        let name = window.name().unwrap_or("(unnamed)");
        let focus = if t.focused_window().is_some_and(|f| Some(f) == window.name()) {
            " *"
        } else {
            ""
        };
        match window.command() {
            Some(cmd) => {
                let _ = writeln!(out, "  {}. {name}{focus}: {cmd}", i + 1);
            }
            None => {
                let _ = writeln!(out, "  {}. {name}{focus}", i + 1);
            }
        }
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else if max <= 3 {
        s.chars().take(max).collect()
    } else {
        let head: String = s.chars().take(max - 3).collect();
        format!("{head}...")
    }
}

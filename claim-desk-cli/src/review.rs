//! Interactive adjuster review session. Annotations live only as long as the session.

use claim_desk::{DashboardController, DeskError, OverrideAction, Transition};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use crate::render;

const HELP: &str = "commands: refresh | team <name> | clear | show <claim-id> | approve <claim-id> | reject <claim-id> | overrides | help | quit";

#[derive(Debug, PartialEq)]
enum Line<'a> {
    Refresh,
    Team(&'a str),
    Clear,
    Show(&'a str),
    Override(&'a str, OverrideAction),
    Overrides,
    Help,
    Quit,
    Unknown(&'a str),
}

fn parse(line: &str) -> Line<'_> {
    let line = line.trim();
    let (command, arg) = match line.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    };

    match (command, arg) {
        ("refresh", _) | ("r", _) => Line::Refresh,
        ("team", team) if !team.is_empty() => Line::Team(team),
        ("clear", _) => Line::Clear,
        ("show", id) if !id.is_empty() => Line::Show(id),
        ("approve", id) if !id.is_empty() => Line::Override(id, OverrideAction::Approve),
        ("reject", id) if !id.is_empty() => Line::Override(id, OverrideAction::Reject),
        ("overrides", _) => Line::Overrides,
        ("help", _) | ("?", _) => Line::Help,
        ("quit", _) | ("exit", _) | ("q", _) => Line::Quit,
        _ => Line::Unknown(line),
    }
}

async fn print_dashboard(dashboard: &DashboardController) {
    print!("{}", render::dashboard(&dashboard.snapshot().await));
}

pub async fn run(dashboard: DashboardController) -> anyhow::Result<()> {
    if let Err(e) = dashboard.refresh().await {
        warn!(error = %e, "Initial dashboard fetch failed");
    }
    print_dashboard(&dashboard).await;
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse(&line) {
            Line::Refresh => {
                let _ = dashboard.refresh().await;
                print_dashboard(&dashboard).await;
            }
            Line::Team(team) => {
                dashboard.select_team(team).await;
                print_dashboard(&dashboard).await;
            }
            Line::Clear => {
                dashboard.clear_filter().await;
                print_dashboard(&dashboard).await;
            }
            Line::Show(id) => match dashboard.toggle_expanded(id).await {
                Ok(_) => print_dashboard(&dashboard).await,
                Err(e) => println!("! {}", e.user_message()),
            },
            Line::Override(id, action) => match dashboard.apply_override(id, action).await {
                Ok(Transition::Applied { to, .. }) => {
                    println!("{id}: {}", to.label().unwrap_or("none"))
                }
                Ok(Transition::Unchanged(status)) => {
                    println!("{id} is already {}", status.label().unwrap_or("none"))
                }
                Err(DeskError::UnknownClaim(id)) => println!("! no claim {id} on this dashboard"),
                Err(e) => println!("! {}", e.user_message()),
            },
            Line::Overrides => {
                for row in dashboard.snapshot().await.rows {
                    if let Some(label) = row.status.label() {
                        println!("{} {}", row.decision.claim_id(), label);
                    }
                }
                for (id, status) in dashboard.orphaned_overrides().await {
                    println!("{id} {} (not in current list)", status.label().unwrap_or("none"));
                }
            }
            Line::Help => println!("{HELP}"),
            Line::Quit => break,
            Line::Unknown(other) if other.is_empty() => {}
            Line::Unknown(other) => println!("unknown command `{other}`; {HELP}"),
        }
    }
    Ok(())
}

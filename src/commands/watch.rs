// ABOUTME: Live view of tracked items and profile driven by synchronizers
// ABOUTME: Prints only published changes; stdin controls refetch, visibility, focus and user

use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use std::io::BufRead;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};

use crate::api::{ApiClient, Item, User};
use crate::commands::items::print_items;
use crate::commands::user::print_profile;
use crate::config::AppConfig;
use crate::feeds;
use crate::sync::{CycleOutcome, KeyedSynchronizer, PageSignals, SkipReason, SyncState};

pub struct WatchOptions {
    pub profile: bool,
}

/// A line typed while watching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchInput {
    Refresh,
    Hide,
    Show,
    Focus,
    SwitchUser(i64),
    Help,
    Quit,
}

impl WatchInput {
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut parts = line.split_whitespace();
        let Some(word) = parts.next() else {
            return Ok(None);
        };
        let input = match word {
            "r" | "refresh" => WatchInput::Refresh,
            "hide" => WatchInput::Hide,
            "show" => WatchInput::Show,
            "focus" => WatchInput::Focus,
            "user" => {
                let id = parts
                    .next()
                    .ok_or_else(|| "usage: user <telegram-id>".to_string())?;
                let id = id
                    .parse()
                    .map_err(|_| format!("invalid telegram id: {}", id))?;
                WatchInput::SwitchUser(id)
            }
            "h" | "help" | "?" => WatchInput::Help,
            "q" | "quit" | "exit" => WatchInput::Quit,
            other => return Err(format!("unknown command: {} (type `help`)", other)),
        };
        Ok(Some(input))
    }
}

const HELP: &str = "Commands: r (refresh now), hide, show, focus, user <telegram-id>, q (quit)";

/// Tracks what was already shown for one resource so only real changes get printed.
struct View<T> {
    label: &'static str,
    rx: Option<watch::Receiver<SyncState<T>>>,
    shown: SyncState<T>,
}

impl<T> View<T> {
    fn new(label: &'static str) -> Self {
        Self {
            label,
            rx: None,
            shown: SyncState::default(),
        }
    }

    fn attach<K>(&mut self, binding: &KeyedSynchronizer<K, T>)
    where
        K: PartialEq + std::fmt::Debug,
        T: Send + Sync + 'static,
    {
        self.rx = binding.current().map(|sync| sync.subscribe());
        self.shown = SyncState::default();
    }

    /// Wait for the next state change. Never resolves while detached.
    async fn changed(&mut self) -> SyncState<T> {
        match self.rx.as_mut() {
            Some(rx) => {
                if rx.changed().await.is_err() {
                    self.rx = None;
                    return std::future::pending().await;
                }
                rx.borrow_and_update().clone()
            }
            None => std::future::pending().await,
        }
    }

    /// Report the transition from the last shown state; returns the data if it was republished.
    fn update(&mut self, state: SyncState<T>) -> Option<Arc<T>> {
        if state.is_refreshing && !self.shown.is_refreshing {
            println!("[{}] updating...", self.label);
        }
        if state.error.is_some() && state.error != self.shown.error {
            eprintln!(
                "[{}] update failed: {} (showing last known data)",
                self.label,
                state.error.as_deref().unwrap_or_default()
            );
        }
        let republished = !state.same_data(&self.shown);
        let data = state.data.clone();
        if republished {
            if let Some(at) = state.last_updated {
                println!("[{}] updated at {}", self.label, at.format("%H:%M:%S"));
            }
        }
        self.shown = state;
        if republished {
            data
        } else {
            None
        }
    }
}

fn describe(label: &str, outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::Published | CycleOutcome::Unchanged => {}
        CycleOutcome::Skipped(SkipReason::InFlight) => {
            println!("[{}] a refresh is already running", label)
        }
        CycleOutcome::Skipped(reason) => println!("[{}] refresh skipped: {:?}", label, reason),
        CycleOutcome::Failed(_) => {}
    }
}

async fn labelled(
    label: &'static str,
    handle: JoinHandle<CycleOutcome>,
) -> (&'static str, Result<CycleOutcome, JoinError>) {
    (label, handle.await)
}

/// Forward stdin lines from a plain thread so a pending read never holds up runtime shutdown.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<std::io::Result<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

pub async fn run(opts: WatchOptions, config: &AppConfig) -> Result<()> {
    let client = Arc::new(ApiClient::new(&config.api_url)?);
    let telegram_id = config.require_telegram_id()?;
    let signals = PageSignals::new();

    let mut items = feeds::keyed_items(
        Arc::clone(&client),
        config.polling.clone(),
        config.items_rules.clone(),
    );
    let mut profile = feeds::keyed_profile(
        Arc::clone(&client),
        config.polling.clone(),
        config.profile_rules.clone(),
    );

    let mut items_view: View<Vec<Item>> = View::new("items");
    let mut profile_view: View<User> = View::new("profile");

    items.bind(telegram_id, &signals)?;
    items_view.attach(&items);
    if opts.profile {
        profile.bind(telegram_id, &signals)?;
        profile_view.attach(&profile);
    }

    println!(
        "Watching items for {} (every {}s). {}",
        telegram_id,
        config.polling.interval.as_secs(),
        HELP
    );

    let mut refreshes = FuturesUnordered::new();
    let mut lines = spawn_stdin_reader();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result.context("Failed to listen for Ctrl+C")?;
                tracing::info!("Received shutdown signal");
                break;
            }
            Some((label, outcome)) = refreshes.next(), if !refreshes.is_empty() => {
                match outcome {
                    Ok(outcome) => describe(label, &outcome),
                    Err(e) => tracing::debug!("{} refresh task ended early: {}", label, e),
                }
            }
            state = items_view.changed() => {
                if let Some(items) = items_view.update(state) {
                    print_items(&items);
                }
            }
            state = profile_view.changed() => {
                if let Some(user) = profile_view.update(state) {
                    print_profile(&user);
                }
            }
            line = lines.recv(), if stdin_open => {
                let line = match line.transpose().context("Failed to read stdin")? {
                    Some(line) => line,
                    None => {
                        tracing::debug!("stdin closed, watching until Ctrl+C");
                        stdin_open = false;
                        continue;
                    }
                };
                let input = match WatchInput::parse(&line) {
                    Ok(Some(input)) => input,
                    Ok(None) => continue,
                    Err(message) => {
                        eprintln!("{}", message);
                        continue;
                    }
                };
                match input {
                    WatchInput::Refresh => {
                        if let Some(sync) = items.current() {
                            refreshes.push(labelled("items", sync.spawn_refetch(true)));
                        }
                        if let Some(sync) = profile.current() {
                            refreshes.push(labelled("profile", sync.spawn_refetch(true)));
                        }
                    }
                    WatchInput::Hide => signals.set_visible(false),
                    WatchInput::Show => signals.set_visible(true),
                    WatchInput::Focus => signals.focus(),
                    WatchInput::SwitchUser(id) => {
                        if items.bind(id, &signals)? {
                            items_view.attach(&items);
                        }
                        if opts.profile && profile.bind(id, &signals)? {
                            profile_view.attach(&profile);
                        }
                        println!("Watching user {}", id);
                    }
                    WatchInput::Help => println!("{}", HELP),
                    WatchInput::Quit => break,
                }
            }
        }
    }

    items.unbind();
    profile.unbind();
    println!("Stopped watching.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inputs() {
        assert_eq!(WatchInput::parse("r"), Ok(Some(WatchInput::Refresh)));
        assert_eq!(WatchInput::parse("  hide "), Ok(Some(WatchInput::Hide)));
        assert_eq!(WatchInput::parse("show"), Ok(Some(WatchInput::Show)));
        assert_eq!(WatchInput::parse("focus"), Ok(Some(WatchInput::Focus)));
        assert_eq!(
            WatchInput::parse("user 777"),
            Ok(Some(WatchInput::SwitchUser(777)))
        );
        assert_eq!(WatchInput::parse("q"), Ok(Some(WatchInput::Quit)));
        assert_eq!(WatchInput::parse(""), Ok(None));
    }

    #[test]
    fn test_parse_errors() {
        assert!(WatchInput::parse("user").is_err());
        assert!(WatchInput::parse("user abc").is_err());
        assert!(WatchInput::parse("dance").is_err());
    }

    #[test]
    fn test_view_reports_only_republished_data() {
        let mut view: View<u32> = View::new("test");
        let data = Arc::new(5);
        let published = SyncState {
            data: Some(Arc::clone(&data)),
            ..SyncState::default()
        };

        assert_eq!(view.update(published.clone()).as_deref(), Some(&5));

        let refreshing = SyncState {
            is_refreshing: true,
            ..published.clone()
        };
        assert!(view.update(refreshing).is_none());
        assert!(view.update(published).is_none());

        let failed = SyncState {
            data: Some(data),
            error: Some("Network Error".into()),
            ..SyncState::default()
        };
        assert!(view.update(failed).is_none());
    }
}

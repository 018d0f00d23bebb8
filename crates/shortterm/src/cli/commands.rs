//! Command implementations.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use shortterm_core::render::{html_to_text, render_inbox_html};
use shortterm_core::session::SessionManager;
use shortterm_core::{
    ApiStatus, Body, Config, Coordinator, FileStore, HttpApi, MessageId, NoPush, RestoreOutcome,
    SystemClock,
};
use tracing::{debug, info};

use super::output::{expiry_line, message_header, message_line, print_notices, terminal_safe};
use crate::notify::DesktopNotifier;

type App = Coordinator<HttpApi, NoPush, FileStore>;

/// How often `watch` re-checks service health.
const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(60);

fn app(config: &Config) -> Result<App> {
    let api = HttpApi::from_config(config).context("failed to create API client")?;
    Ok(Coordinator::new(
        api,
        NoPush,
        config.store(),
        Arc::new(SystemClock),
        config.refresh_interval(),
    )
    .with_preview_len(config.preview_len))
}

/// Builds the coordinator and restores the stored session.
async fn restored_app(config: &Config) -> Result<App> {
    let mut app = app(config)?;
    let outcome = app.start().await.context("failed to restore session")?;
    debug!(?outcome, "restore finished");
    Ok(app)
}

/// Restores the stored session or explains how to get one.
async fn active_app(config: &Config) -> Result<App> {
    let mut app = restored_app(config).await?;
    if !app.is_active() {
        print_notices(&app.take_notices());
        bail!("no active address; run `shortterm generate` first");
    }
    Ok(app)
}

pub async fn generate(config: &Config) -> Result<()> {
    let mut app = app(config)?;
    let result = app.generate().await;
    print_notices(&app.take_notices());
    let session = result.context("could not generate an address")?;

    println!("{}", session.address);
    eprintln!("{}", expiry_line(&session, app.now()));
    Ok(())
}

pub fn address(config: &Config) -> Result<()> {
    let mut sessions = SessionManager::new(config.store(), Arc::new(SystemClock));
    match sessions.restore()? {
        RestoreOutcome::Restored(session) => {
            println!("{}", session.address);
            eprintln!("{}", expiry_line(&session, sessions.now()));
            Ok(())
        }
        RestoreOutcome::Expired(session) => {
            bail!("{} has expired; run `shortterm generate`", session.address)
        }
        RestoreOutcome::Missing | RestoreOutcome::Corrupt => {
            bail!("no active address; run `shortterm generate`")
        }
    }
}

pub async fn inbox(config: &Config, json: bool, html: bool) -> Result<()> {
    let mut app = active_app(config).await?;
    print_notices(&app.take_notices());

    let messages = app.inbox().sorted();
    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }
    if html {
        println!(
            "{}",
            render_inbox_html(app.inbox(), app.now(), config.preview_len)
        );
        return Ok(());
    }

    if let Some(title) = app.title() {
        println!("{}", terminal_safe(&title));
    }
    if messages.is_empty() {
        println!("No messages yet.");
    }
    let now = app.now();
    for message in messages {
        println!("{}", message_line(message, now, config.preview_len));
    }
    Ok(())
}

pub async fn show(config: &Config, id: &str, html: bool) -> Result<()> {
    let mut app = active_app(config).await?;
    print_notices(&app.take_notices());

    let id = MessageId::new(id);
    let rendered = app.open_message(&id)?;
    if html {
        println!("{}", rendered.to_html());
        return Ok(());
    }

    let message = app
        .inbox()
        .get(&id)
        .with_context(|| format!("message {id} disappeared"))?;
    println!("{}\n", message_header(message, app.now()));
    let text = match &rendered.body {
        Body::Text(text) => text.clone(),
        Body::Html(sanitized) => html_to_text(sanitized),
    };
    println!("{}", terminal_safe(&text));
    Ok(())
}

pub async fn watch(config: &Config, notify: bool) -> Result<()> {
    let mut app = restored_app(config).await?;
    if !app.is_active() {
        app.generate().await.context("could not generate an address")?;
    }
    print_notices(&app.take_notices());

    let notifier = notify.then(DesktopNotifier::new);
    if let Some(session) = app.session() {
        println!("Watching {} ({})", session.address, expiry_line(session, app.now()));
    }
    let now = app.now();
    for message in app.inbox().sorted() {
        println!("{}", message_line(message, now, config.preview_len));
    }

    let mut health = tokio::time::interval(HEALTH_CHECK_INTERVAL);
    health.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let _ = health.tick().await; // consume immediate first tick
    let mut online = app.api_status().is_none_or(ApiStatus::is_online);

    loop {
        tokio::select! {
            arrived = app.process_next() => {
                let now = app.now();
                for message in &arrived {
                    println!("{}", message_line(message, now, config.preview_len));
                    if let Some(notifier) = &notifier {
                        notifier.notify(message);
                    }
                }
                if !arrived.is_empty() && let Some(title) = app.title() {
                    eprintln!("{}", terminal_safe(&title));
                }
            }
            _ = health.tick() => {
                let status = app.check_health().await;
                match (online, status.is_online()) {
                    (true, false) => app.on_offline(),
                    (false, true) => {
                        app.on_online().await;
                    }
                    _ => {}
                }
                online = status.is_online();
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, stopping");
                break;
            }
        }

        print_notices(&app.take_notices());
        if app.session().is_none() {
            bail!("the address expired; run `shortterm generate` for a new one");
        }
    }
    Ok(())
}

pub async fn clear(config: &Config) -> Result<()> {
    let mut app = active_app(config).await?;
    let result = app.clear_inbox().await;
    print_notices(&app.take_notices());
    result.context("could not clear the inbox")
}

pub fn forget(config: &Config) -> Result<()> {
    let mut sessions = SessionManager::new(config.store(), Arc::new(SystemClock));
    let outcome = sessions.restore()?;
    sessions.clear()?;
    match outcome {
        RestoreOutcome::Restored(session) | RestoreOutcome::Expired(session) => {
            eprintln!("Forgot {}", session.address);
        }
        RestoreOutcome::Missing | RestoreOutcome::Corrupt => eprintln!("No address stored"),
    }
    Ok(())
}

pub async fn status(config: &Config) -> Result<()> {
    let mut app = restored_app(config).await?;
    let api = match app.api_status() {
        Some(ApiStatus::Online) => "online",
        _ => "offline",
    };
    println!("Service:  {api} ({})", config.api_base_url);

    match app.session() {
        Some(session) => {
            println!("Address:  {}", session.address);
            println!("Session:  {}", expiry_line(session, app.now()));
            println!(
                "Messages: {} ({} unread)",
                app.inbox().len(),
                app.inbox().unread_count()
            );
        }
        None => println!("Address:  none"),
    }
    print_notices(&app.take_notices());
    Ok(())
}

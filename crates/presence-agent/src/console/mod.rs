//! Interactive console
//!
//! Reads one [`Command`] per line and drives a [`PresenceService`].

pub mod command;

pub use command::{Command, ParseError};

use std::collections::HashMap;
use std::fmt::Display;
use std::io;

use presence_core::SubjectId;
use presence_service::{PresenceService, SubscriptionHandle, WriteOutcome};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tracing::{debug, info};

fn status_label(online: bool) -> &'static str {
    if online {
        "online"
    } else {
        "offline"
    }
}

fn outcome_label(outcome: WriteOutcome) -> &'static str {
    match outcome {
        WriteOutcome::Created => "created",
        WriteOutcome::Updated => "updated",
        WriteOutcome::Dropped => "dropped (write in flight)",
        WriteOutcome::Failed => "failed (see log)",
    }
}

/// Line-oriented console over a presence service
pub struct Console<R, W> {
    service: PresenceService,
    input: Lines<R>,
    output: W,
    watches: HashMap<SubjectId, SubscriptionHandle>,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(service: PresenceService, input: R, output: W) -> Self {
        Self {
            service,
            input: input.lines(),
            output,
            watches: HashMap::new(),
        }
    }

    pub fn service(&self) -> &PresenceService {
        &self.service
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    /// Process commands until `quit` or end of input
    pub async fn run(&mut self) -> io::Result<()> {
        while let Some(line) = self.input.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            match line.parse::<Command>() {
                Ok(Command::Quit) => break,
                Ok(command) => {
                    debug!(command = command.name(), "Console command");
                    self.execute(command).await?;
                }
                Err(e) => self.say(format!("error: {e}")).await?,
            }
        }
        Ok(())
    }

    /// Cancel every watch and stop the service's background work
    pub async fn shutdown(&mut self) {
        for (_, handle) in self.watches.drain() {
            handle.cancel();
        }
        self.service.shutdown().await;
        info!("Console closed");
    }

    async fn execute(&mut self, command: Command) -> io::Result<()> {
        match command {
            Command::Active => {
                if self.service.actor().is_none() {
                    return self.say("no actor, use `login <id>` first").await;
                }
                self.service.mark_active();
                self.say("activity recorded").await
            }
            Command::SetStatus(online) => match self.service.set_status(online).await {
                Some(outcome) => {
                    self.say(format!("{}: {}", status_label(online), outcome_label(outcome)))
                        .await
                }
                None => self.say("no actor, use `login <id>` first").await,
            },
            Command::Login(subject_id) => {
                self.service.set_actor(Some(subject_id.clone()));
                self.say(format!("actor: {subject_id}")).await
            }
            Command::Logout => {
                self.service.cleanup();
                self.service.set_actor(None);
                self.say("actor cleared").await
            }
            Command::Check(subject_id) => {
                let online = self.service.check_status(&subject_id).await;
                self.say(format!("{subject_id}: {}", status_label(online)))
                    .await
            }
            Command::Cached(subject_id) => {
                let label = self
                    .service
                    .cached_status(&subject_id)
                    .map_or("unknown", status_label);
                self.say(format!("{subject_id}: {label}")).await
            }
            Command::Watch(subject_id) => self.watch(subject_id).await,
            Command::Unwatch(subject_id) => match self.watches.remove(&subject_id) {
                Some(handle) => {
                    handle.cancel();
                    self.say(format!("stopped watching {subject_id}")).await
                }
                None => self.say(format!("not watching {subject_id}")).await,
            },
            Command::List => self.list().await,
            Command::Help => self.say(Command::HELP).await,
            Command::Quit => Ok(()),
        }
    }

    async fn watch(&mut self, subject_id: SubjectId) -> io::Result<()> {
        if self.watches.contains_key(&subject_id) {
            return self.say(format!("already watching {subject_id}")).await;
        }

        let handle = self.service.subscribe(subject_id.clone()).await;
        if handle.is_noop() {
            return self
                .say(format!("change stream unavailable, not watching {subject_id}"))
                .await;
        }

        self.watches.insert(subject_id.clone(), handle);
        self.say(format!("watching {subject_id}")).await
    }

    async fn list(&mut self) -> io::Result<()> {
        if self.watches.is_empty() {
            return self.say("no watches").await;
        }

        let mut subjects: Vec<_> = self.watches.keys().cloned().collect();
        subjects.sort();
        for subject_id in subjects {
            let label = self
                .service
                .cached_status(&subject_id)
                .map_or("unknown", status_label);
            self.say(format!("{subject_id}: {label}")).await?;
        }
        Ok(())
    }

    async fn say(&mut self, message: impl Display) -> io::Result<()> {
        self.output
            .write_all(format!("{message}\n").as_bytes())
            .await?;
        self.output.flush().await
    }
}

impl<R, W> std::fmt::Debug for Console<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("service", &self.service)
            .field("watches", &self.watches.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presence_cache::LocalChangeBus;
    use presence_db::MemoryStatusStore;
    use presence_service::ServiceContext;
    use std::sync::Arc;

    fn console(
        script: &'static str,
        bus: Arc<LocalChangeBus>,
    ) -> (Arc<MemoryStatusStore>, Console<&'static [u8], Vec<u8>>) {
        let store = Arc::new(MemoryStatusStore::new());
        let ctx = ServiceContext::builder()
            .store(store.clone())
            .bus(bus)
            .build()
            .unwrap();
        let service = PresenceService::new(&ctx);
        (store, Console::new(service, script.as_bytes(), Vec::new()))
    }

    fn transcript<R>(console: &Console<R, Vec<u8>>) -> String {
        String::from_utf8(console.output.clone()).unwrap()
    }

    #[tokio::test]
    async fn test_status_commands() {
        let script = "online\nlogin u1\nonline\ncheck u1\ncached u1\ncached u2\nquit\noffline\n";
        let (store, mut console) = console(script, Arc::new(LocalChangeBus::default()));

        console.run().await.unwrap();

        let out = transcript(&console);
        assert!(out.contains("no actor"));
        assert!(out.contains("actor: u1"));
        assert!(out.contains("online: created"));
        assert!(out.contains("u1: online"));
        assert!(out.contains("u2: unknown"));
        // Nothing after quit runs
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_parse_errors_are_reported() {
        let (_store, mut console) = console("bogus\nwatch\n\n", Arc::new(LocalChangeBus::default()));

        console.run().await.unwrap();

        let out = transcript(&console);
        assert!(out.contains("error: Unknown command: bogus"));
        assert!(out.contains("error: `watch` requires a subject id"));
    }

    #[tokio::test]
    async fn test_watch_and_unwatch() {
        let script = "watch u2\nwatch u2\nlist\nunwatch u2\nunwatch u2\nlist\n";
        let (_store, mut console) = console(script, Arc::new(LocalChangeBus::default()));

        console.run().await.unwrap();

        let out = transcript(&console);
        assert!(out.contains("watching u2"));
        assert!(out.contains("already watching u2"));
        assert!(out.contains("stopped watching u2"));
        assert!(out.contains("not watching u2"));
        assert!(out.contains("no watches"));
        assert_eq!(console.service().active_subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_watch_without_change_stream() {
        let bus = Arc::new(LocalChangeBus::default());
        bus.set_unavailable(true);
        let (_store, mut console) = console("watch u2\nlist\n", bus);

        console.run().await.unwrap();

        let out = transcript(&console);
        assert!(out.contains("change stream unavailable"));
        assert!(out.contains("no watches"));
    }

    #[tokio::test]
    async fn test_shutdown_cancels_watches() {
        let (_store, mut console) = console("watch u1\nwatch u2\n", Arc::new(LocalChangeBus::default()));

        console.run().await.unwrap();
        assert_eq!(console.service().active_subscriptions(), 2);

        console.shutdown().await;
        assert_eq!(console.service().active_subscriptions(), 0);
    }
}

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::directory::Directory;
use crate::feed::{ChangeFeed, FeedSubscription};
use crate::sources::{EventSource, InvoiceSource, MessageSource};

use super::center::NotificationCenter;

/// Identity the sources are scoped to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    pub user_id: Option<String>,
    pub mcard_id: Option<String>,
}

impl DispatchConfig {
    pub fn new(user_id: Option<String>, mcard_id: Option<String>) -> Self {
        Self { user_id, mcard_id }
    }
}

/// Running set of source tasks. `stop` is idempotent; dropping the handle
/// signals the tasks without waiting for them.
pub struct DispatchHandle {
    stop_tx: watch::Sender<bool>,
    tasks: Vec<(String, JoinHandle<()>)>,
}

impl DispatchHandle {
    fn inert() -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            stop_tx,
            tasks: Vec::new(),
        }
    }

    pub fn channels(&self) -> Vec<String> {
        self.tasks.iter().map(|(channel, _)| channel.clone()).collect()
    }

    pub fn is_stopped(&self) -> bool {
        self.tasks.is_empty() || *self.stop_tx.borrow()
    }

    /// Signal every source and wait until each has closed its channel. A
    /// translation already in flight completes first.
    pub async fn stop(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        let _ = self.stop_tx.send(true);

        let tasks: Vec<(String, JoinHandle<()>)> = self.tasks.drain(..).collect();
        let results = futures::future::join_all(
            tasks
                .into_iter()
                .map(|(channel, task)| async move { (channel, task.await) }),
        )
        .await;
        for (channel, result) in results {
            if let Err(error) = result {
                tracing::warn!(
                    channel = %channel,
                    error = %error,
                    "source task ended abnormally"
                );
            }
        }
        tracing::info!("notification sources stopped");
    }
}

impl Drop for DispatchHandle {
    fn drop(&mut self) {
        if !self.tasks.is_empty() {
            let _ = self.stop_tx.send(true);
        }
    }
}

/// Open every source the config allows and start forwarding into `center`.
///
/// Without a user no source is opened. The invoice source additionally
/// needs a card id. Sources are independent: one whose subscription fails
/// is logged and skipped while the others keep running.
pub async fn start(
    config: &DispatchConfig,
    feed: Arc<dyn ChangeFeed>,
    directory: Arc<dyn Directory>,
    center: Arc<NotificationCenter>,
    fallback_sender: &str,
) -> DispatchHandle {
    let Some(user_id) = config.user_id.as_deref() else {
        tracing::debug!("no user, notification sources stay inert");
        return DispatchHandle::inert();
    };

    let mut sources: Vec<Arc<dyn EventSource>> = vec![Arc::new(MessageSource::new(
        user_id,
        directory.clone(),
        fallback_sender,
    ))];
    if let Some(mcard_id) = config.mcard_id.as_deref() {
        let invoices = InvoiceSource::new(mcard_id)
            .with_card_context(directory.as_ref())
            .await;
        sources.push(Arc::new(invoices));
    }

    let (stop_tx, _) = watch::channel(false);
    let mut tasks = Vec::with_capacity(sources.len());
    for source in sources {
        let channel = source.channel();
        let subscription = match feed.subscribe(&channel, source.filters()).await {
            Ok(subscription) => subscription,
            Err(error) => {
                tracing::warn!(channel = %channel, error = %error, "failed to subscribe source");
                continue;
            }
        };
        let task = tokio::spawn(run_source(
            source,
            subscription,
            feed.clone(),
            center.clone(),
            stop_tx.subscribe(),
        ));
        tasks.push((channel, task));
    }

    tracing::info!(user_id, sources = tasks.len(), "notification sources started");
    DispatchHandle { stop_tx, tasks }
}

async fn run_source(
    source: Arc<dyn EventSource>,
    mut subscription: FeedSubscription,
    feed: Arc<dyn ChangeFeed>,
    center: Arc<NotificationCenter>,
    mut stop_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            biased;
            _ = stop_rx.changed() => break,
            event = subscription.next_event() => {
                let Some(event) = event else {
                    tracing::debug!(channel = subscription.channel(), "channel closed by feed");
                    break;
                };
                for notification in source.translate(&event).await {
                    center.deliver(notification);
                }
            }
        }
    }

    let channel = subscription.channel().to_string();
    if let Err(error) = feed.remove_channel(subscription).await {
        tracing::warn!(channel = %channel, error = %error, "failed to remove channel");
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::bus::EventBus;
    use crate::config::NotifierSettings;
    use crate::delivery::PermissionState;
    use crate::directory::InMemoryDirectory;
    use crate::feed::InMemoryChangeFeed;
    use crate::testing::Recorders;

    fn center() -> Arc<NotificationCenter> {
        let recorders = Recorders::new(PermissionState::Default);
        Arc::new(NotificationCenter::new(
            &NotifierSettings::default(),
            recorders.sinks(),
            Arc::new(EventBus::new()),
        ))
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_closes_channels() {
        let feed = Arc::new(InMemoryChangeFeed::new());
        let config = DispatchConfig::new(Some("u1".to_string()), Some("c1".to_string()));
        let mut handle = start(
            &config,
            feed.clone(),
            Arc::new(InMemoryDirectory::new()),
            center(),
            "Un visiteur",
        )
        .await;

        assert!(!handle.is_stopped());
        assert_eq!(
            handle.channels(),
            vec![
                "business-messages-u1".to_string(),
                "business-invoices-c1".to_string()
            ]
        );

        handle.stop().await;
        assert!(handle.is_stopped());
        assert!(feed.active_channels().is_empty());

        handle.stop().await;
        assert!(handle.is_stopped());
    }

    #[tokio::test]
    async fn missing_user_gives_inert_handle() {
        let feed = Arc::new(InMemoryChangeFeed::new());
        let config = DispatchConfig::new(None, Some("c1".to_string()));
        let handle = start(
            &config,
            feed.clone(),
            Arc::new(InMemoryDirectory::new()),
            center(),
            "Un visiteur",
        )
        .await;

        assert!(handle.is_stopped());
        assert!(handle.channels().is_empty());
        assert!(feed.active_channels().is_empty());
    }
}

use tokio::sync::broadcast;

/// Default number of locale changes buffered per subscriber
const DEFAULT_CAPACITY: usize = 16;

/// A locale switch announced by one bucket to all others
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleChange {
    pub origin_bucket: String,
    pub locale: String,
}

/// Publish/subscribe channel for locale switches shared by a set of buckets
#[derive(Debug, Clone)]
pub struct LocaleChannel {
    sender: broadcast::Sender<LocaleChange>,
}

impl LocaleChannel {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Announces a locale switch, returns the number of listeners reached
    pub fn publish(&self, change: LocaleChange) -> usize {
        self.sender.send(change).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LocaleChange> {
        self.sender.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for LocaleChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let channel = LocaleChannel::new();
        let mut first = channel.subscribe();
        let mut second = channel.subscribe();

        let change = LocaleChange {
            origin_bucket: "ui".to_string(),
            locale: "de_DE".to_string(),
        };
        assert_eq!(channel.publish(change.clone()), 2);

        assert_eq!(first.recv().await.unwrap(), change);
        assert_eq!(second.recv().await.unwrap(), change);
    }

    #[test]
    fn test_publish_without_listeners() {
        let channel = LocaleChannel::new();
        let reached = channel.publish(LocaleChange {
            origin_bucket: "ui".to_string(),
            locale: "de_DE".to_string(),
        });

        assert_eq!(reached, 0);
        assert_eq!(channel.listener_count(), 0);
    }
}

use tokio::sync::mpsc;

use crate::metrics;

/// Handle for queueing raw IRC lines to the relay.
///
/// Cheaply cloneable. A disabled handle drops everything it is given.
#[derive(Clone, Debug)]
pub struct NotifyHandle {
    tx: Option<mpsc::Sender<String>>,
}

impl NotifyHandle {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Queue `PRIVMSG {channel} :{text}`.
    pub fn privmsg(&self, channel: &str, text: &str) -> bool {
        self.try_send(format!("PRIVMSG {} :{}", channel, text))
    }

    /// Queue a line without waiting. Returns true if it was accepted.
    ///
    /// A full or closed channel is logged; the caller is never failed.
    pub fn try_send(&self, line: String) -> bool {
        let Some(tx) = &self.tx else {
            tracing::debug!("Relay disabled, dropping message");
            return false;
        };
        match tx.try_send(line) {
            Ok(()) => true,
            Err(e) => {
                metrics::RELAY_MESSAGES.with_label_values(&["dropped"]).inc();
                tracing::warn!("Failed to queue relay message: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privmsg_format() {
        let (tx, mut rx) = mpsc::channel(4);
        let handle = NotifyHandle::new(tx);
        assert!(handle.privmsg("#mod", "hello there"));
        assert_eq!(rx.try_recv().unwrap(), "PRIVMSG #mod :hello there");
    }

    #[test]
    fn test_disabled_handle_drops() {
        let handle = NotifyHandle::disabled();
        assert!(!handle.is_enabled());
        assert!(!handle.privmsg("#mod", "nobody hears this"));
    }

    #[test]
    fn test_full_channel() {
        let (tx, _rx) = mpsc::channel(1);
        let handle = NotifyHandle::new(tx);
        assert!(handle.try_send("one".to_string()));
        assert!(!handle.try_send("two".to_string()));
    }

    #[test]
    fn test_closed_channel() {
        let (tx, rx) = mpsc::channel::<String>(1);
        drop(rx);
        let handle = NotifyHandle::new(tx);
        assert!(!handle.try_send("lost".to_string()));
    }
}

use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::metrics;

/// Background task that forwards queued lines to the bot's relay socket.
///
/// Each line is delivered over a fresh connection. Failures are logged and
/// the line is discarded.
pub struct RelayWriter {
    rx: mpsc::Receiver<String>,
    addr: String,
    timeout: Duration,
}

impl RelayWriter {
    pub fn new(rx: mpsc::Receiver<String>, addr: String, timeout: Duration) -> Self {
        Self { rx, addr, timeout }
    }

    /// Run until every handle is dropped.
    pub async fn run(mut self) {
        tracing::info!(addr = %self.addr, "Relay writer started");

        while let Some(line) = self.rx.recv().await {
            match self.deliver(&line).await {
                Ok(()) => {
                    metrics::RELAY_MESSAGES.with_label_values(&["sent"]).inc();
                    tracing::debug!(addr = %self.addr, "Relay message sent");
                }
                Err(e) => {
                    metrics::RELAY_MESSAGES.with_label_values(&["failed"]).inc();
                    tracing::warn!(addr = %self.addr, error = %e, "Relay delivery failed");
                }
            }
        }

        tracing::info!("Relay writer stopped");
    }

    async fn deliver(&self, line: &str) -> std::io::Result<()> {
        let connect = timeout(self.timeout, TcpStream::connect(&self.addr)).await;
        let mut stream = connect.map_err(|_| {
            std::io::Error::new(std::io::ErrorKind::TimedOut, "connect timed out")
        })??;

        let mut payload = line.replace(['\r', '\n'], " ");
        payload.push_str("\r\n");
        timeout(self.timeout, stream.write_all(payload.as_bytes()))
            .await
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "write timed out"))??;
        stream.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotifyHandle;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_delivers_line_to_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let (tx, rx) = mpsc::channel(4);
        let handle = NotifyHandle::new(tx);
        let writer = RelayWriter::new(rx, addr, Duration::from_secs(2));
        let task = tokio::spawn(writer.run());

        handle.privmsg("#mod", "Poll created");
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = String::new();
        socket.read_to_string(&mut received).await.unwrap();
        assert_eq!(received, "PRIVMSG #mod :Poll created\r\n");

        drop(handle);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_newlines_are_flattened() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let (tx, rx) = mpsc::channel(4);
        let writer = RelayWriter::new(rx, addr, Duration::from_secs(2));
        let task = tokio::spawn(writer.run());

        tx.send("PRIVMSG #mod :a\nQUIT".to_string()).await.unwrap();
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = String::new();
        socket.read_to_string(&mut received).await.unwrap();
        assert_eq!(received, "PRIVMSG #mod :a QUIT\r\n");

        drop(tx);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_relay_does_not_stop_writer() {
        // Bind then drop to get a port nobody listens on
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().to_string()
        };
        let (tx, rx) = mpsc::channel(4);
        let writer = RelayWriter::new(rx, addr, Duration::from_millis(200));
        let task = tokio::spawn(writer.run());

        tx.send("PRIVMSG #mod :one".to_string()).await.unwrap();
        tx.send("PRIVMSG #mod :two".to_string()).await.unwrap();
        drop(tx);
        task.await.unwrap();
    }
}

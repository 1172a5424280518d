//! WebSocket transport for the live channel.
//!
//! One worker thread owns the socket. It sends a [`LiveSubscribe`] frame for
//! every date the UI asks for and forwards text frames into a [`LiveSender`].
//! The thread ends when the socket closes or the [`LiveConnection`] is
//! dropped; either way the feed disconnects and the calendar keeps polling.

use std::io::ErrorKind;
use std::net::TcpStream;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::NaiveDate;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use super::live::{LiveSender, LiveSubscribe};
use crate::utils::date::to_iso;

/// How long a read may block before pending subscriptions are sent.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// Handle to the socket worker.
pub struct LiveConnection {
    subscriptions: Sender<LiveSubscribe>,
    subscribed: Option<NaiveDate>,
    worker: Option<JoinHandle<()>>,
}

impl LiveConnection {
    /// Start the worker. Connection errors are logged on the worker thread.
    pub fn spawn(url: String, frames: LiveSender) -> Self {
        let (subscriptions, requests) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("live-channel".to_string())
            .spawn(move || run(&url, &frames, &requests));

        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(err) => {
                log::error!("Failed to start live channel worker: {}", err);
                None
            }
        };

        Self {
            subscriptions,
            subscribed: None,
            worker,
        }
    }

    /// Ask for pushes for `date`. Repeating the current date sends nothing.
    pub fn subscribe(&mut self, date: NaiveDate) -> bool {
        if self.subscribed == Some(date) {
            return true;
        }
        let frame = LiveSubscribe { date: to_iso(date) };
        if self.subscriptions.send(frame).is_err() {
            return false;
        }
        self.subscribed = Some(date);
        true
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|worker| !worker.is_finished())
    }
}

fn run(url: &str, frames: &LiveSender, requests: &Receiver<LiveSubscribe>) {
    let mut socket = match tungstenite::connect(url) {
        Ok((socket, _)) => socket,
        Err(err) => {
            log::warn!("Live channel unavailable at {}: {}", url, err);
            return;
        }
    };
    log::info!("Live channel connected to {}", url);

    if let MaybeTlsStream::Plain(stream) = socket.get_mut() {
        if let Err(err) = stream.set_read_timeout(Some(POLL_INTERVAL)) {
            log::warn!("Live channel read timeout not set: {}", err);
        }
    }

    loop {
        if !send_pending(&mut socket, requests) {
            let _ = socket.close(None);
            return;
        }

        match socket.read() {
            Ok(Message::Text(text)) => {
                // Undecodable frames are logged by the sender.
                let _ = frames.push_json(&text);
            }
            Ok(Message::Close(_)) => {
                log::info!("Live channel closed by the server");
                return;
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(err))
                if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(err) => {
                log::warn!("Live channel dropped: {}", err);
                return;
            }
        }
    }
}

/// Send queued subscriptions. Returns false once the owner has gone away
/// or the socket refuses a write.
fn send_pending(socket: &mut Socket, requests: &Receiver<LiveSubscribe>) -> bool {
    loop {
        match requests.try_recv() {
            Ok(frame) => {
                log::debug!("Subscribing live channel to {}", frame.date);
                if let Err(err) = socket.send(Message::Text(frame.to_json())) {
                    log::warn!("Live subscription failed: {}", err);
                    return false;
                }
            }
            Err(TryRecvError::Empty) => return true,
            Err(TryRecvError::Disconnected) => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::backend::{LiveFeed, LiveMessage};
    use std::net::TcpListener;
    use std::time::Instant;

    fn wait_for(feed: &mut LiveFeed) -> Vec<LiveMessage> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut received = Vec::new();
        while received.is_empty() && Instant::now() < deadline {
            received = feed.drain();
            thread::sleep(Duration::from_millis(20));
        }
        received
    }

    #[test]
    fn test_subscribes_and_forwards_frames() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut socket = tungstenite::accept(stream).unwrap();
            let mut dates = Vec::new();
            for _ in 0..2 {
                match socket.read().unwrap() {
                    Message::Text(text) => {
                        let frame: LiveSubscribe = serde_json::from_str(&text).unwrap();
                        dates.push(frame.date.clone());
                        let reply = serde_json::json!({
                            "type": "initial_event_load",
                            "events": [],
                            "current_date": frame.date,
                        });
                        socket.send(Message::Text(reply.to_string())).unwrap();
                    }
                    other => panic!("unexpected frame {:?}", other),
                }
            }
            dates
        });

        let (sender, mut feed) = LiveFeed::channel();
        let mut connection = LiveConnection::spawn(format!("ws://127.0.0.1:{}/ws/events/", port), sender);
        let first = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        let second = NaiveDate::from_ymd_opt(2025, 3, 8).unwrap();

        assert!(connection.subscribe(first));
        assert!(connection.subscribe(first));
        let received = wait_for(&mut feed);
        assert!(matches!(
            &received[..],
            [LiveMessage::InitialEventLoad { listing }] if listing.current_date.as_deref() == Some("2025-03-07")
        ));

        assert!(connection.subscribe(second));
        let received = wait_for(&mut feed);
        assert_eq!(received.len(), 1);

        assert_eq!(server.join().unwrap(), vec!["2025-03-07", "2025-03-08"]);
    }

    #[test]
    fn test_unreachable_server_closes_feed() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let (sender, mut feed) = LiveFeed::channel();
        let mut connection = LiveConnection::spawn(format!("ws://127.0.0.1:{}/ws/events/", port), sender);

        let deadline = Instant::now() + Duration::from_secs(5);
        while feed.is_connected() && Instant::now() < deadline {
            feed.drain();
            thread::sleep(Duration::from_millis(20));
        }
        assert!(!feed.is_connected());
        // Subscribing after the worker gave up reports the failure.
        let deadline = Instant::now() + Duration::from_secs(5);
        while connection.is_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
        }
        assert!(!connection.subscribe(NaiveDate::from_ymd_opt(2025, 3, 7).unwrap()));
    }
}

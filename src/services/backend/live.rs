use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use serde::{Deserialize, Serialize};

use super::{BackendError, DayEventsResponse};
use crate::models::event::EventRecord;

/// Frame pushed by the server on the live channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveMessage {
    /// Full listing for a date, sent after subscribing.
    InitialEventLoad {
        #[serde(flatten)]
        listing: DayEventsResponse,
    },
    /// One game created or changed by someone else.
    SendEventUpdate { event: EventRecord },
}

impl LiveMessage {
    pub fn from_json(text: &str) -> Result<Self, BackendError> {
        serde_json::from_str(text).map_err(|err| BackendError::Decode(err.to_string()))
    }
}

/// Frame the client sends to choose the date it wants pushed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveSubscribe {
    pub date: String,
}

impl LiveSubscribe {
    pub fn to_json(&self) -> String {
        serde_json::json!({ "date": self.date }).to_string()
    }
}

/// Producer half, handed to whatever transport receives the frames.
#[derive(Debug, Clone)]
pub struct LiveSender {
    sender: Sender<LiveMessage>,
}

impl LiveSender {
    pub fn push(&self, message: LiveMessage) -> bool {
        self.sender.send(message).is_ok()
    }

    /// Decode a text frame and queue it. Undecodable frames are logged and
    /// dropped.
    pub fn push_json(&self, text: &str) -> Result<(), BackendError> {
        match LiveMessage::from_json(text) {
            Ok(message) => {
                if !self.push(message) {
                    log::debug!("Live feed closed; dropping frame");
                }
                Ok(())
            }
            Err(err) => {
                log::warn!("Ignoring live frame: {}", err);
                Err(err)
            }
        }
    }
}

/// Consumer half, polled from the UI thread.
#[derive(Debug)]
pub struct LiveFeed {
    receiver: Receiver<LiveMessage>,
    connected: bool,
}

impl LiveFeed {
    pub fn channel() -> (LiveSender, LiveFeed) {
        let (sender, receiver) = mpsc::channel();
        (
            LiveSender { sender },
            LiveFeed {
                receiver,
                connected: true,
            },
        )
    }

    /// Everything queued since the last call.
    pub fn drain(&mut self) -> Vec<LiveMessage> {
        let mut messages = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(message) => messages.push(message),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.connected {
                        log::warn!("Live channel closed; falling back to polling");
                    }
                    self.connected = false;
                    break;
                }
            }
        }
        messages
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

//! The messaging substrate: a framed, delimiter-terminated TCP
//! request/reply protocol used by the scheduler to ship tasks, results, and
//! control traffic between the master-role driver and worker peers.

use shoal_common::error::{Result, ShoalError};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

/// Terminates every message on the wire. `\a` (BEL, 0x07) is vanishingly
/// unlikely to appear in a task-result codec's output, which is required
/// never to emit the task-result or list delimiters either.
pub const TERMINATOR: &str = "\u{7}END_OF_MESSAGE\u{7}";

/// Delimits file-block request payloads; unused by the core (file-backed
/// sources are out of scope) but kept as part of the documented wire
/// contract.
pub const FILE_BLOCK_REQUEST: &str = "\u{7}FILE_BLOCK_REQUEST\u{7}";

const TAG_DELIM: char = '\u{1}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    HostResourceInfo,
    FileInfo,
    ShellCommand,
    ATaskResult,
    TaskResultList,
    ResultReneed,
    ResultReneedTotal,
}

impl MessageType {
    fn tag(self) -> &'static str {
        match self {
            MessageType::HostResourceInfo => "HOST_RESOURCE_INFO",
            MessageType::FileInfo => "FILE_INFO",
            MessageType::ShellCommand => "SHELL_COMMAND",
            MessageType::ATaskResult => "A_TASK_RESULT",
            MessageType::TaskResultList => "TASK_RESULT_LIST",
            MessageType::ResultReneed => "RESULT_RENEED",
            MessageType::ResultReneedTotal => "RESULT_RENEED_TOTAL",
        }
    }

    fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "HOST_RESOURCE_INFO" => Ok(MessageType::HostResourceInfo),
            "FILE_INFO" => Ok(MessageType::FileInfo),
            "SHELL_COMMAND" => Ok(MessageType::ShellCommand),
            "A_TASK_RESULT" => Ok(MessageType::ATaskResult),
            "TASK_RESULT_LIST" => Ok(MessageType::TaskResultList),
            "RESULT_RENEED" => Ok(MessageType::ResultReneed),
            "RESULT_RENEED_TOTAL" => Ok(MessageType::ResultReneedTotal),
            other => Err(ShoalError::ParseError(format!("unknown message type tag {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub message_type: MessageType,
    pub payload: String,
}

impl Message {
    pub fn new(message_type: MessageType, payload: impl Into<String>) -> Self {
        Self {
            message_type,
            payload: payload.into(),
        }
    }

    fn encode(&self) -> String {
        format!("{}{}{}{}", self.message_type.tag(), TAG_DELIM, self.payload, TERMINATOR)
    }

    /// Parse as many complete frames as are present at the head of `buf`,
    /// returning them in arrival order plus the unconsumed remainder.
    /// Malformed frames (missing tag delimiter, unknown type) are reported
    /// as an error; the caller drops the connection.
    pub fn decode_many(buf: &str) -> Result<(Vec<Message>, String)> {
        let mut messages = Vec::new();
        let mut rest = buf;
        while let Some(idx) = rest.find(TERMINATOR) {
            let frame = &rest[..idx];
            rest = &rest[idx + TERMINATOR.len()..];
            let mut parts = frame.splitn(2, TAG_DELIM);
            let tag = parts
                .next()
                .ok_or_else(|| ShoalError::ParseError("empty message frame".to_string()))?;
            let payload = parts.next().unwrap_or("").to_string();
            messages.push(Message::new(MessageType::from_tag(tag)?, payload));
        }
        Ok((messages, rest.to_string()))
    }
}

/// `Listener::start`'s outcome: whether the bind succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenStatus {
    NotAttempted,
    Success,
    Failure,
}

/// Implemented by whoever owns a listening port; invoked once per inbound
/// message, fully reassembled and parsed. Returning `Some(reply)` writes
/// the reply back on the same connection before it is read again.
pub trait OnMessage: Send + Sync {
    fn on_message(&self, local_port: u16, from_host: &str, message: &Message) -> Option<String>;
}

pub struct Listener;

impl Listener {
    /// Bind `port` and spawn one handler thread per accepted connection,
    /// each running an accept loop on its own thread so `start` returns as
    /// soon as the bind outcome is known.
    pub fn start(port: u16, handler: Arc<dyn OnMessage>) -> ListenStatus {
        match TcpListener::bind(("0.0.0.0", port)) {
            Err(error) => {
                tracing::warn!(port, %error, "listener bind failed");
                ListenStatus::Failure
            }
            Ok(listener) => {
                thread::spawn(move || {
                    for stream in listener.incoming() {
                        match stream {
                            Ok(stream) => {
                                let handler = Arc::clone(&handler);
                                thread::spawn(move || handle_connection(port, stream, handler));
                            }
                            Err(error) => tracing::warn!(%error, "failed to accept connection"),
                        }
                    }
                });
                ListenStatus::Success
            }
        }
    }
}

fn handle_connection(local_port: u16, mut stream: TcpStream, handler: Arc<dyn OnMessage>) {
    let from_host = stream
        .peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_default();
    let mut buf = String::new();
    let mut chunk = [0u8; 4096];
    loop {
        match stream.read(&mut chunk) {
            Ok(0) => return,
            Ok(n) => buf.push_str(&String::from_utf8_lossy(&chunk[..n])),
            Err(error) => {
                tracing::warn!(%error, "connection read failed");
                return;
            }
        }
        match Message::decode_many(&buf) {
            Ok((messages, remainder)) => {
                buf = remainder;
                for message in &messages {
                    if let Some(reply) = handler.on_message(local_port, &from_host, message) {
                        if let Err(error) = stream.write_all(reply.as_bytes()) {
                            tracing::warn!(%error, "reply write failed");
                        }
                    }
                }
            }
            Err(error) => {
                tracing::warn!(%error, "malformed inbound message; dropping connection");
                return;
            }
        }
    }
}

/// Fire-and-forget send: a fresh thread opens a short-lived connection,
/// writes the framed message, and exits.
pub fn send_message(host: &str, port: u16, message: Message) {
    let host = host.to_string();
    thread::spawn(move || match TcpStream::connect((host.as_str(), port)) {
        Ok(mut stream) => {
            if let Err(error) = stream.write_all(message.encode().as_bytes()) {
                tracing::warn!(%host, port, %error, "send failed");
            }
        }
        Err(error) => tracing::warn!(%host, port, %error, "connect failed"),
    });
}

/// Synchronous request: blocks on the peer's reply over the same
/// connection.
pub fn send_message_for_reply(host: &str, port: u16, message: Message) -> Result<String> {
    let mut stream = TcpStream::connect((host, port))?;
    stream.write_all(message.encode().as_bytes())?;
    let mut reply = Vec::new();
    stream.read_to_end(&mut reply)?;
    Ok(String::from_utf8_lossy(&reply).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_empty_buffer_yields_nothing() {
        let (messages, rest) = Message::decode_many("").unwrap();
        assert!(messages.is_empty());
        assert!(rest.is_empty());
    }

    #[test]
    fn encode_then_decode_round_trips() {
        let message = Message::new(MessageType::ATaskResult, "1\u{1}2\u{1}[1,2,3]");
        let (messages, rest) = Message::decode_many(&message.encode()).unwrap();
        assert_eq!(messages, vec![message]);
        assert!(rest.is_empty());
    }

    #[test]
    fn decode_many_parses_concatenated_frames_and_keeps_partial_remainder() {
        let first = Message::new(MessageType::ATaskResult, "a");
        let second = Message::new(MessageType::TaskResultList, "b");
        let mut buf = first.encode();
        buf.push_str(&second.encode());
        buf.push_str("HOST_RESOURCE_INFO\u{1}incomplete");
        let (messages, rest) = Message::decode_many(&buf).unwrap();
        assert_eq!(messages, vec![first, second]);
        assert_eq!(rest, "HOST_RESOURCE_INFO\u{1}incomplete");
    }

    #[test]
    fn unknown_message_type_is_an_error() {
        let buf = format!("NOT_A_TYPE{TAG_DELIM}payload{TERMINATOR}");
        assert!(Message::decode_many(&buf).is_err());
    }
}

//! Module `state`
//!
//! Defines the mutable state of a session (the control channel and the
//! cached feature set) and the control channel's command/reply framing.

use log::{debug, warn};
use std::time::Duration;

use crate::error::FtpClientError;
use crate::protocol::{Command, FeatureSet, Reply, ReplyParser, StatusClass};
use crate::transport::FtpSocket;

/// The control connection together with its reply parser and the working
/// directory bookkeeping for that connection.
#[derive(Debug)]
pub struct ControlChannel {
    socket: FtpSocket,
    parser: ReplyParser,
    // Bytes after the last newline, kept until the line is complete so a
    // multi-byte character split across reads decodes intact.
    undecoded: Vec<u8>,
    home: Option<String>,
    away: bool,
}

impl ControlChannel {
    pub fn new(socket: FtpSocket) -> Self {
        Self {
            socket,
            parser: ReplyParser::new(),
            undecoded: Vec::new(),
            home: None,
            away: false,
        }
    }

    pub fn socket(&self) -> &FtpSocket {
        &self.socket
    }

    pub fn socket_mut(&mut self) -> &mut FtpSocket {
        &mut self.socket
    }

    /// Directory the server put us in at login, when it told us.
    pub fn home(&self) -> Option<&str> {
        self.home.as_deref()
    }

    pub fn set_home(&mut self, home: String) {
        self.home = Some(home);
    }

    /// True once a CWD may have moved the session away from `home`.
    pub fn is_away(&self) -> bool {
        self.away
    }

    pub fn set_away(&mut self, away: bool) {
        self.away = away;
    }

    /// True when text arrived that no command asked for.
    pub fn has_unsolicited(&self) -> bool {
        self.parser.has_pending() || !self.undecoded.is_empty()
    }

    /// Validates, encodes and writes one command line.
    pub async fn send_command(
        &mut self,
        command: &Command,
        timeout: Duration,
    ) -> Result<(), FtpClientError> {
        command.validate()?;
        debug!("{} > {}", self.socket.endpoint(), command.redacted());
        let line = self.socket.encoding().encode(&command.to_line());
        self.socket.send(&line, timeout).await?;
        if matches!(command, Command::Cwd(_)) {
            self.away = true;
        }
        Ok(())
    }

    /// Reads until one reply is complete. Every read is handed to the parser
    /// as it arrives, so a finished reply returns at once. Any failure before
    /// a status line was seen yields the failed sentinel.
    pub async fn read_reply(&mut self, timeout: Duration) -> Reply {
        let mut completed = self.parser.feed("");

        loop {
            if let Some(reply) = completed {
                debug!("{} < {}", self.socket.endpoint(), reply);
                return reply;
            }

            match self.socket.receive_chunk(timeout).await {
                Ok(bytes) => {
                    let text = self.decode_lines(&bytes);
                    completed = self.parser.feed(&text);
                }
                Err(e) => {
                    let rest = std::mem::take(&mut self.undecoded);
                    let rest = self.socket.encoding().decode(&rest);
                    let partial = match self.parser.feed(&rest) {
                        Some(reply) => reply,
                        None => self.parser.finish(),
                    };
                    if partial.code().is_some() {
                        debug!("{} < {}", self.socket.endpoint(), partial);
                        return partial;
                    }
                    warn!("No reply from {}: {}", self.socket.endpoint(), e);
                    return Reply::failed();
                }
            }
        }
    }

    /// Reads replies until one that is not preliminary (1xx) arrives.
    pub async fn read_final_reply(&mut self, timeout: Duration) -> Reply {
        loop {
            let reply = self.read_reply(timeout).await;
            if reply.class() != StatusClass::Preliminary {
                return reply;
            }
        }
    }

    /// Appends `bytes` and decodes everything up to the last newline.
    fn decode_lines(&mut self, bytes: &[u8]) -> String {
        self.undecoded.extend_from_slice(bytes);
        match self.undecoded.iter().rposition(|b| *b == b'\n') {
            Some(end) => {
                let complete: Vec<u8> = self.undecoded.drain(..=end).collect();
                self.socket.encoding().decode(&complete)
            }
            None => String::new(),
        }
    }

    /// Sends `command` and reads its reply.
    pub async fn exchange(
        &mut self,
        command: &Command,
        send_timeout: Duration,
        receive_timeout: Duration,
    ) -> Reply {
        if let Err(e) = self.send_command(command, send_timeout).await {
            warn!("Failed to send {}: {}", command.verb(), e);
            return Reply::failed();
        }
        self.read_reply(receive_timeout).await
    }
}

/// Everything a session mutates, guarded together by the session lock.
#[derive(Debug, Default)]
pub struct SessionState {
    control: Option<ControlChannel>,
    features: Option<FeatureSet>,
}

impl SessionState {
    // --- Accessors ---

    pub fn control(&self) -> Option<&ControlChannel> {
        self.control.as_ref()
    }

    pub fn control_mut(&mut self) -> Option<&mut ControlChannel> {
        self.control.as_mut()
    }

    /// Cached feature set, `None` until detected on this connection.
    pub fn features(&self) -> Option<FeatureSet> {
        self.features
    }

    // --- Setters ---

    /// Installs a freshly authenticated channel; the feature cache belongs
    /// to the previous connection and is cleared.
    pub fn set_control(&mut self, channel: ControlChannel) {
        self.control = Some(channel);
        self.features = None;
    }

    pub fn set_features(&mut self, features: FeatureSet) {
        self.features = Some(features);
    }

    /// Drops the control channel and everything cached for it.
    pub fn discard(&mut self) -> Option<ControlChannel> {
        self.features = None;
        self.control.take()
    }
}

//! Module `control`
//!
//! `ControlSession` serialises all use of the control connection behind one
//! tokio mutex. Operations take the lock once through `lock()` and run their
//! whole command sequence on the returned `SessionGuard`.

use log::{debug, info, warn};
use std::future::Future;
use std::net::IpAddr;
use tokio::sync::{Mutex, MutexGuard, broadcast};

use crate::config::ClientConfig;
use crate::error::{FtpClientError, TransportError, report};
use crate::protocol::{Command, FeatureSet, Reply, StatusClass, parse_command};
use crate::session::events::{self, ClientEvent, EVENT_CAPACITY};
use crate::session::state::{ControlChannel, SessionState};
use crate::transport::{FtpSocket, Liveness};

/// One logical FTP session: configuration, shared state and event channel.
pub struct ControlSession {
    config: ClientConfig,
    state: Mutex<SessionState>,
    events: broadcast::Sender<ClientEvent>,
}

impl ControlSession {
    pub fn new(config: ClientConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            config,
            state: Mutex::new(SessionState::default()),
            events,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Waits for exclusive use of the control channel.
    pub async fn lock(&self) -> SessionGuard<'_> {
        SessionGuard {
            state: self.state.lock().await,
            config: &self.config,
            events: &self.events,
        }
    }

    pub async fn ensure_connection(&self) -> bool {
        self.lock().await.ensure_connection().await
    }

    pub async fn detect_features(&self) -> FeatureSet {
        self.lock().await.detect_features().await
    }

    /// Sends free command text on the current connection and returns the reply.
    pub async fn execute(&self, command_text: &str) -> Reply {
        let command = parse_command(command_text);
        self.lock().await.execute(&command).await
    }
}

/// Exclusive access to a session for the duration of one operation.
pub struct SessionGuard<'a> {
    state: MutexGuard<'a, SessionState>,
    config: &'a ClientConfig,
    events: &'a broadcast::Sender<ClientEvent>,
}

impl SessionGuard<'_> {
    pub fn config(&self) -> &ClientConfig {
        self.config
    }

    pub fn is_connected(&self) -> bool {
        self.state
            .control()
            .is_some_and(|channel| channel.socket().is_connected())
    }

    /// Peer address of the control connection.
    pub fn control_peer_ip(&self) -> Option<IpAddr> {
        self.state.control().and_then(|c| c.socket().peer_ip())
    }

    /// Reuses a live control connection or opens and authenticates a new one.
    ///
    /// The live check costs no round trip. A connection holding text nobody
    /// asked for (a `421` before the server hangs up, say) counts as stale.
    /// Any failure up to and including login leaves the session without a
    /// connection, so the next call starts cold.
    pub async fn ensure_connection(&mut self) -> bool {
        if let Some(channel) = self.state.control_mut() {
            match channel.socket_mut().liveness().await {
                Liveness::Idle if !channel.has_unsolicited() => return true,
                Liveness::Closed => info!(
                    "Control connection to {} is gone, reconnecting",
                    self.config.control_endpoint()
                ),
                _ => warn!(
                    "Unsolicited data on control connection to {}, reconnecting",
                    self.config.control_endpoint()
                ),
            }
            self.state.discard();
        }

        match self.connect_and_login().await {
            Ok(channel) => {
                self.state.set_control(channel);
                true
            }
            Err(err) => {
                if let FtpClientError::Authentication(message) = &err {
                    events::publish(
                        self.events,
                        ClientEvent::AuthenticationFailed {
                            message: message.clone(),
                        },
                    );
                }
                report("Connect", &err);
                false
            }
        }
    }

    async fn connect_and_login(&self) -> Result<ControlChannel, FtpClientError> {
        let timeouts = self.config.timeouts();
        let socket = FtpSocket::new(self.config.host.as_str(), self.config.port, self.config.encoding);
        let mut channel = ControlChannel::new(socket);

        channel.socket_mut().connect(timeouts.connect).await?;
        let banner = FtpClientError::check(channel.read_reply(timeouts.receive).await)?;
        info!("Connected to {}: {}", self.config.control_endpoint(), banner);

        self.authenticate(&mut channel).await?;
        info!(
            "Logged in to {} as {}",
            self.config.control_endpoint(),
            self.config.username
        );

        let pwd = channel.exchange(&Command::Pwd, timeouts.send, timeouts.receive).await;
        match pwd.quoted_path().filter(|_| pwd.is_success()) {
            Some(home) => {
                debug!("Login directory is {}", home);
                channel.set_home(home);
            }
            None => warn!("PWD gave no directory ({}), assuming /", pwd),
        }
        Ok(channel)
    }

    /// USER, then PASS when the server asks for it with a 3xx reply.
    async fn authenticate(&self, channel: &mut ControlChannel) -> Result<(), FtpClientError> {
        let timeouts = self.config.timeouts();
        let user = Command::User(self.config.username.clone());
        let mut reply = channel.exchange(&user, timeouts.send, timeouts.receive).await;

        if reply.class() == StatusClass::Intermediate {
            let pass = Command::Pass(self.config.password.clone());
            reply = channel.exchange(&pass, timeouts.send, timeouts.receive).await;
        }

        if reply.is_success() {
            Ok(())
        } else {
            Err(FtpClientError::Authentication(format!(
                "login as {} to {} refused: {}",
                self.config.username,
                self.config.control_endpoint(),
                reply
            )))
        }
    }

    /// Feature set of the current connection, detected with FEAT at most
    /// once per connection. A failed FEAT is remembered as the empty set.
    pub async fn detect_features(&mut self) -> FeatureSet {
        if !self.ensure_connection().await {
            return FeatureSet::EMPTY;
        }
        if let Some(features) = self.state.features() {
            return features;
        }

        let reply = self.execute(&Command::Feat).await;
        let features = if reply.is_success() {
            FeatureSet::from_lines(reply.message_lines())
        } else {
            warn!("FEAT not available ({}), assuming no extensions", reply);
            FeatureSet::EMPTY
        };

        debug!("Server features: {}", features);
        self.state.set_features(features);
        features
    }

    /// Sends `command` and returns its reply.
    pub async fn execute(&mut self, command: &Command) -> Reply {
        self.execute_with(command, || async { true }).await
    }

    /// Sends `command`, runs `interim` (typically connecting the data
    /// channel), then reads the reply.
    ///
    /// A failed send returns the failed sentinel. A failed interim step also
    /// returns it, after the replies to the already sent command were drained
    /// up to the final one so the next command does not read them. If the
    /// final reply never comes, the connection is dropped.
    pub async fn execute_with<F, Fut>(&mut self, command: &Command, interim: F) -> Reply
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = bool>,
    {
        let timeouts = self.config.timeouts();
        let Some(channel) = self.state.control_mut() else {
            warn!("Cannot send {}: not connected", command.verb());
            return Reply::failed();
        };

        if let Err(err) = channel.send_command(command, timeouts.send).await {
            report(command.verb(), &err);
            return Reply::failed();
        }

        if !interim().await {
            warn!("Interim step for {} failed", command.verb());
            let drained = channel.read_final_reply(timeouts.receive).await;
            if drained.is_transport_failure() {
                warn!(
                    "Lost track of replies after {}, dropping the connection",
                    command.verb()
                );
                self.state.discard();
            } else {
                debug!("Discarded reply to {}: {}", command.verb(), drained);
            }
            return Reply::failed();
        }

        channel.read_reply(timeouts.receive).await
    }

    /// Reads the next final reply without sending anything, e.g. the
    /// completion reply that follows a data transfer.
    pub async fn read_reply(&mut self) -> Reply {
        let timeout = self.config.timeouts().receive;
        match self.state.control_mut() {
            Some(channel) => channel.read_final_reply(timeout).await,
            None => Reply::failed(),
        }
    }

    /// Changes back to the login directory if an earlier CWD left it.
    pub async fn return_home(&mut self) -> Result<(), FtpClientError> {
        let home = match self.state.control() {
            Some(channel) if channel.is_away() => channel.home().unwrap_or("/").to_string(),
            Some(_) => return Ok(()),
            None => return Err(TransportError::NotConnected.into()),
        };

        FtpClientError::check(self.execute(&Command::Cwd(home)).await)?;
        if let Some(channel) = self.state.control_mut() {
            channel.set_away(false);
        }
        Ok(())
    }

    /// Sends QUIT when the connection is still up, then closes it.
    pub async fn disconnect(&mut self) {
        let timeouts = self.config.timeouts();
        let Some(mut channel) = self.state.discard() else {
            return;
        };

        if channel.socket_mut().is_alive().await {
            let reply = channel
                .exchange(&Command::Quit, timeouts.send, timeouts.receive)
                .await;
            debug!("QUIT answered with {}", reply);
        }
        channel.socket_mut().shutdown(timeouts.send).await;
        info!("Disconnected from {}", self.config.control_endpoint());
    }
}

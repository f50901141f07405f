//! Module `operations`
//!
//! `FtpClient` is the public face of the crate. Each operation takes the
//! session lock for its full duration, runs a short fixed sequence of
//! control and data exchanges, and reports failure as `false` or an empty
//! listing after logging the cause.

use log::{debug, info, warn};
use std::time::Duration;
use tokio::io::AsyncRead;
use tokio::sync::broadcast;

use crate::client::{ListKind, RemotePath};
use crate::config::ClientConfig;
use crate::error::{FtpClientError, TransportError, report};
use crate::protocol::{Command, Feature, FeatureSet, Reply, StatusClass};
use crate::session::{ClientEvent, ControlSession, SessionGuard};
use crate::transfer::open_data_connection;
use crate::transport::FtpSocket;

/// Passive-mode FTP client. Safe to share between tasks; operations on one
/// client run one at a time.
pub struct FtpClient {
    session: ControlSession,
}

impl FtpClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            session: ControlSession::new(config),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        self.session.config()
    }

    /// Receives authentication failure notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.session.subscribe()
    }

    /// Connects and logs in unless a live connection exists.
    pub async fn connect(&self) -> bool {
        self.session.ensure_connection().await
    }

    pub async fn is_connected(&self) -> bool {
        self.session.lock().await.is_connected()
    }

    /// Extensions advertised by the server, detected once per connection.
    pub async fn features(&self) -> FeatureSet {
        self.session.detect_features().await
    }

    /// Sends arbitrary command text on the current connection.
    pub async fn execute(&self, command_text: &str) -> Reply {
        self.session.execute(command_text).await
    }

    /// Raw listing lines for `path`, using the best listing command the
    /// server supports. Empty on any failure.
    pub async fn list(&self, path: &str) -> Vec<String> {
        match self.try_list(path).await {
            Ok(lines) => lines,
            Err(err) => {
                report("Listing", &err);
                Vec::new()
            }
        }
    }

    /// Like `list`, but tells an empty directory apart from a failure.
    pub async fn try_list(&self, path: &str) -> Result<Vec<String>, FtpClientError> {
        let mut session = self.session.lock().await;
        if !session.ensure_connection().await {
            return Err(TransportError::NotConnected.into());
        }
        let kind = ListKind::for_features(session.detect_features().await);
        let lines = Self::fetch_listing(&mut session, path, kind).await?;
        debug!("{:?} {} returned {} lines", kind, path, lines.len());
        Ok(lines)
    }

    /// Raw listing lines for `path` produced by a specific command.
    pub async fn raw_listing(&self, path: &str, kind: ListKind) -> Vec<String> {
        let mut session = self.session.lock().await;
        if !session.ensure_connection().await {
            return Vec::new();
        }
        Self::listing_or_empty(&mut session, path, kind).await
    }

    /// Creates one remote directory.
    pub async fn make_directory(&self, path: &str) -> bool {
        let mut session = self.session.lock().await;
        if !session.ensure_connection().await {
            return false;
        }

        match FtpClientError::check(session.execute(&Command::Mkd(path.to_string())).await) {
            Ok(reply) => {
                info!("Created remote directory {}: {}", path, reply);
                true
            }
            Err(err) => {
                report("MKD", &err);
                false
            }
        }
    }

    /// Uploads everything `source` yields to `remote_file`, entering (and
    /// when configured, creating) each directory on the way.
    pub async fn upload<R>(&self, source: &mut R, remote_file: &str) -> bool
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let Some(path) = RemotePath::parse(remote_file) else {
            warn!("Refusing to upload to {:?}: not a file path", remote_file);
            return false;
        };

        let mut session = self.session.lock().await;
        if !session.ensure_connection().await {
            return false;
        }

        match Self::store(&mut session, source, &path).await {
            Ok(sent) => {
                info!("Uploaded {} bytes to {}", sent, remote_file);
                true
            }
            Err(err) => {
                report("Upload", &err);
                false
            }
        }
    }

    /// Logs out and closes the control connection.
    pub async fn disconnect(&self) {
        self.session.lock().await.disconnect().await;
    }

    async fn listing_or_empty(
        session: &mut SessionGuard<'_>,
        path: &str,
        kind: ListKind,
    ) -> Vec<String> {
        match Self::fetch_listing(session, path, kind).await {
            Ok(lines) => {
                debug!("{:?} {} returned {} lines", kind, path, lines.len());
                lines
            }
            Err(err) => {
                report("Listing", &err);
                Vec::new()
            }
        }
    }

    async fn fetch_listing(
        session: &mut SessionGuard<'_>,
        path: &str,
        kind: ListKind,
    ) -> Result<Vec<String>, FtpClientError> {
        let command = kind.command(path);

        if !kind.uses_data_channel() {
            // Fact lines are the ones indented by a space.
            let reply = FtpClientError::check(session.execute(&command).await)?;
            return Ok(reply
                .message_lines()
                .iter()
                .filter(|line| line.starts_with(' '))
                .map(|line| line.trim().to_string())
                .filter(|line| !line.is_empty())
                .collect());
        }

        let mut data = open_data_connection(session).await?;
        let timeouts = session.config().timeouts();

        if session.detect_features().await.contains(Feature::Pret) {
            let pret = Command::Pret(Box::new(command.clone()));
            FtpClientError::check(session.execute(&pret).await)?;
        }

        let opened = {
            let data = &mut data;
            session
                .execute_with(&command, move || connect_data(data, timeouts.connect))
                .await
        };
        let opened = FtpClientError::check(opened)?;

        let payload = data.read_to_end(timeouts.receive).await;
        data.shutdown(timeouts.send).await;
        let completion = Self::completion(session, opened).await;

        let payload = payload?;
        FtpClientError::check(completion)?;

        let text = session.config().encoding.decode(&payload);
        Ok(text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty())
            .map(String::from)
            .collect())
    }

    async fn store<R>(
        session: &mut SessionGuard<'_>,
        source: &mut R,
        path: &RemotePath,
    ) -> Result<u64, FtpClientError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        Self::enter_directories(session, path.directories()).await?;

        let mut data = open_data_connection(session).await?;
        let timeouts = session.config().timeouts();
        let command = Command::Stor(path.file_name().to_string());

        let opened = {
            let data = &mut data;
            session
                .execute_with(&command, move || connect_data(data, timeouts.connect))
                .await
        };
        let opened = FtpClientError::check(opened)?;

        let sent = data.send_from(source, timeouts.send).await;
        data.shutdown(timeouts.send).await;
        let completion = Self::completion(session, opened).await;

        let sent = sent?;
        FtpClientError::check(completion)?;
        Ok(sent)
    }

    /// Walks the directory chain with CWD. A 5xx answer creates the missing
    /// directory (when enabled) and enters it; anything else aborts.
    ///
    /// Relative chains start from the login directory, wherever earlier
    /// operations left the session.
    async fn enter_directories(
        session: &mut SessionGuard<'_>,
        directories: &[String],
    ) -> Result<(), FtpClientError> {
        let auto_create = session.config().auto_create_directories;
        if directories.first().map(String::as_str) != Some("/") {
            session.return_home().await?;
        }

        for directory in directories {
            let cwd = Command::Cwd(directory.clone());
            let reply = session.execute(&cwd).await;
            if reply.is_success() {
                continue;
            }

            if reply.class() != StatusClass::PermanentNegative || !auto_create {
                return Err(FtpClientError::from_reply(reply));
            }

            info!("Remote directory {} is missing, creating it", directory);
            FtpClientError::check(session.execute(&Command::Mkd(directory.clone())).await)?;
            FtpClientError::check(session.execute(&cwd).await)?;
        }

        Ok(())
    }

    /// The reply closing a transfer. When the data command was already
    /// answered with a completion, that answer is the closing reply.
    async fn completion(session: &mut SessionGuard<'_>, opened: Reply) -> Reply {
        if opened.class() == StatusClass::Completion {
            opened
        } else {
            session.read_reply().await
        }
    }
}

/// Interim step of a data command: connect the prepared data socket.
async fn connect_data(data: &mut FtpSocket, timeout: Duration) -> bool {
    match data.connect(timeout).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Data connection to {} failed: {}", data.endpoint(), e);
            false
        }
    }
}

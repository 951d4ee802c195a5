//! SSH session setup and the SFTP-backed [`RemoteSource`].

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use russh::client;
use russh::keys::PublicKey;
use russh::Disconnect;
use russh_sftp::client::fs::File as SftpFile;
use russh_sftp::client::SftpSession;
use tokio::io::{AsyncRead, AsyncSeek, AsyncWriteExt, ReadBuf};

use crate::config::DownloadConfig;
use crate::error::{Error, Result};
use crate::transfer::RemoteSource;

/// Client-side SSH event handler.
///
/// Host keys are accepted without verification; pinning them is outside the
/// scope of this tool.
struct ClientHandler;

impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        tracing::debug!(
            algorithm = %server_public_key.algorithm(),
            "Accepting server host key"
        );
        Ok(true)
    }
}

/// Establishes the SSH session and opens the remote file.
pub struct SftpConnector<'a> {
    config: &'a DownloadConfig,
}

impl<'a> SftpConnector<'a> {
    /// Create a connector for the given download.
    #[must_use]
    pub const fn new(config: &'a DownloadConfig) -> Self {
        Self { config }
    }

    /// Connect, authenticate with the password, start the `sftp` subsystem
    /// and open the remote file for reading.
    ///
    /// Session setup and opening the file are both bounded by the configured
    /// connection timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`], [`Error::Connection`] or
    /// [`Error::AuthenticationFailed`] when the session cannot be set up, and
    /// [`Error::Stat`] when the remote file cannot be opened.
    pub async fn connect(&self) -> Result<SftpRemote> {
        tracing::info!(
            host = %self.config.address(),
            user = %self.config.user,
            "Connecting"
        );

        within(self.config.connect_timeout, self.open_remote()).await
    }

    async fn open_remote(&self) -> Result<SftpRemote> {
        let (session, sftp) = self.open_session().await?;

        tracing::debug!(path = %self.config.remote_path, "Opening remote file");

        let file = sftp
            .open(self.config.remote_path.as_str())
            .await
            .map_err(|e| Error::Stat {
                side: "remote",
                path: self.config.remote_path.clone(),
                source: io::Error::other(e.to_string()),
            })?;

        Ok(SftpRemote {
            file,
            sftp,
            session,
        })
    }

    async fn open_session(&self) -> Result<(client::Handle<ClientHandler>, SftpSession)> {
        let ssh_config = Arc::new(client::Config::default());
        let address = self.config.address();
        let connection_error = |e: &dyn std::fmt::Display| Error::Connection {
            host: address.clone(),
            reason: e.to_string(),
        };

        let mut session = client::connect(
            ssh_config,
            (self.config.host.as_str(), self.config.port),
            ClientHandler,
        )
        .await
        .map_err(|e| connection_error(&e))?;

        let auth = session
            .authenticate_password(self.config.user.as_str(), self.config.password())
            .await
            .map_err(|e| connection_error(&e))?;

        if !auth.success() {
            return Err(Error::AuthenticationFailed(self.config.user.clone()));
        }

        let channel = session
            .channel_open_session()
            .await
            .map_err(|e| connection_error(&e))?;

        channel
            .request_subsystem(true, "sftp")
            .await
            .map_err(|e| connection_error(&e))?;

        let sftp = SftpSession::new(channel.into_stream())
            .await
            .map_err(|e| connection_error(&e))?;

        tracing::debug!(host = %address, "SFTP subsystem ready");

        Ok((session, sftp))
    }
}

/// An open remote file together with the session that keeps it alive.
pub struct SftpRemote {
    file: SftpFile,
    sftp: SftpSession,
    session: client::Handle<ClientHandler>,
}

impl AsyncRead for SftpRemote {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.file).poll_read(cx, buf)
    }
}

impl AsyncSeek for SftpRemote {
    fn start_seek(mut self: Pin<&mut Self>, position: io::SeekFrom) -> io::Result<()> {
        Pin::new(&mut self.file).start_seek(position)
    }

    fn poll_complete(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        Pin::new(&mut self.file).poll_complete(cx)
    }
}

impl RemoteSource for SftpRemote {
    async fn stat_size(&mut self) -> io::Result<u64> {
        let metadata = self
            .file
            .metadata()
            .await
            .map_err(|e| io::Error::other(e.to_string()))?;

        metadata
            .size
            .ok_or_else(|| io::Error::other("server did not report a file size"))
    }

    async fn close(&mut self) -> io::Result<()> {
        let shutdown = self.file.shutdown().await;
        if let Err(e) = &shutdown {
            tracing::debug!(error = %e, "Remote file close failed");
        }

        if let Err(e) = self.sftp.close().await {
            tracing::debug!(error = %e, "SFTP session close failed");
        }
        if let Err(e) = self
            .session
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
        {
            tracing::debug!(error = %e, "SSH disconnect failed");
        }

        shutdown
    }
}

/// Run a connection stage, failing with [`Error::Timeout`] once `limit`
/// has elapsed.
async fn within<T>(limit: Duration, stage: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(limit, stage)
        .await
        .map_err(|_| Error::Timeout(limit))?
}

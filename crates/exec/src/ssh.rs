// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SSH sessions over russh: one authenticated connection, one exec channel
//! per command.

use crate::session::{
    CommandEvent, CommandSession, ConnectOptions, RunningCommand, SessionError, SessionFactory,
};
use async_trait::async_trait;
use russh::client::{self, Handle, Msg};
use russh::{Channel, ChannelMsg, Disconnect};
use russh_keys::agent::client::AgentClient;
use russh_keys::key;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

struct ClientHandler;

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = russh::Error;

    // The target host identity is fixed by deployment config; pinning its key
    // belongs to that config layer, not to every session.
    async fn check_server_key(
        &mut self,
        _server_public_key: &key::PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// Session over one authenticated SSH connection. Each command runs in its
/// own exec channel on the multiplexed handle; stdout and stderr arrive
/// demultiplexed from the channel's data frames.
pub struct SshSession {
    handle: Handle<ClientHandler>,
    forward_agent: bool,
}

#[async_trait]
impl CommandSession for SshSession {
    async fn spawn(&mut self, command: &str) -> Result<RunningCommand, SessionError> {
        if !self.is_open() {
            return Err(SessionError::Closed);
        }

        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| SessionError::Spawn(format!("channel open: {e}")))?;

        if self.forward_agent {
            // Best-effort: refusal only matters if a command needs the agent.
            if let Err(e) = channel.agent_forward(true).await {
                tracing::debug!(error = %e, "agent forwarding refused");
            }
        }

        channel
            .exec(true, command)
            .await
            .map_err(|e| SessionError::Spawn(format!("exec request: {e}")))?;

        let (event_tx, event_rx) = mpsc::channel(64);
        let (stdin_tx, stdin_rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();

        tokio::spawn(pump_channel(channel, event_tx, stdin_rx, cancel.clone()));

        Ok(RunningCommand::new(event_rx, stdin_tx, cancel))
    }

    fn is_open(&self) -> bool {
        !self.handle.is_closed()
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.handle
            .disconnect(Disconnect::ByApplication, "deploy finished", "en")
            .await
            .map_err(|e| SessionError::Connect(e.to_string()))
    }
}

/// Demultiplex channel frames into command events. `ExitStatus` is held back
/// until the channel drains so `Exited` stays the final event.
async fn pump_channel(
    mut channel: Channel<Msg>,
    event_tx: mpsc::Sender<CommandEvent>,
    mut stdin_rx: mpsc::Receiver<String>,
    cancel: CancellationToken,
) {
    let mut exit_code = None;
    loop {
        tokio::select! {
            msg = channel.wait() => match msg {
                Some(ChannelMsg::Data { ref data }) => {
                    let chunk = String::from_utf8_lossy(data).into_owned();
                    if event_tx.send(CommandEvent::Stdout(chunk)).await.is_err() {
                        return;
                    }
                }
                Some(ChannelMsg::ExtendedData { ref data, ext: 1 }) => {
                    let chunk = String::from_utf8_lossy(data).into_owned();
                    if event_tx.send(CommandEvent::Stderr(chunk)).await.is_err() {
                        return;
                    }
                }
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    exit_code = Some(exit_status as i32);
                }
                Some(_) => {}
                None => break,
            },
            Some(data) = stdin_rx.recv() => {
                if let Err(e) = channel.data(data.as_bytes()).await {
                    tracing::debug!(error = %e, "channel stdin write failed");
                }
            }
            _ = cancel.cancelled() => {
                let _ = channel.close().await;
                return;
            }
        }
    }

    let event = match exit_code {
        Some(code) => CommandEvent::Exited(code),
        None => CommandEvent::Closed,
    };
    let _ = event_tx.send(event).await;
}

/// Factory opening authenticated SSH sessions.
///
/// Authentication cascade: configured key material decrypted with the
/// passphrase, then keys held by the agent at the explicit socket path, then
/// the passphrase as the login password. The first accepted method wins.
#[derive(Clone, Copy, Default)]
pub struct SshFactory;

impl SshFactory {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SessionFactory for SshFactory {
    type Session = SshSession;

    async fn connect(&self, options: &ConnectOptions) -> Result<SshSession, SessionError> {
        let config = Arc::new(client::Config::default());
        let mut handle = client::connect(
            config,
            (options.host.as_str(), options.port),
            ClientHandler,
        )
        .await
        .map_err(|e| SessionError::Connect(e.to_string()))?;

        authenticate(&mut handle, options).await?;

        tracing::info!(
            host = %options.host,
            port = options.port,
            user = %options.user,
            "ssh session established"
        );
        Ok(SshSession {
            handle,
            forward_agent: options.forward_agent,
        })
    }
}

async fn authenticate(
    handle: &mut Handle<ClientHandler>,
    options: &ConnectOptions,
) -> Result<(), SessionError> {
    let credential = &options.credential;

    if let Some(pem) = &credential.key_data {
        let passphrase = credential.passphrase.expose();
        let key = russh_keys::decode_secret_key(pem, (!passphrase.is_empty()).then_some(passphrase))
            .map_err(|e| SessionError::Connect(format!("bad key material: {e}")))?;
        let accepted = handle
            .authenticate_publickey(&options.user, Arc::new(key))
            .await
            .map_err(|e| SessionError::Connect(e.to_string()))?;
        if accepted {
            return Ok(());
        }
        tracing::debug!(user = %options.user, "configured key rejected, trying next method");
    }

    if let Some(socket) = &credential.agent_socket {
        if authenticate_with_agent(handle, &options.user, socket).await? {
            return Ok(());
        }
        tracing::debug!(user = %options.user, "agent keys rejected, trying next method");
    }

    let accepted = handle
        .authenticate_password(&options.user, credential.passphrase.expose())
        .await
        .map_err(|e| SessionError::Connect(e.to_string()))?;
    if accepted {
        return Ok(());
    }

    Err(SessionError::Auth {
        user: options.user.clone(),
        host: options.host.clone(),
    })
}

/// Offer each identity the agent holds until one is accepted.
async fn authenticate_with_agent(
    handle: &mut Handle<ClientHandler>,
    user: &str,
    socket: &Path,
) -> Result<bool, SessionError> {
    let mut agent = AgentClient::connect_uds(socket)
        .await
        .map_err(|e| SessionError::Connect(format!("agent unreachable: {e}")))?;
    let identities = agent
        .request_identities()
        .await
        .map_err(|e| SessionError::Connect(format!("agent identities: {e}")))?;

    for identity in identities {
        let (returned, result) = handle.authenticate_future(user, identity, agent).await;
        agent = returned;
        match result {
            Ok(true) => return Ok(true),
            Ok(false) => {}
            Err(e) => return Err(SessionError::Connect(format!("agent auth: {e}"))),
        }
    }
    Ok(false)
}

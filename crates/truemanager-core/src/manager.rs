// ── Manager ──
//
// Composition root for one server: builds the session, REST client and
// DDP client from a `ConnectionConfig`, and drives login/logout.

use std::sync::Arc;

use futures_util::{Stream, StreamExt, future};
use secrecy::ExposeSecret;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

use truemanager_api::{
    Authorization, ConnectionState, DdpClient, RestClient, Session, types::AuthMe,
};

use crate::config::{AuthCredentials, ConnectionConfig};
use crate::error::CoreError;
use crate::realtime::{REALTIME_COLLECTION, RealtimeStats};

/// Cheaply cloneable handle owning every client for one server.
#[derive(Clone)]
pub struct Manager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    config: ConnectionConfig,
    session: Session,
    rest: RestClient,
    ddp: DdpClient,
}

impl Manager {
    /// Build the clients. Does not touch the network.
    pub fn new(config: ConnectionConfig) -> Result<Self, CoreError> {
        let session = Session::new();
        session.set_server_address(Some(config.url.as_str()))?;

        let rest = RestClient::new(session.clone(), &config.transport())?;
        let ddp = DdpClient::new(config.ddp());

        Ok(Self {
            inner: Arc::new(ManagerInner {
                config,
                session,
                rest,
                ddp,
            }),
        })
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.inner.config
    }

    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    pub fn rest(&self) -> &RestClient {
        &self.inner.rest
    }

    pub fn ddp(&self) -> &DdpClient {
        &self.inner.ddp
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Verify the configured credentials and install them in the session.
    ///
    /// Passwords go through `auth/check_password`; keys and tokens are
    /// proven by fetching `auth/me`. On failure the session is left
    /// without credentials.
    pub async fn login(&self) -> Result<Option<AuthMe>, CoreError> {
        let authorization = self.inner.config.auth.to_authorization();
        self.inner.session.set_authorization(Some(authorization));

        let outcome = match &self.inner.config.auth {
            AuthCredentials::Password { username, password } => {
                match self
                    .inner
                    .rest
                    .check_password(username, password.expose_secret())
                    .await
                {
                    Ok(true) => Ok(None),
                    Ok(false) => Err(CoreError::AuthenticationFailed {
                        message: format!("wrong password for '{username}'"),
                    }),
                    Err(e) => Err(e.into()),
                }
            }
            AuthCredentials::ApiKey(_) | AuthCredentials::Token(_) => {
                self.inner.rest.me().await.map(Some).map_err(CoreError::from)
            }
        };

        match outcome {
            Ok(me) => {
                info!(
                    server = %self.inner.config.url,
                    user = me.as_ref().map_or("-", |m| m.pw_name.as_str()),
                    "logged in"
                );
                Ok(me)
            }
            Err(e) => {
                warn!(error = %e, "login failed");
                self.inner.session.clear_authorization();
                Err(e)
            }
        }
    }

    /// Open the websocket and authenticate it with the session credentials.
    pub async fn connect_realtime(&self) -> Result<(), CoreError> {
        let authorization = self
            .inner
            .session
            .authorization()
            .ok_or_else(|| CoreError::Config {
                message: "log in before opening the realtime connection".into(),
            })?;

        self.inner.ddp.connect_session(&self.inner.session).await?;

        match self.inner.ddp.login(&authorization).await {
            Ok(true) => {
                debug!(kind = authorization.kind(), "websocket authenticated");
                Ok(())
            }
            Ok(false) => {
                self.inner.ddp.disconnect();
                Err(CoreError::AuthenticationFailed {
                    message: "websocket login rejected".into(),
                })
            }
            Err(e) => {
                self.inner.ddp.disconnect();
                Err(e.into())
            }
        }
    }

    /// Close the websocket (if open) and forget credentials.
    pub fn logout(&self) {
        if self.inner.ddp.state() != ConnectionState::Disconnected {
            self.inner.ddp.disconnect();
        }
        self.inner.session.clear_authorization();
        info!("logged out");
    }

    pub fn is_logged_in(&self) -> bool {
        self.inner.session.authorization().is_some()
    }

    // ── Observation ──────────────────────────────────────────────────

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.ddp.state_changes()
    }

    /// Connection state as a stream, starting with the current value.
    pub fn connection_states(&self) -> WatchStream<ConnectionState> {
        WatchStream::new(self.connection_state())
    }

    /// Live system statistics. Requires [`connect_realtime`](Self::connect_realtime).
    pub fn realtime_stats(&self) -> Result<impl Stream<Item = RealtimeStats> + use<>, CoreError> {
        let subscription = self.inner.ddp.subscribe(REALTIME_COLLECTION)?;
        Ok(subscription
            .into_stream()
            .filter_map(|event| future::ready(RealtimeStats::from_event(&event))))
    }

    /// Forward an arbitrary credential to the session, e.g. a token
    /// minted with `auth/generate_token`.
    pub fn set_authorization(&self, authorization: Authorization) {
        self.inner.session.set_authorization(Some(authorization));
    }
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("url", &self.inner.config.url.as_str())
            .field("ddp", &self.inner.ddp)
            .finish_non_exhaustive()
    }
}

//! Authorize → token exchange → authenticate.
//!
//! [`AuthFlow`] is the bare state machine; [`Authenticator`] drives it over a
//! [`CommandSender`] and the HTTPS exchange, retrying AUTHENTICATE on a fixed
//! delay and falling back to a fresh authorization once the token has failed
//! too often.

pub mod exchange;
pub mod token_store;

pub use exchange::TokenExchangeClient;
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};

use crate::config::ConnectorConfig;
use crate::error::auth::AuthError;
use crate::rpc::{CommandSender, RpcRequest};

use common::{ErrorLocation, RedactedAccessToken};

use models::AuthorizeData;

use std::panic::Location;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use backoff::backoff::{Backoff, Constant};
use log::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    NoToken,
    Authorizing,
    ExchangingToken,
    HasToken,
    Authenticating,
    Ready,
}

/// What the flow wants to do next.
#[derive(Debug, Clone)]
pub enum AuthStep {
    Authorize,
    Authenticate(RedactedAccessToken),
}

/// Authentication state machine.
///
/// Every failed AUTHENTICATE counts against `max_failures`, wrong-user
/// replies included; reaching it discards the token and the next step is a
/// fresh AUTHORIZE.
#[derive(Debug)]
pub struct AuthFlow {
    state: AuthState,
    token: Option<RedactedAccessToken>,
    failures: u32,
    max_failures: u32,
}

impl AuthFlow {
    pub fn new(token: Option<RedactedAccessToken>, max_failures: u32) -> Self {
        let state = if token.is_some() {
            AuthState::HasToken
        } else {
            AuthState::NoToken
        };
        Self {
            state,
            token,
            failures: 0,
            max_failures: max_failures.max(1),
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn next_step(&mut self) -> AuthStep {
        match self.token {
            Some(ref token) => {
                self.state = AuthState::Authenticating;
                AuthStep::Authenticate(token.clone())
            }
            None => {
                self.state = AuthState::Authorizing;
                AuthStep::Authorize
            }
        }
    }

    pub fn code_received(&mut self) {
        self.state = AuthState::ExchangingToken;
    }

    pub fn token_received(&mut self, token: RedactedAccessToken) {
        self.token = Some(token);
        self.state = AuthState::HasToken;
    }

    pub fn authorization_failed(&mut self) {
        self.state = AuthState::NoToken;
    }

    pub fn authenticated(&mut self) {
        self.failures = 0;
        self.state = AuthState::Ready;
    }

    /// Record a failed AUTHENTICATE. Returns `true` when the token was discarded.
    pub fn authenticate_failed(&mut self) -> bool {
        self.failures += 1;
        if self.failures >= self.max_failures {
            self.token = None;
            self.failures = 0;
            self.state = AuthState::NoToken;
            return true;
        }
        self.state = AuthState::HasToken;
        false
    }
}

/// Runs the auth flow for each session. Cloning shares the flow, so the
/// failure counter and cached token survive reconnects.
#[derive(Clone)]
pub struct Authenticator {
    client_id: String,
    exchange: TokenExchangeClient,
    store: Arc<dyn TokenStore>,
    flow: Arc<Mutex<AuthFlow>>,
    retry_delay: Duration,
}

impl Authenticator {
    pub fn new(config: &ConnectorConfig, store: Arc<dyn TokenStore>) -> Result<Self, AuthError> {
        let exchange = TokenExchangeClient::new(&config.token_exchange_url)?;
        let flow = AuthFlow::new(store.get_token(), config.max_auth_failures);
        Ok(Self {
            client_id: config.client_id.clone(),
            exchange,
            store,
            flow: Arc::new(Mutex::new(flow)),
            retry_delay: config.auth_retry_delay,
        })
    }

    pub fn state(&self) -> AuthState {
        self.flow().state()
    }

    /// Authenticate the session behind `sender`.
    ///
    /// Returns once AUTHENTICATE succeeds. Authorization or exchange
    /// failures end the attempt for this session; authenticate failures are
    /// retried indefinitely.
    pub async fn run<S: CommandSender>(&self, sender: &S) -> Result<(), AuthError> {
        let mut retry = Constant::new(self.retry_delay);

        loop {
            let step = self.flow().next_step();
            match step {
                AuthStep::Authorize => {
                    let token = match self.authorize(sender).await {
                        Ok(token) => token,
                        Err(e) => {
                            self.flow().authorization_failed();
                            return Err(e);
                        }
                    };
                    if let Err(e) = self.store.set_token(&token) {
                        warn!("Access token obtained but not persisted: {e}");
                    }
                    self.flow().token_received(token);
                }
                AuthStep::Authenticate(token) => {
                    match sender.send(RpcRequest::authenticate(&token)).await {
                        Ok(_) => {
                            self.flow().authenticated();
                            info!("Authenticated with the voice application");
                            return Ok(());
                        }
                        Err(e) if e.is_not_connected() => {
                            return Err(AuthError::Authenticate {
                                message: e.to_string(),
                                location: ErrorLocation::from(Location::caller()),
                            });
                        }
                        Err(e) => {
                            let error = AuthError::from_authenticate(e);
                            let discarded = self.flow().authenticate_failed();
                            if error.is_retryable() {
                                debug!("AUTHENTICATE rejected, retrying: {error}");
                            } else {
                                warn!("AUTHENTICATE failed: {error}");
                            }
                            if discarded {
                                warn!("Too many AUTHENTICATE failures, discarding access token");
                            }
                            let delay = retry.next_backoff().unwrap_or(self.retry_delay);
                            tokio::time::sleep(delay).await;
                        }
                    }
                }
            }
        }
    }

    async fn authorize<S: CommandSender>(&self, sender: &S) -> Result<RedactedAccessToken, AuthError> {
        let response = sender
            .send(RpcRequest::authorize(&self.client_id))
            .await
            .map_err(|e| AuthError::Authorize {
                message: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let data: AuthorizeData = response.data_as().map_err(|e| AuthError::Authorize {
            message: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        self.flow().code_received();
        debug!("Authorization code received, exchanging at {}", self.exchange.url());
        self.exchange.exchange(&data.code).await
    }

    fn flow(&self) -> MutexGuard<'_, AuthFlow> {
        self.flow.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub mod auth;
pub mod config;
pub mod connection;
pub mod rpc;
pub mod token_store;

pub use auth::AuthError;
pub use config::ConfigError;
pub use connection::ConnectionError;
pub use rpc::RpcError;
pub use token_store::TokenStoreError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Rpc(#[from] rpc::RpcError),

    #[error(transparent)]
    Auth(#[from] auth::AuthError),

    #[error(transparent)]
    Connection(#[from] connection::ConnectionError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    TokenStore(#[from] token_store::TokenStoreError),

    #[error(transparent)]
    Model(#[from] models::ModelError),
}

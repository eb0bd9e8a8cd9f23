pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod integrations;
pub mod models;
pub mod rpc;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result};
pub use services::{BalanceRequest, PrepareStateMachine, TokenWallet};

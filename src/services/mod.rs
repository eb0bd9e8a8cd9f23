// Service modules
pub mod prepare_state;
pub mod state_cache;
pub mod token_codec;
pub mod token_wallet;

// Re-export for convenience
pub use prepare_state::{PrepareAction, PrepareOutcome, PrepareStateMachine, PrepareView};
pub use state_cache::{ContractStateCache, StateCache};
pub use token_wallet::{BalanceRequest, TokenWallet};

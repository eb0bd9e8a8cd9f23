// src/models/mod.rs
pub mod address;
pub mod token;
pub mod transfer;

pub use address::Address;
pub use token::{CustomToken, TokenDetails};
pub use transfer::{PrepareState, PrepareStatus};

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

//! # fasal-gateway
//!
//! The policy submission gateway: an axum server exposing
//! `POST /api/policies/create`, and [`HttpPolicyGateway`], the client the
//! purchase wizard submits through.

pub mod client;
pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use client::{HttpPolicyGateway, NetworkConfig};
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use routes::{CREATE_POLICY_PATH, CreatePolicyResponse, create_router};
pub use server::{run_server, start_server};
pub use state::{AppState, GatewayConfig};

//! # checkout-gateway
//!
//! MercadoPago implementation of the `checkout-core` [`Gateway`] trait.
//!
//! The client is explicitly constructed with injected credentials (no
//! process-wide singletons) so it can be swapped for `MockGateway` in tests.
//! Every request carries the configured timeout; payment submissions attach
//! the attempt's external reference as an idempotency key so an ambiguous
//! failure can be reconciled without double-charging.
//!
//! [`Gateway`]: checkout_core::Gateway

mod client;
mod config;

pub use client::MercadoPagoClient;
pub use config::GatewayConfig;

//! # checkout-core
//!
//! Orchestration core for a two-phase online checkout against an external
//! payment gateway.
//!
//! ## Flow
//!
//! ```text
//! ┌───────────┐   ┌───────────────┐   ┌──────────────────┐   ┌───────────────────┐
//! │   Quote   │──▶│ IntentService │──▶│ PaymentExecutor  │──▶│ Status Reconciler │
//! │  Builder  │   │ (preference)  │   │ (attempt/submit) │   │ (display + polls) │
//! └───────────┘   └───────────────┘   └──────────────────┘   └───────────────────┘
//!                        │                    │
//!                        └────────┬───────────┘
//!                                 ▼
//!                        ┌────────────────┐
//!                        │    Gateway     │  (Strategy: real HTTP client
//!                        │  trait object  │   or MockGateway for tests)
//!                        └────────────────┘
//! ```
//!
//! The gateway is the only collaborator with funds side effects. Preference
//! creation has none, so it is safe to retry manually; payment submission is
//! guarded by an external reference so an ambiguous failure (timeout) can be
//! reconciled before any resubmission.
//!
//! The winning invariant of the whole crate: the amount charged is always
//! re-derived server-side from the quote snapshot stored with the preference.
//! Client-submitted amounts are cross-checked and divergence is a hard
//! rejection, never a warning.

pub mod attempt;
pub mod error;
pub mod gateway;
pub mod preference;
pub mod quote;
pub mod service;
pub mod status;
pub mod store;

pub use attempt::{Payer, PaymentAttempt, PaymentForm, PaymentStatus};
pub use error::{CheckoutError, Result};
pub use gateway::{Gateway, GatewayError, MockGateway};
pub use preference::{BackUrls, Preference};
pub use quote::{LineItem, Quote, QuoteBuilder};
pub use service::{CreatedPreference, IntentService, PaymentExecutor};
pub use status::{resolve_status, DisplayState, PollDecision, PollPolicy};
pub use store::{AttemptStore, MemoryAttemptStore, MemoryPreferenceStore, PreferenceStore};

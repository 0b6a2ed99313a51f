//! BuddyCart client
//!
//! A typed client for the BuddyCart storefront backend: sessions, carts, buddy-queue matching, clubbed orders and
//! split payment, over plain HTTP+JSON.
//!
//! The library is layered in three:
//! 1. The wire layer ([`mod@rest`] and [`mod@backend`]). One [`backend::HttpBackend`] per server, holding the
//!    route table and the shared bearer token. Every backend quirk (string-or-number prices, spelling-variant
//!    ids, case-insensitive statuses) is absorbed here and in [`mod@data_objects`], so nothing above it ever sees
//!    raw JSON.
//! 2. The flow APIs ([`session::SessionApi`], [`cart::CartApi`], [`matching::MatchingApi`],
//!    [`clubbed::ClubbedOrderApi`], [`settlement::SettlementApi`] and [`checkout::CheckoutApi`]). These are
//!    generic over the [`traits::StorefrontBackend`] trait and own all client-side rules: validation before the
//!    wire, idempotent joins and order creation, and the persisted state transitions in [`mod@state`].
//! 3. Subscriptions. Matching and settlement are waiting games, so both APIs can spawn background workers that
//!    poll on a fixed cadence and push [`events::MatchEvent`]s and [`events::SettlementEvent`]s into an async
//!    handler. Terminal events arrive exactly once, and the state store has already been updated when they do.
//!
//! [`client::BuddyCartClient`] wires all of this together over one configuration and one state file.

pub mod backend;
pub mod cart;
pub mod checkout;
pub mod client;
pub mod clubbed;
pub mod config;
pub mod data_objects;
mod errors;
pub mod events;
pub mod matching;
pub mod rest;
pub mod session;
pub mod settlement;
pub mod state;
pub mod traits;

pub use client::BuddyCartClient;
pub use errors::ClientError;

#[cfg(test)]
mod api_tests;

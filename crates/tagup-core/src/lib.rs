//! tagup Core Library
//!
//! This crate provides the core functionality for tagup, a live view of a
//! team's "daily tag-up" status updates kept in a Supabase table.
//!
//! # Architecture
//!
//! - **Connection**: one shared Supabase handle built from configuration
//! - **Controller**: fetches the table, renders it, submits new updates and
//!   re-fetches on every change notification
//!
//! The remote table is the only source of truth. Every change notification
//! triggers a full re-read and a full re-render; nothing is patched locally.
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let client = connection::connect(&config);
//!
//! let mut controller = Controller::new(client.clone(), Some(ListView::new()), &config.table);
//! controller.load().await;
//!
//! let mut subscription = controller.subscribe(client.as_ref(), &config.schema);
//! while let Some(event) = subscription.recv().await {
//!     if let FeedEvent::Change(_) = event {
//!         controller.on_remote_change().await;
//!     }
//! }
//! ```
//!
//! # Modules
//!
//! - `connection`: builds the shared store handle
//! - `controller`: the sync-and-render loop
//! - `store`: remote store and change feed traits
//! - `supabase`: PostgREST and Realtime implementation of those traits
//! - `models`: update records
//! - `render`: row formatting and the view surface
//! - `form`: form surface and submission validation
//! - `config`: application configuration

pub mod config;
pub mod connection;
pub mod controller;
pub mod error;
pub mod form;
pub mod models;
pub mod render;
pub mod store;
pub mod supabase;

pub use config::Config;
pub use controller::{Controller, ControllerState, SubmitOutcome};
pub use error::{StoreError, StoreResult};
pub use form::{Alert, FormFields, UpdateForm, ValidationError};
pub use models::{NewUpdate, UpdateRecord};
pub use render::{ListView, RenderedRow, UpdatesView};
pub use store::{ChangeFeed, ChangeFilter, FeedEvent, Query, RemoteStore, Subscription};
pub use supabase::SupabaseClient;

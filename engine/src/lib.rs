//! Quote engine for the personal-shopper service: ¥ → FCFA pricing,
//! commission tiers, shipment volume and the text sent to customers.
//!
//! Everything here is pure and synchronous; storage is reached only through
//! [`OrderRepository`].

pub mod conversion;
pub mod edit;
pub mod format;
pub mod message;
pub mod quote;
pub mod repository;
pub mod session;
pub mod state;
pub mod summary;
pub mod types;
pub mod volume;

pub use conversion::{clamp_quantity, coerce_number, RecomputePolicy};
pub use edit::{Edit, EditError, FieldValue};
pub use message::{Composer, CustomerRequest, MessageError, OutboundMessage};
pub use quote::{CommissionTier, Quote, Settlement};
pub use repository::{InMemoryRepository, OrderId, OrderRepository, RepositoryError};
pub use session::{QuoteSession, SessionError};
pub use state::StateError;
pub use types::*;
pub use volume::{CbmEstimate, CbmRequest, ShipmentMetrics};

//! Domain layer: accounts, cookie sessions and the expense/income records
//! whose mutations drive live updates.
//!
//! Record mutations are published through an [`events::EventPublisher`]; the
//! domain never talks to the SSE layer directly.

pub use events::Id;

pub mod encryption;
pub mod error;
pub mod record;
pub mod session;
pub mod user;

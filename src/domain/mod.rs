//! Domain records, their invariants, and the ports the registries depend on.

pub mod attendance;
pub mod class;
pub mod payment;
pub mod ports;
pub mod record;
pub mod search;
pub mod teacher;
pub mod validation;

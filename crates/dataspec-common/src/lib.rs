//! Ready-made specs and constraint factories built on `dataspec-core`.
//!
//! - **Specs** ([`specs`]): optional scalars, integers and floats entered as
//!   text, lowercased strings, string lists and sets, IP addresses, port
//!   numbers and word strings
//! - **Constraints** ([`constraints`]): length, membership, range and
//!   pattern checks
//!
//! # Example
//!
//! ```rust,ignore
//! use dataspec_common::{constraints, specs};
//! use dataspec_core::prelude::*;
//!
//! let listener = DictSpec::new()
//!     .key("bind", specs::ipv4_address()?)
//!     .key("port", specs::port_number()?)
//!     .key("name", specs::word_str()?.add_constraints([constraints::max_len(16)])?)
//!     .build()?;
//! ```

pub mod constraints;
pub mod specs;

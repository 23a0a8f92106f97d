//! Capacity-aware matching engine.
//!
//! ## Design Principles
//!
//! 1. **Determinism**: agents are queued in key order and ties inside a list
//!    keep their stored order, so identical instances give identical matchings
//! 2. **Single mutation point**: only [`Workspace`] assigns, unassigns and
//!    deletes, and a deletion always updates both lists
//! 3. **Synchronous execution**: no I/O or suspension inside a run
//!
//! ## Components
//!
//! - [`Provisional`]: assigned partners per agent with a lazy worst pointer
//! - [`Workspace`]: working model plus provisional matching
//! - [`RoleConfig`]: capability trait (`propose`, `displace`,
//!   `is_at_capacity`, `worst_assigned`) implemented by [`OneToMany`] and
//!   [`TwoLevel`]
//! - [`MatchingEngine`]: generic proposal / rejection fixed point
//! - [`LecturerOptimal`]: lecturer-proposing allocation
//! - [`Roommates`]: Irving's two-phase roommates algorithm
//!
//! ## Example
//!
//! ```
//! use stablematch::engine::{MatchingEngine, OneToMany, Workspace};
//! use stablematch::preferences::{InstanceBuilder, Prefs};
//! use stablematch::types::AgentKind;
//!
//! let instance = InstanceBuilder::new()
//!     .man("m1", Prefs::strict(["w2", "w1"]))
//!     .man("m2", Prefs::strict(["w1", "w2"]))
//!     .woman("w1", Prefs::strict(["m2", "m1"]))
//!     .woman("w2", Prefs::strict(["m1", "m2"]))
//!     .build()
//!     .unwrap();
//!
//! let mut ws = Workspace::new(instance.model);
//! MatchingEngine::new(OneToMany::one_to_one(AgentKind::Man)).run(&mut ws);
//!
//! let m1 = ws.model.key("m1").unwrap();
//! let w2 = ws.model.key("w2").unwrap();
//! assert_eq!(ws.matching.partner(m1), Some(w2));
//! ```

pub mod provisional;
pub mod roles;
pub mod proposal;
pub mod allocation;
pub mod roommates;

pub use provisional::{Occupancy, Provisional, Workspace};
pub use roles::{OneToMany, RoleConfig, TwoLevel};
pub use proposal::{MatchingEngine, RunStats};
pub use allocation::LecturerOptimal;
pub use roommates::Roommates;

/// Whether a procedure that can fail found a candidate matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// `ws.matching` holds the candidate
    Feasible,
    /// No matching of the requested kind exists; the reason is for logs
    Infeasible(&'static str),
}

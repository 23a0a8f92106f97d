//! Preference model: agents, ranked lists with ties, and instance construction.
//!
//! ## Components
//!
//! - [`PreferenceList`]: ties in preference order with a rank table
//! - [`AgentNode`]: an agent in the arena (role, capacity, project links, list)
//! - [`PreferenceModel`]: slab arena with identifier index and symmetric deletion
//! - [`InstanceBuilder`]: structural validation, project list derivation, cleaning
//!
//! ## Operations
//!
//! | Operation | Cost |
//! |-----------|------|
//! | `rank(agent, partner)` | O(1) |
//! | `delete_pair(a, b)` | O(tie size), plus O(offers) for students |
//! | `head` / `tail` | O(number of ties) |
//! | `clean` | O(total list length) per pass |

pub mod list;
pub mod node;
pub mod model;
pub mod instance;

pub use list::PreferenceList;
pub use node::AgentNode;
pub use model::PreferenceModel;
pub use instance::{Instance, InstanceBuilder, Prefs};

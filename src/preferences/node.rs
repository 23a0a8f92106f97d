//! Agent node for slab-based storage.
//!
//! ## Links
//!
//! Project allocation ties two capacity levels together:
//! - `owner`: the lecturer offering a project (projects only)
//! - `offers`: the projects a lecturer offers (lecturers only)
//!
//! Both are slab keys, never references.

use crate::preferences::PreferenceList;
use crate::types::{AgentKey, AgentKind};

/// Agent stored in the model arena.
#[derive(Debug, Clone)]
pub struct AgentNode {
    /// External identifier
    pub name: String,

    /// Role of the agent
    pub kind: AgentKind,

    /// Upper quota; 1 for single-capacity roles
    pub capacity: usize,

    /// Owning lecturer (projects only)
    pub owner: Option<AgentKey>,

    /// Offered projects (lecturers only)
    pub offers: Vec<AgentKey>,

    /// Working preference list
    pub prefs: PreferenceList,
}

impl AgentNode {
    /// Create an unlinked node with an empty list.
    ///
    /// # Example
    ///
    /// ```
    /// use stablematch::preferences::AgentNode;
    /// use stablematch::types::AgentKind;
    ///
    /// let node = AgentNode::new("h1", AgentKind::Hospital, 3);
    /// assert_eq!(node.capacity, 3);
    /// assert!(node.prefs.is_empty());
    /// assert!(node.owner.is_none());
    /// ```
    pub fn new(name: impl Into<String>, kind: AgentKind, capacity: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            capacity,
            owner: None,
            offers: Vec::new(),
            prefs: PreferenceList::default(),
        }
    }
}

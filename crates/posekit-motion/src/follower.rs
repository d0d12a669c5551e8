//! Rigid follower: keeps a child pose locked to a moving parent.
//!
//! [`Follower::attach`] captures where the child sits relative to the parent;
//! every later [`Follower::follow`] re-applies that offset to the parent's new
//! pose, so the child moves as if welded to it.

use posekit_types::Pose;

/// Cached parent→child offset.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Follower {
    offset: Option<Pose>,
}

impl Follower {
    /// A follower with no parent attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach to `parent`, keeping `child` exactly where it is now.
    pub fn attach(parent: Pose, child: Pose) -> Self {
        let mut f = Self::new();
        f.cache_offset(parent, child);
        f
    }

    /// Re-capture the offset, e.g. after the child was moved by hand.
    pub fn cache_offset(&mut self, parent: Pose, child: Pose) {
        self.offset = Some(parent.relative_to(child));
    }

    /// Drop the parent; [`follow`](Self::follow) returns `None` afterwards.
    pub fn detach(&mut self) {
        self.offset = None;
    }

    pub fn is_attached(&self) -> bool {
        self.offset.is_some()
    }

    /// The child pose, in the parent's frame.
    pub fn offset(&self) -> Option<Pose> {
        self.offset
    }

    /// Where the child must be for the given parent pose.
    pub fn follow(&self, parent: Pose) -> Option<Pose> {
        self.offset.map(|offset| parent.compose(offset))
    }
}

// Member domain module
// Contains the member entity and the team association routines

#![allow(clippy::module_inception)]

pub mod association;
pub mod member;

pub use association::{assign_team, reassign_team};
pub use member::{Member, MemberId, NewMember};

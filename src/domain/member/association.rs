//! Keeps `Member::team_id` and `Team::members` consistent.
//!
//! The member's reference is the source of truth; a team's member list is
//! an index rebuilt from it. Both routines finish with the two sides in
//! agreement, so callers only need to run them inside one unit of work.

use crate::domain::errors::DomainError;
use crate::domain::member::Member;
use crate::domain::team::Team;

/// Points `member` at `team` and records it in the team's index.
///
/// A `None` team is a no-op. Calling it again with the same team leaves a
/// single entry in the index.
///
/// # Example
/// ```
/// use member_search_api::domain::member::{assign_team, Member, MemberId};
/// use member_search_api::domain::team::{Team, TeamId, TeamName};
///
/// let mut team = Team::from_persistence(TeamId(1), TeamName::new("teamA").unwrap(), vec![]);
/// let mut member = Member::from_persistence(MemberId(1), Some("member1".into()), 10, None);
///
/// assign_team(&mut member, Some(&mut team));
/// assign_team(&mut member, Some(&mut team));
///
/// assert_eq!(member.team_id(), Some(TeamId(1)));
/// assert_eq!(team.members(), &[MemberId(1)]);
/// ```
pub fn assign_team(member: &mut Member, team: Option<&mut Team>) {
    let Some(team) = team else {
        return;
    };

    member.set_team(Some(team.id()));
    team.attach(member.id());
}

/// Moves `member` from `previous` to `next`: detach, then attach.
///
/// `previous` must be the team the member currently references (`None`
/// for a member without a team); anything else is rejected before either
/// side is touched.
pub fn reassign_team(
    member: &mut Member,
    previous: Option<&mut Team>,
    next: &mut Team,
) -> Result<(), DomainError> {
    let previous_id = previous.as_ref().map(|team| team.id());
    if previous_id != member.team_id() {
        return Err(DomainError::TeamMismatch {
            member: member.id(),
            expected: previous_id,
            actual: member.team_id(),
        });
    }

    if let Some(previous) = previous {
        previous.detach(member.id());
        member.set_team(None);
    }

    assign_team(member, Some(next));
    Ok(())
}

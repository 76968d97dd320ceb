// Dynamic member search
// Condition input, predicate composition, ordering and result shapes

pub mod condition;
pub mod order;
pub mod predicate;
pub mod projection;

pub use condition::MemberSearchCondition;
pub use order::{
    parse_order, Direction, MemberQuery, OrderParseError, OrderSpecifier, PageRequest, SortField,
};
pub use predicate::{Fragment, Predicate, PredicateBuilder};
pub use projection::{MemberStatistics, MemberTeamDto, Page, TeamAgeAverage};

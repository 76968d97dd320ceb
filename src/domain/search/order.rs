use std::cmp::Ordering;
use std::str::FromStr;

use thiserror::Error;

use super::predicate::Predicate;
use super::projection::MemberTeamDto;

/// Columns a member query can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Username,
    Age,
    TeamName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// One ordering key. Nulls always sort last, whatever the direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSpecifier {
    pub field: SortField,
    pub direction: Direction,
}

impl OrderSpecifier {
    pub fn asc(field: SortField) -> Self {
        Self {
            field,
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: SortField) -> Self {
        Self {
            field,
            direction: Direction::Desc,
        }
    }

    /// Compares two rows on this key only
    pub fn compare(&self, a: &MemberTeamDto, b: &MemberTeamDto) -> Ordering {
        match self.field {
            SortField::Id => self.directed(a.member_id.cmp(&b.member_id)),
            SortField::Age => self.directed(a.age.cmp(&b.age)),
            SortField::Username => self.nulls_last(a.username.as_deref(), b.username.as_deref()),
            SortField::TeamName => {
                self.nulls_last(a.team_name.as_deref(), b.team_name.as_deref())
            }
        }
    }

    fn directed(&self, ordering: Ordering) -> Ordering {
        match self.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }

    fn nulls_last<T: Ord>(&self, a: Option<T>, b: Option<T>) -> Ordering {
        match (a, b) {
            (Some(a), Some(b)) => self.directed(a.cmp(&b)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderParseError {
    #[error("Unknown sort field: {0}")]
    UnknownField(String),

    #[error("Unknown sort direction: {0}")]
    UnknownDirection(String),
}

impl FromStr for OrderSpecifier {
    type Err = OrderParseError;

    /// Parses `field` or `field:direction`, e.g. `age:desc`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = match s.split_once(':') {
            Some((field, direction)) => (field.trim(), direction.trim()),
            None => (s.trim(), "asc"),
        };

        let field = match field.to_ascii_lowercase().as_str() {
            "id" => SortField::Id,
            "username" => SortField::Username,
            "age" => SortField::Age,
            "teamname" | "team_name" => SortField::TeamName,
            _ => return Err(OrderParseError::UnknownField(field.to_string())),
        };

        let direction = match direction.to_ascii_lowercase().as_str() {
            "asc" => Direction::Asc,
            "desc" => Direction::Desc,
            _ => return Err(OrderParseError::UnknownDirection(direction.to_string())),
        };

        Ok(Self { field, direction })
    }
}

/// Parses a comma separated list such as `age:desc,username`
pub fn parse_order(s: &str) -> Result<Vec<OrderSpecifier>, OrderParseError> {
    s.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(str::parse)
        .collect()
}

/// Offset/limit window applied after ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }
}

/// Predicate, ordering and optional window for one member query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberQuery {
    pub predicate: Predicate,
    pub order: Vec<OrderSpecifier>,
    pub page: Option<PageRequest>,
}

impl MemberQuery {
    pub fn filtered(predicate: Predicate) -> Self {
        Self {
            predicate,
            ..Self::default()
        }
    }

    pub fn order_by(mut self, order: OrderSpecifier) -> Self {
        self.order.push(order);
        self
    }

    pub fn paged(mut self, page: PageRequest) -> Self {
        self.page = Some(page);
        self
    }
}

/// Stable sort by the key sequence. Rows equal on every key keep their
/// input order.
pub fn sort_rows(rows: &mut [MemberTeamDto], order: &[OrderSpecifier]) {
    rows.sort_by(|a, b| {
        order
            .iter()
            .map(|key| key.compare(a, b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });
}

/// Applies the window to already ordered rows
pub fn apply_page<T>(rows: Vec<T>, page: Option<PageRequest>) -> Vec<T> {
    match page {
        Some(page) => rows
            .into_iter()
            .skip(usize::try_from(page.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(page.limit).unwrap_or(usize::MAX))
            .collect(),
        None => rows,
    }
}

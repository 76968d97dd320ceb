//! Predicate fragments and their conjunction.
//!
//! A [`Predicate`] is an AND of zero or more [`Fragment`]s. The empty
//! predicate matches every row. Fragments are produced by the field
//! functions below, which return `None` when the input carries no
//! constraint; both construction styles drop those before conjoining.

use std::fmt;

use super::projection::MemberTeamDto;

/// A single comparison against a joined member/team row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// `member.username = value`
    UsernameEq(String),
    /// `team.name = value`
    TeamNameEq(String),
    /// `member.age >= value`
    AgeGoe(i32),
    /// `member.age <= value`
    AgeLoe(i32),
}

impl Fragment {
    /// Evaluates the fragment with SQL comparison semantics: a missing
    /// username or team never compares equal.
    pub fn matches(&self, row: &MemberTeamDto) -> bool {
        match self {
            Fragment::UsernameEq(username) => row.username.as_deref() == Some(username.as_str()),
            Fragment::TeamNameEq(name) => row.team_name.as_deref() == Some(name.as_str()),
            Fragment::AgeGoe(age) => row.age >= *age,
            Fragment::AgeLoe(age) => row.age <= *age,
        }
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fragment::UsernameEq(username) => write!(f, "member.username = {username:?}"),
            Fragment::TeamNameEq(name) => write!(f, "team.name = {name:?}"),
            Fragment::AgeGoe(age) => write!(f, "member.age >= {age}"),
            Fragment::AgeLoe(age) => write!(f, "member.age <= {age}"),
        }
    }
}

/// Conjunction of fragments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    fragments: Vec<Fragment>,
}

impl Predicate {
    /// The unconstrained predicate
    pub fn all() -> Self {
        Self::default()
    }

    /// Conjoins every `Some` fragment and discards the `None`s.
    ///
    /// # Example
    /// ```
    /// use member_search_api::domain::search::predicate::{age_goe, username_eq, Predicate};
    ///
    /// let predicate = Predicate::all_of([username_eq(Some("")), age_goe(Some(35))]);
    /// assert_eq!(predicate.fragments().len(), 1);
    /// ```
    pub fn all_of<I>(fragments: I) -> Self
    where
        I: IntoIterator<Item = Option<Fragment>>,
    {
        Self {
            fragments: fragments.into_iter().flatten().collect(),
        }
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// True when no fragment constrains the result
    pub fn is_unconstrained(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn matches(&self, row: &MemberTeamDto) -> bool {
        self.fragments.iter().all(|fragment| fragment.matches(row))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fragments.is_empty() {
            return write!(f, "true");
        }
        for (i, fragment) in self.fragments.iter().enumerate() {
            if i > 0 {
                write!(f, " and ")?;
            }
            write!(f, "{fragment}")?;
        }
        Ok(())
    }
}

/// Accumulator that conjoins fragments as they are produced
#[derive(Debug, Default)]
pub struct PredicateBuilder {
    fragments: Vec<Fragment>,
}

impl PredicateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(&mut self, fragment: Fragment) -> &mut Self {
        self.fragments.push(fragment);
        self
    }

    pub fn build(self) -> Predicate {
        Predicate {
            fragments: self.fragments,
        }
    }
}

/// Text counts as a constraint only if it has a non-whitespace character.
pub fn has_text(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

pub fn username_eq(username: Option<&str>) -> Option<Fragment> {
    if !has_text(username) {
        return None;
    }
    username.map(|u| Fragment::UsernameEq(u.to_string()))
}

pub fn team_name_eq(team_name: Option<&str>) -> Option<Fragment> {
    if !has_text(team_name) {
        return None;
    }
    team_name.map(|n| Fragment::TeamNameEq(n.to_string()))
}

pub fn age_goe(age: Option<i32>) -> Option<Fragment> {
    age.map(Fragment::AgeGoe)
}

pub fn age_loe(age: Option<i32>) -> Option<Fragment> {
    age.map(Fragment::AgeLoe)
}

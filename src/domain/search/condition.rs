use std::fmt::Display;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer};

use super::predicate::{
    age_goe, age_loe, has_text, team_name_eq, username_eq, Fragment, Predicate, PredicateBuilder,
};

/// Sparse search input. Every field is optional and an absent field places
/// no constraint on its dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSearchCondition {
    pub username: Option<String>,
    pub team_name: Option<String>,
    /// Inclusive lower bound on age
    #[serde(default, deserialize_with = "blank_as_none")]
    pub age_goe: Option<i32>,
    /// Inclusive upper bound on age
    #[serde(default, deserialize_with = "blank_as_none")]
    pub age_loe: Option<i32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText<T> {
    Number(T),
    Text(String),
}

/// Reads an optional number that may arrive as text, as it does in a query
/// string. Blank text is treated the same as an absent value.
pub fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match Option::<NumberOrText<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(value)) => Ok(Some(value)),
        Some(NumberOrText::Text(text)) if !has_text(Some(text.as_str())) => Ok(None),
        Some(NumberOrText::Text(text)) => text.trim().parse().map(Some).map_err(de::Error::custom),
    }
}

impl MemberSearchCondition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn team_name(mut self, team_name: impl Into<String>) -> Self {
        self.team_name = Some(team_name.into());
        self
    }

    pub fn age_goe(mut self, age: i32) -> Self {
        self.age_goe = Some(age);
        self
    }

    pub fn age_loe(mut self, age: i32) -> Self {
        self.age_loe = Some(age);
        self
    }

    /// Builds the predicate by appending to an accumulator, one field at
    /// a time.
    ///
    /// # Example
    /// ```
    /// use member_search_api::domain::search::MemberSearchCondition;
    ///
    /// let condition = MemberSearchCondition::new()
    ///     .age_goe(35)
    ///     .age_loe(40)
    ///     .team_name("teamB");
    ///
    /// assert_eq!(condition.build_predicate(), condition.where_predicate());
    /// ```
    pub fn build_predicate(&self) -> Predicate {
        let mut builder = PredicateBuilder::new();

        if let Some(username) = self.username.as_deref().filter(|u| has_text(Some(*u))) {
            builder.and(Fragment::UsernameEq(username.to_string()));
        }

        if let Some(team_name) = self.team_name.as_deref().filter(|n| has_text(Some(*n))) {
            builder.and(Fragment::TeamNameEq(team_name.to_string()));
        }

        if let Some(age) = self.age_goe {
            builder.and(Fragment::AgeGoe(age));
        }

        if let Some(age) = self.age_loe {
            builder.and(Fragment::AgeLoe(age));
        }

        builder.build()
    }

    /// Builds the predicate from the independent field functions, letting
    /// [`Predicate::all_of`] drop the absent ones.
    pub fn where_predicate(&self) -> Predicate {
        Predicate::all_of([
            username_eq(self.username.as_deref()),
            team_name_eq(self.team_name.as_deref()),
            age_goe(self.age_goe),
            age_loe(self.age_loe),
        ])
    }
}

//! Renders member queries into PostgreSQL with bound parameters.

use sqlx::{Postgres, QueryBuilder};

use crate::domain::search::{Direction, Fragment, MemberQuery, OrderSpecifier, Predicate, SortField};

/// Joined row source shared by every member query
pub(crate) const MEMBER_JOIN: &str = " FROM members m LEFT JOIN teams t ON t.id = m.team_id";

pub(crate) const MEMBER_COLUMNS: &str = "SELECT m.id, m.username, m.age, m.team_id";

pub(crate) const MEMBER_TEAM_COLUMNS: &str =
    "SELECT m.id AS member_id, m.username, m.age, t.id AS team_id, t.name AS team_name";

pub(crate) fn select_members(query: &MemberQuery) -> QueryBuilder<'static, Postgres> {
    select(MEMBER_COLUMNS, query)
}

pub(crate) fn select_member_teams(query: &MemberQuery) -> QueryBuilder<'static, Postgres> {
    select(MEMBER_TEAM_COLUMNS, query)
}

pub(crate) fn count_members(predicate: &Predicate) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*)");
    builder.push(MEMBER_JOIN);
    push_where(&mut builder, predicate);
    builder
}

fn select(columns: &str, query: &MemberQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(columns);
    builder.push(MEMBER_JOIN);
    push_where(&mut builder, &query.predicate);
    push_order(&mut builder, &query.order);

    if let Some(page) = query.page {
        builder.push(" LIMIT ");
        builder.push_bind(i64::try_from(page.limit).unwrap_or(i64::MAX));
        builder.push(" OFFSET ");
        builder.push_bind(i64::try_from(page.offset).unwrap_or(i64::MAX));
    }

    builder
}

fn push_where(builder: &mut QueryBuilder<'static, Postgres>, predicate: &Predicate) {
    let mut fragments = predicate.fragments().iter();
    let Some(first) = fragments.next() else {
        return;
    };

    builder.push(" WHERE ");
    push_fragment(builder, first);
    for fragment in fragments {
        builder.push(" AND ");
        push_fragment(builder, fragment);
    }
}

fn push_fragment(builder: &mut QueryBuilder<'static, Postgres>, fragment: &Fragment) {
    match fragment {
        Fragment::UsernameEq(username) => {
            builder.push("m.username = ");
            builder.push_bind(username.clone());
        }
        Fragment::TeamNameEq(name) => {
            builder.push("t.name = ");
            builder.push_bind(name.clone());
        }
        Fragment::AgeGoe(age) => {
            builder.push("m.age >= ");
            builder.push_bind(*age);
        }
        Fragment::AgeLoe(age) => {
            builder.push("m.age <= ");
            builder.push_bind(*age);
        }
    }
}

/// Every key sorts nulls last; `m.id` closes the list so ties fall back
/// to insertion order.
fn push_order(builder: &mut QueryBuilder<'static, Postgres>, order: &[OrderSpecifier]) {
    builder.push(" ORDER BY ");
    for item in order {
        builder.push(column(item.field));
        builder.push(match item.direction {
            Direction::Asc => " ASC NULLS LAST, ",
            Direction::Desc => " DESC NULLS LAST, ",
        });
    }
    builder.push("m.id ASC");
}

/// Text keys sort by byte order, independent of the database collation.
fn column(field: SortField) -> &'static str {
    match field {
        SortField::Id => "m.id",
        SortField::Username => "m.username COLLATE \"C\"",
        SortField::Age => "m.age",
        SortField::TeamName => "t.name COLLATE \"C\"",
    }
}

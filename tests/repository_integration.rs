//! Integration tests for the store layer
//!
//! Every scenario is written once against the `Store` contract and run on
//! the in-memory store. The PostgreSQL variants need `DATABASE_URL` and are
//! ignored by default:
//!
//! ```text
//! DATABASE_URL=postgresql://... cargo test -- --ignored
//! ```

use member_search_api::application::MemberService;
use member_search_api::domain::member::{MemberId, NewMember};
use member_search_api::domain::repositories::{Store, StoreError, UnitOfWork};
use member_search_api::domain::search::{
    MemberQuery, MemberSearchCondition, MemberTeamDto, OrderSpecifier, PageRequest, Predicate,
    SortField,
};
use member_search_api::domain::search::predicate::{age_goe, age_loe};
use member_search_api::domain::team::{NewTeam, Team, TeamId};
use member_search_api::infrastructure::repositories::{InMemoryStore, PostgresStore};
use sqlx::PgPool;
use std::sync::OnceLock;
use tokio::sync::{Mutex, MutexGuard};

/// Serialises the PostgreSQL tests, which share one database
fn pg_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

/// Set up a migrated, empty test database
async fn setup_test_db() -> (PostgresStore, MutexGuard<'static, ()>) {
    let guard = pg_lock().lock().await;
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for integration tests");

    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test database");
    let store = PostgresStore::new(pool.clone());
    store.migrate().await.expect("Failed to run migrations");

    sqlx::query("TRUNCATE members, teams RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await
        .expect("Failed to clean test tables");

    (store, guard)
}

struct Seeded {
    team_a: Team,
    team_b: Team,
    members: Vec<MemberId>,
}

/// teamA: member1 (10), member2 (20); teamB: member3 (30), member4 (40)
async fn seed<S: Store>(service: &MemberService<S>) -> Seeded {
    let team_a = service.save_team(NewTeam::new("teamA").unwrap()).await.unwrap();
    let team_b = service.save_team(NewTeam::new("teamB").unwrap()).await.unwrap();

    let mut members = Vec::new();
    for (name, age, team) in [
        ("member1", 10, team_a.id()),
        ("member2", 20, team_a.id()),
        ("member3", 30, team_b.id()),
        ("member4", 40, team_b.id()),
    ] {
        let member = service
            .save_member(NewMember::new(name, age).with_team(team))
            .await
            .expect("Failed to save member");
        members.push(member.id());
    }

    Seeded {
        team_a,
        team_b,
        members,
    }
}

fn usernames(rows: &[MemberTeamDto]) -> Vec<Option<String>> {
    rows.iter().map(|row| row.username.clone()).collect()
}

fn names(values: &[&str]) -> Vec<Option<String>> {
    values.iter().map(|v| Some(v.to_string())).collect()
}

fn sample_conditions() -> Vec<MemberSearchCondition> {
    let c = MemberSearchCondition::new;
    vec![
        c(),
        c().username("member1"),
        c().username("  "),
        c().team_name("teamA"),
        c().team_name("teamC"),
        c().age_goe(20),
        c().age_loe(20),
        c().age_goe(35).age_loe(40).team_name("teamB"),
        c().username("member2").team_name("teamA"),
        c().username("member2").team_name("teamB"),
        c().age_goe(50),
        c().team_name("").age_loe(30),
    ]
}

// ===== Scenarios =====

async fn basic_crud<S: Store>(store: S) {
    let service = MemberService::new(store);

    let member = service
        .save_member(NewMember::new("member1", 10))
        .await
        .expect("Failed to save member");

    let found = service
        .find_by_id(member.id())
        .await
        .expect("Failed to find member")
        .expect("Member should exist");
    assert_eq!(found, member);

    let all = service.find_all().await.expect("Failed to list members");
    assert_eq!(all, vec![member.clone()]);

    let by_name = service
        .find_by_username("member1")
        .await
        .expect("Failed to find by username");
    assert_eq!(by_name, vec![member]);

    let nobody = service.find_by_username("member9").await.unwrap();
    assert!(nobody.is_empty());
}

async fn find_by_unknown_id_is_none<S: Store>(store: S) {
    let service = MemberService::new(store);

    let found = service.find_by_id(MemberId(424242)).await;

    assert!(matches!(found, Ok(None)));
}

async fn search_both_strategies<S: Store>(store: S) {
    let service = MemberService::new(store);
    seed(&service).await;

    let condition = MemberSearchCondition::new()
        .age_goe(35)
        .age_loe(40)
        .team_name("teamB");

    let by_builder = service.search_by_builder(&condition).await.unwrap();
    let by_where = service.search_by_where(&condition).await.unwrap();

    assert_eq!(usernames(&by_builder), names(&["member4"]));
    assert_eq!(by_builder, by_where);
    assert_eq!(by_builder[0].team_name.as_deref(), Some("teamB"));
}

async fn empty_condition_scans_everything<S: Store>(store: S) {
    let service = MemberService::new(store);
    seed(&service).await;
    service
        .save_member(NewMember::new("loner", 50))
        .await
        .unwrap();

    let rows = service
        .search_by_where(&MemberSearchCondition::new())
        .await
        .unwrap();

    assert_eq!(
        usernames(&rows),
        names(&["member1", "member2", "member3", "member4", "loner"])
    );
    let loner = &rows[4];
    assert!(loner.team_id.is_none(), "left join keeps teamless member");
    assert!(loner.team_name.is_none());
}

async fn strategies_agree_on_dataset<S: Store>(store: S) {
    let service = MemberService::new(store);
    seed(&service).await;
    service
        .save_member(NewMember::anonymous(20))
        .await
        .unwrap();

    for condition in sample_conditions() {
        let by_builder = service.search_by_builder(&condition).await.unwrap();
        let by_where = service.search_by_where(&condition).await.unwrap();
        assert_eq!(by_builder, by_where, "strategies disagree for {condition:?}");
    }
}

async fn check_single_criterion<S, F>(
    service: &MemberService<S>,
    everything: &[MemberTeamDto],
    condition: MemberSearchCondition,
    criterion: F,
    narrow: fn(MemberSearchCondition) -> MemberSearchCondition,
) where
    S: Store,
    F: Fn(&MemberTeamDto) -> bool,
{
    let rows = service.search_by_where(&condition).await.unwrap();
    let expected: Vec<_> = everything.iter().filter(|r| criterion(r)).cloned().collect();
    assert_eq!(rows, expected, "single criterion mismatch for {condition:?}");

    // Adding a criterion on another dimension only narrows the result.
    let narrower = narrow(condition.clone());
    assert_ne!(narrower, condition, "narrowing must add a criterion");
    let narrowed = service.search_by_where(&narrower).await.unwrap();
    assert!(narrowed.len() <= rows.len());
    assert!(narrowed.iter().all(|r| rows.contains(r)));
}

async fn single_criteria_decompose<S: Store>(store: S) {
    let service = MemberService::new(store);
    seed(&service).await;

    let everything = service
        .search_by_where(&MemberSearchCondition::new())
        .await
        .unwrap();

    check_single_criterion(
        &service,
        &everything,
        MemberSearchCondition::new().username("member3"),
        |r| r.username.as_deref() == Some("member3"),
        |c| c.team_name("teamA"),
    )
    .await;
    check_single_criterion(
        &service,
        &everything,
        MemberSearchCondition::new().team_name("teamB"),
        |r| r.team_name.as_deref() == Some("teamB"),
        |c| c.age_goe(35),
    )
    .await;
    check_single_criterion(
        &service,
        &everything,
        MemberSearchCondition::new().age_goe(25),
        |r| r.age >= 25,
        |c| c.team_name("teamA"),
    )
    .await;
    check_single_criterion(
        &service,
        &everything,
        MemberSearchCondition::new().age_loe(25),
        |r| r.age <= 25,
        |c| c.username("member2"),
    )
    .await;
}

async fn sort_nulls_last<S: Store>(store: S) {
    let service = MemberService::new(store);
    seed(&service).await;
    service.save_member(NewMember::anonymous(100)).await.unwrap();
    service.save_member(NewMember::new("member5", 100)).await.unwrap();
    service.save_member(NewMember::new("member6", 100)).await.unwrap();

    let query = MemberQuery::filtered(Predicate::all_of([age_goe(Some(100)), age_loe(Some(100))]))
        .order_by(OrderSpecifier::desc(SortField::Age))
        .order_by(OrderSpecifier::asc(SortField::Username));
    let members = service.find_members(query).await.unwrap();

    let names: Vec<_> = members.iter().map(|m| m.username()).collect();
    assert_eq!(names, vec![Some("member5"), Some("member6"), None]);
}

async fn mixed_case_sorts_by_byte_order<S: Store>(store: S) {
    let service = MemberService::new(store);
    for name in ["alice", "Bob", "carol", "Dave"] {
        service.save_member(NewMember::new(name, 1)).await.unwrap();
    }

    let query = MemberQuery::default().order_by(OrderSpecifier::asc(SortField::Username));
    let members = service.find_members(query).await.unwrap();

    let names: Vec<_> = members.iter().map(|m| m.username()).collect();
    assert_eq!(
        names,
        vec![Some("Bob"), Some("Dave"), Some("alice"), Some("carol")]
    );
}

async fn paging_with_total<S: Store>(store: S) {
    let service = MemberService::new(store);
    seed(&service).await;

    let query = MemberQuery::default().order_by(OrderSpecifier::desc(SortField::Username));
    let page = service
        .find_member_page(query, PageRequest::new(1, 2))
        .await
        .unwrap();

    assert_eq!(page.total, 4);
    assert_eq!(page.offset, 1);
    assert_eq!(page.limit, 2);
    let names: Vec<_> = page.results.iter().map(|m| m.username()).collect();
    assert_eq!(names, vec![Some("member3"), Some("member2")]);
}

async fn search_page_counts_filtered_rows<S: Store>(store: S) {
    let service = MemberService::new(store);
    seed(&service).await;

    let page = service
        .search_page(
            &MemberSearchCondition::new().age_goe(20),
            vec![OrderSpecifier::desc(SortField::Age)],
            PageRequest::new(0, 2),
        )
        .await
        .unwrap();

    assert_eq!(page.total, 3);
    assert_eq!(usernames(&page.results), names(&["member4", "member3"]));
}

async fn aggregates<S: Store>(store: S) {
    let service = MemberService::new(store);
    seed(&service).await;

    let stats = service.statistics().await.unwrap();
    assert_eq!(stats.count, 4);
    assert_eq!(stats.age_sum, 100);
    assert_eq!(stats.age_avg, Some(25.0));
    assert_eq!(stats.age_max, Some(40));
    assert_eq!(stats.age_min, Some(10));

    let averages = service.team_average_ages().await.unwrap();
    assert_eq!(averages.len(), 2);
    assert_eq!(averages[0].team_name, "teamA");
    assert_eq!(averages[0].average_age, 15.0);
    assert_eq!(averages[1].team_name, "teamB");
    assert_eq!(averages[1].average_age, 35.0);
}

async fn team_index_follows_members<S: Store>(store: S) {
    let service = MemberService::new(store);
    let seeded = seed(&service).await;

    let team_a = service.find_team(seeded.team_a.id()).await.unwrap().unwrap();
    assert_eq!(team_a.members(), &seeded.members[..2]);

    let moved = service
        .change_team(seeded.members[0], seeded.team_b.id())
        .await
        .expect("Failed to change team");
    assert_eq!(moved.team_id(), Some(seeded.team_b.id()));

    let team_a = service.find_team(seeded.team_a.id()).await.unwrap().unwrap();
    let team_b = service.find_team(seeded.team_b.id()).await.unwrap().unwrap();
    assert_eq!(team_a.members(), &[seeded.members[1]]);
    assert!(team_b.contains(seeded.members[0]));
    assert_eq!(team_b.members().len(), 3);

    // Moving to the current team again changes nothing.
    service
        .change_team(seeded.members[0], seeded.team_b.id())
        .await
        .unwrap();
    let team_b = service.find_team(seeded.team_b.id()).await.unwrap().unwrap();
    let entries = team_b
        .members()
        .iter()
        .filter(|id| **id == seeded.members[0])
        .count();
    assert_eq!(entries, 1);

    let rows = service
        .search_by_where(&MemberSearchCondition::new().team_name("teamB"))
        .await
        .unwrap();
    assert_eq!(
        usernames(&rows),
        names(&["member1", "member3", "member4"])
    );
}

async fn unknown_references_fail<S: Store>(store: S) {
    let service = MemberService::new(store);
    let seeded = seed(&service).await;

    let result = service
        .save_member(NewMember::new("ghost", 1).with_team(TeamId(9999)))
        .await;
    assert!(matches!(result, Err(StoreError::UnknownTeam(TeamId(9999)))));

    let result = service.change_team(MemberId(9999), seeded.team_a.id()).await;
    assert!(matches!(result, Err(StoreError::UnknownMember(MemberId(9999)))));

    let result = service.change_team(seeded.members[0], TeamId(9999)).await;
    assert!(matches!(result, Err(StoreError::UnknownTeam(TeamId(9999)))));

    // The failed insert left nothing behind.
    assert_eq!(service.find_all().await.unwrap().len(), 4);
}

async fn dropped_session_discards_writes<S: Store>(store: S) {
    let team_id = {
        let mut session = store.begin().await.unwrap();
        let id = session
            .insert_team(NewTeam::new("temporary").unwrap())
            .await
            .unwrap();
        assert!(session.find_team(id).await.unwrap().is_some());
        id
    };

    let mut session = store.begin().await.unwrap();
    assert!(session.find_team(team_id).await.unwrap().is_none());
    let id = session
        .insert_team(NewTeam::new("rolled back").unwrap())
        .await
        .unwrap();
    session.rollback().await.unwrap();

    let mut session = store.begin().await.unwrap();
    assert!(session.find_team(id).await.unwrap().is_none());
    let kept = session
        .insert_team(NewTeam::new("kept").unwrap())
        .await
        .unwrap();
    session.commit().await.unwrap();

    let mut session = store.begin().await.unwrap();
    let team = session.find_team(kept).await.unwrap().expect("committed team");
    assert_eq!(team.name().as_str(), "kept");
}

// ===== In-memory store =====

#[tokio::test]
async fn test_in_memory_basic_crud() {
    basic_crud(InMemoryStore::new()).await;
}

#[tokio::test]
async fn test_in_memory_find_by_unknown_id() {
    find_by_unknown_id_is_none(InMemoryStore::new()).await;
}

#[tokio::test]
async fn test_in_memory_search_both_strategies() {
    search_both_strategies(InMemoryStore::new()).await;
}

#[tokio::test]
async fn test_in_memory_empty_condition() {
    empty_condition_scans_everything(InMemoryStore::new()).await;
}

#[tokio::test]
async fn test_in_memory_strategies_agree() {
    strategies_agree_on_dataset(InMemoryStore::new()).await;
}

#[tokio::test]
async fn test_in_memory_single_criteria() {
    single_criteria_decompose(InMemoryStore::new()).await;
}

#[tokio::test]
async fn test_in_memory_sort_nulls_last() {
    sort_nulls_last(InMemoryStore::new()).await;
}

#[tokio::test]
async fn test_in_memory_mixed_case_sort() {
    mixed_case_sorts_by_byte_order(InMemoryStore::new()).await;
}

#[tokio::test]
async fn test_in_memory_paging() {
    paging_with_total(InMemoryStore::new()).await;
}

#[tokio::test]
async fn test_in_memory_search_page() {
    search_page_counts_filtered_rows(InMemoryStore::new()).await;
}

#[tokio::test]
async fn test_in_memory_aggregates() {
    aggregates(InMemoryStore::new()).await;
}

#[tokio::test]
async fn test_in_memory_team_index() {
    team_index_follows_members(InMemoryStore::new()).await;
}

#[tokio::test]
async fn test_in_memory_unknown_references() {
    unknown_references_fail(InMemoryStore::new()).await;
}

#[tokio::test]
async fn test_in_memory_dropped_session() {
    dropped_session_discards_writes(InMemoryStore::new()).await;
}

// ===== PostgreSQL store =====

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_basic_crud() {
    let (store, _guard) = setup_test_db().await;
    basic_crud(store).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_find_by_unknown_id() {
    let (store, _guard) = setup_test_db().await;
    find_by_unknown_id_is_none(store).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_search_both_strategies() {
    let (store, _guard) = setup_test_db().await;
    search_both_strategies(store).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_empty_condition() {
    let (store, _guard) = setup_test_db().await;
    empty_condition_scans_everything(store).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_strategies_agree() {
    let (store, _guard) = setup_test_db().await;
    strategies_agree_on_dataset(store).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_single_criteria() {
    let (store, _guard) = setup_test_db().await;
    single_criteria_decompose(store).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_sort_nulls_last() {
    let (store, _guard) = setup_test_db().await;
    sort_nulls_last(store).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_mixed_case_sort() {
    let (store, _guard) = setup_test_db().await;
    mixed_case_sorts_by_byte_order(store).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_paging() {
    let (store, _guard) = setup_test_db().await;
    paging_with_total(store).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_search_page() {
    let (store, _guard) = setup_test_db().await;
    search_page_counts_filtered_rows(store).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_aggregates() {
    let (store, _guard) = setup_test_db().await;
    aggregates(store).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_team_index() {
    let (store, _guard) = setup_test_db().await;
    team_index_follows_members(store).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_unknown_references() {
    let (store, _guard) = setup_test_db().await;
    unknown_references_fail(store).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_dropped_session() {
    let (store, _guard) = setup_test_db().await;
    dropped_session_discards_writes(store).await;
}

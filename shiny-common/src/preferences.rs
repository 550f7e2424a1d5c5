//! Run preference store and filter resolution
//!
//! Filtering follows these rules, in order:
//! 1. `group == "null"` means "no group": restrict to group-less rows and
//!    treat the group parameter as unset from here on.
//! 2. `user` and `group` both set: that exact pair.
//! 3. only `user`: that user's group-less rows.
//! 4. only `group`: every row of that group.
//! 5. neither: no further restriction.
//!
//! `user` + `group="null"` therefore lands on the same rows as `user` alone,
//! through two separate conditions. Both are kept.
//!
//! At most one preference exists per (user, group) pair, including the
//! group-less pair. Writes that would break this fail with
//! [`Error::Constraint`] instead of overwriting. Group deletion can still leave
//! a user with several group-less rows; those stay writable as long as the
//! write keeps their pair.
//!
//! Write transactions open with `BEGIN IMMEDIATE` so concurrent writers queue
//! on the busy timeout instead of failing on a lock upgrade.

use serde::Deserialize;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::db::RunPreference;
use crate::{Error, FieldErrors, Result};

/// Literal group value selecting group-less preferences
pub const NULL_GROUP_SENTINEL: &str = "null";

/// Message reported when the (user, group) pair is already taken
pub const DUPLICATE_PAIR_MESSAGE: &str =
    "UNIQUE constraint failed: run_preferences.user_id, run_preferences.group_id";

const INVALID_INTEGER: &str = "A valid integer is required.";

const BEGIN_WRITE: &str = "BEGIN IMMEDIATE";

/// Raw `user` / `group` filter parameters, exactly as the caller sent them
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PreferenceFilter {
    pub user: Option<String>,
    pub group: Option<String>,
}

/// One SQL restriction produced by [`PreferenceFilter::resolve`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    GroupIsNull,
    User(i64),
    Group(i64),
}

impl PreferenceFilter {
    pub fn new(user: Option<&str>, group: Option<&str>) -> Self {
        Self {
            user: user.map(str::to_string),
            group: group.map(str::to_string),
        }
    }

    /// Filter parameters carried in a structured (JSON) body.
    ///
    /// Numbers and strings are taken as given; `null` and other types count
    /// as unset.
    pub fn from_json(body: &Value) -> Self {
        fn param(value: Option<&Value>) -> Option<String> {
            match value? {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        }

        Self {
            user: param(body.get("user")),
            group: param(body.get("group")),
        }
    }

    /// Turn the raw parameters into SQL conditions
    pub fn resolve(&self) -> Result<Vec<Condition>> {
        let user = self.user.as_deref().filter(|s| !s.is_empty());
        let mut group = self.group.as_deref().filter(|s| !s.is_empty());
        let mut conditions = Vec::new();

        if group == Some(NULL_GROUP_SENTINEL) {
            group = None;
            conditions.push(Condition::GroupIsNull);
        }

        let mut errors = FieldErrors::new();
        let user_id = user.and_then(|raw| parse_id(raw, "user", &mut errors));
        let group_id = group.and_then(|raw| parse_id(raw, "group", &mut errors));
        if !errors.is_empty() {
            return Err(Error::Validation(errors));
        }

        match (user_id, group_id) {
            (Some(user_id), Some(group_id)) => {
                conditions.push(Condition::User(user_id));
                conditions.push(Condition::Group(group_id));
            }
            (Some(user_id), None) => {
                conditions.push(Condition::User(user_id));
                conditions.push(Condition::GroupIsNull);
            }
            (None, Some(group_id)) => {
                conditions.push(Condition::Group(group_id));
            }
            (None, None) => {}
        }

        debug!("Resolved preference filter {:?} -> {:?}", self, conditions);
        Ok(conditions)
    }
}

fn parse_id(raw: &str, field: &str, errors: &mut FieldErrors) -> Option<i64> {
    match raw.trim().parse::<i64>() {
        Ok(id) => Some(id),
        Err(_) => {
            errors
                .entry(field.to_string())
                .or_default()
                .push(INVALID_INTEGER.to_string());
            None
        }
    }
}

fn select_with(conditions: &[Condition]) -> QueryBuilder<'static, Sqlite> {
    let mut builder =
        QueryBuilder::new("SELECT id, user_id, group_id, scores FROM run_preferences WHERE 1 = 1");

    for condition in conditions {
        match *condition {
            Condition::GroupIsNull => {
                builder.push(" AND group_id IS NULL");
            }
            Condition::User(id) => {
                builder.push(" AND user_id = ").push_bind(id);
            }
            Condition::Group(id) => {
                builder.push(" AND group_id = ").push_bind(id);
            }
        }
    }

    builder
}

/// Preferences matching every condition, ordered by id
pub async fn list(pool: &SqlitePool, conditions: &[Condition]) -> Result<Vec<RunPreference>> {
    let mut builder = select_with(conditions);
    builder.push(" ORDER BY id");

    let rows = builder
        .build_query_as::<RunPreference>()
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// One preference, looked up inside the filtered set
pub async fn get(
    pool: &SqlitePool,
    id: i64,
    conditions: &[Condition],
) -> Result<Option<RunPreference>> {
    let mut conn = pool.acquire().await?;
    get_in(&mut conn, id, conditions).await
}

async fn get_in(
    conn: &mut SqliteConnection,
    id: i64,
    conditions: &[Condition],
) -> Result<Option<RunPreference>> {
    let mut builder = select_with(conditions);
    builder.push(" AND id = ").push_bind(id);

    let row = builder
        .build_query_as::<RunPreference>()
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row)
}

/// Validated fields of a create/update body.
///
/// `group_id` is `Some(None)` for an explicit `null`, `None` when absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreferenceChanges {
    pub user_id: Option<i64>,
    pub group_id: Option<Option<i64>>,
    pub scores: Option<Value>,
}

impl PreferenceChanges {
    /// Parse a JSON body. With `partial == false` every field is required
    /// (`group` may be `null` but must be present).
    pub fn from_json(body: &Value, partial: bool) -> Result<Self> {
        let Some(object) = body.as_object() else {
            return Err(Error::field(
                "non_field_errors",
                "Invalid data. Expected a dictionary.",
            ));
        };

        let mut errors = FieldErrors::new();
        let mut changes = PreferenceChanges::default();

        let required = |field: &str, errors: &mut FieldErrors| {
            if !partial {
                errors
                    .entry(field.to_string())
                    .or_default()
                    .push("This field is required.".to_string());
            }
        };

        match object.get("user") {
            None => required("user", &mut errors),
            Some(Value::Null) => {
                errors.insert("user".to_string(), vec!["This field may not be null.".to_string()]);
            }
            Some(value) => match pk_value(value) {
                Ok(id) => changes.user_id = Some(id),
                Err(message) => {
                    errors.insert("user".to_string(), vec![message]);
                }
            },
        }

        match object.get("group") {
            None => required("group", &mut errors),
            Some(Value::Null) => changes.group_id = Some(None),
            Some(value) => match pk_value(value) {
                Ok(id) => changes.group_id = Some(Some(id)),
                Err(message) => {
                    errors.insert("group".to_string(), vec![message]);
                }
            },
        }

        match object.get("scores") {
            None => required("scores", &mut errors),
            Some(Value::Null) => {
                errors.insert(
                    "scores".to_string(),
                    vec!["This field may not be null.".to_string()],
                );
            }
            Some(value) => changes.scores = Some(value.clone()),
        }

        if errors.is_empty() {
            Ok(changes)
        } else {
            Err(Error::Validation(errors))
        }
    }
}

/// Primary key as integer or digit string
fn pk_value(value: &Value) -> std::result::Result<i64, String> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| format!("Incorrect type. Expected pk value, received {}.", n)),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| "Incorrect type. Expected pk value, received str.".to_string()),
        Value::Bool(_) => Err("Incorrect type. Expected pk value, received bool.".to_string()),
        Value::Array(_) => Err("Incorrect type. Expected pk value, received list.".to_string()),
        _ => Err("Incorrect type. Expected pk value, received dict.".to_string()),
    }
}

/// Check that the referenced user and group exist
async fn check_references(
    conn: &mut SqliteConnection,
    user_id: i64,
    group_id: Option<i64>,
) -> Result<()> {
    let mut errors = FieldErrors::new();

    let user: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;
    if user.is_none() {
        errors.insert(
            "user".to_string(),
            vec![format!("Invalid pk \"{}\" - object does not exist.", user_id)],
        );
    }

    if let Some(group_id) = group_id {
        let group: Option<i64> = sqlx::query_scalar("SELECT id FROM groups WHERE id = ?")
            .bind(group_id)
            .fetch_optional(&mut *conn)
            .await?;
        if group.is_none() {
            errors.insert(
                "group".to_string(),
                vec![format!("Invalid pk \"{}\" - object does not exist.", group_id)],
            );
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(errors))
    }
}

/// Create a preference.
///
/// The insert is conditional on no row holding the same (user, group) pair,
/// evaluated by the store in the same statement.
pub async fn create(pool: &SqlitePool, changes: PreferenceChanges) -> Result<RunPreference> {
    let mut errors = FieldErrors::new();
    if changes.user_id.is_none() {
        errors.insert("user".to_string(), vec!["This field is required.".to_string()]);
    }
    if changes.group_id.is_none() {
        errors.insert("group".to_string(), vec!["This field is required.".to_string()]);
    }
    if changes.scores.is_none() {
        errors.insert("scores".to_string(), vec!["This field is required.".to_string()]);
    }
    let (Some(user_id), Some(group_id), Some(scores)) =
        (changes.user_id, changes.group_id, changes.scores)
    else {
        return Err(Error::Validation(errors));
    };

    let mut tx = pool.begin_with(BEGIN_WRITE).await?;
    check_references(&mut tx, user_id, group_id).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO run_preferences (user_id, group_id, scores)
        SELECT ?, ?, ?
        WHERE NOT EXISTS (
            SELECT 1 FROM run_preferences WHERE user_id = ? AND group_id IS ?
        )
        "#,
    )
    .bind(user_id)
    .bind(group_id)
    .bind(Json(&scores))
    .bind(user_id)
    .bind(group_id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::Constraint(DUPLICATE_PAIR_MESSAGE.to_string()));
    }

    let id = result.last_insert_rowid();
    let created = get_in(&mut tx, id, &[])
        .await?
        .ok_or_else(|| Error::Internal(format!("preference {} vanished after insert", id)))?;
    tx.commit().await?;

    info!(
        "Created preference {} (user {}, group {:?})",
        id, user_id, group_id
    );
    Ok(created)
}

/// Update a preference found inside the filtered set.
///
/// Fields absent from `changes` keep their stored value (partial update).
/// Moving a preference onto a (user, group) pair another row already holds
/// fails with [`Error::Constraint`]. Writes that keep the stored pair always
/// go through.
pub async fn update(
    pool: &SqlitePool,
    id: i64,
    conditions: &[Condition],
    changes: PreferenceChanges,
) -> Result<RunPreference> {
    let mut tx = pool.begin_with(BEGIN_WRITE).await?;

    let current = get_in(&mut tx, id, conditions)
        .await?
        .ok_or_else(|| Error::NotFound(format!("preference {}", id)))?;

    let user_id = changes.user_id.unwrap_or(current.user_id);
    let group_id = changes.group_id.unwrap_or(current.group_id);
    let scores = changes.scores.unwrap_or(current.scores);

    check_references(&mut tx, user_id, group_id).await?;

    // keeping the pair never creates a duplicate
    let keeps_pair = user_id == current.user_id && group_id == current.group_id;

    let result = sqlx::query(
        r#"
        UPDATE run_preferences
        SET user_id = ?, group_id = ?, scores = ?
        WHERE id = ?
          AND (? OR NOT EXISTS (
            SELECT 1 FROM run_preferences
            WHERE user_id = ? AND group_id IS ? AND id != ?
          ))
        "#,
    )
    .bind(user_id)
    .bind(group_id)
    .bind(Json(&scores))
    .bind(id)
    .bind(keeps_pair)
    .bind(user_id)
    .bind(group_id)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::Constraint(DUPLICATE_PAIR_MESSAGE.to_string()));
    }

    tx.commit().await?;

    info!("Updated preference {}", id);
    Ok(RunPreference {
        id,
        user_id,
        group_id,
        scores,
    })
}

/// Delete a preference found inside the filtered set
pub async fn delete(pool: &SqlitePool, id: i64, conditions: &[Condition]) -> Result<()> {
    let mut tx = pool.begin_with(BEGIN_WRITE).await?;

    if get_in(&mut tx, id, conditions).await?.is_none() {
        return Err(Error::NotFound(format!("preference {}", id)));
    }

    sqlx::query("DELETE FROM run_preferences WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!("Deleted preference {}", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(user: Option<&str>, group: Option<&str>) -> Vec<Condition> {
        PreferenceFilter::new(user, group).resolve().unwrap()
    }

    #[test]
    fn test_resolve_no_filters() {
        assert!(filter(None, None).is_empty());
        assert!(filter(Some(""), Some("")).is_empty());
    }

    #[test]
    fn test_resolve_user_only() {
        assert_eq!(
            filter(Some("4"), None),
            vec![Condition::User(4), Condition::GroupIsNull]
        );
    }

    #[test]
    fn test_resolve_null_sentinel_keeps_both_paths() {
        assert_eq!(
            filter(Some("4"), Some("null")),
            vec![Condition::GroupIsNull, Condition::User(4), Condition::GroupIsNull]
        );
    }

    #[test]
    fn test_resolve_null_sentinel_alone() {
        assert_eq!(filter(None, Some("null")), vec![Condition::GroupIsNull]);
    }

    #[test]
    fn test_resolve_group_only_and_pair() {
        assert_eq!(filter(None, Some("9")), vec![Condition::Group(9)]);
        assert_eq!(
            filter(Some("4"), Some("9")),
            vec![Condition::User(4), Condition::Group(9)]
        );
    }

    #[test]
    fn test_resolve_rejects_non_integer() {
        let err = PreferenceFilter::new(Some("alice"), Some("x")).resolve().unwrap_err();
        match err {
            Error::Validation(errors) => {
                assert!(errors.contains_key("user"));
                assert!(errors.contains_key("group"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_filter_from_json_body() {
        let body = serde_json::json!({"user": 3, "group": null, "scores": {}});
        assert_eq!(
            PreferenceFilter::from_json(&body),
            PreferenceFilter::new(Some("3"), None)
        );

        let body = serde_json::json!({"user": "3", "group": "null"});
        assert_eq!(
            PreferenceFilter::from_json(&body),
            PreferenceFilter::new(Some("3"), Some("null"))
        );
    }

    #[test]
    fn test_changes_full_requires_every_field() {
        let err = PreferenceChanges::from_json(&serde_json::json!({}), false).unwrap_err();
        match err {
            Error::Validation(errors) => {
                assert_eq!(errors.len(), 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_changes_group_null_vs_absent() {
        let explicit =
            PreferenceChanges::from_json(&serde_json::json!({"group": null}), true).unwrap();
        assert_eq!(explicit.group_id, Some(None));

        let absent = PreferenceChanges::from_json(&serde_json::json!({}), true).unwrap();
        assert_eq!(absent.group_id, None);
    }

    #[test]
    fn test_changes_reject_bad_types() {
        let body = serde_json::json!({"user": true, "group": [1], "scores": null});
        match PreferenceChanges::from_json(&body, false).unwrap_err() {
            Error::Validation(errors) => {
                assert!(errors["user"][0].contains("received bool"));
                assert!(errors["group"][0].contains("received list"));
                assert_eq!(errors["scores"], vec!["This field may not be null.".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    mod store {
        use super::*;
        use crate::db::init_memory_database;
        use crate::groups::{create_group, delete_group};
        use crate::users::{create_user, delete_user, NewUser};
        use serde_json::json;

        struct Fixture {
            pool: SqlitePool,
            alice: i64,
            g1: i64,
            g2: i64,
            p1: i64,
            p2: i64,
            p3: i64,
        }

        async fn user(pool: &SqlitePool, username: &str) -> i64 {
            create_user(
                pool,
                NewUser {
                    username: username.to_string(),
                    password: "river-otter-42".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .id
        }

        fn changes(user: i64, group: Option<i64>, scores: Value) -> PreferenceChanges {
            PreferenceChanges {
                user_id: Some(user),
                group_id: Some(group),
                scores: Some(scores),
            }
        }

        /// P1 = (alice, none), P2 = (alice, G1), P3 = (bob, G1)
        async fn fixture() -> Fixture {
            let pool = init_memory_database().await.unwrap();
            let alice = user(&pool, "alice").await;
            let bob = user(&pool, "bob").await;
            let g1 = create_group(&pool, "G1").await.unwrap().id;
            let g2 = create_group(&pool, "G2").await.unwrap().id;

            let p1 = create(&pool, changes(alice, None, json!({"a": 1}))).await.unwrap().id;
            let p2 = create(&pool, changes(alice, Some(g1), json!({"a": 2}))).await.unwrap().id;
            let p3 = create(&pool, changes(bob, Some(g1), json!({"b": 3}))).await.unwrap().id;

            Fixture { pool, alice, g1, g2, p1, p2, p3 }
        }

        async fn ids(pool: &SqlitePool, user: Option<&str>, group: Option<&str>) -> Vec<i64> {
            let conditions = PreferenceFilter::new(user, group).resolve().unwrap();
            list(pool, &conditions).await.unwrap().into_iter().map(|p| p.id).collect()
        }

        #[tokio::test]
        async fn test_filter_combinations() {
            let f = fixture().await;
            let alice = f.alice.to_string();
            let g1 = f.g1.to_string();
            let g2 = f.g2.to_string();

            assert_eq!(ids(&f.pool, Some(&alice), Some(&g1)).await, vec![f.p2]);
            assert_eq!(ids(&f.pool, Some(&alice), None).await, vec![f.p1]);
            assert_eq!(ids(&f.pool, Some(&alice), Some("null")).await, vec![f.p1]);
            assert_eq!(ids(&f.pool, None, Some(&g1)).await, vec![f.p2, f.p3]);
            assert_eq!(ids(&f.pool, None, Some("null")).await, vec![f.p1]);
            assert_eq!(ids(&f.pool, None, None).await, vec![f.p1, f.p2, f.p3]);
            assert!(ids(&f.pool, None, Some(&g2)).await.is_empty());
        }

        #[tokio::test]
        async fn test_scores_stored_verbatim() {
            let f = fixture().await;
            let got = get(&f.pool, f.p2, &[]).await.unwrap().unwrap();
            assert_eq!(got.scores, json!({"a": 2}));
            assert_eq!(got.group_id, Some(f.g1));
        }

        #[tokio::test]
        async fn test_duplicate_pair_rejected() {
            let f = fixture().await;

            let err = create(&f.pool, changes(f.alice, Some(f.g1), json!({})))
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Constraint(ref m) if m == DUPLICATE_PAIR_MESSAGE));

            let err = create(&f.pool, changes(f.alice, None, json!({})))
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Constraint(_)));

            assert_eq!(list(&f.pool, &[]).await.unwrap().len(), 3);
        }

        #[tokio::test]
        async fn test_unknown_references_are_field_errors() {
            let f = fixture().await;
            match create(&f.pool, changes(999, Some(888), json!({}))).await.unwrap_err() {
                Error::Validation(errors) => {
                    assert_eq!(errors["user"], vec!["Invalid pk \"999\" - object does not exist.".to_string()]);
                    assert_eq!(errors["group"], vec!["Invalid pk \"888\" - object does not exist.".to_string()]);
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_group_deletion_keeps_preferences() {
            let f = fixture().await;
            delete_group(&f.pool, f.g1).await.unwrap();

            let p2 = get(&f.pool, f.p2, &[]).await.unwrap().unwrap();
            let p3 = get(&f.pool, f.p3, &[]).await.unwrap().unwrap();
            assert_eq!(p2.group_id, None);
            assert_eq!(p3.group_id, None);
            assert_eq!(list(&f.pool, &[]).await.unwrap().len(), 3);
        }

        #[tokio::test]
        async fn test_groupless_rows_left_by_group_deletion_stay_writable() {
            let f = fixture().await;
            delete_group(&f.pool, f.g1).await.unwrap();

            // alice now holds P1 and P2, both group-less
            let scores_only = PreferenceChanges {
                scores: Some(json!({"a": 10})),
                ..Default::default()
            };
            let updated = update(&f.pool, f.p1, &[], scores_only).await.unwrap();
            assert_eq!(updated.scores, json!({"a": 10}));

            let full = changes(f.alice, None, json!({"a": 22}));
            let updated = update(&f.pool, f.p2, &[], full).await.unwrap();
            assert_eq!(updated.group_id, None);
            assert_eq!(get(&f.pool, f.p2, &[]).await.unwrap().unwrap().scores, json!({"a": 22}));

            // a brand new group-less row for alice is still refused
            let err = create(&f.pool, changes(f.alice, None, json!({}))).await.unwrap_err();
            assert!(matches!(err, Error::Constraint(_)));

            // and so is moving another row onto the taken pair
            let err = update(&f.pool, f.p3, &[], changes(f.alice, None, json!({})))
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Constraint(_)));
        }

        #[tokio::test]
        async fn test_user_deletion_cascades() {
            let f = fixture().await;
            delete_user(&f.pool, f.alice).await.unwrap();

            let remaining: Vec<i64> = list(&f.pool, &[]).await.unwrap().into_iter().map(|p| p.id).collect();
            assert_eq!(remaining, vec![f.p3]);
        }

        #[tokio::test]
        async fn test_partial_update_and_conflict() {
            let f = fixture().await;

            let updated = update(
                &f.pool,
                f.p2,
                &[],
                PreferenceChanges {
                    scores: Some(json!({"a": 20})),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
            assert_eq!(updated.group_id, Some(f.g1));
            assert_eq!(updated.scores, json!({"a": 20}));

            // moving P2 onto alice's group-less slot collides with P1
            let err = update(
                &f.pool,
                f.p2,
                &[],
                PreferenceChanges {
                    group_id: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
            assert!(matches!(err, Error::Constraint(_)));

            let moved = update(&f.pool, f.p2, &[], changes(f.alice, Some(f.g2), json!({})))
                .await
                .unwrap();
            assert_eq!(moved.group_id, Some(f.g2));
        }

        #[tokio::test]
        async fn test_item_ops_respect_filter() {
            let f = fixture().await;
            let only_alice_groupless = PreferenceFilter::new(Some(&f.alice.to_string()), None)
                .resolve()
                .unwrap();

            assert!(get(&f.pool, f.p3, &only_alice_groupless).await.unwrap().is_none());
            assert!(matches!(
                delete(&f.pool, f.p3, &only_alice_groupless).await,
                Err(Error::NotFound(_))
            ));

            delete(&f.pool, f.p1, &only_alice_groupless).await.unwrap();
            assert!(get(&f.pool, f.p1, &[]).await.unwrap().is_none());
        }
    }
}

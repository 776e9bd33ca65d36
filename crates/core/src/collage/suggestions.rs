//! Per-user collage suggestions and name autocomplete.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use rusqlite::{params_from_iter, types::Value, Connection};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::manager::CollageManager;
use super::{AutocompleteEntry, CollageCategory, CollageError, CollageName};
use crate::cache;
use crate::metrics;
use crate::query::{Filter, Membership, Predicate};

const SUGGESTION_TTL: Duration = Duration::from_secs(86_400);
const SUGGESTION_LIMIT: u32 = 5;

const AUTOCOMPLETE_MIN: usize = 3;
const AUTOCOMPLETE_MAX: usize = 10;
const AUTOCOMPLETE_LIMIT: u32 = 10;

fn suggestion_key(membership: Membership, user_id: u32) -> String {
    match membership {
        Membership::Artist => format!("collage_default_artist_{}", user_id),
        Membership::Group => format!("collage_default_group_{}", user_id),
    }
}

fn kind_label(membership: Membership) -> &'static str {
    match membership {
        Membership::Artist => "artist",
        Membership::Group => "group",
    }
}

/// Cached suggestions remember which entity they were computed for.
#[derive(Debug, Serialize, Deserialize)]
struct CachedSuggestions {
    target: u32,
    collages: Vec<CollageName>,
}

impl CollageManager {
    /// Collages a new artist probably belongs in: the user's own artist
    /// collages, then other artist collages the user recently added to.
    pub fn suggest_artist_collages(
        &self,
        user_id: u32,
        artist_id: u32,
    ) -> Result<Vec<CollageName>, CollageError> {
        self.suggest(Membership::Artist, user_id, artist_id)
    }

    /// Collages a new release group probably belongs in: the user's
    /// personal collages, then non-personal collages the user recently added to.
    pub fn suggest_group_collages(
        &self,
        user_id: u32,
        group_id: u32,
    ) -> Result<Vec<CollageName>, CollageError> {
        self.suggest(Membership::Group, user_id, group_id)
    }

    pub fn flush_artist_suggestions(&self, user_id: u32) {
        self.cache.delete(&suggestion_key(Membership::Artist, user_id));
    }

    pub fn flush_group_suggestions(&self, user_id: u32) {
        self.cache.delete(&suggestion_key(Membership::Group, user_id));
    }

    fn suggest(
        &self,
        membership: Membership,
        user_id: u32,
        target: u32,
    ) -> Result<Vec<CollageName>, CollageError> {
        let key = suggestion_key(membership, user_id);
        let kind = kind_label(membership);

        if let Some(cached) = cache::fetch::<CachedSuggestions>(self.cache.as_ref(), &key) {
            if cached.target == target {
                metrics::SUGGESTION_CACHE_LOOKUPS
                    .with_label_values(&[kind, "hit"])
                    .inc();
                debug!(user_id, target, kind, "Suggestion cache hit");
                return Ok(cached.collages);
            }
        }
        metrics::SUGGESTION_CACHE_LOOKUPS
            .with_label_values(&[kind, "miss"])
            .inc();
        debug!(user_id, target, kind, "Suggestion cache miss");

        let collages = {
            let conn = self.db.lock()?;
            let owned = owned_candidates(&conn, membership, user_id, target)?;
            let contributed = contributed_candidates(&conn, membership, user_id, target)?;

            let mut seen = HashSet::new();
            let merged: Vec<u32> = owned
                .into_iter()
                .chain(contributed)
                .filter(|id| seen.insert(*id))
                .collect();
            ids_to_names(&conn, &merged)?
        };

        cache::store(
            self.cache.as_ref(),
            &key,
            &CachedSuggestions {
                target,
                collages: collages.clone(),
            },
            SUGGESTION_TTL,
        );
        Ok(collages)
    }

    /// Case-insensitive name search over browsable collages.
    ///
    /// The stem is the first 3..=10 characters of `text`; shorter input
    /// returns nothing. Longer stems are more selective and stay cached longer.
    pub fn autocomplete(&self, text: &str) -> Result<Vec<AutocompleteEntry>, CollageError> {
        let length = text.chars().count().clamp(1, AUTOCOMPLETE_MAX);
        if length < AUTOCOMPLETE_MIN {
            return Ok(Vec::new());
        }
        let stem = text.chars().take(length).collect::<String>().to_lowercase();
        let key = format!("autocomplete_collage_{}_{}", length, stem);

        if let Some(entries) = cache::fetch::<Vec<AutocompleteEntry>>(self.cache.as_ref(), &key) {
            metrics::AUTOCOMPLETE_CACHE_LOOKUPS
                .with_label_values(&["hit"])
                .inc();
            return Ok(entries);
        }
        metrics::AUTOCOMPLETE_CACHE_LOOKUPS
            .with_label_values(&["miss"])
            .inc();

        let entries = {
            let conn = self.db.lock()?;
            let (clause, mut values) = Filter::and(vec![
                Predicate::Unlocked,
                Predicate::NotDeleted,
                Predicate::NotInCategories(vec![CollageCategory::Artists, CollageCategory::Personal]),
                Predicate::NameContains(stem.clone()),
            ])
            .where_clause();
            values.push(Value::Integer(i64::from(AUTOCOMPLETE_LIMIT)));
            let sql = format!(
                "SELECT c.id, c.name FROM collages c {} ORDER BY c.num_torrents DESC, c.name LIMIT ?",
                clause
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
                Ok(AutocompleteEntry {
                    id: row.get(0)?,
                    label: row.get(1)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        let ttl = 1800 + 7200 * (AUTOCOMPLETE_MAX - length) as u64;
        cache::store(self.cache.as_ref(), &key, &entries, Duration::from_secs(ttl));
        Ok(entries)
    }
}

/// The user's own collages of the kind's home category.
fn owned_candidates(
    conn: &Connection,
    membership: Membership,
    user_id: u32,
    target: u32,
) -> rusqlite::Result<Vec<u32>> {
    let category = match membership {
        Membership::Artist => CollageCategory::Artists,
        Membership::Group => CollageCategory::Personal,
    };
    let (clause, mut values) = Filter::and(vec![
        Predicate::Unlocked,
        Predicate::NotDeleted,
        Predicate::OwnedBy(user_id),
        Predicate::Category(category),
        Predicate::Lacks(membership, target),
    ])
    .where_clause();
    values.push(Value::Integer(i64::from(SUGGESTION_LIMIT)));

    let sql = format!(
        "SELECT c.id FROM collages c {} ORDER BY c.updated DESC, c.id DESC LIMIT ?",
        clause
    );
    collect_ids(conn, &sql, values)
}

/// Collages the user recently added entries to, most recent contribution first.
fn contributed_candidates(
    conn: &Connection,
    membership: Membership,
    user_id: u32,
    target: u32,
) -> rusqlite::Result<Vec<u32>> {
    let mut filter = Filter::and(vec![Predicate::Unlocked, Predicate::NotDeleted]);
    filter = match membership {
        Membership::Artist => filter
            .with(Predicate::NotOwnedBy(user_id))
            .with(Predicate::Category(CollageCategory::Artists)),
        Membership::Group => filter.with(Predicate::NotCategory(CollageCategory::Personal)),
    };
    let (clause, filter_values) = filter.with(Predicate::Lacks(membership, target)).where_clause();

    let alias = membership.alias();
    let sql = format!(
        "SELECT c.id FROM collages c
         INNER JOIN {table} {alias} ON ({alias}.collage_id = c.id AND {alias}.user_id = ?)
         {clause}
         GROUP BY c.id
         ORDER BY max({alias}.added_on) DESC, c.id DESC
         LIMIT ?",
        table = membership.table(),
        alias = alias,
        clause = clause,
    );

    let mut values = vec![Value::Integer(i64::from(user_id))];
    values.extend(filter_values);
    values.push(Value::Integer(i64::from(SUGGESTION_LIMIT)));
    collect_ids(conn, &sql, values)
}

fn collect_ids(conn: &Connection, sql: &str, values: Vec<Value>) -> rusqlite::Result<Vec<u32>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), |row| row.get(0))?;
    rows.collect()
}

/// Resolve names, keeping the order of `ids`.
fn ids_to_names(conn: &Connection, ids: &[u32]) -> rusqlite::Result<Vec<CollageName>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let (clause, values) = Filter::and(vec![Predicate::IdIn(ids.to_vec())]).where_clause();
    let sql = format!("SELECT c.id, c.name FROM collages c {}", clause);
    let mut stmt = conn.prepare(&sql)?;
    let names: HashMap<u32, String> = stmt
        .query_map(params_from_iter(values.iter()), |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .collect::<Result<_, _>>()?;

    Ok(ids
        .iter()
        .filter_map(|id| {
            names.get(id).map(|name| CollageName {
                id: *id,
                name: name.clone(),
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cache::{Cache, MemoryCache};
    use crate::db::Database;
    use crate::testing::fixtures::{self, at, CollageSeed};

    struct Setup {
        db: Database,
        cache: Arc<MemoryCache>,
        manager: CollageManager,
        user: u32,
        other: u32,
    }

    fn setup() -> Setup {
        let db = Database::in_memory().unwrap();
        let cache = Arc::new(MemoryCache::new());
        let manager = CollageManager::new(db.clone(), cache.clone());
        let user = fixtures::seed_user(&db, "alice", 100, &[]);
        let other = fixtures::seed_user(&db, "bob", 100, &[]);
        Setup {
            db,
            cache,
            manager,
            user,
            other,
        }
    }

    fn ids(list: &[CollageName]) -> Vec<u32> {
        list.iter().map(|c| c.id).collect()
    }

    #[test]
    fn test_artist_owned_then_contributed() {
        let s = setup();
        let artist = fixtures::seed_artist(&s.db, "Slowdive");
        let other_artist = fixtures::seed_artist(&s.db, "Ride");

        let own_old = fixtures::seed_collage(
            &s.db,
            CollageSeed::new(s.user, CollageCategory::Artists, "Mine old").updated_at(at(10)),
        );
        let own_new = fixtures::seed_collage(
            &s.db,
            CollageSeed::new(s.user, CollageCategory::Artists, "Mine new").updated_at(at(20)),
        );
        let theirs_a = fixtures::seed_collage(
            &s.db,
            CollageSeed::new(s.other, CollageCategory::Artists, "Theirs A").updated_at(at(30)),
        );
        let theirs_b = fixtures::seed_collage(
            &s.db,
            CollageSeed::new(s.other, CollageCategory::Artists, "Theirs B").updated_at(at(5)),
        );
        fixtures::seed_member(&s.db, Membership::Artist, theirs_a, other_artist, s.user, at(100));
        fixtures::seed_member(&s.db, Membership::Artist, theirs_b, other_artist, s.user, at(200));

        let list = s.manager.suggest_artist_collages(s.user, artist).unwrap();
        assert_eq!(ids(&list), vec![own_new, own_old, theirs_b, theirs_a]);
        assert_eq!(list[0].name, "Mine new");
    }

    #[test]
    fn test_artist_excludes_collages_with_target() {
        let s = setup();
        let artist = fixtures::seed_artist(&s.db, "Slowdive");
        let has_it = fixtures::seed_collage(
            &s.db,
            CollageSeed::new(s.user, CollageCategory::Artists, "Has it"),
        );
        let lacks_it = fixtures::seed_collage(
            &s.db,
            CollageSeed::new(s.user, CollageCategory::Artists, "Lacks it"),
        );
        fixtures::seed_member(&s.db, Membership::Artist, has_it, artist, s.other, at(1));

        let list = s.manager.suggest_artist_collages(s.user, artist).unwrap();
        assert_eq!(ids(&list), vec![lacks_it]);
    }

    #[test]
    fn test_artist_skips_locked_deleted_and_other_categories() {
        let s = setup();
        let artist = fixtures::seed_artist(&s.db, "Slowdive");
        fixtures::seed_collage(
            &s.db,
            CollageSeed::new(s.user, CollageCategory::Artists, "Locked").locked(),
        );
        fixtures::seed_collage(
            &s.db,
            CollageSeed::new(s.user, CollageCategory::Artists, "Deleted").deleted(),
        );
        fixtures::seed_collage(&s.db, CollageSeed::new(s.user, CollageCategory::Theme, "Theme"));

        assert!(s.manager.suggest_artist_collages(s.user, artist).unwrap().is_empty());
    }

    #[test]
    fn test_artist_contributed_excludes_own_collages() {
        let s = setup();
        let artist = fixtures::seed_artist(&s.db, "Slowdive");
        let other_artist = fixtures::seed_artist(&s.db, "Ride");
        let own = fixtures::seed_collage(
            &s.db,
            CollageSeed::new(s.user, CollageCategory::Artists, "Mine").updated_at(at(1)),
        );
        fixtures::seed_member(&s.db, Membership::Artist, own, other_artist, s.user, at(50));

        // Listed once, from the owned query
        let list = s.manager.suggest_artist_collages(s.user, artist).unwrap();
        assert_eq!(ids(&list), vec![own]);
    }

    #[test]
    fn test_each_source_is_capped_at_five() {
        let s = setup();
        let artist = fixtures::seed_artist(&s.db, "Slowdive");
        let other_artist = fixtures::seed_artist(&s.db, "Ride");
        for i in 0..7 {
            fixtures::seed_collage(
                &s.db,
                CollageSeed::new(s.user, CollageCategory::Artists, &format!("Mine {}", i))
                    .updated_at(at(i)),
            );
            let theirs = fixtures::seed_collage(
                &s.db,
                CollageSeed::new(s.other, CollageCategory::Artists, &format!("Theirs {}", i)),
            );
            fixtures::seed_member(&s.db, Membership::Artist, theirs, other_artist, s.user, at(i));
        }

        let list = s.manager.suggest_artist_collages(s.user, artist).unwrap();
        assert_eq!(list.len(), 10);
        assert_eq!(list[0].name, "Mine 6");
        assert_eq!(list[4].name, "Mine 2");
        assert_eq!(list[5].name, "Theirs 6");
    }

    #[test]
    fn test_group_personal_then_contributed() {
        let s = setup();
        let group = fixtures::seed_group(&s.db, "Souvlaki");
        let other_group = fixtures::seed_group(&s.db, "Nowhere");

        let personal = fixtures::seed_collage(
            &s.db,
            CollageSeed::new(s.user, CollageCategory::Personal, "alice's personal collage"),
        );
        // Own non-personal collage reached through contributions
        let own_theme = fixtures::seed_collage(
            &s.db,
            CollageSeed::new(s.user, CollageCategory::Theme, "Own theme"),
        );
        let label = fixtures::seed_collage(
            &s.db,
            CollageSeed::new(s.other, CollageCategory::Label, "Creation"),
        );
        let others_personal = fixtures::seed_collage(
            &s.db,
            CollageSeed::new(s.other, CollageCategory::Personal, "bob's personal collage"),
        );
        fixtures::seed_member(&s.db, Membership::Group, own_theme, other_group, s.user, at(5));
        fixtures::seed_member(&s.db, Membership::Group, label, other_group, s.user, at(9));
        fixtures::seed_member(&s.db, Membership::Group, others_personal, other_group, s.user, at(20));

        let list = s.manager.suggest_group_collages(s.user, group).unwrap();
        assert_eq!(ids(&list), vec![personal, label, own_theme]);
    }

    #[test]
    fn test_group_with_no_candidates_is_empty() {
        let s = setup();
        let group = fixtures::seed_group(&s.db, "Souvlaki");
        assert!(s.manager.suggest_group_collages(s.user, group).unwrap().is_empty());
        // Empty results are cached as well
        assert!(s.cache.ttl_remaining(&format!("collage_default_group_{}", s.user)).is_some());
    }

    #[test]
    fn test_cached_until_flushed() {
        let s = setup();
        let artist = fixtures::seed_artist(&s.db, "Slowdive");
        let first = fixtures::seed_collage(
            &s.db,
            CollageSeed::new(s.user, CollageCategory::Artists, "First"),
        );
        let before = s.manager.suggest_artist_collages(s.user, artist).unwrap();
        assert_eq!(ids(&before), vec![first]);

        fixtures::seed_collage(
            &s.db,
            CollageSeed::new(s.user, CollageCategory::Artists, "Second").updated_at(at(999)),
        );
        let again = s.manager.suggest_artist_collages(s.user, artist).unwrap();
        assert_eq!(again, before);

        s.manager.flush_artist_suggestions(s.user);
        let after = s.manager.suggest_artist_collages(s.user, artist).unwrap();
        assert_eq!(after.len(), 2);
        assert_eq!(after[0].name, "Second");
    }

    #[test]
    fn test_cache_entry_and_ttl() {
        let s = setup();
        let artist = fixtures::seed_artist(&s.db, "Slowdive");
        s.manager.suggest_artist_collages(s.user, artist).unwrap();
        let key = format!("collage_default_artist_{}", s.user);
        let ttl = s.cache.ttl_remaining(&key).unwrap();
        assert!(ttl > Duration::from_secs(86_000));
        assert!(ttl <= SUGGESTION_TTL);

        s.manager.flush_group_suggestions(s.user);
        assert!(s.cache.get(&key).is_some());
        s.manager.flush_artist_suggestions(s.user);
        assert!(s.cache.get(&key).is_none());
    }

    #[test]
    fn test_different_target_recomputes() {
        let s = setup();
        let a = fixtures::seed_artist(&s.db, "Slowdive");
        let b = fixtures::seed_artist(&s.db, "Ride");
        let collage = fixtures::seed_collage(
            &s.db,
            CollageSeed::new(s.user, CollageCategory::Artists, "Shoegaze"),
        );
        fixtures::seed_member(&s.db, Membership::Artist, collage, b, s.other, at(1));

        assert_eq!(ids(&s.manager.suggest_artist_collages(s.user, a).unwrap()), vec![collage]);
        assert!(s.manager.suggest_artist_collages(s.user, b).unwrap().is_empty());
    }

    #[test]
    fn test_add_artist_flushes_adding_user() {
        let s = setup();
        let artist = fixtures::seed_artist(&s.db, "Slowdive");
        let other_artist = fixtures::seed_artist(&s.db, "Ride");
        let collage = fixtures::seed_collage(
            &s.db,
            CollageSeed::new(s.other, CollageCategory::Artists, "Shoegaze"),
        );
        assert!(s.manager.suggest_artist_collages(s.user, artist).unwrap().is_empty());

        s.manager.add_artist(collage, other_artist, s.user).unwrap();
        let list = s.manager.suggest_artist_collages(s.user, artist).unwrap();
        assert_eq!(ids(&list), vec![collage]);
    }

    #[test]
    fn test_autocomplete_short_input_is_empty() {
        let s = setup();
        fixtures::seed_collage(&s.db, CollageSeed::new(s.user, CollageCategory::Theme, "ab"));
        assert!(s.manager.autocomplete("").unwrap().is_empty());
        assert!(s.manager.autocomplete("ab").unwrap().is_empty());
        assert!(s.cache.is_empty());
    }

    #[test]
    fn test_autocomplete_matches_and_orders() {
        let s = setup();
        let small = fixtures::seed_collage(
            &s.db,
            CollageSeed::new(s.user, CollageCategory::Theme, "Dream Pop B").num_torrents(3),
        );
        let big = fixtures::seed_collage(
            &s.db,
            CollageSeed::new(s.user, CollageCategory::Label, "4AD dream pop").num_torrents(40),
        );
        let tie = fixtures::seed_collage(
            &s.db,
            CollageSeed::new(s.user, CollageCategory::Theme, "Dream Pop A").num_torrents(3),
        );
        fixtures::seed_collage(
            &s.db,
            CollageSeed::new(s.user, CollageCategory::Artists, "Dream pop artists"),
        );
        fixtures::seed_collage(
            &s.db,
            CollageSeed::new(s.user, CollageCategory::Personal, "My dream pop"),
        );
        fixtures::seed_collage(
            &s.db,
            CollageSeed::new(s.user, CollageCategory::Theme, "Dream pop locked").locked(),
        );

        let entries = s.manager.autocomplete("DREAM").unwrap();
        let found: Vec<u32> = entries.iter().map(|e| e.id).collect();
        assert_eq!(found, vec![big, tie, small]);
        assert_eq!(entries[0].label, "4AD dream pop");
    }

    #[test]
    fn test_autocomplete_stem_caps_at_ten_chars() {
        let s = setup();
        fixtures::seed_collage(
            &s.db,
            CollageSeed::new(s.user, CollageCategory::Theme, "Shoegazers united"),
        );
        let entries = s.manager.autocomplete("shoegazers unite and more").unwrap();
        assert_eq!(entries.len(), 1);

        let key = "autocomplete_collage_10_shoegazers";
        let ttl = s.cache.ttl_remaining(key).unwrap();
        assert!(ttl <= Duration::from_secs(1800));
        assert!(ttl > Duration::from_secs(1700));
    }

    #[test]
    fn test_autocomplete_ttl_scales_with_length() {
        let s = setup();
        s.manager.autocomplete("abc").unwrap();
        let ttl = s.cache.ttl_remaining("autocomplete_collage_3_abc").unwrap();
        assert!(ttl > Duration::from_secs(1800 + 7200 * 7 - 100));
    }

    #[test]
    fn test_autocomplete_uses_cache() {
        let s = setup();
        fixtures::seed_collage(&s.db, CollageSeed::new(s.user, CollageCategory::Theme, "Krautrock"));
        assert_eq!(s.manager.autocomplete("kraut").unwrap().len(), 1);
        fixtures::seed_collage(
            &s.db,
            CollageSeed::new(s.user, CollageCategory::Theme, "Krautrock II"),
        );
        assert_eq!(s.manager.autocomplete("kraut").unwrap().len(), 1);
        assert_eq!(s.manager.autocomplete("krautr").unwrap().len(), 2);
    }

    #[test]
    fn test_autocomplete_treats_wildcards_literally() {
        let s = setup();
        fixtures::seed_collage(&s.db, CollageSeed::new(s.user, CollageCategory::Theme, "100% Pure"));
        fixtures::seed_collage(&s.db, CollageSeed::new(s.user, CollageCategory::Theme, "1000 Pure"));
        let entries = s.manager.autocomplete("100%").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].label, "100% Pure");
    }
}

//! Aggregation run: folds pending log entries into the per-series cache.
//!
//! Per series, the cache is written before the consumed entries are deleted,
//! so a failure mid-run leaves entries for the next run (at-least-once).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex, MutexGuard};

use super::action::Action;
use crate::stores::{InteractionCache, InteractionLog, IpLocks, LogKey, Stores};

/// Outcome of one aggregation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessSummary {
    /// Log entries consumed.
    pub files: usize,
    /// Actions folded into the cache.
    pub actions: usize,
    /// Series whose cache was rewritten.
    pub series: usize,
    /// Entries dropped because their content could not be parsed.
    pub skipped_files: usize,
    /// IP locks released.
    pub unlocked_ips: usize,
}

impl fmt::Display for ProcessSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.files == 0 {
            return f.write_str("No logs to process.");
        }
        write!(
            f,
            "Processing complete. {} action(s) processed across {} log file(s).",
            self.actions, self.files
        )
    }
}

/// Runs the aggregation once.
pub async fn process_logs(
    log: &InteractionLog,
    cache: &InteractionCache,
    locks: &IpLocks,
) -> Result<ProcessSummary> {
    let pending = log.pending().await?;
    let mut summary = ProcessSummary::default();

    if pending.is_empty() {
        tracing::info!("no logs to process");
        return Ok(summary);
    }
    tracing::info!(files = pending.len(), "processing interaction logs");

    let mut by_series: BTreeMap<String, Vec<LogKey>> = BTreeMap::new();
    let mut ips = BTreeSet::new();
    for key in pending {
        if let Some(ip) = &key.client_ip {
            ips.insert(ip.clone());
        }
        by_series.entry(key.series_slug.clone()).or_default().push(key);
    }

    for (slug, keys) in by_series {
        let mut interactions = cache.load(&slug).await?;
        let mut actions = 0;

        for key in &keys {
            let Some(raw) = log.read(key).await? else {
                continue;
            };

            let entries: Vec<Value> = match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "dropping unparseable log entry");
                    summary.skipped_files += 1;
                    continue;
                }
            };

            for entry in entries {
                match serde_json::from_value::<Action>(entry) {
                    Ok(action) => {
                        interactions.apply(&action);
                        actions += 1;
                    }
                    Err(err) => {
                        tracing::warn!(key = %key, error = %err, "skipping unknown action");
                    }
                }
            }
        }

        interactions.finalize_ratings();
        cache.store(&slug, &interactions).await?;

        for key in &keys {
            log.remove(key).await?;
        }

        tracing::info!(series = %slug, files = keys.len(), actions, "series aggregated");
        summary.files += keys.len();
        summary.actions += actions;
        summary.series += 1;
    }

    for ip in &ips {
        match locks.release(ip).await {
            Ok(_) => summary.unlocked_ips += 1,
            Err(err) => tracing::warn!(ip = %ip, error = %err, "failed to release ip lock"),
        }
    }

    tracing::info!(
        files = summary.files,
        actions = summary.actions,
        unlocked_ips = summary.unlocked_ips,
        "log processing complete"
    );

    Ok(summary)
}

/// Serializes aggregation runs so the scheduler and manual triggers never overlap.
///
/// Other writers of the interaction cache take [`LogProcessor::exclusive`] so a
/// run cannot land between their load and store.
#[derive(Clone)]
pub struct LogProcessor {
    stores: Stores,
    lock_ttl_secs: u64,
    running: Arc<Mutex<()>>,
}

impl LogProcessor {
    pub fn new(stores: Stores, lock_ttl_secs: u64) -> Self {
        Self {
            stores,
            lock_ttl_secs,
            running: Arc::new(Mutex::new(())),
        }
    }

    /// Blocks aggregation runs until the guard is dropped.
    pub async fn exclusive(&self) -> MutexGuard<'_, ()> {
        self.running.lock().await
    }

    pub async fn run(&self) -> Result<ProcessSummary> {
        let _guard = self.exclusive().await;
        process_logs(
            &self.stores.interaction_log(),
            &self.stores.interaction_cache(),
            &self.stores.ip_locks(self.lock_ttl_secs),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interactions::{Comment, CommentTarget, Rating, SeriesInteractions};
    use crate::stores::{KvNamespace, KvPage, MemoryKvNamespace, MockKvNamespace};

    fn processor(stores: &Stores) -> LogProcessor {
        LogProcessor::new(stores.clone(), 300)
    }

    fn like(chapter: &str) -> Action {
        Action::Like {
            chapter: chapter.into(),
        }
    }

    fn comment(id: &str) -> Action {
        Action::AddComment {
            chapter: "1".into(),
            payload: Comment {
                id: id.into(),
                username: "Taiki".into(),
                avatar_url: "/img/profilpicture/Taiki.png".into(),
                comment: "!".into(),
                timestamp: 1_718_000_000_000,
                likes: 0,
            },
        }
    }

    #[tokio::test]
    async fn empty_log_is_a_noop() {
        let stores = Stores::in_memory();
        stores.cache.put("interactions:blue-box", "{\"1\":{\"likes\":2}}", None).await.unwrap();

        let summary = processor(&stores).run().await.unwrap();

        assert_eq!(summary, ProcessSummary::default());
        assert_eq!(summary.to_string(), "No logs to process.");
        assert_eq!(
            stores.cache.get("interactions:blue-box").await.unwrap().as_deref(),
            Some("{\"1\":{\"likes\":2}}")
        );
    }

    #[tokio::test]
    async fn folds_entries_per_series_and_consumes_them() {
        let stores = Stores::in_memory();
        let log = stores.interaction_log();
        log.append("blue-box", Some("1.1.1.1"), &[like("1"), like("1")]).await.unwrap();
        log.append(
            "blue-box",
            Some("2.2.2.2"),
            &[
                Action::Rate {
                    payload: Rating { value: 9.0 },
                },
                comment("1718000000000_abcdefg"),
            ],
        )
        .await
        .unwrap();
        log.append("dandadan", None, &[like("ep-S1-1")]).await.unwrap();

        let summary = processor(&stores).run().await.unwrap();

        assert_eq!(summary.files, 3);
        assert_eq!(summary.actions, 5);
        assert_eq!(summary.series, 2);
        assert_eq!(summary.unlocked_ips, 2);
        assert_eq!(
            summary.to_string(),
            "Processing complete. 5 action(s) processed across 3 log file(s)."
        );

        let blue_box = stores.interaction_cache().load("blue-box").await.unwrap();
        assert_eq!(blue_box.items["1"].likes, 2);
        assert_eq!(blue_box.items["1"].comments.as_ref().unwrap().len(), 1);
        let ratings = blue_box.stats.unwrap().ratings.unwrap();
        assert_eq!((ratings.count, ratings.average), (1, Some(9.0)));

        let dandadan = stores.interaction_cache().load("dandadan").await.unwrap();
        assert_eq!(dandadan.items["ep-S1-1"].likes, 1);

        assert!(log.pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn releases_locks_of_processed_ips_only() {
        let stores = Stores::in_memory();
        let locks = stores.ip_locks(300);
        locks.lock("1.1.1.1").await.unwrap();
        locks.lock("9.9.9.9").await.unwrap();
        stores
            .interaction_log()
            .append("blue-box", Some("1.1.1.1"), &[like("1")])
            .await
            .unwrap();

        processor(&stores).run().await.unwrap();

        assert!(!locks.is_locked("1.1.1.1").await.unwrap());
        assert!(locks.is_locked("9.9.9.9").await.unwrap());
    }

    #[tokio::test]
    async fn second_run_is_idempotent() {
        let stores = Stores::in_memory();
        stores
            .interaction_log()
            .append("blue-box", None, &[like("1"), comment("1718000000000_abcdefg")])
            .await
            .unwrap();

        let p = processor(&stores);
        p.run().await.unwrap();
        let after_first = stores.interaction_cache().load("blue-box").await.unwrap();

        let second = p.run().await.unwrap();

        assert_eq!(second.files, 0);
        assert_eq!(stores.interaction_cache().load("blue-box").await.unwrap(), after_first);
    }

    #[tokio::test]
    async fn folds_onto_existing_cache() {
        let stores = Stores::in_memory();
        let mut existing = SeriesInteractions::default();
        existing.apply(&comment("1718000000000_abcdefg"));
        stores.interaction_cache().store("blue-box", &existing).await.unwrap();

        stores
            .interaction_log()
            .append(
                "blue-box",
                None,
                &[
                    comment("1718000000000_abcdefg"),
                    Action::LikeComment {
                        chapter: "1".into(),
                        payload: CommentTarget {
                            comment_id: "1718000000000_abcdefg".into(),
                        },
                    },
                ],
            )
            .await
            .unwrap();

        processor(&stores).run().await.unwrap();

        let cached = stores.interaction_cache().load("blue-box").await.unwrap();
        let comments = cached.items["1"].comments.as_ref().unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].likes, 1);
    }

    #[tokio::test]
    async fn unparseable_entries_are_dropped_and_unknown_actions_skipped() {
        let stores = Stores::in_memory();
        stores.log.put("log:blue-box:unknown:1-aaaaaaaaa", "{oops", None).await.unwrap();
        stores
            .log
            .put(
                "log:blue-box:unknown:2-bbbbbbbbb",
                r#"[{"type":"teleport","chapter":"1"},{"type":"like","chapter":"1"}]"#,
                None,
            )
            .await
            .unwrap();

        let summary = processor(&stores).run().await.unwrap();

        assert_eq!(summary.files, 2);
        assert_eq!(summary.skipped_files, 1);
        assert_eq!(summary.actions, 1);
        assert!(stores.interaction_log().pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn key_listed_twice_is_folded_once() {
        const KEY: &str = "log:blue-box:1.1.1.1:1718000000000-aaaaaaaaa";

        let mut log_ns = MockKvNamespace::new();
        log_ns
            .expect_list()
            .withf(|_, cursor, _| cursor.is_none())
            .returning(|_, _, _| {
                Ok(KvPage {
                    keys: vec![KEY.into()],
                    cursor: Some("5".into()),
                })
            });
        log_ns
            .expect_list()
            .withf(|_, cursor, _| cursor.as_deref() == Some("5"))
            .returning(|_, _, _| {
                Ok(KvPage {
                    keys: vec![KEY.into()],
                    cursor: None,
                })
            });
        log_ns
            .expect_get()
            .withf(|key| key == KEY)
            .times(1)
            .returning(|_| Ok(Some(r#"[{"type":"like","chapter":"1"}]"#.into())));
        log_ns
            .expect_delete()
            .withf(|key| key == KEY)
            .times(1)
            .returning(|_| Ok(true));
        log_ns
            .expect_delete()
            .withf(|key| key == "lock:1.1.1.1")
            .times(1)
            .returning(|_| Ok(true));

        let stores = Stores {
            log: Arc::new(log_ns),
            cache: Arc::new(MemoryKvNamespace::new()),
            images: Arc::new(MemoryKvNamespace::new()),
        };

        let summary = processor(&stores).run().await.unwrap();

        assert_eq!((summary.files, summary.actions), (1, 1));
        let cached = stores.interaction_cache().load("blue-box").await.unwrap();
        assert_eq!(cached.items["1"].likes, 1);
    }

    #[tokio::test]
    async fn lock_release_failure_does_not_fail_the_run() {
        let mut log_ns = MockKvNamespace::new();
        log_ns.expect_list().returning(|_, _, _| {
            Ok(KvPage {
                keys: vec!["log:blue-box:1.1.1.1:1-aaaaaaaaa".into()],
                cursor: None,
            })
        });
        log_ns
            .expect_get()
            .returning(|_| Ok(Some(r#"[{"type":"like","chapter":"1"}]"#.into())));
        log_ns
            .expect_delete()
            .withf(|key| key.starts_with("log:"))
            .returning(|_| Ok(true));
        log_ns
            .expect_delete()
            .withf(|key| key.starts_with("lock:"))
            .returning(|_| Err(anyhow::anyhow!("kv unavailable")));

        let stores = Stores {
            log: Arc::new(log_ns),
            cache: Arc::new(MemoryKvNamespace::new()),
            images: Arc::new(MemoryKvNamespace::new()),
        };

        let summary = processor(&stores).run().await.unwrap();

        assert_eq!(summary.files, 1);
        assert_eq!(summary.unlocked_ips, 0);
        let cached = stores.interaction_cache().load("blue-box").await.unwrap();
        assert_eq!(cached.items["1"].likes, 1);
    }

    #[tokio::test]
    async fn exclusive_guard_holds_off_runs() {
        let stores = Stores::in_memory();
        stores
            .interaction_log()
            .append("blue-box", None, &[like("1")])
            .await
            .unwrap();
        let p = processor(&stores);

        let guard = p.exclusive().await;
        let mut run = tokio::spawn({
            let p = p.clone();
            async move { p.run().await }
        });
        assert!(
            tokio::time::timeout(std::time::Duration::from_millis(50), &mut run)
                .await
                .is_err()
        );
        assert_eq!(stores.interaction_log().pending().await.unwrap().len(), 1);

        drop(guard);
        let summary = run.await.unwrap().unwrap();
        assert_eq!(summary.files, 1);
    }

    #[tokio::test]
    async fn failed_cache_write_keeps_log_entries_for_next_run() {
        let log_ns = Arc::new(MemoryKvNamespace::new());
        let mut cache_ns = MockKvNamespace::new();
        cache_ns.expect_get().returning(|_| Ok(None));
        cache_ns
            .expect_put()
            .returning(|_, _, _| Err(anyhow::anyhow!("kv unavailable")));

        let stores = Stores {
            log: log_ns.clone(),
            cache: Arc::new(cache_ns),
            images: Arc::new(MemoryKvNamespace::new()),
        };
        let key = stores
            .interaction_log()
            .append("blue-box", Some("1.1.1.1"), &[like("1")])
            .await
            .unwrap();
        stores.ip_locks(300).lock("1.1.1.1").await.unwrap();

        assert!(processor(&stores).run().await.is_err());

        assert_eq!(stores.interaction_log().pending().await.unwrap(), vec![key]);
        assert!(stores.ip_locks(300).is_locked("1.1.1.1").await.unwrap());
    }
}

//! Property tests for the snapshot diff and record identity

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rewardscrape::record::{ContentSignature, NormalizeContext, normalize};
use rewardscrape::{Device, RawRecord, Record, RewardValue, Snapshot, diff};
use std::collections::HashSet;

fn record(key: &str, title: &str, reward: &str) -> Record {
    Record {
        source_site: "shop".into(),
        category_id: "c".into(),
        external_id: None,
        canonical_key: key.into(),
        title: title.into(),
        reward_value: RewardValue::unknown(reward),
        url: None,
        device: Device::All,
        captured_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
    }
}

/// Small key space so baseline and current overlap often
fn snapshot_strategy() -> impl Strategy<Value = Snapshot> {
    prop::collection::vec(("k[0-9]{1,2}", "[ab]", "[12]"), 0..30).prop_map(|entries| {
        Snapshot::from_records(
            entries
                .into_iter()
                .map(|(key, title, reward)| record(&key, &title, &reward)),
        )
    })
}

proptest! {
    #[test]
    fn every_key_is_classified_exactly_once(
        baseline in snapshot_strategy(),
        current in snapshot_strategy(),
    ) {
        let result = diff(&baseline, &current);
        let union: HashSet<&String> = baseline.keys().chain(current.keys()).collect();
        prop_assert_eq!(result.total_keys(), union.len());

        let mut seen = HashSet::new();
        for r in result.new.iter().chain(result.deleted.iter()) {
            prop_assert!(seen.insert(r.canonical_key.clone()));
        }
        for u in &result.updated {
            prop_assert!(seen.insert(u.after.canonical_key.clone()));
            prop_assert!(!u.changed_fields.is_empty());
        }
    }

    #[test]
    fn diff_against_itself_is_all_unchanged(snapshot in snapshot_strategy()) {
        let before = snapshot.clone();
        let result = diff(&snapshot, &snapshot);
        prop_assert!(!result.has_changes());
        prop_assert_eq!(result.unchanged_count, snapshot.len());
        prop_assert_eq!(snapshot, before);
    }

    #[test]
    fn key_ignores_title_and_reward_when_id_present(
        id in "[0-9]{1,6}",
        title_a in "[A-Za-z][A-Za-z ]{0,20}",
        title_b in "[A-Za-z][A-Za-z ]{0,20}",
        reward_a in "[0-9]{1,4}(%|pt|円)",
        reward_b in "[0-9]{1,4}(%|pt|円)",
    ) {
        let ctx = NormalizeContext {
            source_site: "shop",
            category_id: "c",
            page_url: Some("https://shop.test/c?page=1"),
            default_device: None,
            point_exchange_rate: None,
            currency: "JPY",
            captured_at: Utc::now(),
        };
        let a = normalize(&RawRecord::new(title_a, reward_a).with_external_id(id.clone()), &ctx).unwrap();
        let b = normalize(&RawRecord::new(title_b, reward_b).with_external_id(id), &ctx).unwrap();
        prop_assert_eq!(a.canonical_key, b.canonical_key);
    }

    #[test]
    fn signature_ignores_capture_time(seconds in 0i64..10_000_000) {
        let a = record("k", "Title", "5%");
        let mut b = a.clone();
        b.captured_at = a.captured_at + Duration::seconds(seconds);
        prop_assert_eq!(ContentSignature::of(&a), ContentSignature::of(&b));
    }
}

#[test]
fn documented_scenario() {
    let baseline = Snapshot::from_records([record("A", "a", "1"), record("B", "b", "2")]);
    let current = Snapshot::from_records([record("A", "a", "1"), record("C", "c", "3")]);

    let result = diff(&baseline, &current);

    assert_eq!(result.new.len(), 1);
    assert_eq!(result.new[0].canonical_key, "C");
    assert!(result.updated.is_empty());
    assert_eq!(result.deleted.len(), 1);
    assert_eq!(result.deleted[0].canonical_key, "B");
    assert_eq!(result.unchanged_count, 1);
}

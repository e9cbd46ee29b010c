//! End-to-end scenarios for the retention engine.

use chrono::{DateTime, Duration, TimeZone, Utc};

use tagkeep_core::{parse_policies, Image, Inventory, Policy, RawPolicy, RawTags};
use tagkeep_runtime::{aggregate, evaluate, evaluate_inventory, plan, Action, Reason, Verdict};

fn at(day: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap() + Duration::days(day)
}

fn image(day: i64, tags: &[&str]) -> Image {
    tags.iter()
        .fold(Image::new(format!("sha256:{day:03}"), at(day)), |img, t| {
            img.with_tag(*t)
        })
}

fn policy(name: &str, period: i64, count: i64, tags: &[&str]) -> Policy {
    let significant = if tags == ["*"] {
        RawTags::One("*".to_string())
    } else {
        RawTags::Many(tags.iter().map(|t| t.to_string()).collect())
    };
    Policy::from_raw(
        RawPolicy {
            name: Some(name.to_string()),
            protected_period: Some(period),
            protected_count: Some(count),
            significant_tags: Some(significant),
            ..Default::default()
        },
        0,
    )
    .unwrap()
}

fn weekly() -> Vec<Image> {
    vec![
        image(0, &[]),
        image(10, &[]),
        image(20, &["prod"]),
        image(30, &[]),
        image(40, &[]),
        image(50, &[]),
        image(60, &[]),
    ]
}

fn protected_days(images: &[Image], p: &Policy) -> Vec<String> {
    evaluate("web", images, p)
        .into_iter()
        .filter(|d| d.verdict == Verdict::Protect)
        .map(|d| d.digest)
        .collect()
}

#[test]
fn test_anchor_window_and_count() {
    let p = policy("release", 25, 2, &["prod"]);
    let decisions = evaluate("web", &weekly(), &p);

    let verdicts: Vec<(&str, Verdict, Reason)> = decisions
        .iter()
        .map(|d| (d.digest.as_str(), d.verdict, d.reason))
        .collect();

    assert_eq!(
        verdicts,
        vec![
            ("sha256:000", Verdict::Delete, Reason::OutsideWindow),
            ("sha256:010", Verdict::Delete, Reason::OutsideWindow),
            ("sha256:020", Verdict::Protect, Reason::WithinPeriod),
            ("sha256:030", Verdict::Protect, Reason::WithinPeriod),
            ("sha256:040", Verdict::Protect, Reason::WithinPeriod),
            ("sha256:050", Verdict::Delete, Reason::OutsideWindow),
            ("sha256:060", Verdict::Delete, Reason::OutsideWindow),
        ]
    );
}

#[test]
fn test_no_significant_tag_keeps_oldest_by_count() {
    let images: Vec<Image> = (0..6).map(|d| image(d * 7, &["nightly"])).collect();
    let p = policy("release", 100, 3, &["prod"]);

    let decisions = evaluate("web", &images, &p);
    let protected: Vec<usize> = decisions
        .iter()
        .enumerate()
        .filter(|(_, d)| d.verdict == Verdict::Protect)
        .map(|(i, _)| i)
        .collect();

    assert_eq!(protected, vec![0, 1, 2]);
    assert!(decisions[3..]
        .iter()
        .all(|d| d.reason == Reason::NoSignificantTagFound));
}

#[test]
fn test_wildcard_skips_untagged_anchor_candidates() {
    let images = vec![image(0, &[]), image(5, &[]), image(9, &["v1"]), image(30, &[])];
    let p = policy("any", 3, 0, &["*"]);

    assert_eq!(protected_days(&images, &p), vec!["sha256:009"]);
}

#[test]
fn test_count_covers_whole_inventory() {
    let images = weekly();
    for period in [0, 5, 1000] {
        let p = policy("all", period, images.len() as i64, &["prod"]);
        let decisions = evaluate("web", &images, &p);
        assert!(decisions.iter().all(|d| d.verdict == Verdict::Protect));
    }

    let p = policy("all", 0, images.len() as i64, &["missing"]);
    assert!(evaluate("web", &images, &p)
        .iter()
        .all(|d| d.verdict == Verdict::Protect));
}

#[test]
fn test_every_image_gets_one_decision() {
    let images = weekly();
    let p = policy("release", 25, 2, &["prod"]);
    let decisions = evaluate("web", &images, &p);

    assert_eq!(decisions.len(), images.len());
    for (decision, image) in decisions.iter().zip(&images) {
        assert_eq!(decision.digest, image.digest);
    }
}

/// `weekly()` with the `prod` tag moved to `anchor`, or removed.
fn weekly_anchored_at(anchor: Option<usize>) -> Vec<Image> {
    let mut images = weekly();
    for (index, img) in images.iter_mut().enumerate() {
        img.tags.clear();
        if Some(index) == anchor {
            img.tags.insert("prod".to_string());
        }
    }
    images
}

fn anchor_positions() -> impl Iterator<Item = Option<usize>> {
    std::iter::once(None).chain((0..weekly().len()).map(Some))
}

#[test]
fn test_raising_limits_only_adds_protection() {
    let tags = ["prod"];

    for anchor in anchor_positions() {
        let images = weekly_anchored_at(anchor);
        for period in 0..70 {
            for count in 0..=(images.len() as i64 + 1) {
                let base = protected_days(&images, &policy("p", period, count, &tags));
                let longer = protected_days(&images, &policy("p", period + 5, count, &tags));
                let larger = protected_days(&images, &policy("p", period, count + 1, &tags));

                assert!(
                    base.iter().all(|d| longer.contains(d)),
                    "anchor {anchor:?} period {period} count {count}"
                );
                assert!(
                    base.iter().all(|d| larger.contains(d)),
                    "anchor {anchor:?} period {period} count {count}"
                );
            }
        }
    }
}

#[test]
fn test_count_keeps_a_minimum_for_every_anchor() {
    let tags = ["prod"];

    for anchor in anchor_positions() {
        let images = weekly_anchored_at(anchor);
        let len = images.len() as i64;

        for count in 0..=len + 2 {
            let kept = protected_days(&images, &policy("p", 0, count, &tags));
            assert!(
                kept.len() as i64 >= count.min(len),
                "anchor {anchor:?} count {count}: kept {kept:?}"
            );
            if count >= len {
                assert_eq!(kept.len(), images.len(), "anchor {anchor:?} count {count}");
            }
        }
    }
}

#[test]
fn test_policy_order_is_irrelevant() {
    let mut inventory = Inventory::new();
    inventory.insert("web", weekly());
    inventory.insert(
        "api",
        vec![image(0, &["rc"]), image(3, &[]), image(8, &["prod"]), image(40, &[])],
    );

    let policies = vec![
        policy("a", 25, 2, &["prod"]),
        policy("b", 2, 1, &["rc"]),
        policy("c", 0, 0, &["*"]),
    ];

    let forward: Vec<_> = policies.iter().map(|p| evaluate_inventory(&inventory, p)).collect();
    let mut reversed = forward.clone();
    reversed.reverse();
    let rotated = vec![forward[1].clone(), forward[2].clone(), forward[0].clone()];

    let expected = aggregate(&forward);
    assert_eq!(aggregate(&reversed), expected);
    assert_eq!(aggregate(&rotated), expected);
}

#[test]
fn test_multiple_policies_protect_wins() {
    let mut inventory = Inventory::new();
    inventory.insert("web", weekly());

    let policies = parse_policies(
        r#"
- name: releases
  protected_period: 25
  protected_count: 2
  significant_tags: [prod]
- name: keep-first
  protected_period: 0
  protected_count: 1
  significant_tags: [none-of-these]
"#,
    )
    .unwrap();

    let (per_policy, report) = plan(&inventory, &policies);
    assert_eq!(per_policy.len(), 2);

    let deleted: Vec<&str> = report
        .actions()
        .iter()
        .filter(|a| a.action == Action::Delete)
        .map(|a| a.digest.as_str())
        .collect();
    assert_eq!(deleted, vec!["sha256:010", "sha256:050", "sha256:060"]);
    assert_eq!(report.kept_count(), 4);
}

#[test]
fn test_scoped_policies_only_touch_their_repositories() {
    let mut inventory = Inventory::new();
    inventory.insert("web", weekly());
    inventory.insert("base", vec![image(0, &[]), image(1, &[])]);
    inventory.insert("api", vec![image(0, &[]), image(1, &[])]);

    let policies = parse_policies(
        r#"
- name: web-only
  protected_period: 0
  protected_count: 0
  significant_tags: [prod]
  repositories: [web, base]
  protected_repositories: [base]
"#,
    )
    .unwrap();

    let (_, report) = plan(&inventory, &policies);
    assert!(report.actions().iter().all(|a| a.repository == "web"));
    assert_eq!(report.to_delete().get("web").map(Vec::len), Some(6));
}

#[test]
fn test_empty_inventory_yields_empty_report() {
    let inventory = Inventory::new();
    let (per_policy, report) = plan(&inventory, &[policy("p", 1, 1, &["prod"])]);
    assert!(per_policy[0].repositories.is_empty());
    assert!(report.is_empty());
}

#[test]
fn test_anchor_ties_resolved_by_digest_order() {
    let mut inventory = Inventory::new();
    inventory.insert(
        "web",
        vec![
            Image::new("sha256:bbb", at(5)).with_tag("prod"),
            Image::new("sha256:aaa", at(5)).with_tag("prod"),
            Image::new("sha256:ccc", at(6)),
        ],
    );

    let p = policy("ties", 0, 2, &["prod"]);
    let decisions = evaluate("web", inventory.images("web"), &p);
    assert_eq!(decisions[0].digest, "sha256:aaa");
    assert_eq!(decisions[0].reason, Reason::WithinPeriod);
    assert_eq!(decisions[1].reason, Reason::WithinPeriod);
    assert_eq!(decisions[2].verdict, Verdict::Delete);
}

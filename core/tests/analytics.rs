use churn_desk_core::{
    config::DeskConfig,
    demo,
    desk::ChurnDesk,
    filter::CancellationFilter,
    insights::{BALANCED_MESSAGE, NO_DATA_MESSAGE},
    record::{NewCancellation, NewCustomer},
    types::CustomerId,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn starter_desk() -> ChurnDesk {
    let desk = ChurnDesk::build_test().unwrap();
    demo::seed_starter_book(&desk).unwrap();
    desk
}

fn add_customer(desk: &ChurnDesk, n: usize, campaign: Option<&str>) -> CustomerId {
    desk.create_customer(NewCustomer {
        name: format!("Customer {n:02}"),
        email: format!("customer{n}@example.com"),
        subscription_start_date: Some("2025-01-01".into()),
        source_campaign: campaign.map(str::to_string),
        ..Default::default()
    })
    .unwrap()
    .id
}

fn cancel(desk: &ChurnDesk, customer: CustomerId, reason: &str, closer: Option<&str>, saved: bool) {
    desk.create_cancellation(NewCancellation {
        customer_id: Some(customer),
        cancellation_date: Some("2025-03-01".into()),
        primary_reason: Some(reason.into()),
        closer_name: closer.map(str::to_string),
        saved_flag: saved,
        ..Default::default()
    })
    .unwrap();
}

fn all() -> CancellationFilter {
    CancellationFilter::default()
}

// ── Overview ─────────────────────────────────────────────────────────────────

#[test]
fn empty_desk_reports_no_data() {
    let desk = ChurnDesk::build_test().unwrap();
    let overview = desk.overview(&all()).unwrap();

    assert_eq!(overview.totals.total_cancellations, 0);
    assert_eq!(overview.totals.save_rate, 0.0);
    assert_eq!(overview.totals.avg_days_on_platform, 0);
    assert!(overview.totals.top_reasons.is_empty());
    assert_eq!(overview.insights, vec![NO_DATA_MESSAGE.to_string()]);

    let closers = desk.closer_stats().unwrap();
    assert_eq!(closers.len(), 6);
    assert!(closers.iter().all(|c| c.total == 0 && c.save_rate == 0.0));
}

#[test]
fn starter_book_totals() {
    let desk = starter_desk();
    let totals = desk.overview(&all()).unwrap().totals;

    assert_eq!(totals.total_cancellations, 5);
    assert_eq!(totals.total_saved, 2);
    assert!((totals.save_rate - 0.4).abs() < 1e-9);
    // Tenures 80, 53, 150, 176, 79.
    assert_eq!(totals.avg_days_on_platform, 108);

    let top: Vec<(&str, u64)> = totals
        .top_reasons
        .iter()
        .map(|r| (r.reason.as_str(), r.count))
        .collect();
    assert_eq!(
        top,
        vec![
            ("Content not relevant", 2),
            ("Not getting results", 1),
            ("Pricing objection", 1),
        ]
    );
}

#[test]
fn starter_book_insights() {
    let desk = starter_desk();
    let insights = desk.insights(&all()).unwrap();

    assert_eq!(insights.len(), 5, "{insights:#?}");
    assert!(insights[0].starts_with("Content strategy misalignment: 40.0%"));
    assert!(insights[1].contains("Ava Liang is saving 0.0%"));
    assert!(insights[1].contains("team average 40.0%"));
    assert!(insights[2].contains("Marcus Lee"));
    assert!(insights[3].contains("Hannah Cho"));
    // Every starter campaign churned its one customer; the first label wins.
    assert!(insights[4].starts_with("Campaign quality check: Blog CTA"));
    assert!(insights.iter().all(|i| !i.contains("Priya Shah")));
}

#[test]
fn content_share_wins_over_generic_driver() {
    let desk = ChurnDesk::build_test().unwrap();
    let reasons = [
        "content", "content", "content", "Content not relevant",
        "price", "price", "too busy", "competitor", "no results", "lead quality",
    ];
    for (n, reason) in reasons.iter().enumerate() {
        let customer = add_customer(&desk, n, None);
        cancel(&desk, customer, reason, None, n % 2 == 0);
    }

    let insights = desk.insights(&all()).unwrap();
    assert!(insights.iter().any(|i| i.starts_with("Content strategy misalignment: 40.0%")));
    assert!(!insights.iter().any(|i| i.starts_with("Primary churn driver")));
}

/// A tie between content and a newer reason is settled by label, not by
/// which record the listing returns first.
#[test]
fn content_tie_with_newer_reason_still_flags_content() {
    let desk = ChurnDesk::build_test().unwrap();
    let book = [
        ("2025-01-10", "content"),
        ("2025-01-11", "content"),
        ("2025-01-12", "content"),
        ("2025-01-13", "content"),
        ("2025-02-10", "price"),
        ("2025-02-11", "price"),
        ("2025-02-12", "price"),
        ("2025-02-13", "price"),
        ("2025-02-14", "other"),
        ("2025-02-15", "other"),
    ];
    for (n, (date, reason)) in book.into_iter().enumerate() {
        let customer = add_customer(&desk, n, None);
        desk.create_cancellation(NewCancellation {
            customer_id: Some(customer),
            cancellation_date: Some(date.into()),
            primary_reason: Some(reason.into()),
            saved_flag: true,
            ..Default::default()
        })
        .unwrap();
    }

    let listed = desk.list_cancellations(&all()).unwrap();
    assert_eq!(listed[0].primary_reason, "Other");

    let summary = desk.summary(&all()).unwrap();
    assert_eq!(summary.top_reasons[0].reason, "Content not relevant");
    assert_eq!(summary.top_reasons[1].reason, "Pricing objection");

    let insights = desk.insights(&all()).unwrap();
    assert!(
        insights.iter().any(|i| i.starts_with("Content strategy misalignment: 40.0%")),
        "{insights:#?}"
    );
    assert!(!insights.iter().any(|i| i.starts_with("Primary churn driver")));
}

/// The 0-call closer is left out of the team mean and never coached.
#[test]
fn coaching_ignores_idle_closers() {
    let config = DeskConfig::with_closers(&["Ava Liang", "Diego Morales", "Priya Shah"]);
    let desk = ChurnDesk::build_test_with(config).unwrap();

    for (n, (closer, saved)) in [
        ("Ava Liang", true),
        ("Ava Liang", true),
        ("Diego Morales", false),
        ("Diego Morales", false),
    ]
    .into_iter()
    .enumerate()
    {
        let customer = add_customer(&desk, n, None);
        cancel(&desk, customer, "price", Some(closer), saved);
    }

    let insights = desk.insights(&all()).unwrap();
    let coaching: Vec<&String> = insights
        .iter()
        .filter(|i| i.starts_with("Closer coaching"))
        .collect();
    assert_eq!(coaching.len(), 1, "{insights:#?}");
    assert!(coaching[0].contains("Diego Morales"));
    assert!(coaching[0].contains("team average 50.0%"));
}

#[test]
fn only_the_worst_campaign_is_flagged() {
    let desk = ChurnDesk::build_test().unwrap();
    let mut n = 0;
    let mut cohort = |campaign: &str, size: usize, cancels: usize| {
        for i in 0..size {
            let customer = add_customer(&desk, n, Some(campaign));
            n += 1;
            if i < cancels {
                cancel(&desk, customer, &format!("reason {n}"), None, true);
            }
        }
    };
    cohort("Spring Webinar", 4, 1);
    cohort("Blog CTA", 6, 1);

    let campaigns = desk.campaign_stats().unwrap();
    let labels: Vec<&str> = campaigns.iter().map(|c| c.campaign.as_str()).collect();
    assert_eq!(labels, vec!["Blog CTA", "Spring Webinar"]);
    assert!((campaigns[1].churn_rate - 0.25).abs() < 1e-9);

    let insights = desk.insights(&all()).unwrap();
    let flagged: Vec<&String> = insights
        .iter()
        .filter(|i| i.starts_with("Campaign quality check"))
        .collect();
    assert_eq!(flagged.len(), 1);
    assert!(flagged[0].contains("Spring Webinar is driving 25.0%"));
}

#[test]
fn two_reason_book_has_a_primary_driver() {
    let desk = ChurnDesk::build_test().unwrap();
    for n in 0..10 {
        let customer = add_customer(&desk, n, Some("Referral Program"));
        if n < 2 {
            cancel(&desk, customer, &format!("reason {n}"), None, true);
        }
    }
    let insights = desk.insights(&all()).unwrap();
    assert_eq!(insights.len(), 1, "{insights:#?}");
    assert!(insights[0].starts_with("Primary churn driver: 50.0%"));
    assert!(insights[0].contains("\"reason 0\""));
}

#[test]
fn quiet_book_is_balanced() {
    let desk = ChurnDesk::build_test().unwrap();
    // 25 customers, 5 saved cancellations with 5 different reasons: every
    // share sits exactly on its threshold, which does not trip a rule.
    for n in 0..25 {
        let customer = add_customer(&desk, n, Some("Referral Program"));
        if n < 5 {
            cancel(&desk, customer, &format!("reason {n}"), None, true);
        }
    }
    let insights = desk.insights(&all()).unwrap();
    assert_eq!(insights, vec![BALANCED_MESSAGE.to_string()]);
}

#[test]
fn early_churn_triggers_onboarding_message() {
    let desk = ChurnDesk::build_test().unwrap();
    for n in 0..5 {
        let customer = add_customer(&desk, n, None);
        desk.create_cancellation(NewCancellation {
            customer_id: Some(customer),
            // Start is 2025-01-01: three cancel within a week.
            cancellation_date: Some(if n < 3 { "2025-01-05" } else { "2025-04-01" }.into()),
            primary_reason: Some(format!("reason {n}")),
            saved_flag: true,
            ..Default::default()
        })
        .unwrap();
    }

    let summary = desk.summary(&all()).unwrap();
    assert_eq!(summary.early_churn_count, 3);
    let insights = desk.insights(&all()).unwrap();
    assert!(insights.iter().any(|i| i.starts_with("Onboarding gap: 60.0%")));
}

// ── Breakdowns ───────────────────────────────────────────────────────────────

#[test]
fn closer_stats_follow_roster_order() {
    let desk = starter_desk();
    let closers = desk.closer_stats().unwrap();
    let names: Vec<&str> = closers.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Ava Liang", "Diego Morales", "Priya Shah", "Marcus Lee", "Hannah Cho", "Noah Patel"]
    );

    let diego = &closers[1];
    assert_eq!((diego.saves, diego.losses, diego.total), (1, 0, 1));
    assert_eq!(diego.save_rate, 1.0);
    // Priya saved a call Diego handled; attribution goes to the handling closer.
    assert_eq!(closers[2].total, 0);
}

#[test]
fn reason_stats_break_down_by_segment() {
    let desk = starter_desk();
    let stats = desk.reason_stats().unwrap();

    assert_eq!(stats.overall.len(), 4);
    let segments: Vec<&str> = stats.by_segment.iter().map(|s| s.segment.as_str()).collect();
    assert_eq!(
        segments,
        vec!["Commercial Realtor", "First-time Realtor", "Luxury Realtor", "Solo Agent", "Team Lead"]
    );
    let solo = &stats.by_segment[3];
    assert_eq!(solo.reasons.len(), 1);
    assert_eq!(solo.reasons[0].reason, "Content not relevant");
    assert_eq!(solo.reasons[0].count, 1);
}

#[test]
fn customers_without_segment_group_as_unknown() {
    let desk = ChurnDesk::build_test().unwrap();
    let customer = add_customer(&desk, 1, None);
    cancel(&desk, customer, "price", None, false);

    let stats = desk.reason_stats().unwrap();
    assert_eq!(stats.by_segment.len(), 1);
    assert_eq!(stats.by_segment[0].segment, "Unknown");

    let campaigns = desk.campaign_stats().unwrap();
    assert_eq!(campaigns[0].campaign, "Unknown");
    assert_eq!(campaigns[0].churn_rate, 1.0);
}

#[test]
fn monthly_churn_is_ascending() {
    let desk = starter_desk();
    let points: Vec<(String, i64)> = desk
        .monthly_churn()
        .unwrap()
        .into_iter()
        .map(|p| (p.month, p.count))
        .collect();
    assert_eq!(points, vec![("2025-01".to_string(), 2), ("2025-02".to_string(), 3)]);
}

//! Demo data: a fixed starter book plus a seeded synthetic generator.
//!
//! Everything goes through the desk facade, so demo rows are normalized,
//! validated, and tenure-stamped exactly like real intake.

use crate::{
    desk::ChurnDesk,
    error::DeskResult,
    record::{NewCancellation, NewCustomer, UsageCounters},
    rng::DemoRng,
};
use chrono::{Duration, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DemoSeedReport {
    pub customers_created:     usize,
    pub cancellations_created: usize,
}

struct StarterCustomer {
    name:       &'static str,
    email:      &'static str,
    segment:    &'static str,
    start_date: &'static str,
    campaign:   &'static str,
}

struct StarterCancellation {
    customer:   usize,
    date:       &'static str,
    reason:     &'static str,
    notes:      &'static str,
    usage:      [i64; 4],
    closer:     &'static str,
    /// (saved_by, save_reason, save_notes) for saved calls.
    save:       Option<(&'static str, &'static str, &'static str)>,
}

const STARTER_CUSTOMERS: [StarterCustomer; 5] = [
    StarterCustomer {
        name: "Lena Hu",
        email: "lena.hu@example.com",
        segment: "Luxury Realtor",
        start_date: "2024-10-15",
        campaign: "YouTube Masterclass",
    },
    StarterCustomer {
        name: "Carlos Mendes",
        email: "carlos.mendes@example.com",
        segment: "First-time Realtor",
        start_date: "2024-11-20",
        campaign: "Paid Ads - Meta",
    },
    StarterCustomer {
        name: "Jasmine Ogun",
        email: "jasmine.ogun@example.com",
        segment: "Team Lead",
        start_date: "2024-09-05",
        campaign: "Referral Program",
    },
    StarterCustomer {
        name: "Noah Park",
        email: "noah.park@example.com",
        segment: "Commercial Realtor",
        start_date: "2024-08-18",
        campaign: "Events - Inman",
    },
    StarterCustomer {
        name: "Sara Bell",
        email: "sara.bell@example.com",
        segment: "Solo Agent",
        start_date: "2024-12-01",
        campaign: "Blog CTA",
    },
];

const STARTER_CANCELLATIONS: [StarterCancellation; 5] = [
    StarterCancellation {
        customer: 0,
        date: "2025-01-03",
        reason: "Content not relevant",
        notes: "Needs more Vancouver luxury listings",
        usage: [4, 1, 3, 45],
        closer: "Ava Liang",
        save: None,
    },
    StarterCancellation {
        customer: 1,
        date: "2025-01-12",
        reason: "Not getting results",
        notes: "No leads from ads after 3 weeks",
        usage: [1, 0, 2, 30],
        closer: "Diego Morales",
        save: Some(("Priya Shah", "Extended onboarding", "Scheduled weekly accountability check-in")),
    },
    StarterCancellation {
        customer: 2,
        date: "2025-02-02",
        reason: "Pricing objection",
        notes: "Considering a cheaper design tool instead",
        usage: [3, 2, 7, 110],
        closer: "Marcus Lee",
        save: None,
    },
    StarterCancellation {
        customer: 3,
        date: "2025-02-10",
        reason: "Switched to competitor",
        notes: "Broker mandated new platform",
        usage: [0, 0, 1, 12],
        closer: "Hannah Cho",
        save: None,
    },
    StarterCancellation {
        customer: 4,
        date: "2025-02-18",
        reason: "Content not relevant",
        notes: "Wants hyper-local scripts for Seattle",
        usage: [2, 1, 5, 75],
        closer: "Noah Patel",
        save: Some(("Noah Patel", "Customized content pack", "Provided Seattle starter kit")),
    },
];

/// Load the starter book. Customers are only created into an empty
/// customer table and cancellations only into an empty cancellation
/// table, so reseeding is a no-op.
pub fn seed_starter_book(desk: &ChurnDesk) -> DeskResult<DemoSeedReport> {
    let mut report = DemoSeedReport::default();

    if desk.store().customer_count()? == 0 {
        for c in &STARTER_CUSTOMERS {
            desk.create_customer(NewCustomer {
                name: c.name.into(),
                email: c.email.into(),
                segment: Some(c.segment.into()),
                agent_type: Some("Realtor".into()),
                subscription_start_date: Some(c.start_date.into()),
                source_campaign: Some(c.campaign.into()),
            })?;
            report.customers_created += 1;
        }
    }

    if desk.store().cancellation_count()? == 0 {
        for t in &STARTER_CANCELLATIONS {
            let email = STARTER_CUSTOMERS[t.customer].email;
            let Some(customer) = desk.store().customer_by_email(email)? else {
                log::warn!("Starter customer {email} missing; skipping its cancellation");
                continue;
            };
            let [downloads, posts, logins, minutes] = t.usage;
            desk.create_cancellation(NewCancellation {
                customer_id: Some(customer.id),
                cancellation_date: Some(t.date.into()),
                primary_reason: Some(t.reason.into()),
                secondary_notes: Some(t.notes.into()),
                usage: UsageCounters { downloads, posts, logins, minutes },
                closer_name: Some(t.closer.into()),
                saved_flag: t.save.is_some(),
                saved_by: t.save.map(|s| s.0.into()),
                save_reason: t.save.map(|s| s.1.into()),
                save_notes: t.save.map(|s| s.2.into()),
                ..Default::default()
            })?;
            report.cancellations_created += 1;
        }
    }

    log::info!(
        "Starter book ready: {} customers, {} cancellations created",
        report.customers_created,
        report.cancellations_created
    );
    Ok(report)
}

const FIRST_NAMES: [&str; 16] = [
    "Maya", "Owen", "Zara", "Eli", "Nina", "Theo", "Ivy", "Leo",
    "Ruth", "Omar", "Tess", "Kai", "Mila", "Jude", "Ada", "Rafael",
];

const LAST_NAMES: [&str; 16] = [
    "Reyes", "Okafor", "Lindqvist", "Tanaka", "Moreau", "Kowalski", "Haddad", "Brennan",
    "Ivanova", "Sato", "Mbeki", "Castillo", "Nguyen", "Fischer", "Rossi", "Dubois",
];

const SEGMENTS: [&str; 5] = [
    "Luxury Realtor",
    "First-time Realtor",
    "Team Lead",
    "Commercial Realtor",
    "Solo Agent",
];

const CAMPAIGNS: [Option<&str>; 6] = [
    Some("YouTube Masterclass"),
    Some("Paid Ads - Meta"),
    Some("Referral Program"),
    Some("Events - Inman"),
    Some("Blog CTA"),
    None,
];

/// Raw intake phrasings, deliberately messy so the normalizer has work.
const RAW_REASONS: [&str; 12] = [
    "content",
    "Content not relevant",
    "not enough content",
    "no results",
    "Lead quality",
    "PRICE",
    "too expensive",
    "too busy",
    "competitor",
    "Switched platforms",
    "Moving brokerages",
    "other",
];

/// Generate `count` synthetic customers, about 70% of whom cancel.
/// Deterministic for a given `seed` against an empty store.
pub fn generate_synthetic(desk: &ChurnDesk, seed: u64, count: usize) -> DeskResult<DemoSeedReport> {
    let mut rng = DemoRng::new(seed);
    let mut report = DemoSeedReport::default();
    let closers = desk.config().closers.clone();
    let plans = desk.config().agent_plans.clone();
    let agent_types = desk.config().agent_types.clone();
    let epoch = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap_or_default();

    for i in 0..count {
        let first = *rng.pick(&FIRST_NAMES);
        let last = *rng.pick(&LAST_NAMES);
        let start = epoch + Duration::days(rng.next_u64_below(240) as i64);

        let customer = desk.create_customer(NewCustomer {
            name: format!("{first} {last}"),
            email: format!("{}.{}.{seed}.{i}@example.com", first.to_lowercase(), last.to_lowercase()),
            segment: Some(rng.pick(&SEGMENTS).to_string()),
            agent_type: agent_types.first().map(|_| rng.pick(&agent_types).clone()),
            subscription_start_date: Some(start.format("%Y-%m-%d").to_string()),
            source_campaign: (*rng.pick(&CAMPAIGNS)).map(str::to_string),
        })?;
        report.customers_created += 1;

        if !rng.chance(0.7) {
            continue;
        }

        // One in four cancels inside the first week.
        let tenure = if rng.chance(0.25) {
            rng.next_u64_below(8)
        } else {
            8 + rng.next_u64_below(180)
        };
        let cancelled_on = start + Duration::days(tenure as i64);
        let saved = rng.chance(0.3);
        let closer = (!closers.is_empty()).then(|| rng.pick(&closers).clone());

        desk.create_cancellation(NewCancellation {
            customer_id: Some(customer.id),
            cancellation_date: Some(cancelled_on.format("%Y-%m-%d").to_string()),
            primary_reason: Some(rng.pick(&RAW_REASONS).to_string()),
            usage: UsageCounters {
                downloads: rng.next_u64_below(12) as i64,
                posts: rng.next_u64_below(6) as i64,
                logins: rng.next_u64_below(20) as i64,
                minutes: rng.next_u64_below(240) as i64,
            },
            closer_name: closer.clone(),
            saved_flag: saved,
            saved_by: closer.filter(|_| saved),
            save_reason: saved.then(|| "Retention offer".to_string()),
            churn_amount: Some(49.0 + rng.next_u64_below(450) as f64),
            saved_revenue: saved.then(|| 49.0 + rng.next_u64_below(300) as f64),
            agent_plan: plans.first().map(|_| rng.pick(&plans).clone()),
            funds_disputed: rng.chance(0.05),
            ..Default::default()
        })?;
        report.cancellations_created += 1;
    }

    log::info!(
        "Generated {} synthetic customers and {} cancellations (seed {seed})",
        report.customers_created,
        report.cancellations_created
    );
    Ok(report)
}

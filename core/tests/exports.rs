use churn_desk_core::{
    demo,
    desk::ChurnDesk,
    record::{CancellationPatch, NewCancellation, NewCustomer},
};
use chrono::{TimeZone, Utc};

fn starter_desk() -> ChurnDesk {
    let desk = ChurnDesk::build_test().unwrap();
    demo::seed_starter_book(&desk).unwrap();
    desk
}

// ── CSV ──────────────────────────────────────────────────────────────────────

#[test]
fn empty_desk_has_no_csv_exports() {
    let desk = ChurnDesk::build_test().unwrap();
    assert!(desk.export_cancellations_csv().unwrap().is_none());
    assert!(desk.export_saved_cases_csv().unwrap().is_none());
}

#[test]
fn cancellations_csv_lists_every_record_newest_first() {
    let desk = starter_desk();
    let doc = desk.export_cancellations_csv().unwrap().unwrap();

    assert_eq!(doc.filename, "cancellations.csv");
    assert_eq!(doc.content_type, "text/csv");

    let lines: Vec<&str> = doc.body.lines().collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(
        lines[0],
        "id,customer,email,segment,closer,cancellation_date,primary_reason,saved,\
         churn_amount,saved_revenue,funds_disputed,ticket_url"
    );
    assert!(lines[1].starts_with("\"5\",\"Sara Bell\",\"sara.bell@example.com\",\"Solo Agent\""));
    assert!(lines[1].contains("\"Content not relevant\",\"Yes\""));
    // Absent money and ticket values stay empty.
    assert!(lines[5].ends_with("\"No\",,,\"No\","), "{}", lines[5]);
}

#[test]
fn saved_cases_csv_only_has_saved_records() {
    let desk = starter_desk();
    let doc = desk.export_saved_cases_csv().unwrap().unwrap();

    assert_eq!(doc.filename, "saved-cases.csv");
    let lines: Vec<&str> = doc.body.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "id,customer,closer,saved_by,save_reason,save_notes,saved_revenue,cancellation_date"
    );
    assert!(lines[2].contains("\"Carlos Mendes\",\"Diego Morales\",\"Priya Shah\",\"Extended onboarding\""));
}

#[test]
fn csv_escapes_quotes_in_free_text() {
    let desk = ChurnDesk::build_test().unwrap();
    let customer = desk
        .create_customer(NewCustomer {
            name: "Rafael \"Rafa\" Dubois".into(),
            email: "rafa@example.com".into(),
            ..Default::default()
        })
        .unwrap();
    let record = desk
        .create_cancellation(NewCancellation {
            customer_id: Some(customer.id),
            cancellation_date: Some("2025-03-03".into()),
            primary_reason: Some("price".into()),
            churn_amount: Some(199.5),
            ..Default::default()
        })
        .unwrap();
    desk.update_cancellation(
        record.id,
        CancellationPatch {
            saved_flag: Some(true),
            save_notes: Some("Said \"maybe\", then yes".into()),
            ..Default::default()
        },
    )
    .unwrap();

    let all = desk.export_cancellations_csv().unwrap().unwrap();
    assert!(all.body.contains("\"Rafael \"\"Rafa\"\" Dubois\""));
    assert!(all.body.contains("\"199.50\""));

    let saved = desk.export_saved_cases_csv().unwrap().unwrap();
    assert!(saved.body.contains("\"Said \"\"maybe\"\", then yes\""));
}

// ── Monthly report ───────────────────────────────────────────────────────────

#[test]
fn monthly_report_matches_overview() {
    let desk = starter_desk();
    let at = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
    let doc = desk.monthly_report(at).unwrap();

    assert_eq!(doc.filename, "monthly-report.txt");
    assert_eq!(doc.content_type, "text/plain");

    let body = &doc.body;
    assert!(body.starts_with("Monthly Churn Report\n"));
    assert!(body.contains("Generated: 2025-03-01 08:00 UTC"));
    assert!(body.contains("Total cancellations: 5"));
    assert!(body.contains("Total saved cases: 2"));
    assert!(body.contains("Save rate: 40.0%"));
    assert!(body.contains("Avg days on platform: 108"));
    assert!(body.contains("Content not relevant: 2 cancellations"));
    assert!(body.contains("Noah Patel: 1 saves / 0 cancels (Save rate 100.0%)"));
    assert!(body.contains("Priya Shah: 0 saves / 0 cancels (Save rate 0.0%)"));

    let insights = desk.insights(&Default::default()).unwrap();
    for (idx, insight) in insights.iter().enumerate() {
        assert!(body.contains(&format!("{}. {insight}", idx + 1)));
    }
}

#[test]
fn monthly_report_on_empty_desk_still_renders() {
    let desk = ChurnDesk::build_test().unwrap();
    let doc = desk.monthly_report(Utc::now()).unwrap();
    assert!(doc.body.contains("Total cancellations: 0"));
    assert!(doc.body.contains("1. No churn data yet."));
}

// ── Metadata ─────────────────────────────────────────────────────────────────

#[test]
fn metadata_reflects_roster_and_observed_values() {
    let desk = starter_desk();
    desk.create_customer(NewCustomer {
        name: "Eli Kowalski".into(),
        email: "eli@example.com".into(),
        agent_type: Some("Property Manager".into()),
        source_campaign: Some("Podcast".into()),
        ..Default::default()
    })
    .unwrap();

    let meta = desk.metadata().unwrap();
    assert_eq!(meta.closers, desk.config().closers);
    assert_eq!(meta.segments.len(), 5);
    assert_eq!(
        meta.reasons,
        vec![
            "Content not relevant",
            "Not getting results",
            "Pricing objection",
            "Switched to competitor",
        ]
    );
    assert!(meta.campaigns.contains(&"Podcast".to_string()));
    assert_eq!(meta.campaigns.len(), 6);

    // Configured agent types first, observed extras after, no duplicates.
    assert_eq!(meta.agent_types[..4], desk.config().agent_types[..]);
    assert_eq!(meta.agent_types.last().map(String::as_str), Some("Property Manager"));
    assert_eq!(meta.agent_types.iter().filter(|t| *t == "Realtor").count(), 1);
    assert_eq!(meta.agent_plans.len(), 9);
}

mod common;

use catalog_ingest::domain::{CatalogStore, DomainError, RecordType};
use catalog_ingest::services::{ScopeFilter, ScopePolicy};

use common::{bib, bib_008, setup};

fn policy(from: i32, to: i32, languages: &[&str]) -> ScopePolicy {
    ScopePolicy {
        date_from: from,
        date_to: to,
        languages: languages.iter().map(|l| l.to_string()).collect(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_in_scope_record_is_marked_processed() {
    let h = setup().await;
    let file = h.source_file("XYZ", "batch.xml").await;
    let id = h
        .driver
        .ingest_record(&file, &bib("A1", "1", &bib_008("1789", "eng")))
        .await
        .unwrap()
        .record_id();

    let filter = ScopeFilter::new(policy(1700, 1800, &["eng", "fre"]), h.audit.clone());
    let report = filter.run(h.repo.as_ref()).await.expect("scope pass");

    assert_eq!(report.retained, 1);
    assert_eq!(report.purged, 0);
    let stored = h.repo.get_record(id).await.unwrap().expect("kept");
    assert!(stored.processed);
    assert!(h.repo.list_unprocessed_record_ids().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_out_of_scope_record_is_purged_completely() {
    let h = setup().await;
    let file = h.source_file("XYZ", "batch.xml").await;
    let record = bib("A2", "1", &bib_008("1968", "eng"))
        .with_data("245", &[('a', "Modern"), ('c', "Someone")])
        .with_data("260", &[('c', "1968.")]);
    let id = h.driver.ingest_record(&file, &record).await.unwrap().record_id();
    let field_ids = h.repo.list_field_ids(id).await.unwrap();
    assert!(!field_ids.is_empty());

    let filter = ScopeFilter::new(policy(1700, 1800, &[]), h.audit.clone());
    let report = filter.run(h.repo.as_ref()).await.expect("scope pass");

    assert_eq!(report.purged, 1);
    assert_eq!(report.date_failures, 1);
    assert_eq!(report.language_failures, 0);

    assert!(h.repo.get_record(id).await.unwrap().is_none());
    assert!(h.repo.list_fields(id).await.unwrap().is_empty());
    for field_id in field_ids {
        assert!(h.repo.list_subfields(field_id).await.unwrap().is_empty());
    }

    let failures = h.audit.scope_failed.lock().unwrap();
    assert_eq!(failures.len(), 1);
    let (context, checks) = &failures[0];
    assert_eq!(context.institution_code, "XYZ");
    assert_eq!(context.filename, "batch.xml");
    assert_eq!(context.control_identifier, "A2");
    assert!(checks.date && !checks.language);
}

#[tokio::test]
async fn test_language_and_date_failures_are_both_reported() {
    let h = setup().await;
    let file = h.source_file("XYZ", "batch.xml").await;
    h.driver
        .ingest_record(&file, &bib("A3", "1", &bib_008("1968", "ger")))
        .await
        .unwrap();

    let filter = ScopeFilter::new(policy(1700, 1800, &["eng"]), h.audit.clone());
    filter.run(h.repo.as_ref()).await.expect("scope pass");

    let failures = h.audit.scope_failed.lock().unwrap();
    assert_eq!(failures[0].1.describe(), "language+date");
}

#[tokio::test]
async fn test_every_unprocessed_record_is_evaluated() {
    let h = setup().await;
    let file = h.source_file("XYZ", "batch.xml").await;
    for i in 0..12 {
        let year = if i % 2 == 0 { "1750" } else { "1950" };
        h.driver
            .ingest_record(&file, &bib(&format!("R{}", i), "1", &bib_008(year, "eng")))
            .await
            .unwrap();
    }

    let filter = ScopeFilter::new(policy(1700, 1800, &["eng"]), h.audit.clone());
    let report = filter.run(h.repo.as_ref()).await.expect("scope pass");

    assert_eq!(report.evaluated, 12);
    assert_eq!(report.retained, 6);
    assert_eq!(report.purged, 6);
    assert_eq!(h.repo.count_records().await.unwrap(), 6);
    assert!(h.repo.list_unprocessed_record_ids().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_holding_passes_without_dates_or_language() {
    let h = setup().await;
    let file = h.source_file("XYZ", "holdings.xml").await;
    let holding = catalog_ingest::domain::DecodedRecord::new()
        .with_control("001", "H1")
        .with_control("004", "A1")
        .with_data("852", &[('b', "MAIN")]);
    let id = h.driver.ingest_record(&file, &holding).await.unwrap().record_id();

    let filter = ScopeFilter::new(policy(1700, 1800, &["eng"]), h.audit.clone());
    let report = filter.run(h.repo.as_ref()).await.expect("scope pass");

    assert_eq!(report.retained, 1);
    let stored = h.repo.get_record(id).await.unwrap().expect("kept");
    assert_eq!(stored.record_type, Some(RecordType::Holding));
    assert!(stored.processed);
}

#[tokio::test]
async fn test_processed_records_are_only_rechecked_after_replace() {
    let h = setup().await;
    let file = h.source_file("XYZ", "batch.xml").await;
    h.driver
        .ingest_record(&file, &bib("A4", "100", &bib_008("1750", "eng")))
        .await
        .unwrap();

    let filter = ScopeFilter::new(policy(1700, 1800, &[]), h.audit.clone());
    assert_eq!(filter.run(h.repo.as_ref()).await.unwrap().retained, 1);
    assert_eq!(filter.run(h.repo.as_ref()).await.unwrap().evaluated, 0);

    // A fresher version moves the record out of range
    h.driver
        .ingest_record(&file, &bib("A4", "101", &bib_008("1950", "eng")))
        .await
        .unwrap();
    let report = filter.run(h.repo.as_ref()).await.unwrap();
    assert_eq!(report.purged, 1);
    assert_eq!(h.repo.count_records().await.unwrap(), 0);
}

#[tokio::test]
async fn test_date_subfield_pairs_are_configurable() {
    let h = setup().await;
    let file = h.source_file("XYZ", "batch.xml").await;
    let no_fixed_date = bib_008("uuuu", "eng");
    h.driver
        .ingest_record(
            &file,
            &bib("S534", "1", &no_fixed_date).with_data("534", &[('c', "Originally 1750.")]),
        )
        .await
        .unwrap();
    h.driver
        .ingest_record(
            &file,
            &bib("S234", "1", &no_fixed_date).with_data("234", &[('c', "1760")]),
        )
        .await
        .unwrap();

    // Default pairs read 234$c but not 534$c
    let filter = ScopeFilter::new(policy(1700, 1800, &[]), h.audit.clone());
    let report = filter.run(h.repo.as_ref()).await.unwrap();
    assert_eq!(report.retained, 1);
    assert!(
        h.repo
            .find_record("XYZ", RecordType::Bib, "S234")
            .await
            .unwrap()
            .is_some()
    );

    h.driver
        .ingest_record(
            &file,
            &bib("S534", "2", &no_fixed_date).with_data("534", &[('c', "Originally 1750.")]),
        )
        .await
        .unwrap();
    let mut with_534c = policy(1700, 1800, &[]);
    with_534c.date_subfields.push(("534".to_string(), "c".to_string()));
    let report = ScopeFilter::new(with_534c, h.audit.clone())
        .run(h.repo.as_ref())
        .await
        .unwrap();
    assert_eq!(report.retained, 1);
}

#[tokio::test]
async fn test_notes_fields_supply_years() {
    let h = setup().await;
    let file = h.source_file("XYZ", "batch.xml").await;
    h.driver
        .ingest_record(
            &file,
            &bib("N1", "1", &bib_008("1968", "eng"))
                .with_data("500", &[('a', "Facsimile of the 1776 printing.")]),
        )
        .await
        .unwrap();

    let filter = ScopeFilter::new(policy(1700, 1800, &["eng"]), h.audit.clone());
    assert_eq!(filter.run(h.repo.as_ref()).await.unwrap().retained, 1);
}

#[tokio::test]
async fn test_store_failure_aborts_pass_and_keeps_decided_records() {
    let h = setup().await;
    let file = h.source_file("XYZ", "batch.xml").await;
    let mut ids = Vec::new();
    for (control_id, year) in [("R1", "1750"), ("R2", "1950"), ("R3", "1760")] {
        let record = bib(control_id, "1", &bib_008(year, "eng")).with_data("260", &[('c', year)]);
        ids.push(h.driver.ingest_record(&file, &record).await.unwrap().record_id());
    }
    let r2_fields = h.snapshot(ids[1]).await;

    h.exec_sql(
        "CREATE TRIGGER keep_r2 BEFORE DELETE ON records \
         WHEN OLD.control_identifier = 'R2' BEGIN SELECT RAISE(ABORT, 'store gone'); END",
    )
    .await;

    let filter = ScopeFilter::new(policy(1700, 1800, &[]), h.audit.clone());
    let result = filter.run(h.repo.as_ref()).await;
    assert!(matches!(result, Err(DomainError::Store(_))));

    // R1 was decided before the failure; R2 rolled back whole; R3 untouched
    assert!(h.repo.get_record(ids[0]).await.unwrap().expect("R1").processed);
    let r2 = h.repo.get_record(ids[1]).await.unwrap().expect("R2 kept");
    assert!(!r2.processed);
    assert_eq!(h.snapshot(ids[1]).await, r2_fields);
    assert!(!h.repo.get_record(ids[2]).await.unwrap().expect("R3").processed);
    assert!(h.audit.scope_failed.lock().unwrap().is_empty());

    // Next pass picks up where this one stopped
    h.exec_sql("DROP TRIGGER keep_r2").await;
    let report = filter.run(h.repo.as_ref()).await.expect("scope pass");
    assert_eq!(report.evaluated, 2);
    assert_eq!(report.purged, 1);
    assert_eq!(report.retained, 1);
}

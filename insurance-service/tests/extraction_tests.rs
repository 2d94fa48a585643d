use config_engine::ExtractionConfig;
use insurance_service::{ExtractionOutcome, ExtractionPipeline, Money, Percent};

fn pipeline() -> ExtractionPipeline {
    ExtractionPipeline::from_config(&ExtractionConfig::default()).unwrap()
}

#[test]
fn test_preferred_pcp_and_participating_urgent_care() {
    let text = "Professional (Physician) Visit - Office[PREFERRED PRIMARY CARE PHYSICIAN]:$25.00 \
                Urgent Care[PARTICIPATING]:$75.00";
    let result = pipeline().extract(text);

    assert_eq!(result.primary_copay.as_ref().map(Money::as_str), Some("25.00"));
    assert_eq!(result.urgent_copay.as_ref().map(Money::as_str), Some("75.00"));
    assert!(result.primary_coinsurance.is_none());
    assert!(result.urgent_coinsurance.is_none());
    assert_eq!(result.outcome, ExtractionOutcome::Matched);
}

#[test]
fn test_unrelated_service_yields_empty_fields() {
    let result = pipeline().extract("Some Other Service[X]:$40.00");

    assert!(result.primary_copay.is_none());
    assert!(result.primary_coinsurance.is_none());
    assert!(result.urgent_copay.is_none());
    assert!(result.urgent_coinsurance.is_none());
    assert!(result.primary_scored.is_empty());
    assert!(result.urgent_scored.is_empty());
    // Lines were found, none of them relevant
    assert_eq!(result.outcome, ExtractionOutcome::Matched);
}

#[test]
fn test_amount_over_cap_is_discarded() {
    let result = pipeline().extract("PCP[IN NETWORK]:$15,000.00");

    assert!(result.primary_copay.is_none());
    assert!(result.candidates.iter().all(|c| c.amount <= 10_000.0));
    assert_eq!(result.outcome, ExtractionOutcome::NoCandidates);
}

#[test]
fn test_office_visit_beats_infusion_for_same_service() {
    let text = "Office Visit[IN NETWORK INFUSION THERAPY]:$300.00 \
                Office Visit[IN NETWORK OFFICE VISIT]:$30.00";
    let result = pipeline().extract(text);
    assert_eq!(result.primary_copay.as_ref().map(Money::as_str), Some("30.00"));
}

#[test]
fn test_exact_keyword_wins_regardless_of_order() {
    let exact_first = "PCP[IN NETWORK]:$20.00 PCP Visit Sick[IN NETWORK OFFICE VISIT PREFERRED]:$45.00";
    let exact_last = "PCP Visit Sick[IN NETWORK OFFICE VISIT PREFERRED]:$45.00 PCP[IN NETWORK]:$20.00";

    for text in [exact_first, exact_last] {
        let result = pipeline().extract(text);
        assert_eq!(result.primary_copay.as_ref().map(Money::as_str), Some("20.00"), "{}", text);
    }
}

#[test]
fn test_specialist_line_loses_to_plain_in_network_line() {
    let text = "Physician Visit Office[SPECIALIST IN NETWORK]:$60.00 \
                Physician Visit Office[IN NETWORK]:$25.00";
    let result = pipeline().extract(text);

    assert_eq!(result.primary_copay.as_ref().map(Money::as_str), Some("25.00"));
    assert!(result.primary_scored.iter().any(|s| s.score < 0));
}

#[test]
fn test_single_winner_per_category() {
    let text = "PCP[IN NETWORK]:$25.00 PCP[IN NETWORK]:20% Urgent Care[IN NETWORK]:10%";
    let result = pipeline().extract(text);

    // The percentage line only ties the copay line, so it never takes over
    assert_eq!(result.primary_copay.as_ref().map(Money::as_str), Some("25.00"));
    assert!(result.primary_coinsurance.is_none());
    assert_eq!(result.urgent_coinsurance.as_ref().map(Percent::as_str), Some("10"));
    assert!(result.urgent_copay.is_none());
}

#[test]
fn test_out_of_network_coinsurance_does_not_join_copay_winner() {
    let text = "Primary Care[IN NETWORK OFFICE VISIT]:$25.00 Physician Visit Other[OUT OF NETWORK]:50%";
    let result = pipeline().extract(text);

    assert_eq!(result.primary_copay.as_ref().map(Money::as_str), Some("25.00"));
    assert!(result.primary_coinsurance.is_none());
}

#[test]
fn test_higher_scoring_coinsurance_line_is_kept() {
    let text = "PCP[IN NETWORK]:20% Physician Visit Office[IN NETWORK]:$40.00";
    let result = pipeline().extract(text);

    assert_eq!(result.primary_coinsurance.as_ref().map(Percent::as_str), Some("20"));
    assert!(result.primary_copay.is_none());
}

#[test]
fn test_extraction_is_idempotent() {
    let text = "Aetna Choice PCP[IN NETWORK]:$15.00\nUrgent Care[IN NETWORK]:$50.00";
    let p = pipeline();
    assert_eq!(p.extract(text), p.extract(text));
}

#[test]
fn test_whitespace_and_line_breaks_are_normalized() {
    let text = "PCP[IN\n   NETWORK]:$25.00\n\n\tUrgent   Care[IN NETWORK]:$75.00";
    let result = pipeline().extract(text);
    assert_eq!(result.primary_copay.as_ref().map(Money::as_str), Some("25.00"));
    assert_eq!(result.urgent_copay.as_ref().map(Money::as_str), Some("75.00"));
}

#[test]
fn test_cigna_seq_layout() {
    let text = "CIGNA HEALTHSPRING PREFERRED MEDICARE \
                PHYSICIAN OFFICE VISIT PCP[Seq#101 IN NETWORK]:$0.00 \
                PHYSICIAN OFFICE URGENT CARE[Seq#114 IN NETWORK]:$40.00";
    let result = pipeline().extract(text);

    assert_eq!(result.rule_set, "CIGNA");
    assert!(!result.used_default_fallback);
    assert_eq!(result.primary_copay.as_ref().map(Money::as_str), Some("0.00"));
    assert_eq!(result.urgent_copay.as_ref().map(Money::as_str), Some("40.00"));
}

#[test]
fn test_carefirst_benefit_code_layout() {
    let text = "CareFirst BlueChoice \
                OFFICE VISIT[PCP Copay (101) IN NETWORK]:$30.00 \
                Urgent Care[BCBS PROVIDERS]:$60.00";
    let result = pipeline().extract(text);

    assert_eq!(result.rule_set, "CAREFIRST");
    assert_eq!(result.primary_copay.as_ref().map(Money::as_str), Some("30.00"));
    assert_eq!(result.urgent_copay.as_ref().map(Money::as_str), Some("60.00"));
    assert!(result
        .candidates
        .iter()
        .any(|c| c.details == "PCP Copay (101)"));
}

#[test]
fn test_tricare_colon_layout() {
    let text = "TRICARE Prime Professional (Physician) Visit - Office:$15.00 Urgent Care:$30.00";
    let result = pipeline().extract(text);

    assert_eq!(result.rule_set, "TRICARE");
    assert_eq!(result.primary_copay.as_ref().map(Money::as_str), Some("15.00"));
    assert_eq!(result.urgent_copay.as_ref().map(Money::as_str), Some("30.00"));
}

#[test]
fn test_carrier_without_matches_falls_back_to_default_rules() {
    // Looks like CIGNA but has no Seq# coded lines
    let text = "CIGNA HEALTHSPRING PCP[IN NETWORK]:$10.00";
    let result = pipeline().extract(text);

    assert!(result.used_default_fallback);
    assert_eq!(result.rule_set, "DEFAULT");
    assert_eq!(result.primary_copay.as_ref().map(Money::as_str), Some("10.00"));
}

#[test]
fn test_no_lines_at_all_reports_no_candidates() {
    let result = pipeline().extract("Eligibility summary unavailable. Please call member services.");
    assert_eq!(result.outcome, ExtractionOutcome::NoCandidates);
    assert!(result.candidates.is_empty());
    assert!(!result.has_primary());
}

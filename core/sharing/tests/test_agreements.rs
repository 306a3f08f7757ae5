mod utils;

use medshare_client_model::sharing::{AgreementState, Party, Reason, SharingEventType};
use medshare_sharing::testing::AgreementError;
use medshare_sharing::testing::AgreementState as DbAgreementState;

use utils::*;

const MERCY: &str = "mercy-general";
const ST_LUKE: &str = "st-luke";
const XRAY: &str = "eq-xray-03";

#[tokio::test(flavor = "multi_thread")]
async fn one_signature_keeps_the_agreement_draft() -> anyhow::Result<()> {
    let harness =
        SharingHarness::new("one_signature_keeps_the_agreement_draft", vec![(XRAY, MERCY)])?;
    let service = &harness.service;

    let outcome = approved_request(service, borrow_request(XRAY, MERCY), ST_LUKE, MERCY).await?;
    let agreement_id = outcome.agreement.unwrap().agreement_id;

    let agreement = service
        .agreements
        .sign(&agreement_id, &tenant(MERCY), Party::Lender)
        .await?;
    assert!(agreement.signed_by_lender);
    assert!(!agreement.signed_by_borrower);
    assert_eq!(agreement.status, AgreementState::Draft);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn both_signatures_activate_exactly_once() -> anyhow::Result<()> {
    let harness =
        SharingHarness::new("both_signatures_activate_exactly_once", vec![(XRAY, MERCY)])?;
    let service = &harness.service;

    let outcome = approved_request(service, borrow_request(XRAY, MERCY), ST_LUKE, MERCY).await?;
    let agreement_id = outcome.agreement.unwrap().agreement_id;

    service
        .agreements
        .sign(&agreement_id, &tenant(MERCY), Party::Lender)
        .await?;
    let agreement = service
        .agreements
        .sign(&agreement_id, &tenant(ST_LUKE), Party::Borrower)
        .await?;
    assert!(agreement.signed_by_lender);
    assert!(agreement.signed_by_borrower);
    assert_eq!(agreement.status, AgreementState::Active);

    let events = service.query_events(0, Some(100)).await?;
    let activations = events
        .iter()
        .filter(|event| event.event_type == SharingEventType::AgreementActivated)
        .count();
    assert_eq!(activations, 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn only_the_named_party_may_sign() -> anyhow::Result<()> {
    let harness = SharingHarness::new("only_the_named_party_may_sign", vec![(XRAY, MERCY)])?;
    let service = &harness.service;

    let outcome = approved_request(service, borrow_request(XRAY, MERCY), ST_LUKE, MERCY).await?;
    let agreement_id = outcome.agreement.unwrap().agreement_id;

    // The borrower can't forge the lender's signature.
    let result = service
        .agreements
        .sign(&agreement_id, &tenant(ST_LUKE), Party::Lender)
        .await;
    assert!(matches!(result, Err(AgreementError::Unauthorized(..))));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn signing_twice_is_rejected() -> anyhow::Result<()> {
    let harness = SharingHarness::new("signing_twice_is_rejected", vec![(XRAY, MERCY)])?;
    let service = &harness.service;

    let outcome = approved_request(service, borrow_request(XRAY, MERCY), ST_LUKE, MERCY).await?;
    let agreement_id = outcome.agreement.unwrap().agreement_id;

    service
        .agreements
        .sign(&agreement_id, &tenant(MERCY), Party::Lender)
        .await?;
    let result = service
        .agreements
        .sign(&agreement_id, &tenant(MERCY), Party::Lender)
        .await;
    assert!(matches!(
        result,
        Err(AgreementError::AlreadySigned(_, Party::Lender))
    ));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn active_agreement_cannot_be_signed_again() -> anyhow::Result<()> {
    let harness =
        SharingHarness::new("active_agreement_cannot_be_signed_again", vec![(XRAY, MERCY)])?;
    let service = &harness.service;

    let outcome = approved_request(service, borrow_request(XRAY, MERCY), ST_LUKE, MERCY).await?;
    let agreement_id = outcome.agreement.unwrap().agreement_id;

    service
        .agreements
        .sign(&agreement_id, &tenant(MERCY), Party::Lender)
        .await?;
    service
        .agreements
        .sign(&agreement_id, &tenant(ST_LUKE), Party::Borrower)
        .await?;

    let result = service
        .agreements
        .sign(&agreement_id, &tenant(MERCY), Party::Lender)
        .await;
    match result {
        Err(AgreementError::InvalidState { from, .. }) => {
            assert_eq!(from, DbAgreementState::Active)
        }
        other => panic!("Expected InvalidState, got {:?}", other.map(|a| a.status)),
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn active_agreement_can_be_terminated_early() -> anyhow::Result<()> {
    let harness = SharingHarness::new(
        "active_agreement_can_be_terminated_early",
        vec![(XRAY, MERCY)],
    )?;
    let service = &harness.service;

    let outcome = approved_request(service, borrow_request(XRAY, MERCY), ST_LUKE, MERCY).await?;
    let agreement_id = outcome.agreement.unwrap().agreement_id;

    // Termination requires an active agreement.
    let result = service
        .agreements
        .terminate(&agreement_id, &tenant(MERCY), Reason::new("Recall"))
        .await;
    assert!(matches!(result, Err(AgreementError::InvalidState { .. })));

    service
        .agreements
        .sign(&agreement_id, &tenant(MERCY), Party::Lender)
        .await?;
    service
        .agreements
        .sign(&agreement_id, &tenant(ST_LUKE), Party::Borrower)
        .await?;

    let agreement = service
        .agreements
        .terminate(&agreement_id, &tenant(MERCY), Reason::new("Equipment recall"))
        .await?;
    assert_eq!(agreement.status, AgreementState::Terminated);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn disputed_agreement_is_terminal() -> anyhow::Result<()> {
    let harness = SharingHarness::new("disputed_agreement_is_terminal", vec![(XRAY, MERCY)])?;
    let service = &harness.service;

    let outcome = approved_request(service, borrow_request(XRAY, MERCY), ST_LUKE, MERCY).await?;
    let agreement_id = outcome.agreement.unwrap().agreement_id;

    service
        .agreements
        .sign(&agreement_id, &tenant(MERCY), Party::Lender)
        .await?;
    service
        .agreements
        .sign(&agreement_id, &tenant(ST_LUKE), Party::Borrower)
        .await?;
    let agreement = service
        .agreements
        .dispute(&agreement_id, &tenant(ST_LUKE), Reason::new("Damaged on arrival"))
        .await?;
    assert_eq!(agreement.status, AgreementState::Disputed);

    let result = service
        .agreements
        .terminate(&agreement_id, &tenant(MERCY), Reason::new("Too late"))
        .await;
    match result {
        Err(AgreementError::InvalidState { from, .. }) => {
            assert_eq!(from, DbAgreementState::Disputed)
        }
        other => panic!("Expected InvalidState, got {:?}", other.map(|a| a.status)),
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn outside_tenants_cannot_close_an_agreement() -> anyhow::Result<()> {
    let harness = SharingHarness::new(
        "outside_tenants_cannot_close_an_agreement",
        vec![(XRAY, MERCY)],
    )?;
    let service = &harness.service;

    let outcome = approved_request(service, borrow_request(XRAY, MERCY), ST_LUKE, MERCY).await?;
    let agreement_id = outcome.agreement.unwrap().agreement_id;

    service
        .agreements
        .sign(&agreement_id, &tenant(MERCY), Party::Lender)
        .await?;
    service
        .agreements
        .sign(&agreement_id, &tenant(ST_LUKE), Party::Borrower)
        .await?;

    let result = service
        .agreements
        .terminate(&agreement_id, &tenant("county-hospital"), Reason::new("Nope"))
        .await;
    assert!(matches!(result, Err(AgreementError::Unauthorized(..))));
    Ok(())
}

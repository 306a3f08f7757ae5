mod utils;

use medshare_client_model::sharing::{
    AgreementState, Party, RequestState, TransferState, TransferType, TransferUpdate,
};
use medshare_client_model::TransferId;
use medshare_sharing::testing::TransferError;
use medshare_sharing::testing::TransferState as DbTransferState;

use utils::*;

const MERCY: &str = "mercy-general";
const ST_LUKE: &str = "st-luke";
const PUMP: &str = "eq-pump-12";

#[tokio::test(flavor = "multi_thread")]
async fn pickup_stamps_its_timestamp() -> anyhow::Result<()> {
    let harness = SharingHarness::new("pickup_stamps_its_timestamp", vec![(PUMP, MERCY)])?;
    let service = &harness.service;

    let outcome = approved_request(service, borrow_request(PUMP, MERCY), ST_LUKE, MERCY).await?;
    let transfer_id = outcome.transfer.unwrap().transfer_id;

    let before = chrono::Utc::now();
    let transfer = service
        .transfers
        .advance(
            &transfer_id,
            &tenant(MERCY),
            TransferState::PickedUp,
            TransferUpdate {
                condition_on_pickup: Some("Good, minor scratches".to_string()),
                tracking_number: Some("MTS-4711".to_string()),
                carrier: Some("MedTrans".to_string()),
                ..Default::default()
            },
        )
        .await?;

    assert_eq!(transfer.status, TransferState::PickedUp);
    let pickup_date = transfer.pickup_date.expect("pickup must be stamped");
    assert!(pickup_date >= before && pickup_date <= chrono::Utc::now());
    assert_eq!(
        transfer.condition_on_pickup.as_deref(),
        Some("Good, minor scratches")
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn custody_steps_cannot_be_skipped() -> anyhow::Result<()> {
    let harness = SharingHarness::new("custody_steps_cannot_be_skipped", vec![(PUMP, MERCY)])?;
    let service = &harness.service;

    let outcome = approved_request(service, borrow_request(PUMP, MERCY), ST_LUKE, MERCY).await?;
    let transfer_id = outcome.transfer.unwrap().transfer_id;

    service
        .transfers
        .advance(
            &transfer_id,
            &tenant(MERCY),
            TransferState::PickedUp,
            TransferUpdate::default(),
        )
        .await?;

    // Returned directly after pickup skips transit and delivery.
    let result = service
        .transfers
        .advance(
            &transfer_id,
            &tenant(ST_LUKE),
            TransferState::Returned,
            TransferUpdate::default(),
        )
        .await;
    match result {
        Err(TransferError::InvalidTransition { from, to, .. }) => {
            assert_eq!(from, DbTransferState::PickedUp);
            assert_eq!(to, DbTransferState::Returned);
        }
        other => panic!("Expected InvalidTransition, got {:?}", other.map(|t| t.status)),
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn borrow_runs_through_delivery_return_and_completion() -> anyhow::Result<()> {
    let harness = SharingHarness::new(
        "borrow_runs_through_delivery_return_and_completion",
        vec![(PUMP, MERCY)],
    )?;
    let service = &harness.service;

    let outcome = approved_request(service, borrow_request(PUMP, MERCY), ST_LUKE, MERCY).await?;
    let request_id = outcome.request.request_id.clone();
    let agreement_id = outcome.agreement.unwrap().agreement_id;
    let outgoing_id = outcome.transfer.unwrap().transfer_id;

    service
        .agreements
        .sign(&agreement_id, &tenant(MERCY), Party::Lender)
        .await?;
    service
        .agreements
        .sign(&agreement_id, &tenant(ST_LUKE), Party::Borrower)
        .await?;

    // Outgoing leg: pickup puts the request in transit.
    let transfer = service
        .transfers
        .advance(
            &outgoing_id,
            &tenant(MERCY),
            TransferState::PickedUp,
            TransferUpdate::default(),
        )
        .await?;
    let pickup_date = transfer.pickup_date;
    assert_eq!(
        service.requests.get_request(&request_id).await?.status,
        RequestState::InTransit
    );

    service
        .transfers
        .advance(
            &outgoing_id,
            &tenant(MERCY),
            TransferState::InTransit,
            TransferUpdate::default(),
        )
        .await?;

    // Delivery activates the request and schedules the way home.
    let delivered = service
        .transfers
        .advance(
            &outgoing_id,
            &tenant(ST_LUKE),
            TransferState::Delivered,
            TransferUpdate {
                condition_on_delivery: Some("Arrived intact".to_string()),
                ..Default::default()
            },
        )
        .await?;
    assert!(delivered.delivery_date.is_some());
    // Earlier stamps survive later updates.
    assert_eq!(delivered.pickup_date, pickup_date);
    assert_eq!(
        service.requests.get_request(&request_id).await?.status,
        RequestState::Active
    );

    let transfers = service.transfers.list_transfers(&request_id).await?;
    assert_eq!(transfers.len(), 2);
    let return_leg = transfers
        .iter()
        .find(|transfer| transfer.transfer_type == TransferType::Return)
        .expect("delivery must schedule the return leg");
    assert_eq!(return_leg.status, TransferState::Scheduled);
    assert_eq!(return_leg.from_tenant_id, tenant(ST_LUKE));
    assert_eq!(return_leg.to_tenant_id, tenant(MERCY));
    assert_eq!(return_leg.scheduled_date, outcome.request.end_date);

    // Return leg: the full chain back, ending the request and the agreement.
    for step in [
        TransferState::PickedUp,
        TransferState::InTransit,
        TransferState::Delivered,
        TransferState::Returned,
    ] {
        service
            .transfers
            .advance(
                &return_leg.transfer_id,
                &tenant(ST_LUKE),
                step,
                TransferUpdate::default(),
            )
            .await?;
    }

    let request = service.requests.get_request(&request_id).await?;
    assert_eq!(request.status, RequestState::Completed);
    let agreement = service.agreements.get_agreement(&agreement_id).await?;
    assert_eq!(agreement.status, AgreementState::Completed);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn purchase_completes_on_delivery_without_return_leg() -> anyhow::Result<()> {
    let harness = SharingHarness::new(
        "purchase_completes_on_delivery_without_return_leg",
        vec![(PUMP, MERCY)],
    )?;
    let service = &harness.service;

    let outcome = approved_request(service, purchase_request(PUMP, MERCY), ST_LUKE, MERCY).await?;
    let request_id = outcome.request.request_id.clone();
    let agreement_id = outcome.agreement.unwrap().agreement_id;
    let transfer_id = outcome.transfer.unwrap().transfer_id;

    for step in [
        TransferState::PickedUp,
        TransferState::InTransit,
        TransferState::Delivered,
    ] {
        service
            .transfers
            .advance(&transfer_id, &tenant(MERCY), step, TransferUpdate::default())
            .await?;
    }

    let request = service.requests.get_request(&request_id).await?;
    assert_eq!(request.status, RequestState::Completed);

    // The equipment changed owners; nothing comes back.
    let transfers = service.transfers.list_transfers(&request_id).await?;
    assert_eq!(transfers.len(), 1);

    // Never-signed terms just stay a draft.
    let agreement = service.agreements.get_agreement(&agreement_id).await?;
    assert_eq!(agreement.status, AgreementState::Draft);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn movement_is_cancellable_until_delivered() -> anyhow::Result<()> {
    let harness =
        SharingHarness::new("movement_is_cancellable_until_delivered", vec![(PUMP, MERCY)])?;
    let service = &harness.service;

    let outcome = approved_request(service, borrow_request(PUMP, MERCY), ST_LUKE, MERCY).await?;
    let transfer_id = outcome.transfer.unwrap().transfer_id;

    service
        .transfers
        .advance(
            &transfer_id,
            &tenant(MERCY),
            TransferState::PickedUp,
            TransferUpdate::default(),
        )
        .await?;
    service
        .transfers
        .advance(
            &transfer_id,
            &tenant(MERCY),
            TransferState::InTransit,
            TransferUpdate::default(),
        )
        .await?;

    let cancelled = service
        .transfers
        .advance(
            &transfer_id,
            &tenant(MERCY),
            TransferState::Cancelled,
            TransferUpdate {
                notes: Some("Truck breakdown, rescheduling".to_string()),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(cancelled.status, TransferState::Cancelled);

    // A cancelled movement is closed for good.
    let result = service
        .transfers
        .advance(
            &transfer_id,
            &tenant(MERCY),
            TransferState::PickedUp,
            TransferUpdate::default(),
        )
        .await;
    assert!(matches!(
        result,
        Err(TransferError::InvalidTransition { .. })
    ));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn advancing_an_unknown_transfer_fails() -> anyhow::Result<()> {
    let harness = SharingHarness::new("advancing_an_unknown_transfer_fails", vec![(PUMP, MERCY)])?;

    let missing = TransferId::generate();
    let result = harness
        .service
        .transfers
        .advance(
            &missing,
            &tenant(MERCY),
            TransferState::PickedUp,
            TransferUpdate::default(),
        )
        .await;
    assert!(matches!(result, Err(TransferError::NotFound(_))));
    Ok(())
}

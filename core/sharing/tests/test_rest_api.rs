mod utils;

use actix_web::http::StatusCode;
use actix_web::{test, App};
use chrono::{Duration, Utc};
use serde_json::json;

use medshare_client_model::sharing::{
    AgreementState, DecisionOutcome, Request, RequestState, SharingEvent, Transfer,
};
use medshare_client_model::RequestId;
use medshare_sharing::{SharingService, SHARING_API_PATH};

use utils::*;

const MERCY: &str = "mercy-general";
const ST_LUKE: &str = "st-luke";
const ECMO: &str = "eq-ecmo-02";
const TENANT_HEADER: &str = "X-MedShare-Tenant";

fn url(path: &str) -> String {
    format!("{}{}", SHARING_API_PATH, path)
}

#[tokio::test(flavor = "multi_thread")]
async fn rest_round_trip_with_error_mapping() -> anyhow::Result<()> {
    let harness = SharingHarness::new("rest_round_trip_with_error_mapping", vec![(ECMO, MERCY)])?;
    let app = test::init_service(
        App::new().service(SharingService::bind_rest(harness.service.clone())),
    )
    .await;

    // No tenant header, no service.
    let response = test::call_service(
        &app,
        test::TestRequest::get().uri(&url("/requests")).to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Reversed dates are a validation error.
    let response = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&url("/requests"))
            .insert_header((TENANT_HEADER, ST_LUKE))
            .set_json(json!({
                "equipmentId": ECMO,
                "owningTenantId": MERCY,
                "requestType": "borrow",
                "startDate": Utc::now() + Duration::days(10),
                "endDate": Utc::now() + Duration::days(2),
            }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // File a proper request.
    let response = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&url("/requests"))
            .insert_header((TENANT_HEADER, ST_LUKE))
            .set_json(borrow_request(ECMO, MERCY))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let request: Request = test::read_body_json(response).await;
    assert_eq!(request.status, RequestState::Pending);

    // The requester can't decide their own request.
    let respond_url = url(&format!("/requests/{}/respond", request.request_id));
    let response = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&respond_url)
            .insert_header((TENANT_HEADER, ST_LUKE))
            .set_json(json!({ "decision": "approved" }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The owner can.
    let response = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&respond_url)
            .insert_header((TENANT_HEADER, MERCY))
            .set_json(json!({ "decision": "approved", "responseNotes": "Fine by us" }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let outcome: DecisionOutcome = test::read_body_json(response).await;
    assert_eq!(outcome.request.status, RequestState::Approved);
    let agreement = outcome.agreement.expect("agreement in decision outcome");
    let transfer = outcome.transfer.expect("transfer in decision outcome");

    // Deciding again loses the race.
    let response = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&respond_url)
            .insert_header((TENANT_HEADER, MERCY))
            .set_json(json!({ "decision": "rejected" }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Sign both sides over REST.
    let sign_url = url(&format!("/agreements/{}/sign", agreement.agreement_id));
    for (tenant, party) in [(MERCY, "lender"), (ST_LUKE, "borrower")] {
        let response = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&sign_url)
                .insert_header((TENANT_HEADER, tenant))
                .set_json(json!({ "party": party }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    let response = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&url(&format!("/agreements/{}", agreement.agreement_id)))
            .insert_header((TENANT_HEADER, MERCY))
            .to_request(),
    )
    .await;
    let agreement: medshare_client_model::sharing::Agreement =
        test::read_body_json(response).await;
    assert_eq!(agreement.status, AgreementState::Active);

    // Skipping custody steps maps to a conflict.
    let advance_url = url(&format!("/transfers/{}/advance", transfer.transfer_id));
    let response = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&advance_url)
            .insert_header((TENANT_HEADER, MERCY))
            .set_json(json!({ "newState": "delivered" }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // An in-order advance works and carries the extras.
    let response = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&advance_url)
            .insert_header((TENANT_HEADER, MERCY))
            .set_json(json!({ "newState": "pickedUp", "carrier": "MedTrans" }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let transfer: Transfer = test::read_body_json(response).await;
    assert_eq!(transfer.carrier.as_deref(), Some("MedTrans"));
    assert!(transfer.pickup_date.is_some());

    // The change feed saw the whole story.
    let response = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&url("/events?afterEventId=0&maxEvents=50"))
            .insert_header((TENANT_HEADER, MERCY))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let events: Vec<SharingEvent> = test::read_body_json(response).await;
    assert!(events.len() >= 5);

    // Page size outside the configured bounds.
    let response = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&url("/events?maxEvents=0"))
            .insert_header((TENANT_HEADER, MERCY))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_ids_map_to_not_found() -> anyhow::Result<()> {
    let harness = SharingHarness::new("unknown_ids_map_to_not_found", vec![(ECMO, MERCY)])?;
    let app = test::init_service(
        App::new().service(SharingService::bind_rest(harness.service.clone())),
    )
    .await;

    let response = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&url(&format!("/requests/{}", RequestId::generate())))
            .insert_header((TENANT_HEADER, MERCY))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // A malformed id never reaches the workflow.
    let response = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&url("/requests/not-a-request-id"))
            .insert_header((TENANT_HEADER, MERCY))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

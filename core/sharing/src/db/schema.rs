table! {
    sharing_request (id) {
        id -> Text,
        equipment_id -> Text,
        requesting_tenant_id -> Text,
        owning_tenant_id -> Text,
        request_type -> Integer,
        state -> Integer,
        start_date -> Timestamp,
        end_date -> Timestamp,
        purpose -> Nullable<Text>,
        notes -> Nullable<Text>,
        urgency -> Integer,
        response_notes -> Nullable<Text>,
        responded_at -> Nullable<Timestamp>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    sharing_agreement (id) {
        id -> Text,
        request_id -> Text,
        equipment_id -> Text,
        lender_tenant_id -> Text,
        borrower_tenant_id -> Text,
        terms -> Nullable<Text>,
        daily_rate -> Nullable<Double>,
        deposit_amount -> Nullable<Double>,
        insurance_required -> Bool,
        maintenance_responsibility -> Integer,
        start_date -> Timestamp,
        end_date -> Timestamp,
        state -> Integer,
        signed_by_lender -> Bool,
        signed_by_borrower -> Bool,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    sharing_transfer (id) {
        id -> Text,
        request_id -> Text,
        agreement_id -> Nullable<Text>,
        equipment_id -> Text,
        from_tenant_id -> Text,
        to_tenant_id -> Text,
        transfer_type -> Integer,
        state -> Integer,
        scheduled_date -> Timestamp,
        pickup_date -> Nullable<Timestamp>,
        delivery_date -> Nullable<Timestamp>,
        return_scheduled_date -> Nullable<Timestamp>,
        return_date -> Nullable<Timestamp>,
        condition_on_pickup -> Nullable<Text>,
        condition_on_delivery -> Nullable<Text>,
        tracking_number -> Nullable<Text>,
        carrier -> Nullable<Text>,
        notes -> Nullable<Text>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    sharing_event (id) {
        id -> Integer,
        event_type -> Text,
        request_id -> Text,
        agreement_id -> Nullable<Text>,
        transfer_id -> Nullable<Text>,
        issuer_tenant_id -> Text,
        reason -> Nullable<Text>,
        timestamp -> Timestamp,
    }
}

allow_tables_to_appear_in_same_query!(sharing_request, sharing_agreement, sharing_transfer);
allow_tables_to_appear_in_same_query!(sharing_request, sharing_event);

joinable!(sharing_agreement -> sharing_request (request_id));
joinable!(sharing_transfer -> sharing_request (request_id));
joinable!(sharing_event -> sharing_request (request_id));

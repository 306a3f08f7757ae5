use chrono::{NaiveDateTime, TimeZone, Utc};
use diesel::sql_types::Text;

use medshare_client_model::sharing::{
    SharingEvent as ClientEvent, SharingEventType as ClientEventType,
};
use medshare_client_model::{AgreementId, RequestId, TenantId, TransferId};

use crate::db::model::{SharingAgreement, SharingRequest, SharingTransfer};
use crate::db::schema::sharing_event;

#[derive(
    strum_macros::EnumString,
    derive_more::Display,
    AsExpression,
    FromSqlRow,
    PartialEq,
    Eq,
    Debug,
    Clone,
    Copy,
)]
#[sql_type = "Text"]
pub enum SharingEventType {
    RequestCreated,
    RequestApproved,
    RequestRejected,
    RequestCancelled,
    RequestCompleted,
    AgreementSigned,
    AgreementActivated,
    AgreementTerminated,
    AgreementDisputed,
    AgreementCompleted,
    TransferAdvanced,
    TransferCancelled,
    ReturnScheduled,
}

impl<DB: diesel::backend::Backend> diesel::types::ToSql<Text, DB> for SharingEventType
where
    String: diesel::types::ToSql<Text, DB>,
{
    fn to_sql<W: std::io::Write>(
        &self,
        out: &mut diesel::serialize::Output<W, DB>,
    ) -> diesel::serialize::Result {
        self.to_string().to_sql(out)
    }
}

impl<DB> diesel::types::FromSql<Text, DB> for SharingEventType
where
    String: diesel::types::FromSql<Text, DB>,
    DB: diesel::backend::Backend,
{
    fn from_sql(bytes: Option<&DB::RawValue>) -> diesel::deserialize::Result<Self> {
        let text = String::from_sql(bytes)?;
        Ok(text
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid SharingEventType [{}]: {}", text, e))?)
    }
}

/// Change-feed row, appended in the same transaction as the mutation it
/// describes.
#[derive(Clone, Debug, Queryable)]
pub struct SharingEvent {
    pub id: i32,
    pub event_type: SharingEventType,
    pub request_id: RequestId,
    pub agreement_id: Option<AgreementId>,
    pub transfer_id: Option<TransferId>,
    pub issuer_tenant_id: TenantId,
    pub reason: Option<String>,
    pub timestamp: NaiveDateTime,
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "sharing_event"]
pub struct NewSharingEvent {
    pub event_type: SharingEventType,
    pub request_id: RequestId,
    pub agreement_id: Option<AgreementId>,
    pub transfer_id: Option<TransferId>,
    pub issuer_tenant_id: TenantId,
    pub reason: Option<String>,
}

impl NewSharingEvent {
    pub fn request(
        event_type: SharingEventType,
        request: &SharingRequest,
        issuer: &TenantId,
        reason: Option<String>,
    ) -> NewSharingEvent {
        NewSharingEvent {
            event_type,
            request_id: request.id.clone(),
            agreement_id: None,
            transfer_id: None,
            issuer_tenant_id: issuer.clone(),
            reason,
        }
    }

    pub fn agreement(
        event_type: SharingEventType,
        agreement: &SharingAgreement,
        issuer: &TenantId,
        reason: Option<String>,
    ) -> NewSharingEvent {
        NewSharingEvent {
            event_type,
            request_id: agreement.request_id.clone(),
            agreement_id: Some(agreement.id.clone()),
            transfer_id: None,
            issuer_tenant_id: issuer.clone(),
            reason,
        }
    }

    pub fn transfer(
        event_type: SharingEventType,
        transfer: &SharingTransfer,
        issuer: &TenantId,
        reason: Option<String>,
    ) -> NewSharingEvent {
        NewSharingEvent {
            event_type,
            request_id: transfer.request_id.clone(),
            agreement_id: transfer.agreement_id.clone(),
            transfer_id: Some(transfer.id.clone()),
            issuer_tenant_id: issuer.clone(),
            reason,
        }
    }
}

impl SharingEvent {
    pub fn into_client(self) -> ClientEvent {
        ClientEvent {
            event_id: self.id,
            event_type: self.event_type.into(),
            request_id: self.request_id,
            agreement_id: self.agreement_id,
            transfer_id: self.transfer_id,
            issuer_tenant_id: self.issuer_tenant_id,
            reason: self.reason,
            event_date: Utc.from_utc_datetime(&self.timestamp),
        }
    }
}

impl From<SharingEventType> for ClientEventType {
    fn from(event_type: SharingEventType) -> Self {
        match event_type {
            SharingEventType::RequestCreated => ClientEventType::RequestCreated,
            SharingEventType::RequestApproved => ClientEventType::RequestApproved,
            SharingEventType::RequestRejected => ClientEventType::RequestRejected,
            SharingEventType::RequestCancelled => ClientEventType::RequestCancelled,
            SharingEventType::RequestCompleted => ClientEventType::RequestCompleted,
            SharingEventType::AgreementSigned => ClientEventType::AgreementSigned,
            SharingEventType::AgreementActivated => ClientEventType::AgreementActivated,
            SharingEventType::AgreementTerminated => ClientEventType::AgreementTerminated,
            SharingEventType::AgreementDisputed => ClientEventType::AgreementDisputed,
            SharingEventType::AgreementCompleted => ClientEventType::AgreementCompleted,
            SharingEventType::TransferAdvanced => ClientEventType::TransferAdvanced,
            SharingEventType::TransferCancelled => ClientEventType::TransferCancelled,
            SharingEventType::ReturnScheduled => ClientEventType::ReturnScheduled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_round_trips_as_text() {
        for event_type in [
            SharingEventType::RequestCreated,
            SharingEventType::AgreementActivated,
            SharingEventType::TransferAdvanced,
        ] {
            let parsed: SharingEventType = event_type.to_string().parse().unwrap();
            assert_eq!(event_type, parsed);
        }
        assert!("NotAnEvent".parse::<SharingEventType>().is_err());
    }
}

/// Maps a closed state enum onto the `Integer` column storing it. Unknown
/// discriminants surface as deserialization errors instead of panics, so a
/// downgraded binary refuses rows written by a newer one.
macro_rules! integer_enum_sql {
    ($name:ident) => {
        impl<DB: diesel::backend::Backend> diesel::types::ToSql<diesel::sql_types::Integer, DB>
            for $name
        where
            i32: diesel::types::ToSql<diesel::sql_types::Integer, DB>,
        {
            fn to_sql<W: std::io::Write>(
                &self,
                out: &mut diesel::serialize::Output<W, DB>,
            ) -> diesel::serialize::Result {
                (*self as i32).to_sql(out)
            }
        }

        impl<DB> diesel::types::FromSql<diesel::sql_types::Integer, DB> for $name
        where
            i32: diesel::types::FromSql<diesel::sql_types::Integer, DB>,
            DB: diesel::backend::Backend,
        {
            fn from_sql(
                bytes: Option<&DB::RawValue>,
            ) -> diesel::deserialize::Result<Self> {
                let value = i32::from_sql(bytes)?;
                Ok(num_traits::FromPrimitive::from_i32(value).ok_or_else(|| {
                    anyhow::anyhow!(
                        "Invalid conversion from {} (i32) to {}.",
                        value,
                        stringify!($name)
                    )
                })?)
            }
        }
    };
}

mod agreement;
mod event;
mod request;
mod transfer;

pub use agreement::{AgreementState, MaintenanceResponsibility, SharingAgreement};
pub use event::{NewSharingEvent, SharingEvent, SharingEventType};
pub use request::{RequestState, RequestType, SharingRequest, Urgency};
pub use transfer::{SharingTransfer, TransferAdvance, TransferState, TransferType};

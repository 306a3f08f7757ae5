use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Implements the diesel `Text` column mapping for an id newtype. Mirrors
/// what the `AsExpression`/`FromSqlRow` derives would generate, without
/// forcing a diesel dependency on plain REST clients.
#[cfg(feature = "with-diesel")]
macro_rules! diesel_text_impls {
    ($name:ident) => {
        impl<DB> diesel::serialize::ToSql<diesel::sql_types::Text, DB> for $name
        where
            DB: diesel::backend::Backend,
            String: diesel::serialize::ToSql<diesel::sql_types::Text, DB>,
        {
            fn to_sql<W: std::io::Write>(
                &self,
                out: &mut diesel::serialize::Output<W, DB>,
            ) -> diesel::serialize::Result {
                self.0.to_sql(out)
            }
        }

        impl<DB> diesel::serialize::ToSql<diesel::sql_types::Nullable<diesel::sql_types::Text>, DB>
            for $name
        where
            DB: diesel::backend::Backend,
            String: diesel::serialize::ToSql<diesel::sql_types::Text, DB>,
        {
            fn to_sql<W: std::io::Write>(
                &self,
                out: &mut diesel::serialize::Output<W, DB>,
            ) -> diesel::serialize::Result {
                self.0.to_sql(out)
            }
        }

        impl<DB> diesel::deserialize::FromSql<diesel::sql_types::Text, DB> for $name
        where
            DB: diesel::backend::Backend,
            String: diesel::deserialize::FromSql<diesel::sql_types::Text, DB>,
        {
            fn from_sql(
                bytes: Option<&DB::RawValue>,
            ) -> diesel::deserialize::Result<Self> {
                let text = String::from_sql(bytes)?;
                Ok(text.parse()?)
            }
        }

        impl diesel::expression::AsExpression<diesel::sql_types::Text> for $name {
            type Expression =
                diesel::expression::bound::Bound<diesel::sql_types::Text, $name>;

            fn as_expression(self) -> Self::Expression {
                diesel::expression::bound::Bound::new(self)
            }
        }

        impl<'a> diesel::expression::AsExpression<diesel::sql_types::Text> for &'a $name {
            type Expression =
                diesel::expression::bound::Bound<diesel::sql_types::Text, &'a $name>;

            fn as_expression(self) -> Self::Expression {
                diesel::expression::bound::Bound::new(self)
            }
        }

        impl diesel::expression::AsExpression<diesel::sql_types::Nullable<diesel::sql_types::Text>>
            for $name
        {
            type Expression = diesel::expression::bound::Bound<
                diesel::sql_types::Nullable<diesel::sql_types::Text>,
                $name,
            >;

            fn as_expression(self) -> Self::Expression {
                diesel::expression::bound::Bound::new(self)
            }
        }

        impl<'a>
            diesel::expression::AsExpression<diesel::sql_types::Nullable<diesel::sql_types::Text>>
            for &'a $name
        {
            type Expression = diesel::expression::bound::Bound<
                diesel::sql_types::Nullable<diesel::sql_types::Text>,
                &'a $name,
            >;

            fn as_expression(self) -> Self::Expression {
                diesel::expression::bound::Bound::new(self)
            }
        }

        const _: () = {
            #[derive(diesel::FromSqlRow)]
            #[diesel(foreign_derive)]
            #[allow(dead_code)]
            struct IdProxy($name);
        };
    };
}

#[cfg(not(feature = "with-diesel"))]
macro_rules! diesel_text_impls {
    ($name:ident) => {};
}

macro_rules! common_id_impls {
    ($name:ident, $error:ident) => {
        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                FromStr::from_str(&s).map_err(de::Error::custom)
            }
        }

        diesel_text_impls!($name);
    };
}

/// Record ids generated by MedShare itself: 32 lowercase hex characters
/// (a v4 uuid in simple form).
macro_rules! uuid_text_id {
    ($name:ident, $error:ident, $what:expr) => {
        #[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
        #[error("{} [{0}] has invalid format.", $what)]
        pub struct $error(pub String);

        #[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            pub fn generate() -> $name {
                $name(Uuid::new_v4().to_simple().to_string())
            }
        }

        impl FromStr for $name {
            type Err = $error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if s.len() != 32 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err($error(s.to_string()));
                }
                Ok($name(s.to_ascii_lowercase()))
            }
        }

        common_id_impls!($name, $error);
    };
}

/// Ids owned by external systems (tenant directory, equipment catalog).
/// MedShare treats them as opaque tokens; only emptiness and whitespace are
/// rejected.
macro_rules! opaque_text_id {
    ($name:ident, $error:ident, $what:expr) => {
        #[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
        #[error("{} [{0}] is empty or contains whitespace.", $what)]
        pub struct $error(pub String);

        #[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
        pub struct $name(String);

        impl FromStr for $name {
            type Err = $error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if s.is_empty() || s.chars().any(|c| c.is_whitespace()) {
                    return Err($error(s.to_string()));
                }
                Ok($name(s.to_string()))
            }
        }

        common_id_impls!($name, $error);
    };
}

uuid_text_id!(RequestId, RequestIdParseError, "Request id");
uuid_text_id!(AgreementId, AgreementIdParseError, "Agreement id");
uuid_text_id!(TransferId, TransferIdParseError, "Transfer id");

opaque_text_id!(TenantId, TenantIdParseError, "Tenant id");
opaque_text_id!(EquipmentId, EquipmentIdParseError, "Equipment id");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_request_id_round_trips() {
        let id = RequestId::generate();
        let parsed: RequestId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn request_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<RequestId>().is_err());
        assert!("".parse::<RequestId>().is_err());
        // Right length, wrong alphabet.
        assert!("zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz".parse::<RequestId>().is_err());
    }

    #[test]
    fn tenant_id_accepts_external_formats() {
        assert!("mercy-general".parse::<TenantId>().is_ok());
        assert!("urn:tenant:4711".parse::<TenantId>().is_ok());
        assert!("".parse::<TenantId>().is_err());
        assert!("two words".parse::<TenantId>().is_err());
    }
}

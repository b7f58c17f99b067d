//! The token stored in the session cookie.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::Session;

mod datetime_format {
    //! Serializes a [time::OffsetDateTime] with two-digit hours.
    //!
    //! The default serializer writes "00:00:00.000000" as "0:00:00.0", which
    //! the matching parser rejects.
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{
        OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
    };

    /// Date time format for the session expiry, e.g. "2021-01-01 00:00:00.000000 +00:00:00".
    const DATE_TIME_FORMAT: &[BorrowedFormatItem] = format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond] [offset_hour \
             sign:mandatory]:[offset_minute]:[offset_second]"
    );

    pub fn serialize<S>(dt: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = dt
            .format(DATE_TIME_FORMAT)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        OffsetDateTime::parse(&s, DATE_TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// A session together with the time it stops being valid.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Token {
    pub session: Session,

    #[serde(
        serialize_with = "datetime_format::serialize",
        deserialize_with = "datetime_format::deserialize"
    )]
    pub expires_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use time::{UtcOffset, macros::datetime};

    use crate::session::{OwnerId, Session};

    use super::Token;

    fn session() -> Session {
        Session {
            owner_id: OwnerId::new("user-1").unwrap(),
            email: Some("jo@example.com".to_owned()),
        }
    }

    #[test]
    fn serialise_token() {
        let expires_at = datetime!(2025-12-21 03:54:00).assume_offset(UtcOffset::UTC);
        let token = Token {
            session: session(),
            expires_at,
        };
        let expected = r#"{"session":{"owner_id":"user-1","email":"jo@example.com"},"expires_at":"2025-12-21 03:54:00.0 +00:00:00"}"#;

        let actual = serde_json::to_string(&token).unwrap();

        assert_eq!(expected, actual);
    }

    #[test]
    fn deserialise_token_with_midnight_expiry() {
        let expires_at = datetime!(2025-12-21 00:00:00).assume_offset(UtcOffset::UTC);
        let expected = Token {
            session: session(),
            expires_at,
        };
        let token_string = r#"{"session":{"owner_id":"user-1","email":"jo@example.com"},"expires_at":"2025-12-21 00:00:00.0 +00:00:00"}"#;

        let actual = serde_json::from_str(token_string).unwrap();

        assert_eq!(expected, actual);
    }

    #[test]
    fn deserialise_token_with_empty_owner_fails() {
        let token_string = r#"{"session":{"owner_id":"","email":null},"expires_at":"2025-12-21 00:00:00.0 +00:00:00"}"#;

        let result = serde_json::from_str::<Token>(token_string);

        assert!(result.is_err());
    }
}

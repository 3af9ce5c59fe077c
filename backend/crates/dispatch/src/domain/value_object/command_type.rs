use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::DispatchError;

/// Named commands a caller can invoke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandType {
    #[display("sendEmail")]
    SendEmail,
    #[display("searchLocations")]
    SearchLocations,
    #[display("searchPlaces")]
    SearchPlaces,
    #[display("getDirections")]
    GetDirections,
    #[display("emailHistory")]
    EmailHistory,
}

impl CommandType {
    pub const ALL: [CommandType; 5] = [
        CommandType::SendEmail,
        CommandType::SearchLocations,
        CommandType::SearchPlaces,
        CommandType::GetDirections,
        CommandType::EmailHistory,
    ];

    #[inline]
    pub const fn as_str(&self) -> &'static str {
        use CommandType::*;
        match self {
            SendEmail => "sendEmail",
            SearchLocations => "searchLocations",
            SearchPlaces => "searchPlaces",
            GetDirections => "getDirections",
            EmailHistory => "emailHistory",
        }
    }

    /// Message used when a provider fails without saying why
    #[inline]
    pub const fn fallback_message(&self) -> &'static str {
        use CommandType::*;
        match self {
            SendEmail => "Failed to send email",
            SearchLocations => "Failed to search locations",
            SearchPlaces => "Failed to search places",
            GetDirections => "Failed to get directions",
            EmailHistory => "Failed to load email history",
        }
    }

    /// Whether the command counts against the per-principal email quota
    #[inline]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, CommandType::SendEmail)
    }

    /// Whether invocations are written to the audit log
    #[inline]
    pub const fn is_audited(&self) -> bool {
        !matches!(self, CommandType::EmailHistory)
    }
}

impl FromStr for CommandType {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommandType::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| DispatchError::UnknownCommand(s.to_string()))
    }
}

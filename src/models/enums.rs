use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Unknown wire value for a closed enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid enum value for {field}: {value}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern.
///
/// Parsing is case-insensitive; extra spellings can be listed after `|`.
/// Serde goes through the same string form.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal $(| $alias:literal)*),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let upper = s.trim().to_ascii_uppercase();
                match upper.as_str() {
                    $($s $(| $alias)* => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

str_enum!(AppointmentStatus {
    Pending => "PENDING",
    Accepted => "ACCEPTED",
    Scheduled => "SCHEDULED",
    Completed => "COMPLETED",
    Cancelled => "CANCELLED" | "CANCELED",
    Rejected => "REJECTED",
});

str_enum!(CancelledBy {
    Patient => "PATIENT",
    Doctor => "DOCTOR",
    Admin => "ADMIN",
});

str_enum!(Role {
    Patient => "PATIENT" | "USER",
    Doctor => "DOCTOR" | "MEDECIN",
    Admin => "ADMIN",
});

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 6] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Accepted,
        AppointmentStatus::Scheduled,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::Rejected,
    ];
}

/// Kind of consultation. Servers send free text, so unknown values are kept.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum AppointmentType {
    #[default]
    Consultation,
    FollowUp,
    Emergency,
    Checkup,
    Routine,
    Specialist,
    Other(String),
}

impl AppointmentType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Consultation => "CONSULTATION",
            Self::FollowUp => "FOLLOW_UP",
            Self::Emergency => "EMERGENCY",
            Self::Checkup => "CHECKUP",
            Self::Routine => "ROUTINE",
            Self::Specialist => "SPECIALIST",
            Self::Other(raw) => raw,
        }
    }

    /// Lenient parse: legacy spellings map to known kinds, anything else
    /// becomes `Other`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "CONSULTATION" => Self::Consultation,
            "FOLLOW_UP" | "FOLLOW-UP" | "FOLLOWUP" => Self::FollowUp,
            "EMERGENCY" => Self::Emergency,
            "CHECKUP" | "CHECK_UP" | "CHECK-UP" => Self::Checkup,
            "ROUTINE" => Self::Routine,
            "SPECIALIST" => Self::Specialist,
            _ => Self::Other(raw.to_string()),
        }
    }
}

impl std::fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AppointmentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AppointmentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

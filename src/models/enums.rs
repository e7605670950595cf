use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Serde uses the same snake_case strings as `as_str`.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
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

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Role {
    Patient => "patient",
    Doctor => "doctor",
});

str_enum!(AlertType {
    Single => "single",
    Double => "double",
});

str_enum!(AlertStatus {
    Active => "active",
    Cancelled => "cancelled",
    Resolved => "resolved",
});

str_enum!(Frequency {
    Once => "once",
    Twice => "twice",
    Thrice => "thrice",
});

str_enum!(FoodTiming {
    BeforeFood => "before_food",
    AfterFood => "after_food",
});

impl FoodTiming {
    /// Instruction text stored on each dose schedule.
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::BeforeFood => "Before Food",
            Self::AfterFood => "After Food",
        }
    }
}

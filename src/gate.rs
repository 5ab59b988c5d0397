//! Per-area admin check.
//!
//! Plaintext shared passwords compared by string equality, with no rate
//! limiting or audit trail. This only decides which panel to show; it is a
//! placeholder and not an access control boundary.

use crate::config::Config;
use crate::models::Area;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Admin,
    Public { wrong_password: bool },
}

impl Access {
    pub fn is_admin(self) -> bool {
        matches!(self, Access::Admin)
    }
}

pub fn check_access(config: &Config, area: Area, input: &str) -> Access {
    if input.is_empty() {
        return Access::Public {
            wrong_password: false,
        };
    }

    match config.admin_password(area) {
        Some(expected) if expected == input => Access::Admin,
        _ => Access::Public {
            wrong_password: true,
        },
    }
}

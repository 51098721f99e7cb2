//! Volunteer shirt size.

use serde::{Deserialize, Serialize};

/// Shirt size collected on the getting-started page.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ShirtSize {
    XS,
    S,
    M,
    L,
    XL,
    XXL,
    XXXL,
}

impl ShirtSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShirtSize::XS => "XS",
            ShirtSize::S => "S",
            ShirtSize::M => "M",
            ShirtSize::L => "L",
            ShirtSize::XL => "XL",
            ShirtSize::XXL => "XXL",
            ShirtSize::XXXL => "XXXL",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "XS" => Some(ShirtSize::XS),
            "S" => Some(ShirtSize::S),
            "M" => Some(ShirtSize::M),
            "L" => Some(ShirtSize::L),
            "XL" => Some(ShirtSize::XL),
            "XXL" => Some(ShirtSize::XXL),
            "XXXL" => Some(ShirtSize::XXXL),
            _ => None,
        }
    }
}

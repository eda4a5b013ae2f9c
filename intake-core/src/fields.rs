//! Submission field catalogue
//!
//! Every intake answer is a free-text field. Values are trimmed on the way
//! in and absent keys become the empty string, so a `SubmissionFields` never
//! carries an "unset" state.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// FIELD LOOKUP
// ============================================================================

/// Read access to a bag of submitted form values.
pub trait FieldLookup {
    /// Value for `key`, if the key was submitted at all.
    fn field(&self, key: &str) -> Option<&str>;
}

impl FieldLookup for HashMap<String, String> {
    fn field(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

impl FieldLookup for BTreeMap<String, String> {
    fn field(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

/// Ordered form pairs: a repeated key resolves to its last occurrence.
impl FieldLookup for [(String, String)] {
    fn field(&self, key: &str) -> Option<&str> {
        self.iter()
            .rev()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

impl FieldLookup for Vec<(String, String)> {
    fn field(&self, key: &str) -> Option<&str> {
        self.as_slice().field(key)
    }
}

fn trimmed<L: FieldLookup + ?Sized>(lookup: &L, key: &str) -> String {
    lookup.field(key).map(str::trim).unwrap_or_default().to_string()
}

// ============================================================================
// TERMS AGREEMENT
// ============================================================================

/// Terms-of-service agreement, stored as "yes"/"no".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermsAgreed {
    Yes,
    #[default]
    No,
}

impl TermsAgreed {
    pub fn as_str(&self) -> &'static str {
        match self {
            TermsAgreed::Yes => "yes",
            TermsAgreed::No => "no",
        }
    }

    /// HTML checkboxes post "on" when ticked and nothing otherwise.
    pub fn from_checkbox(value: Option<&str>) -> Self {
        match value {
            Some("on") => TermsAgreed::Yes,
            _ => TermsAgreed::No,
        }
    }
}

impl fmt::Display for TermsAgreed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TermsAgreed {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s.eq_ignore_ascii_case("yes") {
            TermsAgreed::Yes
        } else {
            TermsAgreed::No
        })
    }
}

// ============================================================================
// SUBMISSION FIELDS
// ============================================================================

macro_rules! submission_fields {
    ($($field:ident),+ $(,)?) => {
        /// Trimmed answers of one intake, ready to be stored.
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct SubmissionFields {
            $(pub $field: String,)+
            pub tier: String,
            pub terms_agreed: TermsAgreed,
        }

        /// Form keys that map one-to-one onto submission columns.
        pub const FORM_FIELDS: &[&str] = &[$(stringify!($field)),+];

        impl SubmissionFields {
            /// Build from submitted values.
            ///
            /// `tier_keys` are tried in order and the first non-blank value
            /// wins; the wizard posts `plan_tier` while the single-page form
            /// posts `tier`.
            pub fn from_lookup<L: FieldLookup + ?Sized>(
                lookup: &L,
                tier_keys: &[&str],
                terms_agreed: TermsAgreed,
            ) -> Self {
                let tier = tier_keys
                    .iter()
                    .filter_map(|key| lookup.field(key))
                    .map(str::trim)
                    .find(|value| !value.is_empty())
                    .unwrap_or_default()
                    .to_string();

                Self {
                    $($field: trimmed(lookup, stringify!($field)),)+
                    tier,
                    terms_agreed,
                }
            }

            /// Text columns in storage order, `tier` last.
            pub fn text_columns(&self) -> Vec<(&'static str, &str)> {
                vec![
                    $((stringify!($field), self.$field.as_str()),)+
                    ("tier", self.tier.as_str()),
                ]
            }
        }
    };
}

submission_fields!(
    business_name,
    contact_name,
    phone,
    email,
    address,
    website,
    locations_count,
    cuisine_type,
    monthly_spend,
    monthly_sales,
    food_cost_pct,
    inventory_frequency,
    inventory_method,
    systems_used,
    vendors,
    prime_vendor_pct,
    goals,
);

/// Every stored column of a submission besides `id` and `created_at`.
pub const SUBMISSION_COLUMNS: &[&str] = &[
    "business_name",
    "contact_name",
    "phone",
    "email",
    "address",
    "website",
    "locations_count",
    "cuisine_type",
    "monthly_spend",
    "monthly_sales",
    "food_cost_pct",
    "inventory_frequency",
    "inventory_method",
    "systems_used",
    "vendors",
    "prime_vendor_pct",
    "goals",
    "tier",
    "terms_agreed",
];

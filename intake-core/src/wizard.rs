//! Onboarding wizard steps
//!
//! The wizard is a fixed sequence of eight steps. Any field may be posted at
//! any step; the catalogue below only decides what each page renders.

use std::fmt;

use crate::error::{CoreError, CoreResult};

/// Last step; completing it hands over to the commit.
pub const FINAL_STEP: u8 = 8;

/// The only step that accepts attachments.
pub const UPLOAD_STEP: u8 = 7;

/// A validated step number in `1..=FINAL_STEP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WizardStep(u8);

/// What happens after a step has been processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Advance(WizardStep),
    Commit,
}

impl WizardStep {
    pub const FIRST: WizardStep = WizardStep(1);

    pub fn new(step: u8) -> CoreResult<Self> {
        if (1..=FINAL_STEP).contains(&step) {
            Ok(Self(step))
        } else {
            Err(CoreError::StepOutOfRange {
                step,
                max: FINAL_STEP,
            })
        }
    }

    /// Parse a URL segment of the form `step-{n}`.
    pub fn from_segment(segment: &str) -> CoreResult<Self> {
        let number = segment
            .strip_prefix("step-")
            .and_then(|n| n.parse::<u8>().ok())
            .ok_or_else(|| CoreError::UnknownStep(segment.to_string()))?;
        Self::new(number)
    }

    pub fn number(&self) -> u8 {
        self.0
    }

    pub fn accepts_files(&self) -> bool {
        self.0 == UPLOAD_STEP
    }

    pub fn is_final(&self) -> bool {
        self.0 == FINAL_STEP
    }

    pub fn outcome(&self) -> StepOutcome {
        if self.is_final() {
            StepOutcome::Commit
        } else {
            StepOutcome::Advance(WizardStep(self.0 + 1))
        }
    }

    pub fn previous(&self) -> Option<WizardStep> {
        (self.0 > 1).then(|| WizardStep(self.0 - 1))
    }

    /// Path of this step's page.
    pub fn path(&self) -> String {
        format!("/onboarding/step-{}", self.0)
    }

    pub fn page(&self) -> &'static StepPage {
        &STEPS[usize::from(self.0 - 1)]
    }

    pub fn all() -> impl Iterator<Item = WizardStep> {
        (1..=FINAL_STEP).map(WizardStep)
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step-{}", self.0)
    }
}

// ============================================================================
// STEP CATALOGUE
// ============================================================================

/// Kind of input a field renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Tel,
    Url,
    Number,
    TextArea,
    Plan,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, Copy)]
pub struct StepPage {
    pub title: &'static str,
    pub blurb: &'static str,
    pub fields: &'static [FieldDef],
}

const fn field(name: &'static str, label: &'static str, kind: FieldKind) -> FieldDef {
    FieldDef { name, label, kind }
}

static STEPS: [StepPage; FINAL_STEP as usize] = [
    StepPage {
        title: "Welcome",
        blurb: "A few quick questions about your restaurant, then upload recent invoices.",
        fields: &[],
    },
    StepPage {
        title: "Tell us about your business",
        blurb: "",
        fields: &[
            field("business_name", "Business Name", FieldKind::Text),
            field("website", "Website (optional)", FieldKind::Url),
            field("locations_count", "Number of Locations", FieldKind::Number),
            field("cuisine_type", "Cuisine Type", FieldKind::Text),
            field("address", "Address", FieldKind::Text),
        ],
    },
    StepPage {
        title: "Contact Information",
        blurb: "",
        fields: &[
            field("contact_name", "Contact Name", FieldKind::Text),
            field("phone", "Phone Number", FieldKind::Tel),
            field("email", "Email Address", FieldKind::Email),
        ],
    },
    StepPage {
        title: "Operations Snapshot",
        blurb: "",
        fields: &[
            field("vendors", "Current Vendors", FieldKind::TextArea),
            field("monthly_spend", "Monthly Food Spend ($)", FieldKind::Number),
            field("monthly_sales", "Monthly Sales ($)", FieldKind::Number),
            field("food_cost_pct", "Current Food Cost %", FieldKind::Number),
            field("inventory_frequency", "Inventory Frequency", FieldKind::Text),
            field("inventory_method", "Inventory Method", FieldKind::Text),
            field("systems_used", "Systems Used", FieldKind::Text),
            field("prime_vendor_pct", "Prime Vendor %", FieldKind::Number),
        ],
    },
    StepPage {
        title: "We turn invoices into an actionable savings plan",
        blurb: "Spot price gaps by category, vendor leverage, and quick wins that move food cost down.",
        fields: &[],
    },
    StepPage {
        title: "Choose Your Plan",
        blurb: "",
        fields: &[field("plan_tier", "Plan", FieldKind::Plan)],
    },
    StepPage {
        title: "Upload Your Files",
        blurb: "Invoices, price lists, or inventory sheets (PDF, images, spreadsheets, documents).",
        fields: &[],
    },
    StepPage {
        title: "Review and Submit",
        blurb: "",
        fields: &[field("goals", "What are your goals?", FieldKind::TextArea)],
    },
];

// ============================================================================
// PLANS
// ============================================================================

/// Service plans offered at the plan-selection step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanTier {
    PurchaseReview,
    VendorNegotiation,
    InventoryAudit,
}

impl PlanTier {
    pub const ALL: [PlanTier; 3] = [
        PlanTier::PurchaseReview,
        PlanTier::VendorNegotiation,
        PlanTier::InventoryAudit,
    ];

    pub fn value(&self) -> &'static str {
        match self {
            PlanTier::PurchaseReview => "1",
            PlanTier::VendorNegotiation => "2",
            PlanTier::InventoryAudit => "3",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PlanTier::PurchaseReview => "Purchase Review & Opportunity Report",
            PlanTier::VendorNegotiation => "Vendor Negotiation & Price Comparisons",
            PlanTier::InventoryAudit => "Month-End Inventory Audit",
        }
    }

    /// Plan for a stored tier value; tiers are free text so this may miss.
    pub fn from_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.value() == value.trim())
    }
}

//! Intake Test Utilities
//!
//! Shared test infrastructure for the intake workspace:
//! - Form body builders (urlencoded and multipart)
//! - Fixtures for the standard onboarding scenarios
//! - Proptest generators for form answers

pub use intake_core::{
    SubmissionFields, TermsAgreed, WizardStep, FINAL_STEP, FORM_FIELDS, UPLOAD_STEP,
};

// ============================================================================
// FORM BODIES
// ============================================================================

/// Content type of an urlencoded form post.
pub const URLENCODED: &str = "application/x-www-form-urlencoded";

/// Boundary used by [`MultipartBody`].
pub const MULTIPART_BOUNDARY: &str = "----intake-test-boundary-7MA4YWxkTrZu0gW";

/// Content type header value matching [`MULTIPART_BOUNDARY`].
pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY)
}

/// Encode pairs as an `application/x-www-form-urlencoded` body.
pub fn urlencoded_body<K, V>(pairs: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    pairs
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                urlencoding::encode(k.as_ref()),
                urlencoding::encode(v.as_ref())
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Builder for a `multipart/form-data` body.
#[derive(Debug, Clone, Default)]
pub struct MultipartBody {
    buf: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text part.
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.open_part(&format!("form-data; name=\"{}\"", name), None);
        self.buf.extend_from_slice(value.as_bytes());
        self.buf.extend_from_slice(b"\r\n");
        self
    }

    /// Append every pair as a text part.
    pub fn texts<K, V>(self, pairs: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        pairs
            .iter()
            .fold(self, |body, (k, v)| body.text(k.as_ref(), v.as_ref()))
    }

    /// Append a file part.
    pub fn file(mut self, name: &str, filename: &str, bytes: &[u8]) -> Self {
        self.open_part(
            &format!("form-data; name=\"{}\"; filename=\"{}\"", name, filename),
            Some("application/octet-stream"),
        );
        self.buf.extend_from_slice(bytes);
        self.buf.extend_from_slice(b"\r\n");
        self
    }

    /// Close the body.
    pub fn finish(mut self) -> Vec<u8> {
        self.buf
            .extend_from_slice(format!("--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());
        self.buf
    }

    fn open_part(&mut self, disposition: &str, content_type: Option<&str>) {
        self.buf
            .extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
        self.buf.extend_from_slice(
            format!("Content-Disposition: {}\r\n", disposition).as_bytes(),
        );
        if let Some(content_type) = content_type {
            self.buf
                .extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
        }
        self.buf.extend_from_slice(b"\r\n");
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

/// Answers posted at each wizard step.
#[derive(Debug, Clone)]
pub struct WizardRun {
    /// One entry per step, `steps[0]` for step 1.
    pub steps: Vec<Vec<(String, String)>>,
    /// Files posted at the upload step.
    pub uploads: Vec<(String, Vec<u8>)>,
}

impl WizardRun {
    /// A run that posts nothing at any step.
    pub fn empty() -> Self {
        Self {
            steps: vec![Vec::new(); FINAL_STEP as usize],
            uploads: Vec::new(),
        }
    }

    pub fn answers(&self, step: u8) -> &[(String, String)] {
        self.steps
            .get(usize::from(step).saturating_sub(1))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn owned(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Business name at step 1, steps 2 through 6 empty, one menu at step 7.
pub fn tacos_inc_run() -> WizardRun {
    let mut run = WizardRun::empty();
    run.steps[0] = owned(&[("business_name", "Tacos Inc")]);
    run.uploads = vec![("menu.pdf".to_string(), b"%PDF-1.4 tacos".to_vec())];
    run
}

/// A fully answered wizard run.
pub fn complete_wizard_run() -> WizardRun {
    let mut run = WizardRun::empty();
    run.steps[1] = owned(&[
        ("business_name", "Pho Real"),
        ("website", "https://phoreal.example"),
        ("locations_count", "2"),
        ("cuisine_type", "Vietnamese"),
        ("address", "12 Main St"),
    ]);
    run.steps[2] = owned(&[
        ("contact_name", "Linh Tran"),
        ("phone", "555-0100"),
        ("email", "linh@phoreal.example"),
    ]);
    run.steps[3] = owned(&[
        ("vendors", "Sysco, local market"),
        ("monthly_spend", "18000"),
        ("monthly_sales", "60000"),
        ("food_cost_pct", "30"),
        ("inventory_frequency", "weekly"),
        ("inventory_method", "spreadsheet"),
        ("systems_used", "Toast"),
        ("prime_vendor_pct", "70"),
    ]);
    run.steps[5] = owned(&[("plan_tier", "2")]);
    run.steps[7] = owned(&[("goals", "Cut food cost by 3 points")]);
    run.uploads = vec![
        ("invoice-march.pdf".to_string(), b"%PDF march".to_vec()),
        ("prices.xlsx".to_string(), b"PK prices".to_vec()),
    ];
    run
}

/// Single-page form fields for the "Ramen House" direct submission.
pub fn ramen_house_fields() -> Vec<(String, String)> {
    owned(&[
        ("business_name", "Ramen House"),
        ("contact_name", "Kenji Sato"),
        ("email", "kenji@ramen.example"),
        ("tier", "1"),
        ("terms_agreed", "on"),
    ])
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    use super::*;
    use proptest::prelude::*;

    /// A plausible free-text answer without surrounding whitespace.
    pub fn arb_field_value() -> impl Strategy<Value = String> {
        prop_oneof![
            "[A-Za-z][A-Za-z0-9 ]{0,24}[A-Za-z0-9]",
            "[0-9]{1,6}",
            "[a-z]{1,10}@[a-z]{1,10}\\.example",
        ]
    }

    /// A wizard run whose steps post pairwise disjoint subsets of the
    /// single-page form fields.
    ///
    /// Every field is either skipped or assigned to exactly one step.
    pub fn arb_disjoint_wizard_run() -> impl Strategy<Value = WizardRun> {
        prop::collection::vec(
            prop::option::of((1..=FINAL_STEP, arb_field_value())),
            FORM_FIELDS.len(),
        )
        .prop_map(|assignments| {
            let mut run = WizardRun::empty();
            for (name, assignment) in FORM_FIELDS.iter().zip(assignments) {
                if let Some((step, value)) = assignment {
                    run.steps[usize::from(step) - 1].push((name.to_string(), value));
                }
            }
            run
        })
    }
}

//! HTML pages
//!
//! Pages are assembled with `format!`; every visitor-supplied value goes
//! through `escape` first.

use std::fmt::Write as _;

use axum::http::StatusCode;
use axum::response::Html;
use intake_core::{
    FieldDef, FieldKind, FieldLookup, PendingSubmission, PlanTier, SubmissionDetail,
    SubmissionSummary, WizardStep, ALLOWED_EXTENSIONS, FINAL_STEP, FORM_FIELDS,
};

use crate::constants::FILES_FIELD;
use crate::flow::CommitReceipt;

/// Escape text for HTML element content and quoted attributes.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | SpendSense</title>
</head>
<body>
<main>
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
        body = body
    ))
}

fn accept_attr() -> String {
    ALLOWED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{}", ext))
        .collect::<Vec<_>>()
        .join(",")
}

fn label_for(name: &str) -> String {
    WizardStep::all()
        .flat_map(|step| step.page().fields.iter())
        .find(|field| field.name == name)
        .map(|field| field.label.to_string())
        .unwrap_or_else(|| name.replace('_', " "))
}

// ============================================================================
// PUBLIC PAGES
// ============================================================================

/// Landing page with the wizard entry and the single-page form.
pub fn landing_page() -> Html<String> {
    let mut body = String::from(
        r#"<h1>Lower your food cost</h1>
<p>We review your invoices and vendor pricing and hand back a savings plan.</p>
<p><a href="/onboarding">Start onboarding</a></p>
<h2>Prefer one page?</h2>
<form method="post" action="/submit" enctype="multipart/form-data">
<input type="hidden" name="flow" value="direct">
"#,
    );

    for name in FORM_FIELDS {
        let _ = writeln!(
            body,
            r#"<label>{label} <input type="text" name="{name}"></label>"#,
            label = escape(&label_for(name)),
            name = name
        );
    }

    body.push_str(r#"<fieldset><legend>Plan</legend>"#);
    for plan in PlanTier::ALL {
        let _ = write!(
            body,
            r#"<label><input type="radio" name="tier" value="{}"> {}</label>"#,
            plan.value(),
            escape(plan.name())
        );
    }
    body.push_str("</fieldset>\n");

    let _ = write!(
        body,
        r#"<label>Files <input type="file" name="{files}" multiple accept="{accept}"></label>
<label><input type="checkbox" name="terms_agreed"> I agree to the terms of service</label>
<button type="submit">Submit</button>
</form>
"#,
        files = FILES_FIELD,
        accept = accept_attr()
    );

    layout("Welcome", &body)
}

fn render_field(field: &FieldDef, current: Option<&str>) -> String {
    let value = escape(current.unwrap_or_default());
    let label = escape(field.label);
    let name = field.name;

    let input_type = match field.kind {
        FieldKind::TextArea => {
            return format!(
                r#"<label>{label}<br><textarea name="{name}" rows="4">{value}</textarea></label>"#
            );
        }
        FieldKind::Plan => {
            let mut out = format!("<fieldset><legend>{label}</legend>");
            for plan in PlanTier::ALL {
                let checked = if current.map(str::trim) == Some(plan.value()) {
                    " checked"
                } else {
                    ""
                };
                let _ = write!(
                    out,
                    r#"<label><input type="radio" name="{name}" value="{}"{checked}> {}</label>"#,
                    plan.value(),
                    escape(plan.name())
                );
            }
            out.push_str("</fieldset>");
            return out;
        }
        FieldKind::Text => "text",
        FieldKind::Email => "email",
        FieldKind::Tel => "tel",
        FieldKind::Url => "url",
        FieldKind::Number => "number",
    };

    format!(r#"<label>{label} <input type="{input_type}" name="{name}" value="{value}"></label>"#)
}

/// One wizard step. Answers already given are shown but never modified here.
pub fn step_page(step: WizardStep, pending: Option<&PendingSubmission>) -> Html<String> {
    let page = step.page();
    let mut body = format!(
        r#"<p>Step {n} of {total}</p>
<h1>{title}</h1>
"#,
        n = step.number(),
        total = FINAL_STEP,
        title = escape(page.title)
    );
    if !page.blurb.is_empty() {
        let _ = writeln!(body, "<p>{}</p>", escape(page.blurb));
    }

    let _ = writeln!(
        body,
        r#"<form method="post" action="{}" enctype="multipart/form-data">"#,
        step.path()
    );

    for field in page.fields {
        let current = pending.and_then(|p| p.fields.field(field.name));
        body.push_str(&render_field(field, current));
        body.push('\n');
    }

    if step.accepts_files() {
        let _ = writeln!(
            body,
            r#"<input type="file" name="{}" multiple accept="{}">"#,
            FILES_FIELD,
            accept_attr()
        );
        if let Some(files) = pending.and_then(|p| p.files.as_ref()) {
            if !files.is_empty() {
                body.push_str("<p>Already uploaded (uploading again replaces them):</p><ul>");
                for file in files {
                    let _ = write!(body, "<li>{}</li>", escape(&file.filename));
                }
                body.push_str("</ul>\n");
            }
        }
    }

    if step.is_final() {
        body.push_str(&review_section(pending));
    }

    if let Some(previous) = step.previous() {
        let _ = writeln!(body, r#"<a href="{}">Back</a>"#, previous.path());
    }
    let action = if step.is_final() { "Submit" } else { "Continue" };
    let _ = writeln!(body, r#"<button type="submit">{}</button>"#, action);
    body.push_str("</form>\n");

    layout(page.title, &body)
}

fn review_section(pending: Option<&PendingSubmission>) -> String {
    let Some(pending) = pending else {
        return "<p>Nothing entered yet.</p>\n".to_string();
    };

    let mut out = String::from("<h2>Your answers</h2>\n<dl>\n");
    let mut keys: Vec<&String> = pending.fields.keys().collect();
    keys.sort();
    for key in keys {
        let value = pending.fields.field(key).unwrap_or_default();
        if value.trim().is_empty() {
            continue;
        }
        let _ = writeln!(
            out,
            "<dt>{}</dt><dd>{}</dd>",
            escape(&label_for(key)),
            escape(value)
        );
    }
    out.push_str("</dl>\n");

    let files = pending.files.as_deref().unwrap_or_default();
    let _ = writeln!(out, "<p>{} file(s) uploaded</p>", files.len());
    out
}

/// Confirmation after a commit, with any skipped-file warnings.
pub fn confirmation_page(receipt: &CommitReceipt) -> Html<String> {
    let mut body = String::from("<h1>Thank you!</h1>\n");
    let who = if receipt.business_name.is_empty() {
        "your business".to_string()
    } else {
        escape(&receipt.business_name)
    };
    let _ = writeln!(
        body,
        "<p>We received the details for {} with {} file(s). We will be in touch shortly.</p>",
        who, receipt.file_count
    );

    if !receipt.warnings.is_empty() {
        body.push_str(r#"<ul class="warnings">"#);
        for warning in &receipt.warnings {
            let _ = write!(body, "<li>{}</li>", escape(warning));
        }
        body.push_str("</ul>\n");
    }

    body.push_str(r#"<p><a href="/">Back to home</a></p>"#);
    layout("Thank you", &body)
}

/// Generic failure page.
pub fn error_page(status: StatusCode, message: &str) -> Html<String> {
    let title = status.canonical_reason().unwrap_or("Error");
    let body = format!(
        r#"<h1>{title}</h1>
<p>{message}</p>
<p><a href="/">Back to home</a></p>
"#,
        title = escape(title),
        message = escape(message)
    );
    layout(title, &body)
}

// ============================================================================
// ADMIN PAGES
// ============================================================================

/// Submission listing, in the order given.
pub fn admin_list(rows: &[SubmissionSummary]) -> Html<String> {
    let mut body = format!("<h1>Submissions</h1>\n<p>{} total</p>\n", rows.len());
    body.push_str(
        "<table>\n<thead><tr><th>ID</th><th>Created</th><th>Business</th><th>Contact</th>\
         <th>Email</th><th>Phone</th><th>Tier</th><th>Terms</th><th>Files</th></tr></thead>\n<tbody>\n",
    );

    for row in rows {
        let s = &row.submission;
        let _ = writeln!(
            body,
            r#"<tr data-id="{id}"><td><a href="/admin/submissions/{id}">{id}</a></td><td>{created}</td><td>{business}</td><td>{contact}</td><td>{email}</td><td>{phone}</td><td>{tier}</td><td>{terms}</td><td class="file-count">{files}</td></tr>"#,
            id = s.id,
            created = escape(&s.created_at),
            business = escape(&s.fields.business_name),
            contact = escape(&s.fields.contact_name),
            email = escape(&s.fields.email),
            phone = escape(&s.fields.phone),
            tier = escape(&s.fields.tier),
            terms = s.fields.terms_agreed,
            files = row.file_count
        );
    }

    body.push_str("</tbody>\n</table>\n");
    layout("Submissions", &body)
}

/// Every field of one submission with its files.
pub fn admin_detail(detail: &SubmissionDetail) -> Html<String> {
    let s = &detail.submission;
    let mut body = format!(
        "<h1>Submission {}</h1>\n<p>Created {}</p>\n<dl>\n",
        s.id,
        escape(&s.created_at)
    );

    for (column, value) in s.fields.text_columns() {
        let label = if column == "tier" {
            "Tier".to_string()
        } else {
            label_for(column)
        };
        let shown = match (column, PlanTier::from_value(value)) {
            ("tier", Some(plan)) => format!("{} ({})", escape(value), escape(plan.name())),
            _ => escape(value),
        };
        let _ = writeln!(body, "<dt>{}</dt><dd>{}</dd>", escape(&label), shown);
    }
    let _ = writeln!(
        body,
        "<dt>Terms agreed</dt><dd>{}</dd>\n</dl>",
        s.fields.terms_agreed
    );

    let _ = writeln!(body, "<h2>Files ({})</h2>\n<ul>", detail.files.len());
    for file in &detail.files {
        let _ = writeln!(
            body,
            "<li>{} <small>{} at {}</small></li>",
            escape(&file.filename),
            escape(&file.stored_path),
            escape(&file.uploaded_at)
        );
    }
    body.push_str("</ul>\n<p><a href=\"/admin\">All submissions</a></p>\n");

    layout("Submission", &body)
}

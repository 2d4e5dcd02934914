//! HTML proposal layout printed by the renderer

use rust_decimal::Decimal;
use std::fmt::Write;

use super::{format_currency, QuoteDocument};
use crate::services::totals::line_total;

const MISSING: &str = "—";

const DEFAULT_ASSUMPTIONS: &[&str] = &[
    "Client provides required administrative access.",
    "Internet connectivity maintained at all monitored locations.",
    "Hardware upgrades not included unless specified.",
    "Third-party licensing costs not included unless stated.",
];

const DEFAULT_TERMS: &[&str] = &[
    "Agreement Term: 12 / 24 / 36 Months",
    "Billing Frequency: Monthly",
    "Termination Clause: As per master services agreement",
    "All prices are exclusive of VAT.",
];

const STYLE: &str = r#"
  @page { size: A4; margin: 16mm 14mm; }
  body { font-family: Helvetica, Arial, sans-serif; color: #111; font-size: 10pt; }
  .cover { background: #111; color: #fff; height: 255mm; padding: 24mm 16mm; page-break-after: always; }
  .cover img { width: 130px; margin-bottom: 40px; }
  .cover h1 { font-size: 28pt; margin: 8px 0 24px; }
  .cover p { margin: 4px 0; }
  h2 { font-size: 11pt; text-transform: uppercase; border-left: 4px solid #111; padding-left: 8px; margin-top: 22px; }
  table { width: 100%; border-collapse: collapse; }
  th { text-align: left; color: #555; font-weight: bold; border-bottom: 1px solid #eee; padding: 6px 4px; }
  td { padding: 6px 4px; border-bottom: 1px solid #f4f4f4; }
  .num { text-align: right; }
  .meta td:first-child { color: #555; width: 35%; }
  .total { font-size: 14pt; font-weight: bold; margin-top: 12px; }
  .signatures { display: flex; gap: 40px; }
  .signatures div { flex: 1; }
  .signatures p { margin: 14px 0; }
  .cta a { color: #0a58ca; }
  footer { margin-top: 30px; color: #666; font-size: 8pt; }
"#;

pub(crate) fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Escaped value, or an em dash when absent or blank
fn or_missing(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => escape_html(v),
        _ => MISSING.to_string(),
    }
}

fn bullet_list(out: &mut String, lines: &[&str]) {
    out.push_str("<ul>");
    for line in lines {
        let _ = write!(out, "<li>{}</li>", escape_html(line));
    }
    out.push_str("</ul>");
}

fn trim_quantity(quantity: Decimal) -> String {
    quantity.normalize().to_string()
}

/// Full proposal page. `logo` is a ready-to-embed image URI.
pub fn proposal_html(doc: &QuoteDocument<'_>, logo: Option<&str>) -> String {
    let quote = doc.quote;
    let currency = quote.currency.as_str();
    let brand = escape_html(doc.brand_name);
    let issued = doc.issued_on.format("%Y-%m-%d").to_string();

    let mut out = String::with_capacity(16 * 1024);
    let _ = write!(
        out,
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{} Quote {}</title><style>{}</style></head><body>",
        brand,
        escape_html(&quote.public_id),
        STYLE
    );

    // Cover
    out.push_str("<section class=\"cover\">");
    if let Some(src) = logo {
        let _ = write!(out, "<img src=\"{}\" alt=\"{}\">", escape_html(src), brand);
    }
    let _ = write!(
        out,
        "<p>Managed Services Proposal</p><h1>{}</h1><p>Prepared by: {}</p><p>Proposal Reference: {}</p><p>Date: {}</p><p>Confidential &amp; Proprietary</p></section>",
        or_missing(Some(quote.customer.as_str())),
        brand,
        escape_html(&quote.public_id),
        issued
    );

    // Identification
    let contact = match (quote.contact_name.as_deref(), quote.contact_email.as_deref()) {
        (None, None) => MISSING.to_string(),
        (name, email) => format!("{} ({})", or_missing(name), or_missing(email)),
    };
    let expires = quote
        .expires_at
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| MISSING.to_string());
    let _ = write!(
        out,
        "<h2>{}</h2><table class=\"meta\">\
         <tr><td>Quote ID</td><td>{}</td></tr>\
         <tr><td>Prepared for</td><td>{}</td></tr>\
         <tr><td>Primary contact</td><td>{}</td></tr>\
         <tr><td>Region</td><td>{}</td></tr>\
         <tr><td>Prepared by</td><td>{}</td></tr>\
         <tr><td>Expires</td><td>{}</td></tr></table>",
        or_missing(Some(quote.name.as_str())),
        escape_html(&quote.public_id),
        or_missing(Some(quote.customer.as_str())),
        contact,
        or_missing(quote.region.as_deref()),
        or_missing(quote.owner.as_deref()),
        expires
    );

    // Scope of services
    out.push_str("<h2>Scope of Services</h2>");
    if doc.items.is_empty() {
        out.push_str("<p>No line items added.</p>");
    } else {
        out.push_str(
            "<table><tr><th>Service</th><th>Category</th><th class=\"num\">Qty</th>\
             <th class=\"num\">Unit price</th><th class=\"num\">Monthly</th></tr>",
        );
        for item in doc.items {
            let name = item
                .name
                .as_deref()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or("Service");
            let category = item
                .category
                .as_deref()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or("General");
            let quantity = match item.unit.as_deref().filter(|u| !u.trim().is_empty()) {
                Some(unit) => format!("{} {}", trim_quantity(item.quantity), escape_html(unit)),
                None => trim_quantity(item.quantity),
            };
            let _ = write!(out, "<tr><td>{}", escape_html(name));
            if let Some(description) = item.description.as_deref().filter(|d| !d.trim().is_empty()) {
                let _ = write!(out, "<br><small>{}</small>", escape_html(description));
            }
            let _ = write!(
                out,
                "</td><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td></tr>",
                escape_html(category),
                quantity,
                format_currency(item.unit_price, currency),
                format_currency(line_total(item.quantity, item.unit_price), currency)
            );
        }
        out.push_str("</table>");
    }

    // Totals
    let _ = write!(
        out,
        "<h2>Investment Summary</h2><table class=\"meta\">\
         <tr><td>Subtotal</td><td class=\"num\">{}</td></tr></table>\
         <p class=\"total\">Total Monthly Investment {} (Excl. VAT)</p>",
        format_currency(quote.subtotal, currency),
        format_currency(quote.total, currency)
    );

    out.push_str("<h2>Assumptions &amp; Exclusions</h2>");
    if quote.assumptions.0.is_empty() {
        bullet_list(&mut out, DEFAULT_ASSUMPTIONS);
    } else {
        let lines: Vec<&str> = quote.assumptions.0.iter().map(String::as_str).collect();
        bullet_list(&mut out, &lines);
    }

    out.push_str("<h2>Terms</h2>");
    if quote.terms.0.is_empty() {
        bullet_list(&mut out, DEFAULT_TERMS);
    } else {
        let lines: Vec<&str> = quote.terms.0.iter().map(String::as_str).collect();
        bullet_list(&mut out, &lines);
    }

    // Acceptance
    let signature_block = "<p>Name: ____________________________</p>\
         <p>Title: ____________________________</p>\
         <p>Signature: ________________________</p>\
         <p>Date: ____________</p>";
    let _ = write!(
        out,
        "<h2>Agreement &amp; Acceptance</h2><div class=\"signatures\">\
         <div><strong>For Client</strong>{}</div><div><strong>For {}</strong>{}</div></div>",
        signature_block, brand, signature_block
    );

    let accept_url = escape_html(&doc.accept_url());
    let review_url = escape_html(&doc.review_url());
    let _ = write!(
        out,
        "<h2>Next Steps</h2><p class=\"cta\">Accept this quote online: <a href=\"{0}\">{0}</a></p>\
         <p class=\"cta\">Review online: <a href=\"{1}\">{1}</a></p>\
         <footer>{2} &bull; {3}</footer></body></html>",
        accept_url, review_url, brand, issued
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Quote, QuoteItem, QuoteStatus};
    use chrono::{NaiveDate, Utc};
    use sqlx::types::Json;

    fn bare_quote() -> Quote {
        Quote {
            id: 1,
            public_id: "Q-2026-1234".to_string(),
            name: String::new(),
            customer: "Acme <Bank>".to_string(),
            contact_name: None,
            contact_email: None,
            region: None,
            owner: None,
            status: QuoteStatus::Draft,
            currency: "ZAR".to_string(),
            created_at: Utc::now(),
            expires_at: None,
            sent_at: None,
            viewed_at: None,
            accepted_at: None,
            assumptions: Json(vec![]),
            terms: Json(vec![]),
            subtotal: Decimal::from(6500),
            total: Decimal::from(6500),
        }
    }

    fn document<'a>(quote: &'a Quote, items: &'a [QuoteItem]) -> QuoteDocument<'a> {
        QuoteDocument {
            quote,
            items,
            brand_name: "Continuate",
            base_url: "https://portal.example/",
            issued_on: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        }
    }

    #[test]
    fn test_renders_with_only_required_fields() {
        let quote = bare_quote();
        let html = proposal_html(&document(&quote, &[]), None);

        assert!(html.contains("Q-2026-1234"));
        assert!(html.contains("Acme &lt;Bank&gt;"));
        assert!(html.contains("No line items added."));
        assert!(html.contains("<tr><td>Expires</td><td>—</td></tr>"));
        assert!(html.contains("<tr><td>Primary contact</td><td>—</td></tr>"));
        assert!(html.contains(DEFAULT_ASSUMPTIONS[0]));
        assert!(html.contains("R6,500 (Excl. VAT)"));
        assert!(html.contains("https://portal.example/quote/Q-2026-1234/accept"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn test_item_rows_use_fallbacks_and_line_totals() {
        let quote = Quote {
            currency: "XXX".to_string(),
            assumptions: Json(vec!["Remote access via VPN".to_string()]),
            ..bare_quote()
        };
        let items = vec![QuoteItem {
            id: 1,
            quote_id: 1,
            name: None,
            category: Some(" ".to_string()),
            description: None,
            unit: Some("seat".to_string()),
            quantity: Decimal::from(2),
            unit_price: Decimal::from(750),
            sla_tier: None,
            kpi_tags: Json(vec![]),
        }];
        let html = proposal_html(&document(&quote, &items), Some("data:image/png;base64,AAAA"));

        assert!(html.contains("<tr><td>Service</td><td>General</td>"));
        assert!(html.contains("2 seat"));
        assert!(html.contains("XXX 750"));
        assert!(html.contains("XXX 1500"));
        assert!(html.contains("Remote access via VPN"));
        assert!(!html.contains(DEFAULT_ASSUMPTIONS[0]));
        assert!(html.contains("<img src=\"data:image/png;base64,AAAA\""));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a & \"b\" <c>"), "a &amp; &quot;b&quot; &lt;c&gt;");
    }
}

use anyhow::anyhow;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::crawler::models::{ContractRecord, Listing};

static TABLE: Lazy<Selector> = Lazy::new(|| selector("table"));
static CELL: Lazy<Selector> = Lazy::new(|| selector("td"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| selector("a[href]"));
static IFRAME: Lazy<Selector> = Lazy::new(|| selector("iframe[src]"));
static ENTRY_LINK: Lazy<Selector> = Lazy::new(|| selector(".flip-entry-info > a[href]"));
static ENTRY_TITLE: Lazy<Selector> = Lazy::new(|| selector(".flip-entry-title"));
static FORM: Lazy<Selector> = Lazy::new(|| selector("form"));
static FORM_FIELD: Lazy<Selector> =
    Lazy::new(|| selector("input[name], select[name], textarea[name]"));
static OPTION: Lazy<Selector> = Lazy::new(|| selector("option"));

const TITLE_CELL: usize = 2;
const NUMBER_CELL: usize = 4;
const DATES_CELL: usize = 6;
const LINK_CELL: usize = 10;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

/// A contract table from the members portal: base record plus the link to
/// its document page.
#[derive(Debug, Clone)]
pub struct ContractRow {
    pub record: ContractRecord,
    pub detail_link: Option<String>,
}

pub fn extract_contract_rows(html: &str, source_url: &str) -> Vec<ContractRow> {
    let document = Html::parse_document(html);
    let mut rows = Vec::new();

    for table in document.select(&TABLE) {
        let cells: Vec<ElementRef> = table.select(&CELL).collect();
        if cells.len() <= LINK_CELL {
            debug!(cells = cells.len(), "Skipping table without contract layout");
            continue;
        }

        let (effective, expiration) = parse_date_range(&element_text(cells[DATES_CELL]));
        let detail_link = cells[LINK_CELL]
            .select(&ANCHOR)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string);

        rows.push(ContractRow {
            record: ContractRecord::base(
                source_url,
                element_text(cells[TITLE_CELL]),
                element_text(cells[NUMBER_CELL]),
                effective,
                expiration,
            ),
            detail_link,
        });
    }

    rows
}

/// Href of the pagination anchor leading to `page`, preferring
/// "Go to Page N" over "Skip to Page N". Anchors whose href only drives
/// script (`#`, `javascript:`) are ignored.
pub fn next_page_link(html: &str, page: u32) -> Option<String> {
    let document = Html::parse_document(html);

    ["Go to Page", "Skip to Page"].iter().find_map(|label| {
        let sel = Selector::parse(&format!("a[aria-label=\"{label} {page}\"]")).ok()?;
        document
            .select(&sel)
            .filter_map(|a| a.value().attr("href"))
            .find_map(navigable_href)
            .map(str::to_string)
    })
}

/// The href itself when following it would load another page.
pub fn navigable_href(href: &str) -> Option<&str> {
    let href = href.trim();
    let scripted = href
        .get(..11)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("javascript:"));

    if href.is_empty() || href.starts_with('#') || scripted {
        None
    } else {
        Some(href)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMethod {
    Get,
    Post,
}

/// The request a click on an element amounts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    Follow(String),
    Submit {
        method: FormMethod,
        action: String,
        fields: Vec<(String, String)>,
    },
}

/// Works out what clicking `target` does: anchors are followed, submit
/// controls send their form with its current field values plus their own
/// name/value pair.
pub fn activation(html: &str, target: &str, base: &Url) -> anyhow::Result<Activation> {
    let document = Html::parse_document(html);
    let sel = Selector::parse(target).map_err(|e| anyhow!("invalid selector {target:?}: {e}"))?;
    let el = document
        .select(&sel)
        .next()
        .ok_or_else(|| anyhow!("{target:?} not found on {base}"))?;

    if el.value().name() == "a" {
        let href = el
            .value()
            .attr("href")
            .and_then(navigable_href)
            .ok_or_else(|| anyhow!("{target:?} has no navigable href"))?;
        return Ok(Activation::Follow(base.join(href)?.to_string()));
    }

    let form = el
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "form")
        .or_else(|| {
            let id = el.value().attr("form")?;
            document
                .select(&FORM)
                .find(|f| f.value().attr("id") == Some(id))
        })
        .ok_or_else(|| anyhow!("{target:?} is not part of a form"))?;

    let action = match form.value().attr("action").map(str::trim) {
        Some(action) if !action.is_empty() => base.join(action)?,
        _ => base.clone(),
    };

    let method = match form.value().attr("method") {
        Some(m) if m.eq_ignore_ascii_case("get") => FormMethod::Get,
        _ => FormMethod::Post,
    };

    let mut fields = form_fields(form);
    if let Some(name) = el.value().attr("name") {
        fields.push((name.to_string(), el.value().attr("value").unwrap_or_default().to_string()));
    }

    Ok(Activation::Submit {
        method,
        action: action.to_string(),
        fields,
    })
}

fn form_fields(form: ElementRef) -> Vec<(String, String)> {
    let mut fields = Vec::new();

    for field in form.select(&FORM_FIELD) {
        let el = field.value();
        let Some(name) = el.attr("name") else {
            continue;
        };
        if el.attr("disabled").is_some() {
            continue;
        }

        let value = match el.name() {
            "textarea" => field.text().collect::<String>(),
            "select" => {
                let options: Vec<ElementRef> = field.select(&OPTION).collect();
                let chosen = options
                    .iter()
                    .find(|o| o.value().attr("selected").is_some())
                    .or(options.first());
                match chosen {
                    Some(o) => o
                        .value()
                        .attr("value")
                        .map(str::to_string)
                        .unwrap_or_else(|| element_text(*o)),
                    None => continue,
                }
            }
            _ => {
                let kind = el.attr("type").unwrap_or("text").to_ascii_lowercase();
                match kind.as_str() {
                    "submit" | "button" | "image" | "reset" | "file" => continue,
                    "checkbox" | "radio" if el.attr("checked").is_none() => continue,
                    "checkbox" | "radio" => el.attr("value").unwrap_or("on").to_string(),
                    _ => el.attr("value").unwrap_or_default().to_string(),
                }
            }
        };

        fields.push((name.to_string(), value));
    }

    fields
}

pub fn frame_sources(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&IFRAME)
        .filter_map(|el| el.value().attr("src"))
        .map(str::to_string)
        .collect()
}

/// Titles and links of an embedded Drive folder view.
pub fn parse_listing(html: &str) -> Listing {
    let document = Html::parse_document(html);

    let urls = document
        .select(&ENTRY_LINK)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .collect();
    let titles = document.select(&ENTRY_TITLE).map(element_text).collect();

    Listing::from_parallel(titles, urls)
}

pub fn contains_selector(html: &str, css: &str) -> anyhow::Result<bool> {
    let sel = Selector::parse(css)
        .map_err(|e| anyhow::anyhow!("invalid selector {css:?}: {e}"))?;
    Ok(Html::parse_document(html).select(&sel).next().is_some())
}

/// Splits the portal's date column into (effective, expiration).
///
/// "01/01/2023 - 12/31/2023; Renewed 01/01/2024 to 12/31/2024" takes the start of
/// the first segment and the end of the last one. Without `;` the column is a plain
/// `start - end` range.
pub fn parse_date_range(raw: &str) -> (String, String) {
    if raw.contains(';') {
        let first = raw.split(';').next().unwrap_or_default();
        let last = raw.rsplit(';').next().unwrap_or_default();
        let effective = first.split('-').next().unwrap_or_default();
        let expiration = last.rsplit("to").next().unwrap_or_default();
        (effective.trim().to_string(), expiration.trim().to_string())
    } else {
        let effective = raw.split('-').next().unwrap_or_default();
        let expiration = raw.rsplit('-').next().unwrap_or_default();
        (effective.trim().to_string(), expiration.trim().to_string())
    }
}

fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

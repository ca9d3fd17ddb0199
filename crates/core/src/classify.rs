//! Document classification by region text and keywords.
//!
//! A company is recognised when its name appears inside one of its
//! configured regions; the document type is the first configured type whose
//! text representation appears anywhere on page 1.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::geometry::BBox;
use crate::layout::TextSettings;
use crate::page::PageSource;

fn default_page() -> usize {
    1
}

/// A region to read, in top-down page coordinates (`y0` is the top edge).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    /// 1-based.
    #[serde(default = "default_page")]
    pub page: usize,
}

impl Region {
    pub fn to_bbox(&self) -> Result<BBox> {
        BBox::new(self.x0, self.y0, self.x1, self.y1)
    }
}

/// How to recognise one company's documents.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub company: String,
    #[serde(default)]
    pub coordinates: Vec<Region>,
    /// Document type id to the texts that identify it, in priority order.
    #[serde(default)]
    pub insurance_types: IndexMap<String, Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub company: String,
    pub document_type: String,
}

/// Text of `region`, or `None` when its page does not exist.
///
/// A region that does not fit on the page reads as empty text.
fn region_text<S>(source: &S, region: &Region, settings: &TextSettings) -> Option<String>
where
    S: PageSource + ?Sized,
{
    let page = source.page(region.page).ok()?;
    let text = region
        .to_bbox()
        .and_then(|bbox| page.crop(bbox))
        .map(|cropped| cropped.extract_text(settings));
    match text {
        Ok(text) => Some(text),
        Err(err) => {
            warn!(page = region.page, %err, "could not read region");
            Some(String::new())
        }
    }
}

/// The first profile whose name appears in one of its regions.
pub fn detect_company<'p, S>(
    source: &S,
    profiles: &'p [CompanyProfile],
    settings: &TextSettings,
) -> Option<&'p CompanyProfile>
where
    S: PageSource + ?Sized,
{
    profiles
        .iter()
        .filter(|profile| !profile.company.is_empty())
        .find(|profile| {
            profile.coordinates.iter().any(|region| {
                region_text(source, region, settings)
                    .is_some_and(|text| text.contains(profile.company.as_str()))
            })
        })
}

/// The first type id of `profile` with a representation on page 1.
pub fn detect_document_type<'p, S>(
    source: &S,
    profile: &'p CompanyProfile,
    settings: &TextSettings,
) -> Option<&'p str>
where
    S: PageSource + ?Sized,
{
    let full_text = source.page(1).ok()?.extract_text(settings);
    let found = profile.insurance_types.iter().find_map(|(type_id, texts)| {
        texts
            .iter()
            .any(|t| !t.is_empty() && full_text.contains(t.as_str()))
            .then_some(type_id.as_str())
    });
    if found.is_none() {
        debug!(company = %profile.company, "no document type matched");
    }
    found
}

/// Company and document type, when both are recognised.
pub fn classify<S>(
    source: &S,
    profiles: &[CompanyProfile],
    settings: &TextSettings,
) -> Option<Classification>
where
    S: PageSource + ?Sized,
{
    let profile = detect_company(source, profiles, settings)?;
    let document_type = detect_document_type(source, profile, settings)?;
    Some(Classification {
        company: profile.company.clone(),
        document_type: document_type.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{Glyph, PageObject};
    use crate::page::{Document, Page};

    fn page(page_number: usize, lines: &[(&str, f64)]) -> Page {
        let objects: Vec<PageObject> = lines
            .iter()
            .flat_map(|&(text, top)| {
                text.chars().enumerate().map(move |(i, c)| {
                    let x = 10.0 + 5.0 * i as f64;
                    let bbox = BBox::new(x, top, x + 5.0, top + 10.0).unwrap();
                    PageObject::from(Glyph::new(page_number, bbox, c.to_string(), "F", 10.0))
                })
            })
            .collect();
        Page::new(page_number, BBox::new(0.0, 0.0, 300.0, 300.0).unwrap(), objects)
    }

    fn profile(company: &str, top: f64, types: Vec<(&str, Vec<&str>)>) -> CompanyProfile {
        CompanyProfile {
            company: company.to_string(),
            coordinates: vec![Region {
                x0: 0.0,
                y0: top - 2.0,
                x1: 200.0,
                y1: top + 12.0,
                page: 1,
            }],
            insurance_types: types
                .into_iter()
                .map(|(id, texts)| (id.to_string(), texts.into_iter().map(String::from).collect()))
                .collect(),
        }
    }

    fn doc() -> Document {
        Document::new(vec![page(1, &[("ACME", 10.0), ("Motor", 50.0)])])
    }

    #[test]
    fn company_found_in_its_region() {
        let profiles = vec![
            profile("Globex", 10.0, vec![]),
            profile("ACME", 10.0, vec![]),
        ];
        let found = detect_company(&doc(), &profiles, &TextSettings::default()).unwrap();
        assert_eq!(found.company, "ACME");
    }

    #[test]
    fn name_outside_region_does_not_count() {
        let profiles = vec![profile("ACME", 50.0, vec![])];
        assert!(detect_company(&doc(), &profiles, &TextSettings::default()).is_none());
    }

    #[test]
    fn missing_page_is_skipped() {
        let mut p = profile("ACME", 10.0, vec![]);
        let elsewhere = Region { page: 4, ..p.coordinates[0] };
        p.coordinates.insert(0, elsewhere);
        let profiles = vec![p];
        assert!(detect_company(&doc(), &profiles, &TextSettings::default()).is_some());
    }

    #[test]
    fn classification_needs_company_and_type() {
        let settings = TextSettings::default();
        let types = vec![("home", vec!["Home"]), ("motor", vec!["Motor", "Car"])];
        let matched = vec![profile("ACME", 10.0, types)];
        assert_eq!(
            classify(&doc(), &matched, &settings),
            Some(Classification {
                company: "ACME".into(),
                document_type: "motor".into(),
            })
        );

        let unmatched = vec![profile("ACME", 10.0, vec![("home", vec!["Home"])])];
        assert_eq!(classify(&doc(), &unmatched, &settings), None);
    }

    #[test]
    fn profiles_parse_from_json() {
        let raw = r#"[{
            "company": "ACME",
            "coordinates": [{"x0": 0, "y0": 8, "x1": 200, "y1": 22}],
            "insurance_types": {"motor": ["Motor"]}
        }]"#;
        let profiles: Vec<CompanyProfile> = serde_json::from_str(raw).unwrap();
        assert_eq!(profiles[0].coordinates[0].page, 1);
        let result = classify(&doc(), &profiles, &TextSettings::default()).unwrap();
        assert_eq!(result.document_type, "motor");
    }
}

//! schema.org JSON-LD extraction shared by the schema and local checks.

use serde_json::Value;
use siteaudit_fetcher::Document;

/// `@type` values treated as a local business (schema.org `LocalBusiness`
/// and its common subtypes).
pub(crate) const LOCAL_BUSINESS_TYPES: &[&str] = &[
    "LocalBusiness",
    "Store",
    "Restaurant",
    "FoodEstablishment",
    "CafeOrCoffeeShop",
    "Bakery",
    "BarOrPub",
    "ProfessionalService",
    "HomeAndConstructionBusiness",
    "Plumber",
    "Electrician",
    "HVACBusiness",
    "RoofingContractor",
    "GeneralContractor",
    "HousePainter",
    "Locksmith",
    "MovingCompany",
    "AutomotiveBusiness",
    "AutoRepair",
    "AutoDealer",
    "MedicalBusiness",
    "MedicalClinic",
    "Dentist",
    "Physician",
    "LegalService",
    "Attorney",
    "AccountingService",
    "FinancialService",
    "InsuranceAgency",
    "RealEstateAgent",
    "HealthAndBeautyBusiness",
    "BeautySalon",
    "HairSalon",
    "DaySpa",
    "ExerciseGym",
    "LodgingBusiness",
    "Hotel",
    "ChildCare",
    "DryCleaningOrLaundry",
    "EmergencyService",
    "PetStore",
    "VeterinaryCare",
];

/// Flattened JSON-LD nodes from every block on a page.
#[derive(Debug, Default)]
pub(crate) struct JsonLd {
    pub(crate) items: Vec<Value>,
    pub(crate) blocks: usize,
    pub(crate) invalid_blocks: usize,
}

impl JsonLd {
    /// Parses every `application/ld+json` block. Top-level arrays and
    /// `@graph` containers (at any depth) are expanded into `items`.
    pub(crate) fn collect(document: &Document) -> Self {
        let mut out = Self::default();
        for block in document.json_ld_blocks() {
            out.blocks += 1;
            match serde_json::from_str::<Value>(block) {
                Ok(value) => flatten(value, &mut out.items),
                Err(_) => out.invalid_blocks += 1,
            }
        }
        out
    }

    /// Every `@type` across all items, deduplicated in first-seen order.
    pub(crate) fn types(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for item in &self.items {
            for t in item_types(item) {
                if !seen.iter().any(|s: &String| s == t) {
                    seen.push(t.to_string());
                }
            }
        }
        seen
    }

    pub(crate) fn has_type(&self, candidates: &[&str]) -> bool {
        self.items.iter().any(|item| is_any_type(item, candidates))
    }

    /// Items whose `@type` matches one of `candidates`.
    pub(crate) fn items_of<'a>(
        &'a self,
        candidates: &'a [&'a str],
    ) -> impl Iterator<Item = &'a Value> + 'a {
        self.items
            .iter()
            .filter(move |item| is_any_type(item, candidates))
    }
}

fn flatten(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten(item, out);
            }
        }
        Value::Object(mut map) => {
            if let Some(graph) = map.remove("@graph") {
                flatten(graph, out);
            }
            if !map.is_empty() {
                out.push(Value::Object(map));
            }
        }
        _ => {}
    }
}

/// `@type` may be a plain string or an array of strings.
pub(crate) fn item_types(item: &Value) -> Vec<&str> {
    match item.get("@type") {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(arr)) => arr.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn is_any_type(item: &Value, candidates: &[&str]) -> bool {
    item_types(item).iter().any(|t| {
        let bare = t.rsplit(['/', ':']).next().unwrap_or(t);
        candidates.iter().any(|c| bare.eq_ignore_ascii_case(c))
    })
}

pub mod boundaries;

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::store::Datastore;

pub use boundaries::GeoBoundaries;

/// GeoJSON property that carries the canonical state name.
pub const FEATURE_NAME_KEY: &str = "properties.st_nm";

/// Fact-table state slugs and the canonical names the boundary file uses.
/// Several canonical spellings are irregular; they must match the boundary
/// file, not modern official names.
pub const STATE_NAME_MAP: [(&str, &str); 35] = [
    ("andaman-&-nicobar-islands", "Andaman & Nicobar Island"),
    ("andhra-pradesh", "Andhra Pradesh"),
    ("arunachal-pradesh", "Arunanchal Pradesh"),
    ("assam", "Assam"),
    ("bihar", "Bihar"),
    ("chandigarh", "Chandigarh"),
    ("chhattisgarh", "Chhattisgarh"),
    ("dadra-&-nagar-haveli-&-daman-&-diu", "Dadara & Nagar Havelli"),
    ("delhi", "NCT of Delhi"),
    ("goa", "Goa"),
    ("gujarat", "Gujarat"),
    ("haryana", "Haryana"),
    ("himachal-pradesh", "Himachal Pradesh"),
    ("jammu-&-kashmir", "Jammu & Kashmir"),
    ("jharkhand", "Jharkhand"),
    ("karnataka", "Karnataka"),
    ("kerala", "Kerala"),
    ("lakshadweep", "Lakshadweep"),
    ("madhya-pradesh", "Madhya Pradesh"),
    ("maharashtra", "Maharashtra"),
    ("manipur", "Manipur"),
    ("meghalaya", "Meghalaya"),
    ("mizoram", "Mizoram"),
    ("nagaland", "Nagaland"),
    ("odisha", "Odisha"),
    ("puducherry", "Puducherry"),
    ("punjab", "Punjab"),
    ("rajasthan", "Rajasthan"),
    ("sikkim", "Sikkim"),
    ("tamil-nadu", "Tamil Nadu"),
    ("telangana", "Telangana"),
    ("tripura", "Tripura"),
    ("uttar-pradesh", "Uttar Pradesh"),
    ("uttarakhand", "Uttarakhand"),
    ("west-bengal", "West Bengal"),
];

static CANONICAL_BY_SLUG: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| STATE_NAME_MAP.iter().copied().collect());

pub fn canonical_state_name(slug: &str) -> Option<&'static str> {
    CANONICAL_BY_SLUG.get(slug).copied()
}

/// Total transaction amount per canonical state name, optionally restricted
/// to one year. Slugs without a canonical mapping are excluded from the
/// result; the gap is a known data-quality issue, not an error.
pub async fn aggregate_by_state(
    store: &dyn Datastore,
    year: Option<u16>,
) -> Result<BTreeMap<String, f64>> {
    let totals = store.state_transaction_totals(year).await?;
    let mut by_canonical = BTreeMap::new();
    for total in totals {
        match canonical_state_name(&total.state) {
            Some(name) => {
                *by_canonical.entry(name.to_string()).or_insert(0.0) += total.total_amount;
            }
            None => {
                debug!(state = %total.state, "state slug missing from boundary name map, skipping");
            }
        }
    }
    Ok(by_canonical)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn mapping_has_35_distinct_canonical_names() {
        let canonical: BTreeSet<&str> = STATE_NAME_MAP.iter().map(|(_, name)| *name).collect();
        assert_eq!(canonical.len(), 35);
        assert!(canonical.iter().all(|name| !name.is_empty()));
    }

    #[test]
    fn slugs_are_distinct() {
        let slugs: BTreeSet<&str> = STATE_NAME_MAP.iter().map(|(slug, _)| *slug).collect();
        assert_eq!(slugs.len(), 35);
    }

    #[test]
    fn irregular_spellings_are_preserved() {
        assert_eq!(canonical_state_name("delhi"), Some("NCT of Delhi"));
        assert_eq!(
            canonical_state_name("arunachal-pradesh"),
            Some("Arunanchal Pradesh")
        );
        assert_eq!(
            canonical_state_name("dadra-&-nagar-haveli-&-daman-&-diu"),
            Some("Dadara & Nagar Havelli")
        );
        assert_eq!(canonical_state_name("bihar"), Some("Bihar"));
    }

    #[test]
    fn unknown_slug_maps_to_none() {
        assert_eq!(canonical_state_name("ladakh"), None);
        assert_eq!(canonical_state_name(""), None);
    }
}

//! State a listing page keeps in its URL so filters survive reloads and can be shared.

use serde::{Deserialize, Serialize};

use crate::{facet::FacetSelection, listing_sorter::SortKey, url_param::UrlParam};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingViewState {
    pub selection: FacetSelection,
    pub sort_key: SortKey,
    pub page: u64,
}

impl Default for ListingViewState {
    fn default() -> Self {
        Self {
            selection: FacetSelection::default(),
            sort_key: SortKey::Default,
            page: 1,
        }
    }
}

impl ListingViewState {
    pub fn to_url_param(&self) -> String {
        UrlParam::from(self.clone()).to_string()
    }

    /// Undecodable URL state falls back to a fresh page.
    pub fn from_url_param(param: &str) -> Self {
        param.parse::<UrlParam<Self>>().map(UrlParam::into_inner).unwrap_or_default()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::facet::FacetField;
    use crate::url_param::StateParseError;

    #[test]
    fn url_state_round_trips_selection_order() {
        let mut state = ListingViewState::default();
        state.selection.insert(FacetField::Brand, "Mazda");
        state.selection.insert(FacetField::Brand, "Kia");
        state.selection.insert(FacetField::Year, 2022_i64);
        state.selection.set_price_range(300_000_000, 1_500_000_000);
        state.sort_key = SortKey::PriceHigh;
        state.page = 3;

        let encoded = state.to_url_param();
        assert!(encoded.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '=')));

        let decoded = ListingViewState::from_url_param(&encoded);
        assert_eq!(decoded, state);
        let brands = decoded.selection.brands.iter().map(|v| v.to_string()).collect::<Vec<_>>();
        assert_eq!(brands, vec!["Mazda", "Kia"]);
    }

    #[test]
    fn broken_url_state_is_reported_and_falls_back() {
        let err = "not base64!".parse::<UrlParam<ListingViewState>>().unwrap_err();
        assert!(matches!(err, StateParseError::DecodeError(_)));

        let err = "AAAA".parse::<UrlParam<ListingViewState>>().unwrap_err();
        assert!(matches!(err, StateParseError::CiboriumError(_)));

        assert_eq!(ListingViewState::from_url_param("%%%"), ListingViewState::default());
    }
}

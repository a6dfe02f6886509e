//! Query-string parameters for the HTTP API.

use serde::Deserialize;

use geotool_cn::SearchOptions;

#[derive(Deserialize)]
pub struct ReverseParams {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Deserialize)]
pub struct SearchQueryParams {
    /// Region name or GB code
    pub text: String,
    /// Restrict to province, city or district
    pub level: Option<String>,
    /// Parent province, by name or GB code
    pub province: Option<String>,
    /// Parent city, by name or GB code
    pub city: Option<String>,
    /// Substring fallback (defaults to true)
    pub fuzzy: Option<bool>,
}

impl SearchQueryParams {
    pub fn into_search(self) -> (String, SearchOptions) {
        let options = SearchOptions {
            level: self.level.filter(|l| !l.is_empty()),
            province: self.province.filter(|p| !p.is_empty()),
            city: self.city.filter(|c| !c.is_empty()),
            fuzzy: self.fuzzy.unwrap_or(true),
        };
        (self.text, options)
    }
}

#[derive(Deserialize)]
pub struct RegionsParams {
    pub level: String,
}

#[derive(Deserialize)]
pub struct ContainsParams {
    pub lat: f64,
    pub lng: f64,
    pub adcode: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_filters_are_dropped() {
        let params = SearchQueryParams {
            text: "朝阳区".to_string(),
            level: Some(String::new()),
            province: Some("北京市".to_string()),
            city: None,
            fuzzy: None,
        };
        let (text, options) = params.into_search();
        assert_eq!(text, "朝阳区");
        assert!(options.level.is_none());
        assert_eq!(options.province.as_deref(), Some("北京市"));
        assert!(options.fuzzy);
    }
}

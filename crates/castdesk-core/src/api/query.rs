//! Query-string construction for paginated listings.
//!
//! Only dimensions with a value are emitted. The server treats a missing
//! parameter as "no constraint", so empty selections must never be sent as
//! empty strings (`tag=` is not the same as no `tag`).

use chrono::SecondsFormat;

use crate::slice::FilterSet;

/// Ordered query parameters for a list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pairs: Vec<(&'static str, String)>,
}

impl ListQuery {
    /// Builds the query for `page` under `filters`.
    ///
    /// `tag_param` is the wire name of the tag dimension for the resource.
    pub fn build(page: u32, filters: &FilterSet, tag_param: &'static str) -> Self {
        let mut pairs = vec![("page", page.max(1).to_string())];

        if let Some(status) = non_empty(filters.status.as_deref()) {
            pairs.push(("status", status.to_string()));
        }

        if let (Some(start), Some(end)) = (filters.date_range.start, filters.date_range.end) {
            pairs.push((
                "daterange",
                format!(
                    "{},{}",
                    start.to_rfc3339_opts(SecondsFormat::Millis, true),
                    end.to_rfc3339_opts(SecondsFormat::Millis, true)
                ),
            ));
        }

        let tags: Vec<&str> = filters
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if !tags.is_empty() {
            pairs.push((tag_param, tags.join(",")));
        }

        if let Some(text) = non_empty(filters.text.as_deref()) {
            pairs.push(("filter", text.to_string()));
        }

        Self { pairs }
    }

    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.pairs
    }

    /// Value of a parameter, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::slice::DateRange;

    #[test]
    fn test_empty_filters_only_send_page() {
        let query = ListQuery::build(3, &FilterSet::default(), "tag");
        assert_eq!(query.pairs(), &[("page", "3".to_string())]);
        assert_eq!(query.get("tag"), None);
    }

    #[test]
    fn test_blank_values_are_omitted() {
        let filters = FilterSet {
            status: Some("  ".to_string()),
            tags: vec![String::new(), " ".to_string()],
            text: Some(String::new()),
            ..FilterSet::default()
        };
        let query = ListQuery::build(1, &filters, "tag");
        assert_eq!(query.pairs().len(), 1);
    }

    #[test]
    fn test_all_dimensions_in_order() {
        let filters = FilterSet {
            status: Some("scheduled".to_string()),
            tags: vec!["vip".to_string(), "gold".to_string()],
            date_range: DateRange {
                start: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
                end: Some(Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap()),
            },
            text: Some("newest".to_string()),
        };
        let query = ListQuery::build(2, &filters, "tag");
        let names: Vec<&str> = query.pairs().iter().map(|(k, _)| *k).collect();
        assert_eq!(names, ["page", "status", "daterange", "tag", "filter"]);
        assert_eq!(
            query.get("daterange"),
            Some("2024-01-01T00:00:00.000Z,2024-01-31T23:59:59.000Z")
        );
        assert_eq!(query.get("tag"), Some("vip,gold"));
    }

    #[test]
    fn test_half_open_date_range_is_omitted() {
        let filters = FilterSet {
            date_range: DateRange {
                start: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
                end: None,
            },
            ..FilterSet::default()
        };
        assert_eq!(ListQuery::build(1, &filters, "tag").get("daterange"), None);
    }

    #[test]
    fn test_custom_tag_param_name() {
        let filters = FilterSet {
            tags: vec!["gold".to_string()],
            ..FilterSet::default()
        };
        let query = ListQuery::build(1, &filters, "selectedLevel");
        assert_eq!(query.get("selectedLevel"), Some("gold"));
        assert_eq!(query.get("tag"), None);
    }

    #[test]
    fn test_page_zero_is_clamped() {
        assert_eq!(ListQuery::build(0, &FilterSet::default(), "tag").get("page"), Some("1"));
    }
}

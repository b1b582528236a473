//! Per-category median imputation.

use std::collections::HashMap;

/// Median of the present values; the mean of the two middle values for even counts
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Category medians computed once, before the imputation pass
#[derive(Debug, Clone, Default)]
pub struct GroupMedians {
    by_group: HashMap<String, f64>,
    global: Option<f64>,
}

impl GroupMedians {
    /// Build from (group, value) pairs. Absent values are ignored, as are
    /// rows without a group for the per-group table (they still count globally).
    pub fn build<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (Option<&'a str>, Option<f64>)>,
    {
        let mut grouped: HashMap<String, Vec<f64>> = HashMap::new();
        let mut all = Vec::new();

        for (group, value) in rows {
            let Some(value) = value else { continue };
            all.push(value);
            if let Some(group) = group {
                grouped.entry(group.to_string()).or_default().push(value);
            }
        }

        let by_group = grouped
            .into_iter()
            .filter_map(|(group, values)| median(&values).map(|m| (group, m)))
            .collect();

        Self {
            by_group,
            global: median(&all),
        }
    }

    pub fn for_group(&self, group: Option<&str>) -> Option<f64> {
        group.and_then(|g| self.by_group.get(g).copied())
    }

    pub fn global(&self) -> Option<f64> {
        self.global
    }

    /// Group median, falling back to `fallback` when the group has no values
    pub fn lookup_or(&self, group: Option<&str>, fallback: Option<f64>) -> Option<f64> {
        self.for_group(group).or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn group_medians_ignore_absent_values() {
        let medians = GroupMedians::build(vec![
            (Some("GAME"), Some(10.0)),
            (Some("GAME"), Some(30.0)),
            (Some("GAME"), None),
            (Some("TOOLS"), None),
            (None, Some(2.0)),
        ]);
        assert_eq!(medians.for_group(Some("GAME")), Some(20.0));
        assert_eq!(medians.for_group(Some("TOOLS")), None);
        assert_eq!(medians.for_group(None), None);
        assert_eq!(medians.global(), Some(10.0));
    }

    #[test]
    fn lookup_falls_back_when_group_is_empty() {
        let medians = GroupMedians::build(vec![(Some("GAME"), Some(10.0)), (Some("TOOLS"), None)]);
        assert_eq!(medians.lookup_or(Some("GAME"), Some(4.1)), Some(10.0));
        assert_eq!(medians.lookup_or(Some("TOOLS"), Some(4.1)), Some(4.1));
        assert_eq!(medians.lookup_or(Some("UNKNOWN"), None), None);
    }
}

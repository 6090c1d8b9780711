use std::collections::HashSet;

use chrono::Timelike;

use crate::alerts::types::{AlertCondition, AlertRecord, CountTable};

/// Hour of day (0-23, UTC) paired with an alert name.
pub type HourName = (u32, String);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubscriptionSummary {
    pub subscription: String,
    pub fired_by_name: CountTable<String>,
    pub resolved_by_name: CountTable<String>,
    pub unresolved_by_name: CountTable<String>,
    pub fired_by_hour: CountTable<HourName>,
    pub resolved_by_hour: CountTable<HourName>,
    pub unresolved_by_hour: CountTable<HourName>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverallSummary {
    pub by_hour: CountTable<u32>,
    pub by_severity: CountTable<String>,
    pub by_resource: CountTable<String>,
    pub by_subscription: CountTable<String>,
    pub by_subscription_condition: CountTable<(String, AlertCondition)>,
    pub by_condition: CountTable<AlertCondition>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertReport {
    /// In order of first appearance in the table.
    pub subscriptions: Vec<SubscriptionSummary>,
    pub overall: OverallSummary,
}

pub fn aggregate(table: &[AlertRecord]) -> AlertReport {
    let mut seen = HashSet::new();
    let subscriptions = table
        .iter()
        .filter(|r| seen.insert(r.subscription.as_str()))
        .map(|r| summarize_subscription(table, &r.subscription))
        .collect();

    AlertReport {
        subscriptions,
        overall: summarize_overall(table),
    }
}

/// Unresolved means fired under a name that never resolved in this subscription.
/// Names are the matching key, not individual firings: a name that fired twice
/// and resolved once counts as fully resolved.
pub fn summarize_subscription(table: &[AlertRecord], subscription: &str) -> SubscriptionSummary {
    let rows: Vec<&AlertRecord> = table.iter().filter(|r| r.subscription == subscription).collect();
    let fired: Vec<&AlertRecord> = with_condition(&rows, AlertCondition::Fired);
    let resolved: Vec<&AlertRecord> = with_condition(&rows, AlertCondition::Resolved);

    let resolved_names: HashSet<&str> = resolved.iter().map(|r| r.name.as_str()).collect();
    let unresolved: Vec<&AlertRecord> = fired
        .iter()
        .copied()
        .filter(|r| !resolved_names.contains(r.name.as_str()))
        .collect();

    SubscriptionSummary {
        subscription: subscription.to_string(),
        fired_by_name: count_names(&fired),
        resolved_by_name: count_names(&resolved),
        unresolved_by_name: count_names(&unresolved),
        fired_by_hour: count_hour_names(&fired),
        resolved_by_hour: count_hour_names(&resolved),
        unresolved_by_hour: count_hour_names(&unresolved),
    }
}

pub fn summarize_overall(table: &[AlertRecord]) -> OverallSummary {
    OverallSummary {
        by_hour: CountTable::by_key(table.iter().filter_map(fire_hour)),
        by_severity: CountTable::by_frequency(table.iter().map(|r| r.severity.clone())),
        by_resource: CountTable::by_frequency(table.iter().map(|r| r.affected_resource.clone())),
        by_subscription: CountTable::by_frequency(table.iter().map(|r| r.subscription.clone())),
        by_subscription_condition: CountTable::by_key(table.iter().map(|r| (r.subscription.clone(), r.condition))),
        by_condition: CountTable::by_frequency(table.iter().map(|r| r.condition)),
    }
}

fn with_condition<'a>(rows: &[&'a AlertRecord], condition: AlertCondition) -> Vec<&'a AlertRecord> {
    rows.iter().copied().filter(|r| r.condition == condition).collect()
}

fn count_names(rows: &[&AlertRecord]) -> CountTable<String> {
    CountTable::by_frequency(rows.iter().map(|r| r.name.clone()))
}

/// Records without a parseable fire time are left out.
fn count_hour_names(rows: &[&AlertRecord]) -> CountTable<HourName> {
    CountTable::by_key(rows.iter().filter_map(|r| fire_hour(r).map(|h| (h, r.name.clone()))))
}

fn fire_hour(record: &AlertRecord) -> Option<u32> {
    record.fire_time.map(|t| t.hour())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::alerts::normalizer::parse_timestamp;

    pub(crate) fn record(name: &str, condition: AlertCondition, subscription: &str, fired: &str) -> AlertRecord {
        AlertRecord {
            name: name.to_string(),
            severity: "Sev3".to_string(),
            affected_resource: "rg-app".to_string(),
            target_resource_type: "virtualmachines".to_string(),
            condition,
            description: String::new(),
            monitor_service: "Platform".to_string(),
            signal_type: "Metric".to_string(),
            fire_time: parse_timestamp(fired),
            last_modified: parse_timestamp(fired),
            subscription: subscription.to_string(),
            target_resource_group: "rg-app".to_string(),
            suppressed: false,
        }
    }

    fn fixture() -> Vec<AlertRecord> {
        use AlertCondition::*;
        vec![
            record("CPUHigh", Fired, "sub-x", "2024-01-01T13:45:00Z"),
            record("CPUHigh", Fired, "sub-x", "2024-01-01T13:10:00Z"),
            record("CPUHigh", Fired, "sub-x", "2024-01-01T09:00:00Z"),
            record("CPUHigh", Resolved, "sub-x", "2024-01-01T08:00:00Z"),
            record("DiskLow", Resolved, "sub-x", "2024-01-01T07:00:00Z"),
        ]
    }

    #[test]
    fn fired_resolved_unresolved_by_name() {
        let report = aggregate(&fixture());
        assert_eq!(report.subscriptions.len(), 1);
        let sub = &report.subscriptions[0];

        assert_eq!(sub.fired_by_name.rows().to_vec(), vec![("CPUHigh".to_string(), 3usize)]);
        assert_eq!(sub.resolved_by_name.get(&"CPUHigh".to_string()), Some(1));
        assert_eq!(sub.resolved_by_name.get(&"DiskLow".to_string()), Some(1));
        assert!(sub.unresolved_by_name.is_empty());
        assert!(sub.unresolved_by_hour.is_empty());
    }

    #[test]
    fn unresolved_is_fired_names_minus_resolved_names() {
        use AlertCondition::*;
        let table = vec![
            record("CPUHigh", Fired, "sub-x", "2024-01-01T01:00:00Z"),
            record("MemHigh", Fired, "sub-x", "2024-01-01T02:00:00Z"),
            record("MemHigh", Fired, "sub-x", "2024-01-01T02:30:00Z"),
            record("NetDown", Fired, "sub-x", "2024-01-01T03:00:00Z"),
            record("CPUHigh", Resolved, "sub-x", "2024-01-01T04:00:00Z"),
            // Resolved elsewhere does not count for sub-x.
            record("NetDown", Resolved, "sub-y", "2024-01-01T05:00:00Z"),
        ];

        let sub = summarize_subscription(&table, "sub-x");
        assert_eq!(sub.unresolved_by_name.len(), 2);
        assert_eq!(sub.unresolved_by_name.get(&"MemHigh".to_string()), Some(2));
        assert_eq!(sub.unresolved_by_name.get(&"NetDown".to_string()), Some(1));
        assert_eq!(sub.unresolved_by_hour.get(&(2, "MemHigh".to_string())), Some(2));
    }

    #[test]
    fn hour_bucketing_uses_fire_hour() {
        let report = aggregate(&fixture());
        let sub = &report.subscriptions[0];

        assert_eq!(sub.fired_by_hour.get(&(13, "CPUHigh".to_string())), Some(2));
        assert_eq!(sub.fired_by_hour.get(&(9, "CPUHigh".to_string())), Some(1));
        assert_eq!(report.overall.by_hour.get(&13), Some(2));
        assert_eq!(report.overall.by_hour.rows().first().map(|(h, _)| *h), Some(7));
    }

    #[test]
    fn records_without_fire_time_are_listed_but_not_bucketed() {
        let mut table = fixture();
        table.push(record("Orphan", AlertCondition::Fired, "sub-x", "not-a-date"));
        let report = aggregate(&table);

        assert_eq!(report.overall.by_hour.total(), 5);
        assert_eq!(report.overall.by_subscription.get(&"sub-x".to_string()), Some(6));
        assert_eq!(report.subscriptions[0].unresolved_by_name.get(&"Orphan".to_string()), Some(1));
        assert!(report.subscriptions[0].unresolved_by_hour.is_empty());
    }

    #[test]
    fn empty_table_gives_empty_tables() {
        let report = aggregate(&[]);
        assert!(report.subscriptions.is_empty());
        let o = &report.overall;
        assert!(o.by_hour.is_empty());
        assert!(o.by_severity.is_empty());
        assert!(o.by_resource.is_empty());
        assert!(o.by_subscription.is_empty());
        assert!(o.by_subscription_condition.is_empty());
        assert!(o.by_condition.is_empty());

        let sub = summarize_subscription(&[], "sub-x");
        assert!(sub.fired_by_name.is_empty() && sub.fired_by_hour.is_empty());
    }

    #[test]
    fn subscriptions_in_first_seen_order() {
        use AlertCondition::*;
        let table = vec![
            record("A", Fired, "sub-b", "2024-01-01T01:00:00Z"),
            record("A", Fired, "sub-a", "2024-01-01T01:00:00Z"),
            record("B", Resolved, "sub-b", "2024-01-01T01:00:00Z"),
        ];
        let report = aggregate(&table);
        let names: Vec<_> = report.subscriptions.iter().map(|s| s.subscription.as_str()).collect();
        assert_eq!(names, vec!["sub-b", "sub-a"]);

        assert_eq!(report.overall.by_subscription_condition.get(&("sub-b".to_string(), Resolved)), Some(1));
        assert_eq!(report.overall.by_condition.rows().first(), Some(&(Fired, 2)));
    }
}

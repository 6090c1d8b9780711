use serde::Serialize;

use crate::alerts::aggregator::HourName;
use crate::alerts::{Analysis, CountTable, OverallSummary, SubscriptionSummary};
use crate::charts::{no_data_fragment, ChartFragment, ChartKind, ChartRenderer, ChartSpec};

const COUNT_LABEL: &str = "Number of Alerts";

#[derive(Serialize, Debug)]
pub struct ChartView {
    pub key: &'static str,
    pub html: String,
}

#[derive(Serialize, Debug)]
pub struct SubscriptionView {
    pub subscription: String,
    pub charts: Vec<ChartView>,
}

/// Context for the `report` template.
#[derive(Serialize, Debug)]
pub struct ReportView {
    pub start_time: String,
    pub end_time: String,
    pub record_count: usize,
    pub warnings: Vec<String>,
    pub empty: bool,
    pub subscriptions: Vec<SubscriptionView>,
    pub overall: Vec<ChartView>,
}

pub fn report_view(analysis: &Analysis, renderer: &dyn ChartRenderer) -> ReportView {
    let render = |key: &'static str, spec: ChartSpec| ChartView {
        key,
        html: render_or_placeholder(renderer, &spec).0,
    };

    let subscriptions = analysis
        .report
        .subscriptions
        .iter()
        .map(|s| SubscriptionView {
            subscription: s.subscription.clone(),
            charts: subscription_charts(s)
                .into_iter()
                .map(|(key, spec)| render(key, spec))
                .collect(),
        })
        .collect();

    let overall = overall_charts(&analysis.report.overall)
        .into_iter()
        .map(|(key, spec)| render(key, spec))
        .collect();

    ReportView {
        start_time: analysis.window.start.clone(),
        end_time: analysis.window.end.clone(),
        record_count: analysis.record_count,
        warnings: analysis.warnings.iter().map(|w| w.to_string()).collect(),
        empty: analysis.record_count == 0,
        subscriptions,
        overall,
    }
}

/// A chart that fails to draw becomes a placeholder; the rest of the page survives.
fn render_or_placeholder(renderer: &dyn ChartRenderer, spec: &ChartSpec) -> ChartFragment {
    renderer.render(spec).unwrap_or_else(|e| {
        error!("Chart '{}' failed to render: {:#}", spec.title, e);
        no_data_fragment(&spec.title)
    })
}

pub fn subscription_charts(s: &SubscriptionSummary) -> Vec<(&'static str, ChartSpec)> {
    let sub = &s.subscription;
    vec![
        ("fired", by_name(format!("Fired Alerts for {}", sub), &s.fired_by_name)),
        ("resolved", by_name(format!("Resolved Alerts for {}", sub), &s.resolved_by_name)),
        ("unresolved", by_name(format!("Unresolved Alerts for {}", sub), &s.unresolved_by_name)),
        ("fired_hourly", by_hour(format!("Fired Alerts by Hour for {}", sub), &s.fired_by_hour)),
        ("resolved_hourly", by_hour(format!("Resolved Alerts by Hour for {}", sub), &s.resolved_by_hour)),
        ("unresolved_hourly", by_hour(format!("Unresolved Alerts by Hour for {}", sub), &s.unresolved_by_hour)),
    ]
}

pub fn overall_charts(o: &OverallSummary) -> Vec<(&'static str, ChartSpec)> {
    vec![
        (
            "by_hour",
            ChartSpec::bar("Alerts by Hour", "Hour", COUNT_LABEL, labelled(&o.by_hour, |h| h.to_string())),
        ),
        (
            "by_severity",
            ChartSpec::pie("Alerts by Severity", labelled(&o.by_severity, String::clone)),
        ),
        (
            "by_resource",
            ChartSpec::bar("Alerts by Resource", "Resource", COUNT_LABEL, labelled(&o.by_resource, String::clone)),
        ),
        (
            "by_subscription",
            ChartSpec::bar(
                "Alerts by Subscription",
                "Subscription",
                COUNT_LABEL,
                labelled(&o.by_subscription, String::clone),
            ),
        ),
        (
            "types_by_subscription",
            ChartSpec::multi(
                ChartKind::GroupedBar,
                "Alert Types by Subscription",
                "Subscription",
                "Count",
                o.by_subscription_condition
                    .rows()
                    .iter()
                    .map(|((sub, cond), n)| (sub.clone(), cond.to_string(), *n))
                    .collect(),
            ),
        ),
        (
            "fired_vs_resolved",
            ChartSpec::pie("Fired vs Resolved Alerts", labelled(&o.by_condition, |c| c.to_string())),
        ),
    ]
}

fn by_name(title: String, table: &CountTable<String>) -> ChartSpec {
    ChartSpec::bar(title, "Alert Name", COUNT_LABEL, labelled(table, String::clone))
}

fn by_hour(title: String, table: &CountTable<HourName>) -> ChartSpec {
    ChartSpec::multi(
        ChartKind::StackedBar,
        title,
        "Hour",
        COUNT_LABEL,
        table
            .rows()
            .iter()
            .map(|((hour, name), n)| (hour.to_string(), name.clone(), *n))
            .collect(),
    )
}

fn labelled<K, F: Fn(&K) -> String>(table: &CountTable<K>, label: F) -> Vec<(String, usize)> {
    table.rows().iter().map(|(k, n)| (label(k), *n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::aggregator::{aggregate, summarize_subscription};
    use crate::alerts::aggregator::tests::record;
    use crate::alerts::types::AlertCondition::*;

    #[test]
    fn subscription_catalogue_follows_summary() {
        let table = vec![
            record("CPUHigh", Fired, "sub-x", "2024-01-01T13:45:00Z"),
            record("CPUHigh", Fired, "sub-x", "2024-01-01T13:10:00Z"),
            record("DiskLow", Fired, "sub-x", "2024-01-01T13:00:00Z"),
            record("CPUHigh", Resolved, "sub-x", "2024-01-01T14:00:00Z"),
        ];
        let charts = subscription_charts(&summarize_subscription(&table, "sub-x"));

        let keys: Vec<_> = charts.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["fired", "resolved", "unresolved", "fired_hourly", "resolved_hourly", "unresolved_hourly"]);

        let (_, fired) = &charts[0];
        assert_eq!(fired.title, "Fired Alerts for sub-x");
        assert_eq!(fired.categories, vec!["CPUHigh", "DiskLow"]);
        assert_eq!(fired.series[0].values, vec![2, 1]);

        let (_, fired_hourly) = &charts[3];
        assert_eq!(fired_hourly.kind, ChartKind::StackedBar);
        assert_eq!(fired_hourly.categories, vec!["13"]);
        assert_eq!(fired_hourly.y_max(), 3);

        let (_, unresolved) = &charts[2];
        assert_eq!(unresolved.categories, vec!["DiskLow"]);
    }

    #[test]
    fn overall_catalogue_has_six_charts() {
        let report = aggregate(&[record("CPUHigh", Fired, "sub-x", "2024-01-01T13:45:00Z")]);
        let charts = overall_charts(&report.overall);

        assert_eq!(charts.len(), 6);
        assert_eq!(charts[1].1.kind, ChartKind::Pie);
        assert_eq!(charts[4].1.kind, ChartKind::GroupedBar);
        assert_eq!(charts[4].1.series[0].name, "Fired");
    }

    #[test]
    fn empty_summary_gives_empty_specs() {
        let report = aggregate(&[]);
        assert!(overall_charts(&report.overall).iter().all(|(_, spec)| spec.is_empty()));
    }
}

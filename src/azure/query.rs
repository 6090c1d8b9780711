use crate::error::PipelineError;

/// Resource Graph query for alerts whose fire time lies inside the window.
/// `{start}` and `{end}` are substituted by [`alerts_query`].
pub const ALERTS_QUERY: &str = "alertsmanagementresources \
| where type == 'microsoft.alertsmanagement/alerts' \
| extend severity = tostring(properties['essentials']['severity']) \
| where properties['essentials']['monitorCondition'] in~ ('Fired','Resolved') \
| where properties['essentials']['startDateTime'] >= datetime({start}) and properties['essentials']['startDateTime'] <= datetime({end}) \
| project id, severity, name, essentials = properties['essentials'], subscriptionId, resourceGroup \
| order by todatetime(essentials['startDateTime']) desc";

/// Caller-supplied bounds of the alert search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: String,
    pub end: String,
}

impl TimeWindow {
    /// The bounds end up inside `datetime(...)`, so only date-time characters pass.
    pub fn new(start: &str, end: &str) -> Result<Self, PipelineError> {
        Ok(Self {
            start: check_bound("start_time", start)?,
            end: check_bound("end_time", end)?,
        })
    }
}

fn check_bound(field: &str, raw: &str) -> Result<String, PipelineError> {
    let value = raw.trim();

    if value.is_empty() {
        return Err(PipelineError::InvalidInput(format!("{} is required", field)));
    }

    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | ':' | '.' | '+' | ' ');
    if let Some(bad) = value.chars().find(|c| !allowed(*c)) {
        return Err(PipelineError::InvalidInput(format!(
            "{} contains an unsupported character '{}'",
            field, bad
        )));
    }

    Ok(value.to_string())
}

pub fn alerts_query(window: &TimeWindow) -> String {
    ALERTS_QUERY
        .replace("{start}", &window.start)
        .replace("{end}", &window.end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_embeds_window() {
        let window = TimeWindow::new("2024-01-01T00:00:00Z", " 2024-01-02 ").unwrap();
        let query = alerts_query(&window);

        assert!(query.contains("datetime(2024-01-01T00:00:00Z)"));
        assert!(query.contains("datetime(2024-01-02)"));
        assert!(!query.contains("{start}"));
    }

    #[test]
    fn window_rejects_blank_and_injection() {
        assert!(matches!(TimeWindow::new("", "2024-01-02"), Err(PipelineError::InvalidInput(_))));
        assert!(matches!(
            TimeWindow::new("2024-01-01) | take 1 //", "2024-01-02"),
            Err(PipelineError::InvalidInput(_))
        ));
    }
}

use anyhow::{Context, Result};
use handlebars::Handlebars;

pub const INDEX: &str = "index";
pub const REPORT: &str = "report";

const STYLE: &str = r#"
<style>
  body { background: #000; color: #fff; font-family: sans-serif; margin: 2em; }
  a { color: #63a4ff; }
  .warning { background: #4a3b00; border-left: 4px solid #fecb52; padding: .5em 1em; margin: .5em 0; }
  .chart { margin: 1em 0; }
  .chart-empty { border: 1px dashed #555; padding: 1em; }
  section.subscription, section.overall { border-top: 1px solid #333; padding-top: 1em; }
  label { display: inline-block; min-width: 8em; }
</style>
"#;

const INDEX_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Azure Alerts</title>{{> style}}</head>
<body>
  <h1>Azure Monitor Alerts</h1>
  <form method="post" action="/analyze">
    <p><label for="start_time">Start time</label><input id="start_time" name="start_time" placeholder="2024-01-01T00:00:00Z" required></p>
    <p><label for="end_time">End time</label><input id="end_time" name="end_time" placeholder="2024-01-02T00:00:00Z" required></p>
    <p><button type="submit">Analyze</button></p>
  </form>
</body>
</html>
"#;

const REPORT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Azure Alerts {{start_time}} - {{end_time}}</title>{{> style}}</head>
<body>
  <h1>Alerts from {{start_time}} to {{end_time}}</h1>
  <p>{{record_count}} alerts. <a href="/">New search</a></p>
  {{#each warnings}}
  <div class="warning">{{this}}</div>
  {{/each}}
  {{#if empty}}
  <p class="no-data">No alerts found in the selected time range.</p>
  {{else}}
  {{#each subscriptions}}
  <section class="subscription">
    <h2>Subscription {{subscription}}</h2>
    {{#each charts}}
    <div class="chart-slot" data-chart="{{key}}">{{{html}}}</div>
    {{/each}}
  </section>
  {{/each}}
  <section class="overall">
    <h2>Overall</h2>
    {{#each overall}}
    <div class="chart-slot" data-chart="{{key}}">{{{html}}}</div>
    {{/each}}
  </section>
  {{/if}}
</body>
</html>
"#;

pub fn init() -> Result<Handlebars<'static>> {
    let mut registry = Handlebars::new();

    registry
        .register_partial("style", STYLE)
        .context("registering style partial")?;
    registry
        .register_template_string(INDEX, INDEX_TEMPLATE)
        .context("registering index template")?;
    registry
        .register_template_string(REPORT, REPORT_TEMPLATE)
        .context("registering report template")?;

    Ok(registry)
}

/// Standalone page for failed requests; does not go through the registry.
pub fn error_page(status: u16, message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Error {status}</title>{style}</head>
<body>
  <h1>Request failed ({status})</h1>
  <p class="error">{message}</p>
  <p><a href="/">Back</a></p>
</body>
</html>
"#,
        status = status,
        style = STYLE,
        message = handlebars::html_escape(message),
    )
}

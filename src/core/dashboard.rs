use crate::api::ApiClient;
use crate::core::section::Section;
use crate::domain::model::{ChartPoint, DashboardSummary, Period};
use crate::domain::ports::View;
use crate::render::{self, OutputFormat, Table};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

/// `GET /dashboard/charts` answers one array of points per chart name.
pub type ChartSeries = Vec<(String, Vec<ChartPoint>)>;

/// Keys whose value is not a point array are skipped.
fn parse_charts(raw: Map<String, Value>) -> ChartSeries {
    raw.into_iter()
        .filter_map(|(name, value)| {
            serde_json::from_value::<Vec<ChartPoint>>(value)
                .ok()
                .map(|points| (name, points))
        })
        .collect()
}

/// KPI strip and trend charts on the landing screen.
pub struct DashboardView {
    client: ApiClient,
    period: Period,
    summary: Section<DashboardSummary>,
    charts: Section<ChartSeries>,
}

#[derive(Serialize)]
struct DashboardJson<'a> {
    period: Period,
    summary: &'a DashboardSummary,
    charts: Vec<(&'a str, &'a [ChartPoint])>,
}

impl DashboardView {
    pub fn new(client: ApiClient, period: Period) -> Self {
        Self {
            client,
            period,
            summary: Section::new("dashboard summary"),
            charts: Section::new("dashboard charts"),
        }
    }

    pub fn summary(&self) -> &Section<DashboardSummary> {
        &self.summary
    }

    pub fn charts(&self) -> &Section<ChartSeries> {
        &self.charts
    }

    pub async fn load_summary(&mut self) {
        if !self.summary.begin_load() {
            return;
        }
        let result = self
            .client
            .get("/dashboard/summary", &[("period", self.period.as_str().to_string())])
            .await;
        self.summary.finish(result);
    }

    pub async fn load_charts(&mut self) {
        if !self.charts.begin_load() {
            return;
        }
        let result = self
            .client
            .get::<Map<String, Value>>("/dashboard/charts", &[])
            .await
            .map(parse_charts);
        self.charts.finish(result);
    }

    fn summary_table(&self) -> Table {
        let summary = self.summary.data();
        let mut pairs = vec![
            ("period".to_string(), self.period.as_str().to_string()),
            ("total_revenue".to_string(), render::optional(&summary.total_revenue.map(render::money))),
            (
                "occupancy_rate".to_string(),
                render::optional(&summary.occupancy_rate.map(|r| format!("{:.1}%", r))),
            ),
            ("total_bookings".to_string(), render::optional(&summary.total_bookings)),
            ("available_rooms".to_string(), render::optional(&summary.available_rooms)),
            ("checkins_today".to_string(), render::optional(&summary.checkins_today)),
            ("checkouts_today".to_string(), render::optional(&summary.checkouts_today)),
        ];
        for (key, value) in &summary.extra {
            pairs.extend(render::flatten_under(key, value));
        }
        Table::key_values(pairs)
    }
}

#[async_trait]
impl View for DashboardView {
    fn title(&self) -> &str {
        "Dashboard"
    }

    async fn refresh(&mut self) -> Result<()> {
        self.load_summary().await;
        self.load_charts().await;
        Ok(())
    }

    fn render(&self, format: OutputFormat) -> Result<String> {
        if format == OutputFormat::Json {
            return render::to_json(&DashboardJson {
                period: self.period,
                summary: self.summary.data(),
                charts: self
                    .charts
                    .data()
                    .iter()
                    .map(|(name, points)| (name.as_str(), points.as_slice()))
                    .collect(),
            });
        }

        let mut out = Vec::new();
        match self.summary.error() {
            Some(error) => out.push(error.to_string()),
            None => out.push(self.summary_table().render(format)?),
        }

        if format == OutputFormat::Table {
            if let Some(error) = self.charts.error() {
                out.push(error.to_string());
            }
            for (name, points) in self.charts.data() {
                out.push(format!("\n{}\n{}", name, render::bar_chart(points, 40)));
            }
        }
        Ok(out.join("\n"))
    }
}

//! Charts of where the money went.
//!
//! - **Category chart**: pie chart of the total per category
//! - **Payment method chart**: bar chart of the total per payment method
//!
//! Both are ECharts configurations rendered into containers inside the
//! expense view. The view is swapped out on every change, so the script
//! disposes of the previous chart instances before creating new ones.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{AxisLabel, AxisType, JsFunction, Tooltip, Trigger},
    series::{Bar, Pie},
};
use maud::{Markup, PreEscaped, html};
use rust_decimal::{Decimal, prelude::ToPrimitive};

use super::{Summary, display_label};

/// A chart with its HTML container ID and ECharts configuration.
pub(super) struct ExpenseChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

pub(super) const CATEGORY_CHART_ID: &str = "category-chart";
pub(super) const PAYMENT_METHOD_CHART_ID: &str = "payment-method-chart";

/// Build both charts for `summary`.
pub(super) fn expense_charts(summary: &Summary, currency_label: &str) -> [ExpenseChart; 2] {
    [
        ExpenseChart {
            id: CATEGORY_CHART_ID,
            options: category_chart(summary, currency_label).to_string(),
        },
        ExpenseChart {
            id: PAYMENT_METHOD_CHART_ID,
            options: payment_method_chart(summary, currency_label).to_string(),
        },
    ]
}

/// Renders the HTML containers for the charts.
pub(super) fn charts_view(charts: &[ExpenseChart]) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        class="min-h-[380px] rounded dark:bg-gray-100"
                    {}
                }
            }
        }
    )
}

/// Generates the script that (re)initialises the charts.
///
/// Instances from a previous render are disposed of along with their resize
/// and theme listeners, so repeated refreshes do not leak chart instances.
pub(super) fn charts_script(charts: &[ExpenseChart]) -> Markup {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{id}");
                    if (!chartDom) {{
                        return;
                    }}

                    const stale = echarts.getInstanceByDom(chartDom);
                    if (stale) {{
                        stale.dispose();
                    }}

                    const chart = echarts.init(chartDom);
                    const option = {options};
                    chart.setOption(option);

                    const resize = () => chart.resize();
                    window.addEventListener('resize', resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        const isDarkMode = darkModeMediaQuery.matches;
                        chart.setTheme(isDarkMode ? 'dark' : 'default');
                    }};
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();

                    registry["{id}"] = {{ chart, resize, darkModeMediaQuery, updateTheme }};
                }})();"#,
                id = chart.id,
                options = chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let wrapped_script = format!(
        r#"(function() {{
            const registry = window.expenseCharts || (window.expenseCharts = {{}});

            const disposeCharts = () => {{
                for (const id of Object.keys(registry)) {{
                    const entry = registry[id];
                    window.removeEventListener('resize', entry.resize);
                    entry.darkModeMediaQuery.removeEventListener('change', entry.updateTheme);
                    entry.chart.dispose();
                    delete registry[id];
                }}
            }};

            if (!window.expenseChartsDisposeRegistered) {{
                window.expenseChartsDisposeRegistered = true;
                document.addEventListener('htmx:beforeSwap', (event) => {{
                    if (event.detail.target && event.detail.target.id === 'expense-view') {{
                        disposeCharts();
                    }}
                }});
            }}

            const render = () => {{
                disposeCharts();
                {script_content}
            }};

            if (document.readyState === 'loading') {{
                document.addEventListener('DOMContentLoaded', render);
            }} else {{
                render();
            }}
        }})();"#
    );

    html! {
        script { (PreEscaped(wrapped_script)) }
    }
}

fn to_chart_value(amount: Decimal) -> f64 {
    amount.to_f64().unwrap_or_default()
}

pub(super) fn category_chart(summary: &Summary, currency_label: &str) -> Chart {
    let data: Vec<(f64, &str)> = summary
        .categories_by_total()
        .into_iter()
        .map(|(category, total)| (to_chart_value(total), display_label(category)))
        .collect();

    Chart::new()
        .title(
            Title::new()
                .text("Expenses by Category")
                .subtext("Share of the total"),
        )
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter(currency_label)),
        )
        .legend(Legend::new().bottom("1%"))
        .series(
            Pie::new()
                .name("Category")
                .radius(vec!["35%", "65%"])
                .data(data),
        )
}

pub(super) fn payment_method_chart(summary: &Summary, currency_label: &str) -> Chart {
    let (labels, values): (Vec<String>, Vec<f64>) = summary
        .payment_methods_by_total()
        .into_iter()
        .map(|(payment_method, summary)| {
            (
                display_label(payment_method).to_owned(),
                to_chart_value(summary.total),
            )
        })
        .unzip();

    Chart::new()
        .title(
            Title::new()
                .text("Expenses by Payment Method")
                .subtext("Total spent with each method"),
        )
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Axis)
                .value_formatter(currency_formatter(currency_label)),
        )
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter(currency_label))),
        )
        .series(Bar::new().name("Total").data(values))
}

fn currency_formatter(currency_label: &str) -> JsFunction {
    // Serializing as JSON gives a correctly escaped JavaScript string literal.
    let label = serde_json::to_string(currency_label).unwrap_or_else(|_| "\"\"".to_owned());

    JsFunction::new_with_args(
        "number",
        &format!("return (number == null) ? \"-\" : Number(number).toFixed(2) + \" \" + {label};"),
    )
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use time::macros::{date, datetime};

    use crate::{
        expense::{ExpenseRecord, summarize},
        session::OwnerId,
    };

    use super::{
        CATEGORY_CHART_ID, PAYMENT_METHOD_CHART_ID, category_chart, charts_script,
        expense_charts, payment_method_chart,
    };

    fn record(id: i64, category: &str, amount: &str, payment_method: &str) -> ExpenseRecord {
        ExpenseRecord {
            id,
            owner_id: OwnerId::new("user-1").unwrap(),
            description: String::new(),
            category: category.to_owned(),
            raw_amount: amount.to_owned(),
            date: date!(2025 - 01 - 15),
            payment_method: payment_method.to_owned(),
            created_at: datetime!(2025-01-15 12:00 UTC),
        }
    }

    #[test]
    fn category_chart_has_a_slice_per_category() {
        let summary = summarize(&[
            record(1, "Food", "12.50", "Cash"),
            record(2, "Transport", "6.25", "Cash"),
        ]);

        let options = category_chart(&summary, "€").to_string();

        assert!(options.contains("\"Food\""), "{options}");
        assert!(options.contains("\"Transport\""), "{options}");
        assert!(options.contains("12.5"), "{options}");
        assert!(options.contains("6.25"), "{options}");
    }

    #[test]
    fn payment_method_chart_plots_totals() {
        let summary = summarize(&[
            record(1, "Food", "12.50", "Cash"),
            record(2, "Transport", "6.25", "Cash"),
            record(3, "Transport", "3", "Card"),
        ]);

        let options = payment_method_chart(&summary, "€").to_string();

        assert!(options.contains("\"Cash\""), "{options}");
        assert!(options.contains("\"Card\""), "{options}");
        assert!(options.contains("18.75"), "{options}");
    }

    #[test]
    fn formatter_includes_currency_label() {
        let summary = summarize(&[record(1, "Food", "1", "Cash")]);

        let options = payment_method_chart(&summary, "NZD").to_string();

        assert!(options.contains("NZD"), "{options}");
    }

    #[test]
    fn script_disposes_previous_charts() {
        let summary = summarize(&[record(1, "Food", "1", "Cash")]);
        let charts = expense_charts(&summary, "€");

        let script = charts_script(&charts).into_string();

        assert!(script.contains("getInstanceByDom"));
        assert!(script.contains(".dispose()"));
        assert!(script.contains(CATEGORY_CHART_ID));
        assert!(script.contains(PAYMENT_METHOD_CHART_ID));
    }

    #[test]
    fn empty_summary_still_builds_charts() {
        let summary = summarize(&[]);

        let charts = expense_charts(&summary, "€");

        assert_eq!(charts.len(), 2);
        assert!(!charts[0].options.is_empty());
    }

    #[test]
    fn chart_value_keeps_cents() {
        assert_eq!(super::to_chart_value(Decimal::from_str("6.25").unwrap()), 6.25);
    }
}

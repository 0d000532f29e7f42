//! Importance chart rendering
//!
//! Renders the sorted importance ranking as a horizontal bar chart: one bar
//! per feature, highest importance at the top, importance on the x axis and
//! feature names on the y axis. Only the left and bottom axes are drawn.
//!
//! The chart is produced as an SVG string; callers decide where it goes.

use plotters::prelude::*;
use plotters_svg::SVGBackend;

use crate::error::PredictError;
use crate::report::ImportanceEntry;

/// Default chart dimensions (pixels)
pub const DEFAULT_CHART_SIZE: (u32, u32) = (900, 480);

/// Render the importance ranking as an SVG bar chart.
///
/// `ranking` must already be sorted descending (as produced by
/// [`rank_importances`](crate::report::rank_importances)); bars are laid
/// out top-to-bottom in ranking order.
pub fn render_importance_svg(
    ranking: &[ImportanceEntry],
    size: (u32, u32),
) -> Result<String, PredictError> {
    if ranking.is_empty() {
        return Err(PredictError::RenderError(
            "empty importance ranking".to_string(),
        ));
    }

    let bar_count = ranking.len();
    let x_max = ranking
        .iter()
        .map(|e| e.importance)
        .fold(0.0f64, f64::max)
        .max(1e-6);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                "Key Indicators for Prediction (Sorted by Importance)",
                ("sans-serif", 20),
            )
            .margin(12)
            .x_label_area_size(45)
            .y_label_area_size(190)
            .build_cartesian_2d(0.0..x_max * 1.05, (0..bar_count).into_segmented())
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .x_desc("Importance")
            .y_desc("Feature")
            .y_labels(bar_count)
            .y_label_formatter(&|seg| match seg {
                // Segment 0 is at the bottom, so the top segment carries rank 1
                SegmentValue::CenterOf(i) => (bar_count - 1)
                    .checked_sub(*i)
                    .and_then(|idx| ranking.get(idx))
                    .map(|e| e.feature.trim().to_string())
                    .unwrap_or_default(),
                _ => String::new(),
            })
            .draw()
            .map_err(render_err)?;

        chart
            .draw_series(ranking.iter().enumerate().map(|(rank_index, entry)| {
                let segment = bar_count - 1 - rank_index;
                let color = Palette99::pick(rank_index).mix(0.85);
                Rectangle::new(
                    [
                        (0.0, SegmentValue::Exact(segment)),
                        (entry.importance, SegmentValue::Exact(segment + 1)),
                    ],
                    color.filled(),
                )
            }))
            .map_err(render_err)?;

        root.present().map_err(render_err)?;
    }

    Ok(svg)
}

fn render_err<E: std::fmt::Display>(e: E) -> PredictError {
    PredictError::RenderError(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::rank_importances;

    fn sample_ranking() -> Vec<ImportanceEntry> {
        let names: Vec<String> = ["Income composition of resources", "HIV_log", " BMI "]
            .iter()
            .map(|s| s.to_string())
            .collect();
        rank_importances(&names, &[0.5, 0.3, 0.2])
    }

    #[test]
    fn test_render_produces_svg() {
        let svg = render_importance_svg(&sample_ranking(), DEFAULT_CHART_SIZE).unwrap();

        assert!(svg.contains("<svg"));
        assert!(svg.contains("Importance"));
        // Feature labels are trimmed for display
        assert!(svg.contains("BMI"));
    }

    #[test]
    fn test_render_empty_ranking_fails() {
        assert!(matches!(
            render_importance_svg(&[], DEFAULT_CHART_SIZE),
            Err(PredictError::RenderError(_))
        ));
    }

    #[test]
    fn test_render_handles_all_zero_scores() {
        let names: Vec<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        let ranking = rank_importances(&names, &[0.0, 0.0]);
        assert!(render_importance_svg(&ranking, (400, 300)).is_ok());
    }
}

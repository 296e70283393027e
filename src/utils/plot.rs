use plotters::prelude::*;
use std::path::Path;

use crate::error::OutputError;
use crate::inference::forecast::ForecastPoint;

pub fn create_forecast_plot(points: &[ForecastPoint], path: &Path) -> Result<(), OutputError> {
    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(OutputError::Empty("forecast has no points")),
    };
    let plot_err = |e: &dyn std::fmt::Display| OutputError::Plot(e.to_string());

    let root = BitMapBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| plot_err(&e))?;

    let max_value = points.iter().map(|p| p.value as f64).fold(0.0, f64::max);
    let y_top = (max_value * 1.1).max(1.0);
    let days = points.len() as u32;

    let caption = format!("PM2.5 Prediction for the Next {} Days", points.len());
    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0u32..days.saturating_sub(1).max(1), 0f64..y_top)
        .map_err(|e| plot_err(&e))?;

    let label_date = |i: &u32| {
        points
            .get(*i as usize)
            .map(|p| p.date.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(6)
        .x_label_formatter(&label_date)
        .x_desc(format!("Date ({} to {})", first.date, last.date))
        .y_desc("PM2.5 (µg/m³)")
        .draw()
        .map_err(|e| plot_err(&e))?;

    let series = || {
        points
            .iter()
            .enumerate()
            .map(|(i, p)| (i as u32, p.value as f64))
    };

    chart
        .draw_series(LineSeries::new(series(), &BLUE))
        .map_err(|e| plot_err(&e))?
        .label("PM2.5 (µg/m³)")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    chart
        .draw_series(series().map(|(x, y)| Circle::new((x, y), 3, BLUE.filled())))
        .map_err(|e| plot_err(&e))?;

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(|e| plot_err(&e))?;

    root.present().map_err(|e| plot_err(&e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn empty_forecast_is_refused() {
        let err = create_forecast_plot(&[], Path::new("unused.png")).unwrap_err();
        assert!(matches!(err, OutputError::Empty(_)));
    }

    #[test]
    fn thirty_day_chart_is_written() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("forecast.png");
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points: Vec<_> = start
            .iter_days()
            .take(30)
            .enumerate()
            .map(|(i, date)| ForecastPoint {
                date,
                value: 20.0 + (i % 7) as f32 * 3.5,
            })
            .collect();

        create_forecast_plot(&points, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
    }

    #[test]
    fn single_point_chart_is_written() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("one.png");
        let point = ForecastPoint {
            date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            value: 0.0,
        };
        create_forecast_plot(&[point], &path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}

use std::fs;
use std::path::Path;
use plotters::coord::Shift;
use plotters::prelude::*;
use crate::report::PerformanceReport;

type Panel<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Value range covering zero and every value, padded by 10% on both sides
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let span = if max > min { max - min } else { 1.0 };
    (min - span * 0.1, max + span * 0.1)
}

fn category_label(names: &[String], value: &SegmentValue<usize>) -> String {
    match value {
        SegmentValue::CenterOf(index) => names.get(*index).cloned().unwrap_or_default(),
        _ => String::new(),
    }
}

/// Render the four-panel performance overview as a PNG
pub fn generate_performance_charts(report: &PerformanceReport, filename: &str) -> Result<(), Box<dyn std::error::Error>> {
    if report.dealers.is_empty() {
        return Err("Cannot chart a report without dealers".into());
    }
    if let Some(parent) = Path::new(filename).parent() {
        fs::create_dir_all(parent)?;
    }

    let root = BitMapBackend::new(filename, (1500, 1000)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled("Dealer Auction Performance", ("sans-serif", 30))?;
    let panels = root.split_evenly((2, 2));

    draw_quality_vs_roi(&panels[0], report)?;
    draw_click_share(&panels[1], report)?;
    draw_type_efficiency(&panels[2], report)?;
    draw_roi_by_dealer(&panels[3], report)?;

    root.present()?;
    Ok(())
}

/// Scatter of quality score against ROI, marker size by conversions
fn draw_quality_vs_roi(area: &Panel, report: &PerformanceReport) -> Result<(), Box<dyn std::error::Error>> {
    let (y_min, y_max) = padded_range(report.dealers.iter().map(|d| d.estimated_roi));
    let max_conversions = report.dealers.iter().map(|d| d.conversions).max().unwrap_or(0).max(1);

    let mut chart = ChartBuilder::on(area)
        .caption("Quality Score vs Estimated ROI", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..10.0, y_min..y_max)?;

    chart.configure_mesh()
        .x_desc("Quality Score")
        .y_desc("Estimated ROI (%)")
        .draw()?;

    chart.draw_series(report.dealers.iter().map(|d| {
        let radius = 4 + (d.conversions * 20 / max_conversions) as i32;
        Circle::new((d.quality_score, d.estimated_roi), radius, BLUE.mix(0.6).filled())
    }))?;
    chart.draw_series(report.dealers.iter().map(|d| {
        Text::new(d.name.clone(), (d.quality_score, d.estimated_roi), ("sans-serif", 12))
    }))?;

    Ok(())
}

fn draw_click_share(area: &Panel, report: &PerformanceReport) -> Result<(), Box<dyn std::error::Error>> {
    let names: Vec<String> = report.types.iter().map(|t| t.dealer_type.clone()).collect();

    let mut chart = ChartBuilder::on(area)
        .caption("Click Share by Dealer Type", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(50)
        .build_cartesian_2d((0..names.len()).into_segmented(), 0.0..100.0)?;

    chart.configure_mesh()
        .disable_x_mesh()
        .x_label_formatter(&|v| category_label(&names, v))
        .y_desc("Share of clicks (%)")
        .draw()?;

    chart.draw_series(report.types.iter().enumerate().map(|(i, t)| {
        let mut bar = Rectangle::new([(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), t.click_share)], GREEN.filled());
        bar.set_margin(0, 0, 10, 10);
        bar
    }))?;

    Ok(())
}

/// Mean cost per conversion next to mean conversion rate for each type
fn draw_type_efficiency(area: &Panel, report: &PerformanceReport) -> Result<(), Box<dyn std::error::Error>> {
    let names: Vec<String> = report.types.iter().map(|t| t.dealer_type.clone()).collect();
    let (_, y_max) = padded_range(report.types.iter().flat_map(|t| [t.mean_cost_per_conversion, t.mean_cvr]));

    let mut chart = ChartBuilder::on(area)
        .caption("Efficiency by Dealer Type", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(50)
        .build_cartesian_2d((0..names.len()).into_segmented(), 0.0..y_max)?;

    chart.configure_mesh()
        .disable_x_mesh()
        .x_label_formatter(&|v| category_label(&names, v))
        .draw()?;

    chart.draw_series(report.types.iter().enumerate().map(|(i, t)| {
        let mut bar = Rectangle::new([(SegmentValue::Exact(i), 0.0), (SegmentValue::CenterOf(i), t.mean_cost_per_conversion)], BLUE.filled());
        bar.set_margin(0, 0, 8, 2);
        bar
    }))?
    .label("Cost/Conversion ($)")
    .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], BLUE.filled()));

    chart.draw_series(report.types.iter().enumerate().map(|(i, t)| {
        let mut bar = Rectangle::new([(SegmentValue::CenterOf(i), 0.0), (SegmentValue::Exact(i + 1), t.mean_cvr)], RED.filled());
        bar.set_margin(0, 0, 2, 8);
        bar
    }))?
    .label("CVR (%)")
    .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], RED.filled()));

    chart.configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    Ok(())
}

/// Horizontal ROI bars, one per dealer
fn draw_roi_by_dealer(area: &Panel, report: &PerformanceReport) -> Result<(), Box<dyn std::error::Error>> {
    let names: Vec<String> = report.dealers.iter().map(|d| d.name.clone()).collect();
    let (x_min, x_max) = padded_range(report.dealers.iter().map(|d| d.estimated_roi));

    let mut chart = ChartBuilder::on(area)
        .caption("Estimated ROI by Dealer", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(140)
        .build_cartesian_2d(x_min..x_max, (0..names.len()).into_segmented())?;

    chart.configure_mesh()
        .disable_y_mesh()
        .y_label_formatter(&|v| category_label(&names, v))
        .x_desc("Estimated ROI (%)")
        .draw()?;

    chart.draw_series(report.dealers.iter().enumerate().map(|(i, d)| {
        let mut bar = Rectangle::new([(0.0, SegmentValue::Exact(i)), (d.estimated_roi, SegmentValue::Exact(i + 1))], BLUE.mix(0.7).filled());
        bar.set_margin(6, 6, 0, 0);
        bar
    }))?;

    Ok(())
}

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::model::tables::{ACCURACY_COLUMN, AggregatedRow, LongTable, TASK_COLUMN};
use crate::render::geometry::histogram;
use crate::render::{Chart, ChartData};
use crate::report::format_f64_6;

const AGGREGATE_VALUE_COLUMNS: [&str; 6] = [
    "score_possible",
    "score_achieved",
    "score_sd",
    "iterations",
    "accuracy",
    "n_rows",
];

fn tsv_writer<W: Write>(w: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(w)
}

fn optional(value: Option<f64>) -> String {
    value.map(format_f64_6).unwrap_or_default()
}

/// Group keys first (in group-by order), then the reduced columns.
pub fn write_aggregated<W: Write>(w: W, rows: &[AggregatedRow]) -> Result<(), csv::Error> {
    let mut out = tsv_writer(w);
    let keys = rows
        .first()
        .map(|r| r.keys.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>())
        .unwrap_or_default();
    out.write_record(keys.iter().copied().chain(AGGREGATE_VALUE_COLUMNS))?;
    for row in rows {
        let mut record = row.key_values().into_iter().map(str::to_string).collect::<Vec<_>>();
        record.push(format_f64_6(row.score_possible));
        record.push(format_f64_6(row.score_achieved));
        record.push(format_f64_6(row.score_sd));
        record.push(optional(row.iterations));
        record.push(format_f64_6(row.accuracy));
        record.push(row.n_rows.to_string());
        out.write_record(&record)?;
    }
    out.flush()?;
    Ok(())
}

/// One line per observation; blank accuracy for missing cells.
pub fn write_long_table<W: Write>(w: W, table: &LongTable) -> Result<(), csv::Error> {
    let mut out = tsv_writer(w);
    out.write_record(
        table
            .id_columns
            .iter()
            .map(String::as_str)
            .chain([TASK_COLUMN, ACCURACY_COLUMN]),
    )?;
    for row in &table.rows {
        let mut record = table
            .id_columns
            .iter()
            .map(|c| row.id(c).unwrap_or_default().to_string())
            .collect::<Vec<_>>();
        record.push(row.task.clone());
        record.push(optional(row.accuracy));
        out.write_record(&record)?;
    }
    out.flush()?;
    Ok(())
}

/// The exact values a chart was drawn from: points for categorical charts,
/// bin counts per series for histograms.
pub fn write_chart_data<W: Write>(w: W, chart: &Chart) -> Result<(), csv::Error> {
    let mut out = tsv_writer(w);
    let spec = &chart.spec;
    match &chart.data {
        ChartData::Points(points) => {
            let mut header = vec![spec.x.as_str()];
            if let Some(hue) = &spec.hue {
                header.push(hue.as_str());
            }
            if let Some(size) = &spec.size {
                header.push(size.as_str());
            }
            header.push(spec.y.as_str());
            header.push("offset");
            out.write_record(&header)?;
            for point in points {
                let mut record = vec![point.x.clone()];
                if spec.hue.is_some() {
                    record.push(point.hue.clone().unwrap_or_default());
                }
                if spec.size.is_some() {
                    record.push(point.size.clone().unwrap_or_default());
                }
                record.push(format_f64_6(point.y));
                record.push(optional(point.offset));
                out.write_record(&record)?;
            }
        }
        ChartData::Histogram { edges, series } => {
            out.write_record(["series", "bin_low", "bin_high", "count"])?;
            for s in series {
                let counts = histogram(&s.values, edges);
                for (bin, count) in edges.windows(2).zip(counts) {
                    out.write_record([
                        s.label.clone(),
                        format_f64_6(bin[0]),
                        format_f64_6(bin[1]),
                        count.to_string(),
                    ])?;
                }
            }
        }
    }
    out.flush()?;
    Ok(())
}

pub fn write_tsv_file(
    path: &Path,
    write: impl FnOnce(File) -> Result<(), csv::Error>,
) -> Result<(), csv::Error> {
    let file = File::create(path)?;
    write(file)
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/tsv.rs"]
mod tests;

pub mod pdf;

use crate::aggregate::DashboardSummary;
use crate::config::Config;
use crate::error::ReportResult;
use crate::report::narrative::PatientSummary;
use crate::report::{ReportDocument, Section};
use std::fs::File;
use std::path::{Path, PathBuf};
use log::info;

pub const SUMMARY_FILENAME: &str = "dashboard_summary.json";
pub const NARRATIVE_FILENAME: &str = "patient_summaries.txt";

pub fn save_results<P: AsRef<Path>>(
    summary: &DashboardSummary,
    document: &ReportDocument,
    config: &Config,
    output_dir: P,
) -> ReportResult<Vec<PathBuf>> {
    let output_path = output_dir.as_ref();
    let mut written = Vec::new();
    
    // Dashboard view model
    let summary_path = output_path.join(SUMMARY_FILENAME);
    save_dashboard_summary(summary, &summary_path)?;
    written.push(summary_path);
    
    // Detailed per-patient report
    if !summary.patient_summaries.is_empty() {
        let narrative_path = output_path.join(NARRATIVE_FILENAME);
        save_patient_summaries(&summary.patient_summaries, &narrative_path)?;
        written.push(narrative_path);
    }
    
    // Report document
    let report_path = output_path.join(&config.report_filename);
    save_report_pdf(document, &report_path)?;
    written.push(report_path);
    
    // One CSV per section
    if config.write_section_csv {
        for section in &document.sections {
            let path = output_path.join(format!("{}.csv", section.kind.file_stem()));
            save_section_csv(section, &path)?;
            written.push(path);
        }
    }
    
    info!("All results saved to {:?}", output_path);
    Ok(written)
}

fn save_dashboard_summary<P: AsRef<Path>>(summary: &DashboardSummary, path: P) -> ReportResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, summary)?;
    Ok(())
}

pub fn save_patient_summaries<P: AsRef<Path>>(summaries: &[PatientSummary], path: P) -> ReportResult<()> {
    let blocks: Vec<String> = summaries.iter().map(|s| s.lines().join("\n")).collect();
    std::fs::write(path, blocks.join("\n\n") + "\n")?;
    Ok(())
}

pub fn save_report_pdf<P: AsRef<Path>>(document: &ReportDocument, path: P) -> ReportResult<()> {
    let rendered = pdf::render_pdf(document)?;
    std::fs::write(&path, rendered.bytes)?;
    info!("Report written to {:?} ({} pages)", path.as_ref(), rendered.pages);
    Ok(())
}

pub fn save_section_csv<P: AsRef<Path>>(section: &Section, path: P) -> ReportResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    
    writer.write_record(&section.header)?;
    for row in &section.rows {
        writer.write_record(row)?;
    }
    
    writer.flush()?;
    Ok(())
}

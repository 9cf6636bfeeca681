use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;
use jobaggr_core::Job;
use serde::Serialize;

/// How search results are written to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per job.
    #[default]
    Text,
    /// Pretty-printed JSON array.
    Json,
    /// CSV with a header row.
    Csv,
}

/// Flat row so every CSV record has the same columns.
#[derive(Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    title: &'a str,
    company: &'a str,
    location: &'a str,
    url: &'a str,
    source: &'a str,
    salary: &'a str,
    description: &'a str,
}

impl<'a> From<&'a Job> for CsvRow<'a> {
    fn from(job: &'a Job) -> Self {
        Self {
            id: &job.id,
            title: &job.title,
            company: &job.company,
            location: &job.location,
            url: &job.url,
            source: &job.source,
            salary: job.salary.as_deref().unwrap_or(""),
            description: job.description.as_deref().unwrap_or(""),
        }
    }
}

/// Write `jobs` to `out` in `format`.
pub fn render<W: Write>(jobs: &[Job], format: OutputFormat, mut out: W) -> Result<()> {
    match format {
        OutputFormat::Text => {
            if jobs.is_empty() {
                writeln!(out, "No jobs found")?;
            }
            for job in jobs {
                write!(
                    out,
                    "{} | {} | {} | {} | {}",
                    job.title, job.company, job.location, job.source, job.url
                )?;
                if let Some(salary) = &job.salary {
                    write!(out, " | {salary}")?;
                }
                writeln!(out)?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, jobs)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            for job in jobs {
                writer.serialize(CsvRow::from(job))?;
            }
            writer.flush()?;
        }
    }
    Ok(())
}

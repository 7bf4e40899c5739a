//! Result reporting: structured per-domain reports and their renderers.

use std::io::{self, Write};

use colored::Colorize;
#[cfg(feature = "with-serde")]
use serde::Serialize;
use tracing::warn;

use super::VulnerabilitySink;
use crate::auth::ScanResult;

#[cfg_attr(feature = "with-serde", derive(Serialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionStatus {
    NotFound,
    Ok,
    Vulnerable,
}

#[cfg_attr(feature = "with-serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionReport {
    pub status: SectionStatus,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub record: Option<String>,
}

impl SectionReport {
    fn new(record: Option<&str>, vulnerable: bool) -> Self {
        let status = match (record, vulnerable) {
            (None, _) => SectionStatus::NotFound,
            (Some(_), true) => SectionStatus::Vulnerable,
            (Some(_), false) => SectionStatus::Ok,
        };
        Self {
            status,
            record: record.map(str::to_string),
        }
    }

    pub fn is_vulnerable(&self) -> bool {
        self.status != SectionStatus::Ok
    }
}

/// Renderer-independent view of one scanned domain.
#[cfg_attr(feature = "with-serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScanReport {
    pub domain: String,
    pub spf: SectionReport,
    pub dmarc: SectionReport,
    pub spoofing_possible: bool,
}

impl From<&ScanResult> for ScanReport {
    fn from(result: &ScanResult) -> Self {
        Self {
            domain: result.domain().to_string(),
            spf: SectionReport::new(result.spf_record(), result.spf_vulnerable()),
            dmarc: SectionReport::new(result.dmarc_record(), result.dmarc_vulnerable()),
            spoofing_possible: result.is_vulnerable(),
        }
    }
}

/// Counters returned once the pipeline is done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub scanned: usize,
    pub vulnerable: usize,
}

/// Output format for [`ScanReport`]s.
pub trait Render {
    fn render(&mut self, report: &ScanReport) -> io::Result<()>;

    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<T: Render + ?Sized> Render for Box<T> {
    fn render(&mut self, report: &ScanReport) -> io::Result<()> {
        (**self).render(report)
    }

    fn finish(&mut self) -> io::Result<()> {
        (**self).finish()
    }
}

/// Collects reports in arrival order.
impl Render for Vec<ScanReport> {
    fn render(&mut self, report: &ScanReport) -> io::Result<()> {
        self.push(report.clone());
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Tone {
    Good,
    Bad,
    Warn,
}

/// Human-readable block per domain.
pub struct HumanRenderer<W> {
    out: W,
    color: bool,
}

impl<W: Write> HumanRenderer<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, text: &str, tone: Tone) -> String {
        if !self.color {
            return text.to_string();
        }
        match tone {
            Tone::Good => text.green().to_string(),
            Tone::Bad => text.red().to_string(),
            Tone::Warn => text.yellow().to_string(),
        }
    }

    fn write_section(&mut self, label: &str, section: &SectionReport) -> io::Result<()> {
        let badge = match section.status {
            SectionStatus::NotFound => self.paint("[NOT FOUND - VULNERABLE]", Tone::Bad),
            SectionStatus::Vulnerable => self.paint("[VULNERABLE]", Tone::Bad),
            SectionStatus::Ok => self.paint("[OK]", Tone::Good),
        };
        writeln!(self.out, "    {label}: {badge}")?;
        if let Some(record) = &section.record {
            // align under the badge
            let pad = " ".repeat(label.len() + 6);
            writeln!(self.out, "{pad}{record}")?;
        }
        Ok(())
    }
}

impl<W: Write> Render for HumanRenderer<W> {
    fn render(&mut self, report: &ScanReport) -> io::Result<()> {
        writeln!(self.out, "[*] Domain: {}", report.domain)?;
        self.write_section("SPF", &report.spf)?;
        self.write_section("DMARC", &report.dmarc)?;
        if report.spoofing_possible {
            let marker = self.paint("[!] SPOOFING POSSIBLE", Tone::Warn);
            writeln!(self.out, "    {marker}")?;
        }
        writeln!(self.out)
    }

    fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// One JSON object per line.
#[cfg(feature = "with-serde")]
pub struct NdjsonRenderer<W> {
    out: W,
}

#[cfg(feature = "with-serde")]
impl<W: Write> NdjsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

#[cfg(feature = "with-serde")]
impl<W: Write> Render for NdjsonRenderer<W> {
    fn render(&mut self, report: &ScanReport) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, report)?;
        self.out.write_all(b"\n")
    }

    fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Consumer stage: renders each result and records flagged domains.
pub struct Reporter<'a, R: ?Sized, S: ?Sized> {
    renderer: &'a mut R,
    sink: &'a S,
    summary: ScanSummary,
    render_failed: bool,
}

impl<'a, R, S> Reporter<'a, R, S>
where
    R: Render + ?Sized,
    S: VulnerabilitySink + ?Sized,
{
    pub fn new(renderer: &'a mut R, sink: &'a S) -> Self {
        Self {
            renderer,
            sink,
            summary: ScanSummary::default(),
            render_failed: false,
        }
    }

    pub fn handle(&mut self, result: ScanResult) {
        let report = ScanReport::from(&result);
        self.summary.scanned += 1;

        if let Err(err) = self.renderer.render(&report) {
            self.render_failure(err);
        }

        if report.spoofing_possible {
            self.summary.vulnerable += 1;
            self.sink.record(&report.domain);
        }
    }

    pub fn finish(mut self) -> ScanSummary {
        if let Err(err) = self.renderer.finish() {
            self.render_failure(err);
        }
        self.summary
    }

    fn render_failure(&mut self, err: io::Error) {
        if !self.render_failed {
            warn!(error = %err, "failed to render scan report");
            self.render_failed = true;
        }
    }
}

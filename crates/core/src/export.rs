//! Export renderers for summaries, full reports and transcripts.
//!
//! Text and JSON are always available. PDF and Word need the `pdf` / `docx`
//! cargo features; without them the exporter renders plain text and says so
//! in the returned artifact.

use chrono::{DateTime, Local};
use serde_json::json;

use crate::{
    error::Result,
    format::{format_transcript_plain, group_thousands, reading_time_minutes, word_count},
    settings::ExportFormat,
    types::{AnalysisResult, TranscriptData, VideoInfo},
    validate::sanitize_filename,
};

pub const EXPORT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Summary,
    FullReport,
    Transcript,
}

impl ExportKind {
    pub fn file_prefix(&self) -> &'static str {
        match self {
            ExportKind::Summary => "summary",
            ExportKind::FullReport => "full_report",
            ExportKind::Transcript => "transcript",
        }
    }
}

/// A rendered export. `format` is what was actually produced, which may be
/// Text when the requested document backend is not compiled in.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    pub fn mime_type(&self) -> &'static str {
        mime_type(self.format)
    }

    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }
}

pub fn mime_type(format: ExportFormat) -> &'static str {
    format.mime_type()
}

/// `<kind>_<video id>_<YYYYmmdd_HHMMSS>.<ext>`, sanitized
pub fn file_name(
    kind: ExportKind,
    video_id: &str,
    format: ExportFormat,
    at: DateTime<Local>,
) -> String {
    sanitize_filename(&format!(
        "{}_{}_{}.{}",
        kind.file_prefix(),
        video_id,
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    ))
}

/// Layout-neutral document model shared by the text, PDF and Word renderers.
#[derive(Debug, Clone, PartialEq)]
enum Block {
    Title(String),
    Heading(String),
    Line(String),
    Blank,
}

/// Rule widths used by the text renderer
#[derive(Debug, Clone, Copy)]
struct Rules {
    title: usize,
    heading: usize,
}

const SUMMARY_RULES: Rules = Rules {
    title: 60,
    heading: 20,
};
const REPORT_RULES: Rules = Rules {
    title: 80,
    heading: 30,
};

#[derive(Debug, Clone, Copy)]
pub struct Exporter {
    pdf_available: bool,
    docx_available: bool,
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Exporter {
    pub fn new() -> Self {
        Self {
            pdf_available: cfg!(feature = "pdf"),
            docx_available: cfg!(feature = "docx"),
        }
    }

    /// An exporter that never renders documents, regardless of features.
    pub fn text_only() -> Self {
        Self {
            pdf_available: false,
            docx_available: false,
        }
    }

    pub fn supports(&self, format: ExportFormat) -> bool {
        match format {
            ExportFormat::Pdf => self.pdf_available,
            ExportFormat::Word => self.docx_available,
            ExportFormat::Text | ExportFormat::Json => true,
        }
    }

    /// The format that will actually be rendered for a request
    pub fn effective_format(&self, requested: ExportFormat) -> ExportFormat {
        if self.supports(requested) {
            requested
        } else {
            tracing::warn!(
                requested = %requested,
                "document backend not compiled in, falling back to plain text"
            );
            ExportFormat::Text
        }
    }

    pub fn export_summary(
        &self,
        analysis: &AnalysisResult,
        format: ExportFormat,
    ) -> Result<ExportArtifact> {
        let generated = Local::now();
        let format = self.effective_format(format);
        let bytes = match format {
            ExportFormat::Json => summary_json(analysis, generated)?,
            _ => render(
                &summary_blocks(analysis, generated),
                SUMMARY_RULES,
                format,
                "Video Analysis Summary",
            )?,
        };
        tracing::info!(format = %format, bytes = bytes.len(), "summary exported");
        Ok(ExportArtifact { format, bytes })
    }

    pub fn export_full_report(
        &self,
        analysis: &AnalysisResult,
        transcript: &TranscriptData,
        video_info: &VideoInfo,
        format: ExportFormat,
    ) -> Result<ExportArtifact> {
        let generated = Local::now();
        let format = self.effective_format(format);
        let bytes = match format {
            ExportFormat::Json => full_report_json(analysis, transcript, video_info, generated)?,
            _ => render(
                &full_report_blocks(analysis, transcript, video_info, generated),
                REPORT_RULES,
                format,
                &video_info.title,
            )?,
        };
        tracing::info!(format = %format, bytes = bytes.len(), "full report exported");
        Ok(ExportArtifact { format, bytes })
    }

    pub fn export_transcript(
        &self,
        transcript: &TranscriptData,
        with_timestamps: bool,
    ) -> ExportArtifact {
        ExportArtifact {
            format: ExportFormat::Text,
            bytes: format_transcript_plain(transcript, with_timestamps).into_bytes(),
        }
    }
}

#[cfg_attr(not(feature = "pdf"), allow(unused_variables))]
fn render(blocks: &[Block], rules: Rules, format: ExportFormat, title: &str) -> Result<Vec<u8>> {
    match format {
        #[cfg(feature = "pdf")]
        ExportFormat::Pdf => pdf::render(blocks, title),
        #[cfg(feature = "docx")]
        ExportFormat::Word => docx::render(blocks),
        _ => Ok(render_text(blocks, rules).into_bytes()),
    }
}

fn render_text(blocks: &[Block], rules: Rules) -> String {
    let mut lines: Vec<String> = Vec::new();
    for block in blocks {
        match block {
            Block::Title(title) => {
                lines.push("=".repeat(rules.title));
                lines.push(title.clone());
                lines.push("=".repeat(rules.title));
            }
            Block::Heading(heading) => {
                lines.push(heading.clone());
                lines.push("-".repeat(rules.heading));
            }
            Block::Line(line) => lines.push(line.clone()),
            Block::Blank => lines.push(String::new()),
        }
    }
    lines.join("\n")
}

fn generated_line(generated: DateTime<Local>) -> Block {
    Block::Line(format!(
        "Generated on: {}",
        generated.format("%Y-%m-%d %H:%M:%S")
    ))
}

fn section<I>(blocks: &mut Vec<Block>, heading: &str, lines: I)
where
    I: IntoIterator<Item = String>,
{
    blocks.push(Block::Heading(heading.to_string()));
    blocks.extend(lines.into_iter().map(Block::Line));
    blocks.push(Block::Blank);
}

fn push_common_lists(blocks: &mut Vec<Block>, analysis: &AnalysisResult, with_topics: bool) {
    if !analysis.key_takeaways.is_empty() {
        section(
            blocks,
            "KEY TAKEAWAYS",
            analysis
                .key_takeaways
                .iter()
                .enumerate()
                .map(|(i, t)| format!("{}. {}", i + 1, t)),
        );
    }

    if with_topics {
        if let Some(topics) = analysis.topics.as_ref().filter(|t| !t.is_empty()) {
            section(blocks, "MAIN TOPICS DISCUSSED", [topics.join(", ")]);
        }
        if let Some(sentiment) = analysis.sentiment_analysis {
            section(
                blocks,
                "SENTIMENT ANALYSIS",
                [
                    format!("Positive: {:.1}%", sentiment.positive * 100.0),
                    format!("Neutral: {:.1}%", sentiment.neutral * 100.0),
                    format!("Negative: {:.1}%", sentiment.negative * 100.0),
                    format!("Overall Score: {:.2}", sentiment.overall_score),
                ],
            );
        }
    }

    if !analysis.important_quotes.is_empty() {
        section(
            blocks,
            "IMPORTANT QUOTES",
            analysis
                .important_quotes
                .iter()
                .map(|q| format!("• \"{q}\"")),
        );
    }

    if !analysis.action_items.is_empty() {
        section(
            blocks,
            "ACTION ITEMS",
            analysis.action_items.iter().map(|a| format!("• {a}")),
        );
    }
}

fn main_summary(analysis: &AnalysisResult) -> String {
    if analysis.main_summary.trim().is_empty() {
        "Not available".to_string()
    } else {
        analysis.main_summary.clone()
    }
}

fn summary_blocks(analysis: &AnalysisResult, generated: DateTime<Local>) -> Vec<Block> {
    let mut blocks = vec![
        Block::Title("VIDEO ANALYSIS SUMMARY".to_string()),
        generated_line(generated),
        Block::Blank,
    ];
    section(&mut blocks, "MAIN SUMMARY", [main_summary(analysis)]);
    push_common_lists(&mut blocks, analysis, false);
    blocks
}

fn full_report_blocks(
    analysis: &AnalysisResult,
    transcript: &TranscriptData,
    video_info: &VideoInfo,
    generated: DateTime<Local>,
) -> Vec<Block> {
    let mut blocks = vec![
        Block::Title("COMPREHENSIVE VIDEO ANALYSIS REPORT".to_string()),
        generated_line(generated),
        Block::Blank,
    ];

    section(
        &mut blocks,
        "VIDEO INFORMATION",
        [
            format!("Title: {}", video_info.title),
            format!("Channel: {}", video_info.channel),
            format!("Duration: {}", video_info.duration),
            format!("URL: {}", video_info.url),
        ],
    );
    section(&mut blocks, "EXECUTIVE SUMMARY", [main_summary(analysis)]);
    push_common_lists(&mut blocks, analysis, true);

    if !analysis.timeline.is_empty() {
        section(
            &mut blocks,
            "VIDEO TIMELINE",
            analysis
                .timeline
                .iter()
                .map(|e| format!("{}: {}", e.timestamp, e.description)),
        );
    }

    if !analysis.questions_and_answers.is_empty() {
        blocks.push(Block::Heading("QUESTIONS & ANSWERS".to_string()));
        for qa in &analysis.questions_and_answers {
            blocks.push(Block::Line(format!("Q: {}", qa.question)));
            blocks.push(Block::Line(format!("A: {}", qa.answer)));
            blocks.push(Block::Blank);
        }
    }

    if let Some(notes) = &analysis.study_notes {
        section(
            &mut blocks,
            "STUDY NOTES",
            labeled_groups(&[
                ("Main Concepts", &notes.main_concepts),
                ("Definitions", &notes.definitions),
                ("Examples", &notes.examples),
                ("Formulas/Methods", &notes.formulas),
            ]),
        );
    }

    if let Some(insights) = &analysis.business_insights {
        section(
            &mut blocks,
            "BUSINESS INSIGHTS",
            labeled_groups(&[
                ("Key Strategies", &insights.key_strategies),
                ("Market Insights", &insights.market_insights),
                ("Opportunities", &insights.opportunities),
                ("Challenges", &insights.challenges),
            ]),
        );
    }

    let words = word_count(&transcript.text);
    section(
        &mut blocks,
        "STATISTICS",
        [
            format!("Total Words: {}", group_thousands(words as u64)),
            format!(
                "Total Segments: {}",
                group_thousands(transcript.total_segments as u64)
            ),
            format!(
                "Estimated Reading Time: {} minutes",
                reading_time_minutes(&transcript.text)
            ),
        ],
    );

    blocks
}

fn labeled_groups(groups: &[(&str, &Vec<String>)]) -> Vec<String> {
    let mut lines = Vec::new();
    for (label, items) in groups.iter().filter(|(_, items)| !items.is_empty()) {
        lines.push(format!("{label}:"));
        lines.extend(items.iter().map(|item| format!("• {item}")));
    }
    lines
}

fn export_info(kind: &str, generated: DateTime<Local>) -> serde_json::Value {
    json!({
        "type": kind,
        "generated_at": generated.to_rfc3339(),
        "version": EXPORT_VERSION,
    })
}

fn summary_json(analysis: &AnalysisResult, generated: DateTime<Local>) -> Result<Vec<u8>> {
    let sentiment = match analysis.sentiment_analysis {
        Some(sentiment) => serde_json::to_value(sentiment)?,
        None => json!({}),
    };
    let data = json!({
        "export_info": export_info("summary", generated),
        "main_summary": analysis.main_summary,
        "key_takeaways": analysis.key_takeaways,
        "important_quotes": analysis.important_quotes,
        "action_items": analysis.action_items,
        "topics": analysis.topics.clone().unwrap_or_default(),
        "sentiment_analysis": sentiment,
    });
    Ok(serde_json::to_vec_pretty(&data)?)
}

fn full_report_json(
    analysis: &AnalysisResult,
    transcript: &TranscriptData,
    video_info: &VideoInfo,
    generated: DateTime<Local>,
) -> Result<Vec<u8>> {
    let data = json!({
        "export_info": export_info("full_report", generated),
        "video_info": video_info,
        "analysis_results": analysis,
        "transcript_stats": {
            "total_words": word_count(&transcript.text),
            "total_segments": transcript.total_segments,
            "estimated_reading_time_minutes": reading_time_minutes(&transcript.text),
            "language_codes": transcript.language_codes,
        },
    });
    Ok(serde_json::to_vec_pretty(&data)?)
}

#[cfg(feature = "pdf")]
mod pdf {
    use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

    use super::Block;
    use crate::error::{Result, TldwError};

    const PAGE_WIDTH: f32 = 210.0;
    const PAGE_HEIGHT: f32 = 297.0;
    const MARGIN: f32 = 20.0;
    const PT_TO_MM: f32 = 0.3528;
    // Helvetica averages roughly half an em per glyph
    const GLYPH_EM: f32 = 0.5;

    fn failed(e: impl std::fmt::Display) -> TldwError {
        TldwError::ExportFailed {
            format: "PDF".to_string(),
            reason: e.to_string(),
        }
    }

    struct Cursor {
        layer: PdfLayerReference,
        y: f32,
    }

    pub(super) fn render(blocks: &[Block], title: &str) -> Result<Vec<u8>> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(failed)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(failed)?;

        let mut cursor = Cursor {
            layer: doc.get_page(page).get_layer(layer),
            y: PAGE_HEIGHT - MARGIN,
        };

        for block in blocks {
            let (text, size, font): (&str, f32, &IndirectFontRef) = match block {
                Block::Title(t) => (t, 18.0, &bold),
                Block::Heading(t) => (t, 13.0, &bold),
                Block::Line(t) => (t, 10.0, &regular),
                Block::Blank => {
                    cursor.y -= 4.0;
                    continue;
                }
            };

            let line_height = size * PT_TO_MM * 1.4;
            for line in wrap(text, max_chars(size)) {
                if cursor.y - line_height < MARGIN {
                    let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
                    cursor.layer = doc.get_page(page).get_layer(layer);
                    cursor.y = PAGE_HEIGHT - MARGIN;
                }
                cursor.y -= line_height;
                cursor
                    .layer
                    .use_text(line, size, Mm(MARGIN), Mm(cursor.y), font);
            }
            if matches!(block, Block::Title(_) | Block::Heading(_)) {
                cursor.y -= 2.0;
            }
        }

        doc.save_to_bytes().map_err(failed)
    }

    fn max_chars(size: f32) -> usize {
        let usable = PAGE_WIDTH - 2.0 * MARGIN;
        ((usable / (size * GLYPH_EM * PT_TO_MM)) as usize).max(10)
    }

    pub(super) fn wrap(text: &str, width: usize) -> Vec<String> {
        let mut lines = Vec::new();
        for paragraph in text.lines() {
            let mut current = String::new();
            for word in paragraph.split_whitespace() {
                let needed = current.chars().count() + word.chars().count() + 1;
                if !current.is_empty() && needed > width {
                    lines.push(std::mem::take(&mut current));
                }
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
            }
            lines.push(current);
        }
        if lines.is_empty() {
            lines.push(String::new());
        }
        lines
    }
}

#[cfg(feature = "docx")]
mod docx {
    use docx_rs::{Docx, Paragraph, Run};

    use super::Block;
    use crate::error::{Result, TldwError};

    pub(super) fn render(blocks: &[Block]) -> Result<Vec<u8>> {
        let mut docx = Docx::new();
        for block in blocks {
            let paragraph = match block {
                Block::Title(t) => Paragraph::new().add_run(Run::new().add_text(t).bold().size(36)),
                Block::Heading(t) => {
                    Paragraph::new().add_run(Run::new().add_text(t).bold().size(26))
                }
                Block::Line(t) => Paragraph::new().add_run(Run::new().add_text(t).size(22)),
                Block::Blank => Paragraph::new(),
            };
            docx = docx.add_paragraph(paragraph);
        }

        let mut buf = std::io::Cursor::new(Vec::new());
        docx.build()
            .pack(&mut buf)
            .map_err(|e| TldwError::ExportFailed {
                format: "Word".to_string(),
                reason: e.to_string(),
            })?;
        Ok(buf.into_inner())
    }
}

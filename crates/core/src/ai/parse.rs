//! Heuristic parsers that turn free-form model output into structured facets.
//!
//! Model output is never trusted to follow the requested format, so every
//! parser tolerates noise and simply skips lines it cannot use.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{BusinessInsights, QaPair, Sentiment, StudyNotes, TimelineEntry};

static LEADING_MARKERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d\-•*.)\s]+").expect("valid regex"));
static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.?\s*").expect("valid regex"));
static LIST_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-•*]+\s*|\d+[.)]\s+)").expect("valid regex"));
static TIME_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2}:\d{2}(?::\d{2})?)\s*[:\-–]?\s*(.*)$").expect("valid regex")
});

static POSITIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"positive[:\s*]*(\d+(?:\.\d+)?)").expect("valid regex"));
static NEUTRAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"neutral[:\s*]*(\d+(?:\.\d+)?)").expect("valid regex"));
static NEGATIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"negative[:\s*]*(\d+(?:\.\d+)?)").expect("valid regex"));
static OVERALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"overall(?:\s+sentiment)?(?:\s+score)?[:\s*]*(-?\d+(?:\.\d+)?)")
        .expect("valid regex")
});

const QUOTE_CHARS: &[char] = &['"', '\'', '“', '”', '‘', '’'];

/// Bullet (`•`, `-`, `*`) or numbered lines, markers removed
pub fn parse_bullets(text: &str, limit: usize) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter_map(|line| {
            if let Some(rest) = line.strip_prefix(['•', '-', '*']) {
                Some(rest.trim().to_string())
            } else if line.starts_with(|c: char| ('1'..='9').contains(&c)) {
                Some(LEADING_NUMBER.replace(line, "").trim().to_string())
            } else {
                None
            }
        })
        .filter(|item| !item.is_empty())
        .take(limit)
        .collect()
}

/// Lines that carry quote characters and are long enough to mean something
pub fn parse_quotes(text: &str, limit: usize) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.contains(QUOTE_CHARS))
        .map(|line| {
            LEADING_MARKERS
                .replace(line, "")
                .trim_matches(QUOTE_CHARS)
                .trim()
                .to_string()
        })
        .filter(|quote| quote.chars().count() > 10)
        .take(limit)
        .collect()
}

pub fn parse_topics(text: &str, limit: usize) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            LEADING_MARKERS
                .replace(line, "")
                .trim_matches(|c: char| ".,;:*".contains(c))
                .trim()
                .to_string()
        })
        .filter(|topic| topic.chars().count() > 2)
        .take(limit)
        .collect()
}

/// Percentages become fractions; anything missing stays at zero
pub fn parse_sentiment(text: &str) -> Sentiment {
    let lower = text.to_lowercase();
    let capture = |re: &Regex| -> Option<f64> {
        re.captures(&lower)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
    };
    let fraction = |re: &Regex| {
        capture(re)
            .map(|pct| (pct / 100.0).clamp(0.0, 1.0))
            .unwrap_or(0.0)
    };

    Sentiment {
        positive: fraction(&POSITIVE),
        neutral: fraction(&NEUTRAL),
        negative: fraction(&NEGATIVE),
        overall_score: capture(&OVERALL)
            .map(|score| score.clamp(-1.0, 1.0))
            .unwrap_or(0.0),
    }
}

/// `00:00: Intro`, `1. 05:30 - Topic` or `Opening: Topic` lines
pub fn parse_timeline(text: &str, limit: usize) -> Vec<TimelineEntry> {
    text.lines()
        .filter_map(|line| {
            let line = line.replace("**", "");
            let line = LIST_PREFIX.replace(line.trim(), "");
            let line = line.trim();

            let (timestamp, description) = if let Some(caps) = TIME_PREFIX.captures(line) {
                (caps[1].to_string(), caps[2].trim().to_string())
            } else {
                let (label, description) = line.split_once(':')?;
                (
                    LEADING_MARKERS.replace(label.trim(), "").trim().to_string(),
                    description.trim().to_string(),
                )
            };

            (!timestamp.is_empty() && !description.is_empty()).then_some(TimelineEntry {
                timestamp,
                description,
            })
        })
        .take(limit)
        .collect()
}

/// `Q:`/`Question:` followed by `A:`/`Answer:`; answers may wrap onto more lines
pub fn parse_qa(text: &str, limit: usize) -> Vec<QaPair> {
    let mut pairs = Vec::new();
    let mut question: Option<String> = None;
    let mut answer: Option<String> = None;

    let mut flush = |question: &mut Option<String>, answer: &mut Option<String>| {
        if let (Some(q), Some(a)) = (question.take(), answer.take()) {
            if !q.is_empty() && !a.is_empty() {
                pairs.push(QaPair {
                    question: q,
                    answer: a,
                });
            }
        }
    };

    for raw in text.lines() {
        let line = raw.replace("**", "");
        let line = line.trim();

        if let Some(q) = line
            .strip_prefix("Q:")
            .or_else(|| line.strip_prefix("Question:"))
        {
            flush(&mut question, &mut answer);
            question = Some(q.trim().to_string());
        } else if let Some(a) = line
            .strip_prefix("A:")
            .or_else(|| line.strip_prefix("Answer:"))
        {
            answer = Some(a.trim().to_string());
        } else if !line.is_empty() {
            if let Some(a) = answer.as_mut() {
                a.push(' ');
                a.push_str(line);
            }
        }
    }
    flush(&mut question, &mut answer);

    pairs.truncate(limit);
    pairs
}

/// A line that introduces a section rather than belonging to one
fn is_heading(line: &str) -> bool {
    if line.starts_with("- ") || line.starts_with("• ") || line.starts_with("* ") {
        return false;
    }
    let bare = line.trim_matches(|c: char| c == '#' || c == '*' || c.is_whitespace());
    bare.ends_with(':') || line.starts_with('#') || bare.split_whitespace().count() <= 4
}

/// Split text into keyword-switched sections; lines before the first heading are dropped
pub fn parse_sections(text: &str, keywords: &[&str]) -> Vec<Vec<String>> {
    let mut sections = vec![Vec::new(); keywords.len()];
    let mut current: Option<usize> = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let lower = line.to_lowercase();
        let keyword = keywords.iter().position(|k| lower.contains(k));

        match keyword {
            Some(idx) if is_heading(line) => current = Some(idx),
            _ => {
                if let Some(idx) = current {
                    let item = LIST_PREFIX.replace(line, "").trim().to_string();
                    if !item.is_empty() {
                        sections[idx].push(item);
                    }
                }
            }
        }
    }

    sections
}

pub fn parse_study_notes(text: &str) -> StudyNotes {
    let mut sections = parse_sections(text, &["concept", "definition", "example", "formula"])
        .into_iter();
    let mut next = || sections.next().unwrap_or_default();
    StudyNotes {
        main_concepts: next(),
        definitions: next(),
        examples: next(),
        formulas: next(),
    }
}

pub fn parse_business_insights(text: &str) -> BusinessInsights {
    let mut sections = parse_sections(text, &["strateg", "market", "opportunit", "challenge"])
        .into_iter();
    let mut next = || sections.next().unwrap_or_default();
    BusinessInsights {
        key_strategies: next(),
        market_insights: next(),
        opportunities: next(),
        challenges: next(),
    }
}

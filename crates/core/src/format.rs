use crate::types::{SessionRecord, TranscriptData};

pub const WORDS_PER_MINUTE: usize = 200;

/// Format seconds as MM:SS, or HH:MM:SS once the hour mark is passed
pub fn format_timestamp(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}

/// Format transcript segments with timestamps
pub fn format_transcript_with_timestamps(transcript: &TranscriptData) -> String {
    transcript
        .segments
        .iter()
        .map(|seg| format!("[{}] {}", seg.timestamp, seg.text.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Estimated reading time, always at least one minute
pub fn reading_time_minutes(text: &str) -> usize {
    word_count(text) / WORDS_PER_MINUTE + 1
}

/// Thousands separator for counters (12345 -> 12,345)
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

/// Format a saved session as human-readable markdown
pub fn format_session_readable(session: &SessionRecord) -> String {
    let info = &session.video_info;
    let analysis = &session.analysis;
    let mut output = String::new();

    // Title
    output.push_str(&format!("# {}\n\n", info.title));

    // Meta info
    output.push_str(&format!(
        "**Channel:** {} | **Duration:** {} | **Views:** {} | **Style:** {}\n\n",
        info.channel,
        info.duration,
        group_thousands(info.views),
        session.settings.summary_type
    ));
    output.push_str(&format!(
        "**Words:** {} | **Sentiment:** {:.2} | **Reading time:** {} min\n\n",
        group_thousands(word_count(&session.transcript.text) as u64),
        analysis.sentiment_score(),
        reading_time_minutes(&analysis.main_summary)
    ));

    // Summary
    output.push_str("## Summary\n\n");
    output.push_str(&analysis.main_summary);
    output.push_str("\n\n");

    // Key Takeaways
    if !analysis.key_takeaways.is_empty() {
        output.push_str("## Key Takeaways\n\n");
        for (i, takeaway) in analysis.key_takeaways.iter().enumerate() {
            output.push_str(&format!("{}. {}\n", i + 1, takeaway));
        }
        output.push('\n');
    }

    if !analysis.important_quotes.is_empty() {
        output.push_str("## Important Quotes\n\n");
        for quote in &analysis.important_quotes {
            output.push_str(&format!("> \"{}\"\n", quote));
        }
        output.push('\n');
    }

    if !analysis.action_items.is_empty() {
        output.push_str("## Action Items\n\n");
        for item in &analysis.action_items {
            output.push_str(&format!("- {}\n", item));
        }
        output.push('\n');
    }

    // Topics
    if let Some(topics) = analysis.topics.as_ref().filter(|t| !t.is_empty()) {
        output.push_str("## Topics\n\n");
        output.push_str(
            &topics
                .iter()
                .map(|t| format!("[{}]", t))
                .collect::<Vec<_>>()
                .join(" "),
        );
        output.push_str("\n\n");
    }

    if let Some(sentiment) = &analysis.sentiment_analysis {
        output.push_str("## Sentiment\n\n");
        output.push_str(&format!(
            "Positive {} | Neutral {} | Negative {}\n\n",
            percent(sentiment.positive),
            percent(sentiment.neutral),
            percent(sentiment.negative)
        ));
    }

    // Timeline
    if !analysis.timeline.is_empty() {
        output.push_str("## Timeline\n\n");
        for event in &analysis.timeline {
            output.push_str(&format!("**{}** - {}\n", event.timestamp, event.description));
        }
        output.push('\n');
    }

    if !analysis.questions_and_answers.is_empty() {
        output.push_str("## Q&A\n\n");
        for qa in &analysis.questions_and_answers {
            output.push_str(&format!("**Q:** {}\n**A:** {}\n\n", qa.question, qa.answer));
        }
    }

    if let Some(notes) = &analysis.study_notes {
        output.push_str("## Study Notes\n\n");
        push_titled_list(&mut output, "Main concepts", &notes.main_concepts);
        push_titled_list(&mut output, "Definitions", &notes.definitions);
        push_titled_list(&mut output, "Examples", &notes.examples);
        push_titled_list(&mut output, "Formulas / methods", &notes.formulas);
    }

    if let Some(insights) = &analysis.business_insights {
        output.push_str("## Business Insights\n\n");
        push_titled_list(&mut output, "Key strategies", &insights.key_strategies);
        push_titled_list(&mut output, "Market insights", &insights.market_insights);
        push_titled_list(&mut output, "Opportunities", &insights.opportunities);
        push_titled_list(&mut output, "Challenges", &insights.challenges);
    }

    output
}

fn push_titled_list(output: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    output.push_str(&format!("### {}\n\n", title));
    for item in items {
        output.push_str(&format!("• {}\n", item));
    }
    output.push('\n');
}

/// Transcript dump, optionally prefixed with segment timestamps
pub fn format_transcript_plain(transcript: &TranscriptData, with_timestamps: bool) -> String {
    if with_timestamps {
        format_transcript_with_timestamps(transcript)
    } else {
        transcript.text.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "00:00");
        assert_eq!(format_timestamp(75.9), "01:15");
        assert_eq!(format_timestamp(3723.0), "01:02:03");
        assert_eq!(format_timestamp(-4.0), "00:00");
        assert_eq!(format_timestamp(f64::NAN), "00:00");
    }

    #[test]
    fn test_reading_time() {
        assert_eq!(reading_time_minutes(""), 1);
        assert_eq!(reading_time_minutes(&"word ".repeat(450)), 3);
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0.655), "65.5%");
    }
}

//! Prompt templates for every analysis facet and for chat.

use crate::{
    settings::{OutputLanguage, SummaryStyle},
    types::VideoInfo,
};

/// Exchanges of chat history included in the chat prompt
pub const CHAT_HISTORY_WINDOW: usize = 5;

/// Attach the transcript body to a facet prompt
pub fn with_transcript(prompt: &str, transcript: &str) -> String {
    format!("{prompt}\n\nTranscript:\n{transcript}")
}

pub fn summary(style: SummaryStyle, language: OutputLanguage, video: &VideoInfo) -> String {
    let context = format!(
        r#"You are an expert content analyzer specializing in video transcript analysis.

Video Information:
- Title: {title}
- Channel: {channel}
- Duration: {duration}

Language: Generate the summary in {language}.
"#,
        title = video.title,
        channel = video.channel,
        duration = video.duration,
        language = language,
    );

    let body = match style {
        SummaryStyle::Comprehensive => {
            r#"
Create a comprehensive summary that covers all major points discussed in the video.
Include the main thesis, supporting arguments, examples, and conclusions.
Structure it with clear sections and provide detailed explanations.
Aim for 400-600 words."#
        }
        SummaryStyle::Brief => {
            r#"
Create a concise summary focusing on the core message and key points.
Highlight only the most important information and main takeaways.
Keep it clear and to the point.
Aim for 150-250 words."#
        }
        SummaryStyle::BulletPoints => {
            r#"
Create a structured bullet-point summary that breaks down the content into:
• Main Topic/Theme
• Key Points (5-8 bullets)
• Important Details (3-5 bullets)
• Conclusion/Takeaway

Use clear, actionable bullet points."#
        }
        SummaryStyle::Academic => {
            r#"
Create an academic-style summary suitable for students and researchers.
Include:
- Abstract/Overview
- Main concepts and theories discussed
- Supporting evidence and examples
- Methodology (if applicable)
- Conclusions and implications
- Key terms and definitions

Use formal academic language and structure."#
        }
        SummaryStyle::Business => {
            r#"
Create a business-focused summary emphasizing:
- Executive summary
- Strategic insights and recommendations
- Market implications
- Actionable business intelligence
- Key metrics and data points
- Implementation considerations

Use professional business language and focus on practical applications."#
        }
        SummaryStyle::Creative => {
            r#"
Create an engaging, creative summary that captures the essence of the content
while being informative and entertaining. Use:
- Compelling narrative structure
- Vivid descriptions and analogies
- Engaging transitions
- Memorable quotes and examples
- Creative formatting and structure

Make it both informative and enjoyable to read."#
        }
    };

    format!("{context}{body}")
}

pub fn takeaways(style: SummaryStyle) -> String {
    let base = r#"Analyze the following transcript and extract the most important takeaways.
Focus on actionable insights, key learnings, and memorable points.
"#;

    let focus = match style {
        SummaryStyle::Academic => {
            r#"
Focus on:
- Core concepts and theories
- Key findings and conclusions
- Important methodologies
- Significant insights for further study

Format as clear, educational bullet points."#
        }
        SummaryStyle::Business => {
            r#"
Focus on:
- Strategic insights
- Business opportunities
- Market intelligence
- Actionable recommendations
- Performance metrics

Format as executive-level takeaways."#
        }
        _ => {
            r#"
Extract 5-10 key takeaways that viewers should remember.
Focus on practical, actionable insights.
Format as clear, concise bullet points."#
        }
    };

    format!("{base}{focus}")
}

pub const QUOTES: &str = r#"Extract the most impactful, memorable, and important quotes from the transcript.
Focus on:
- Profound insights and wisdom
- Memorable statements
- Key definitions or explanations
- Inspiring or motivational quotes
- Controversial or thought-provoking statements

Select 3-5 quotes that best represent the core message.
Provide only the quotes without additional commentary.
Format each quote on a new line."#;

pub const ACTION_ITEMS: &str = r#"Based on the transcript content, generate specific, actionable items that
viewers can implement or follow up on.

Focus on:
- Specific steps to take
- Recommended actions
- Things to research further
- Practical implementations
- Follow-up activities

Format as clear, actionable bullet points.
Start each item with an action verb.
Provide 5-8 concrete action items."#;

pub const TOPICS: &str = r#"Identify and extract the main topics, themes, and subjects discussed in the transcript.

Focus on:
- Primary topics and themes
- Subtopics and categories
- Key concepts mentioned
- Subject areas covered
- Important keywords and phrases

Provide 8-12 topics as single words or short phrases.
Format as a simple list, one topic per line."#;

pub const SENTIMENT: &str = r#"Analyze the overall sentiment and emotional tone of the transcript.

Provide:
1. Overall sentiment percentages:
   - Positive: X%
   - Neutral: X%
   - Negative: X%

2. Overall sentiment score: [number between -1 and 1]
   (-1 = very negative, 0 = neutral, 1 = very positive)

3. Brief explanation of the emotional tone and mood throughout the content.

Base your analysis on:
- Word choice and language used
- Emotional expressions
- Overall message tone
- Speaker's attitude and delivery style"#;

pub const TIMELINE: &str = r#"Create a timeline of key events, topics, or sections discussed in the video.

Analyze the flow of content and identify:
- Major topic transitions
- Key events or milestones mentioned
- Important segments or chapters
- Significant moments or turning points

Format as:
[Time/Section]: [Brief description of what happens]

Example:
00:00: Introduction and overview
05:30: First main topic discussion
12:15: Important example or case study

Provide 8-10 timeline entries covering the major flow of content."#;

pub const QA: &str = r#"Extract or generate relevant question-answer pairs from the transcript.

Focus on:
- Actual questions asked and answered in the content
- Implicit questions that are addressed
- Important concepts explained
- Key topics that viewers might want to understand

Format as:
Q: [Question]
A: [Answer]

Provide 3-5 meaningful Q&A pairs that capture the most important information."#;

pub const STUDY_NOTES: &str = r#"Create comprehensive study notes from the transcript suitable for academic learning.

Organize into sections:

MAIN CONCEPTS:
- List the primary concepts and theories discussed

DEFINITIONS:
- Key terms and their explanations

EXAMPLES:
- Important examples and case studies mentioned

FORMULAS/METHODS:
- Any formulas, methodologies, or processes explained

Use clear, academic language and structure the notes for easy studying and review."#;

pub const BUSINESS_INSIGHTS: &str = r#"Extract business-focused insights and intelligence from the transcript.

Organize into sections:

KEY STRATEGIES:
- Strategic approaches and methodologies discussed

MARKET INSIGHTS:
- Market analysis, trends, and intelligence

OPPORTUNITIES:
- Business opportunities and potential areas for growth

CHALLENGES:
- Challenges, obstacles, and potential risks mentioned

Focus on actionable business intelligence that can inform decision-making."#;

/// Chat prompt: transcript inline plus the most recent exchanges
pub fn chat(transcript: &str, history: &[(String, String)], question: &str) -> String {
    let mut history_context = String::new();
    if !history.is_empty() {
        history_context.push_str("\n\nPrevious conversation:\n");
        let start = history.len().saturating_sub(CHAT_HISTORY_WINDOW);
        for (q, a) in &history[start..] {
            history_context.push_str(&format!("Human: {q}\nAI: {a}\n\n"));
        }
    }

    format!(
        r#"You are an AI assistant that can answer questions about the following video transcript.
Be helpful, accurate, and cite specific parts of the transcript when relevant.

Guidelines:
- Answer based on the transcript content
- If information isn't in the transcript, say so clearly
- Provide specific quotes or references when possible
- Be conversational but informative
- If asked about timestamps, note that you don't have access to exact timing

Transcript: {transcript}
{history_context}
User Question: {question}

Please provide a comprehensive answer based on the transcript content:"#
    )
}

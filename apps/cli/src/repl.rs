use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;
use tldw_core::{
    Analyzer, ChatSession, Rating, Role, SessionRecord, TextModel,
    chat::{ChatMessage, export_file_name},
    validate::{is_safe_content, validate_text_input},
    youtube::{SegmentHit, search_transcript, transcript_chapters},
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::ui::{check, create_spinner, rule};

const HELP: &str = "\
Commands:
  <question>          ask about the video
  1-6                 ask one of the suggested questions
  /suggest            show suggested questions
  /refresh            generate new suggestions
  /like N, /dislike N rate answer N
  /regen N            regenerate answer N
  /search <words>     find where the video mentions something
  /chapters           segments that look like chapter starts
  /summary            summarize this conversation
  /insights           conversation statistics
  /export [dir]       write the chat history as JSON
  /clear              forget the conversation
  /quit               leave";

const MAX_QUESTION_CHARS: usize = 2000;

/// Why a question cannot be sent, if it cannot
fn question_problem(question: &str) -> Option<&'static str> {
    if !validate_text_input(question, 1, MAX_QUESTION_CHARS) {
        Some("Questions must be between 1 and 2000 characters.")
    } else if !is_safe_content(question) {
        Some("That question contains content that can't be sent.")
    } else {
        None
    }
}

fn print_hits(hits: &[SegmentHit], empty: &str) {
    if hits.is_empty() {
        println!("{}", style(empty).dim());
        return;
    }
    for hit in hits {
        println!("  {} {}", style(format!("[{}]", hit.timestamp)).cyan(), hit.text);
    }
}

fn print_suggestions(chat: &ChatSession) {
    println!("{}", style("Suggested questions").bold());
    for (i, suggestion) in chat.suggestions().iter().enumerate() {
        println!("  {} {}", style(format!("{}.", i + 1)).cyan(), suggestion);
    }
}

fn print_message(index: usize, message: &ChatMessage) {
    let who = match message.role {
        Role::User => style("you").cyan().bold(),
        Role::Assistant => style("tldw").green().bold(),
    };
    println!(
        "{} {} {}",
        style(format!("[{index}]")).dim(),
        who,
        style(message.timestamp.format("%H:%M:%S")).dim()
    );
    println!("{}\n", message.content);
}

async fn ask<M: TextModel>(chat: &mut ChatSession, analyzer: &Analyzer<M>, question: &str) {
    if let Some(problem) = question_problem(question) {
        println!("{}", style(problem).yellow());
        return;
    }
    let spinner = create_spinner("Thinking...");
    let result = chat.ask(analyzer, question).await.map(|m| m.is_some());
    spinner.finish_and_clear();
    match result {
        Ok(true) => {
            let index = chat.history().len() - 1;
            print_message(index, &chat.history()[index]);
        }
        Ok(false) => {}
        Err(e) => eprintln!(
            "{} Sorry, I couldn't process your question: {}",
            style("Error:").red().bold(),
            e
        ),
    }
}

/// Write the history as JSON into `dir`; `None` when there is nothing to write
async fn export_chat(chat: &ChatSession, dir: &Path) -> Result<Option<PathBuf>> {
    let Some(json) = chat.export_json()? else {
        return Ok(None);
    };
    let path = dir.join(export_file_name(chrono::Local::now()));
    tokio::fs::write(&path, json)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(Some(path))
}

fn parse_index(arg: Option<&str>) -> Option<usize> {
    arg.and_then(|a| a.trim().parse().ok())
}

/// Interactive question loop over one saved session
pub async fn run<M: TextModel>(record: &SessionRecord, analyzer: &Analyzer<M>) -> Result<()> {
    let mut chat = ChatSession::for_record(record);

    println!(
        "{} Chatting about {}",
        check(),
        style(&record.video_info.title).bold()
    );
    println!("{}", style("Type /help for commands.").dim());
    rule();
    print_suggestions(&chat);
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", style(">").cyan().bold());
        std::io::Write::flush(&mut std::io::stdout()).ok();

        let Some(line) = lines.next_line().await.context("failed to read input")? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, arg) = match line.split_once(' ') {
            Some((c, a)) => (c, Some(a)),
            None => (line, None),
        };

        match command {
            "/quit" | "/exit" => break,
            "/help" => println!("{HELP}"),
            "/suggest" => print_suggestions(&chat),
            "/refresh" => {
                chat.refresh_suggestions();
                print_suggestions(&chat);
            }
            "/like" | "/dislike" => {
                let rating = if command == "/like" {
                    Rating::Like
                } else {
                    Rating::Dislike
                };
                match parse_index(arg) {
                    Some(index) if chat.rate(index, rating) => {
                        println!("{} Thanks for the feedback!", check())
                    }
                    _ => println!("{}", style("No answer with that number.").yellow()),
                }
            }
            "/regen" => {
                let Some(index) = parse_index(arg) else {
                    println!("{}", style("Usage: /regen N").yellow());
                    continue;
                };
                let spinner = create_spinner("Regenerating answer...");
                let result = chat.regenerate(analyzer, index).await;
                spinner.finish_and_clear();
                match result {
                    Ok(true) => print_message(index, &chat.history()[index]),
                    Ok(false) => println!("{}", style("No answer with that number.").yellow()),
                    Err(e) => eprintln!(
                        "{} Error regenerating answer: {}",
                        style("Error:").red().bold(),
                        e
                    ),
                }
            }
            "/search" => match arg.map(str::trim).filter(|q| !q.is_empty()) {
                Some(query) => print_hits(
                    &search_transcript(&record.transcript, query),
                    "Nothing in the transcript matches that.",
                ),
                None => println!("{}", style("Usage: /search <words>").yellow()),
            },
            "/chapters" => print_hits(
                &transcript_chapters(&record.transcript),
                "No chapter markers found.",
            ),
            "/summary" => match chat.summary() {
                Some(summary) => {
                    println!("{} {}", style("Total messages:").dim(), summary.total_messages);
                    println!("{}", style("Questions asked:").dim());
                    for (i, question) in summary.questions.iter().enumerate() {
                        println!("  {}. {}", i + 1, question);
                    }
                    println!(
                        "{} {}",
                        style("Key topics:").dim(),
                        summary.key_topics.join(", ")
                    );
                }
                None => println!("{}", style("No chat history to summarize.").dim()),
            },
            "/insights" => match chat.insights() {
                Some(insights) => {
                    println!(
                        "{} {} questions, {} answers",
                        style("Messages:").dim(),
                        insights.user_questions,
                        insights.ai_responses
                    );
                    println!(
                        "{} {:.1} words",
                        style("Average question:").dim(),
                        insights.average_question_length
                    );
                    println!("{} {}", style("Topics explored:").dim(), insights.topics_explored);
                    println!("{} {:?}", style("Engagement:").dim(), insights.engagement_level);
                }
                None => println!("{}", style("No chat history yet.").dim()),
            },
            "/export" => {
                let dir = arg.map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
                match export_chat(&chat, &dir).await {
                    Ok(Some(path)) => {
                        println!("{} Exported: {}", check(), style(path.display()).cyan())
                    }
                    Ok(None) => println!("{}", style("No chat history to export.").dim()),
                    Err(e) => eprintln!(
                        "{} Could not export chat: {:#}",
                        style("Error:").red().bold(),
                        e
                    ),
                }
            }
            "/clear" => {
                chat.clear();
                println!("{} Chat history cleared!", check());
            }
            _ if command.starts_with('/') => {
                println!("{}", style("Unknown command, try /help").yellow())
            }
            _ => {
                let picked = line
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| chat.suggestions().get(i).cloned());
                let question = picked.unwrap_or_else(|| line.to_string());
                ask(&mut chat, analyzer, &question).await;
            }
        }
    }

    Ok(())
}

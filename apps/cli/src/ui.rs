use std::time::{Duration, Instant};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tldw_core::{
    Facet, SessionSummary, Step,
    format::{group_thousands, percent},
    pipeline::Progress,
    session::SessionStats,
    types::VideoInfo,
};

pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn check() -> console::StyledObject<&'static str> {
    style("✓").green().bold()
}

pub fn rule() {
    println!("{}", style("─".repeat(60)).dim());
}

pub fn header(subtitle: &str) {
    println!(
        "\n{}  {}\n",
        style("tldw").cyan().bold(),
        style(subtitle).dim()
    );
}

fn step_label(step: Step) -> &'static str {
    match step {
        Step::VideoInfo => "Video info",
        Step::Captions => "Captions",
        Step::Analysis => "Analysis",
        Step::Save => "Saved session",
    }
}

fn step_message(step: Step) -> &'static str {
    match step {
        Step::VideoInfo => "Fetching video info...",
        Step::Captions => "Fetching captions...",
        Step::Analysis => "Analyzing transcript...",
        Step::Save => "Saving session...",
    }
}

/// Drives one spinner per pipeline step
#[derive(Default)]
pub struct SpinnerProgress {
    spinner: Option<ProgressBar>,
    started: Option<Instant>,
}

impl Progress for SpinnerProgress {
    fn step_started(&mut self, step: Step) {
        self.spinner = Some(create_spinner(step_message(step)));
        self.started = Some(Instant::now());
    }

    fn step_finished(&mut self, step: Step, detail: &str) {
        let elapsed = self.started.map(|s| s.elapsed()).unwrap_or_default();
        let line = format!(
            "{} {}: {} {}",
            check(),
            step_label(step),
            style(detail).yellow(),
            style(format!("[{}]", format_duration(elapsed))).dim()
        );
        match self.spinner.take() {
            Some(pb) => pb.finish_with_message(line),
            None => println!("{line}"),
        }
    }

    fn facet_started(&mut self, facet: Facet) {
        if let Some(pb) = &self.spinner {
            pb.set_message(format!("Analyzing: {}...", facet.label()));
        }
    }
}

impl Drop for SpinnerProgress {
    fn drop(&mut self) {
        // a failed step leaves its spinner running
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }
}

pub fn print_video_info(info: &VideoInfo) {
    println!("{}", style(&info.title).bold());
    println!("  {} {}", style("Channel:").dim(), info.channel);
    println!("  {} {}", style("Duration:").dim(), info.duration);
    println!("  {} {}", style("Views:").dim(), group_thousands(info.views));
    if let Some(likes) = info.likes {
        println!("  {} {}", style("Likes:").dim(), group_thousands(likes));
    }
    if let Some(published) = &info.published_date {
        println!("  {} {}", style("Published:").dim(), published);
    }
    println!("  {} {}", style("URL:").dim(), style(&info.url).cyan());
}

pub fn print_session_list(sessions: &[SessionSummary]) {
    if sessions.is_empty() {
        println!("{}", style("No saved sessions.").dim());
        return;
    }
    for s in sessions {
        let created = s
            .created_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "{}  {}  {}",
            style(&s.session_id).cyan(),
            style(created).dim(),
            style(&s.title).bold()
        );
        println!(
            "    {} · {} · {}",
            s.channel,
            s.duration,
            style(s.summary_type.label()).yellow()
        );
    }
}

pub fn print_stats(stats: &SessionStats) {
    println!("{} {}", style("Sessions:").dim(), stats.total_sessions);
    if let Some(style_name) = stats.favorite_summary_type {
        println!("{} {}", style("Favourite style:").dim(), style_name);
    }
    if let Some(day) = stats.most_active_day {
        println!("{} {}", style("Most active day:").dim(), day);
    }

    if !stats.channels_analyzed.is_empty() {
        println!("\n{}", style("Top channels").bold());
        for channel in &stats.channels_analyzed {
            println!("  {:>3}  {}", channel.count, channel.name);
        }
    }

    if stats.total_sessions > 0 {
        println!("\n{}", style("Summary styles").bold());
        for (name, count) in &stats.summary_type_distribution {
            let share = *count as f64 / stats.total_sessions as f64;
            println!("  {:>6}  {}", percent(share), name);
        }
    }
}

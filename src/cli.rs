use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, bail, Result};

use crate::app::App;
use crate::core::time::parse_timestamp;
use crate::flows::lookup::LookupQuery;
use crate::flows::upload::SubmissionDraft;
use crate::schemas::rubric::{RubricCriterion, RubricScores};
use crate::schemas::submission::{Grade, Room, SubmissionRecord};
use crate::services::media::VideoFile;
use crate::services::notifier::Notifier;
use crate::tasks::result_poll::PollOutcome;
use crate::views::dashboard::DashboardStats;
use crate::views::gallery::GalleryFilter;

pub const USAGE: &str = "\
usage: sportsday <command> [--flag value]...

commands:
  list
  rubric
  upload     --name N --number S --grade G --room R --file PATH [--mime TYPE]
  login      --user U --pin P
  grade      --user U --pin P --row ID --content X --participation X
             --presentation X --discipline X [--comment TEXT | --ai-comment]
  result     --number S --grade G --room R [--watch]
  gallery    [--search TEXT] [--grade G] [--room R] [--sort latest|oldest|score-high|score-low]
  dashboard";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadArgs {
    pub name: String,
    pub student_number: String,
    pub grade: Grade,
    pub room: Room,
    pub file: PathBuf,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentSource {
    Text(String),
    Ai,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeArgs {
    pub username: String,
    pub pin: String,
    pub row_id: i64,
    pub scores: RubricScores,
    pub comment: CommentSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Rubric,
    Upload(UploadArgs),
    Login { username: String, pin: String },
    Grade(GradeArgs),
    Result { query: LookupQuery, watch: bool },
    Gallery(GalleryFilter),
    Dashboard,
    Help,
}

struct Flags {
    command: &'static str,
    values: HashMap<String, String>,
    switches: HashSet<String>,
}

impl Flags {
    fn parse(
        command: &'static str,
        mut args: impl Iterator<Item = String>,
        known_values: &[&str],
        known_switches: &[&str],
    ) -> Result<Self> {
        let mut values = HashMap::new();
        let mut switches = HashSet::new();
        while let Some(arg) = args.next() {
            let Some(name) = arg.strip_prefix("--") else {
                bail!("{command}: unexpected argument {arg}");
            };
            if known_switches.contains(&name) {
                switches.insert(name.to_string());
            } else if known_values.contains(&name) {
                let value = args.next().ok_or_else(|| anyhow!("--{name} missing value"))?;
                values.insert(name.to_string(), value);
            } else {
                bail!("{command}: unknown flag --{name}");
            }
        }
        Ok(Self { command, values, switches })
    }

    fn optional(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    fn required(&self, name: &str) -> Result<&str> {
        self.optional(name).ok_or_else(|| anyhow!("{}: --{name} is required", self.command))
    }

    fn parsed<T>(&self, name: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.required(name)?;
        raw.parse().map_err(|err| anyhow!("--{name} {raw}: {err}"))
    }

    fn parsed_optional<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.optional(name) {
            None | Some("All") | Some("all") => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|err| anyhow!("--{name} {raw}: {err}")),
        }
    }

    fn switch(&self, name: &str) -> bool {
        self.switches.contains(name)
    }
}

/// Parses everything after the program name.
pub fn parse_args<I>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let Some(command) = args.next() else {
        return Ok(Command::Help);
    };

    match command.as_str() {
        "list" => {
            Flags::parse("list", args, &[], &[])?;
            Ok(Command::List)
        }
        "rubric" => {
            Flags::parse("rubric", args, &[], &[])?;
            Ok(Command::Rubric)
        }
        "upload" => {
            let flags = Flags::parse(
                "upload",
                args,
                &["name", "number", "grade", "room", "file", "mime"],
                &[],
            )?;
            Ok(Command::Upload(UploadArgs {
                name: flags.required("name")?.to_string(),
                student_number: flags.required("number")?.to_string(),
                grade: flags.parsed("grade")?,
                room: flags.parsed("room")?,
                file: PathBuf::from(flags.required("file")?),
                mime_type: flags.optional("mime").map(str::to_string),
            }))
        }
        "login" => {
            let flags = Flags::parse("login", args, &["user", "pin"], &[])?;
            Ok(Command::Login {
                username: flags.required("user")?.to_string(),
                pin: flags.required("pin")?.to_string(),
            })
        }
        "grade" => {
            let flags = Flags::parse(
                "grade",
                args,
                &[
                    "user",
                    "pin",
                    "row",
                    "content",
                    "participation",
                    "presentation",
                    "discipline",
                    "comment",
                ],
                &["ai-comment"],
            )?;
            let comment = match (flags.optional("comment"), flags.switch("ai-comment")) {
                (Some(_), true) => bail!("grade: use either --comment or --ai-comment"),
                (Some(text), false) => CommentSource::Text(text.to_string()),
                (None, true) => CommentSource::Ai,
                (None, false) => CommentSource::Text(String::new()),
            };
            Ok(Command::Grade(GradeArgs {
                username: flags.required("user")?.to_string(),
                pin: flags.required("pin")?.to_string(),
                row_id: flags.parsed("row")?,
                scores: RubricScores {
                    content_accuracy: flags.parsed("content")?,
                    participation: flags.parsed("participation")?,
                    presentation: flags.parsed("presentation")?,
                    discipline: flags.parsed("discipline")?,
                },
                comment,
            }))
        }
        "result" => {
            let flags = Flags::parse("result", args, &["number", "grade", "room"], &["watch"])?;
            Ok(Command::Result {
                query: LookupQuery::new(
                    flags.required("number")?,
                    flags.parsed("grade")?,
                    flags.parsed("room")?,
                ),
                watch: flags.switch("watch"),
            })
        }
        "gallery" => {
            let flags = Flags::parse("gallery", args, &["search", "grade", "room", "sort"], &[])?;
            Ok(Command::Gallery(GalleryFilter {
                search: flags.optional("search").unwrap_or_default().to_string(),
                grade: flags.parsed_optional("grade")?,
                room: flags.parsed_optional("room")?,
                sort: flags.parsed_optional("sort")?.unwrap_or_default(),
            }))
        }
        "dashboard" => {
            Flags::parse("dashboard", args, &[], &[])?;
            Ok(Command::Dashboard)
        }
        "help" | "--help" | "-h" => Ok(Command::Help),
        other => bail!("unknown command: {other}\n\n{USAGE}"),
    }
}

pub async fn execute(app: &mut App, command: Command) -> Result<()> {
    match command {
        Command::Help => println!("{USAGE}"),
        Command::List => {
            app.refresh(false).await?;
            for record in app.model().submissions.iter() {
                println!("{}", render_record(record));
            }
        }
        Command::Rubric => {
            app.load_rubric().await?;
            for criterion in &app.model().rubric {
                println!("{}", render_criterion(criterion));
            }
        }
        Command::Upload(args) => {
            let draft = SubmissionDraft {
                name: args.name,
                student_number: args.student_number,
                grade: args.grade,
                room: args.room,
                video: Some(VideoFile::from_path(args.file, args.mime_type)),
            };
            if let Err(err) = app.submit(draft).await {
                if let Some(message) = app.model().error_message.as_deref() {
                    println!("{message}");
                }
                return Err(err.into());
            }
            println!("Upload complete. Thank you!");
        }
        Command::Login { username, pin } => {
            let session = app.login(&username, &pin).await?;
            println!("Welcome, {}.", session.teacher_name);
        }
        Command::Grade(args) => {
            app.login(&args.username, &args.pin).await?;
            app.refresh(true).await?;
            let comment = match args.comment {
                CommentSource::Text(text) => text,
                CommentSource::Ai => {
                    let comment = app.ai_comment(args.row_id, &args.scores).await?;
                    println!("Comment: {comment}");
                    comment
                }
            };
            let accepted = app.grade(args.row_id, args.scores, &comment).await;
            app.logout();
            if !accepted? {
                bail!("row {} was not graded; please try again", args.row_id);
            }
            println!("Saved row {}: {}/20", args.row_id, args.scores.total());
        }
        Command::Result { query, watch } => {
            app.refresh(false).await?;
            let Some(record) = app.lookup(query).cloned() else {
                println!("No submission found for that student number, grade and room.");
                return Ok(());
            };
            println!("{}", render_record(&record));
            if record.is_graded() {
                return Ok(());
            }
            println!("Waiting for your teacher to grade this work.");
            if watch {
                let shutdown = crate::core::shutdown::shutdown_on_signal();
                match app.watch_result(shutdown).await {
                    PollOutcome::Graded(arrival) => println!("{}", arrival.body()),
                    PollOutcome::NoMatch => println!("The submission is no longer listed."),
                    PollOutcome::Cancelled | PollOutcome::NotNeeded => {}
                }
            }
        }
        Command::Gallery(filter) => {
            app.refresh(false).await?;
            for record in app.gallery(filter) {
                println!("{}", render_record(&record));
            }
        }
        Command::Dashboard => {
            app.refresh(false).await?;
            println!("{}", render_dashboard(&app.dashboard()));
        }
    }
    Ok(())
}

pub fn render_record(record: &SubmissionRecord) -> String {
    let row = record.row_id.map_or_else(|| "-".to_string(), |id| id.to_string());
    let score = match &record.review {
        Some(review) => format!("{}/20 ({}%)", review.total_score, review.percentage),
        None => "pending".to_string(),
    };
    let mut line = format!(
        "#{row} {} (No. {}, {}, {}) {score}",
        record.name, record.student_number, record.grade, record.room
    );
    if let Some(submitted) = record.timestamp.as_deref().and_then(parse_timestamp) {
        line.push_str(&format!(" submitted {}", submitted.date()));
    }
    if let Some(review) = record.review.as_ref().filter(|review| !review.comment.is_empty()) {
        line.push_str(&format!(" \"{}\"", review.comment));
    }
    if let Some(url) = &record.file_url {
        line.push_str(&format!(" {url}"));
    }
    line
}

fn render_criterion(criterion: &RubricCriterion) -> String {
    match criterion.max_score {
        Some(max) => format!("{} (max {max}): {}", criterion.name, criterion.description),
        None => format!("{}: {}", criterion.name, criterion.description),
    }
}

pub fn render_dashboard(stats: &DashboardStats) -> String {
    let mut lines = vec![
        format!("Submissions: {}", stats.total),
        format!("Graded: {}  Pending: {}", stats.graded, stats.pending),
        format!(
            "Average: {}  Highest: {}",
            stats.average_score.map_or_else(|| "-".to_string(), |avg| format!("{avg:.2}")),
            stats.highest_score.map_or_else(|| "-".to_string(), |max| max.to_string()),
        ),
    ];
    for (grade, count) in &stats.by_grade {
        lines.push(format!("{grade}: {count}"));
    }
    for (room, count) in &stats.by_room {
        lines.push(format!("{room}: {count}"));
    }
    lines.push(format!(
        ">=80%: {}  60-79%: {}  <60%: {}",
        stats.bands.excellent, stats.bands.good, stats.bands.needs_work
    ));
    lines.join("\n")
}

/// Prints notifications and celebrations to the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, title: &str, body: &str) {
        println!("[{title}] {body}");
    }

    fn celebrate(&self, student_name: &str) {
        println!("Great job, {student_name}! Your video is in.");
    }
}

use std::fmt;
use std::fmt::Write as _;

use exam_core::model::{OptionId, Phase, Scorecard, TestDefinition};
use services::{NavigatorStatus, ReviewItem, SessionHandle, SessionIntent, SessionSnapshot};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Intent(SessionIntent),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    Empty,
    Unknown(String),
    MissingArgument { command: &'static str },
    InvalidNumber { raw: String },
    NoQuestion,
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::Empty => write!(f, "type a command, or h for help"),
            InputError::Unknown(raw) => write!(f, "unknown command: {raw}"),
            InputError::MissingArgument { command } => write!(f, "{command} needs an argument"),
            InputError::InvalidNumber { raw } => write!(f, "not a question number: {raw}"),
            InputError::NoQuestion => write!(f, "no question is on screen"),
        }
    }
}

impl std::error::Error for InputError {}

/// Parse one line of terminal input against the current snapshot.
///
/// Question numbers are 1-based on screen; `a` and `m` act on the current
/// question.
pub fn parse_input(
    line: &str,
    test: &TestDefinition,
    snapshot: &SessionSnapshot,
) -> Result<Input, InputError> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Err(InputError::Empty);
    };
    let current = || {
        test.question(snapshot.current_index)
            .map(|question| question.id().clone())
            .ok_or(InputError::NoQuestion)
    };

    let intent = match command.to_lowercase().as_str() {
        "q" | "quit" => return Ok(Input::Quit),
        "h" | "help" | "?" => return Ok(Input::Help),
        "start" | "again" => SessionIntent::Start,
        "retake" => SessionIntent::Retake,
        "n" | "next" => SessionIntent::Next,
        "p" | "prev" => SessionIntent::Prev,
        "s" | "submit" => SessionIntent::Submit,
        "m" | "mark" => SessionIntent::ToggleMark(current()?),
        "c" | "clear" => SessionIntent::ClearAnswer(current()?),
        "g" | "goto" => {
            let raw = words
                .next()
                .ok_or(InputError::MissingArgument { command: "g" })?;
            let number: i64 = raw.parse().map_err(|_| InputError::InvalidNumber {
                raw: raw.to_string(),
            })?;
            SessionIntent::GoTo(number - 1)
        }
        "a" | "answer" => {
            let raw = words
                .next()
                .ok_or(InputError::MissingArgument { command: "a" })?;
            SessionIntent::SelectOption {
                question: current()?,
                option: OptionId::new(raw.to_lowercase()),
            }
        }
        other => return Err(InputError::Unknown(other.to_string())),
    };
    Ok(Input::Intent(intent))
}

pub fn render_help() -> String {
    [
        "Commands:",
        "  start        begin the test (or attempt again after review)",
        "  n / p        next / previous question",
        "  g <k>        go to question k",
        "  a <option>   answer the current question",
        "  c            clear the current answer",
        "  m            mark or unmark for review",
        "  s            submit",
        "  retake       back to the instructions after review",
        "  q            quit",
    ]
    .join("\n")
}

pub fn render_intro(test: &TestDefinition) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", test.title());
    let _ = writeln!(
        out,
        "{} | {} questions | {} minutes | max score {} | negative {}",
        test.category().label(),
        test.question_count(),
        test.duration_minutes(),
        test.max_score(),
        test.marking().negative_label(),
    );
    if !test.description().is_empty() {
        let _ = writeln!(out, "{}", test.description());
    }
    for instruction in test.instructions() {
        let _ = writeln!(out, "  - {instruction}");
    }
    let _ = write!(out, "Type `start` to begin.");
    out
}

fn navigator_line(snapshot: &SessionSnapshot) -> String {
    snapshot
        .navigator
        .iter()
        .enumerate()
        .map(|(index, status)| {
            let number = index + 1;
            match status {
                NavigatorStatus::Current => format!("[{number}]"),
                NavigatorStatus::Marked => format!("{number}?"),
                NavigatorStatus::Attempted => format!("{number}*"),
                NavigatorStatus::Pending => format!("{number}"),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn render_question(test: &TestDefinition, snapshot: &SessionSnapshot) -> String {
    let Some(question) = test.question(snapshot.current_index) else {
        return String::new();
    };
    let mut out = String::new();
    let warning = if snapshot.time_warning { " (hurry)" } else { "" };
    let _ = writeln!(
        out,
        "{}{} | {}/{} attempted ({}%)",
        snapshot.clock_label(),
        warning,
        snapshot.progress.attempted,
        snapshot.progress.total,
        snapshot.progress.percent_rounded(),
    );
    let _ = writeln!(out, "{}", navigator_line(snapshot));
    let mark = if snapshot.current_marked { " [marked]" } else { "" };
    let _ = writeln!(
        out,
        "Q{}. {}{mark}",
        snapshot.current_index + 1,
        question.prompt()
    );
    for option in question.options() {
        let chosen = if snapshot.selected.as_ref() == Some(&option.id) {
            '>'
        } else {
            ' '
        };
        let _ = writeln!(out, " {chosen} {}) {}", option.id, option.label);
    }
    out.truncate(out.trim_end().len());
    out
}

pub fn render_scorecard(test: &TestDefinition, card: &Scorecard) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} | {}", test.title(), card.submission().label());
    let _ = writeln!(out, "Score: {} / {}", card.score(), test.max_score());
    let _ = writeln!(
        out,
        "Total attempted {} | Correct {} | Incorrect {} | Unanswered {}",
        card.attempted(),
        card.correct(),
        card.incorrect(),
        card.unanswered()
    );
    let _ = write!(
        out,
        "Accuracy {:.1}% | Time taken {}",
        card.accuracy(),
        services::session::format_clock(i64::from(card.time_taken_secs())),
    );
    out
}

pub fn render_review(items: &[ReviewItem]) -> String {
    let mut out = String::new();
    for item in items {
        let _ = writeln!(out, "Q{}. {} ({:?})", item.number, item.prompt, item.outcome);
        let _ = writeln!(out, "    your answer: {}", item.chosen_display());
        let _ = writeln!(out, "    correct:     {}", item.correct_label);
        if !item.explanation.is_empty() {
            let _ = writeln!(out, "    {}", item.explanation);
        }
    }
    out.truncate(out.trim_end().len());
    out
}

/// Render whatever the current phase shows.
pub fn render(test: &TestDefinition, snapshot: &SessionSnapshot) -> String {
    match snapshot.phase {
        Phase::Intro => render_intro(test),
        Phase::Active => render_question(test, snapshot),
        Phase::Review => match &snapshot.scorecard {
            Some(card) => format!(
                "{}\n\n{}\n\nType `again` to attempt again, `retake` for the instructions, or `q` to quit.",
                render_scorecard(test, card),
                render_review(&snapshot.review)
            ),
            None => String::new(),
        },
    }
}

/// Plain countdown ticks are not redrawn, except when the clock enters its
/// warning window.
fn needs_redraw(shown: &SessionSnapshot, next: &SessionSnapshot) -> bool {
    if next.time_warning != shown.time_warning {
        return true;
    }
    let mut masked = next.clone();
    masked.time_remaining_secs = shown.time_remaining_secs;
    masked != *shown
}

async fn print(out: &mut tokio::io::Stdout, text: &str) -> std::io::Result<()> {
    out.write_all(text.as_bytes()).await?;
    out.write_all(b"\n> ").await?;
    out.flush().await
}

/// Drive a running session from stdin until the user quits or input ends.
///
/// Snapshots published by the runner are rendered as they arrive, so a timeout
/// submission shows up without waiting for input.
pub async fn drive(
    test: &TestDefinition,
    handle: SessionHandle,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut updates = handle.subscribe();
    let mut out = tokio::io::stdout();

    let mut shown = updates.borrow_and_update().clone();
    print(&mut out, &render(test, &shown)).await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let snapshot = handle.snapshot();
                match parse_input(&line, test, &snapshot) {
                    Ok(Input::Quit) => break,
                    Ok(Input::Help) => print(&mut out, &render_help()).await?,
                    Ok(Input::Intent(intent)) => {
                        tracing::debug!(?intent, "dispatching");
                        handle.dispatch(intent).await?;
                    }
                    Err(err) => print(&mut out, &err.to_string()).await?,
                }
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                if needs_redraw(&shown, &snapshot) {
                    print(&mut out, &render(test, &snapshot)).await?;
                }
                shown = snapshot;
            }
        }
    }

    handle.shutdown().await.ok();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::QuestionId;
    use exam_core::time::fixed_clock;
    use services::ExamSession;
    use std::sync::Arc;

    fn sample() -> TestDefinition {
        storage::sample::sample_tests().unwrap().remove(0)
    }

    fn active(test: &TestDefinition) -> ExamSession {
        let mut session = ExamSession::new(Arc::new(test.clone()), fixed_clock());
        session.start();
        session
    }

    #[test]
    fn parses_navigation_and_answers() {
        let test = sample();
        let session = active(&test);
        let snapshot = session.snapshot();

        assert_eq!(
            parse_input("n", &test, &snapshot),
            Ok(Input::Intent(SessionIntent::Next))
        );
        assert_eq!(
            parse_input("g 3", &test, &snapshot),
            Ok(Input::Intent(SessionIntent::GoTo(2)))
        );
        assert_eq!(
            parse_input("a B", &test, &snapshot),
            Ok(Input::Intent(SessionIntent::SelectOption {
                question: QuestionId::new("q1"),
                option: OptionId::new("b"),
            }))
        );
        assert_eq!(
            parse_input("m", &test, &snapshot),
            Ok(Input::Intent(SessionIntent::ToggleMark(QuestionId::new("q1"))))
        );
        assert_eq!(parse_input(" q ", &test, &snapshot), Ok(Input::Quit));
    }

    #[test]
    fn rejects_bad_input() {
        let test = sample();
        let snapshot = active(&test).snapshot();
        assert_eq!(parse_input("", &test, &snapshot), Err(InputError::Empty));
        assert_eq!(
            parse_input("g", &test, &snapshot),
            Err(InputError::MissingArgument { command: "g" })
        );
        assert_eq!(
            parse_input("g x", &test, &snapshot),
            Err(InputError::InvalidNumber { raw: "x".into() })
        );
        assert!(matches!(
            parse_input("jump", &test, &snapshot),
            Err(InputError::Unknown(_))
        ));
    }

    #[test]
    fn question_screen_shows_clock_and_selection() {
        let test = sample();
        let mut session = active(&test);
        session.select_option(&QuestionId::new("q1"), &OptionId::new("b"));
        let screen = render_question(&test, &session.snapshot());
        assert!(screen.starts_with("15:00 | 1/6 attempted (17%)"));
        assert!(screen.contains("[1] 2 3 4 5 6"));
        assert!(screen.contains(" > b) "));
    }

    #[test]
    fn ticks_alone_do_not_redraw() {
        let test = sample();
        let mut session = active(&test);
        let before = session.snapshot();
        session.tick();
        assert!(!needs_redraw(&before, &session.snapshot()));

        session.next();
        assert!(needs_redraw(&before, &session.snapshot()));
    }

    #[test]
    fn review_screen_lists_every_question() {
        let test = sample();
        let mut session = active(&test);
        session.select_option(&QuestionId::new("q1"), &OptionId::new("b"));
        session.submit(exam_core::model::SubmissionKind::Manual);
        let snapshot = session.snapshot();

        let screen = render(&test, &snapshot);
        assert!(screen.contains("Score: 2 / 12"));
        assert!(screen.contains("Total attempted 1 | Correct 1 | Incorrect 0 | Unanswered 5"));
        assert!(screen.contains("Time taken 00:00"));
        assert!(screen.contains("Q6."));
        assert!(screen.contains("your answer: Not attempted"));
    }
}

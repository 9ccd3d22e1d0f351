use std::io::BufRead;

use prep_core::model::{Email, Question, Test};
use services::{ActiveSession, HostOutcome, SessionHost, SessionInput, SessionUpdate, SubmitReason};
use tokio::sync::mpsc;

/// Run one attempt on the terminal: questions on stdout, commands from stdin.
pub async fn take(
    host: &SessionHost,
    user: &Email,
    mut session: ActiveSession,
) -> Result<(), Box<dyn std::error::Error>> {
    let test = session.test().clone();
    println!(
        "{} ({} questions, {} minutes)",
        test.title(),
        test.len(),
        test.duration_minutes()
    );
    print_help();
    print_question(&test, 0);

    let (input_tx, mut inputs) = mpsc::channel(16);
    let (update_tx, updates) = mpsc::unbounded_channel();

    // Stdin blocks; a plain thread keeps it off the runtime and lets the process
    // exit without waiting for the next line.
    std::thread::spawn(move || read_commands(&input_tx));
    let printer = tokio::spawn(print_updates(test, updates));

    let outcome = host.run(user, &mut session, &mut inputs, &update_tx).await;
    drop(update_tx);
    printer.await?;

    match outcome? {
        HostOutcome::Completed(summary) => {
            println!(
                "{}: scored {}/{} ({:.1}%), answered {}",
                summary.title,
                summary.result.score,
                summary.result.total,
                summary.percentage(),
                summary.result.answered
            );
            println!(
                "Overall: {} tests, {:.1}% accuracy",
                summary.stats.tests_taken,
                summary.stats.accuracy()
            );
        }
        HostOutcome::Cancelled => println!("Attempt cancelled; nothing was recorded."),
    }
    Ok(())
}

fn read_commands(inputs: &mpsc::Sender<SessionInput>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }
        match parse_input(&line) {
            Some(input) => {
                if inputs.blocking_send(input).is_err() {
                    break;
                }
            }
            None => print_help(),
        }
    }
}

/// Parse one command line. Option and question numbers are 1-based.
pub fn parse_input(line: &str) -> Option<SessionInput> {
    let mut parts = line.split_whitespace();
    let verb = parts.next()?.to_ascii_lowercase();
    let number = parts
        .next()
        .and_then(|raw| raw.parse::<usize>().ok())
        .and_then(|n| n.checked_sub(1));

    let input = match verb.as_str() {
        "a" | "answer" => SessionInput::SelectAnswer(number?),
        "c" | "clear" => SessionInput::ClearAnswer,
        "n" | "next" => SessionInput::Next,
        "p" | "prev" | "previous" => SessionInput::Previous,
        "g" | "goto" => SessionInput::GoTo(number?),
        "s" | "submit" => SessionInput::RequestSubmit,
        "y" | "yes" => SessionInput::ConfirmSubmit,
        "q" | "quit" => SessionInput::Cancel,
        _ => return None,
    };
    Some(input)
}

async fn print_updates(test: Test, mut updates: mpsc::UnboundedReceiver<SessionUpdate>) {
    while let Some(update) = updates.recv().await {
        match update {
            SessionUpdate::Tick { remaining_seconds } => {
                if remaining_seconds % 60 == 0 || remaining_seconds <= 10 {
                    println!("[{:02}:{:02} left]", remaining_seconds / 60, remaining_seconds % 60);
                }
            }
            SessionUpdate::Moved { index } => print_question(&test, index),
            SessionUpdate::AnswerRecorded { index, option } => {
                println!("Q{}: answer {} saved", index + 1, option + 1);
            }
            SessionUpdate::AnswerCleared { index } => println!("Q{}: answer cleared", index + 1),
            SessionUpdate::ConfirmSubmit(prompt) => println!(
                "{} of {} answered, {} unanswered. Type y to submit.",
                prompt.answered,
                prompt.total,
                prompt.unanswered()
            ),
            SessionUpdate::Rejected(err) => println!("! {err}"),
            SessionUpdate::Submitting(SubmitReason::Manual) => println!("Submitting..."),
            SessionUpdate::Submitting(SubmitReason::TimeUp) => println!("Time is up. Submitting..."),
        }
    }
}

fn print_question(test: &Test, index: usize) {
    let Some(question) = test.question(index) else {
        return;
    };
    println!();
    println!("Question {} of {} [{}]", index + 1, test.len(), question.category());
    print_body(question);
}

pub fn print_body(question: &Question) {
    if let Some(passage) = question.passage() {
        println!("{passage}");
        println!();
    }
    println!("{}", question.body());
    for (i, option) in question.options().iter().enumerate() {
        println!("  {}. {option}", i + 1);
    }
}

fn print_help() {
    println!("Commands: a <n> answer, c clear, n next, p previous, g <n> go to, s submit, q quit");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(parse_input("a 2"), Some(SessionInput::SelectAnswer(1)));
        assert_eq!(parse_input("ANSWER 1"), Some(SessionInput::SelectAnswer(0)));
        assert_eq!(parse_input("g 10"), Some(SessionInput::GoTo(9)));
        assert_eq!(parse_input(" n "), Some(SessionInput::Next));
        assert_eq!(parse_input("prev"), Some(SessionInput::Previous));
        assert_eq!(parse_input("c"), Some(SessionInput::ClearAnswer));
        assert_eq!(parse_input("s"), Some(SessionInput::RequestSubmit));
        assert_eq!(parse_input("y"), Some(SessionInput::ConfirmSubmit));
        assert_eq!(parse_input("q"), Some(SessionInput::Cancel));
    }

    #[test]
    fn rejects_bad_numbers_and_verbs() {
        assert_eq!(parse_input("a"), None);
        assert_eq!(parse_input("a 0"), None);
        assert_eq!(parse_input("g x"), None);
        assert_eq!(parse_input("jump"), None);
    }
}

use anyhow::{bail, Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hubmate::config;
use hubmate::forge::github::GitHubForge;
use hubmate::monitor;
use hubmate::state::StateStore;

#[derive(Debug, PartialEq)]
enum Command {
    Check { json: bool },
    Reply { issue: u64, content: String },
    Ack { comment_id: u64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_command(&args)?;
    let config = config::load_config()?;
    let mut store = StateStore::open(config.state_path())?;

    match command {
        Command::Check { json } => {
            let forge = GitHubForge::new(&config)?;
            let report = monitor::check(&forge, &config.member_id, store.state()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&config.member_id, &report);
            }
        }
        Command::Reply { issue, content } => {
            let forge = GitHubForge::new(&config)?;
            match monitor::reply_to_issue(&forge, &mut store, issue, &content).await {
                Ok(url) => {
                    println!("Replied to #{issue}");
                    println!("  {url}");
                }
                Err(err) => println!("Reply failed: {err}"),
            }
        }
        Command::Ack { comment_id } => {
            monitor::ack_comment(&mut store, comment_id)?;
            println!("Marked comment {comment_id} as handled");
        }
    }

    Ok(())
}

fn print_report(member_id: &str, report: &monitor::CheckReport) {
    println!("Checking issues for {member_id}");

    if report.new_questions.is_empty() {
        println!("\nNo new questions.");
    } else {
        println!("\n{} new question(s):", report.new_questions.len());
        for q in &report.new_questions {
            println!("\n  #{} {}", q.issue_number, q.title);
            println!("  from {} — {}", q.author, q.url);
            if !q.body.is_empty() {
                println!("  {}", preview(&q.body, 200));
            }
        }
    }

    if report.new_replies.is_empty() {
        println!("\nNo new replies.");
    } else {
        println!("\n{} new repl(ies):", report.new_replies.len());
        for r in &report.new_replies {
            println!("\n  #{} {} (comment {})", r.issue_number, r.issue_title, r.comment_id);
            println!("  from {} — {}", r.author, r.url);
            println!("  {}", preview(&r.body, 200));
        }
    }
}

fn preview(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let clipped: String = text.chars().take(max).collect();
        format!("{clipped}...")
    } else {
        text.to_string()
    }
}

fn parse_command(args: &[String]) -> Result<Command> {
    let Some(cmd) = args.first() else {
        bail!(usage());
    };
    let rest = &args[1..];
    match cmd.as_str() {
        "check" => {
            let mut json = false;
            for arg in rest {
                match arg.as_str() {
                    "--json" => json = true,
                    extra => bail!("Unexpected argument '{extra}'\n\nUsage: hub-watch check [--json]"),
                }
            }
            Ok(Command::Check { json })
        }
        "reply" => {
            let (issue, content) = match rest {
                [issue, content] => (issue, content),
                _ => bail!("Usage: hub-watch reply <issue_number> <content>"),
            };
            let issue: u64 = issue
                .parse()
                .context("issue_number must be a positive integer")?;
            Ok(Command::Reply {
                issue,
                content: content.clone(),
            })
        }
        "ack" => {
            let comment_id = match rest {
                [id] => id,
                _ => bail!("Usage: hub-watch ack <comment_id>"),
            };
            let comment_id: u64 = comment_id
                .parse()
                .context("comment_id must be a positive integer")?;
            Ok(Command::Ack { comment_id })
        }
        other => bail!("Unknown command '{other}'\n\n{}", usage()),
    }
}

fn usage() -> &'static str {
    "hub-watch — issue monitor for the team hub

USAGE:
  hub-watch check [--json]                  Report new questions and replies
  hub-watch reply <issue_number> <content>  Post a reply and mark the issue
  hub-watch ack <comment_id>                Mark a reply comment handled"
}

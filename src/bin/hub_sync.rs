use anyhow::{bail, Context, Result};
use chrono::Local;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hubmate::config::{self, HubConfig};
use hubmate::forge::github::GitHubForge;
use hubmate::model::log::{LogDocument, StructuredUpdate};
use hubmate::paths::Team;
use hubmate::search::SearchQuery;
use hubmate::sync;

#[derive(Debug, Clone, Default, PartialEq)]
struct PushArgs {
    content: String,
    date: Option<String>,
    member: Option<String>,
    name: Option<String>,
    team: Option<String>,
    structured: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct SearchArgs {
    keyword: Option<String>,
    project: Option<String>,
    member: Option<String>,
    from: Option<String>,
    to: Option<String>,
    limit: Option<usize>,
    team: Option<String>,
}

#[derive(Debug, PartialEq)]
enum Command {
    Test,
    Push(PushArgs),
    Pull {
        member: Option<String>,
        date: Option<String>,
        team: Option<String>,
    },
    Team {
        date: Option<String>,
        team: Option<String>,
    },
    Search(SearchArgs),
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

    match command {
        Command::Test => {
            let forge = GitHubForge::new(&config)?;
            match sync::test_connection(&forge).await {
                Ok(login) => println!("Connected as {login} (repo: {})", config.repo),
                Err(err) => println!("Connection test failed: {err}"),
            }
        }
        Command::Push(push) => {
            let team = resolve_team(&config, push.team.as_deref())?;
            let structured = push
                .structured
                .as_deref()
                .map(|json| {
                    serde_json::from_str::<StructuredUpdate>(json)
                        .context("invalid --structured JSON")
                })
                .transpose()?;
            let member_id = push.member.unwrap_or_else(|| config.member_id.clone());
            let member_name = push.name.unwrap_or_else(|| config.member_name.clone());
            let date = push.date.unwrap_or_else(today);
            let doc = LogDocument::new(&member_id, &member_name, team, &date, &push.content, structured);
            let forge = GitHubForge::new(&config)?;
            match sync::push_log(&forge, &doc).await {
                Ok(receipt) => {
                    let verb = if receipt.updated { "Updated" } else { "Created" };
                    println!("{verb} log for {}", doc.date);
                    println!("  {}", receipt.url);
                }
                Err(err) => println!("Push failed: {err}"),
            }
        }
        Command::Pull { member, date, team } => {
            let team = resolve_team(&config, team.as_deref())?;
            let member = member.unwrap_or_else(|| config.member_id.clone());
            let date = date.unwrap_or_else(today);
            let forge = GitHubForge::new(&config)?;
            match sync::pull_log(&forge, &member, team, &date).await? {
                Some(text) => println!("{text}"),
                None => println!("No log found for {member} on {date}"),
            }
        }
        Command::Team { date, team } => {
            let team = resolve_team(&config, team.as_deref())?;
            let date = date.unwrap_or_else(today);
            let forge = GitHubForge::new(&config)?;
            let logs = sync::pull_team(&forge, team, &date).await?;
            for log in &logs.logs {
                println!("\n{}", "=".repeat(50));
                println!("{}", log.member_id);
                println!("{}", "=".repeat(50));
                println!("{}", clip(&log.text, 500));
            }
            println!(
                "\nFetched {}/{} member logs for {date}",
                logs.logs.len(),
                logs.members_seen
            );
        }
        Command::Search(search) => {
            let team = resolve_team(&config, search.team.as_deref())?;
            let query = SearchQuery {
                keyword: search.keyword,
                project: search.project,
                member: search.member,
                date_from: search.from,
                date_to: search.to,
                limit: search.limit.unwrap_or(SearchQuery::default().limit),
            };
            let forge = GitHubForge::new(&config)?;
            let hits = sync::search_team(&forge, team, &query).await?;
            if hits.is_empty() {
                println!("No matching logs.");
            }
            for hit in &hits {
                println!(
                    "{} {} [{}] ({})",
                    hit.date,
                    hit.member_name,
                    hit.member_id,
                    hit.match_type.as_str()
                );
                if !hit.excerpt.is_empty() {
                    for line in hit.excerpt.lines() {
                        println!("  {line}");
                    }
                }
                println!("  {}", hit.url);
            }
        }
    }

    Ok(())
}

/// An explicit --team beats the configured default; either way an unknown
/// team fails here, before any client is built.
fn resolve_team(config: &HubConfig, flag: Option<&str>) -> Result<Team> {
    Ok(flag.unwrap_or(&config.team).parse::<Team>()?)
}

fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

fn clip(text: &str, max: usize) -> String {
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
        "test" => Ok(Command::Test),
        "push" => parse_push(rest),
        "pull" => parse_pull(rest),
        "team" => parse_team(rest),
        "search" => parse_search(rest),
        other => bail!("Unknown command '{other}'\n\n{}", usage()),
    }
}

fn parse_push(args: &[String]) -> Result<Command> {
    let mut push = PushArgs::default();
    let mut content_parts: Vec<String> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--date" => push.date = Some(take_value(args, &mut i, "--date")?),
            "--member" => push.member = Some(take_value(args, &mut i, "--member")?),
            "--name" => push.name = Some(take_value(args, &mut i, "--name")?),
            "--team" => push.team = Some(take_value(args, &mut i, "--team")?),
            "--structured" => push.structured = Some(take_value(args, &mut i, "--structured")?),
            _ => content_parts.push(args[i].clone()),
        }
        i += 1;
    }
    if content_parts.is_empty() {
        bail!("Usage: hub-sync push <content> [--date D] [--member ID] [--name NAME] [--team T] [--structured JSON]");
    }
    // Literal \n sequences become newlines so multi-line logs survive shell
    // quoting.
    push.content = content_parts.join(" ").replace("\\n", "\n");
    Ok(Command::Push(push))
}

fn parse_pull(args: &[String]) -> Result<Command> {
    let mut member = None;
    let mut date = None;
    let mut team = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--date" => date = Some(take_value(args, &mut i, "--date")?),
            "--team" => team = Some(take_value(args, &mut i, "--team")?),
            flag if flag.starts_with("--") => {
                bail!("Unknown flag '{flag}'\n\nUsage: hub-sync pull [member] [--date D] [--team T]")
            }
            positional if member.is_none() => member = Some(positional.to_string()),
            extra => bail!("Unexpected argument '{extra}'\n\nUsage: hub-sync pull [member] [--date D] [--team T]"),
        }
        i += 1;
    }
    Ok(Command::Pull { member, date, team })
}

fn parse_team(args: &[String]) -> Result<Command> {
    let mut date = None;
    let mut team = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--team" => team = Some(take_value(args, &mut i, "--team")?),
            flag if flag.starts_with("--") => {
                bail!("Unknown flag '{flag}'\n\nUsage: hub-sync team [date] [--team T]")
            }
            positional if date.is_none() => date = Some(positional.to_string()),
            extra => bail!("Unexpected argument '{extra}'\n\nUsage: hub-sync team [date] [--team T]"),
        }
        i += 1;
    }
    Ok(Command::Team { date, team })
}

fn parse_search(args: &[String]) -> Result<Command> {
    let mut search = SearchArgs::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--keyword" => search.keyword = Some(take_value(args, &mut i, "--keyword")?),
            "--project" => search.project = Some(take_value(args, &mut i, "--project")?),
            "--member" => search.member = Some(take_value(args, &mut i, "--member")?),
            "--from" => search.from = Some(take_value(args, &mut i, "--from")?),
            "--to" => search.to = Some(take_value(args, &mut i, "--to")?),
            "--team" => search.team = Some(take_value(args, &mut i, "--team")?),
            "--limit" => {
                let raw = take_value(args, &mut i, "--limit")?;
                search.limit = Some(raw.parse().context("--limit expects a number")?);
            }
            extra => bail!("Unexpected argument '{extra}'\n\n{}", usage()),
        }
        i += 1;
    }
    Ok(Command::Search(search))
}

fn take_value(args: &[String], i: &mut usize, flag: &str) -> Result<String> {
    *i += 1;
    match args.get(*i) {
        Some(value) => Ok(value.clone()),
        None => bail!("Missing value for {flag}"),
    }
}

fn usage() -> &'static str {
    "hub-sync — daily log sync for the team hub

USAGE:
  hub-sync test                      Check token and repo access
  hub-sync push <content> [flags]    Push today's log
  hub-sync pull [member] [flags]     Pull one member's log
  hub-sync team [date] [flags]       Pull the whole team's logs
  hub-sync search [flags]            Search recent team logs

PUSH FLAGS:
  --date D  --member ID  --name NAME  --team T  --structured JSON

SEARCH FLAGS:
  --keyword K  --project P  --member M  --from D  --to D  --limit N  --team T"
}

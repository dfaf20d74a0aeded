/// EESA moderation - command-line review client
///
/// Lists, approves and rejects pending submissions of the EESA platform.
use anyhow::{anyhow, bail, Context, Result};
use eesa_moderation::{
    backend::ModerationBackend,
    config::ClientConfig,
    confirm::{AutoConfirm, Confirmer, StdinConfirmer},
    context::AppContext,
    notify::{NoticeLevel, RecordingNotifier},
    queue::{
        Facet, FacetValue, ItemFilter, ItemId, ModerationQueue, QueueKind, Reviewable,
        StatusFilter, TransitionOutcome,
    },
};
use std::ffi::OsString;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "\
Usage: eesa-moderation <notes|academics|alumni|teachers> <list|stats|approve ID|reject ID> [options]

Options:
  --status <pending|approved|all>   Listing scope and status filter
  --search <text>                   Case-insensitive search
  --scheme <name>                   Notes: scheme name
  --semester <n>                    Notes: semester
  --note-type <type>                Notes: note type
  --role <role>                     Notes: uploader role
  --module <n>                      Notes: module number
  --active <true|false>             Registrations: account active flag
  --yes                             Skip the reject confirmation
  -h, --help                        Show this message
";

#[derive(Debug, PartialEq)]
enum Command {
    List,
    Stats,
    Approve(ItemId),
    Reject(ItemId),
}

#[derive(Debug)]
struct Invocation {
    kind: QueueKind,
    command: Command,
    scope: StatusFilter,
    filter: ItemFilter,
    assume_yes: bool,
}

/// Parse command-line arguments, without the program name
fn parse_args(args: Vec<OsString>) -> Result<Option<Invocation>> {
    let mut args = pico_args::Arguments::from_vec(args);

    if args.contains(["-h", "--help"]) {
        return Ok(None);
    }

    let status: Option<String> = args.opt_value_from_str("--status")?;
    let search: Option<String> = args.opt_value_from_str("--search")?;
    let scheme: Option<String> = args.opt_value_from_str("--scheme")?;
    let semester: Option<i64> = args.opt_value_from_str("--semester")?;
    let note_type: Option<String> = args.opt_value_from_str("--note-type")?;
    let role: Option<String> = args.opt_value_from_str("--role")?;
    let module: Option<i64> = args.opt_value_from_str("--module")?;
    let active: Option<bool> = args.opt_value_from_str("--active")?;
    let assume_yes = args.contains("--yes");

    let kind: String = args.free_from_str().context("missing queue name")?;
    let kind = QueueKind::from_str(&kind)?;
    let command: String = args.free_from_str().context("missing command")?;
    let id: Option<String> = args.opt_free_from_str()?;

    let remaining = args.finish();
    if !remaining.is_empty() {
        bail!("unexpected arguments: {:?}", remaining);
    }

    let command = match (command.as_str(), id) {
        ("list", None) => Command::List,
        ("stats", None) => Command::Stats,
        ("approve", Some(id)) => Command::Approve(ItemId::parse(&id)),
        ("reject", Some(id)) => Command::Reject(ItemId::parse(&id)),
        (other, _) => bail!("unknown or incomplete command: {}", other),
    };

    let scope = match status {
        Some(s) => StatusFilter::from_str(&s)?,
        None if matches!(kind, QueueKind::Notes | QueueKind::Academics) => StatusFilter::Pending,
        None => StatusFilter::All,
    };

    let mut filter = ItemFilter::new().with_status(scope);
    if let Some(search) = search {
        filter = filter.with_search(search);
    }
    let text_facets = [
        (Facet::Scheme, scheme),
        (Facet::NoteType, note_type),
        (Facet::Role, role),
    ];
    for (facet, value) in text_facets {
        if let Some(value) = value {
            filter = filter.with_facet(facet, FacetValue::Text(value));
        }
    }
    if let Some(semester) = semester {
        filter = filter.with_facet(Facet::Semester, FacetValue::Number(semester));
    }
    if let Some(module) = module {
        filter = filter.with_facet(Facet::Module, FacetValue::Number(module));
    }
    if let Some(active) = active {
        filter = filter.with_facet(Facet::Active, FacetValue::Flag(active));
    }

    Ok(Some(Invocation {
        kind,
        command,
        scope,
        filter,
        assume_yes,
    }))
}

async fn run<B: ModerationBackend>(queue: ModerationQueue<B>, invocation: Invocation) -> Result<()> {
    match invocation.command {
        Command::List => {
            queue.refresh(invocation.scope).await;
            let items = queue.load(&invocation.filter).await;
            for item in &items {
                println!(
                    "{:>6}  {:<8}  {}",
                    item.id,
                    item.status.as_str(),
                    item.payload.summary()
                );
            }
            println!(
                "{} shown, {} loaded, {} reported by server",
                items.len(),
                queue.len().await,
                queue.server_count().await
            );
        }
        Command::Stats => {
            queue.refresh(invocation.scope).await;
            let stats = queue.statistics().await;
            println!("Pending verification: {}", stats.pending_count);
            println!("Approved today:       {}", stats.approved_today);
            println!("Total reviewed:       {}", stats.total_reviewed);
        }
        Command::Approve(id) => {
            queue.refresh(StatusFilter::Pending).await;
            check(queue.approve(id).await)?;
        }
        Command::Reject(id) => {
            queue.refresh(StatusFilter::Pending).await;
            check(queue.reject(id).await)?;
        }
    }

    Ok(())
}

fn check(outcome: TransitionOutcome) -> Result<()> {
    match outcome {
        TransitionOutcome::Applied | TransitionOutcome::Declined => Ok(()),
        TransitionOutcome::Refused(message) | TransitionOutcome::Failed(message) => {
            Err(anyhow!(message))
        }
    }
}

fn init_tracing(config: &ClientConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("eesa_moderation={}", config.logging.level).into());
    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let invocation = match parse_args(std::env::args_os().skip(1).collect())? {
        Some(invocation) => invocation,
        None => {
            print!("{}", USAGE);
            return Ok(());
        }
    };

    // Load configuration
    let config = ClientConfig::from_env()?;

    // Initialize logging
    init_tracing(&config);

    let notifier = Arc::new(RecordingNotifier::new());
    let ctx = AppContext::new(config, notifier.clone())?;

    let confirmer: Arc<dyn Confirmer> = if invocation.assume_yes {
        Arc::new(AutoConfirm(true))
    } else {
        Arc::new(StdinConfirmer)
    };

    let result = match invocation.kind {
        QueueKind::Notes => run(ctx.notes_queue(confirmer)?, invocation).await,
        QueueKind::Academics => run(ctx.academics_queue(confirmer)?, invocation).await,
        QueueKind::Alumni => run(ctx.alumni_queue(confirmer)?, invocation).await,
        QueueKind::Teachers => run(ctx.teachers_queue(confirmer)?, invocation).await,
    };

    for notice in notifier.take() {
        match notice.level {
            NoticeLevel::Error => eprintln!("error: {}", notice.message),
            _ => println!("{}", notice.message),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Option<Invocation>> {
        parse_args(args.iter().map(OsString::from).collect())
    }

    #[test]
    fn test_default_scope_per_queue() {
        let notes = parse(&["notes", "list"]).unwrap().unwrap();
        assert_eq!(notes.kind, QueueKind::Notes);
        assert_eq!(notes.command, Command::List);
        assert_eq!(notes.scope, StatusFilter::Pending);
        assert_eq!(notes.filter, ItemFilter::new().with_status(StatusFilter::Pending));

        let academics = parse(&["academics", "stats"]).unwrap().unwrap();
        assert_eq!(academics.scope, StatusFilter::Pending);

        let alumni = parse(&["alumni", "list"]).unwrap().unwrap();
        assert_eq!(alumni.scope, StatusFilter::All);
        assert!(!alumni.assume_yes);
    }

    #[test]
    fn test_flags_become_predicates() {
        let invocation = parse(&[
            "notes", "list", "--status", "approved", "--search", "motors", "--scheme",
            "2019 Scheme", "--semester", "5", "--module", "2", "--role", "student",
        ])
        .unwrap()
        .unwrap();

        assert_eq!(invocation.scope, StatusFilter::Approved);
        assert_eq!(invocation.filter.search.as_deref(), Some("motors"));
        assert_eq!(invocation.filter.status, StatusFilter::Approved);
        assert!(invocation
            .filter
            .facets
            .contains(&(Facet::Scheme, FacetValue::Text("2019 Scheme".to_string()))));
        assert!(invocation
            .filter
            .facets
            .contains(&(Facet::Semester, FacetValue::Number(5))));
        assert!(invocation
            .filter
            .facets
            .contains(&(Facet::Module, FacetValue::Number(2))));
        assert!(invocation
            .filter
            .facets
            .contains(&(Facet::Role, FacetValue::Text("student".to_string()))));
        assert_eq!(invocation.filter.facets.len(), 4);
    }

    #[test]
    fn test_active_flag_and_yes() {
        let invocation = parse(&["teachers", "reject", "t-9", "--active", "false", "--yes"])
            .unwrap()
            .unwrap();
        assert_eq!(invocation.command, Command::Reject(ItemId::from("t-9")));
        assert!(invocation.assume_yes);
        assert_eq!(
            invocation.filter.facets,
            vec![(Facet::Active, FacetValue::Flag(false))]
        );
    }

    #[test]
    fn test_numeric_id_parsed() {
        let invocation = parse(&["alumni", "approve", "42"]).unwrap().unwrap();
        assert_eq!(invocation.command, Command::Approve(ItemId::Int(42)));
    }

    #[test]
    fn test_invalid_invocations() {
        assert!(parse(&["notes", "approve"]).is_err());
        assert!(parse(&["notes", "list", "7"]).is_err());
        assert!(parse(&["notes", "publish"]).is_err());
        assert!(parse(&["students", "list"]).is_err());
        assert!(parse(&["notes"]).is_err());
        assert!(parse(&["notes", "list", "--status", "archived"]).is_err());
        assert!(parse(&["notes", "list", "--semester", "fifth"]).is_err());
    }

    #[test]
    fn test_help() {
        assert!(parse(&["--help"]).unwrap().is_none());
        assert!(parse(&["notes", "list", "-h"]).unwrap().is_none());
    }
}

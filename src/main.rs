//! lemmy-inbox - merged Lemmy inbox from the terminal
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use chrono::DateTime;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use lemmy_inbox::api::InboxApi;
use lemmy_inbox::api::lemmy::LemmyClient;
use lemmy_inbox::auth::CredentialStore;
use lemmy_inbox::demo::DemoApi;
use lemmy_inbox::inbox::{InboxRepository, UnreadCountTracker};
use lemmy_inbox::models::{Account, FeedItem, FeedName, ItemKind, Page, UnreadCounts};
use lemmy_inbox::{Config, Database};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (RUST_LOG=debug for verbose output)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load()?;

    match parse_args(&config)? {
        Command::Login { instance, username } => login(&instance, &username).await,
        Command::Accounts => list_accounts(),
        Command::Use { handle } => use_account(&handle),
        Command::Logout { handle } => logout(&handle),
        Command::Default { feed } => set_default_feed(config, feed),
        Command::Inbox { feed, page, force } => inbox_cli(&config, feed, page, force).await,
        Command::Mark { kind, id, read } => mark_cli(&config, kind, id, read).await,
        Command::Counts => counts_cli().await,
        Command::Demo { feed } => demo_cli(&config, feed).await,
        Command::Help => {
            print_help();
            Ok(())
        }
        Command::Version => {
            println!("lemmy-inbox {}", lemmy_inbox::VERSION);
            Ok(())
        }
    }
}

/// CLI commands
enum Command {
    Login { instance: String, username: String },
    Accounts,
    Use { handle: String },
    Logout { handle: String },
    Default { feed: FeedName },
    Inbox { feed: FeedName, page: usize, force: bool },
    Mark { kind: ItemKind, id: i64, read: bool },
    Counts,
    Demo { feed: FeedName },
    Help,
    Version,
}

fn parse_args(config: &Config) -> Result<Command> {
    let args: Vec<String> = std::env::args().collect();

    let Some(command) = args.get(1) else {
        return Ok(Command::Inbox {
            feed: config.default_feed,
            page: 0,
            force: false,
        });
    };

    let feed_arg = |index: usize| -> Result<FeedName> {
        match args.get(index).filter(|a| !a.starts_with('-')) {
            Some(name) => FeedName::from_str(name).ok_or_else(|| anyhow!("Unknown feed: {name}")),
            None => Ok(config.default_feed),
        }
    };

    match command.as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help),
        "-v" | "--version" | "version" => Ok(Command::Version),
        "accounts" => Ok(Command::Accounts),
        "counts" => Ok(Command::Counts),

        "login" => {
            let instance = args
                .get(2)
                .ok_or_else(|| anyhow!("Missing instance\nExample: lemmy-inbox login lemmy.world alice"))?
                .clone();
            let username = args
                .get(3)
                .ok_or_else(|| anyhow!("Missing username"))?
                .clone();
            Ok(Command::Login { instance, username })
        }

        "use" => {
            let handle = args
                .get(2)
                .ok_or_else(|| anyhow!("Missing account (username or username@instance)"))?
                .clone();
            Ok(Command::Use { handle })
        }

        "logout" => {
            let handle = args
                .get(2)
                .ok_or_else(|| anyhow!("Missing account (username or username@instance)"))?
                .clone();
            Ok(Command::Logout { handle })
        }

        "default" => {
            let name = args.get(2).ok_or_else(|| anyhow!("Missing feed name"))?;
            let feed = FeedName::from_str(name).ok_or_else(|| anyhow!("Unknown feed: {name}"))?;
            Ok(Command::Default { feed })
        }

        "inbox" => {
            let feed = feed_arg(2)?;
            let page = args
                .iter()
                .position(|a| a == "--page" || a == "-p")
                .and_then(|i| args.get(i + 1))
                .map(|s| s.parse::<usize>().context("Page must be a number"))
                .transpose()?
                .unwrap_or(1)
                .saturating_sub(1);
            let force = args.iter().any(|a| a == "--force" || a == "-f");
            Ok(Command::Inbox { feed, page, force })
        }

        "read" | "unread" => {
            let kind_name = args
                .get(2)
                .ok_or_else(|| anyhow!("Missing kind (reply, mention, message, post-report, comment-report)"))?;
            let kind = ItemKind::from_str(kind_name)
                .ok_or_else(|| anyhow!("Unknown kind: {kind_name}"))?;
            let id = args
                .get(3)
                .ok_or_else(|| anyhow!("Missing id"))?
                .parse()
                .context("Id must be a number")?;
            Ok(Command::Mark {
                kind,
                id,
                read: command == "read",
            })
        }

        "demo" => Ok(Command::Demo { feed: feed_arg(2)? }),

        other => Err(anyhow!(
            "Unknown command: {other}\nRun 'lemmy-inbox --help' for usage"
        )),
    }
}

fn print_help() {
    let config_path = lemmy_inbox::paths::config_path()
        .map_or_else(|_| "Unknown".to_string(), |p| p.display().to_string());

    println!(
        r#"lemmy-inbox - replies, mentions, messages and reports in one feed

USAGE:
    lemmy-inbox                            Show the default feed
    lemmy-inbox [COMMAND]

COMMANDS:
    login <instance> <username>            Log in and store the token
    accounts                               List stored accounts
    use <username[@instance]>              Switch the active account
    logout <username[@instance]>           Forget an account and its token
    default <feed>                         Set the feed shown without a command

    inbox [feed] [OPTIONS]                 Show a page of a feed
      Feeds: all, unread, replies, mentions, messages, reports
      Options:
        -p, --page <n>                     Page number (default: 1)
        -f, --force                        Refetch from the server

    read <kind> <id>                       Mark an item read (reports: resolve)
    unread <kind> <id>                     Mark an item unread
      Kinds: reply, mention, message, post-report, comment-report

    counts                                 Show unread counters
    demo [feed]                            Show a feed from built-in sample data

OPTIONS:
    -h, --help                             Show this help message
    -v, --version                          Show version information

CONFIG:
    {}
"#,
        config_path
    );
}

async fn login(instance: &str, username: &str) -> Result<()> {
    let instance = lemmy_inbox::models::normalize_instance(instance);

    println!("Password for {username} on {instance}:");
    let mut password = String::new();
    std::io::stdin().read_line(&mut password)?;
    let password = password.trim_end_matches(['\r', '\n']);

    let token = LemmyClient::login(&instance, username, password).await?;
    let client = LemmyClient::new(&instance, Some(&token));
    let account = client.verify().await?;

    let db = Database::open()?;
    if let Some(existing) = db.find_account(&account.username, Some(account.host()))? {
        db.delete_account(existing.id)?;
    }
    db.insert_account(&account)?;
    db.set_default_account(account.id)?;
    CredentialStore::open()?.store(&account, &token)?;

    println!("✓ Logged in as {}", account.full_handle());
    Ok(())
}

fn list_accounts() -> Result<()> {
    let db = Database::open()?;
    let accounts = db.get_accounts()?;
    let store = CredentialStore::open()?;

    if accounts.is_empty() {
        println!("No accounts configured.");
        println!("\nAdd an account with:");
        println!("  lemmy-inbox login <instance> <username>");
        return Ok(());
    }

    println!("Stored accounts:\n");
    for account in accounts {
        let marker = if account.is_default { " (active)" } else { "" };
        let token = if store.contains(&account) { "" } else { " [no token, log in again]" };
        println!("  {} {}{}{}", account.display_name, account.full_handle(), marker, token);
    }

    Ok(())
}

/// Look up a stored account by `username` or `username@instance`
fn find_account(db: &Database, handle: &str) -> Result<Account> {
    let handle = handle.trim_start_matches('@');
    let (username, host) = match handle.split_once('@') {
        Some((username, host)) => (username, Some(host)),
        None => (handle, None),
    };

    db.find_account(username, host)?
        .ok_or_else(|| anyhow!("No stored account matches {handle}"))
}

fn use_account(handle: &str) -> Result<()> {
    let db = Database::open()?;
    let account = find_account(&db, handle)?;
    db.set_default_account(account.id)?;

    println!("✓ Now using {}", account.full_handle());
    Ok(())
}

fn logout(handle: &str) -> Result<()> {
    let db = Database::open()?;
    let account = find_account(&db, handle)?;

    CredentialStore::open()?.delete(&account)?;
    db.delete_account(account.id)?;

    println!("✓ Logged out {}", account.full_handle());
    Ok(())
}

fn set_default_feed(mut config: Config, feed: FeedName) -> Result<()> {
    config.default_feed = feed;
    config.save()?;

    println!("✓ Default feed is now {feed}");
    Ok(())
}

/// Client for the active account
fn active_client() -> Result<(Account, LemmyClient)> {
    let db = Database::open()?;
    let account = db
        .get_default_account()?
        .ok_or_else(|| anyhow!("No account configured. Run: lemmy-inbox login <instance> <username>"))?;
    let token = CredentialStore::open()?
        .get(&account)?
        .ok_or_else(|| anyhow!("No token stored for {}. Log in again.", account.full_handle()))?;
    db.update_account_last_used(account.id)?;

    let client = LemmyClient::new(&account.instance, Some(&token));
    Ok((account, client))
}

async fn inbox_cli(config: &Config, feed: FeedName, page: usize, force: bool) -> Result<()> {
    let (account, client) = active_client()?;
    let repo = InboxRepository::new(Arc::new(client), config.inbox_settings());

    // Pages are merged in order, so earlier pages are loaded on the way
    let page = repo.get_page(page, feed, force).await?;

    println!("{} · {}", feed, account.full_handle());
    print_page(config, &page);
    Ok(())
}

async fn mark_cli(config: &Config, kind: ItemKind, id: i64, read: bool) -> Result<()> {
    let (_account, client) = active_client()?;
    let client = Arc::new(client);
    let (tx, mut rx) = mpsc::channel(16);
    let repo = InboxRepository::new(Arc::clone(&client), config.inbox_settings()).with_events(tx);

    // Only kind and id identify an item on the server
    let item = FeedItem::new(kind, id, DateTime::default());
    repo.mark_as_read(&item, read).await?;

    let verb = match (kind.is_report(), read) {
        (true, true) => "resolved",
        (true, false) => "reopened",
        (false, true) => "marked read",
        (false, false) => "marked unread",
    };
    println!("✓ {kind} {id} {verb}");

    let mut tracker = UnreadCountTracker::new(client);
    if let Some(counts) = tracker.drain(&mut rx).await {
        print_counts(&counts);
    }
    Ok(())
}

async fn counts_cli() -> Result<()> {
    let (_account, client) = active_client()?;
    let counts = client.unread_count().await?;
    print_counts(&counts);
    Ok(())
}

async fn demo_cli(config: &Config, feed: FeedName) -> Result<()> {
    let api = Arc::new(DemoApi::sample());
    let repo = InboxRepository::new(Arc::clone(&api), config.inbox_settings());

    let page = repo.get_page(0, feed, false).await?;
    println!("{} · demo data", feed);
    print_page(config, &page);

    if let Some(counts) = UnreadCountTracker::new(api).refresh().await {
        print_counts(&counts);
    }
    Ok(())
}

fn print_page(config: &Config, page: &Page) {
    println!("{}", "─".repeat(60));

    let items: Vec<&FeedItem> = page
        .items
        .iter()
        .filter(|item| config.show_read || !item.is_read)
        .collect();

    if items.is_empty() {
        println!("\nNothing here.");
    }

    for item in items {
        let marker = if item.is_read { " " } else { "●" };
        println!(
            "\n{} [{} {}] {}",
            marker,
            item.kind,
            item.id,
            item.title
        );
        println!(
            "  {} · {}",
            item.author.full_handle(),
            item.relative_time()
        );
        if !item.content.is_empty() {
            println!("  {}", item.preview(100));
        }
    }

    if page.has_more {
        println!("\nMore on page {}.", page.index + 2);
    }
}

fn print_counts(counts: &UnreadCounts) {
    println!(
        "\nUnread: {} replies · {} mentions · {} messages",
        counts.replies, counts.mentions, counts.private_messages
    );
}

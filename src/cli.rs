use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use tower::ServiceExt;

use membership_console::{
    adapters::rest::{
        self,
        schema::{format_instant, parse_instant},
        RestCards, RestFiles, RestMembers,
    },
    commands::{DomainLogic, FetchPdfRequest},
    config::ConsoleConfig,
    domain::{CardFilter, MemberRow, PdfFile, SpreadsheetFile, StatusFilter},
    i18n::Catalog,
    mutations::{Mutations, Notification},
    query::{CardStatsPoller, CardsQuery, MembersQuery, MembersView, QueryCache},
    session::Session,
};

type Logic = DomainLogic<RestMembers, RestCards, RestFiles>;

#[derive(Parser, Debug)]
#[command(name = "membership-console", version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Access token issued by the identity provider
    #[arg(long, env = "CONSOLE_TOKEN", hide_env_values = true)]
    pub token: String,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn init() -> Self {
        Self::parse()
    }

    pub async fn run(self, config: ConsoleConfig) -> Result<()> {
        if !config.api.is_absolute() {
            bail!("api.base_url is not set (CONSOLE_API__BASE_URL)");
        }
        let session = Session::from_jwt(self.token).context("invalid access token")?;
        tracing::info!(roles = ?session.roles(), "session opened");
        let console = Console {
            logic: rest::connect(&config.api, session),
            cache: QueryCache::new(),
            config,
        };
        match self.command {
            Command::Members(cmd) => cmd.run(&console).await,
            Command::Cards(cmd) => cmd.run(&console).await,
            Command::Pdf(cmd) => cmd.run(&console).await,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Browse and manage members
    #[command(subcommand)]
    Members(Members),
    /// Card number inventory
    #[command(subcommand)]
    Cards(Cards),
    /// Generated documents
    #[command(subcommand)]
    Pdf(Pdf),
}

pub struct Console {
    logic: Logic,
    cache: QueryCache,
    config: ConsoleConfig,
}

impl Console {
    fn mutations(&self) -> Mutations<RestMembers, RestCards, RestFiles> {
        Mutations::new(
            self.logic.clone(),
            self.cache.clone(),
            Catalog::new(self.config.locale),
        )
    }
}

#[derive(Subcommand, Debug)]
pub enum Members {
    /// List members, optionally by status
    List(ListMembers),
    /// Search members by name and surname
    Search(SearchMembers),
    /// Renew a membership for one year with a new card number
    Renew(RenewMember),
    /// Flag a member as deleted
    Delete(DeleteMember),
}

impl Members {
    async fn run(self, console: &Console) -> Result<()> {
        match self {
            Members::List(cmd) => cmd.run(console).await,
            Members::Search(cmd) => cmd.run(console).await,
            Members::Renew(cmd) => cmd.run(console).await,
            Members::Delete(cmd) => cmd.run(console).await,
        }
    }
}

#[derive(Args, Debug)]
pub struct ListMembers {
    /// all, active, inactive, expired, suspended or deleted
    #[arg(short, long, default_value = "all")]
    pub filter: StatusFilter,
    /// Number of pages to load
    #[arg(short, long, default_value_t = 1)]
    pub pages: u32,
}

impl ListMembers {
    async fn run(self, console: &Console) -> Result<()> {
        let query = members_query(console);
        query.set_filter(self.filter);
        show_members(&query, self.pages).await
    }
}

#[derive(Args, Debug)]
pub struct SearchMembers {
    /// Name, optionally followed by the surname
    #[arg(required = true)]
    pub query: Vec<String>,
    #[arg(short, long, default_value_t = 1)]
    pub pages: u32,
}

impl SearchMembers {
    async fn run(self, console: &Console) -> Result<()> {
        let query = members_query(console);
        query.set_search(Some(self.query.join(" ")));
        show_members(&query, self.pages).await
    }
}

fn members_query(console: &Console) -> MembersQuery<RestMembers, RestCards, RestFiles> {
    MembersQuery::new(
        console.logic.clone(),
        console.cache.clone(),
        console.config.query.members_per_page,
    )
}

async fn show_members(
    query: &MembersQuery<RestMembers, RestCards, RestFiles>,
    pages: u32,
) -> Result<()> {
    let mut view = query.load().await?;
    for _ in 1..pages {
        if !query.has_next_page() {
            break;
        }
        view = query.fetch_next_page().await?;
    }
    match view {
        MembersView::Rows(rows) => {
            rows.iter().for_each(print_member);
            println!("{} members{}", rows.len(), more(query.has_next_page()));
        }
        MembersView::SearchToBegin => println!("Search for a member to begin"),
        MembersView::Unauthorized => bail!("this session may not read members"),
    }
    Ok(())
}

fn print_member(row: &MemberRow) {
    let member = &row.member;
    println!(
        "{:<12} {:<40} {:<10} {:<10} {}",
        member.id,
        member.full_name(),
        row.status.as_str(),
        member.card_number.as_deref().unwrap_or("-"),
        member
            .expiration_date
            .map(format_instant)
            .unwrap_or_else(|| "-".to_string()),
    );
}

fn more(has_next: bool) -> &'static str {
    if has_next {
        " (more available)"
    } else {
        ""
    }
}

#[derive(Args, Debug)]
pub struct RenewMember {
    #[arg(long)]
    pub id: String,
    /// Current expiration, YYYY-MM-DD or an RFC 3339 timestamp
    #[arg(long, value_parser = deadline)]
    pub expiration: Option<DateTime<Utc>>,
    /// Name shown in the notification
    #[arg(long, default_value = "")]
    pub name: String,
}

impl RenewMember {
    async fn run(self, console: &Console) -> Result<()> {
        let notification = console
            .mutations()
            .renew(&self.id, self.expiration, display_name(&self.name, &self.id))
            .await;
        report(notification)
    }
}

#[derive(Args, Debug)]
pub struct DeleteMember {
    #[arg(long)]
    pub id: String,
    #[arg(long, default_value = "")]
    pub name: String,
}

impl DeleteMember {
    async fn run(self, console: &Console) -> Result<()> {
        let notification = console
            .mutations()
            .delete(&self.id, display_name(&self.name, &self.id))
            .await;
        report(notification)
    }
}

fn deadline(value: &str) -> Result<DateTime<Utc>, String> {
    parse_instant(value)
        .ok_or_else(|| format!("expected YYYY-MM-DD or an RFC 3339 timestamp, got {value:?}"))
}

fn display_name<'a>(name: &'a str, id: &'a str) -> &'a str {
    if name.trim().is_empty() {
        id
    } else {
        name
    }
}

fn report(notification: Notification) -> Result<()> {
    if notification.is_success() {
        println!("{}", notification.message);
        Ok(())
    } else {
        bail!(notification.message)
    }
}

#[derive(Subcommand, Debug)]
pub enum Cards {
    /// List card numbers
    List(ListCards),
    /// Number of cards still available
    Stats(CardStatsArgs),
    /// Import card numbers from a spreadsheet
    Import(ImportCards),
}

impl Cards {
    async fn run(self, console: &Console) -> Result<()> {
        match self {
            Cards::List(cmd) => cmd.run(console).await,
            Cards::Stats(cmd) => cmd.run(console).await,
            Cards::Import(cmd) => cmd.run(console).await,
        }
    }
}

#[derive(Args, Debug)]
pub struct ListCards {
    /// Include cards already assigned to a member
    #[arg(long)]
    pub all: bool,
    #[arg(short, long, default_value_t = 1)]
    pub pages: u32,
}

impl ListCards {
    async fn run(self, console: &Console) -> Result<()> {
        let query = CardsQuery::new(
            console.logic.clone(),
            console.cache.clone(),
            console.config.query.cards_per_page,
        );
        if self.all {
            query.set_filter(CardFilter::All);
        }
        let mut cards = query.load().await?;
        for _ in 1..self.pages {
            if !query.has_next_page() {
                break;
            }
            cards = query.fetch_next_page().await?;
        }
        for card in &cards {
            println!(
                "{:<10} {:<10} {}",
                card.card_number,
                if card.is_active { "assigned" } else { "available" },
                card.day_of_use
                    .map(|date| date.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            );
        }
        println!("{} cards{}", cards.len(), more(query.has_next_page()));
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct CardStatsArgs {
    /// Keep refreshing until interrupted
    #[arg(long)]
    pub watch: bool,
}

impl CardStatsArgs {
    async fn run(self, console: &Console) -> Result<()> {
        let period = Duration::from_secs(console.config.query.card_stats_interval_secs.max(1));
        let Some(poller) = CardStatsPoller::spawn(console.logic.clone(), &console.cache, period)
        else {
            bail!("this session may not read the card inventory");
        };
        let mut stats = poller.subscribe();
        loop {
            tokio::select! {
                changed = stats.changed() => changed?,
                _ = tokio::signal::ctrl_c() => return Ok(()),
            }
            if let Some(current) = *stats.borrow_and_update() {
                println!("{} cards available", current.available);
            }
            if !self.watch {
                return Ok(());
            }
        }
    }
}

#[derive(Args, Debug)]
pub struct ImportCards {
    /// `.xlsx` or `.xls` file with the card numbers
    pub path: PathBuf,
}

impl ImportCards {
    async fn run(self, console: &Console) -> Result<()> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("reading {}", self.path.display()))?;
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let notification = console
            .mutations()
            .import_cards(SpreadsheetFile::new(file_name, bytes))
            .await;
        report(notification)
    }
}

#[derive(Subcommand, Debug)]
pub enum Pdf {
    /// Download a member's admission form or any stored file
    Fetch(FetchPdf),
}

impl Pdf {
    async fn run(self, console: &Console) -> Result<()> {
        match self {
            Pdf::Fetch(cmd) => cmd.run(console).await,
        }
    }
}

#[derive(Args, Debug)]
pub struct FetchPdf {
    /// Stored file name, instead of a member's admission form
    #[arg(long, conflicts_with_all = ["name", "surname", "registration_date"])]
    pub file: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub surname: Option<String>,
    /// Registration date of the member, YYYY-MM-DD
    #[arg(long)]
    pub registration_date: Option<NaiveDate>,
    /// Output path, defaults to the stored file name
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

impl FetchPdf {
    fn pdf_file(&self) -> Result<PdfFile> {
        if let Some(file) = &self.file {
            return Ok(PdfFile::Generic(file.clone()));
        }
        match (&self.name, &self.surname, self.registration_date) {
            (Some(name), Some(surname), Some(registration_date)) => Ok(PdfFile::MemberForm {
                name: name.clone(),
                surname: surname.clone(),
                registration_date,
            }),
            _ => bail!("either --file or --name, --surname and --registration-date are required"),
        }
    }

    async fn run(self, console: &Console) -> Result<()> {
        let file = self.pdf_file()?;
        let out = self
            .out
            .clone()
            .unwrap_or_else(|| PathBuf::from(file.file_name()));
        let bytes = match console
            .logic
            .clone()
            .oneshot(FetchPdfRequest { file })
            .await
        {
            Ok(bytes) => bytes,
            Err(err) => bail!(err.user_message()),
        };
        tokio::fs::write(&out, &bytes)
            .await
            .with_context(|| format!("writing {}", out.display()))?;
        println!("{} bytes written to {}", bytes.len(), out.display());
        Ok(())
    }
}

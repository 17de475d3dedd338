// src/config.rs
use crate::api::transport::RetryStrategy;
use crate::constants::{DEFAULT_PAGE_SIZE, NOTION_API_BASE_URL, NOTION_API_VERSION};
use crate::error::AppError;
use crate::types::{ApiKey, NotionId, PageSize, ValidatedUrl};
use clap::{Parser, Subcommand};

/// Everything a client needs to talk to Notion.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: ApiKey,
    pub base_url: ValidatedUrl,
    pub api_version: String,
    pub page_size: PageSize,
    pub retry: RetryStrategy,
}

impl ClientConfig {
    pub fn new(api_key: ApiKey) -> Result<Self, AppError> {
        Ok(Self {
            api_key,
            base_url: ValidatedUrl::parse(NOTION_API_BASE_URL)?,
            api_version: NOTION_API_VERSION.to_string(),
            page_size: PageSize::new(DEFAULT_PAGE_SIZE)?,
            retry: RetryStrategy::default(),
        })
    }

    /// Reads `NOTION_API_KEY` (or `NOTION_TOKEN`) and an optional
    /// `NOTION_PAGE_SIZE` from the environment.
    pub fn from_env() -> Result<Self, AppError> {
        let api_key_str = std::env::var("NOTION_API_KEY")
            .or_else(|_| std::env::var("NOTION_TOKEN"))
            .map_err(|_| {
                AppError::MissingConfiguration(
                    "NOTION_API_KEY environment variable not set".to_string(),
                )
            })?;

        let mut config = Self::new(ApiKey::new(api_key_str)?)?;

        if let Ok(raw) = std::env::var("NOTION_PAGE_SIZE") {
            let size = raw.trim().parse::<u32>().map_err(|_| {
                AppError::MissingConfiguration(format!(
                    "NOTION_PAGE_SIZE must be a number, got '{}'",
                    raw
                ))
            })?;
            config = config.with_page_size(size)?;
        }

        Ok(config)
    }

    /// Points the client somewhere other than api.notion.com. A trailing
    /// slash is added so endpoint paths join under it.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, AppError> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        self.base_url = ValidatedUrl::parse(&normalized)?;
        Ok(self)
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Result<Self, AppError> {
        self.page_size = PageSize::new(page_size)?;
        Ok(self)
    }

    pub fn with_retry(mut self, retry: RetryStrategy) -> Self {
        self.retry = retry;
        self
    }
}

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Use the blocking client instead of the async one
    #[arg(long, global = true, default_value_t = false)]
    pub blocking: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print a page's property values as JSON
    Page {
        /// Notion page URL or ID
        id: String,

        /// Only print these properties (name or id); repeatable
        #[arg(short, long = "property")]
        properties: Vec<String>,

        /// Always fetch values from the properties endpoint
        #[arg(long, default_value_t = false)]
        no_cache: bool,

        /// Include relation properties
        #[arg(long, default_value_t = false)]
        relations: bool,
    },

    /// Write one property value; the value is JSON or a bare string
    Set {
        page: String,
        property: String,
        value: String,
    },

    /// List the rows of a database
    Query {
        database: String,

        /// Stop after this many rows
        #[arg(long)]
        limit: Option<usize>,

        /// Rows requested per call (1-100)
        #[arg(long)]
        page_size: Option<u32>,
    },

    /// List the child blocks of a page or block
    Blocks { id: String },

    /// Show the integration's bot user
    Whoami,
}

/// Resolved CLI configuration: client settings plus the validated command.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub client: ClientConfig,
    pub command: Command,
    /// The target object of the command, when it has one.
    pub target: Option<NotionId>,
    pub verbose: bool,
    pub blocking: bool,
}

impl CliConfig {
    /// Resolves CLI input against the environment.
    pub fn resolve(cli: CommandLineInput) -> Result<Self, AppError> {
        let mut client = ClientConfig::from_env()?;

        let target = match &cli.command {
            Command::Page { id, .. } | Command::Blocks { id } => Some(NotionId::parse(id)?),
            Command::Set { page, .. } => Some(NotionId::parse(page)?),
            Command::Query {
                database,
                page_size,
                ..
            } => {
                if let Some(size) = page_size {
                    client = client.with_page_size(*size)?;
                }
                Some(NotionId::parse(database)?)
            }
            Command::Whoami => None,
        };

        Ok(Self {
            client,
            command: cli.command,
            target,
            verbose: cli.verbose,
            blocking: cli.blocking,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_key() -> ApiKey {
        ApiKey::new("secret_abcdefghijklmnopqrstuvwxyz").unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new(api_key()).unwrap();
        assert_eq!(config.base_url.as_str(), "https://api.notion.com/v1/");
        assert_eq!(config.api_version, "2022-06-28");
        assert_eq!(config.page_size.get(), 20);
        assert_eq!(config.retry.total, 3);
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = ClientConfig::new(api_key())
            .unwrap()
            .with_base_url("http://localhost:8080/v1")
            .unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost:8080/v1/");
    }

    #[test]
    fn test_page_size_is_bounded() {
        let config = ClientConfig::new(api_key()).unwrap();
        assert!(config.clone().with_page_size(100).is_ok());
        assert!(config.clone().with_page_size(0).is_err());
        assert!(config.with_page_size(101).is_err());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = CommandLineInput::parse_from([
            "notion-typed",
            "page",
            "12345678123456781234567812345678",
            "--property",
            "Status",
            "-p",
            "Due",
            "--no-cache",
        ]);
        assert_eq!(
            cli.command,
            Command::Page {
                id: "12345678123456781234567812345678".to_string(),
                properties: vec!["Status".to_string(), "Due".to_string()],
                no_cache: true,
                relations: false,
            }
        );

        let cli = CommandLineInput::parse_from(["notion-typed", "--blocking", "whoami"]);
        assert!(cli.blocking);
        assert_eq!(cli.command, Command::Whoami);
    }
}

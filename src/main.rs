// src/main.rs

use anyhow::{Context, Result};
use clap::Parser;
use futures::{StreamExt, TryStreamExt};
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use notion_typed::api::PropertyMap;
use notion_typed::config::{CliConfig, Command, CommandLineInput};
use notion_typed::types::{BlockId, DatabaseId, NotionId, PageId};
use notion_typed::{
    Block, BlockingNotionApi, GetOptions, NotionApi, PropertyFilter, PropertyInput, QueryRequest,
    SimpleValue,
};
use std::fs;

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_file_path = std::env::temp_dir().join("notion_typed.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] {t} - {m}{n}"
    } else {
        "{m}{n}"
    };

    let stderr_appender = ConsoleAppender::builder()
        .target(log4rs::append::console::Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] {t} - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stderr")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Interprets a CLI value as JSON, falling back to a bare string.
fn parse_input(raw: &str) -> Result<PropertyInput> {
    let value = serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
    Ok(PropertyInput::from_json(value)?)
}

fn target(config: &CliConfig) -> Result<&NotionId> {
    config
        .target
        .as_ref()
        .context("this command needs a page, database or block id")
}

fn property_filter(relations: bool) -> PropertyFilter {
    PropertyFilter {
        include_relations: relations,
        relations_only: false,
    }
}

fn get_options(no_cache: bool) -> GetOptions {
    if no_cache {
        GetOptions::fresh()
    } else {
        GetOptions::default()
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_block(block: &Block) {
    let text = block
        .rich_text()
        .map(notion_typed::types::join_rich_text)
        .unwrap_or_default();
    println!("{:<20} {}", block.block_type(), text);
}

async fn run_async(config: CliConfig) -> Result<()> {
    let api = NotionApi::from_config(config.client.clone())?;

    match &config.command {
        Command::Page {
            properties,
            no_cache,
            relations,
            ..
        } => {
            let page = api.page(&PageId::from(target(&config)?)).await?;
            let options = get_options(*no_cache);
            let values = if properties.is_empty() {
                page.properties(property_filter(*relations), options).await?
            } else {
                let mut values = PropertyMap::new();
                for key in properties {
                    values.insert(key.clone(), page.get(key, options).await?);
                }
                values
            };
            print_json(&values)
        }
        Command::Set {
            property, value, ..
        } => {
            let mut page = api.page(&PageId::from(target(&config)?)).await?;
            page.set(property, parse_input(value)?).await?;
            let written = page.get(property, GetOptions::default()).await?;
            print_json(&written)
        }
        Command::Query { limit, .. } => {
            let database = api.database(&DatabaseId::from(target(&config)?)).await?;
            let rows = database.query(&QueryRequest::new());
            let mut rows = match limit {
                Some(limit) => rows.take(*limit).boxed(),
                None => rows,
            };
            while let Some(page) = rows.try_next().await? {
                println!("{}  {}", page.id(), page.title());
            }
            Ok(())
        }
        Command::Blocks { .. } => {
            let block = api.block(&BlockId::from(target(&config)?)).await?;
            let mut children = block.children();
            while let Some(child) = children.try_next().await? {
                print_block(&child);
            }
            Ok(())
        }
        Command::Whoami => {
            let me = api.me().await?;
            println!("{} ({})", me.display_name(), me.id);
            Ok(())
        }
    }
}

fn run_blocking(config: CliConfig) -> Result<()> {
    let api = BlockingNotionApi::from_config(config.client.clone())?;

    match &config.command {
        Command::Page {
            properties,
            no_cache,
            relations,
            ..
        } => {
            let page = api.page(&PageId::from(target(&config)?))?;
            let options = get_options(*no_cache);
            let values = if properties.is_empty() {
                page.properties(property_filter(*relations), options)?
            } else {
                properties
                    .iter()
                    .map(|key| Ok((key.clone(), page.get(key, options)?)))
                    .collect::<Result<PropertyMap, notion_typed::AppError>>()?
            };
            print_json(&values)
        }
        Command::Set {
            property, value, ..
        } => {
            let mut page = api.page(&PageId::from(target(&config)?))?;
            page.set(property, parse_input(value)?)?;
            let written: SimpleValue = page.get(property, GetOptions::default())?;
            print_json(&written)
        }
        Command::Query { limit, .. } => {
            let database = api.database(&DatabaseId::from(target(&config)?))?;
            let rows = database.query(&QueryRequest::new());
            for page in rows.take(limit.unwrap_or(usize::MAX)) {
                let page = page?;
                println!("{}  {}", page.id(), page.title());
            }
            Ok(())
        }
        Command::Blocks { .. } => {
            let block = api.block(&BlockId::from(target(&config)?))?;
            for child in block.children() {
                print_block(&child?);
            }
            Ok(())
        }
        Command::Whoami => {
            let me = api.me()?;
            println!("{} ({})", me.display_name(), me.id);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose).map_err(|e| anyhow::anyhow!("failed to set up logging: {}", e))?;

    let config = CliConfig::resolve(cli)?;

    if config.blocking {
        // reqwest's blocking client owns a runtime of its own and must not
        // be driven from inside ours.
        tokio::task::spawn_blocking(move || run_blocking(config)).await?
    } else {
        run_async(config).await
    }
}

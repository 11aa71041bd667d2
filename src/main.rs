// src/main.rs

use clap::Parser;
use feishu_docs::config::{Command, CommandLineInput, ResourceKindArg};
use feishu_docs::{
    render_blocks, render_forest, render_resource, AppError, ClientConfig, DocumentId,
    DocumentSyncClient, FolderToken, NodeToken, PublicFetcher, ResourceKind, ResourceRef, SpaceId,
};
use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use serde::Serialize;
use std::fs;

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> anyhow::Result<()> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_file_path = std::env::temp_dir().join("feishu_docs.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    // Logs go to stderr so that stdout stays parseable with --json
    let stderr_appender = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
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

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// An authenticated session built from the configured secrets.
fn session(cli: &CommandLineInput, config: ClientConfig) -> Result<DocumentSyncClient, AppError> {
    let provider = cli.secrets_provider()?;
    DocumentSyncClient::from_provider(config, provider.as_ref())
}

async fn run(cli: CommandLineInput) -> Result<(), AppError> {
    let config = ClientConfig::from_env()?;

    match &cli.command {
        Command::CreateDocument { title, folder } => {
            let client = session(&cli, config)?;
            let folder = folder.as_deref().map(FolderToken::new).transpose()?;
            let document = client.create_document(title, folder.as_ref()).await?;
            println!("Created document: {}", document);
        }
        Command::GetInfo { doc_id } => {
            let client = session(&cli, config)?;
            let info = client.get_document_info(&DocumentId::new(doc_id.as_str())?).await?;
            if cli.json {
                print_json(&info)?;
            } else {
                println!("Title: {}", info.title);
                println!("Document ID: {}", info.document_id);
                if let Some(revision) = info.revision_id {
                    println!("Revision: {}", revision);
                }
            }
        }
        Command::GetBlocks { doc_id, render } => {
            let client = session(&cli, config)?;
            let document = DocumentId::new(doc_id.as_str())?;
            if *render {
                let forest = client.get_block_tree(&document).await?;
                println!("{}", render_forest(&forest));
            } else {
                let blocks = client.get_all_blocks(&document).await?;
                if cli.json {
                    print_json(&blocks)?;
                } else {
                    println!("Found {} blocks:", blocks.len());
                    let content: Vec<_> = blocks.into_iter().map(|b| b.block).collect();
                    println!("{}", render_blocks(&content));
                }
            }
        }
        Command::Search {
            query,
            doc_type,
            count,
        } => {
            let client = session(&cli, config)?;
            let hits = client
                .search_documents(query, doc_type.as_deref(), *count)
                .await?;
            if cli.json {
                print_json(&hits)?;
            } else {
                println!("Found {} results:", hits.len());
                for hit in &hits {
                    println!(
                        "  - {} ({})",
                        hit.title,
                        hit.document_id.as_deref().unwrap_or("?")
                    );
                }
            }
        }
        Command::WikiSpaces => {
            let client = session(&cli, config)?;
            let spaces = client.list_wiki_spaces().await?;
            if cli.json {
                print_json(&spaces)?;
            } else {
                println!("Found {} Wiki spaces:", spaces.len());
                for space in &spaces {
                    println!("  - {} ({})", space.name, space.space_id);
                }
            }
        }
        Command::WikiChildren { space_id, parent } => {
            let client = session(&cli, config)?;
            let space = SpaceId::new(space_id.as_str())?;
            let parent = parent.as_deref().map(NodeToken::new).transpose()?;
            let children = client.list_wiki_children(&space, parent.as_ref()).await?;
            if cli.json {
                print_json(&children)?;
            } else {
                println!("Found {} children:", children.len());
                for child in &children {
                    println!("  - {} ({})", child.title, child.node_token);
                }
            }
        }
        Command::FolderChildren { folder_token } => {
            let client = session(&cli, config)?;
            let folder = FolderToken::new(folder_token.as_str())?;
            let entries = client.list_folder_children(&folder).await?;
            if cli.json {
                print_json(&entries)?;
            } else {
                println!("Found {} items:", entries.len());
                for entry in &entries {
                    println!("  - {} ({})", entry.name, entry.kind);
                }
            }
        }
        Command::FetchPublic { url, doc_id, kind } => {
            run_public_fetch(&cli, config, url.as_deref(), doc_id.as_deref(), *kind).await?;
        }
    }
    Ok(())
}

async fn run_public_fetch(
    cli: &CommandLineInput,
    config: ClientConfig,
    url: Option<&str>,
    doc_id: Option<&str>,
    kind: Option<ResourceKindArg>,
) -> Result<(), AppError> {
    let fetcher = PublicFetcher::new(config, cli.secrets_provider()?)?;
    let resource = match (url, doc_id, kind) {
        (Some(url), _, _) => feishu_docs::parse_resource_url(url)?,
        (None, Some(id), Some(kind)) => ResourceRef::new(
            match kind {
                ResourceKindArg::Wiki => ResourceKind::Wiki,
                ResourceKindArg::Document => ResourceKind::Document,
            },
            id,
        ),
        _ => {
            return Err(AppError::MissingConfiguration(
                "fetch-public needs --url, or --doc-id together with --type".to_string(),
            ))
        }
    };

    let fetched = fetcher.fetch(&resource).await?;
    if cli.json {
        print_json(&fetched)
    } else {
        println!("{}", render_resource(&fetched));
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let cli = CommandLineInput::parse();

    if let Err(e) = setup_logging(cli.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(err) = run(cli).await {
        log::debug!("Command failed: {:?}", err);
        eprintln!("Error: {}", err.user_guidance());
        std::process::exit(err.exit_code());
    }
}

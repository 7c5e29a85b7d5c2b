//! colflag - walkthrough of flags derived from article columns

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser as ClapParser;
use colflag::access::{DataType, Value};
use colflag::catalog::{Catalog, ColumnInfo, Mapper};
use colflag::flag::column_flag;
use colflag::model::{MappedObject, Model};
use colflag::store::TableStore;
use std::sync::Arc;

/// Publish and unpublish articles through a column flag
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of articles to seed
    #[arg(short, long, default_value = "10")]
    articles: u32,

    /// Publish every K-th seeded article
    #[arg(short = 'k', long, default_value = "3")]
    publish_every: u32,

    /// Resolve attribute names on every access instead of prefetching
    #[arg(long)]
    on_demand: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let catalog = Arc::new(Catalog::new());
    let table = catalog.create_table(
        "article",
        vec![
            ColumnInfo::new("id", DataType::Int32),
            ColumnInfo::new("title", DataType::Varchar),
            ColumnInfo::new("published_at", DataType::Timestamp),
        ],
    )?;
    let mapper = catalog.map_class(
        Mapper::builder("Article", &table)
            .column("id")
            .column("title")
            .column_as("publication_date", "published_at"),
    )?;

    let published_at = table.get_column("published_at")?;
    let mut is_published =
        column_flag(published_at.expr()).default_with(|| Value::Timestamp(Utc::now()));
    if args.on_demand {
        is_published = is_published.on_demand(catalog.clone());
    }
    let model = Model::builder(&mapper)
        .flag("is_published", is_published.build()?)
        .build(&*catalog)?;
    let predicate = model.predicate("is_published")?;
    println!("Flag predicate: {}", predicate);

    let store = TableStore::new(&table);
    let every = args.publish_every.max(1);
    for id in 1..=args.articles {
        let article = model.create([
            ("id", Value::Int32(id as i32)),
            ("title", Value::from(format!("Article {}", id))),
            ("is_published", Value::Boolean(id % every == 0)),
        ])?;
        store.insert(&model, &article)?;
    }
    println!(
        "Seeded {} articles, {} published",
        store.len(),
        store.count(&predicate)?
    );

    let drafts = store.filter(&model, &!predicate.clone())?;
    let Some((row_id, mut draft)) = drafts.into_iter().next() else {
        println!("Every article is already published");
        return Ok(());
    };

    model.write(&mut draft, "is_published", true)?;
    store.update(&model, row_id, &draft)?;
    println!(
        "Published {} at {}; {} published",
        model.read(&draft, "title")?,
        draft
            .attribute("publication_date")
            .context("Article has no publication date")?,
        store.count(&predicate)?
    );

    model.write(&mut draft, "is_published", false)?;
    store.update(&model, row_id, &draft)?;
    println!(
        "Unpublished {}; {} published",
        model.read(&draft, "title")?,
        store.count(&predicate)?
    );

    let snapshot = store.snapshot()?;
    let restored = TableStore::restore(&table, &snapshot)?;
    let reloaded = restored.load(&model, row_id)?;
    println!(
        "Snapshot of {} bytes restored; {} published, {} still {}",
        snapshot.len(),
        restored.count(&predicate)?,
        model.read(&reloaded, "title")?,
        if model.get_flag(&reloaded, "is_published")? {
            "published"
        } else {
            "a draft"
        }
    );

    Ok(())
}

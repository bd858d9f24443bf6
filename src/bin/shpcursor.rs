//! shpcursor - print the rows or schema of a shapefile
//!
//! ```text
//! shpcursor roads.shp --bbox 34.0,-120.0,35.0,-119.0 --limit 20
//! shpcursor rivers.shp --where TYPE=river --ignore-case
//! shpcursor parcels.shp --schema
//! ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use shpcursor::{BoundingBox, MappedShapefile, Query, ReaderConfig, ShapefileResultSet};
use std::path::PathBuf;

/// Scrollable cursor over ESRI shapefile records
#[derive(Parser, Debug)]
#[command(name = "shpcursor")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the .shp file (siblings .shx and .dbf are found next to it)
    file: PathBuf,

    /// Keep features intersecting SOUTH,WEST,NORTH,EAST (degrees)
    #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true, conflicts_with = "filter")]
    bbox: Option<BoundingBox>,

    /// Keep records whose COLUMN equals VALUE
    #[arg(long = "where", value_name = "COLUMN=VALUE", value_parser = parse_filter)]
    filter: Option<(String, String)>,

    /// Compare --where values without regard to case
    #[arg(long, requires = "filter")]
    ignore_case: bool,

    /// Print the column catalog instead of rows
    #[arg(long)]
    schema: bool,

    /// Stop after this many rows
    #[arg(long)]
    limit: Option<usize>,

    /// Reader configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_bbox(text: &str) -> std::result::Result<BoundingBox, String> {
    let values = text
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid coordinate: {}", e))?;
    match values.as_slice() {
        [south, west, north, east] => Ok(BoundingBox::new(*south, *west, *north, *east)),
        _ => Err(format!("expected SOUTH,WEST,NORTH,EAST, got {} values", values.len())),
    }
}

fn parse_filter(text: &str) -> std::result::Result<(String, String), String> {
    match text.split_once('=') {
        Some((column, value)) if !column.trim().is_empty() => {
            Ok((column.trim().to_string(), value.to_string()))
        }
        _ => Err("expected COLUMN=VALUE".to_string()),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("shpcursor=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ReaderConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ReaderConfig::default(),
    };

    let query = match (&cli.bbox, &cli.filter) {
        (Some(bounds), None) => Query::Bounds(*bounds),
        (None, Some((column, value))) => {
            Query::attribute(column.as_str(), value.as_str(), cli.ignore_case)
        }
        (None, None) => Query::All,
        (Some(_), Some(_)) => bail!("--bbox and --where cannot be combined"),
    };

    let mut rows = ShapefileResultSet::from_path(&cli.file, query, &config)
        .with_context(|| format!("opening {}", cli.file.display()))?;

    if cli.schema {
        print_schema(&rows)
    } else {
        print_rows(&mut rows, cli.limit)
    }
}

fn print_schema(rows: &ShapefileResultSet<MappedShapefile>) -> Result<()> {
    let catalog = rows.metadata();
    println!(
        "{} ({}), {} rows",
        catalog.table_name(),
        catalog.shape_type_name(),
        rows.row_count()
    );
    let b = rows.bounds();
    println!("bounds: S {} W {} N {} E {}", b.south(), b.west(), b.north(), b.east());
    println!(
        "{:>3}  {:<12} {:<8} {:<5} {:>5} {:>5}",
        "#", "label", "type", "code", "width", "scale"
    );
    println!("{:>3}  {:<12} {:<8}", 0, catalog.feature_label(), "FEATURE");
    for index in 1..=catalog.column_count() {
        println!(
            "{:>3}  {:<12} {:<8} {:<5} {:>5} {:>5}",
            index,
            catalog.column_label(index)?,
            catalog.column_type(index)?.to_string(),
            catalog.column_type_name(index)?,
            catalog.precision(index)?,
            catalog.scale(index)?
        );
    }
    Ok(())
}

fn print_rows(rows: &mut ShapefileResultSet<MappedShapefile>, limit: Option<usize>) -> Result<()> {
    let count = rows.metadata().column_count();
    let mut header = vec!["row".to_string(), "id".to_string(), "kind".to_string()];
    for index in 1..=count {
        header.push(rows.metadata().column_label(index)?.to_string());
    }
    println!("{}", header.join("\t"));

    let limit = limit.unwrap_or(usize::MAX);
    let mut printed = 0;
    while printed < limit && rows.next()? {
        let feature = rows.get_feature()?;
        let mut line = vec![
            rows.row().to_string(),
            feature.unique_id(),
            feature.kind().to_string(),
        ];
        for index in 1..=count {
            line.push(rows.get_string(index)?);
        }
        println!("{}", line.join("\t"));
        printed += 1;
    }
    Ok(())
}

//! # CLI Command Implementations
//!
//! Every command boots a full context first, so it sees exactly what the
//! server would see, and flushes before exiting.

use crate::api;
use crate::app::App;
use crate::boot;
use crate::config::{BOOT_CACHE_FILE, StratumConfig};
use std::path::{Path, PathBuf};
use stratum_core::{
    BlobHeader, Params, StratumError,
    primitives::{self, MAX_BLOB_SIZE},
};

// =============================================================================
// BLOB FILES
// =============================================================================

/// Read a database blob file for import.
///
/// Rejects anything that is not a regular file, is larger than
/// `MAX_BLOB_SIZE`, or does not start with a current blob header, before a
/// context is booted.
fn read_blob_file(path: &Path) -> Result<Vec<u8>, StratumError> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        StratumError::IoError(format!("Cannot read '{}': {}", path.display(), e))
    })?;
    if !metadata.is_file() {
        return Err(StratumError::IoError(format!(
            "'{}' is not a regular file",
            path.display()
        )));
    }
    if metadata.len() > MAX_BLOB_SIZE as u64 {
        return Err(StratumError::IoError(format!(
            "Blob file is {} bytes; the limit is {} bytes",
            metadata.len(),
            MAX_BLOB_SIZE
        )));
    }

    let bytes = std::fs::read(path)
        .map_err(|e| StratumError::IoError(format!("Read '{}': {}", path.display(), e)))?;
    BlobHeader::from_bytes(&bytes)?.validate()?;
    Ok(bytes)
}

/// Resolve where an export is written.
///
/// The parent directory must exist. Files the running context owns (the
/// durable blob, its sidecar, the boot cache) are refused: writing them
/// from outside would bypass the flush lock.
fn export_target(config: &StratumConfig, path: &Path) -> Result<PathBuf, StratumError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| StratumError::IoError("Export path has no file name".to_string()))?;
    let target = parent
        .canonicalize()
        .map_err(|e| {
            StratumError::IoError(format!(
                "Invalid export directory '{}': {}",
                parent.display(),
                e
            ))
        })?
        .join(file_name);

    if target.is_dir() {
        return Err(StratumError::IoError(format!(
            "'{}' is a directory",
            target.display()
        )));
    }

    if let Ok(data_dir) = config.data_dir.canonicalize() {
        let owned = [
            data_dir.join(&config.blob_path),
            data_dir.join(primitives::metadata_path(&config.blob_path)),
            data_dir.join(BOOT_CACHE_FILE),
        ];
        if owned.contains(&target) {
            return Err(StratumError::IoError(format!(
                "'{}' is managed by the durable tier; export elsewhere",
                target.display()
            )));
        }
    }

    Ok(target)
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

/// Build and boot a context, waiting for its background work.
async fn booted(config: &StratumConfig) -> Result<App, StratumError> {
    let app = App::build(config)?;
    app.start().await?;
    app.wait_background().await;
    Ok(app)
}

// =============================================================================
// SERVE COMMAND
// =============================================================================

/// Boot and serve the HTTP API until ctrl-c.
pub async fn cmd_serve(config: &StratumConfig, host: &str, port: u16) -> Result<(), StratumError> {
    let app = App::build(config)?;
    if !boot::install_global(app.orchestrator().clone()) {
        tracing::debug!("Global boot orchestrator already installed");
    }
    let report = app.start().await?;

    println!("Stratum Coordinator Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:      {}", host);
    println!("  Port:      {}", port);
    println!("  Data dir:  {:?}", config.data_dir);
    println!("  Blob:      {}", config.blob_path);
    println!("  Writer:    {}", config.writer_id);
    println!();
    println!(
        "Booted from {:?}: {} notes, {} folders, {} entities, {} relationships in {} ms",
        report.source,
        report.notes,
        report.folders,
        report.entities,
        report.relationships,
        report.elapsed_ms
    );
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, &app).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show record counts, boot report and sync status.
pub async fn cmd_status(config: &StratumConfig, json_mode: bool) -> Result<(), StratumError> {
    let app = booted(config).await?;
    let bridge = app.bridge();
    let counts = bridge.counts()?;
    let sync = bridge.get_sync_status();

    if json_mode {
        print_json(&serde_json::json!({
            "data_dir": config.data_dir.to_string_lossy(),
            "phase": app.orchestrator().current(),
            "counts": counts,
            "boot": bridge.boot_report(),
            "sync": sync,
        }));
    } else {
        println!("Stratum Status");
        println!("==============");
        println!("Data dir:      {:?}", config.data_dir);
        println!("Phase:         {}", app.orchestrator().current());
        if let Some(report) = bridge.boot_report() {
            println!("Boot source:   {:?} ({} ms)", report.source, report.elapsed_ms);
        }
        println!();
        println!("Notes:         {}", counts.notes);
        println!("Folders:       {}", counts.folders);
        println!("Entities:      {}", counts.entities);
        println!("Relationships: {}", counts.relationships);
        println!();
        println!("Sync status:   {:?}", sync.sync.status);
        println!("Pending:       {}", sync.sync.dirty);
        println!("Hydration:     {:?}", sync.hydration);
    }

    app.shutdown().await;
    Ok(())
}

// =============================================================================
// FLUSH COMMAND
// =============================================================================

/// Force a durable flush.
pub async fn cmd_flush(config: &StratumConfig, json_mode: bool) -> Result<(), StratumError> {
    let app = booted(config).await?;
    let outcome = app.bridge().flush_queue().await;

    if json_mode {
        print_json(&serde_json::json!({ "outcome": outcome }));
    } else {
        println!("Flush: {:?}", outcome);
    }

    app.shutdown().await;
    Ok(())
}

// =============================================================================
// EXPORT / IMPORT COMMANDS
// =============================================================================

/// Write the database blob to a file.
pub async fn cmd_export(config: &StratumConfig, output: &Path) -> Result<(), StratumError> {
    let target = export_target(config, output)?;
    let app = booted(config).await?;

    let data = app.bridge().export_database()?;
    std::fs::write(&target, &data)
        .map_err(|e| StratumError::IoError(format!("Write file: {}", e)))?;

    println!("Exported {} bytes to {:?}", data.len(), target);

    app.shutdown().await;
    Ok(())
}

/// Replace the database with a blob file and flush it to the durable tier.
pub async fn cmd_import(
    config: &StratumConfig,
    json_mode: bool,
    input: &Path,
) -> Result<(), StratumError> {
    let data = read_blob_file(input)?;

    let app = booted(config).await?;
    let counts = app.bridge().import_database(&data)?;
    let outcome = app.bridge().flush_queue().await;

    if json_mode {
        print_json(&serde_json::json!({ "counts": counts, "flush": outcome }));
    } else {
        println!(
            "Imported {} notes, {} folders, {} entities, {} relationships",
            counts.notes, counts.folders, counts.entities, counts.relationships
        );
        println!("Flush: {:?}", outcome);
    }

    app.shutdown().await;
    Ok(())
}

// =============================================================================
// QUERY COMMAND
// =============================================================================

/// Run a graph query script against the hydrated projection.
pub async fn cmd_query(
    config: &StratumConfig,
    json_mode: bool,
    script: &str,
    params: &str,
) -> Result<(), StratumError> {
    let params: Params = serde_json::from_str(params)
        .map_err(|e| StratumError::InvalidCommand(format!("params must be a JSON object: {}", e)))?;

    let app = booted(config).await?;
    let rows = app.bridge().query_graph_async(script, &params).await;

    if json_mode {
        print_json(&serde_json::json!({ "count": rows.len(), "rows": rows }));
    } else {
        println!("{} row(s)", rows.len());
        for row in &rows {
            println!("  {}", serde_json::Value::Object(row.clone()));
        }
    }

    app.shutdown().await;
    Ok(())
}

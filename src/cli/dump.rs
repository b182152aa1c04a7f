use clap::Args;
use std::path::PathBuf;
use tracing::info;

use crate::core::storage::{render_dump, LocalStorage};
use crate::error::Result;
use crate::services::SimpleServices;

#[derive(Args)]
pub struct DumpArgs {
    /// Write the statements to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Remove the stored batch after dumping it
    #[arg(long)]
    clear: bool,
}

pub async fn execute(args: DumpArgs, services: &SimpleServices) -> Result<()> {
    let config = services.config();
    let storage = services.open_storage()?;

    let dump = dump_batch(&storage, &config.storage_key, args.clear)?;
    super::emit(args.output.as_deref(), &dump)
}

fn dump_batch(storage: &LocalStorage, key: &str, clear: bool) -> Result<String> {
    let rows = storage.load_rows(key)?;
    info!("{} statements stored under '{}'", rows.len(), key);

    if clear {
        storage.remove_item(key)?;
        info!("Cleared '{}'", key);
    }

    Ok(render_dump(&rows))
}

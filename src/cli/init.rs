use std::path::PathBuf;

use crate::db::{init_db, ConnectionProvider};
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    save_settings(&settings)?;

    std::fs::create_dir_all(PathBuf::from(&settings.data_dir))?;

    let provider = ConnectionProvider::new(settings.database_path());
    init_db(&*provider.acquire()?)?;
    provider.release()?;

    println!("Initialized movimientos at {}", provider.db_path().display());
    Ok(())
}

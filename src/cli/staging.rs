use comfy_table::{Cell, Table};

use crate::db::ConnectionProvider;
use crate::error::Result;
use crate::fmt::money;
use crate::settings::get_database_path;
use crate::staging::StagingRepository;

pub fn list() -> Result<()> {
    let provider = ConnectionProvider::new(get_database_path());
    let rows = StagingRepository::new(&provider).fetch_all()?;
    provider.release()?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Value date", "Amount", "Balance", "Category", "Subcategory", "Description"]);
    for rec in rows {
        table.add_row(vec![
            Cell::new(rec.id),
            Cell::new(rec.value_date.format("%d/%m/%Y")),
            Cell::new(money(rec.amount)),
            Cell::new(money(rec.balance)),
            Cell::new(rec.category.unwrap_or_default()),
            Cell::new(rec.subcategory.unwrap_or_default()),
            Cell::new(rec.description.unwrap_or_default()),
        ]);
    }
    println!("Staging\n{table}");
    Ok(())
}

pub fn clear() -> Result<()> {
    let provider = ConnectionProvider::new(get_database_path());
    let removed = StagingRepository::new(&provider).clear()?;
    provider.release()?;
    println!("{removed} staged rows removed");
    Ok(())
}

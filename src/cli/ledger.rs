use chrono::NaiveDate;
use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::db::ConnectionProvider;
use crate::error::{EtlError, Result};
use crate::fmt::{money, opt_money};
use crate::ledger::LedgerRepository;
use crate::models::LedgerRecord;
use crate::settings::get_database_path;

pub fn list(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<()> {
    let provider = ConnectionProvider::new(get_database_path());
    let repo = LedgerRepository::new(&provider);
    let records = match (from, to) {
        (Some(start), Some(end)) => repo.find_by_date_range(start, end)?,
        _ => repo.find_all()?,
    };
    provider.release()?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Comment", "Amount", "Balance", "Category"]);
    for rec in &records {
        table.add_row(vec![
            Cell::new(rec.id.unwrap_or_default()),
            Cell::new(rec.date),
            Cell::new(&rec.comment),
            Cell::new(money(rec.amount)),
            Cell::new(opt_money(rec.balance)),
            Cell::new(rec.category.as_deref().unwrap_or_default()),
        ]);
    }
    println!("Movements ({})\n{table}", records.len());
    Ok(())
}

pub fn show(id: i64) -> Result<()> {
    let provider = ConnectionProvider::new(get_database_path());
    let record = LedgerRepository::new(&provider)
        .find_by_id(id)?
        .ok_or(EtlError::NotFound(id))?;
    provider.release()?;
    print_record(&record);
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let provider = ConnectionProvider::new(get_database_path());
    let repo = LedgerRepository::new(&provider);
    let record = repo.find_by_id(id)?.ok_or(EtlError::NotFound(id))?;
    repo.delete(id)?;
    provider.release()?;
    println!("{} {record}", "Deleted".red());
    Ok(())
}

fn print_record(rec: &LedgerRecord) {
    let blank = || "-".dimmed().to_string();
    println!("ID:           {}", rec.id.unwrap_or_default());
    println!("Date:         {}", rec.date.format("%d/%m/%Y"));
    println!("Comment:      {}", rec.comment);
    println!("Amount:       {}", money(rec.amount));
    println!("Balance:      {}", rec.balance.map(money).unwrap_or_else(blank));
    println!("Category:     {}", rec.category.clone().unwrap_or_else(blank));
    println!("Subcategory:  {}", rec.subcategory.clone().unwrap_or_else(blank));
    println!("Description:  {}", rec.description.clone().unwrap_or_else(blank));
}

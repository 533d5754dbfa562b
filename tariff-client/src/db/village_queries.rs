use crate::{
    db::reader::{Table, TableReader},
    domain::{CompetitorOffer, Tariff, VillageInput, WholesalePricePoint},
    error::DataAccessError,
};

pub const VILLAGE_NAME: &str = "village_name";

/// Distinct, trimmed village names in sorted order.
pub async fn village_names<R>(reader: &R) -> Result<Vec<String>, DataAccessError>
where
    R: TableReader + ?Sized,
{
    let rows = reader.fetch_all(Table::VillageInputs, &[VILLAGE_NAME]).await?;
    let mut names: Vec<String> = rows
        .iter()
        .filter_map(|r| r.text(VILLAGE_NAME))
        .map(str::to_string)
        .collect();
    names.sort();
    names.dedup();
    Ok(names)
}

pub async fn village_input<R>(
    reader: &R,
    village: &str,
) -> Result<Option<VillageInput>, DataAccessError>
where
    R: TableReader + ?Sized,
{
    reader
        .fetch_row(Table::VillageInputs, VILLAGE_NAME, village)
        .await?
        .map(|row| VillageInput::from_row(&row))
        .transpose()
}

/// Every village record. Rows without a name are skipped with a warning.
pub async fn all_village_inputs<R>(reader: &R) -> Result<Vec<VillageInput>, DataAccessError>
where
    R: TableReader + ?Sized,
{
    let rows = reader.fetch_all(Table::VillageInputs, &[]).await?;
    let mut villages = Vec::with_capacity(rows.len());
    for row in &rows {
        match VillageInput::from_row(row) {
            Ok(v) => villages.push(v),
            Err(e) => tracing::warn!(error = %e, "skipping village_inputs row"),
        }
    }
    Ok(villages)
}

pub async fn competitor_offer<R>(
    reader: &R,
    village: &str,
) -> Result<Option<CompetitorOffer>, DataAccessError>
where
    R: TableReader + ?Sized,
{
    let row = reader
        .fetch_row(Table::CompetitorOffers, VILLAGE_NAME, village)
        .await?;
    Ok(row.map(|r| CompetitorOffer::from_row(&r)))
}

pub async fn village_tariff<R>(reader: &R, village: &str) -> Result<Option<Tariff>, DataAccessError>
where
    R: TableReader + ?Sized,
{
    let row = reader.fetch_row(Table::Tariffs, VILLAGE_NAME, village).await?;
    Ok(row.map(|r| Tariff::from_row(&r)))
}

pub async fn all_tariffs<R>(reader: &R) -> Result<Vec<Tariff>, DataAccessError>
where
    R: TableReader + ?Sized,
{
    let rows = reader
        .fetch_all(Table::Tariffs, &[VILLAGE_NAME, "_usage", "_supply"])
        .await?;
    Ok(rows.iter().map(Tariff::from_row).collect())
}

/// Full wholesale history. All columns are fetched because the source table's
/// column casing is not guaranteed; names are normalised per row.
pub async fn wholesale_prices<R>(reader: &R) -> Result<Vec<WholesalePricePoint>, DataAccessError>
where
    R: TableReader + ?Sized,
{
    let rows = reader.fetch_all(Table::WholesalePrices, &[]).await?;
    Ok(rows.iter().map(WholesalePricePoint::from_row).collect())
}
